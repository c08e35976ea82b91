//! CLI command implementations.

pub mod access;
pub mod budget;
pub mod info;
pub mod init;
pub mod license;
pub mod list;
pub mod purchase;
pub mod register;
pub mod set_price;
pub mod stats;
pub mod toggle;

pub use access::access;
pub use budget::budget;
pub use info::info;
pub use init::init;
pub use license::license;
pub use list::list;
pub use purchase::purchase;
pub use register::register;
pub use set_price::set_price;
pub use stats::stats;
pub use toggle::toggle;
