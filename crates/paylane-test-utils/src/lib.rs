//! Shared test utilities for the Paylane protocol.
//!
//! - [`MockRail`]: in-memory payment rail with configurable failures
//! - [`ManualClock`]: clock that only moves when told to
//! - [`helpers`]: fixture constructors

pub mod clock;
pub mod helpers;
pub mod mock_rail;

pub use clock::ManualClock;
pub use helpers::*;
pub use mock_rail::MockRail;
