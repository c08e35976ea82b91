//! Spending guard.
//!
//! Tracks one payer's spend in a rolling 24-hour window against a daily
//! ceiling and a per-item ceiling. The window restarts at the first
//! reservation made 24 hours or more after the previous restart, not at a
//! calendar boundary.
//!
//! Every check-and-commit happens under a single mutex, so concurrent
//! reservations cannot jointly overshoot the daily ceiling.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use paylane_types::{Amount, Clock, ErrorCode, Identity, SystemClock, Timestamp, SPENDING_WINDOW_SECS};

/// Budget refusals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// A single item costs more than the per-item ceiling.
    #[error("price {amount} exceeds per-item ceiling {ceiling}")]
    PerItemCeilingExceeded {
        /// Requested item price.
        amount: Amount,
        /// Configured ceiling.
        ceiling: Amount,
    },

    /// The window's spend would pass the daily ceiling.
    #[error("spending {requested} on top of {spent} exceeds daily ceiling {ceiling}")]
    DailyCeilingExceeded {
        /// Amount asked for.
        requested: Amount,
        /// Already spent this window.
        spent: Amount,
        /// Configured ceiling.
        ceiling: Amount,
    },

    /// The requested total does not fit in an amount.
    #[error("requested amount overflows")]
    Overflow,

    /// Guard state lock poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl BudgetError {
    /// Map to a protocol error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::PerItemCeilingExceeded { .. } => ErrorCode::PerItemCeilingExceeded,
            Self::DailyCeilingExceeded { .. } | Self::Overflow => ErrorCode::DailyCeilingExceeded,
            Self::LockPoisoned(_) => ErrorCode::InternalError,
        }
    }
}

/// Configured ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingLimits {
    /// Maximum spend per rolling window.
    pub daily_ceiling: Amount,
    /// Maximum price of any one item.
    pub per_item_ceiling: Amount,
}

impl SpendingLimits {
    /// Create limits.
    pub fn new(daily_ceiling: Amount, per_item_ceiling: Amount) -> Self {
        Self {
            daily_ceiling,
            per_item_ceiling,
        }
    }
}

/// Committed spend that can be given back if its transfer does not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a reservation should be released if its transfer fails"]
pub struct Reservation {
    amount: Amount,
    window_start: Timestamp,
}

impl Reservation {
    /// Reserved amount.
    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// Serializable snapshot of the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    /// Payer the guard acts for.
    pub payer: Identity,
    /// Configured daily ceiling.
    pub daily_ceiling: Amount,
    /// Configured per-item ceiling.
    pub per_item_ceiling: Amount,
    /// Spent in the current window.
    pub spent: Amount,
    /// Daily ceiling minus spent.
    pub remaining: Amount,
    /// Current window start.
    pub window_start: Timestamp,
    /// Earliest time the window can restart.
    pub resets_at: Timestamp,
}

#[derive(Debug)]
struct Window {
    spent: Amount,
    start: Timestamp,
}

impl Window {
    fn expired(&self, now: Timestamp) -> bool {
        now.saturating_sub(self.start) >= SPENDING_WINDOW_SECS
    }

    /// Restart the window if 24h have passed since the last restart.
    fn roll(&mut self, now: Timestamp, payer: &Identity) {
        if self.expired(now) {
            debug!(payer = %payer, previous_spent = self.spent, "Spending window reset");
            self.spent = 0;
            self.start = now;
        }
    }
}

/// Per-payer spending guard.
pub struct SpendingGuard {
    payer: Identity,
    limits: SpendingLimits,
    clock: Arc<dyn Clock>,
    window: Mutex<Window>,
}

impl std::fmt::Debug for SpendingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpendingGuard")
            .field("payer", &self.payer)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl SpendingGuard {
    /// Create a guard using wall-clock time.
    pub fn new(payer: Identity, limits: SpendingLimits) -> Self {
        Self::with_clock(payer, limits, Arc::new(SystemClock))
    }

    /// Create a guard with an explicit time source. The first window starts now.
    pub fn with_clock(payer: Identity, limits: SpendingLimits, clock: Arc<dyn Clock>) -> Self {
        let start = clock.now();
        Self {
            payer,
            limits,
            clock,
            window: Mutex::new(Window { spent: 0, start }),
        }
    }

    /// Payer this guard acts for.
    pub fn payer(&self) -> &Identity {
        &self.payer
    }

    /// Configured limits.
    pub fn limits(&self) -> SpendingLimits {
        self.limits
    }

    /// Current time as seen by the guard.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Shared handle to the guard's clock.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn window(&self) -> Result<MutexGuard<'_, Window>, BudgetError> {
        self.window
            .lock()
            .map_err(|_| BudgetError::LockPoisoned("spending window lock poisoned".into()))
    }

    /// Reserve `amount` for one item.
    ///
    /// A rejected reservation leaves the spend unchanged.
    pub fn reserve(&self, amount: Amount) -> Result<Reservation, BudgetError> {
        let window_start = self.commit(&[amount])?;
        Ok(Reservation {
            amount,
            window_start,
        })
    }

    /// Reserve several items at once.
    ///
    /// Every amount is checked against the per-item ceiling and the sum
    /// against the daily ceiling; either all are committed or none are.
    pub fn reserve_many(&self, amounts: &[Amount]) -> Result<Vec<Reservation>, BudgetError> {
        let window_start = self.commit(amounts)?;
        Ok(amounts
            .iter()
            .map(|&amount| Reservation {
                amount,
                window_start,
            })
            .collect())
    }

    /// Check `amounts` against both ceilings and add them to the window.
    /// Returns the start of the window they were committed to.
    fn commit(&self, amounts: &[Amount]) -> Result<Timestamp, BudgetError> {
        let now = self.now();
        let mut window = self.window()?;
        window.roll(now, &self.payer);

        if let Some(&amount) = amounts.iter().find(|&&a| a > self.limits.per_item_ceiling) {
            warn!(
                payer = %self.payer,
                amount,
                ceiling = self.limits.per_item_ceiling,
                "Per-item ceiling exceeded"
            );
            return Err(BudgetError::PerItemCeilingExceeded {
                amount,
                ceiling: self.limits.per_item_ceiling,
            });
        }

        let requested = amounts
            .iter()
            .try_fold(0 as Amount, |acc, &a| acc.checked_add(a))
            .ok_or(BudgetError::Overflow)?;
        let new_spent = window
            .spent
            .checked_add(requested)
            .ok_or(BudgetError::Overflow)?;
        if new_spent > self.limits.daily_ceiling {
            warn!(
                payer = %self.payer,
                requested,
                spent = window.spent,
                ceiling = self.limits.daily_ceiling,
                "Daily ceiling exceeded"
            );
            return Err(BudgetError::DailyCeilingExceeded {
                requested,
                spent: window.spent,
                ceiling: self.limits.daily_ceiling,
            });
        }

        window.spent = new_spent;
        debug!(payer = %self.payer, requested, spent = new_spent, "Budget reserved");
        Ok(window.start)
    }

    /// Give back a reservation whose transfer did not go through.
    ///
    /// Only applies if the reservation's window is still current; a release
    /// never reduces spend in a newer window.
    pub fn release(&self, reservation: Reservation) -> Result<(), BudgetError> {
        let mut window = self.window()?;
        if window.start != reservation.window_start {
            debug!(
                payer = %self.payer,
                amount = reservation.amount,
                "Release skipped, window has rolled"
            );
            return Ok(());
        }
        window.spent = window.spent.saturating_sub(reservation.amount);
        debug!(
            payer = %self.payer,
            amount = reservation.amount,
            spent = window.spent,
            "Budget released"
        );
        Ok(())
    }

    /// Spent in the current window. Read-only: an expired window reads as zero.
    pub fn spent(&self) -> Result<Amount, BudgetError> {
        let now = self.now();
        let window = self.window()?;
        Ok(if window.expired(now) { 0 } else { window.spent })
    }

    /// Daily ceiling minus spent. Read-only.
    pub fn remaining(&self) -> Result<Amount, BudgetError> {
        Ok(self.limits.daily_ceiling.saturating_sub(self.spent()?))
    }

    /// Start of the current window.
    pub fn window_start(&self) -> Result<Timestamp, BudgetError> {
        Ok(self.window()?.start)
    }

    /// Replace the window state, e.g. from a persisted purchase log.
    pub fn restore(&self, spent: Amount, window_start: Timestamp) -> Result<(), BudgetError> {
        let mut window = self.window()?;
        window.spent = spent;
        window.start = window_start;
        info!(payer = %self.payer, spent, window_start, "Spending window restored");
        Ok(())
    }

    /// Snapshot for display.
    pub fn status(&self) -> Result<BudgetStatus, BudgetError> {
        let now = self.now();
        let window = self.window()?;
        let (spent, start) = if window.expired(now) {
            (0, now)
        } else {
            (window.spent, window.start)
        };
        Ok(BudgetStatus {
            payer: self.payer.clone(),
            daily_ceiling: self.limits.daily_ceiling,
            per_item_ceiling: self.limits.per_item_ceiling,
            spent,
            remaining: self.limits.daily_ceiling.saturating_sub(spent),
            window_start: start,
            resets_at: start.saturating_add(SPENDING_WINDOW_SECS),
        })
    }
}
