//! Polling configuration
//!
//! By default a transaction waits forever for each bus event. A stall budget turns a device that
//! never answers into a [`Timeout`](crate::Error::Timeout) instead.

/// Configuration for a [`Transaction`](crate::Transaction).
///
/// ```
/// use max6692_nb::PollConfig;
///
/// let config = PollConfig::new().max_stalled_polls(500);
/// assert_eq!(config.stall_budget(), Some(500));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollConfig {
    max_stalled_polls: Option<u32>,
}

impl PollConfig {
    /// No stall budget: transactions wait indefinitely for each event.
    #[inline]
    pub const fn new() -> Self {
        PollConfig {
            max_stalled_polls: None,
        }
    }

    /// Tolerate up to `polls` consecutive polls that make no progress; the next stalled poll
    /// fails the transaction with [`Timeout`](crate::Error::Timeout). The count restarts whenever
    /// the transaction advances, so every waiting state gets the full budget.
    #[inline]
    pub const fn max_stalled_polls(mut self, polls: u32) -> Self {
        self.max_stalled_polls = Some(polls);
        self
    }

    /// Remove any stall budget.
    #[inline]
    pub const fn unlimited(mut self) -> Self {
        self.max_stalled_polls = None;
        self
    }

    /// The configured stall budget, if any.
    #[inline]
    pub const fn stall_budget(&self) -> Option<u32> {
        self.max_stalled_polls
    }

    // Whether `stalls` consecutive stalled polls exhaust the budget.
    #[inline]
    pub(crate) fn exhausted(&self, stalls: u32) -> bool {
        match self.max_stalled_polls {
            Some(max) => stalls > max,
            None => false,
        }
    }
}
