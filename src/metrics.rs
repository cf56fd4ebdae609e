//! Per-report engagement counters
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Views,
    Upvotes,
    Downvotes,
    ResolutionAttempts,
}

/// Counters only ever move up by one per successful call.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    #[n(0)]
    pub views: u64,
    #[n(1)]
    pub upvotes: u64,
    #[n(2)]
    pub downvotes: u64,
    #[n(3)]
    pub resolution_attempts: u64,
}

impl Metrics {
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Views => self.views,
            Counter::Upvotes => self.upvotes,
            Counter::Downvotes => self.downvotes,
            Counter::ResolutionAttempts => self.resolution_attempts,
        }
    }

    /// Returns the bumped copy, leaving `self` untouched. Saturates rather
    /// than wrapping.
    pub fn incremented(&self, counter: Counter) -> Self {
        let mut next = *self;
        let slot = match counter {
            Counter::Views => &mut next.views,
            Counter::Upvotes => &mut next.upvotes,
            Counter::Downvotes => &mut next.downvotes,
            Counter::ResolutionAttempts => &mut next.resolution_attempts,
        };
        *slot = slot.saturating_add(1);
        next
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Counter::Views => "views",
            Counter::Upvotes => "upvotes",
            Counter::Downvotes => "downvotes",
            Counter::ResolutionAttempts => "resolution-attempts",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_only_the_named_counter() {
        let zero = Metrics::default();
        let next = zero.incremented(Counter::Downvotes);

        assert_eq!(zero, Metrics::default());
        assert_eq!(next.downvotes, 1);
        assert_eq!(next.views + next.upvotes + next.resolution_attempts, 0);
    }

    #[test]
    fn saturates_at_max() {
        let full = Metrics {
            views: u64::MAX,
            ..Metrics::default()
        };
        assert_eq!(full.incremented(Counter::Views).get(Counter::Views), u64::MAX);
    }
}
