use std::time::Duration;

/// Idle-poll delay for the merge loop: doubles with every empty poll, capped
/// at `max_delay`, and drops back to `base_delay` once a unit is found.
#[derive(Clone, Debug)]
pub struct PollBackoff {
    idle_polls: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl PollBackoff {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            idle_polls: 0,
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
        }
    }

    /// Registers one more empty poll and returns how long to wait.
    pub fn next_delay(&mut self) -> Duration {
        self.idle_polls = self.idle_polls.saturating_add(1);
        self.delay_for(self.idle_polls)
    }

    pub fn reset(&mut self) {
        self.idle_polls = 0;
    }

    pub fn idle_polls(&self) -> u32 {
        self.idle_polls
    }

    fn delay_for(&self, idle_polls: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::from_millis(0);
        }

        let exponent = idle_polls.saturating_sub(1).min(16);
        let factor = 1u128 << exponent;
        let base_us = self.base_delay.as_micros();
        let delay_us = base_us.saturating_mul(factor);
        let capped = delay_us.min(self.max_delay.as_micros());
        Duration::from_micros(capped as u64)
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(1), Duration::from_millis(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_until_cap() {
        let mut backoff = PollBackoff::default();
        let delays = (0..9).map(|_| backoff.next_delay()).collect::<Vec<_>>();
        assert_eq!(delays[0], Duration::from_millis(1));
        assert_eq!(delays[1], Duration::from_millis(2));
        assert_eq!(delays[6], Duration::from_millis(64));
        assert_eq!(delays[7], Duration::from_millis(100));
        assert_eq!(delays[8], Duration::from_millis(100));
    }

    #[test]
    fn test_reset_restarts_from_base() {
        let mut backoff = PollBackoff::default();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.idle_polls(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_millis(1));
    }

    #[test]
    fn test_zero_base_never_sleeps() {
        let mut backoff = PollBackoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.next_delay(), Duration::ZERO);
    }
}
