use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter between submission attempts.
///
/// Delay is `min(max_delay, base * 2^attempt)` plus up to `jitter_factor`
/// of that delay in either direction.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max_delay: Duration, jitter_factor: f64) -> Self {
        Self {
            base,
            max_delay,
            // gen_range panics on an inverted range
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
            attempt: 0,
        }
    }

    /// Next delay; advances the attempt counter
    pub fn next_delay(&mut self) -> Duration {
        let exp_delay = self.base.saturating_mul(2u32.saturating_pow(self.attempt));
        let capped = exp_delay.min(self.max_delay);

        let jitter_range = capped.as_secs_f64() * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        let secs = (capped.as_secs_f64() + jitter).clamp(0.0, self.max_delay.as_secs_f64());

        self.attempt = self.attempt.saturating_add(1);
        Duration::from_secs_f64(secs)
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
