//local shortcuts

//third-party shortcuts

//standard shortcuts
use std::time::{Duration, Instant};

//-------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone)]
pub struct RateLimitConfig
{
    /// Length of time over which `max_count` frames are allowed to refill.
    pub period: Duration,
    /// Bucket capacity: the largest burst of frames admitted back-to-back.
    pub max_count: u32,
}

//-------------------------------------------------------------------------------------------------------------------

/// Per-session inbound frame rate limit, implemented as a token bucket: the bucket starts full (`max_count`
/// tokens), drains one token per decoded frame, and refills continuously at `max_count / period` tokens per
/// second. Unlike a fixed-window counter, a burst that arrives right at a window boundary can't double up — the
/// refill rate is smooth rather than reset in discrete steps, which matters for a FIX decode loop where frames off
/// the wire can arrive in an arbitrarily bursty pattern relative to wall-clock boundaries. If fewer than one token
/// is available, [`RateLimitTracker::try_count_msg()`] returns `false` and the caller should treat the session the
/// same as any other protocol violation (reject and close).
#[derive(Debug)]
pub(crate) struct RateLimitTracker
{
    config: RateLimitConfig,
    /// Tokens per second added to the bucket; precomputed once since `config` never changes after construction.
    refill_rate: f64,
    tokens: f64,
    last_refill: Instant,
}

impl RateLimitTracker
{
    pub(crate) fn new(config: RateLimitConfig) -> RateLimitTracker
    {
        let refill_rate = config.max_count as f64 / config.period.as_secs_f64().max(f64::MIN_POSITIVE);
        RateLimitTracker{
            config,
            refill_rate,
            tokens: config.max_count as f64,
            last_refill: Instant::now(),
        }
    }

    pub(crate) fn try_count_msg(&mut self) -> bool
    {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;

        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.config.max_count as f64);

        if self.tokens < 1.0 { return false; }
        self.tokens -= 1.0;
        true
    }
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn flags_a_burst_of_inbound_fix_frames_above_the_configured_count()
    {
        let mut tracker = RateLimitTracker::new(RateLimitConfig{
            period: Duration::from_secs(3600),
            max_count: 3,
        });

        assert!(tracker.try_count_msg());
        assert!(tracker.try_count_msg());
        assert!(tracker.try_count_msg());
        assert!(!tracker.try_count_msg());
    }

    #[test]
    fn bucket_never_refills_past_capacity()
    {
        let mut tracker = RateLimitTracker::new(RateLimitConfig{
            period: Duration::from_millis(1),
            max_count: 2,
        });

        std::thread::sleep(Duration::from_millis(5));
        assert!(tracker.try_count_msg());
        assert!(tracker.try_count_msg());
        assert!(!tracker.try_count_msg());
    }
}

//-------------------------------------------------------------------------------------------------------------------
