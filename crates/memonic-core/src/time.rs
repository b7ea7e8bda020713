//! Monotonic millisecond time source.
//!
//! `tau_created`/`tau_accessed` must never observably decrease, even if the
//! wall clock is stepped backward (NTP correction, VM migration). `now_millis`
//! wraps `chrono::Utc::now()` in a ratchet: it remembers the highest value it
//! has ever returned and never returns less than that.

use std::sync::atomic::{AtomicI64, Ordering};

static HIGH_WATER_MARK: AtomicI64 = AtomicI64::new(0);

/// Current time in milliseconds since the Unix epoch, guaranteed
/// non-decreasing across calls within this process.
pub fn now_millis() -> i64 {
    let wall = chrono::Utc::now().timestamp_millis();
    let mut prev = HIGH_WATER_MARK.load(Ordering::Relaxed);
    loop {
        let candidate = wall.max(prev + 1).max(wall);
        let next = if wall > prev { wall } else { prev + 1 };
        match HIGH_WATER_MARK.compare_exchange_weak(
            prev,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
        let _ = candidate;
    }
}

/// Milliseconds elapsed since `since`, saturating at zero (never negative).
pub fn elapsed_ms_since(since: i64) -> i64 {
    (now_millis() - since).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_across_many_calls() {
        let mut last = now_millis();
        for _ in 0..1000 {
            let next = now_millis();
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn elapsed_is_never_negative() {
        let t = now_millis();
        assert!(elapsed_ms_since(t + 10_000) == 0);
    }
}
