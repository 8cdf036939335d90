//! Publish-age cooldown evaluation
//!
//! A cooldown suppresses an update until its publish timestamp is older
//! than the configured threshold. Pure and deterministic: the caller
//! supplies the clock.

use chrono::{DateTime, Duration, Utc};

/// Reports whether a version published at `published` is old enough given
/// `min_days`. If `min_days <= 0`, it always returns true.
///
/// If `published` is empty or unparseable and `min_days > 0`, it returns
/// false. Timestamps are RFC 3339, with or without fractional seconds.
/// Negative ages (future timestamps) clamp to zero.
pub fn eligible(published: &str, min_days: i64, now: DateTime<Utc>) -> bool {
    if min_days <= 0 {
        return true;
    }
    if published.is_empty() {
        return false;
    }

    let published = match DateTime::parse_from_rfc3339(published) {
        Ok(t) => t.with_timezone(&Utc),
        Err(_) => return false,
    };

    let age = now.signed_duration_since(published).max(Duration::zero());
    age >= Duration::hours(min_days * 24)
}
