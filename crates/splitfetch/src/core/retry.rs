use std::time::Duration;

/// Longest wait between two attempts of the same part.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Delay before retry number `retry_count` (0-indexed): `base * 2^retry_count`,
/// capped at [`MAX_RETRY_DELAY`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use splitfetch::core::retry_delay;
///
/// let base = Duration::from_millis(100);
/// assert_eq!(retry_delay(0, base), Duration::from_millis(100));
/// assert_eq!(retry_delay(2, base), Duration::from_millis(400));
/// assert_eq!(retry_delay(20, base), Duration::from_secs(30));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier).min(MAX_RETRY_DELAY)
}
