//! Progress observers.
//!
//! Progress is a side channel: sinks see byte counts and totals but never
//! influence the download.

use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress events from part fetchers.
pub trait ProgressSink: Send + Sync {
    /// `bytes` more bytes were written.
    fn update(&self, bytes: u64);

    /// The total number of bytes expected became known.
    fn set_total(&self, total: u64);
}

/// A lock-free progress sink that only counts.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    bytes: AtomicU64,
    total: AtomicU64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// The last total reported, or `None` if none was.
    pub fn total(&self) -> Option<u64> {
        match self.total.load(Ordering::Relaxed) {
            0 => None,
            total => Some(total),
        }
    }
}

impl ProgressSink for ProgressCounter {
    fn update(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }
}

#[cfg(feature = "indicatif")]
mod bar {
    use indicatif::{ProgressBar, ProgressStyle};
    use once_cell::sync::Lazy;

    use super::ProgressSink;

    const PB_STYLE: &str = "{spinner:.blue} {msg:.cyan} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

    const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

    const PB_CHARS: &str = "█▓▒░  ";

    static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
        ProgressStyle::with_template(PB_STYLE)
            .ok()
            .map(|style| style.tick_chars(TICK).progress_chars(PB_CHARS))
    });

    /// Build a byte progress bar styled for downloads.
    pub fn progress_bar(total: Option<u64>, message: impl Into<String>) -> ProgressBar {
        let pb = match total {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::no_length(),
        };
        let pb = match PB_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        pb.with_message(message.into())
    }

    impl ProgressSink for ProgressBar {
        fn update(&self, bytes: u64) {
            self.inc(bytes);
        }

        fn set_total(&self, total: u64) {
            self.set_length(total);
        }
    }
}

#[cfg(feature = "indicatif")]
pub use bar::progress_bar;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counter_accumulates() {
        let counter = ProgressCounter::new();
        assert_eq!(counter.total(), None);

        counter.update(10);
        counter.update(5);
        counter.set_total(100);

        assert_eq!(counter.bytes(), 15);
        assert_eq!(counter.total(), Some(100));
    }

    #[test]
    fn test_counter_shared_across_threads() {
        let counter = Arc::new(ProgressCounter::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.update(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.bytes(), 4000);
    }

    #[cfg(feature = "indicatif")]
    #[test]
    fn test_progress_bar_is_a_sink() {
        let pb = progress_bar(None, "test");
        let sink: &dyn ProgressSink = &pb;
        sink.set_total(100);
        sink.update(40);
        assert_eq!(pb.length(), Some(100));
        assert_eq!(pb.position(), 40);
    }
}
