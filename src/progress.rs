//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring multi-frame
//! extraction, [`CancellationToken`] for cooperative cancellation, and
//! [`ProgressInfo`] for progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use braw_input::{
//!     BrawError, ExtractOptions, FrameRange, OpenOptions, ProgressCallback, ProgressInfo,
//!     ScanlineReader,
//! };
//! use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% of frames decoded");
//!         }
//!     }
//! }
//!
//! let library = SyntheticLibrary::new(SyntheticClipSpec::default());
//! let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
//! let reader = ScanlineReader::open("clip.braw", &options, &library)?;
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! reader.for_each_frame(FrameRange::Range(0, 1), &options, |_, _| Ok(()))?;
//! # Ok::<(), BrawError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of extraction progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many frames have been processed so far.
    pub current: u64,
    /// Total frames expected.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The frame most recently processed.
    pub current_frame: Option<u64>,
}

/// Trait for receiving progress updates during extraction.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks may be
/// invoked from a blocking worker when frames are streamed asynchronously.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone the token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any of them to stop the
/// associated extraction before its next frame.
///
/// # Example
///
/// ```
/// use braw_input::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed frame and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, frame_index: u64) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(Some(frame_index));
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, frame_index: Option<u64>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.div_f64(self.current as f64).mul_f64(remaining as f64)
            })
        } else {
            None
        };

        self.callback.on_progress(&ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_index,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Last(Mutex<Option<ProgressInfo>>);

    impl ProgressCallback for Last {
        fn on_progress(&self, info: &ProgressInfo) {
            *self.0.lock().unwrap() = Some(info.clone());
        }
    }

    #[test]
    fn estimate_survives_counts_beyond_u32() {
        let last = Arc::new(Last::default());
        let mut tracker = ProgressTracker::new(last.clone(), Some(2 << 32), 1);
        tracker.start_time = Instant::now()
            .checked_sub(Duration::from_secs(8))
            .expect("Failed to rewind start time");
        tracker.current = 1 << 32;

        tracker.finish();

        let info = last.0.lock().unwrap().clone().expect("Expected a report");
        let estimate = info.estimated_remaining.expect("Expected an estimate");
        // Half the work is done, so the estimate matches the elapsed time.
        let drift = estimate.abs_diff(info.elapsed);
        assert!(drift < Duration::from_millis(1), "drift {drift:?}");
        assert!(estimate >= Duration::from_secs(8));
    }
}
