//! Multi-frame extraction.
//!
//! [`FrameRange`] names a set of subimages; [`ScanlineReader::frames`] and
//! [`ScanlineReader::for_each_frame`] decode them in order, one at a time,
//! through the same frame buffer that serves scanline reads.

use image::DynamicImage;

use crate::configuration::ExtractOptions;
use crate::error::BrawError;
use crate::progress::ProgressTracker;
use crate::reader::ScanlineReader;

/// Specifies which frames to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRange {
    /// Frames from start to end (inclusive, 0-indexed).
    Range(u64, u64),
    /// Every Nth frame of the clip, starting at 0.
    Interval(u64),
    /// Frames at specific indices, in the order given.
    Specific(Vec<u64>),
}

impl FrameRange {
    /// Expand into frame indices for a clip of `frame_count` frames.
    ///
    /// # Errors
    ///
    /// - [`BrawError::InvalidRange`] if a range starts after it ends.
    /// - [`BrawError::InvalidInterval`] for an interval of zero.
    /// - [`BrawError::SubimageOutOfRange`] if any index is past the end.
    pub fn resolve(&self, frame_count: u64) -> Result<Vec<u64>, BrawError> {
        let out_of_range = |index: u64| BrawError::SubimageOutOfRange {
            subimage: i64::try_from(index).unwrap_or(i64::MAX),
            subimage_count: frame_count,
        };

        match self {
            FrameRange::Range(start, end) => {
                if start > end {
                    return Err(BrawError::InvalidRange {
                        start: *start,
                        end: *end,
                    });
                }
                if *end >= frame_count {
                    return Err(out_of_range(*end));
                }
                Ok((*start..=*end).collect())
            }
            FrameRange::Interval(step) => {
                if *step == 0 {
                    return Err(BrawError::InvalidInterval);
                }
                let step = usize::try_from(*step).unwrap_or(usize::MAX);
                Ok((0..frame_count).step_by(step).collect())
            }
            FrameRange::Specific(indices) => {
                if let Some(&index) = indices.iter().find(|&&index| index >= frame_count) {
                    return Err(out_of_range(index));
                }
                Ok(indices.clone())
            }
        }
    }
}

impl ScanlineReader {
    /// Decode every frame in `range` into memory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use braw_input::{BrawError, FrameRange, OpenOptions, ScanlineReader};
    /// use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
    ///
    /// let library = SyntheticLibrary::new(SyntheticClipSpec::default().with_frame_count(48));
    /// let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
    /// let reader = ScanlineReader::open("clip.braw", &options, &library)?;
    /// let frames = reader.frames(FrameRange::Interval(24))?;
    /// assert_eq!(frames.len(), 2);
    /// # Ok::<(), BrawError>(())
    /// ```
    pub fn frames(&self, range: FrameRange) -> Result<Vec<DynamicImage>, BrawError> {
        let mut frames = Vec::new();
        self.for_each_frame(range, &ExtractOptions::new(), |_, image| {
            frames.push(image);
            Ok(())
        })?;
        Ok(frames)
    }

    /// Decode each frame in `range` and hand it to `callback`.
    ///
    /// Progress is reported through `options` every `batch_size` frames and
    /// once at the end. Cancellation is checked before each frame. An error
    /// from `callback` stops extraction and is returned as is.
    ///
    /// # Errors
    ///
    /// - Range errors from [`FrameRange::resolve`].
    /// - [`BrawError::Cancelled`] if the token in `options` is cancelled.
    /// - Any decode error from [`frame_image`](Self::frame_image).
    pub fn for_each_frame<F>(
        &self,
        range: FrameRange,
        options: &ExtractOptions,
        mut callback: F,
    ) -> Result<(), BrawError>
    where
        F: FnMut(u64, DynamicImage) -> Result<(), BrawError>,
    {
        let indices = range.resolve(self.subimage_count())?;
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            Some(indices.len() as u64),
            options.batch_size,
        );

        log::debug!("Extracting {} frames", indices.len());

        for frame_index in indices {
            if options.is_cancelled() {
                log::debug!("Extraction cancelled before frame {frame_index}");
                return Err(BrawError::Cancelled);
            }
            let subimage = i32::try_from(frame_index).map_err(|_| BrawError::SubimageOutOfRange {
                subimage: i64::try_from(frame_index).unwrap_or(i64::MAX),
                subimage_count: self.subimage_count(),
            })?;
            let image = self.frame_image(subimage)?;
            callback(frame_index, image)?;
            tracker.advance(frame_index);
        }

        tracker.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive() {
        assert_eq!(FrameRange::Range(1, 3).resolve(10).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let result = FrameRange::Range(5, 2).resolve(10);
        assert!(matches!(result, Err(BrawError::InvalidRange { start: 5, end: 2 })));
    }

    #[test]
    fn range_past_end_is_rejected() {
        let result = FrameRange::Range(0, 10).resolve(10);
        assert!(matches!(
            result,
            Err(BrawError::SubimageOutOfRange { subimage: 10, subimage_count: 10 })
        ));
    }

    #[test]
    fn interval_steps_from_zero() {
        assert_eq!(FrameRange::Interval(4).resolve(10).unwrap(), vec![0, 4, 8]);
        assert!(matches!(
            FrameRange::Interval(0).resolve(10),
            Err(BrawError::InvalidInterval)
        ));
    }

    #[test]
    fn specific_keeps_order() {
        let indices = FrameRange::Specific(vec![7, 2, 7]).resolve(8).unwrap();
        assert_eq!(indices, vec![7, 2, 7]);
        assert!(FrameRange::Specific(vec![8]).resolve(8).is_err());
    }
}
