//! Synchronous decode on top of the codec's asynchronous job pipeline.
//!
//! A frame decode is a chain of two native jobs. The read job delivers a
//! [`Frame`] handle to [`CodecCallback::read_complete`] on the codec's worker
//! thread; from there a decode-and-process job is submitted, whose
//! [`ProcessedImage`] arrives at [`CodecCallback::process_complete`].
//!
//! [`FrameDecodeBridge`] tracks that chain as an explicit task:
//!
//! ```text
//! Idle → ReadSubmitted → ReadFailed
//!                      → MetadataReady                      (metadata-only cycle)
//!                      → DecodeSubmitted → ProcessComplete
//!                                        → ProcessFailed
//! ```
//!
//! The callbacks advance the task and signal a condition variable;
//! [`flush`](FrameDecodeBridge::flush) drains the codec and waits on that
//! signal, turning the asynchronous completion into a synchronous result.
//! Exactly one decode is in flight at a time and the decoded bytes live in a
//! single buffer tagged with the frame it holds.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::codec::{
    Clip, Codec, CodecCallback, Frame, NativeResult, ProcessedImage, ProcessingOverrides,
    ResourceFormat,
};
use crate::color::ColorPipeline;
use crate::configuration::{FrameLayout, PixelFormat};
use crate::error::BrawError;

/// What a decode cycle produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Read, decode, and process the frame into the frame buffer.
    Full,
    /// Read the frame only and retain its handle for metadata inspection.
    MetadataOnly,
}

/// Position of the current decode cycle in the job chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePhase {
    Idle,
    ReadSubmitted,
    ReadFailed,
    DecodeSubmitted,
    MetadataReady,
    ProcessComplete,
    ProcessFailed,
}

impl DecodePhase {
    /// Returns `true` once no further callback is expected for the cycle.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            DecodePhase::Idle
                | DecodePhase::ReadFailed
                | DecodePhase::MetadataReady
                | DecodePhase::ProcessComplete
                | DecodePhase::ProcessFailed
        )
    }
}

struct DecodeTask {
    frame_index: u64,
    mode: DecodeMode,
    phase: DecodePhase,
    error: Option<BrawError>,
}

/// Single-slot decoded frame storage.
struct FrameBuffer {
    data: Vec<u8>,
    /// Frame the bytes belong to. `None` while the content is not valid.
    frame_index: Option<u64>,
}

impl FrameBuffer {
    fn store(&mut self, frame_index: u64, bytes: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(bytes);
        self.frame_index = Some(frame_index);
    }

    fn invalidate(&mut self) {
        self.frame_index = None;
    }

    fn check(&self, frame_index: u64) -> Result<(), BrawError> {
        if self.frame_index == Some(frame_index) {
            Ok(())
        } else {
            Err(BrawError::StaleFrame {
                requested: frame_index,
                held: self.frame_index,
            })
        }
    }
}

struct BridgeShared {
    layout: FrameLayout,
    resource_format: ResourceFormat,
    task: Mutex<DecodeTask>,
    settled: Condvar,
    buffer: Mutex<FrameBuffer>,
    retained: Mutex<Option<Arc<dyn Frame>>>,
    overrides: Mutex<ProcessingOverrides>,
}

impl BridgeShared {
    /// Move the task from `from` to `to` if it is still the cycle for
    /// `frame_index`, and wake waiters when the cycle settles.
    fn advance(
        &self,
        frame_index: u64,
        from: DecodePhase,
        to: DecodePhase,
        error: Option<BrawError>,
    ) -> bool {
        let mut task = self.task.lock();
        if task.frame_index != frame_index || task.phase != from {
            return false;
        }
        task.phase = to;
        task.error = error;
        if to.is_settled() {
            self.settled.notify_all();
        }
        true
    }

    /// The mode of the in-flight cycle if a callback for `frame_index` in
    /// `phase` is expected.
    fn expecting(&self, frame_index: u64, phase: DecodePhase) -> Option<DecodeMode> {
        let task = self.task.lock();
        (task.frame_index == frame_index && task.phase == phase).then_some(task.mode)
    }

    fn submit_decode(&self, frame: &dyn Frame, frame_index: u64) -> Result<(), BrawError> {
        let decode_failed = |reason: String| BrawError::DecodeFailed {
            frame_index,
            reason,
        };

        frame
            .set_resource_format(self.resource_format)
            .map_err(|error| decode_failed(format!("cannot set resource format: {error}")))?;

        let overrides = self.overrides.lock().clone();
        let job = frame
            .create_decode_and_process_job(&overrides)
            .map_err(|error| decode_failed(format!("cannot create decode job: {error}")))?;

        // The process callback may fire before submit returns.
        self.advance(
            frame_index,
            DecodePhase::ReadSubmitted,
            DecodePhase::DecodeSubmitted,
            None,
        );

        job.submit().map_err(|error| {
            self.task.lock().phase = DecodePhase::ReadSubmitted;
            decode_failed(format!("cannot submit decode job: {error}"))
        })
    }
}

/// Receives completions from the codec's worker thread.
struct BridgeCallback {
    shared: Arc<BridgeShared>,
}

impl CodecCallback for BridgeCallback {
    fn read_complete(&self, frame_index: u64, result: NativeResult<Arc<dyn Frame>>) {
        let shared = &self.shared;
        let Some(mode) = shared.expecting(frame_index, DecodePhase::ReadSubmitted) else {
            log::warn!("Ignoring read completion for frame {frame_index}: no read is pending");
            return;
        };

        let frame = match result {
            Ok(frame) => frame,
            Err(error) => {
                log::error!("Read of frame {frame_index} failed: {error}");
                shared.advance(
                    frame_index,
                    DecodePhase::ReadSubmitted,
                    DecodePhase::ReadFailed,
                    Some(BrawError::ReadFailed {
                        frame_index,
                        reason: error.to_string(),
                    }),
                );
                return;
            }
        };

        *shared.retained.lock() = Some(Arc::clone(&frame));

        if mode == DecodeMode::MetadataOnly {
            shared.advance(
                frame_index,
                DecodePhase::ReadSubmitted,
                DecodePhase::MetadataReady,
                None,
            );
            return;
        }

        if let Err(error) = shared.submit_decode(frame.as_ref(), frame_index) {
            log::error!("{error}");
            shared.advance(
                frame_index,
                DecodePhase::ReadSubmitted,
                DecodePhase::ReadFailed,
                Some(error),
            );
        }
    }

    fn process_complete(&self, frame_index: u64, result: NativeResult<Box<dyn ProcessedImage>>) {
        let shared = &self.shared;
        if shared
            .expecting(frame_index, DecodePhase::DecodeSubmitted)
            .is_none()
        {
            log::warn!("Ignoring processed image for frame {frame_index}: no decode is pending");
            return;
        }

        let outcome = result
            .and_then(|image| {
                let bytes = image.resource()?;
                let expected = shared.layout.frame_bytes();
                if bytes.len() != expected {
                    return Ok(Err(BrawError::ResourceSizeMismatch {
                        frame_index,
                        expected,
                        actual: bytes.len(),
                    }));
                }
                shared.buffer.lock().store(frame_index, bytes);
                Ok(Ok(()))
            })
            .unwrap_or_else(|error| {
                Err(BrawError::DecodeFailed {
                    frame_index,
                    reason: error.to_string(),
                })
            });

        match outcome {
            Ok(()) => {
                shared.advance(
                    frame_index,
                    DecodePhase::DecodeSubmitted,
                    DecodePhase::ProcessComplete,
                    None,
                );
            }
            Err(error) => {
                log::error!("{error}");
                shared.buffer.lock().invalidate();
                shared.advance(
                    frame_index,
                    DecodePhase::DecodeSubmitted,
                    DecodePhase::ProcessFailed,
                    Some(error),
                );
            }
        }
    }
}

/// Turns the codec's callback-driven jobs into blocking frame decodes.
///
/// Register [`callback`](FrameDecodeBridge::callback) with the codec, then
/// call [`decode`](FrameDecodeBridge::decode) followed by
/// [`flush`](FrameDecodeBridge::flush) for each frame. The bridge owns the
/// frame buffer and the frame handle retained by the latest cycle.
pub struct FrameDecodeBridge {
    shared: Arc<BridgeShared>,
}

impl FrameDecodeBridge {
    /// Create a bridge producing frames of `layout` in `pixel_format`.
    pub fn new(layout: FrameLayout, pixel_format: PixelFormat) -> Self {
        Self {
            shared: Arc::new(BridgeShared {
                layout,
                resource_format: pixel_format.to_resource_format(),
                task: Mutex::new(DecodeTask {
                    frame_index: 0,
                    mode: DecodeMode::Full,
                    phase: DecodePhase::Idle,
                    error: None,
                }),
                settled: Condvar::new(),
                buffer: Mutex::new(FrameBuffer {
                    data: Vec::new(),
                    frame_index: None,
                }),
                retained: Mutex::new(None),
                overrides: Mutex::new(ProcessingOverrides::default()),
            }),
        }
    }

    /// The callback to register with the codec.
    pub fn callback(&self) -> Arc<dyn CodecCallback> {
        Arc::new(BridgeCallback {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Carry `pipeline` into every subsequent decode-and-process job.
    pub fn set_color_pipeline(&self, pipeline: &ColorPipeline) {
        *self.shared.overrides.lock() = pipeline.overrides();
    }

    pub fn layout(&self) -> FrameLayout {
        self.shared.layout
    }

    /// Phase of the latest decode cycle.
    pub fn phase(&self) -> DecodePhase {
        self.shared.task.lock().phase
    }

    /// Frame currently held by the frame buffer.
    pub fn buffered_frame(&self) -> Option<u64> {
        self.shared.buffer.lock().frame_index
    }

    /// Submit a read job for `frame_index`.
    ///
    /// Releases the frame handle retained by the previous cycle and
    /// invalidates the frame buffer. Call [`flush`](Self::flush) before
    /// reading any result.
    ///
    /// # Errors
    ///
    /// - [`BrawError::DecodeInProgress`] if the previous cycle has not
    ///   settled.
    /// - [`BrawError::ReadFailed`] if the read job cannot be created or
    ///   submitted.
    pub fn decode(
        &self,
        clip: &dyn Clip,
        frame_index: u64,
        mode: DecodeMode,
    ) -> Result<(), BrawError> {
        {
            let mut task = self.shared.task.lock();
            if !task.phase.is_settled() {
                return Err(BrawError::DecodeInProgress {
                    requested: frame_index,
                    in_flight: task.frame_index,
                });
            }
            task.frame_index = frame_index;
            task.mode = mode;
            task.phase = DecodePhase::ReadSubmitted;
            task.error = None;
        }

        let previous = self.shared.retained.lock().take();
        drop(previous);
        self.shared.buffer.lock().invalidate();

        log::debug!("Submitting read job for frame {frame_index} ({mode:?})");

        let submitted = clip
            .create_read_job(frame_index)
            .map_err(|error| format!("cannot create read job: {error}"))
            .and_then(|job| {
                job.submit()
                    .map_err(|error| format!("cannot submit read job: {error}"))
            });

        if let Err(reason) = submitted {
            log::error!("Read of frame {frame_index} failed: {reason}");
            self.shared.task.lock().phase = DecodePhase::ReadFailed;
            return Err(BrawError::ReadFailed {
                frame_index,
                reason,
            });
        }
        Ok(())
    }

    /// Block until every submitted job has completed, then report the
    /// outcome of the current cycle.
    ///
    /// # Errors
    ///
    /// Returns the failure recorded by the callbacks:
    /// [`BrawError::ReadFailed`], [`BrawError::DecodeFailed`], or
    /// [`BrawError::ResourceSizeMismatch`].
    pub fn flush(&self, codec: &dyn Codec) -> Result<(), BrawError> {
        codec.flush_jobs();

        let mut task = self.shared.task.lock();
        while !task.phase.is_settled() {
            self.shared.settled.wait(&mut task);
        }

        match task.phase {
            DecodePhase::ReadFailed | DecodePhase::ProcessFailed => {
                let frame_index = task.frame_index;
                Err(task.error.take().unwrap_or(BrawError::ReadFailed {
                    frame_index,
                    reason: "decode cycle failed".to_string(),
                }))
            }
            _ => Ok(()),
        }
    }

    /// [`decode`](Self::decode) followed by [`flush`](Self::flush).
    pub fn decode_and_wait(
        &self,
        codec: &dyn Codec,
        clip: &dyn Clip,
        frame_index: u64,
        mode: DecodeMode,
    ) -> Result<(), BrawError> {
        self.decode(clip, frame_index, mode)?;
        self.flush(codec)
    }

    /// The frame handle retained by the latest cycle.
    pub fn retained_frame(&self) -> Option<Arc<dyn Frame>> {
        self.shared.retained.lock().clone()
    }

    /// Copy scanline `y` of `frame_index` into the front of `destination`.
    ///
    /// # Errors
    ///
    /// - [`BrawError::StaleFrame`] if the buffer does not hold `frame_index`.
    /// - [`BrawError::ScanlineOutOfRange`] if `y` is outside the frame.
    /// - [`BrawError::BufferTooSmall`] if `destination` is shorter than a row.
    pub fn copy_row(
        &self,
        frame_index: u64,
        y: u32,
        destination: &mut [u8],
    ) -> Result<(), BrawError> {
        let layout = self.shared.layout;
        if y >= layout.height {
            return Err(BrawError::ScanlineOutOfRange {
                y: i64::from(y),
                height: layout.height,
            });
        }
        let row_bytes = layout.row_bytes();
        check_capacity(row_bytes, destination.len())?;

        let buffer = self.shared.buffer.lock();
        buffer.check(frame_index)?;
        let start = y as usize * row_bytes;
        destination[..row_bytes].copy_from_slice(&buffer.data[start..start + row_bytes]);
        Ok(())
    }

    /// Copy the whole of `frame_index` into the front of `destination`.
    pub fn copy_frame(&self, frame_index: u64, destination: &mut [u8]) -> Result<(), BrawError> {
        let frame_bytes = self.shared.layout.frame_bytes();
        check_capacity(frame_bytes, destination.len())?;

        let buffer = self.shared.buffer.lock();
        buffer.check(frame_index)?;
        destination[..frame_bytes].copy_from_slice(&buffer.data[..frame_bytes]);
        Ok(())
    }

    /// Drop the retained frame handle and invalidate the buffer.
    pub fn release(&self) {
        let previous = self.shared.retained.lock().take();
        drop(previous);
        self.shared.buffer.lock().invalidate();
    }
}

impl Drop for FrameDecodeBridge {
    fn drop(&mut self) {
        self.release();
    }
}

fn check_capacity(required: usize, provided: usize) -> Result<(), BrawError> {
    if provided < required {
        return Err(BrawError::BufferTooSmall { required, provided });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_phases() {
        assert!(DecodePhase::Idle.is_settled());
        assert!(DecodePhase::MetadataReady.is_settled());
        assert!(DecodePhase::ProcessFailed.is_settled());
        assert!(!DecodePhase::ReadSubmitted.is_settled());
        assert!(!DecodePhase::DecodeSubmitted.is_settled());
    }

    #[test]
    fn empty_bridge_has_no_frame() {
        let layout = FrameLayout::new(4, 2, PixelFormat::Rgba8);
        let bridge = FrameDecodeBridge::new(layout, PixelFormat::Rgba8);
        assert_eq!(bridge.phase(), DecodePhase::Idle);
        assert_eq!(bridge.buffered_frame(), None);

        let mut row = [0_u8; 16];
        let result = bridge.copy_row(0, 0, &mut row);
        assert!(matches!(result, Err(BrawError::StaleFrame { requested: 0, held: None })));
    }

    #[test]
    fn row_copy_rejects_short_destination() {
        let layout = FrameLayout::new(4, 2, PixelFormat::Rgba8);
        let bridge = FrameDecodeBridge::new(layout, PixelFormat::Rgba8);
        let mut row = [0_u8; 8];
        let result = bridge.copy_row(0, 0, &mut row);
        assert!(matches!(
            result,
            Err(BrawError::BufferTooSmall { required: 16, provided: 8 })
        ));
    }
}
