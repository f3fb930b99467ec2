//! Error types for the `braw-input` crate.
//!
//! This module defines [`BrawError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry the context needed to
//! diagnose a failure: file paths, frame numbers, and the native codec's
//! failure code where one exists.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

use crate::codec::NativeError;

/// The unified error type for all `braw-input` operations.
///
/// Every public method that can fail returns `Result<T, BrawError>`.
/// Usage errors (out-of-range subimage, mip level, or scanline) are
/// reported before any reader state is touched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BrawError {
    /// Neither a build-time nor an explicit location for the native codec
    /// library was provided.
    #[error(
        "Blackmagic RAW library location is not configured (set BRAW_LIBRARIES at build time or use OpenOptions::with_library_path)"
    )]
    LibraryLocationMissing,

    /// The clip could not be opened.
    #[error("Failed to open clip at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::ScanlineReader::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The codec could not report which values a camera model accepts for
    /// a processing attribute.
    #[error("Camera {camera_type:?} has no usable value list for {attribute}: {source}")]
    CameraAttributesUnavailable {
        /// Camera model reported by the clip.
        camera_type: String,
        /// Processing attribute that was queried.
        attribute: &'static str,
        /// Native failure returned by the constants lookup.
        source: NativeError,
    },

    /// A native codec call failed.
    #[error("Native codec call {operation} failed: {source}")]
    Native {
        /// Name of the failing operation.
        operation: &'static str,
        /// Native failure code and message.
        source: NativeError,
    },

    /// An operation that needs an open clip was called on a closed reader.
    #[error("No clip is open")]
    NotOpen,

    /// The requested subimage does not exist in the clip.
    #[error("Subimage {subimage} is out of range (clip has {subimage_count} frames)")]
    SubimageOutOfRange {
        /// The subimage index that was requested.
        subimage: i64,
        /// Number of frames in the clip.
        subimage_count: u64,
    },

    /// Clips carry no reduced-resolution levels; only mip level 0 exists.
    #[error("Mip level {0} is not available (only level 0 exists)")]
    MipLevelUnsupported(i32),

    /// The requested scanline lies outside the frame.
    #[error("Scanline {y} is out of range (frame height is {height})")]
    ScanlineOutOfRange {
        /// The scanline that was requested.
        y: i64,
        /// The frame height in rows.
        height: u32,
    },

    /// The caller's destination buffer cannot hold the requested data.
    #[error("Destination buffer holds {provided} bytes but {required} are required")]
    BufferTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes supplied.
        provided: usize,
    },

    /// The read job for a frame could not be created, submitted, or
    /// completed.
    #[error("Failed to read frame {frame_index}: {reason}")]
    ReadFailed {
        /// Frame whose read failed.
        frame_index: u64,
        /// Underlying reason.
        reason: String,
    },

    /// The decode-and-process stage for a frame failed.
    #[error("Failed to decode frame {frame_index}: {reason}")]
    DecodeFailed {
        /// Frame whose decode failed.
        frame_index: u64,
        /// Underlying reason.
        reason: String,
    },

    /// The processed image did not have the byte size implied by the clip
    /// dimensions and output pixel format. The frame buffer is invalidated
    /// rather than left holding a previous frame.
    #[error("Processed image for frame {frame_index} is {actual} bytes, expected {expected}")]
    ResourceSizeMismatch {
        /// Frame whose processed image was rejected.
        frame_index: u64,
        /// Byte size derived from width × height × channels × element size.
        expected: usize,
        /// Byte size the codec delivered.
        actual: usize,
    },

    /// The frame buffer does not hold the frame that was asked for.
    #[error("Frame buffer holds {held:?}, not frame {requested}")]
    StaleFrame {
        /// Frame that was requested.
        requested: u64,
        /// Frame currently held, if any.
        held: Option<u64>,
    },

    /// A decode was requested while another is still in flight.
    #[error("Cannot decode frame {requested} while frame {in_flight} is still being decoded")]
    DecodeInProgress {
        /// Frame that was requested.
        requested: u64,
        /// Frame whose decode has not completed.
        in_flight: u64,
    },

    /// No decoded frame handle is available for metadata inspection.
    #[error("No frame handle is retained for metadata inspection")]
    NoRetainedFrame,

    /// The output pixel format cannot be represented as an
    /// [`image::DynamicImage`].
    #[error("Pixel format {0} cannot be converted to an image")]
    UnsupportedImageFormat(&'static str),

    /// A range's start value is greater than its end value.
    #[error("Invalid range: start ({start}) must not exceed end ({end})")]
    InvalidRange {
        /// The start of the range.
        start: u64,
        /// The end of the range.
        end: u64,
    },

    /// An interval of zero was provided.
    #[error("Interval must be greater than zero")]
    InvalidInterval,

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error occurred while writing output files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while building or saving a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl BrawError {
    /// Wrap a native failure with the name of the call that produced it.
    pub(crate) fn native(operation: &'static str, source: NativeError) -> Self {
        BrawError::Native { operation, source }
    }
}
