//! Open-time and extraction configuration.
//!
//! [`OpenOptions`] carries the settings that shape a clip's decode: the
//! requested color gamut and gamma, the output pixel format, and where the
//! native codec library lives. [`ExtractOptions`] threads progress callbacks
//! and cancellation tokens through multi-frame extraction without polluting
//! every function signature.
//!
//! # Example
//!
//! ```no_run
//! use braw_input::{OpenOptions, PixelFormat};
//!
//! let options = OpenOptions::new()
//!     .with_gamut("Rec.709")
//!     .with_gamma("Blackmagic Design Film")
//!     .with_pixel_format(PixelFormat::Rgba16)
//!     .with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::ResourceFormat;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Output pixel format of decoded frames.
///
/// All formats are interleaved four-channel; they differ in channel order
/// and element size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 8-bit RGBA. This is the default.
    #[default]
    Rgba8,
    /// 8-bit BGRA.
    Bgra8,
    /// 16-bit RGBA.
    Rgba16,
    /// 32-bit float RGBA.
    RgbaF32,
}

impl PixelFormat {
    /// Map to the codec resource format that produces this layout.
    pub(crate) fn to_resource_format(self) -> ResourceFormat {
        match self {
            PixelFormat::Rgba8 => ResourceFormat::RgbaU8,
            PixelFormat::Bgra8 => ResourceFormat::BgraU8,
            PixelFormat::Rgba16 => ResourceFormat::RgbaU16,
            PixelFormat::RgbaF32 => ResourceFormat::RgbaF32,
        }
    }

    /// Channels per pixel.
    pub fn channels(self) -> u32 {
        self.to_resource_format().channels()
    }

    /// Bytes per channel element.
    pub fn element_size(self) -> u32 {
        self.to_resource_format().element_size()
    }

    /// Host pixel type name (`"uint8"`, `"uint16"`, `"float"`).
    pub fn type_name(self) -> &'static str {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => "uint8",
            PixelFormat::Rgba16 => "uint16",
            PixelFormat::RgbaF32 => "float",
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgba8 => "RGBA8",
            PixelFormat::Bgra8 => "BGRA8",
            PixelFormat::Rgba16 => "RGBA16",
            PixelFormat::RgbaF32 => "RGBA32F",
        }
    }
}

impl Display for PixelFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Byte geometry of one decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub element_size: u32,
}

impl FrameLayout {
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            channels: pixel_format.channels(),
            element_size: pixel_format.element_size(),
        }
    }

    /// Bytes in one scanline.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.channels as usize * self.element_size as usize
    }

    /// Bytes in one full frame.
    pub fn frame_bytes(&self) -> usize {
        self.row_bytes() * self.height as usize
    }
}

/// Settings applied when a clip is opened.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub(crate) gamut: Option<String>,
    pub(crate) gamma: Option<String>,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) library_path: Option<PathBuf>,
}

impl OpenOptions {
    /// Create options with every setting at its default.
    ///
    /// Defaults: default gamut and gamma, RGBA8 output, and the library
    /// location captured at build time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a color gamut. Values the camera does not support fall back
    /// to the default gamut.
    #[must_use]
    pub fn with_gamut(mut self, gamut: impl Into<String>) -> Self {
        self.gamut = Some(gamut.into());
        self
    }

    /// Request a gamma curve. Values the camera does not support fall back
    /// to the default gamma.
    #[must_use]
    pub fn with_gamma(mut self, gamma: impl Into<String>) -> Self {
        self.gamma = Some(gamma.into());
        self
    }

    /// Set the output pixel format.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Point at the native codec library, overriding the build-time
    /// `BRAW_LIBRARIES` location.
    #[must_use]
    pub fn with_library_path(mut self, path: impl AsRef<Path>) -> Self {
        self.library_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn gamut(&self) -> Option<&str> {
        self.gamut.as_deref()
    }

    pub fn gamma(&self) -> Option<&str> {
        self.gamma.as_deref()
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }
}

/// Configuration for multi-frame extraction.
///
/// Carries optional progress and cancellation settings. A
/// default-constructed value reports nothing and never cancels.
#[derive(Clone)]
pub struct ExtractOptions {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, extraction stops before the next frame
    /// and returns [`BrawError::Cancelled`](crate::BrawError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum
    /// of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_sizes_follow_pixel_format() {
        let layout = FrameLayout::new(4, 2, PixelFormat::Rgba8);
        assert_eq!(layout.row_bytes(), 16);
        assert_eq!(layout.frame_bytes(), 32);

        let layout = FrameLayout::new(4, 2, PixelFormat::RgbaF32);
        assert_eq!(layout.row_bytes(), 64);
        assert_eq!(layout.frame_bytes(), 128);
    }

    #[test]
    fn batch_size_clamps_zero() {
        let options = ExtractOptions::new().with_batch_size(0);
        assert_eq!(options.batch_size, 1);
    }
}
