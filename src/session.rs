//! Native handle lifetime for one opened clip.
//!
//! [`ClipSession`] owns the factory, codec, and clip handles from
//! [`open`](ClipSession::open) until [`close`](ClipSession::close). Handles
//! are acquired in the order factory → codec → clip and released in the
//! reverse order.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::{Clip, Codec, CodecCallback, CodecFactory, CodecLibrary};
use crate::configuration::OpenOptions;
use crate::error::BrawError;
use crate::library::resolve_library_dir;

/// Basic properties of an opened clip.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ClipInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Number of frames (subimages) in the clip.
    pub frame_count: u64,
    /// Recorded frame rate.
    pub frame_rate: f32,
    /// Camera model that recorded the clip, if the codec reports one.
    pub camera_type: Option<String>,
}

/// Owner of the native handles for one clip.
///
/// A session starts closed. Dropping a session closes it.
#[derive(Default)]
pub struct ClipSession {
    factory: Option<Box<dyn CodecFactory>>,
    codec: Option<Box<dyn Codec>>,
    clip: Option<Box<dyn Clip>>,
    info: Option<ClipInfo>,
    path: Option<PathBuf>,
}

impl Debug for ClipSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClipSession")
            .field("is_open", &self.is_open())
            .field("info", &self.info)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ClipSession {
    /// Create a closed session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` through `library`.
    ///
    /// Any clip already open in this session is closed first. On failure no
    /// handle is retained: those acquired before the failing step are
    /// released in reverse order.
    ///
    /// # Errors
    ///
    /// - [`BrawError::LibraryLocationMissing`] if no library location is
    ///   configured. No native handle is created.
    /// - [`BrawError::FileOpen`] if the factory, codec, or clip cannot be
    ///   created.
    pub fn open<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &OpenOptions,
        library: &dyn CodecLibrary,
    ) -> Result<ClipInfo, BrawError> {
        self.close();

        let path = path.as_ref();
        let file_open = |reason: String| BrawError::FileOpen {
            path: path.to_path_buf(),
            reason,
        };

        let library_dir = resolve_library_dir(options.library_path.as_deref())?;
        log::debug!(
            "Loading Blackmagic RAW codec from {} for {}",
            library_dir.display(),
            path.display(),
        );

        // Locals drop in reverse declaration order, so an early return
        // releases clip, codec, factory in that order.
        let factory = library
            .create_factory(&library_dir)
            .map_err(|error| file_open(format!("failed to create codec factory: {error}")))?;

        let codec = factory
            .create_codec()
            .map_err(|error| file_open(format!("failed to create codec: {error}")))?;

        let clip = codec
            .open_clip(path)
            .map_err(|error| file_open(format!("failed to open clip: {error}")))?;

        let info = ClipInfo {
            width: clip.width(),
            height: clip.height(),
            frame_count: clip.frame_count(),
            frame_rate: clip.frame_rate(),
            camera_type: clip.camera_type().ok(),
        };

        log::debug!(
            "Clip {}: {}x{}, {} frames @ {:.3} fps",
            path.display(),
            info.width,
            info.height,
            info.frame_count,
            info.frame_rate,
        );

        self.factory = Some(factory);
        self.codec = Some(codec);
        self.clip = Some(clip);
        self.info = Some(info.clone());
        self.path = Some(path.to_path_buf());

        Ok(info)
    }

    /// Release all handles (clip, codec, factory) and reset to the closed
    /// state. Safe to call repeatedly or on a session that never opened.
    pub fn close(&mut self) {
        let was_open = self.is_open();

        drop(self.clip.take());
        drop(self.codec.take());
        drop(self.factory.take());
        self.info = None;

        if let Some(path) = self.path.take() {
            log::debug!("Closed clip {}", path.display());
        } else if was_open {
            log::debug!("Closed clip session");
        }
    }

    /// Returns `true` while a clip is open.
    pub fn is_open(&self) -> bool {
        self.clip.is_some()
    }

    /// Properties of the open clip.
    pub fn info(&self) -> Option<&ClipInfo> {
        self.info.as_ref()
    }

    /// Path of the open clip.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn codec(&self) -> Result<&dyn Codec, BrawError> {
        self.codec.as_deref().ok_or(BrawError::NotOpen)
    }

    pub fn clip(&self) -> Result<&dyn Clip, BrawError> {
        self.clip.as_deref().ok_or(BrawError::NotOpen)
    }

    /// Register the callback that receives job completions.
    pub fn set_callback(&self, callback: Arc<dyn CodecCallback>) -> Result<(), BrawError> {
        self.codec()?
            .set_callback(callback)
            .map_err(|error| BrawError::native("Codec::set_callback", error))
    }
}

impl Drop for ClipSession {
    fn drop(&mut self) {
        self.close();
    }
}
