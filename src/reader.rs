//! The scanline reader.
//!
//! [`ScanlineReader`] is the host-facing surface: open a clip, select a
//! subimage (frame), and pull decoded scanlines out of it. Every frame is
//! decoded at most once per selection; repeated row reads of the same frame
//! copy from the frame buffer without touching the codec.
//!
//! # Example
//!
//! ```no_run
//! use braw_input::{BrawError, OpenOptions, ScanlineReader};
//! use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
//!
//! let library = SyntheticLibrary::new(SyntheticClipSpec::default());
//! let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
//! let reader = ScanlineReader::open("A001_C001.braw", &options, &library)?;
//!
//! let row_bytes = reader.layout().row_bytes();
//! let mut row = vec![0_u8; row_bytes];
//! for y in 0..reader.info().height as i32 {
//!     reader.read_scanline(1, 0, y, &mut row)?;
//! }
//! # Ok::<(), BrawError>(())
//! ```

use std::path::Path;

use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use parking_lot::Mutex;

use crate::bridge::{DecodeMode, FrameDecodeBridge};
use crate::codec::CodecLibrary;
use crate::color::{ColorPipeline, ColorPipelineConfigurator};
use crate::configuration::{FrameLayout, OpenOptions, PixelFormat};
use crate::error::BrawError;
use crate::metadata::{COLOR_SPACE, ImageDescription, MetadataExtractor, MetadataReport};
use crate::session::{ClipInfo, ClipSession};
use crate::validation::{ValidationReport, validate_reader};

/// Subimage selection guarded by the reader lock.
#[derive(Debug)]
struct ReaderState {
    subimage: u64,
    /// The frame buffer holds the selected subimage.
    frame_decoded: bool,
}

/// Reads decoded frames of one clip, one scanline at a time.
///
/// A reader is `Send + Sync`. Seeks and reads from any number of threads
/// are serialised by an internal lock; [`close`](Self::close) needs
/// exclusive access.
pub struct ScanlineReader {
    session: ClipSession,
    bridge: FrameDecodeBridge,
    state: Mutex<ReaderState>,
    info: ClipInfo,
    pixel_format: PixelFormat,
    description: ImageDescription,
    color: ColorPipeline,
    metadata_report: MetadataReport,
}

impl ScanlineReader {
    /// Open a clip and prepare it for reading.
    ///
    /// Opening acquires the native handles, registers the decode callback,
    /// negotiates the color pipeline, builds the [`ImageDescription`], and
    /// reads clip and first-frame metadata. Subimage 0 is selected.
    ///
    /// # Errors
    ///
    /// - [`BrawError::LibraryLocationMissing`] if no codec library location
    ///   is configured.
    /// - [`BrawError::FileOpen`] if the factory, codec, or clip cannot be
    ///   created.
    /// - [`BrawError::CameraAttributesUnavailable`] if the camera's allowed
    ///   gamut or gamma values cannot be listed.
    /// - [`BrawError::Native`] if the callback cannot be registered or the
    ///   color pipeline cannot be applied.
    ///
    /// Metadata failures do not fail the open; see
    /// [`metadata_report`](Self::metadata_report).
    pub fn open<P: AsRef<Path>>(
        path: P,
        options: &OpenOptions,
        library: &dyn CodecLibrary,
    ) -> Result<Self, BrawError> {
        let path = path.as_ref();
        let pixel_format = options.pixel_format();

        let mut session = ClipSession::new();
        let info = session.open(path, options, library)?;

        let layout = FrameLayout::new(info.width, info.height, pixel_format);
        let bridge = FrameDecodeBridge::new(layout, pixel_format);
        session.set_callback(bridge.callback())?;

        let color =
            ColorPipelineConfigurator::configure(session.codec()?, session.clip()?, options)?;
        bridge.set_color_pipeline(&color);

        let mut description = ImageDescription::new(&info, pixel_format);
        description.set_attribute(COLOR_SPACE, color.colorspace());

        let metadata_report = MetadataExtractor::extract(&session, &bridge, &mut description)?;

        log::info!(
            "Opened {}: {}x{}, {} frames @ {:.3} fps, {} {}",
            path.display(),
            info.width,
            info.height,
            info.frame_count,
            info.frame_rate,
            color.colorspace(),
            pixel_format,
        );

        Ok(Self {
            session,
            bridge,
            state: Mutex::new(ReaderState {
                subimage: 0,
                frame_decoded: false,
            }),
            info,
            pixel_format,
            description,
            color,
            metadata_report,
        })
    }

    /// Select `subimage` at `miplevel`.
    ///
    /// Selecting the current subimage is a no-op. Selecting another one
    /// marks the frame as not yet decoded; decoding happens on the next
    /// read. An invalid request leaves the selection unchanged.
    ///
    /// # Errors
    ///
    /// - [`BrawError::MipLevelUnsupported`] if `miplevel` is not 0.
    /// - [`BrawError::SubimageOutOfRange`] if `subimage` is negative or not
    ///   below the frame count.
    /// - [`BrawError::NotOpen`] after [`close`](Self::close).
    pub fn seek_subimage(&self, subimage: i32, miplevel: i32) -> Result<(), BrawError> {
        let index = self.check_selection(subimage, miplevel)?;
        let mut state = self.state.lock();
        select(&mut state, index);
        Ok(())
    }

    /// Copy scanline `y` of `subimage` into the front of `destination`.
    ///
    /// Exactly [`FrameLayout::row_bytes`] bytes are written. All arguments
    /// are checked before the selection changes or any decode starts.
    ///
    /// # Errors
    ///
    /// - [`BrawError::MipLevelUnsupported`] / [`BrawError::SubimageOutOfRange`]
    ///   as for [`seek_subimage`](Self::seek_subimage).
    /// - [`BrawError::ScanlineOutOfRange`] if `y` is outside the frame.
    /// - [`BrawError::BufferTooSmall`] if `destination` is shorter than a row.
    /// - [`BrawError::NotOpen`] after [`close`](Self::close).
    /// - Decode failures from the codec ([`BrawError::ReadFailed`],
    ///   [`BrawError::DecodeFailed`], [`BrawError::ResourceSizeMismatch`]).
    ///   The frame stays undecoded and the next read retries.
    pub fn read_scanline(
        &self,
        subimage: i32,
        miplevel: i32,
        y: i32,
        destination: &mut [u8],
    ) -> Result<(), BrawError> {
        let index = self.check_selection(subimage, miplevel)?;
        let row = u32::try_from(y)
            .ok()
            .filter(|&row| row < self.info.height)
            .ok_or(BrawError::ScanlineOutOfRange {
                y: i64::from(y),
                height: self.info.height,
            })?;
        check_capacity(self.layout().row_bytes(), destination.len())?;

        let mut state = self.state.lock();
        select(&mut state, index);
        self.ensure_decoded(&mut state)?;
        self.bridge.copy_row(index, row, destination)
    }

    /// Copy the whole of `subimage` into the front of `destination`.
    ///
    /// # Errors
    ///
    /// As [`read_scanline`](Self::read_scanline), with the buffer checked
    /// against [`FrameLayout::frame_bytes`].
    pub fn read_image(&self, subimage: i32, destination: &mut [u8]) -> Result<(), BrawError> {
        let index = self.check_selection(subimage, 0)?;
        check_capacity(self.layout().frame_bytes(), destination.len())?;

        let mut state = self.state.lock();
        select(&mut state, index);
        self.ensure_decoded(&mut state)?;
        self.bridge.copy_frame(index, destination)
    }

    /// Decode `subimage` into an [`image::DynamicImage`].
    ///
    /// BGRA frames are reordered to RGBA. 16-bit and float frames keep their
    /// precision.
    pub fn frame_image(&self, subimage: i32) -> Result<DynamicImage, BrawError> {
        let mut data = vec![0_u8; self.layout().frame_bytes()];
        self.read_image(subimage, &mut data)?;
        to_dynamic_image(self.info.width, self.info.height, self.pixel_format, data)
    }

    /// Decode `subimage` and save it to `path`. The format is inferred from
    /// the file extension.
    ///
    /// # Errors
    ///
    /// Returns errors from [`frame_image`](Self::frame_image), or
    /// [`BrawError::ImageError`] if the image cannot be written in that
    /// format.
    pub fn save_frame<P: AsRef<Path>>(&self, subimage: i32, path: P) -> Result<(), BrawError> {
        let image = self.frame_image(subimage)?;
        image.save(path)?;
        Ok(())
    }

    /// The selected subimage.
    pub fn current_subimage(&self) -> i32 {
        let state = self.state.lock();
        i32::try_from(state.subimage).unwrap_or(i32::MAX)
    }

    /// Number of subimages (frames) in the clip, or 0 once closed.
    pub fn subimage_count(&self) -> u64 {
        if !self.session.is_open() {
            return 0;
        }
        self.info.frame_count
    }

    pub fn info(&self) -> &ClipInfo {
        &self.info
    }

    pub fn description(&self) -> &ImageDescription {
        &self.description
    }

    pub fn layout(&self) -> FrameLayout {
        self.bridge.layout()
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// The negotiated gamut/gamma pair.
    pub fn color_pipeline(&self) -> &ColorPipeline {
        &self.color
    }

    /// What metadata was attached at open, and where reading stopped.
    pub fn metadata_report(&self) -> &MetadataReport {
        &self.metadata_report
    }

    pub fn path(&self) -> Option<&Path> {
        self.session.path()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Inspect the opened clip for problems.
    pub fn validate(&self) -> ValidationReport {
        validate_reader(self)
    }

    /// Release the frame buffer and all native handles.
    ///
    /// Safe to call more than once. Seeks and reads after closing fail with
    /// [`BrawError::NotOpen`], and subimage 0 is reported as selected.
    pub fn close(&mut self) {
        self.bridge.release();
        self.session.close();
        let state = self.state.get_mut();
        state.subimage = 0;
        state.frame_decoded = false;
    }

    fn check_selection(&self, subimage: i32, miplevel: i32) -> Result<u64, BrawError> {
        if !self.session.is_open() {
            return Err(BrawError::NotOpen);
        }
        if miplevel != 0 {
            return Err(BrawError::MipLevelUnsupported(miplevel));
        }
        u64::try_from(subimage)
            .ok()
            .filter(|&index| index < self.info.frame_count)
            .ok_or(BrawError::SubimageOutOfRange {
                subimage: i64::from(subimage),
                subimage_count: self.info.frame_count,
            })
    }

    fn ensure_decoded(&self, state: &mut ReaderState) -> Result<(), BrawError> {
        if state.frame_decoded && self.bridge.buffered_frame() == Some(state.subimage) {
            return Ok(());
        }
        state.frame_decoded = false;

        let codec = self.session.codec()?;
        let clip = self.session.clip()?;
        self.bridge
            .decode_and_wait(codec, clip, state.subimage, DecodeMode::Full)?;

        state.frame_decoded = true;
        log::debug!("Decoded frame {}", state.subimage);
        Ok(())
    }
}

impl Drop for ScanlineReader {
    fn drop(&mut self) {
        self.close();
    }
}

fn select(state: &mut ReaderState, index: u64) {
    if state.subimage != index {
        state.subimage = index;
        state.frame_decoded = false;
    }
}

fn check_capacity(required: usize, provided: usize) -> Result<(), BrawError> {
    if provided < required {
        return Err(BrawError::BufferTooSmall { required, provided });
    }
    Ok(())
}

fn to_dynamic_image(
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    mut data: Vec<u8>,
) -> Result<DynamicImage, BrawError> {
    let unsupported = || BrawError::UnsupportedImageFormat(pixel_format.name());

    match pixel_format {
        PixelFormat::Rgba8 => RgbaImage::from_raw(width, height, data)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(unsupported),
        PixelFormat::Bgra8 => {
            for pixel in data.chunks_exact_mut(4) {
                pixel.swap(0, 2);
            }
            RgbaImage::from_raw(width, height, data)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(unsupported)
        }
        PixelFormat::Rgba16 => {
            let samples: Vec<u16> = data
                .chunks_exact(2)
                .map(|bytes| u16::from_ne_bytes([bytes[0], bytes[1]]))
                .collect();
            ImageBuffer::<Rgba<u16>, _>::from_raw(width, height, samples)
                .map(DynamicImage::ImageRgba16)
                .ok_or_else(unsupported)
        }
        PixelFormat::RgbaF32 => {
            let samples: Vec<f32> = data
                .chunks_exact(4)
                .map(|bytes| f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                .collect();
            ImageBuffer::<Rgba<f32>, _>::from_raw(width, height, samples)
                .map(DynamicImage::ImageRgba32F)
                .ok_or_else(unsupported)
        }
    }
}
