//! # braw-input
//!
//! Read Blackmagic RAW (`.braw`) clips as a sequence of images, one
//! scanline at a time.
//!
//! Each frame of a clip is exposed as a subimage. Frames are decoded by the
//! Blackmagic RAW codec library, whose jobs complete asynchronously on a
//! worker thread; [`ScanlineReader`] hides that behind a blocking,
//! thread-safe API that decodes each selected frame once and serves its rows
//! from a single frame buffer.
//!
//! ## Quick Start
//!
//! ### Read Scanlines
//!
//! ```no_run
//! use braw_input::{OpenOptions, ScanlineReader};
//! use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
//!
//! let library = SyntheticLibrary::new(SyntheticClipSpec::default());
//! let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
//! let reader = ScanlineReader::open("A001_C001.braw", &options, &library).unwrap();
//!
//! let mut row = vec![0_u8; reader.layout().row_bytes()];
//! reader.read_scanline(0, 0, 0, &mut row).unwrap();
//! ```
//!
//! ### Choose a Color Pipeline
//!
//! ```no_run
//! use braw_input::{OpenOptions, PixelFormat, ScanlineReader};
//! use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
//!
//! let library = SyntheticLibrary::new(SyntheticClipSpec::default());
//! let options = OpenOptions::new()
//!     .with_gamut("Rec.709")
//!     .with_gamma("Rec.709")
//!     .with_pixel_format(PixelFormat::Rgba16)
//!     .with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
//! let reader = ScanlineReader::open("A001_C001.braw", &options, &library).unwrap();
//! assert_eq!(reader.description().colorspace(), Some("Rec.709.Rec.709"));
//! ```
//!
//! ### Save Frames
//!
//! ```no_run
//! use braw_input::{FrameRange, OpenOptions, ScanlineReader};
//! use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
//!
//! let library = SyntheticLibrary::new(SyntheticClipSpec::default());
//! let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
//! let reader = ScanlineReader::open("A001_C001.braw", &options, &library).unwrap();
//! reader.save_frame(0, "first_frame.png").unwrap();
//! let frames = reader.frames(FrameRange::Specific(vec![1, 0])).unwrap();
//! ```
//!
//! ## Features
//!
//! - **Scanline reads**: per-row access to decoded frames, decoding each
//!   selected frame once
//! - **Color negotiation**: requested gamut and gamma are checked against
//!   what the camera model supports, with an explicit fallback record
//! - **Metadata**: clip and first-frame metadata and color-processing
//!   attributes attached to the [`ImageDescription`]
//! - **Pixel formats**: RGBA8, BGRA8, RGBA16, and float RGBA
//! - **Frame extraction**: [`image::DynamicImage`] output, ranges,
//!   intervals, progress, and cancellation
//! - **Validation and probing**: [`ScanlineReader::validate`] and
//!   [`ClipProbe`]
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `FrameStream` for async extraction via Tokio |
//! | `full` | Enables all of the above |
//!
//! ## Codec Library
//!
//! The codec is reached through the traits in [`codec`]. Its location is
//! taken from the `BRAW_LIBRARIES` environment variable at build time, or
//! from [`OpenOptions::with_library_path`]. [`synthetic`] implements the
//! same traits in memory.

pub mod bridge;
pub mod codec;
pub mod color;
pub mod configuration;
pub mod error;
pub mod frames;
pub mod library;
pub mod metadata;
pub mod probe;
pub mod progress;
pub mod reader;
pub mod session;
#[cfg(feature = "async")]
pub mod stream;
pub mod synthetic;
pub mod validation;
pub mod variant;

pub use bridge::{DecodeMode, DecodePhase, FrameDecodeBridge};
pub use codec::{
    Clip, ClipAttribute, Codec, CodecCallback, CodecFactory, CodecLibrary, Frame, FrameAttribute,
    Job, NativeError, NativeResult, ProcessedImage, ProcessingOverrides, ResourceFormat,
};
pub use color::{
    ColorPipeline, ColorPipelineConfigurator, DEFAULT_GAMMA, DEFAULT_GAMUT, Resolved,
};
pub use configuration::{ExtractOptions, FrameLayout, OpenOptions, PixelFormat};
pub use error::BrawError;
pub use frames::FrameRange;
pub use library::{EXTENSIONS, FORMAT_NAME, supports_extension};
pub use metadata::{
    AttributeValue, ImageDescription, MetadataExtractor, MetadataReport, MetadataSource,
    MetadataTruncation,
};
pub use probe::ClipProbe;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use reader::ScanlineReader;
pub use session::{ClipInfo, ClipSession};
#[cfg(feature = "async")]
pub use stream::FrameStream;
pub use validation::ValidationReport;
pub use variant::{MetadataEntry, ScalarType, Variant, VariantArray};
