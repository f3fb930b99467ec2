//! The native codec seam.
//!
//! Decoding the raw bitstream is the job of an external codec library. This
//! module describes the surface the reader needs from it: a factory loaded
//! from the library directory, a codec that opens clips and runs jobs on its
//! own worker thread, and the callback through which that worker reports
//! completed reads and processed images.
//!
//! Handles are released by dropping them. The reader drops them in the
//! reverse order of acquisition: clip, then codec, then factory.
//!
//! [`crate::synthetic`] provides an in-memory implementation of every trait
//! here.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::variant::{MetadataEntry, Variant};

/// Generic failure code, matching the native `E_FAIL`.
pub const E_FAIL: i32 = 0x8000_4005_u32 as i32;

/// Failure code for an argument the codec rejected.
pub const E_INVALIDARG: i32 = 0x8007_0057_u32 as i32;

/// A failed native call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code:#010x})")]
pub struct NativeError {
    /// Native result code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl NativeError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A failure with the generic [`E_FAIL`] code.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(E_FAIL, message)
    }
}

/// Result of a native call.
pub type NativeResult<T> = Result<T, NativeError>;

/// Iterator over metadata entries. Iteration may yield a failure at any
/// point; consumers stop at the first one.
pub type MetadataIter<'a> = Box<dyn Iterator<Item = NativeResult<MetadataEntry>> + Send + 'a>;

/// Memory layout of a processed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFormat {
    /// Interleaved 8-bit RGBA.
    RgbaU8,
    /// Interleaved 8-bit BGRA.
    BgraU8,
    /// Interleaved 16-bit RGBA.
    RgbaU16,
    /// Interleaved 32-bit float RGBA.
    RgbaF32,
}

impl ResourceFormat {
    /// Channels per pixel.
    pub const fn channels(self) -> u32 {
        4
    }

    /// Bytes per channel element.
    pub const fn element_size(self) -> u32 {
        match self {
            ResourceFormat::RgbaU8 | ResourceFormat::BgraU8 => 1,
            ResourceFormat::RgbaU16 => 2,
            ResourceFormat::RgbaF32 => 4,
        }
    }
}

/// Clip-level processing attributes understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipAttribute {
    ColorScienceGen,
    Gamma,
    Gamut,
    ToneCurveContrast,
    ToneCurveSaturation,
    ToneCurveMidpoint,
    ToneCurveHighlights,
    ToneCurveShadows,
    ToneCurveVideoBlackLevel,
    ToneCurveBlackLevel,
    ToneCurveWhiteLevel,
    HighlightRecovery,
    AnalogGainIsConstant,
    AnalogGain,
    Post3DLutMode,
    EmbeddedPost3DLutName,
    SidecarPost3DLutName,
    GamutCompressionEnable,
}

impl ClipAttribute {
    /// Attribute name used in output keys.
    pub const fn name(self) -> &'static str {
        match self {
            ClipAttribute::ColorScienceGen => "color_science_gen",
            ClipAttribute::Gamma => "gamma",
            ClipAttribute::Gamut => "gamut",
            ClipAttribute::ToneCurveContrast => "tone_curve_contrast",
            ClipAttribute::ToneCurveSaturation => "tone_curve_saturation",
            ClipAttribute::ToneCurveMidpoint => "tone_curve_midpoint",
            ClipAttribute::ToneCurveHighlights => "tone_curve_highlights",
            ClipAttribute::ToneCurveShadows => "tone_curve_shadows",
            ClipAttribute::ToneCurveVideoBlackLevel => "tone_curve_video_black_level",
            ClipAttribute::ToneCurveBlackLevel => "tone_curve_black_level",
            ClipAttribute::ToneCurveWhiteLevel => "tone_curve_white_level",
            ClipAttribute::HighlightRecovery => "highlight_recovery",
            ClipAttribute::AnalogGainIsConstant => "analog_gain_is_constant",
            ClipAttribute::AnalogGain => "analog_gain",
            ClipAttribute::Post3DLutMode => "post_3dlut_mode",
            ClipAttribute::EmbeddedPost3DLutName => "embedded_post_3dlut_name",
            ClipAttribute::SidecarPost3DLutName => "sidecar_post_3dlut_name",
            ClipAttribute::GamutCompressionEnable => "gamut_compression_enable",
        }
    }
}

impl Display for ClipAttribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Frame-level processing attributes understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameAttribute {
    WhiteBalanceKelvin,
    WhiteBalanceTint,
    Exposure,
    Iso,
    AnalogGain,
}

impl FrameAttribute {
    /// Attribute name used in output keys.
    pub const fn name(self) -> &'static str {
        match self {
            FrameAttribute::WhiteBalanceKelvin => "white_balance_kelvin",
            FrameAttribute::WhiteBalanceTint => "white_balance_tint",
            FrameAttribute::Exposure => "exposure",
            FrameAttribute::Iso => "iso",
            FrameAttribute::AnalogGain => "analog_gain",
        }
    }
}

impl Display for FrameAttribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Clip attribute values applied to a single decode-and-process job,
/// overriding the clip's own settings for that frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingOverrides {
    pub clip_attributes: Vec<(ClipAttribute, Variant)>,
}

impl ProcessingOverrides {
    /// Returns `true` if no attribute is overridden.
    pub fn is_empty(&self) -> bool {
        self.clip_attributes.is_empty()
    }

    /// Look up the override for `attribute`.
    pub fn get(&self, attribute: ClipAttribute) -> Option<&Variant> {
        self.clip_attributes
            .iter()
            .find(|(candidate, _)| *candidate == attribute)
            .map(|(_, value)| value)
    }
}

/// Entry point into a loaded codec library.
pub trait CodecLibrary: Send + Sync {
    /// Create a factory from the directory holding the native library.
    fn create_factory(&self, library_dir: &Path) -> NativeResult<Box<dyn CodecFactory>>;
}

/// Factory for codec instances.
pub trait CodecFactory: Send + Sync {
    fn create_codec(&self) -> NativeResult<Box<dyn Codec>>;
}

/// A codec instance. Jobs created from its clips run on the codec's own
/// worker thread and report through the registered [`CodecCallback`].
pub trait Codec: Send + Sync {
    fn open_clip(&self, path: &Path) -> NativeResult<Box<dyn Clip>>;

    /// Register the callback that receives job completions.
    fn set_callback(&self, callback: Arc<dyn CodecCallback>) -> NativeResult<()>;

    /// Block until every submitted job, including jobs submitted from
    /// inside callbacks, has run its completion callback.
    fn flush_jobs(&self);

    /// Values `camera_type` accepts for `attribute`, at most `max_values`
    /// of them.
    fn clip_attribute_values(
        &self,
        camera_type: &str,
        attribute: ClipAttribute,
        max_values: usize,
    ) -> NativeResult<Vec<Variant>>;
}

/// An opened clip.
pub trait Clip: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn frame_count(&self) -> u64;
    fn frame_rate(&self) -> f32;

    /// Camera model that recorded the clip.
    fn camera_type(&self) -> NativeResult<String>;

    /// Clip-level metadata.
    fn metadata(&self) -> NativeResult<MetadataIter<'_>>;

    fn processing_attribute(&self, attribute: ClipAttribute) -> NativeResult<Variant>;

    fn set_processing_attribute(&self, attribute: ClipAttribute, value: &Variant)
    -> NativeResult<()>;

    /// Create a job that reads `frame_index` and reports through
    /// [`CodecCallback::read_complete`].
    fn create_read_job(&self, frame_index: u64) -> NativeResult<Box<dyn Job>>;
}

/// A frame delivered by a completed read job.
pub trait Frame: Send + Sync {
    fn frame_index(&self) -> u64;

    /// Frame-level metadata.
    fn metadata(&self) -> NativeResult<MetadataIter<'_>>;

    fn processing_attribute(&self, attribute: FrameAttribute) -> NativeResult<Variant>;

    /// Select the layout of images produced from this frame.
    fn set_resource_format(&self, format: ResourceFormat) -> NativeResult<()>;

    /// Create a job that decodes and processes this frame and reports
    /// through [`CodecCallback::process_complete`].
    fn create_decode_and_process_job(
        &self,
        overrides: &ProcessingOverrides,
    ) -> NativeResult<Box<dyn Job>>;
}

/// A unit of asynchronous work. Submitting hands the job to the codec.
pub trait Job: Send {
    fn submit(self: Box<Self>) -> NativeResult<()>;
}

/// A fully decoded and processed frame image.
pub trait ProcessedImage: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn resource_format(&self) -> ResourceFormat;

    /// Raw image bytes.
    fn resource(&self) -> NativeResult<&[u8]>;
}

/// Completion notifications, invoked on the codec's worker thread.
pub trait CodecCallback: Send + Sync {
    fn read_complete(&self, frame_index: u64, result: NativeResult<Arc<dyn Frame>>);

    fn process_complete(&self, frame_index: u64, result: NativeResult<Box<dyn ProcessedImage>>);
}
