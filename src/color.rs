//! Color pipeline negotiation.
//!
//! Each camera model accepts its own set of gamut and gamma values. Before
//! any frame is decoded, [`ColorPipelineConfigurator::configure`] resolves
//! the caller's requested pair against that set, falls back to
//! [`DEFAULT_GAMUT`] / [`DEFAULT_GAMMA`] for anything the camera does not
//! offer, and applies the result to the clip. The outcome records whether
//! each value was honoured or defaulted.
//!
//! This module also holds the static table of color-processing attributes
//! that [`crate::metadata`] reports.

use crate::codec::{Clip, ClipAttribute, Codec, FrameAttribute, ProcessingOverrides};
use crate::configuration::OpenOptions;
use crate::error::BrawError;
use crate::variant::{ScalarType, Variant};

/// Gamut used when none is requested or the request is not supported.
pub const DEFAULT_GAMUT: &str = "ACES AP0";

/// Gamma used when none is requested or the request is not supported.
pub const DEFAULT_GAMMA: &str = "Linear";

/// Upper bound on the number of allowed values fetched per attribute.
pub const MAX_ALLOWED_VALUES: usize = 56;

/// Identifies a processing attribute at clip or frame level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeId {
    Clip(ClipAttribute),
    Frame(FrameAttribute),
}

/// One row of the color-processing attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorAttributeSpec {
    /// Name used in output attribute keys.
    pub name: &'static str,
    /// Scalar kind the codec reports for this attribute.
    pub scalar: ScalarType,
    pub id: AttributeId,
}

const fn clip(id: ClipAttribute, scalar: ScalarType) -> ColorAttributeSpec {
    ColorAttributeSpec {
        name: id.name(),
        scalar,
        id: AttributeId::Clip(id),
    }
}

const fn frame(id: FrameAttribute, scalar: ScalarType) -> ColorAttributeSpec {
    ColorAttributeSpec {
        name: id.name(),
        scalar,
        id: AttributeId::Frame(id),
    }
}

/// Clip-level color-processing attributes.
pub const CLIP_ATTRIBUTES: &[ColorAttributeSpec] = &[
    clip(ClipAttribute::ColorScienceGen, ScalarType::U16),
    clip(ClipAttribute::Gamma, ScalarType::String),
    clip(ClipAttribute::Gamut, ScalarType::String),
    clip(ClipAttribute::ToneCurveContrast, ScalarType::F32),
    clip(ClipAttribute::ToneCurveSaturation, ScalarType::F32),
    clip(ClipAttribute::ToneCurveMidpoint, ScalarType::F32),
    clip(ClipAttribute::ToneCurveHighlights, ScalarType::F32),
    clip(ClipAttribute::ToneCurveShadows, ScalarType::F32),
    clip(ClipAttribute::ToneCurveVideoBlackLevel, ScalarType::U16),
    clip(ClipAttribute::ToneCurveBlackLevel, ScalarType::F32),
    clip(ClipAttribute::ToneCurveWhiteLevel, ScalarType::F32),
    clip(ClipAttribute::HighlightRecovery, ScalarType::U16),
    clip(ClipAttribute::AnalogGainIsConstant, ScalarType::U16),
    clip(ClipAttribute::AnalogGain, ScalarType::F32),
    clip(ClipAttribute::Post3DLutMode, ScalarType::String),
    clip(ClipAttribute::EmbeddedPost3DLutName, ScalarType::String),
    clip(ClipAttribute::SidecarPost3DLutName, ScalarType::String),
    clip(ClipAttribute::GamutCompressionEnable, ScalarType::U16),
];

/// Frame-level color-processing attributes, read from the first frame.
pub const FRAME_ATTRIBUTES: &[ColorAttributeSpec] = &[
    frame(FrameAttribute::WhiteBalanceKelvin, ScalarType::U32),
    frame(FrameAttribute::WhiteBalanceTint, ScalarType::S16),
    frame(FrameAttribute::Exposure, ScalarType::F32),
    frame(FrameAttribute::Iso, ScalarType::U32),
    frame(FrameAttribute::AnalogGain, ScalarType::F32),
];

/// Outcome of resolving one requested value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The requested value is supported and was used.
    Requested(String),
    /// The default was used, either because nothing was requested or
    /// because the camera does not support the request.
    Defaulted {
        requested: Option<String>,
        value: String,
    },
}

impl Resolved {
    /// The value that is in effect.
    pub fn value(&self) -> &str {
        match self {
            Resolved::Requested(value) => value,
            Resolved::Defaulted { value, .. } => value,
        }
    }

    /// Returns `true` if a caller-supplied value was rejected.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolved::Defaulted { requested: Some(_), .. })
    }
}

/// The gamut/gamma pair every frame decode is configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPipeline {
    pub gamut: Resolved,
    pub gamma: Resolved,
}

impl ColorPipeline {
    /// Combined output colorspace label, `"<gamut>.<gamma>"`.
    pub fn colorspace(&self) -> String {
        format!("{}.{}", self.gamut.value(), self.gamma.value())
    }

    /// Clip attribute overrides carried by every decode-and-process job.
    pub(crate) fn overrides(&self) -> ProcessingOverrides {
        ProcessingOverrides {
            clip_attributes: vec![
                (ClipAttribute::Gamut, Variant::from(self.gamut.value())),
                (ClipAttribute::Gamma, Variant::from(self.gamma.value())),
            ],
        }
    }
}

/// Resolves and applies the gamut/gamma pair for a clip.
pub struct ColorPipelineConfigurator;

impl ColorPipelineConfigurator {
    /// Resolve the requested pair for the clip's camera model and apply it
    /// as clip processing attributes.
    ///
    /// # Errors
    ///
    /// - [`BrawError::CameraAttributesUnavailable`] if the codec cannot list
    ///   the values the camera accepts.
    /// - [`BrawError::Native`] if the camera type cannot be read or an
    ///   attribute cannot be set.
    pub fn configure(
        codec: &dyn Codec,
        clip: &dyn Clip,
        options: &OpenOptions,
    ) -> Result<ColorPipeline, BrawError> {
        let camera_type = clip
            .camera_type()
            .map_err(|error| BrawError::native("Clip::camera_type", error))?;

        let pipeline = Self::resolve(codec, &camera_type, options)?;
        Self::apply(clip, &pipeline)?;

        if pipeline.gamut.is_fallback() || pipeline.gamma.is_fallback() {
            log::warn!(
                "Camera {camera_type:?} does not support the requested color pipeline ({:?} / {:?}); using {}",
                options.gamut(),
                options.gamma(),
                pipeline.colorspace(),
            );
        } else {
            log::debug!("Color pipeline for {camera_type:?}: {}", pipeline.colorspace());
        }

        Ok(pipeline)
    }

    /// Resolve the requested pair against the values `camera_type` allows.
    pub fn resolve(
        codec: &dyn Codec,
        camera_type: &str,
        options: &OpenOptions,
    ) -> Result<ColorPipeline, BrawError> {
        let gamuts = allowed_values(codec, camera_type, ClipAttribute::Gamut)?;
        let gammas = allowed_values(codec, camera_type, ClipAttribute::Gamma)?;

        Ok(ColorPipeline {
            gamut: resolve_value(options.gamut(), &gamuts, DEFAULT_GAMUT),
            gamma: resolve_value(options.gamma(), &gammas, DEFAULT_GAMMA),
        })
    }

    /// Set the pair as clip processing attributes.
    pub fn apply(clip: &dyn Clip, pipeline: &ColorPipeline) -> Result<(), BrawError> {
        for (attribute, value) in pipeline.overrides().clip_attributes {
            clip.set_processing_attribute(attribute, &value)
                .map_err(|error| BrawError::native("Clip::set_processing_attribute", error))?;
        }
        Ok(())
    }
}

fn allowed_values(
    codec: &dyn Codec,
    camera_type: &str,
    attribute: ClipAttribute,
) -> Result<Vec<Variant>, BrawError> {
    let mut values = codec
        .clip_attribute_values(camera_type, attribute, MAX_ALLOWED_VALUES)
        .map_err(|source| BrawError::CameraAttributesUnavailable {
            camera_type: camera_type.to_string(),
            attribute: attribute.name(),
            source,
        })?;
    values.truncate(MAX_ALLOWED_VALUES);
    Ok(values)
}

/// Pick the allowed entry matching `requested`, ignoring ASCII case, or
/// fall back to `default`.
pub(crate) fn resolve_value(
    requested: Option<&str>,
    allowed: &[Variant],
    default: &str,
) -> Resolved {
    let Some(requested) = requested else {
        return Resolved::Defaulted {
            requested: None,
            value: default.to_string(),
        };
    };

    allowed
        .iter()
        .filter_map(Variant::as_str)
        .find(|candidate| candidate.eq_ignore_ascii_case(requested))
        .map(|candidate| Resolved::Requested(candidate.to_string()))
        .unwrap_or_else(|| Resolved::Defaulted {
            requested: Some(requested.to_string()),
            value: default.to_string(),
        })
}
