//! Output image description and metadata harvesting.
//!
//! [`ImageDescription`] is what a host sees of an opened clip: dimensions,
//! pixel type, and a map of named attributes. [`MetadataExtractor`] fills
//! that map once at open time from four sources:
//!
//! | Source | Key prefix |
//! |--------|------------|
//! | Clip metadata | `braw:clip:` |
//! | Clip color-processing attributes | `braw:clip_processing:` |
//! | First-frame metadata | `braw:frame:` |
//! | First-frame color-processing attributes | `braw:frame1_processing:` |
//!
//! Iteration over a source stops at its first fetch error. Entries already
//! attached are kept, and the truncation is recorded in the returned
//! [`MetadataReport`].

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde_json::{Map, Value, json};

use crate::bridge::{DecodeMode, FrameDecodeBridge};
use crate::codec::{MetadataIter, NativeResult};
use crate::color::{AttributeId, CLIP_ATTRIBUTES, ColorAttributeSpec, FRAME_ATTRIBUTES};
use crate::configuration::PixelFormat;
use crate::error::BrawError;
use crate::session::{ClipInfo, ClipSession};
use crate::variant::Variant;

/// Attribute holding the output colorspace label.
pub const COLOR_SPACE: &str = "oiio:ColorSpace";
/// Attribute marking the image as one frame of a movie.
pub const MOVIE: &str = "oiio:Movie";
/// Attribute holding the number of subimages.
pub const SUBIMAGES: &str = "oiio:subimages";
/// Attribute holding the device make.
pub const MAKE: &str = "Make";
/// Attribute holding the clip frame rate.
pub const FRAMES_PER_SECOND: &str = "FramesPerSecond";

/// Device make reported for every clip.
pub const DEVICE_MAKE: &str = "Blackmagic Design";

pub const CLIP_METADATA_PREFIX: &str = "braw:clip:";
pub const CLIP_PROCESSING_PREFIX: &str = "braw:clip_processing:";
pub const FRAME_METADATA_PREFIX: &str = "braw:frame:";
pub const FRAME_PROCESSING_PREFIX: &str = "braw:frame1_processing:";

/// Value of a description attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl AttributeValue {
    fn to_json(&self) -> Value {
        match self {
            AttributeValue::String(value) => json!(value),
            AttributeValue::Int(value) => json!(value),
            AttributeValue::Float(value) => json!(value),
            AttributeValue::Bool(value) => json!(value),
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AttributeValue::String(value) => f.write_str(value),
            AttributeValue::Int(value) => write!(f, "{value}"),
            AttributeValue::Float(value) => write!(f, "{value}"),
            AttributeValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// Description of the images a clip yields.
///
/// # Example
///
/// ```no_run
/// use braw_input::{BrawError, OpenOptions, ScanlineReader};
/// use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
///
/// let library = SyntheticLibrary::new(SyntheticClipSpec::default());
/// let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
/// let reader = ScanlineReader::open("clip.braw", &options, &library)?;
/// let description = reader.description();
/// let colorspace = description.colorspace().unwrap_or("?");
/// println!("{}x{} {colorspace}", description.width, description.height);
/// for (name, value) in description.attributes() {
///     println!("{name} = {value}");
/// }
/// # Ok::<(), BrawError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ImageDescription {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub pixel_format: PixelFormat,
    /// Index of the alpha channel.
    pub alpha_channel: Option<u32>,
    pub subimage_count: u64,
    attributes: BTreeMap<String, AttributeValue>,
}

impl ImageDescription {
    /// Describe the frames of `info` in `pixel_format`, with the movie
    /// marker, subimage count, frame rate, and device make attached.
    pub fn new(info: &ClipInfo, pixel_format: PixelFormat) -> Self {
        let channels = pixel_format.channels();
        let mut description = Self {
            width: info.width,
            height: info.height,
            channels,
            pixel_format,
            alpha_channel: Some(channels - 1),
            subimage_count: info.frame_count,
            attributes: BTreeMap::new(),
        };
        description.set_attribute(MOVIE, true);
        description.set_attribute(SUBIMAGES, info.frame_count as i64);
        description.set_attribute(FRAMES_PER_SECOND, f64::from(info.frame_rate));
        description.set_attribute(MAKE, DEVICE_MAKE);
        description
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// The attribute's value if it is a string.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(AttributeValue::String(value)) => Some(value),
            _ => None,
        }
    }

    /// The output colorspace label.
    pub fn colorspace(&self) -> Option<&str> {
        self.get_string(COLOR_SPACE)
    }

    /// All attributes, ordered by name.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Attributes whose name starts with `prefix`, with the prefix removed.
    pub fn attributes_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a AttributeValue)> + 'a {
        self.attributes
            .iter()
            .filter_map(move |(name, value)| name.strip_prefix(prefix).map(|key| (key, value)))
    }

    /// Render the description as JSON.
    pub fn to_json(&self) -> Value {
        let attributes: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();

        json!({
            "width": self.width,
            "height": self.height,
            "channels": self.channels,
            "pixel_type": self.pixel_format.type_name(),
            "alpha_channel": self.alpha_channel,
            "subimages": self.subimage_count,
            "attributes": attributes,
        })
    }
}

/// A metadata source walked by [`MetadataExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataSource {
    ClipMetadata,
    ClipProcessing,
    FrameMetadata,
    FrameProcessing,
}

impl Display for MetadataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            MetadataSource::ClipMetadata => "clip metadata",
            MetadataSource::ClipProcessing => "clip processing attributes",
            MetadataSource::FrameMetadata => "frame metadata",
            MetadataSource::FrameProcessing => "frame processing attributes",
        };
        f.write_str(name)
    }
}

/// A source whose iteration stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTruncation {
    pub source: MetadataSource,
    /// Entries attached from this source before it stopped.
    pub attached: usize,
    pub reason: String,
}

/// What [`MetadataExtractor::extract`] attached and where it stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataReport {
    /// Total entries attached across all sources.
    pub attached: usize,
    pub truncated: Vec<MetadataTruncation>,
}

impl MetadataReport {
    /// Returns `true` if every source was read to the end.
    pub fn is_complete(&self) -> bool {
        self.truncated.is_empty()
    }

    pub fn is_truncated(&self, source: MetadataSource) -> bool {
        self.truncated
            .iter()
            .any(|truncation| truncation.source == source)
    }

    fn truncate(&mut self, source: MetadataSource, attached: usize, reason: String) {
        log::warn!("Stopped reading {source} after {attached} entries: {reason}");
        self.truncated.push(MetadataTruncation {
            source,
            attached,
            reason,
        });
    }
}

/// Harvests clip and first-frame metadata into an [`ImageDescription`].
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Attach every reachable metadata entry and color-processing attribute.
    ///
    /// Frame-level data comes from a metadata-only decode of frame 0; the
    /// frame handle stays retained by `bridge` until its next decode.
    ///
    /// # Errors
    ///
    /// Returns [`BrawError::NotOpen`] if `session` has no clip. Failures
    /// inside a source are reported in the [`MetadataReport`] instead.
    pub fn extract(
        session: &ClipSession,
        bridge: &FrameDecodeBridge,
        description: &mut ImageDescription,
    ) -> Result<MetadataReport, BrawError> {
        let codec = session.codec()?;
        let clip = session.clip()?;
        let mut report = MetadataReport::default();

        attach_entries(
            clip.metadata(),
            CLIP_METADATA_PREFIX,
            MetadataSource::ClipMetadata,
            description,
            &mut report,
        );

        attach_attributes(
            CLIP_ATTRIBUTES,
            |spec| match spec.id {
                AttributeId::Clip(attribute) => clip.processing_attribute(attribute),
                AttributeId::Frame(_) => Ok(Variant::Empty),
            },
            CLIP_PROCESSING_PREFIX,
            MetadataSource::ClipProcessing,
            description,
            &mut report,
        );

        let frame_count = session.info().map_or(0, |info| info.frame_count);
        let decoded = if frame_count == 0 {
            Err("clip has no frames".to_string())
        } else {
            bridge
                .decode_and_wait(codec, clip, 0, DecodeMode::MetadataOnly)
                .map_err(|error| error.to_string())
                .and_then(|()| {
                    bridge
                        .retained_frame()
                        .ok_or_else(|| BrawError::NoRetainedFrame.to_string())
                })
        };

        match decoded {
            Ok(frame) => {
                attach_entries(
                    frame.metadata(),
                    FRAME_METADATA_PREFIX,
                    MetadataSource::FrameMetadata,
                    description,
                    &mut report,
                );
                attach_attributes(
                    FRAME_ATTRIBUTES,
                    |spec| match spec.id {
                        AttributeId::Frame(attribute) => frame.processing_attribute(attribute),
                        AttributeId::Clip(_) => Ok(Variant::Empty),
                    },
                    FRAME_PROCESSING_PREFIX,
                    MetadataSource::FrameProcessing,
                    description,
                    &mut report,
                );
            }
            Err(reason) => {
                report.truncate(MetadataSource::FrameMetadata, 0, reason.clone());
                report.truncate(MetadataSource::FrameProcessing, 0, reason);
            }
        }

        log::debug!(
            "Attached {} metadata entries ({} sources truncated)",
            report.attached,
            report.truncated.len(),
        );
        Ok(report)
    }
}

fn attach_entries(
    entries: NativeResult<MetadataIter<'_>>,
    prefix: &str,
    source: MetadataSource,
    description: &mut ImageDescription,
    report: &mut MetadataReport,
) {
    let entries = match entries {
        Ok(entries) => entries,
        Err(error) => {
            report.truncate(source, 0, error.to_string());
            return;
        }
    };

    let mut attached = 0;
    for entry in entries {
        match entry {
            Ok(entry) => {
                description.set_attribute(
                    format!("{prefix}{}", entry.key),
                    entry.value.to_attribute_string(),
                );
                attached += 1;
            }
            Err(error) => {
                report.truncate(source, attached, error.to_string());
                break;
            }
        }
    }
    report.attached += attached;
}

fn attach_attributes<F>(
    table: &[ColorAttributeSpec],
    mut fetch: F,
    prefix: &str,
    source: MetadataSource,
    description: &mut ImageDescription,
    report: &mut MetadataReport,
) where
    F: FnMut(&ColorAttributeSpec) -> NativeResult<Variant>,
{
    let mut attached = 0;
    for spec in table {
        match fetch(spec) {
            Ok(value) => {
                if value.scalar_type().is_some_and(|scalar| scalar != spec.scalar) {
                    log::debug!(
                        "Attribute {} reported as {:?}, expected {:?}",
                        spec.name,
                        value.scalar_type(),
                        spec.scalar,
                    );
                }
                description
                    .set_attribute(format!("{prefix}{}", spec.name), value.to_attribute_string());
                attached += 1;
            }
            Err(error) => {
                report.truncate(source, attached, error.to_string());
                break;
            }
        }
    }
    report.attached += attached;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ClipInfo {
        ClipInfo {
            width: 4,
            height: 2,
            frame_count: 2,
            frame_rate: 24.0,
            camera_type: None,
        }
    }

    #[test]
    fn new_description_carries_clip_fields() {
        let description = ImageDescription::new(&info(), PixelFormat::Rgba8);
        assert_eq!(description.channels, 4);
        assert_eq!(description.alpha_channel, Some(3));
        assert_eq!(description.attribute(MOVIE), Some(&AttributeValue::Bool(true)));
        assert_eq!(description.get_string(MAKE), Some(DEVICE_MAKE));
        assert_eq!(description.attribute(SUBIMAGES), Some(&AttributeValue::Int(2)));
    }

    #[test]
    fn prefixed_attributes_strip_prefix() {
        let mut description = ImageDescription::new(&info(), PixelFormat::Rgba8);
        description.set_attribute(format!("{CLIP_METADATA_PREFIX}camera_type"), "Pocket 6K");
        description.set_attribute(format!("{FRAME_METADATA_PREFIX}iso"), "800");

        let clip: Vec<_> = description
            .attributes_with_prefix(CLIP_METADATA_PREFIX)
            .collect();
        assert_eq!(clip.len(), 1);
        assert_eq!(clip[0].0, "camera_type");
    }

    #[test]
    fn json_contains_attributes() {
        let mut description = ImageDescription::new(&info(), PixelFormat::Rgba16);
        description.set_attribute(COLOR_SPACE, "ACES AP0.Linear");

        let value = description.to_json();
        assert_eq!(value["pixel_type"], "uint16");
        assert_eq!(value["attributes"][COLOR_SPACE], "ACES AP0.Linear");
        assert_eq!(value["attributes"][MOVIE], true);
    }
}
