//! Image description and metadata integration tests.

use braw_input::metadata::{
    CLIP_METADATA_PREFIX, CLIP_PROCESSING_PREFIX, DEVICE_MAKE, FRAME_METADATA_PREFIX,
    FRAME_PROCESSING_PREFIX, FRAMES_PER_SECOND, MAKE, MOVIE, SUBIMAGES,
};
use braw_input::synthetic::{SyntheticClipSpec, SyntheticFaults, SyntheticLibrary};
use braw_input::{AttributeValue, MetadataSource, OpenOptions, PixelFormat, ScanlineReader};

fn options() -> OpenOptions {
    OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so")
}

fn open_with(spec: SyntheticClipSpec) -> ScanlineReader {
    let library = SyntheticLibrary::new(spec);
    ScanlineReader::open("A001_C001.braw", &options(), &library).expect("Failed to open clip")
}

#[test]
fn description_has_standard_fields() {
    let reader = open_with(SyntheticClipSpec::default());
    let description = reader.description();

    assert_eq!(description.width, 4);
    assert_eq!(description.height, 2);
    assert_eq!(description.channels, 4);
    assert_eq!(description.alpha_channel, Some(3));
    assert_eq!(description.pixel_format, PixelFormat::Rgba8);
    assert_eq!(description.subimage_count, 2);
    assert_eq!(description.attribute(MOVIE), Some(&AttributeValue::Bool(true)));
    assert_eq!(description.attribute(SUBIMAGES), Some(&AttributeValue::Int(2)));
    assert_eq!(description.attribute(FRAMES_PER_SECOND), Some(&AttributeValue::Float(24.0)));
    assert_eq!(description.get_string(MAKE), Some(DEVICE_MAKE));
}

#[test]
fn clip_and_frame_metadata_are_namespaced() {
    let reader = open_with(SyntheticClipSpec::default().with_clip_metadata("reel", "A001"));
    let description = reader.description();

    assert_eq!(
        description.get_string(&format!("{CLIP_METADATA_PREFIX}camera_type")),
        Some("Blackmagic Pocket Cinema Camera 6K")
    );
    assert_eq!(description.get_string("braw:clip:reel"), Some("A001"));
    assert_eq!(description.get_string("braw:clip:sensor_rate"), Some("24 1"));
    assert_eq!(description.get_string(&format!("{FRAME_METADATA_PREFIX}iso")), Some("800"));
    assert_eq!(description.get_string("braw:frame:timecode"), Some("01:00:00:00"));
    assert!(reader.metadata_report().is_complete());
}

#[test]
fn every_processing_attribute_is_attached() {
    let reader = open_with(SyntheticClipSpec::default());
    let description = reader.description();

    assert_eq!(description.attributes_with_prefix(CLIP_PROCESSING_PREFIX).count(), 18);
    assert_eq!(description.attributes_with_prefix(FRAME_PROCESSING_PREFIX).count(), 5);
    assert_eq!(
        description.get_string("braw:frame1_processing:white_balance_kelvin"),
        Some("5600")
    );
    assert_eq!(
        description.get_string("braw:frame1_processing:white_balance_tint"),
        Some("10")
    );
    assert_eq!(
        description.get_string("braw:clip_processing:tone_curve_midpoint"),
        Some("0.409")
    );
}

#[test]
fn clip_metadata_truncation_keeps_earlier_entries() {
    let reader = open_with(SyntheticClipSpec::default().with_faults(SyntheticFaults {
        clip_metadata_error_after: Some(2),
        ..SyntheticFaults::default()
    }));
    let description = reader.description();
    let report = reader.metadata_report();

    assert_eq!(description.attributes_with_prefix(CLIP_METADATA_PREFIX).count(), 2);
    assert!(description.get_string("braw:clip:firmware_version").is_some());
    assert!(description.get_string("braw:clip:crop_origin").is_none());

    assert!(!report.is_complete());
    assert!(report.is_truncated(MetadataSource::ClipMetadata));
    assert!(!report.is_truncated(MetadataSource::FrameMetadata));
    assert_eq!(report.truncated[0].attached, 2);

    // Other sources are still read.
    assert_eq!(description.attributes_with_prefix(FRAME_METADATA_PREFIX).count(), 3);
}

#[test]
fn frame_metadata_truncation_is_reported() {
    let reader = open_with(SyntheticClipSpec::default().with_faults(SyntheticFaults {
        frame_metadata_error_after: Some(0),
        ..SyntheticFaults::default()
    }));

    let report = reader.metadata_report();
    assert!(report.is_truncated(MetadataSource::FrameMetadata));
    assert_eq!(
        reader
            .description()
            .attributes_with_prefix(FRAME_METADATA_PREFIX)
            .count(),
        0
    );
    assert_eq!(
        reader
            .description()
            .attributes_with_prefix(FRAME_PROCESSING_PREFIX)
            .count(),
        5
    );
}

#[test]
fn failed_first_frame_read_skips_frame_sources() {
    let reader = open_with(SyntheticClipSpec::default().with_faults(SyntheticFaults {
        read_completion: Some(0),
        ..SyntheticFaults::default()
    }));

    let report = reader.metadata_report();
    assert!(report.is_truncated(MetadataSource::FrameMetadata));
    assert!(report.is_truncated(MetadataSource::FrameProcessing));
    assert!(!report.is_truncated(MetadataSource::ClipMetadata));

    // Frame 1 still decodes.
    let mut row = [0_u8; 16];
    reader.read_scanline(1, 0, 0, &mut row).unwrap();
}

#[test]
fn json_export_includes_attributes() {
    let reader = open_with(SyntheticClipSpec::default());
    let json = reader.description().to_json();

    assert_eq!(json["width"], 4);
    assert_eq!(json["pixel_type"], "uint8");
    assert_eq!(json["alpha_channel"], 3);
    assert_eq!(json["attributes"]["oiio:ColorSpace"], "ACES AP0.Linear");
    assert_eq!(json["attributes"]["braw:frame:iso"], "800");
}
