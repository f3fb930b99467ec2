//! OpenOptions, ExtractOptions, and PixelFormat tests.

use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
use braw_input::{ExtractOptions, FrameLayout, OpenOptions, PixelFormat, ScanlineReader};

// ── ExtractOptions builder ───────────────────────────────────────

#[test]
fn extract_options_defaults() {
    let options = ExtractOptions::new();
    let debug = format!("{options:?}");
    assert!(debug.contains("ExtractOptions"));
    assert!(debug.contains("has_cancellation: false"));
    assert!(debug.contains("batch_size: 1"));
}

#[test]
fn extract_options_with_batch_size() {
    let options = ExtractOptions::new().with_batch_size(10);
    assert!(format!("{options:?}").contains("batch_size: 10"));
}

// ── OpenOptions builder ──────────────────────────────────────────

#[test]
fn open_options_defaults() {
    let options = OpenOptions::new();
    assert_eq!(options.gamut(), None);
    assert_eq!(options.gamma(), None);
    assert_eq!(options.pixel_format(), PixelFormat::Rgba8);
}

#[test]
fn open_options_builder_sets_fields() {
    let options = OpenOptions::new()
        .with_gamut("Rec.709")
        .with_gamma("Blackmagic Design Film")
        .with_pixel_format(PixelFormat::Bgra8);
    assert_eq!(options.gamut(), Some("Rec.709"));
    assert_eq!(options.gamma(), Some("Blackmagic Design Film"));
    assert_eq!(options.pixel_format(), PixelFormat::Bgra8);
}

// ── PixelFormat ──────────────────────────────────────────────────

#[test]
fn pixel_formats_fix_channels_and_element_size() {
    let cases = [
        (PixelFormat::Rgba8, 1, "uint8"),
        (PixelFormat::Bgra8, 1, "uint8"),
        (PixelFormat::Rgba16, 2, "uint16"),
        (PixelFormat::RgbaF32, 4, "float"),
    ];
    for (format, element_size, type_name) in cases {
        assert_eq!(format.channels(), 4);
        assert_eq!(format.element_size(), element_size);
        assert_eq!(format.type_name(), type_name);
    }
}

#[test]
fn layout_follows_pixel_format() {
    let layout = FrameLayout::new(6, 3, PixelFormat::Rgba16);
    assert_eq!(layout.row_bytes(), 48);
    assert_eq!(layout.frame_bytes(), 144);
}

#[test]
fn reader_uses_requested_pixel_format() {
    let library = SyntheticLibrary::new(SyntheticClipSpec::default());
    let options = OpenOptions::new()
        .with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so")
        .with_pixel_format(PixelFormat::Rgba16);
    let reader = ScanlineReader::open("A001_C001.braw", &options, &library).unwrap();

    assert_eq!(reader.pixel_format(), PixelFormat::Rgba16);
    assert_eq!(reader.layout().row_bytes(), 32);
    assert_eq!(reader.description().pixel_format, PixelFormat::Rgba16);
}

#[test]
fn extension_routing() {
    assert!(braw_input::supports_extension("A001_C001.braw"));
    assert!(braw_input::supports_extension("A001_C001.BRAW"));
    assert!(!braw_input::supports_extension("A001_C001.mov"));
    assert_eq!(braw_input::FORMAT_NAME, "braw");
}
