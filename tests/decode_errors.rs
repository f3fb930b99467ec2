//! Decode failure integration tests.

use braw_input::codec::NativeError;
use braw_input::synthetic::{SyntheticClipSpec, SyntheticFaults, SyntheticLibrary, pattern};
use braw_input::{
    BrawError, DecodePhase, FrameDecodeBridge, FrameLayout, OpenOptions, PixelFormat,
    ScanlineReader,
};

fn options() -> OpenOptions {
    OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so")
}

fn open_with(faults: SyntheticFaults) -> (SyntheticLibrary, ScanlineReader) {
    let library = SyntheticLibrary::new(SyntheticClipSpec::default().with_faults(faults));
    let reader = ScanlineReader::open("A001_C001.braw", &options(), &library)
        .expect("Failed to open clip");
    (library, reader)
}

#[test]
fn wrong_resource_size_is_an_explicit_error() {
    let (_library, reader) = open_with(SyntheticFaults {
        truncated_resource: Some(1),
        ..SyntheticFaults::default()
    });
    let mut row = [0_u8; 16];

    let result = reader.read_scanline(1, 0, 0, &mut row);
    assert!(matches!(
        result,
        Err(BrawError::ResourceSizeMismatch { frame_index: 1, expected: 32, actual: 31 })
    ));
}

#[test]
fn size_mismatch_never_serves_previous_frame() {
    let (_library, reader) = open_with(SyntheticFaults {
        truncated_resource: Some(1),
        ..SyntheticFaults::default()
    });
    let mut row = [0_u8; 16];

    reader.read_scanline(0, 0, 0, &mut row).unwrap();
    assert_eq!(&row[..], &pattern(0, 16)[..]);

    row.fill(0xEE);
    assert!(reader.read_scanline(1, 0, 0, &mut row).is_err());
    assert_eq!(row, [0xEE; 16]);

    // Frame 0 decodes again after the failed cycle.
    reader.read_scanline(0, 0, 1, &mut row).unwrap();
    assert_eq!(&row[..], &pattern(0, 32)[16..]);
}

#[test]
fn read_submission_failure_is_returned() {
    let (library, reader) = open_with(SyntheticFaults {
        read_submit: Some(1),
        ..SyntheticFaults::default()
    });
    let mut row = [0_u8; 16];

    let result = reader.read_scanline(1, 0, 0, &mut row);
    assert!(matches!(result, Err(BrawError::ReadFailed { frame_index: 1, .. })));
    assert_eq!(library.stats().read_jobs_submitted, 1);
    assert_eq!(reader.current_subimage(), 1);
}

#[test]
fn failed_decode_is_retried_on_next_read() {
    let (library, reader) = open_with(SyntheticFaults {
        process_completion: Some(1),
        ..SyntheticFaults::default()
    });
    let mut row = [0_u8; 16];

    assert!(matches!(
        reader.read_scanline(1, 0, 0, &mut row),
        Err(BrawError::DecodeFailed { frame_index: 1, .. })
    ));
    assert!(reader.read_scanline(1, 0, 0, &mut row).is_err());

    // Each attempt submitted its own read.
    assert_eq!(library.stats().read_jobs_submitted, 3);
}

#[test]
fn failed_read_completion_is_reported() {
    let (_library, reader) = open_with(SyntheticFaults {
        read_completion: Some(1),
        ..SyntheticFaults::default()
    });
    let mut row = [0_u8; 16];

    match reader.read_scanline(1, 0, 0, &mut row) {
        Err(BrawError::ReadFailed { frame_index, reason }) => {
            assert_eq!(frame_index, 1);
            assert!(reason.contains("corrupt"), "unexpected reason: {reason}");
        }
        other => panic!("Expected ReadFailed, got {other:?}"),
    }
}

#[test]
fn completions_for_other_frames_are_ignored() {
    let layout = FrameLayout::new(4, 2, PixelFormat::Rgba8);
    let bridge = FrameDecodeBridge::new(layout, PixelFormat::Rgba8);
    let callback = bridge.callback();

    callback.read_complete(5, Err(NativeError::failed("late completion")));
    callback.process_complete(5, Err(NativeError::failed("late completion")));

    assert_eq!(bridge.phase(), DecodePhase::Idle);
    assert_eq!(bridge.buffered_frame(), None);
}
