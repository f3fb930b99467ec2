//! Frame extraction, progress, and cancellation integration tests.

use std::sync::{Arc, Mutex};

use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary, pattern};
use braw_input::{
    BrawError, CancellationToken, ExtractOptions, FrameRange, OpenOptions, PixelFormat,
    ProgressCallback, ProgressInfo, ScanlineReader,
};

fn options() -> OpenOptions {
    OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so")
}

fn open(spec: SyntheticClipSpec, options: &OpenOptions) -> ScanlineReader {
    let library = SyntheticLibrary::new(spec);
    ScanlineReader::open("A001_C001.braw", options, &library).expect("Failed to open clip")
}

struct RecordingProgress {
    reports: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.reports.lock().unwrap().push(info.clone());
    }
}

// ── Images ─────────────────────────────────────────────────────────

#[test]
fn frame_image_matches_decoded_bytes() {
    let reader = open(SyntheticClipSpec::default(), &options());
    let image = reader.frame_image(1).unwrap();

    assert_eq!(image.width(), 4);
    assert_eq!(image.height(), 2);
    assert_eq!(image.to_rgba8().into_raw(), pattern(1, 32));
}

#[test]
fn bgra_frames_become_rgba_images() {
    let reader = open(
        SyntheticClipSpec::default(),
        &options().with_pixel_format(PixelFormat::Bgra8),
    );
    let image = reader.frame_image(0).unwrap().to_rgba8();

    let raw = pattern(0, 32);
    assert_eq!(image.get_pixel(0, 0).0, [raw[2], raw[1], raw[0], raw[3]]);
}

#[test]
fn sixteen_bit_frames_keep_sample_width() {
    let reader = open(
        SyntheticClipSpec::default(),
        &options().with_pixel_format(PixelFormat::Rgba16),
    );
    let image = reader.frame_image(0).unwrap();
    assert!(image.as_rgba16().is_some());
    assert_eq!(reader.description().to_json()["pixel_type"], "uint16");
}

#[test]
fn save_frame_writes_png() {
    let reader = open(SyntheticClipSpec::default(), &options());
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("frame_1.png");

    reader.save_frame(1, &path).unwrap();

    let saved = image::open(&path).unwrap().to_rgba8();
    assert_eq!(saved.into_raw(), pattern(1, 32));
}

// ── Ranges ─────────────────────────────────────────────────────────

#[test]
fn frames_follow_range_order() {
    let reader = open(SyntheticClipSpec::default().with_frame_count(6), &options());

    let frames = reader.frames(FrameRange::Specific(vec![4, 1])).unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].to_rgba8().into_raw(), pattern(4, 32));
    assert_eq!(frames[1].to_rgba8().into_raw(), pattern(1, 32));

    let frames = reader.frames(FrameRange::Interval(2)).unwrap();
    assert_eq!(frames.len(), 3);
}

#[test]
fn for_each_frame_reports_indices() {
    let reader = open(SyntheticClipSpec::default().with_frame_count(6), &options());
    let mut seen = Vec::new();

    reader
        .for_each_frame(FrameRange::Range(2, 4), &ExtractOptions::new(), |index, _| {
            seen.push(index);
            Ok(())
        })
        .unwrap();

    assert_eq!(seen, vec![2, 3, 4]);
}

#[test]
fn invalid_ranges_are_rejected() {
    let reader = open(SyntheticClipSpec::default(), &options());

    assert!(matches!(
        reader.frames(FrameRange::Range(1, 0)),
        Err(BrawError::InvalidRange { start: 1, end: 0 })
    ));
    assert!(matches!(
        reader.frames(FrameRange::Interval(0)),
        Err(BrawError::InvalidInterval)
    ));
    assert!(matches!(
        reader.frames(FrameRange::Range(0, 2)),
        Err(BrawError::SubimageOutOfRange { subimage: 2, .. })
    ));
}

#[test]
fn callback_error_stops_extraction() {
    let reader = open(SyntheticClipSpec::default().with_frame_count(4), &options());
    let mut count = 0;

    let result = reader.for_each_frame(FrameRange::Interval(1), &ExtractOptions::new(), |_, _| {
        count += 1;
        if count == 2 {
            return Err(BrawError::Cancelled);
        }
        Ok(())
    });

    assert!(matches!(result, Err(BrawError::Cancelled)));
    assert_eq!(count, 2);
}

// ── Progress & cancellation ────────────────────────────────────────

#[test]
fn progress_reports_every_batch_and_at_end() {
    let reader = open(SyntheticClipSpec::default().with_frame_count(4), &options());
    let progress = Arc::new(RecordingProgress {
        reports: Mutex::new(Vec::new()),
    });
    let extract = ExtractOptions::new()
        .with_progress(progress.clone())
        .with_batch_size(2);

    reader
        .for_each_frame(FrameRange::Range(0, 3), &extract, |_, _| Ok(()))
        .unwrap();

    let reports = progress.reports.lock().unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].current, 2);
    assert_eq!(reports[0].current_frame, Some(1));
    assert_eq!(reports[2].current, 4);
    assert_eq!(reports[2].total, Some(4));
    assert_eq!(reports[2].percentage, Some(100.0));
}

#[test]
fn cancelled_token_stops_before_first_frame() {
    let reader = open(SyntheticClipSpec::default(), &options());
    let token = CancellationToken::new();
    token.cancel();
    let extract = ExtractOptions::new().with_cancellation(token);

    let mut called = false;
    let result = reader.for_each_frame(FrameRange::Range(0, 1), &extract, |_, _| {
        called = true;
        Ok(())
    });

    assert!(matches!(result, Err(BrawError::Cancelled)));
    assert!(!called);
}

#[test]
fn cancellation_mid_extraction() {
    let reader = open(SyntheticClipSpec::default().with_frame_count(5), &options());
    let token = CancellationToken::new();
    let extract = ExtractOptions::new().with_cancellation(token.clone());

    let mut seen = Vec::new();
    let result = reader.for_each_frame(FrameRange::Range(0, 4), &extract, |index, _| {
        seen.push(index);
        if index == 1 {
            token.cancel();
        }
        Ok(())
    });

    assert!(matches!(result, Err(BrawError::Cancelled)));
    assert_eq!(seen, vec![0, 1]);
}
