//! Async frame stream integration tests.

use std::sync::Arc;

use tokio_stream::StreamExt;

use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary, pattern};
use braw_input::{
    BrawError, CancellationToken, ExtractOptions, FrameRange, OpenOptions, ScanlineReader,
};

fn open(frame_count: u64) -> Arc<ScanlineReader> {
    let library = SyntheticLibrary::new(SyntheticClipSpec::default().with_frame_count(frame_count));
    let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
    let reader =
        ScanlineReader::open("A001_C001.braw", &options, &library).expect("Failed to open clip");
    Arc::new(reader)
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_yields_frames_in_order() {
    let reader = open(4);
    let mut stream = reader.frame_stream(FrameRange::Range(1, 3), ExtractOptions::new());

    let mut indices = Vec::new();
    while let Some(result) = stream.next().await {
        let (index, image) = result.unwrap();
        assert_eq!(image.to_rgba8().into_raw(), pattern(index, 32));
        indices.push(index);
    }
    assert_eq!(indices, vec![1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_reports_range_error() {
    let reader = open(2);
    let mut stream = reader.frame_stream(FrameRange::Interval(0), ExtractOptions::new());

    let first = stream.next().await.expect("Expected an error item");
    assert!(matches!(first, Err(BrawError::InvalidInterval)));
    assert!(stream.next().await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_honours_cancellation() {
    let reader = open(8);
    let token = CancellationToken::new();
    token.cancel();
    let options = ExtractOptions::new().with_cancellation(token);
    let mut stream = reader.frame_stream_with_capacity(FrameRange::Interval(1), options, 1);

    let first = stream.next().await.expect("Expected an error item");
    assert!(matches!(first, Err(BrawError::Cancelled)));
}

#[tokio::test(flavor = "multi_thread")]
async fn reader_stays_usable_after_stream() {
    let reader = open(2);
    let stream = reader.frame_stream(FrameRange::Range(0, 1), ExtractOptions::new());
    let frames: Vec<_> = stream.collect().await;
    assert_eq!(frames.len(), 2);

    let mut row = [0_u8; 16];
    reader.read_scanline(0, 0, 0, &mut row).unwrap();
    assert_eq!(&row[..], &pattern(0, 16)[..]);
}
