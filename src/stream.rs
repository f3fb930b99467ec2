//! Async frame streaming.
//!
//! [`FrameStream`] decodes frames of a shared [`ScanlineReader`] on a
//! blocking thread (`tokio::task::spawn_blocking`) and streams them back
//! through a bounded channel, so the codec's blocking flush never stalls the
//! async runtime.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokio_stream::StreamExt;
//!
//! use braw_input::{BrawError, ExtractOptions, FrameRange, OpenOptions, ScanlineReader};
//! use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
//!
//! # async fn example() -> Result<(), BrawError> {
//! let library = SyntheticLibrary::new(SyntheticClipSpec::default());
//! let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
//! let reader = Arc::new(ScanlineReader::open("clip.braw", &options, &library)?);
//! let mut stream = reader.frame_stream(FrameRange::Range(0, 1), ExtractOptions::new());
//!
//! while let Some(result) = stream.next().await {
//!     let (frame_index, image) = result?;
//!     image.save(format!("frame_{frame_index}.png"))?;
//! }
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use image::DynamicImage;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::configuration::ExtractOptions;
use crate::error::BrawError;
use crate::frames::FrameRange;
use crate::reader::ScanlineReader;

/// Bounded-channel capacity. Kept small so at most a few decoded frames
/// wait in memory.
const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type FrameItem = Result<(u64, DynamicImage), BrawError>;

/// A stream of decoded frames produced by a background decode thread.
///
/// Dropping the stream closes the channel; the background thread stops at
/// the next frame boundary.
pub struct FrameStream {
    receiver: Receiver<FrameItem>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl Stream for FrameStream {
    type Item = FrameItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl ScanlineReader {
    /// Stream the frames in `range` from a blocking worker.
    ///
    /// Must be called from within a Tokio runtime. Errors, including range
    /// errors, arrive as the last item of the stream.
    pub fn frame_stream(
        self: &Arc<Self>,
        range: FrameRange,
        options: ExtractOptions,
    ) -> FrameStream {
        create_frame_stream(Arc::clone(self), range, options, None)
    }

    /// As [`frame_stream`](Self::frame_stream) with an explicit channel
    /// capacity (minimum 1).
    pub fn frame_stream_with_capacity(
        self: &Arc<Self>,
        range: FrameRange,
        options: ExtractOptions,
        capacity: usize,
    ) -> FrameStream {
        create_frame_stream(Arc::clone(self), range, options, Some(capacity))
    }
}

fn create_frame_stream(
    reader: Arc<ScanlineReader>,
    range: FrameRange,
    options: ExtractOptions,
    channel_capacity: Option<usize>,
) -> FrameStream {
    let capacity = channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY).max(1);
    let (sender, receiver) = tokio::sync::mpsc::channel(capacity);

    let handle = tokio::task::spawn_blocking(move || {
        if let Err(error) = decode_frames_blocking(&reader, range, &options, &sender) {
            // The receiver may already be gone.
            let _ = sender.blocking_send(Err(error));
        }
    });

    FrameStream { receiver, handle }
}

fn decode_frames_blocking(
    reader: &ScanlineReader,
    range: FrameRange,
    options: &ExtractOptions,
    sender: &Sender<FrameItem>,
) -> Result<(), BrawError> {
    reader.for_each_frame(range, options, |frame_index, image| {
        sender
            .blocking_send(Ok((frame_index, image)))
            .map_err(|_| BrawError::Cancelled)
    })
}
