//! In-memory implementation of the codec seam.
//!
//! [`SyntheticLibrary`] behaves like the native codec library without
//! reading any file: clips are described by a [`SyntheticClipSpec`], jobs
//! run on a dedicated worker thread fed through a channel, and completions
//! arrive through the registered [`CodecCallback`] exactly as they would
//! from the vendor library. Pixel content is deterministic (see
//! [`pattern`]), so decoded rows can be compared byte for byte.
//!
//! Failures at each stage can be injected through [`SyntheticFaults`], and
//! [`SyntheticLibrary::stats`] reports submitted jobs, applied processing
//! attributes, and the order in which handles were released.
//!
//! # Example
//!
//! ```
//! use braw_input::{BrawError, OpenOptions, ScanlineReader};
//! use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
//!
//! let library = SyntheticLibrary::new(SyntheticClipSpec::default().with_dimensions(8, 4));
//! let options = OpenOptions::new().with_library_path("/opt/braw/libBlackmagicRawAPI.so");
//! let reader = ScanlineReader::open("A001_C001.braw", &options, &library)?;
//!
//! let mut row = vec![0_u8; 8 * 4];
//! reader.read_scanline(0, 0, 0, &mut row)?;
//! assert_eq!(library.stats().read_jobs_submitted, 2);
//! # Ok::<(), BrawError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex};

use crate::codec::{
    Clip, ClipAttribute, Codec, CodecCallback, CodecFactory, CodecLibrary, E_INVALIDARG, Frame,
    FrameAttribute, Job, MetadataIter, NativeError, NativeResult, ProcessedImage,
    ProcessingOverrides, ResourceFormat,
};
use crate::variant::{MetadataEntry, Variant, VariantArray};

/// Deterministic pixel bytes for `frame_index`.
///
/// Byte `i` is `(frame_index * 31 + i) mod 256`, so consecutive frames
/// differ at every position.
pub fn pattern(frame_index: u64, len: usize) -> Vec<u8> {
    let seed = (frame_index.wrapping_mul(31) % 256) as usize;
    (0..len).map(|i| ((seed + i) % 256) as u8).collect()
}

/// Failures to inject into a synthetic codec.
///
/// Frame-indexed faults fire only for the named frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntheticFaults {
    pub factory_creation: bool,
    pub codec_creation: bool,
    pub clip_open: bool,
    pub set_callback: bool,
    /// Fail the allowed-value lookup for gamut and gamma.
    pub camera_attribute_lookup: bool,
    /// Reject submission of the read job for this frame.
    pub read_submit: Option<u64>,
    /// Deliver a failed read completion for this frame.
    pub read_completion: Option<u64>,
    /// Deliver a failed process completion for this frame.
    pub process_completion: Option<u64>,
    /// Deliver a processed image one byte short for this frame.
    pub truncated_resource: Option<u64>,
    /// Fail clip metadata iteration after this many entries.
    pub clip_metadata_error_after: Option<usize>,
    /// Fail frame metadata iteration after this many entries.
    pub frame_metadata_error_after: Option<usize>,
}

/// Description of the clip every synthetic codec opens.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticClipSpec {
    pub width: u32,
    pub height: u32,
    pub frame_count: u64,
    pub frame_rate: f32,
    pub camera_type: String,
    pub clip_metadata: Vec<MetadataEntry>,
    pub frame_metadata: Vec<MetadataEntry>,
    /// Gamut values the camera accepts.
    pub gamuts: Vec<Variant>,
    /// Gamma values the camera accepts.
    pub gammas: Vec<Variant>,
    pub clip_attributes: Vec<(ClipAttribute, Variant)>,
    pub frame_attributes: Vec<(FrameAttribute, Variant)>,
    pub faults: SyntheticFaults,
}

impl Default for SyntheticClipSpec {
    /// A 4×2 two-frame clip at 24 fps with a full set of attributes.
    fn default() -> Self {
        let camera_type = "Blackmagic Pocket Cinema Camera 6K".to_string();
        Self {
            width: 4,
            height: 2,
            frame_count: 2,
            frame_rate: 24.0,
            clip_metadata: vec![
                MetadataEntry::new("camera_type", camera_type.as_str()),
                MetadataEntry::new("firmware_version", "7.9.1"),
                MetadataEntry::new("sensor_rate", Variant::Array(VariantArray::U32(vec![24, 1]))),
                MetadataEntry::new(
                    "crop_origin",
                    Variant::Array(VariantArray::F32(vec![0.0, 0.5])),
                ),
            ],
            frame_metadata: vec![
                MetadataEntry::new("iso", 800_u32),
                MetadataEntry::new("white_balance_kelvin", 5600_u32),
                MetadataEntry::new("timecode", "01:00:00:00"),
            ],
            camera_type,
            gamuts: [
                "Blackmagic Design",
                "Rec.709",
                "Rec.2020",
                "ACES AP0",
                "ACES AP1",
                "P3 D65",
            ]
            .into_iter()
            .map(Variant::from)
            .collect(),
            gammas: [
                "Blackmagic Design Film",
                "Blackmagic Design Extended Video",
                "Rec.709",
                "Linear",
                "ACEScct",
            ]
            .into_iter()
            .map(Variant::from)
            .collect(),
            clip_attributes: vec![
                (ClipAttribute::ColorScienceGen, Variant::U16(5)),
                (ClipAttribute::Gamma, Variant::from("Blackmagic Design Film")),
                (ClipAttribute::Gamut, Variant::from("Blackmagic Design")),
                (ClipAttribute::ToneCurveContrast, Variant::F32(1.0)),
                (ClipAttribute::ToneCurveSaturation, Variant::F32(1.0)),
                (ClipAttribute::ToneCurveMidpoint, Variant::F32(0.409)),
                (ClipAttribute::ToneCurveHighlights, Variant::F32(1.0)),
                (ClipAttribute::ToneCurveShadows, Variant::F32(1.0)),
                (ClipAttribute::ToneCurveVideoBlackLevel, Variant::U16(0)),
                (ClipAttribute::ToneCurveBlackLevel, Variant::F32(0.0)),
                (ClipAttribute::ToneCurveWhiteLevel, Variant::F32(1.0)),
                (ClipAttribute::HighlightRecovery, Variant::U16(1)),
                (ClipAttribute::AnalogGainIsConstant, Variant::U16(1)),
                (ClipAttribute::AnalogGain, Variant::F32(1.0)),
                (ClipAttribute::Post3DLutMode, Variant::from("Disabled")),
                (ClipAttribute::EmbeddedPost3DLutName, Variant::from("")),
                (ClipAttribute::SidecarPost3DLutName, Variant::from("")),
                (ClipAttribute::GamutCompressionEnable, Variant::U16(0)),
            ],
            frame_attributes: vec![
                (FrameAttribute::WhiteBalanceKelvin, Variant::U32(5600)),
                (FrameAttribute::WhiteBalanceTint, Variant::S16(10)),
                (FrameAttribute::Exposure, Variant::F32(0.0)),
                (FrameAttribute::Iso, Variant::U32(800)),
                (FrameAttribute::AnalogGain, Variant::F32(1.0)),
            ],
            faults: SyntheticFaults::default(),
        }
    }
}

impl SyntheticClipSpec {
    #[must_use]
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_frame_count(mut self, frame_count: u64) -> Self {
        self.frame_count = frame_count;
        self
    }

    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    #[must_use]
    pub fn with_camera_type(mut self, camera_type: impl Into<String>) -> Self {
        self.camera_type = camera_type.into();
        self
    }

    /// Append a clip metadata entry.
    #[must_use]
    pub fn with_clip_metadata(mut self, key: impl Into<String>, value: impl Into<Variant>) -> Self {
        self.clip_metadata.push(MetadataEntry::new(key, value));
        self
    }

    /// Append a frame metadata entry, reported by every frame.
    #[must_use]
    pub fn with_frame_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<Variant>,
    ) -> Self {
        self.frame_metadata.push(MetadataEntry::new(key, value));
        self
    }

    /// Replace the accepted gamut values.
    #[must_use]
    pub fn with_gamuts<I, S>(mut self, gamuts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gamuts = gamuts.into_iter().map(|gamut| Variant::String(gamut.into())).collect();
        self
    }

    /// Replace the accepted gamma values.
    #[must_use]
    pub fn with_gammas<I, S>(mut self, gammas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gammas = gammas.into_iter().map(|gamma| Variant::String(gamma.into())).collect();
        self
    }

    #[must_use]
    pub fn with_faults(mut self, faults: SyntheticFaults) -> Self {
        self.faults = faults;
        self
    }
}

/// Snapshot of what a [`SyntheticLibrary`] has observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyntheticStats {
    /// Read jobs accepted by [`Job::submit`].
    pub read_jobs_submitted: u64,
    /// Decode-and-process jobs accepted by [`Job::submit`].
    pub process_jobs_submitted: u64,
    /// Released handles in release order: `"clip"`, `"codec"`, `"factory"`.
    pub released: Vec<&'static str>,
    /// Directories factories were created from.
    pub library_dirs: Vec<PathBuf>,
    /// Overrides carried by the latest decode-and-process job.
    pub last_overrides: Option<ProcessingOverrides>,
    /// Clip processing attributes set through [`Clip::set_processing_attribute`].
    pub clip_attributes_set: Vec<(ClipAttribute, Variant)>,
}

#[derive(Default)]
struct Recorder {
    read_jobs: AtomicU64,
    process_jobs: AtomicU64,
    released: Mutex<Vec<&'static str>>,
    library_dirs: Mutex<Vec<PathBuf>>,
    last_overrides: Mutex<Option<ProcessingOverrides>>,
    clip_attributes_set: Mutex<Vec<(ClipAttribute, Variant)>>,
}

impl Recorder {
    fn release(&self, handle: &'static str) {
        self.released.lock().push(handle);
    }
}

/// A codec library backed entirely by memory.
#[derive(Clone)]
pub struct SyntheticLibrary {
    spec: Arc<SyntheticClipSpec>,
    recorder: Arc<Recorder>,
}

impl SyntheticLibrary {
    pub fn new(spec: SyntheticClipSpec) -> Self {
        Self {
            spec: Arc::new(spec),
            recorder: Arc::new(Recorder::default()),
        }
    }

    pub fn spec(&self) -> &SyntheticClipSpec {
        &self.spec
    }

    pub fn stats(&self) -> SyntheticStats {
        let recorder = &self.recorder;
        SyntheticStats {
            read_jobs_submitted: recorder.read_jobs.load(Ordering::Acquire),
            process_jobs_submitted: recorder.process_jobs.load(Ordering::Acquire),
            released: recorder.released.lock().clone(),
            library_dirs: recorder.library_dirs.lock().clone(),
            last_overrides: recorder.last_overrides.lock().clone(),
            clip_attributes_set: recorder.clip_attributes_set.lock().clone(),
        }
    }
}

impl CodecLibrary for SyntheticLibrary {
    fn create_factory(&self, library_dir: &Path) -> NativeResult<Box<dyn CodecFactory>> {
        if self.spec.faults.factory_creation {
            return Err(NativeError::failed("factory creation rejected"));
        }
        self.recorder.library_dirs.lock().push(library_dir.to_path_buf());
        Ok(Box::new(SyntheticFactory {
            spec: Arc::clone(&self.spec),
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

struct SyntheticFactory {
    spec: Arc<SyntheticClipSpec>,
    recorder: Arc<Recorder>,
}

impl CodecFactory for SyntheticFactory {
    fn create_codec(&self) -> NativeResult<Box<dyn Codec>> {
        if self.spec.faults.codec_creation {
            return Err(NativeError::failed("codec creation rejected"));
        }
        let codec = SyntheticCodec::start(Arc::clone(&self.spec), Arc::clone(&self.recorder))?;
        Ok(Box::new(codec))
    }
}

impl Drop for SyntheticFactory {
    fn drop(&mut self) {
        self.recorder.release("factory");
    }
}

enum Work {
    Read {
        frame_index: u64,
    },
    Process {
        frame_index: u64,
        format: ResourceFormat,
    },
    Shutdown,
}

/// Outstanding job count, signalled when it drops to zero.
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn begin(&self) {
        *self.count.lock() += 1;
    }

    fn end(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }
}

/// Job queue shared by the codec, its clip, frames, and jobs.
struct Queue {
    sender: Sender<Work>,
    pending: Pending,
    closed: AtomicBool,
}

impl Queue {
    fn submit(&self, work: Work) -> NativeResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(NativeError::failed("codec has been released"));
        }
        self.pending.begin();
        self.sender.send(work).map_err(|_| {
            self.pending.end();
            NativeError::failed("codec worker is not running")
        })
    }
}

type CallbackSlot = Arc<Mutex<Option<Arc<dyn CodecCallback>>>>;

struct SyntheticCodec {
    spec: Arc<SyntheticClipSpec>,
    recorder: Arc<Recorder>,
    queue: Arc<Queue>,
    callback: CallbackSlot,
    worker: Option<JoinHandle<()>>,
}

impl SyntheticCodec {
    fn start(spec: Arc<SyntheticClipSpec>, recorder: Arc<Recorder>) -> NativeResult<Self> {
        let (sender, receiver) = unbounded();
        let queue = Arc::new(Queue {
            sender,
            pending: Pending::default(),
            closed: AtomicBool::new(false),
        });
        let callback: CallbackSlot = Arc::new(Mutex::new(None));

        let worker = Worker {
            spec: Arc::clone(&spec),
            recorder: Arc::clone(&recorder),
            queue: Arc::clone(&queue),
            callback: Arc::clone(&callback),
        };
        let handle = thread::Builder::new()
            .name("braw-synthetic-worker".to_string())
            .spawn(move || worker.run(receiver))
            .map_err(|error| NativeError::failed(format!("cannot start worker thread: {error}")))?;

        Ok(Self {
            spec,
            recorder,
            queue,
            callback,
            worker: Some(handle),
        })
    }
}

impl Codec for SyntheticCodec {
    fn open_clip(&self, path: &Path) -> NativeResult<Box<dyn Clip>> {
        if self.spec.faults.clip_open {
            return Err(NativeError::failed(format!("cannot open {}", path.display())));
        }
        Ok(Box::new(SyntheticClip {
            spec: Arc::clone(&self.spec),
            recorder: Arc::clone(&self.recorder),
            queue: Arc::clone(&self.queue),
            attributes: Mutex::new(self.spec.clip_attributes.clone()),
        }))
    }

    fn set_callback(&self, callback: Arc<dyn CodecCallback>) -> NativeResult<()> {
        if self.spec.faults.set_callback {
            return Err(NativeError::failed("callback registration rejected"));
        }
        *self.callback.lock() = Some(callback);
        Ok(())
    }

    fn flush_jobs(&self) {
        self.queue.pending.wait_idle();
    }

    fn clip_attribute_values(
        &self,
        camera_type: &str,
        attribute: ClipAttribute,
        max_values: usize,
    ) -> NativeResult<Vec<Variant>> {
        if self.spec.faults.camera_attribute_lookup {
            return Err(NativeError::failed(format!(
                "no constants for camera {camera_type:?}"
            )));
        }
        let values = match attribute {
            ClipAttribute::Gamut => &self.spec.gamuts,
            ClipAttribute::Gamma => &self.spec.gammas,
            other => {
                return Err(NativeError::new(
                    E_INVALIDARG,
                    format!("{other} has no value list"),
                ));
            }
        };
        Ok(values.iter().take(max_values).cloned().collect())
    }
}

impl Drop for SyntheticCodec {
    fn drop(&mut self) {
        self.queue.closed.store(true, Ordering::Release);
        let _ = self.queue.sender.send(Work::Shutdown);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.callback.lock().take();
        self.recorder.release("codec");
    }
}

struct Worker {
    spec: Arc<SyntheticClipSpec>,
    recorder: Arc<Recorder>,
    queue: Arc<Queue>,
    callback: CallbackSlot,
}

impl Worker {
    fn run(self, receiver: Receiver<Work>) {
        for work in receiver {
            match work {
                Work::Shutdown => break,
                Work::Read { frame_index } => self.read(frame_index),
                Work::Process {
                    frame_index,
                    format,
                } => self.process(frame_index, format),
            }
            self.queue.pending.end();
        }
        log::debug!("Synthetic codec worker stopped");
    }

    fn callback(&self) -> Option<Arc<dyn CodecCallback>> {
        let callback = self.callback.lock().clone();
        if callback.is_none() {
            log::warn!("Synthetic job completed with no callback registered");
        }
        callback
    }

    fn read(&self, frame_index: u64) {
        let Some(callback) = self.callback() else {
            return;
        };
        if self.spec.faults.read_completion == Some(frame_index) {
            callback.read_complete(
                frame_index,
                Err(NativeError::failed(format!("frame {frame_index} is corrupt"))),
            );
            return;
        }
        let frame: Arc<dyn Frame> = Arc::new(SyntheticFrame {
            frame_index,
            spec: Arc::clone(&self.spec),
            recorder: Arc::clone(&self.recorder),
            queue: Arc::clone(&self.queue),
            format: Mutex::new(ResourceFormat::RgbaU8),
        });
        callback.read_complete(frame_index, Ok(frame));
    }

    fn process(&self, frame_index: u64, format: ResourceFormat) {
        let Some(callback) = self.callback() else {
            return;
        };
        if self.spec.faults.process_completion == Some(frame_index) {
            callback.process_complete(
                frame_index,
                Err(NativeError::failed(format!("frame {frame_index} failed to decode"))),
            );
            return;
        }
        let mut len = self.spec.width as usize
            * self.spec.height as usize
            * format.channels() as usize
            * format.element_size() as usize;
        if self.spec.faults.truncated_resource == Some(frame_index) {
            len = len.saturating_sub(1);
        }
        let image = SyntheticImage {
            width: self.spec.width,
            height: self.spec.height,
            format,
            data: pattern(frame_index, len),
        };
        callback.process_complete(frame_index, Ok(Box::new(image)));
    }
}

struct SyntheticClip {
    spec: Arc<SyntheticClipSpec>,
    recorder: Arc<Recorder>,
    queue: Arc<Queue>,
    attributes: Mutex<Vec<(ClipAttribute, Variant)>>,
}

impl Clip for SyntheticClip {
    fn width(&self) -> u32 {
        self.spec.width
    }

    fn height(&self) -> u32 {
        self.spec.height
    }

    fn frame_count(&self) -> u64 {
        self.spec.frame_count
    }

    fn frame_rate(&self) -> f32 {
        self.spec.frame_rate
    }

    fn camera_type(&self) -> NativeResult<String> {
        Ok(self.spec.camera_type.clone())
    }

    fn metadata(&self) -> NativeResult<MetadataIter<'_>> {
        Ok(metadata_iter(
            &self.spec.clip_metadata,
            self.spec.faults.clip_metadata_error_after,
        ))
    }

    fn processing_attribute(&self, attribute: ClipAttribute) -> NativeResult<Variant> {
        self.attributes
            .lock()
            .iter()
            .find(|(candidate, _)| *candidate == attribute)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| NativeError::new(E_INVALIDARG, format!("{attribute} is not set")))
    }

    fn set_processing_attribute(
        &self,
        attribute: ClipAttribute,
        value: &Variant,
    ) -> NativeResult<()> {
        let mut attributes = self.attributes.lock();
        match attributes.iter_mut().find(|(candidate, _)| *candidate == attribute) {
            Some((_, current)) => *current = value.clone(),
            None => attributes.push((attribute, value.clone())),
        }
        self.recorder
            .clip_attributes_set
            .lock()
            .push((attribute, value.clone()));
        Ok(())
    }

    fn create_read_job(&self, frame_index: u64) -> NativeResult<Box<dyn Job>> {
        if frame_index >= self.spec.frame_count {
            return Err(NativeError::new(
                E_INVALIDARG,
                format!("frame {frame_index} is past the end of the clip"),
            ));
        }
        Ok(Box::new(ReadJob {
            frame_index,
            reject: self.spec.faults.read_submit == Some(frame_index),
            recorder: Arc::clone(&self.recorder),
            queue: Arc::clone(&self.queue),
        }))
    }
}

impl Drop for SyntheticClip {
    fn drop(&mut self) {
        self.recorder.release("clip");
    }
}

fn metadata_iter(entries: &[MetadataEntry], error_after: Option<usize>) -> MetadataIter<'_> {
    let limit = error_after.unwrap_or(entries.len()).min(entries.len());
    let failure = error_after.map(|after| {
        Err(NativeError::failed(format!(
            "metadata iterator failed after {after} entries"
        )))
    });
    Box::new(entries[..limit].iter().cloned().map(Ok).chain(failure))
}

struct ReadJob {
    frame_index: u64,
    reject: bool,
    recorder: Arc<Recorder>,
    queue: Arc<Queue>,
}

impl Job for ReadJob {
    fn submit(self: Box<Self>) -> NativeResult<()> {
        if self.reject {
            return Err(NativeError::failed(format!(
                "read of frame {} rejected",
                self.frame_index
            )));
        }
        self.queue.submit(Work::Read {
            frame_index: self.frame_index,
        })?;
        self.recorder.read_jobs.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

struct SyntheticFrame {
    frame_index: u64,
    spec: Arc<SyntheticClipSpec>,
    recorder: Arc<Recorder>,
    queue: Arc<Queue>,
    format: Mutex<ResourceFormat>,
}

impl Frame for SyntheticFrame {
    fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn metadata(&self) -> NativeResult<MetadataIter<'_>> {
        Ok(metadata_iter(
            &self.spec.frame_metadata,
            self.spec.faults.frame_metadata_error_after,
        ))
    }

    fn processing_attribute(&self, attribute: FrameAttribute) -> NativeResult<Variant> {
        self.spec
            .frame_attributes
            .iter()
            .find(|(candidate, _)| *candidate == attribute)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| NativeError::new(E_INVALIDARG, format!("{attribute} is not set")))
    }

    fn set_resource_format(&self, format: ResourceFormat) -> NativeResult<()> {
        *self.format.lock() = format;
        Ok(())
    }

    fn create_decode_and_process_job(
        &self,
        overrides: &ProcessingOverrides,
    ) -> NativeResult<Box<dyn Job>> {
        *self.recorder.last_overrides.lock() = Some(overrides.clone());
        Ok(Box::new(ProcessJob {
            frame_index: self.frame_index,
            format: *self.format.lock(),
            recorder: Arc::clone(&self.recorder),
            queue: Arc::clone(&self.queue),
        }))
    }
}

struct ProcessJob {
    frame_index: u64,
    format: ResourceFormat,
    recorder: Arc<Recorder>,
    queue: Arc<Queue>,
}

impl Job for ProcessJob {
    fn submit(self: Box<Self>) -> NativeResult<()> {
        self.queue.submit(Work::Process {
            frame_index: self.frame_index,
            format: self.format,
        })?;
        self.recorder.process_jobs.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

struct SyntheticImage {
    width: u32,
    height: u32,
    format: ResourceFormat,
    data: Vec<u8>,
}

impl ProcessedImage for SyntheticImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resource_format(&self) -> ResourceFormat {
        self.format
    }

    fn resource(&self) -> NativeResult<&[u8]> {
        Ok(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_differs_between_frames() {
        assert_eq!(pattern(0, 4), vec![0, 1, 2, 3]);
        assert_eq!(pattern(1, 2), vec![31, 32]);
        assert_ne!(pattern(0, 16), pattern(1, 16));
    }

    #[test]
    fn metadata_iterator_fails_after_limit() {
        let entries = vec![
            MetadataEntry::new("a", "1"),
            MetadataEntry::new("b", "2"),
            MetadataEntry::new("c", "3"),
        ];
        let results: Vec<_> = metadata_iter(&entries, Some(2)).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].is_err());

        assert_eq!(metadata_iter(&entries, None).count(), 3);
    }

    #[test]
    fn value_lists_respect_limit() {
        let library = SyntheticLibrary::new(SyntheticClipSpec::default());
        let factory = library.create_factory(Path::new("/opt/braw")).unwrap();
        let codec = factory.create_codec().unwrap();
        let gamuts = codec
            .clip_attribute_values("any", ClipAttribute::Gamut, 2)
            .unwrap();
        assert_eq!(gamuts.len(), 2);
        assert!(codec
            .clip_attribute_values("any", ClipAttribute::ToneCurveContrast, 8)
            .is_err());
    }
}
