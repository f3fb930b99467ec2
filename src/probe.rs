//! Lightweight clip probing.
//!
//! [`ClipProbe`] opens a clip, captures its [`ImageDescription`], and closes
//! it again. Useful for inspecting many clips without keeping a codec and
//! frame buffer alive per file.
//!
//! For reading frames, use [`ScanlineReader::open`] instead.

use std::path::Path;

use crate::codec::CodecLibrary;
use crate::configuration::OpenOptions;
use crate::error::BrawError;
use crate::metadata::ImageDescription;
use crate::reader::ScanlineReader;

/// Lightweight clip probe.
///
/// # Example
///
/// ```no_run
/// use braw_input::{BrawError, ClipProbe, OpenOptions};
/// use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
///
/// let library = SyntheticLibrary::new(SyntheticClipSpec::default());
/// let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
/// let description = ClipProbe::probe("A001_C001.braw", &options, &library)?;
/// println!("{}", description.to_json());
/// # Ok::<(), BrawError>(())
/// ```
pub struct ClipProbe;

impl ClipProbe {
    /// Open `path`, capture its description, and release every handle.
    ///
    /// # Errors
    ///
    /// Returns any error [`ScanlineReader::open`] would.
    pub fn probe<P: AsRef<Path>>(
        path: P,
        options: &OpenOptions,
        library: &dyn CodecLibrary,
    ) -> Result<ImageDescription, BrawError> {
        let reader = ScanlineReader::open(path, options, library)?;
        Ok(reader.description().clone())
    }

    /// Probe several clips. Clips that cannot be opened produce an `Err`
    /// entry rather than aborting the batch.
    pub fn probe_many<P: AsRef<Path>>(
        paths: &[P],
        options: &OpenOptions,
        library: &dyn CodecLibrary,
    ) -> Vec<Result<ImageDescription, BrawError>> {
        paths
            .iter()
            .map(|path| Self::probe(path, options, library))
            .collect()
    }
}
