//! Clip validation.
//!
//! Provides [`ScanlineReader::validate`](crate::ScanlineReader::validate)
//! which inspects an opened clip and returns a [`ValidationReport`]
//! describing its structure and anything that may affect decoding.
//!
//! # Example
//!
//! ```no_run
//! use braw_input::{BrawError, OpenOptions, ScanlineReader};
//! use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
//!
//! let library = SyntheticLibrary::new(SyntheticClipSpec::default());
//! let options = OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so");
//! let reader = ScanlineReader::open("clip.braw", &options, &library)?;
//! let report = reader.validate();
//! if report.is_valid() {
//!     println!("Clip is valid");
//! } else {
//!     print!("{report}");
//! }
//! # Ok::<(), BrawError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::reader::ScanlineReader;

/// Frame rates above this are reported as unusual.
const MAX_EXPECTED_FRAME_RATE: f32 = 240.0;

/// Summary of clip validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that may affect decoding or color.
    pub warnings: Vec<String>,
    /// Fatal issues that prevent decoding.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of issues (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

pub(crate) fn validate_reader(reader: &ScanlineReader) -> ValidationReport {
    let mut report = ValidationReport::default();
    let info = reader.info();

    if !reader.is_open() {
        report.errors.push("Clip is closed".to_string());
    }

    if info.width == 0 || info.height == 0 {
        report.errors.push(format!(
            "Invalid frame dimensions: {}×{}",
            info.width, info.height,
        ));
    }

    if info.frame_count == 0 {
        report.errors.push("Clip contains no frames".to_string());
    }

    if !info.frame_rate.is_finite() || info.frame_rate <= 0.0 {
        report
            .warnings
            .push("Frame rate is zero, negative, or not a number".to_string());
    } else if info.frame_rate > MAX_EXPECTED_FRAME_RATE {
        report.warnings.push(format!(
            "Unusually high frame rate ({:.1} fps)",
            info.frame_rate,
        ));
    }

    let color = reader.color_pipeline();
    for (label, resolved) in [("gamut", &color.gamut), ("gamma", &color.gamma)] {
        if resolved.is_fallback() {
            report.warnings.push(format!(
                "Requested {label} is not supported by this camera; using {:?}",
                resolved.value(),
            ));
        }
    }

    for truncation in &reader.metadata_report().truncated {
        report.warnings.push(format!(
            "Incomplete {} ({} entries read): {}",
            truncation.source, truncation.attached, truncation.reason,
        ));
    }

    report.info.push(format!(
        "Clip: {}×{} @ {:.3} fps, {} frames, {}, {}",
        info.width,
        info.height,
        info.frame_rate,
        info.frame_count,
        reader.pixel_format(),
        color.colorspace(),
    ));
    if let Some(camera_type) = &info.camera_type {
        report.info.push(format!("Camera: {camera_type}"));
    }

    report
}
