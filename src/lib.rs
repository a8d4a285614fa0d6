//! # dcmsift
//!
//! Async DICOM directory scanner that filters files by patient age and sex.
//!
//! dcmsift walks a directory tree, reads every visible file, extracts the
//! `PatientAge` and `PatientSex` tags, and reports the paths whose tags
//! exactly match a caller-supplied filter. It owns the traversal engine,
//! the age-code conversion, the error taxonomy, and the builder API. It
//! does **not** own the DICOM decoding itself: that sits behind the
//! [`TagParser`] trait, with a default backed by the `dicom-object` crate.
//!
//! Files that cannot be decoded and directories that cannot be listed are
//! reported in [`ScanReport::skipped`], and removed from disk when the scan
//! is explicitly configured to do so. Entries whose names start with `.`
//! are ignored entirely.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), dcmsift::ScanError> {
//! let report = dcmsift::scan()
//!     .root("/archive/studies")
//!     .matching(35.0, 'M')
//!     .run()
//!     .await?;
//!
//! for path in &report.matches {
//!     println!("{}", path.display());
//! }
//! println!(
//!     "{} matches, {} skipped in {:.3}s",
//!     report.matches.len(),
//!     report.skipped.len(),
//!     report.stats.duration.as_secs_f64()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Age codes
//!
//! `PatientAge` carries a 4-character code: a zero-padded count and a unit,
//! as in `"035Y"`, `"006M"`, `"012W"`, `"100D"`. Counts convert to years
//! before matching (months divide by 12, weeks by 52, days by 356). Codes
//! that do not fit the format never match; they are not treated as errors.
//!
//! # Custom parsers
//!
//! Implement [`TagParser`] to back the scan with a different DICOM library:
//!
//! ```rust
//! use dcmsift::{PatientTags, TagError, TagParser};
//!
//! struct HeaderOnlyParser;
//!
//! impl TagParser for HeaderOnlyParser {
//!     fn patient_tags(&self, bytes: &[u8]) -> Result<PatientTags, TagError> {
//!         // ... decode bytes with the library of your choice ...
//! #       let _ = bytes;
//!         Ok(PatientTags { age: "035Y".into(), sex: "M".into() })
//!     }
//! }
//! ```

#![forbid(unsafe_code)]

use std::path::PathBuf;

mod builder;
mod engine;
mod entry;
mod error;
mod filter;
mod parser;
mod results;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::ScanBuilder;
pub use error::{ScanError, TagError};
pub use filter::PatientFilter;
pub use parser::{DicomTagParser, PatientTags, TagParser};
pub use results::{ScanReport, ScanStats};

// ── Entry points ──────────────────────────────────────────────────────────────

/// Create a new [`ScanBuilder`] to configure and run a scan.
///
/// # Example
///
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), dcmsift::ScanError> {
/// let report = dcmsift::scan()
///     .root("/archive/studies")
///     .matching(2.0, 'F')
///     .run()
///     .await?;
///
/// println!("{} matching files", report.matches.len());
/// # Ok(())
/// # }
/// ```
pub fn scan() -> ScanBuilder {
    ScanBuilder::default()
}

/// Collect every file under `root` whose tags match `age_years` and `sex`.
///
/// This is the single-call form of [`scan()`], and it never fails: a
/// configuration problem is logged and yields an empty list, and traversal
/// errors only ever exclude the affected subtree. Nothing is deleted; for
/// the destructive variant, use the builder with
/// [`delete_rejects(true)`](ScanBuilder::delete_rejects).
///
/// # Example
///
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() {
/// let paths = dcmsift::find_matching_files("/archive/studies", 2.0, 'F').await;
/// println!("{} matching files", paths.len());
/// # }
/// ```
pub async fn find_matching_files(
    root: impl Into<PathBuf>,
    age_years: f64,
    sex: char,
) -> Vec<PathBuf> {
    match scan().root(root).matching(age_years, sex).run().await {
        Ok(report) => report.matches,
        Err(err) => {
            tracing::warn!(error = %err, "scan not started");
            Vec::new()
        }
    }
}
