use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::{run, EngineOptions};
use crate::error::ScanError;
use crate::filter::PatientFilter;
use crate::parser::{DicomTagParser, TagParser};
use crate::results::ScanReport;

/// Default cap on concurrently pending filesystem operations.
const DEFAULT_IN_FLIGHT: usize = 64;

// ---------------------------------------------------------------------------
// ScanBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and executing a scan.
///
/// Created via [`dcmsift::scan()`](crate::scan). Configure with chained
/// builder methods, then call [`run()`](ScanBuilder::run) to execute.
///
/// # Example
///
/// ```rust,ignore
/// let report = dcmsift::scan()
///     .root("/archive/studies")
///     .matching(35.0, 'M')
///     .delete_rejects(true)
///     .max_in_flight(128)
///     .run()
///     .await?;
/// ```
pub struct ScanBuilder {
    root:           Option<PathBuf>,
    filter:         Option<PatientFilter>,
    parser:         Option<Box<dyn TagParser>>,
    delete_rejects: bool,
    max_in_flight:  usize,
    max_depth:      Option<usize>,
}

impl Default for ScanBuilder {
    fn default() -> Self {
        Self {
            root:           None,
            filter:         None,
            parser:         None,
            delete_rejects: false,
            max_in_flight:  DEFAULT_IN_FLIGHT,
            max_depth:      None,
        }
    }
}

impl ScanBuilder {
    // ── Root ──────────────────────────────────────────────────────────────

    /// Set the directory tree to scan.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    // ── Filter ────────────────────────────────────────────────────────────

    /// Set the patient filter files are matched against.
    ///
    /// For the common case, prefer the [`matching()`](ScanBuilder::matching)
    /// shorthand.
    pub fn filter(mut self, filter: PatientFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Shorthand for an exact age/sex filter.
    ///
    /// Equivalent to `.filter(PatientFilter::new(age_years, sex))`.
    pub fn matching(mut self, age_years: f64, sex: char) -> Self {
        self.filter = Some(PatientFilter::new(age_years, sex));
        self
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// Install a custom tag parser.
    ///
    /// Defaults to [`DicomTagParser`]. Use this to back the scan with a
    /// different DICOM library, or to stub out decoding in tests.
    pub fn with_parser(mut self, p: impl TagParser + 'static) -> Self {
        self.parser = Some(Box::new(p));
        self
    }

    /// Delete rejected paths from disk.
    ///
    /// Off by default. When enabled, every file the parser rejects and
    /// every directory that cannot be listed is removed and reported in
    /// [`ScanReport::deleted`]. Hidden entries and clean mismatches are
    /// never deleted.
    pub fn delete_rejects(mut self, yes: bool) -> Self {
        self.delete_rejects = yes;
        self
    }

    /// Cap on concurrently pending filesystem operations.
    ///
    /// Defaults to 64. Branches above the cap wait for a permit instead of
    /// issuing I/O. `0` is rejected by [`run()`](ScanBuilder::run).
    pub fn max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n;
        self
    }

    /// Maximum traversal depth. `0` means the root directory only, so no
    /// files are evaluated; `1` evaluates the root's immediate children,
    /// and so on. Unlimited by default.
    pub fn max_depth(mut self, d: usize) -> Self {
        self.max_depth = Some(d);
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Execute the scan and return the report.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for configuration errors: missing root, missing
    /// filter, a non-finite or negative filter age, or a zero concurrency
    /// cap. A started scan always completes; traversal failures are
    /// collected into [`ScanReport::skipped`].
    pub async fn run(self) -> Result<ScanReport, ScanError> {
        let root = self.root.ok_or(ScanError::MissingRoot)?;
        let filter = self.filter.ok_or(ScanError::MissingFilter)?;

        if !filter.age_years.is_finite() || filter.age_years < 0.0 {
            return Err(ScanError::InvalidFilter(format!(
                "age must be a finite non-negative number of years, got {}",
                filter.age_years
            )));
        }
        if self.max_in_flight == 0 {
            return Err(ScanError::InvalidConcurrency);
        }

        // Default parser: dicom-object
        let parser: Arc<dyn TagParser> = match self.parser {
            Some(p) => Arc::from(p),
            None    => Arc::new(DicomTagParser),
        };

        let opts = EngineOptions {
            root,
            filter,
            parser,
            delete_rejects: self.delete_rejects,
            max_in_flight:  self.max_in_flight,
            max_depth:      self.max_depth,
        };

        Ok(run(opts).await)
    }
}
