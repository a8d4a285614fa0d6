use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::entry::{is_hidden, EntryKind};
use crate::error::ScanError;
use crate::filter::PatientFilter;
use crate::parser::{PatientTags, TagParser};
use crate::results::{ScanReport, ScanStats};

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Internal options passed from the builder to `run()`.
pub(crate) struct EngineOptions {
    pub root:           PathBuf,
    pub filter:         PatientFilter,
    pub parser:         Arc<dyn TagParser>,
    pub delete_rejects: bool,
    pub max_in_flight:  usize,
    pub max_depth:      Option<usize>,
}

/// Immutable state shared by every branch task.
struct ScanCtx {
    filter:         PatientFilter,
    parser:         Arc<dyn TagParser>,
    limiter:        Arc<Semaphore>,
    delete_rejects: bool,
    max_depth:      Option<usize>,
}

impl ScanCtx {
    /// Acquire one concurrency permit.
    ///
    /// The limiter is never closed while a scan is running, and permits are
    /// never held across an await on a child branch.
    async fn permit(&self) -> OwnedSemaphorePermit {
        Arc::clone(&self.limiter)
            .acquire_owned()
            .await
            .expect("scan limiter closed")
    }

    /// Whether a directory at `depth` is too deep to list.
    ///
    /// A directory is listed only while `depth < max_depth`, which puts its
    /// entries at `depth + 1 <= max_depth`.
    fn out_of_depth(&self, depth: usize) -> bool {
        self.max_depth.map(|max| depth >= max).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Branch accumulator
// ---------------------------------------------------------------------------

/// One subtree's contribution to the scan.
///
/// Every branch task owns its accumulator exclusively and hands it to the
/// parent on completion; parents absorb children by concatenation. There is
/// no shared collection and no flattening pass.
#[derive(Default)]
struct Branch {
    matches: Vec<PathBuf>,
    deleted: Vec<PathBuf>,
    skipped: Vec<ScanError>,
    files:   usize,
    dirs:    usize,
}

impl Branch {
    fn merge(&mut self, child: Branch) {
        self.matches.extend(child.matches);
        self.deleted.extend(child.deleted);
        self.skipped.extend(child.skipped);
        self.files += child.files;
        self.dirs += child.dirs;
    }
}

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Execute a scan with the given options.
///
/// This is the traversal core. Called by `ScanBuilder::run()` after
/// validating inputs; from here on nothing fails outward.
pub(crate) async fn run(opts: EngineOptions) -> ScanReport {
    let ctx = Arc::new(ScanCtx {
        filter:         opts.filter,
        parser:         opts.parser,
        limiter:        Arc::new(Semaphore::new(opts.max_in_flight)),
        delete_rejects: opts.delete_rejects,
        max_depth:      opts.max_depth,
    });

    let start = Instant::now();
    let branch = scan_tree(Arc::clone(&ctx), opts.root, 0).await;
    let duration = start.elapsed();

    info!(
        matches = branch.matches.len(),
        deleted = branch.deleted.len(),
        skipped = branch.skipped.len(),
        files = branch.files,
        dirs = branch.dirs,
        elapsed_ms = duration.as_millis() as u64,
        "scan completed"
    );

    ScanReport {
        matches: branch.matches,
        deleted: branch.deleted,
        skipped: branch.skipped,
        stats:   ScanStats::compute(branch.files, branch.dirs, duration),
    }
}

// ---------------------------------------------------------------------------
// Tree traversal
// ---------------------------------------------------------------------------

/// Scan one directory and everything beneath it.
///
/// Returns this subtree's flat contribution; the caller merges it into its
/// own. Recursion is boxed because an async fn cannot name its own future.
fn scan_tree(
    ctx: Arc<ScanCtx>,
    dir: PathBuf,
    depth: usize,
) -> Pin<Box<dyn Future<Output = Branch> + Send>> {
    Box::pin(async move {
        let mut branch = Branch::default();

        if ctx.out_of_depth(depth) {
            return branch;
        }

        let listed = {
            let _permit = ctx.permit().await;
            list_level(&dir).await
        };

        let names = match listed {
            Ok(names) => names,
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "cannot list directory");
                reject(&ctx, &dir, err, &mut branch).await;
                return branch;
            }
        };

        branch.dirs += 1;
        debug!(path = %dir.display(), entries = names.len(), depth, "scanning directory");

        // Every entry gets its own task. Permits are only taken inside the
        // tasks, so awaiting them here cannot starve the limiter.
        let mut children = Vec::with_capacity(names.len());
        for name in names {
            let ctx = Arc::clone(&ctx);
            let path = dir.join(name);
            children.push((path.clone(), tokio::spawn(process_entry(ctx, path, depth + 1))));
        }

        for (path, child) in children {
            match child.await {
                Ok(sub) => branch.merge(sub),
                // A panicked branch task loses its subtree, not the scan.
                Err(err) => branch.skipped.push(ScanError::Task {
                    path,
                    reason: err.to_string(),
                }),
            }
        }

        branch
    })
}

/// List the names of one directory level, hidden entries removed.
///
/// A level that cannot be listed to the end is treated the same as one that
/// cannot be opened at all.
async fn list_level(dir: &Path) -> Result<Vec<OsString>, ScanError> {
    let mut reader = tokio::fs::read_dir(dir).await.map_err(|source| ScanError::List {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    loop {
        match reader.next_entry().await {
            Ok(Some(entry)) => {
                let name = entry.file_name();
                if !is_hidden(&name) {
                    names.push(name);
                }
            }
            Ok(None) => break,
            Err(source) => {
                return Err(ScanError::List {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        }
    }
    Ok(names)
}

/// Classify one directory entry and produce its contribution.
///
/// Hidden names were already filtered out. Failures are absorbed into the
/// returned branch; nothing propagates past it.
async fn process_entry(ctx: Arc<ScanCtx>, path: PathBuf, depth: usize) -> Branch {
    let mut branch = Branch::default();

    // Follows symlinks, so a link is handled as whatever it points at.
    let stat = {
        let _permit = ctx.permit().await;
        tokio::fs::metadata(&path).await
    };

    let meta = match stat {
        Ok(meta) => meta,
        Err(source) => {
            warn!(path = %path.display(), error = %source, "cannot classify entry");
            branch.skipped.push(ScanError::Stat { path, source });
            return branch;
        }
    };

    match EntryKind::of(&meta) {
        EntryKind::Dir => scan_tree(ctx, path, depth).await,
        EntryKind::File => {
            evaluate_file(&ctx, &path, &mut branch).await;
            branch
        }
        EntryKind::Other => {
            warn!(path = %path.display(), "skipping unsupported entry");
            branch.skipped.push(ScanError::Unsupported { path });
            branch
        }
    }
}

// ---------------------------------------------------------------------------
// File evaluation
// ---------------------------------------------------------------------------

/// Read one file, extract its tags, and evaluate the filter.
async fn evaluate_file(ctx: &ScanCtx, path: &Path, branch: &mut Branch) {
    branch.files += 1;

    // One permit covers both the read and the parse.
    let parsed = {
        let _permit = ctx.permit().await;
        read_and_parse(ctx, path).await
    };

    match parsed {
        Ok(tags) => {
            if ctx.filter.matches(&tags) {
                branch.matches.push(path.to_path_buf());
            }
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "rejecting file");
            reject(ctx, path, err, branch).await;
        }
    }
}

/// Read the whole file and hand the bytes to the parser.
///
/// Parsing is CPU-bound and runs on the blocking pool; a parser that panics
/// surfaces as a `Task` error here and rejects the file.
async fn read_and_parse(ctx: &ScanCtx, path: &Path) -> Result<PatientTags, ScanError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let parser = Arc::clone(&ctx.parser);
    tokio::task::spawn_blocking(move || parser.patient_tags(&bytes))
        .await
        .map_err(|err| ScanError::Task {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?
        .map_err(|source| ScanError::Rejected {
            path: path.to_path_buf(),
            source,
        })
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

/// Record a rejected path and, when enabled, remove it from disk.
///
/// Removal failures are recorded alongside the rejection; they never
/// interrupt the scan.
async fn reject(ctx: &ScanCtx, path: &Path, err: ScanError, branch: &mut Branch) {
    branch.skipped.push(err);

    if !ctx.delete_rejects {
        return;
    }

    let removed = {
        let _permit = ctx.permit().await;
        delete_path(path).await
    };

    match removed {
        Ok(()) => {
            info!(path = %path.display(), "deleted rejected path");
            branch.deleted.push(path.to_path_buf());
        }
        Err(source) => {
            warn!(path = %path.display(), error = %source, "cannot delete rejected path");
            branch.skipped.push(ScanError::Delete {
                path: path.to_path_buf(),
                source,
            });
        }
    }
}

/// Remove a path from disk, directory trees included.
async fn delete_path(path: &Path) -> std::io::Result<()> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}
