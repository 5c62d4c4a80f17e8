/// Moving files from a source directory into category folders.
///
/// A [`Sorter`] owns the source path, the destination root and the classification
/// rules for one run. A run prepares every category folder, moves files category
/// by category, optionally sweeps the leftovers into `misc`, and finally removes
/// category folders that stayed empty.
use crate::config::{CompiledConfig, CompiledFilters};
use crate::file_category::{Category, ClassificationTable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while sorting.
#[derive(Debug)]
pub enum SortError {
    /// The source directory does not exist.
    PathNotFound { path: PathBuf },
    /// Failed to create a category folder or the destination root.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to list a directory.
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a file into its category folder.
    MoveFailed {
        file: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },
    /// Failed to inspect or remove a category folder during cleanup.
    CleanupFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathNotFound { path } => write!(f, "No such path exists: {}", path.display()),
            Self::DirectoryCreationFailed { path, source } => {
                write!(f, "Failed to create directory {}: {}", path.display(), source)
            }
            Self::ReadDirFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::MoveFailed {
                file,
                destination,
                source,
            } => write!(
                f,
                "Failed to move {} to {}: {}",
                file.display(),
                destination.display(),
                source
            ),
            Self::CleanupFailed { path, source } => {
                write!(f, "Failed to clean up {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PathNotFound { .. } => None,
            Self::DirectoryCreationFailed { source, .. }
            | Self::ReadDirFailed { source, .. }
            | Self::MoveFailed { source, .. }
            | Self::CleanupFailed { source, .. } => Some(source),
        }
    }
}

/// Result type for sorting operations.
pub type SortResult<T> = Result<T, SortError>;

/// Where each category's folder lives.
#[derive(Debug, Clone)]
pub struct DestinationLayout {
    root: PathBuf,
}

impl DestinationLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `<root>/<category folder name>`.
    pub fn folder(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }
}

/// The file a failed move was working on, and why it failed.
#[derive(Debug, Clone, Serialize)]
pub struct MoveFailure {
    pub file: PathBuf,
    pub reason: String,
}

/// What happened to one category during a run.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOutcome {
    pub category: Category,
    pub moved: usize,
    /// Set when a move failed; the rest of that category's pass was skipped.
    pub failure: Option<MoveFailure>,
}

impl CategoryOutcome {
    fn new(category: Category) -> Self {
        Self {
            category,
            moved: 0,
            failure: None,
        }
    }
}

/// Result of the miscellaneous sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SweepOutcome {
    /// Leftover entries were moved into `misc`.
    Swept(CategoryOutcome),
    /// The sweep was disabled; `unmoved` entries remain in the source.
    Skipped { unmoved: usize },
}

/// Result of removing empty category folders.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    /// Folders that were empty and have been deleted.
    pub removed: Vec<Category>,
    /// Folders that hold entries, with their entry counts.
    pub retained: Vec<(Category, usize)>,
}

/// The stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Moving,
    Sweeping,
    CleaningUp,
}

impl Stage {
    pub const COUNT: u64 = 4;

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Preparing => "preparing folders",
            Stage::Moving => "moving files",
            Stage::Sweeping => "sweeping leftovers",
            Stage::CleaningUp => "removing empty folders",
        }
    }
}

/// A single planned move, as computed by [`Sorter::plan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub file: PathBuf,
    pub category: Category,
}

/// Summary of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    pub started_at: DateTime<Utc>,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Files found in the source before anything was moved.
    pub total_files: usize,
    pub categories: Vec<CategoryOutcome>,
    pub sweep: SweepOutcome,
    pub cleanup: CleanupReport,
    /// Files still in the source after the run.
    pub unmoved: usize,
}

impl SortReport {
    /// Total number of files moved, including the sweep.
    pub fn total_moved(&self) -> usize {
        let swept = match &self.sweep {
            SweepOutcome::Swept(outcome) => outcome.moved,
            SweepOutcome::Skipped { .. } => 0,
        };
        self.categories.iter().map(|c| c.moved).sum::<usize>() + swept
    }

    /// Returns true if any category pass was cut short by a failed move.
    pub fn has_failures(&self) -> bool {
        let sweep_failed = matches!(&self.sweep, SweepOutcome::Swept(o) if o.failure.is_some());
        sweep_failed || self.categories.iter().any(|c| c.failure.is_some())
    }
}

/// Sorts the files of one source directory into category folders.
///
/// # Examples
///
/// ```no_run
/// use sorthat::sorter::Sorter;
///
/// let sorter = Sorter::new("/home/me/Downloads", "/home/me/Sorted");
/// let report = sorter.run(false).expect("sort failed");
/// println!("Moved {} file(s)", report.total_moved());
/// ```
#[derive(Debug, Clone)]
pub struct Sorter {
    source: PathBuf,
    layout: DestinationLayout,
    table: ClassificationTable,
    filters: CompiledFilters,
}

impl Sorter {
    /// Creates a sorter with the standard extension sets and default filters.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            layout: DestinationLayout::new(destination),
            table: ClassificationTable::default(),
            filters: CompiledFilters::default(),
        }
    }

    /// Creates a sorter using a compiled configuration.
    pub fn from_config(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        config: CompiledConfig,
    ) -> Self {
        Self::new(source, destination)
            .with_table(config.table)
            .with_filters(config.filters)
    }

    pub fn with_table(mut self, table: ClassificationTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn layout(&self) -> &DestinationLayout {
        &self.layout
    }

    /// Fails with `PathNotFound` unless the source is an existing directory.
    fn ensure_source(&self) -> SortResult<()> {
        if self.source.is_dir() {
            Ok(())
        } else {
            Err(SortError::PathNotFound {
                path: self.source.clone(),
            })
        }
    }

    /// Lists the non-directory entries directly under the source, sorted by name.
    ///
    /// Symlinks count as files unless they point at a directory; moving one moves
    /// the link itself. With `filtered` set, hidden and excluded entries are left out.
    fn source_files(&self, filtered: bool) -> SortResult<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(&self.source).map_err(|e| SortError::ReadDirFailed {
            path: self.source.clone(),
            source: e,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("Skipping unreadable entry in {}: {}", self.source.display(), e);
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    log::debug!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if file_type.is_dir() || (file_type.is_symlink() && path.is_dir()) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if filtered && !self.filters.should_include(&name) {
                log::debug!("Leaving {} in place", name);
                continue;
            }
            files.push((name, path));
        }
        files.sort();
        Ok(files)
    }

    /// Counts the files that take part in sorting.
    pub fn total_files(&self) -> SortResult<usize> {
        self.ensure_source()?;
        Ok(self.source_files(true)?.len())
    }

    /// Counts every non-directory entry still directly under the source.
    pub fn unmoved_files(&self) -> SortResult<usize> {
        self.ensure_source()?;
        Ok(self.source_files(false)?.len())
    }

    /// Creates the destination root and every category folder that is missing.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if the source directory does not exist, before any
    /// folder is created.
    pub fn prepare_destinations(&self) -> SortResult<()> {
        self.ensure_source()?;

        let root = self.layout.root();
        if !root.exists() {
            fs::create_dir_all(root).map_err(|e| SortError::DirectoryCreationFailed {
                path: root.to_path_buf(),
                source: e,
            })?;
        }

        for category in Category::ALL {
            let folder = self.layout.folder(category);
            if !folder.exists() {
                fs::create_dir(&folder).map_err(|e| SortError::DirectoryCreationFailed {
                    path: folder.clone(),
                    source: e,
                })?;
                log::debug!("Created {}", folder.display());
            }
        }
        Ok(())
    }

    /// Moves every classified file into its category folder.
    ///
    /// Categories are processed in [`Category::ALL`] order. A failed move is
    /// recorded on its category and ends that category's pass; files already moved
    /// stay where they are.
    pub fn classify_and_move(&self) -> SortResult<Vec<CategoryOutcome>> {
        self.ensure_source()?;

        let mut outcomes = Vec::new();
        for category in Category::ALL {
            if category.is_catch_all() {
                continue;
            }

            let files = self
                .source_files(true)?
                .into_iter()
                .filter(|(name, _)| self.table.matches(category, name));
            let outcome = self.move_all(category, files);
            if outcome.moved > 0 {
                log::info!(
                    "Moved {} file(s) to {}",
                    outcome.moved,
                    self.layout.folder(category).display()
                );
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Moves every remaining entry into `misc` when enabled.
    ///
    /// When disabled nothing moves and the number of entries left behind is
    /// reported instead.
    pub fn sweep_miscellaneous(&self, enabled: bool) -> SortResult<SweepOutcome> {
        self.ensure_source()?;

        let files = self.source_files(true)?;
        if !enabled {
            log::info!("{} file(s) not moved", files.len());
            return Ok(SweepOutcome::Skipped {
                unmoved: files.len(),
            });
        }

        let outcome = self.move_all(Category::Misc, files);
        log::info!(
            "Moved {} file(s) to {}",
            outcome.moved,
            self.layout.folder(Category::Misc).display()
        );
        Ok(SweepOutcome::Swept(outcome))
    }

    /// Deletes category folders that hold no entries.
    ///
    /// Folders with contents are kept and their entry counts reported. Missing
    /// folders are skipped.
    pub fn cleanup(&self) -> SortResult<CleanupReport> {
        let mut report = CleanupReport::default();

        for category in Category::ALL {
            let folder = self.layout.folder(category);
            if !folder.is_dir() {
                continue;
            }

            let count = fs::read_dir(&folder)
                .map_err(|e| SortError::CleanupFailed {
                    path: folder.clone(),
                    source: e,
                })?
                .count();

            if count == 0 {
                fs::remove_dir(&folder).map_err(|e| SortError::CleanupFailed {
                    path: folder.clone(),
                    source: e,
                })?;
                log::debug!("Removed empty folder {}", folder.display());
                report.removed.push(category);
            } else {
                log::info!("{} contains {} file(s)", folder.display(), count);
                report.retained.push((category, count));
            }
        }
        Ok(report)
    }

    /// Computes where each source entry would go, without touching the filesystem.
    ///
    /// Entries with no matching category are only included when `use_misc` is set.
    pub fn plan(&self, use_misc: bool) -> SortResult<Vec<PlannedMove>> {
        self.ensure_source()?;

        let mut planned: Vec<PlannedMove> = self
            .source_files(true)?
            .into_iter()
            .filter_map(|(name, file)| {
                let category = self
                    .table
                    .classify(&name)
                    .or(use_misc.then_some(Category::Misc))?;
                Some(PlannedMove { file, category })
            })
            .collect();

        planned.sort_by_key(|m| Category::ALL.iter().position(|c| *c == m.category));
        Ok(planned)
    }

    /// Runs a complete sort: prepare, move, sweep, clean up.
    pub fn run(&self, use_misc: bool) -> SortResult<SortReport> {
        self.run_with_progress(use_misc, |_| {})
    }

    /// Like [`Sorter::run`], calling `on_stage` before each stage starts.
    pub fn run_with_progress(
        &self,
        use_misc: bool,
        mut on_stage: impl FnMut(Stage),
    ) -> SortResult<SortReport> {
        let started_at = Utc::now();
        let total_files = self.total_files()?;
        log::info!(
            "Sorting {} file(s) from {} into {}",
            total_files,
            self.source.display(),
            self.layout.root().display()
        );

        on_stage(Stage::Preparing);
        self.prepare_destinations()?;
        on_stage(Stage::Moving);
        let categories = self.classify_and_move()?;
        on_stage(Stage::Sweeping);
        let sweep = self.sweep_miscellaneous(use_misc)?;
        on_stage(Stage::CleaningUp);
        let cleanup = self.cleanup()?;
        let unmoved = self.unmoved_files()?;

        Ok(SortReport {
            started_at,
            source: self.source.clone(),
            destination: self.layout.root().to_path_buf(),
            total_files,
            categories,
            sweep,
            cleanup,
            unmoved,
        })
    }

    fn move_all(
        &self,
        category: Category,
        files: impl IntoIterator<Item = (String, PathBuf)>,
    ) -> CategoryOutcome {
        let folder = self.layout.folder(category);
        let mut outcome = CategoryOutcome::new(category);

        for (_, file) in files {
            match move_file(&file, &folder) {
                Ok(destination) => {
                    log::debug!("{} -> {}", file.display(), destination.display());
                    outcome.moved += 1;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    outcome.failure = Some(MoveFailure {
                        file,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }
        outcome
    }
}

/// Moves `file` into `folder`, keeping its name.
///
/// An existing file at the destination is never replaced. When a plain rename
/// fails (for example across filesystems) the file is copied and the original
/// removed.
pub fn move_file(file: &Path, folder: &Path) -> SortResult<PathBuf> {
    let move_failed = |destination: &Path, source: std::io::Error| SortError::MoveFailed {
        file: file.to_path_buf(),
        destination: destination.to_path_buf(),
        source,
    };

    let file_name = file.file_name().ok_or_else(|| {
        move_failed(
            folder,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file has no name component",
            ),
        )
    })?;
    let destination = folder.join(file_name);

    // a dangling link at the destination counts as taken
    if fs::symlink_metadata(&destination).is_ok() {
        return Err(move_failed(
            destination.as_path(),
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "destination already exists",
            ),
        ));
    }

    if let Err(rename_err) = fs::rename(file, &destination) {
        log::debug!(
            "Rename of {} failed ({}), copying instead",
            file.display(),
            rename_err
        );
        fs::copy(file, &destination).map_err(|e| move_failed(destination.as_path(), e))?;
        fs::remove_file(file).map_err(|e| move_failed(destination.as_path(), e))?;
    }

    Ok(destination)
}
