//! Per-run organizing session
//!
//! The host dispatches two relocation-event callbacks (`on_item_copied`,
//! `on_item_moved`) while it processes media files, then fires a single
//! session-end signal. Discovered extra files accumulate as pending tasks
//! in between; nothing touches the filesystem until the flush.

use crate::{
    config::ExtrasConfig,
    executor::BatchExecutor,
    resolver::DestinationResolver,
    scanner::ExtraFileScanner,
    template::FunctionTable,
    types::{ExtraFileTask, MediaItem, RelocationMetadata, SessionSummary, TransferAction},
    Result,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pending copy and move tasks, deduplicated by value equality.
///
/// Two tracks of one album can discover the same extra file twice; the set
/// semantics collapse the repeats.
#[derive(Debug, Default)]
pub struct TaskAccumulator {
    pending_copies: HashSet<ExtraFileTask>,
    pending_moves: HashSet<ExtraFileTask>,
}

impl TaskAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_copy(&mut self, task: ExtraFileTask) {
        self.pending_copies.insert(task);
    }

    pub fn record_move(&mut self, task: ExtraFileTask) {
        self.pending_moves.insert(task);
    }

    /// Drain the pending copy set, leaving it empty
    pub fn take_copies(&mut self) -> HashSet<ExtraFileTask> {
        std::mem::take(&mut self.pending_copies)
    }

    /// Drain the pending move set, leaving it empty
    pub fn take_moves(&mut self) -> HashSet<ExtraFileTask> {
        std::mem::take(&mut self.pending_moves)
    }

    pub fn copies(&self) -> &HashSet<ExtraFileTask> {
        &self.pending_copies
    }

    pub fn moves(&self) -> &HashSet<ExtraFileTask> {
        &self.pending_moves
    }

    pub fn is_empty(&self) -> bool {
        self.pending_copies.is_empty() && self.pending_moves.is_empty()
    }
}

/// One organizing session over the host's processing run.
///
/// Owns all mutable session state (scanned directories, pending task sets);
/// construct one per run and discard it afterwards. Single-threaded by
/// design: callers firing events from multiple workers must serialize
/// access, and the flush must not run concurrently with accumulation.
pub struct ExtrasOrganizer {
    scanner: ExtraFileScanner,
    resolver: DestinationResolver,
    executor: BatchExecutor,
    accumulator: TaskAccumulator,
    scanned_dirs: HashSet<PathBuf>,
}

impl ExtrasOrganizer {
    /// Build a session from parsed configuration.
    ///
    /// Malformed glob patterns and template syntax errors surface here,
    /// before any event is processed.
    pub fn new(config: &ExtrasConfig) -> Result<Self> {
        Ok(Self {
            scanner: ExtraFileScanner::new(&config.patterns)?,
            resolver: DestinationResolver::new(&config.paths, FunctionTable::new())?,
            executor: BatchExecutor::new(),
            accumulator: TaskAccumulator::new(),
            scanned_dirs: HashSet::new(),
        })
    }

    /// Inject the host's template function table
    pub fn with_functions(mut self, functions: FunctionTable) -> Self {
        self.resolver = self.resolver.with_functions(functions);
        self
    }

    /// Replace the recognized media extension set (the host's oracle)
    pub fn with_media_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scanner = self.scanner.with_media_extensions(extensions);
        self
    }

    /// Set whether plain-file copies are hash-verified at flush time
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.executor = self.executor.with_verification(verify);
        self
    }

    /// Relocation event: a media file was copied from `source` to
    /// `destination`; extras found next to `source` queue as copies.
    pub fn on_item_copied(&mut self, item: &dyn MediaItem, source: &Path, destination: &Path) {
        self.gather(item, source, destination, TransferAction::Copy);
    }

    /// Relocation event: a media file was moved from `source` to
    /// `destination`; extras found next to `source` queue as moves.
    pub fn on_item_moved(&mut self, item: &dyn MediaItem, source: &Path, destination: &Path) {
        self.gather(item, source, destination, TransferAction::Move);
    }

    /// Pending state, mainly useful for inspection before a flush
    pub fn pending(&self) -> &TaskAccumulator {
        &self.accumulator
    }

    /// Flush trigger: run all pending copies, then all pending moves.
    ///
    /// A second call finds both sets drained and does no filesystem work.
    pub fn on_session_end(&mut self) -> SessionSummary {
        let copies = self.accumulator.take_copies();
        let moves = self.accumulator.take_moves();

        let summary = SessionSummary {
            copies: self.executor.execute(&copies, TransferAction::Copy),
            moves: self.executor.execute(&moves, TransferAction::Move),
        };

        info!("{}", summary.summary_text());
        summary
    }

    fn gather(&mut self, item: &dyn MediaItem, source: &Path, destination: &Path, action: TransferAction) {
        let meta = RelocationMetadata::from_item(item, destination);

        for (path, category) in self
            .scanner
            .find_extra_files(source, &mut self.scanned_dirs)
        {
            match self.resolver.resolve(&path, &category, &meta) {
                Ok(dest) => {
                    debug!("Queueing extra file [{}]: {:?} -> {:?}", category, path, dest);
                    let task = ExtraFileTask::new(path, dest);
                    match action {
                        TransferAction::Copy => self.accumulator.record_copy(task),
                        TransferAction::Move => self.accumulator.record_move(task),
                    }
                }
                // A single unresolvable file never aborts the event
                Err(err) => warn!("Failed to resolve destination for {:?}: {}", path, err),
            }
        }
    }
}
