//! Batch execution of accumulated transfer tasks
//!
//! Each task is validated and performed independently: a missing source or
//! an occupied destination skips the task with a warning, and a failure
//! mid-operation is logged without aborting the rest of the batch.
//! Destinations are never overwritten.

use crate::{
    transfer,
    types::{ExtraFileTask, TransferAction, TransferStats},
    Result,
};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Executor for one batch of copy or move tasks
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    verify_copy: bool,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self { verify_copy: true }
    }
}

impl BatchExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether plain-file copies are hash-verified
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_copy = verify;
        self
    }

    /// Run every task in the set with the given action.
    ///
    /// Iteration order over the set is unspecified and nothing here may
    /// depend on it. The returned stats account for every task exactly once.
    pub fn execute(&self, tasks: &HashSet<ExtraFileTask>, action: TransferAction) -> TransferStats {
        let mut stats = TransferStats::default();

        for task in tasks {
            if !task.source.exists() {
                warn!(
                    "Skipping missing extra file: {:?} -> {:?}",
                    task.source, task.destination
                );
                stats.skipped_missing += 1;
                continue;
            }

            if task.destination.exists() {
                warn!(
                    "Skipping extra file, destination exists: {:?} -> {:?}",
                    task.source, task.destination
                );
                stats.skipped_conflict += 1;
                continue;
            }

            match self.run_task(task, action) {
                Ok(destination) => {
                    info!(
                        "{} extra file: {:?} -> {:?}",
                        match action {
                            TransferAction::Copy => "Copied",
                            TransferAction::Move => "Moved",
                        },
                        task.source,
                        destination
                    );
                    stats.transferred += 1;
                }
                Err(err) => {
                    error!(
                        "Failed to transfer extra file {:?} -> {:?}: {}",
                        task.source, task.destination, err
                    );
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    fn run_task(&self, task: &ExtraFileTask, action: TransferAction) -> Result<PathBuf> {
        // The exists-check above already passed; the unique variant only
        // differs if something landed at the destination since then
        let destination = transfer::unique_path(&task.destination)?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        match action {
            TransferAction::Copy => {
                if task.source.is_dir() {
                    transfer::copy_tree(&task.source, &destination)?;
                } else {
                    transfer::copy_file_verified(&task.source, &destination, self.verify_copy)?;
                }
            }
            TransferAction::Move => {
                transfer::move_path(&task.source, &destination)?;
            }
        }

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn task_set(tasks: impl IntoIterator<Item = ExtraFileTask>) -> HashSet<ExtraFileTask> {
        tasks.into_iter().collect()
    }

    #[test]
    fn test_copy_preserves_source() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("rip.log");
        fs::write(&source, b"log data").unwrap();
        let dest = temp.path().join("album/audio.log");

        let tasks = task_set([ExtraFileTask::new(&source, &dest)]);
        let stats = BatchExecutor::new().execute(&tasks, TransferAction::Copy);

        assert_eq!(stats.transferred, 1);
        assert!(source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"log data");
    }

    #[test]
    fn test_move_removes_source() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("rip.log");
        fs::write(&source, b"log data").unwrap();
        let dest = temp.path().join("album/audio.log");

        let tasks = task_set([ExtraFileTask::new(&source, &dest)]);
        let stats = BatchExecutor::new().execute(&tasks, TransferAction::Move);

        assert_eq!(stats.transferred, 1);
        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"log data");
    }

    #[test]
    fn test_move_directory_recursively() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("scans");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("front.jpg"), b"front").unwrap();
        let dest = temp.path().join("album/artwork");

        let tasks = task_set([ExtraFileTask::new(&source, &dest)]);
        let stats = BatchExecutor::new().execute(&tasks, TransferAction::Move);

        assert_eq!(stats.transferred, 1);
        assert!(!source.exists());
        assert_eq!(fs::read(dest.join("front.jpg")).unwrap(), b"front");
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let temp = TempDir::new().unwrap();
        let tasks = task_set([ExtraFileTask::new(
            temp.path().join("vanished.log"),
            temp.path().join("audio.log"),
        )]);

        let stats = BatchExecutor::new().execute(&tasks, TransferAction::Move);

        assert_eq!(stats.skipped_missing, 1);
        assert_eq!(stats.transferred, 0);
        assert!(!temp.path().join("audio.log").exists());
    }

    #[test]
    fn test_existing_destination_is_never_overwritten() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("rip.log");
        fs::write(&source, b"new").unwrap();
        let dest = temp.path().join("audio.log");
        fs::write(&dest, b"old").unwrap();

        let tasks = task_set([ExtraFileTask::new(&source, &dest)]);
        let stats = BatchExecutor::new().execute(&tasks, TransferAction::Move);

        assert_eq!(stats.skipped_conflict, 1);
        assert_eq!(fs::read(&source).unwrap(), b"new");
        assert_eq!(fs::read(&dest).unwrap(), b"old");
    }

    #[test]
    fn test_intra_batch_collision_skips_second_task() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("a/rip.log");
        let second = temp.path().join("b/rip.log");
        fs::create_dir_all(first.parent().unwrap()).unwrap();
        fs::create_dir_all(second.parent().unwrap()).unwrap();
        fs::write(&first, b"a").unwrap();
        fs::write(&second, b"b").unwrap();

        let dest = temp.path().join("album/audio.log");
        let tasks = task_set([
            ExtraFileTask::new(&first, &dest),
            ExtraFileTask::new(&second, &dest),
        ]);

        let stats = BatchExecutor::new().execute(&tasks, TransferAction::Copy);

        // Whichever task runs first wins the destination; the other is a
        // conflict, not a silent rename
        assert_eq!(stats.transferred, 1);
        assert_eq!(stats.skipped_conflict, 1);
        assert!(dest.exists());
    }

    #[test]
    fn test_one_failure_does_not_abort_the_batch() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.log");
        let bad = temp.path().join("bad.log");
        fs::write(&good, b"good").unwrap();
        fs::write(&bad, b"bad").unwrap();

        // A plain file where the destination needs a directory makes
        // create_dir_all fail for the bad task only
        fs::write(temp.path().join("blocker"), b"").unwrap();

        let good_dest = temp.path().join("album/good.log");
        let bad_dest = temp.path().join("blocker/nested/bad.log");
        let tasks = task_set([
            ExtraFileTask::new(&good, &good_dest),
            ExtraFileTask::new(&bad, &bad_dest),
        ]);

        let stats = BatchExecutor::new().execute(&tasks, TransferAction::Copy);

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.transferred, 1);
        assert!(good_dest.exists());
    }
}
