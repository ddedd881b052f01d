use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::{ImportError, ImportReport};
use crate::archive::{ArchiveEntry, ArchiveValidator, EntryFilter, StreamExtractor, UploadedArchive};
use crate::image::{inspect_blocking, ImageAcceptor, ImageInfo, ImageVerdict};
use crate::staged::StagedFile;

/// Where a batch currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Validating,
    Enumerating,
    Extracting,
    Accepting,
    Promoting,
    Discarding,
    Finalizing,
    Done,
    Failed,
}

impl ImportState {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: ImportState) -> bool {
        use ImportState::*;
        match (self, next) {
            (Validating, Enumerating) => true,
            (Enumerating, Extracting | Finalizing) => true,
            (Extracting, Accepting) => true,
            (Accepting, Promoting | Discarding) => true,
            (Promoting | Discarding, Extracting | Finalizing) => true,
            (Finalizing, Done) => true,
            (Done | Failed, _) => false,
            (_, Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ImportState::Done | ImportState::Failed)
    }
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Consumer of accepted entries.
///
/// `on_accepted` takes ownership of the temporary file and must either move
/// it into permanent storage or let it drop. `finish` runs once after the last
/// entry, even when nothing was accepted.
#[async_trait]
pub trait EntryProcessor: Send {
    type Output: Send;

    async fn on_accepted(
        &mut self,
        file: StagedFile,
        info: ImageInfo,
        entry: &ArchiveEntry,
        position: usize,
        count: usize,
    ) -> Result<(), ImportError>;

    async fn finish(self) -> Result<Self::Output, ImportError>;
}

/// Runs one archive through validation, filtering, extraction and acceptance.
///
/// Entries are handled strictly one after another. The uploaded archive is
/// removed on every path.
#[derive(Clone)]
pub struct ImportCoordinator {
    filter: Arc<dyn EntryFilter>,
    acceptor: Arc<dyn ImageAcceptor>,
    extractor: StreamExtractor,
}

impl ImportCoordinator {
    pub fn new(
        filter: Arc<dyn EntryFilter>,
        acceptor: Arc<dyn ImageAcceptor>,
        extractor: StreamExtractor,
    ) -> Self {
        Self {
            filter,
            acceptor,
            extractor,
        }
    }

    pub fn extractor(&self) -> &StreamExtractor {
        &self.extractor
    }

    /// Import `archive`, handing every accepted entry to `processor`
    #[tracing::instrument(skip_all, fields(archive = %archive.path().display(), size_bytes = archive.size()))]
    pub async fn run<P: EntryProcessor>(
        &self,
        archive: UploadedArchive,
        processor: P,
    ) -> Result<ImportReport<P::Output>, ImportError> {
        let started = Instant::now();
        let mut state = ImportState::Validating;

        let result = self
            .run_batch(archive.path().to_path_buf(), processor, &mut state)
            .await;
        let removed = archive.remove();

        match (result, removed) {
            (Ok(report), Ok(())) => {
                advance(&mut state, ImportState::Done);
                tracing::info!(
                    total_entries = report.total_entries,
                    selected = report.selected,
                    accepted = report.accepted,
                    rejected = report.rejected,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Archive import completed"
                );
                Ok(report)
            }
            (Ok(_), Err(e)) => {
                advance(&mut state, ImportState::Failed);
                tracing::error!(error = %e, "Failed to remove uploaded archive");
                Err(ImportError::Io(e))
            }
            (Err(e), removed) => {
                let failed_in = state;
                advance(&mut state, ImportState::Failed);
                if let Err(rm) = removed {
                    tracing::error!(error = %rm, "Failed to remove uploaded archive");
                }
                if e.is_user_error() {
                    tracing::warn!(error = %e, state = %failed_in, "Archive rejected");
                } else {
                    tracing::error!(error = %e, state = %failed_in, "Archive import failed");
                }
                Err(e)
            }
        }
    }

    async fn run_batch<P: EntryProcessor>(
        &self,
        archive_path: PathBuf,
        mut processor: P,
        state: &mut ImportState,
    ) -> Result<ImportReport<P::Output>, ImportError> {
        let mut archive =
            tokio::task::spawn_blocking(move || ArchiveValidator::validate(&archive_path))
                .await??;

        advance(state, ImportState::Enumerating);
        let total_entries = archive.len();
        let worklist: Vec<ArchiveEntry> = archive
            .entries()
            .iter()
            .filter(|entry| {
                let keep = self.filter.should_extract(&entry.name, entry.attributes);
                if !keep {
                    tracing::debug!(entry = %entry.name, "Archive entry skipped by filter");
                }
                keep
            })
            .cloned()
            .collect();
        let count = worklist.len();

        tracing::info!(total_entries, selected = count, "Archive validated");

        let mut accepted = 0;
        let mut rejected = 0;

        for (position, entry) in worklist.iter().enumerate() {
            advance(state, ImportState::Extracting);
            let extractor = self.extractor.clone();
            let job_entry = entry.clone();
            let (returned, extracted) = tokio::task::spawn_blocking(move || {
                let extracted = extractor.extract(&mut archive, &job_entry);
                (archive, extracted)
            })
            .await?;
            archive = returned;
            let file = extracted?;

            advance(state, ImportState::Accepting);
            let verdict = inspect_blocking(self.acceptor.clone(), file.path().to_path_buf()).await?;

            match verdict {
                ImageVerdict::Valid(info) => {
                    advance(state, ImportState::Promoting);
                    tracing::debug!(
                        entry = %entry.name,
                        position,
                        count,
                        format = ?info.format,
                        "Archive entry accepted"
                    );
                    processor
                        .on_accepted(file, info, entry, position, count)
                        .await?;
                    accepted += 1;
                }
                ImageVerdict::Invalid(reason) => {
                    advance(state, ImportState::Discarding);
                    tracing::warn!(entry = %entry.name, position, count, reason = %reason, "Archive entry is not a valid image");
                    file.discard()?;
                    rejected += 1;
                }
            }
        }

        advance(state, ImportState::Finalizing);
        let output = processor.finish().await?;

        Ok(ImportReport {
            total_entries,
            selected: count,
            accepted,
            rejected,
            output,
        })
    }
}

fn advance(state: &mut ImportState, next: ImportState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid import transition {} -> {}",
        state,
        next
    );
    tracing::trace!(from = %state, to = %next, "Import state");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use ImportState::*;

        assert!(Validating.can_transition_to(Enumerating));
        assert!(Validating.can_transition_to(Failed));
        assert!(Enumerating.can_transition_to(Finalizing));
        assert!(Accepting.can_transition_to(Discarding));
        assert!(Discarding.can_transition_to(Extracting));
        assert!(Finalizing.can_transition_to(Done));

        assert!(!Validating.can_transition_to(Extracting));
        assert!(!Accepting.can_transition_to(Finalizing));
        assert!(!Done.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Validating));
        assert!(Done.is_terminal() && Failed.is_terminal());
    }
}
