use std::fmt;
use std::path::PathBuf;

use crate::verdict::{ClassificationResult, Label};

/// Compteurs d'une exécution batch.
///
/// # Example
/// ```
/// use mw_core::traits::RunSummary;
/// use mw_core::verdict::Label;
/// let mut summary = RunSummary::default();
/// summary.record(Label::Silent);
/// summary.failed += 1;
/// assert_eq!(summary.total(), 2);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub silent: usize,
    pub modulating: usize,
    pub constant: usize,
    pub no_data: usize,
    /// Fichiers non décodables.
    pub failed: usize,
    /// Fichiers non démarrés faute de budget.
    pub skipped: usize,
    /// Dossier journalier absent ou sans fichier reconnu.
    pub no_recordings: bool,
}

impl RunSummary {
    /// Count one verdict.
    pub fn record(&mut self, label: Label) {
        match label {
            Label::Silent => self.silent += 1,
            Label::Modulating => self.modulating += 1,
            Label::ConstantNonSilent => self.constant += 1,
            Label::NoData => self.no_data += 1,
        }
    }

    /// All files seen, whatever their outcome.
    #[must_use]
    pub fn total(&self) -> usize {
        self.silent + self.modulating + self.constant + self.no_data + self.failed + self.skipped
    }

    /// `true` unless every recording was analyzed and modulates.
    #[must_use]
    pub fn needs_attention(&self) -> bool {
        self.no_recordings
            || self.silent > 0
            || self.constant > 0
            || self.no_data > 0
            || self.failed > 0
            || self.skipped > 0
    }
}

/// Événement émis par l'appelant batch vers un sink de rapport.
#[derive(Clone, Debug, PartialEq)]
pub enum ReportEvent {
    /// Début d'analyse d'un dossier.
    RunStarted { folder: PathBuf, file_count: usize },
    /// Début d'analyse d'un fichier.
    FileStarted { file_name: String, max_duration_ms: u64 },
    /// Verdict d'un fichier.
    Classified(ClassificationResult),
    /// Fichier ignoré (décodage impossible).
    FileFailed { file_name: String, reason: String },
    /// Dossier journalier absent.
    FolderMissing { folder: PathBuf },
    /// Dossier journalier présent mais sans fichier audio reconnu.
    FolderEmpty { folder: PathBuf },
    /// Budget temps épuisé, `skipped` fichiers non traités.
    BudgetExhausted { skipped: usize },
    /// Fin d'exécution.
    RunFinished(RunSummary),
}

impl fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted { folder, file_count } => write!(
                f,
                "Starting analysis in {} ({file_count} files)",
                folder.display()
            ),
            Self::FileStarted {
                file_name,
                max_duration_ms,
            } => write!(
                f,
                "Analyzing {file_name} up to {} seconds...",
                *max_duration_ms as f64 / 1000.0
            ),
            Self::Classified(result) => write!(f, "{result}"),
            Self::FileFailed { file_name, reason } => {
                write!(f, "{file_name}: skipped, cannot decode ({reason})")
            }
            Self::FolderMissing { folder } => {
                write!(f, "Folder {} not found.", folder.display())
            }
            Self::FolderEmpty { folder } => {
                write!(f, "Folder {} has no audio files.", folder.display())
            }
            Self::BudgetExhausted { skipped } => {
                write!(f, "Time budget exhausted, {skipped} files not analyzed")
            }
            Self::RunFinished(s) => write!(
                f,
                "Done: {} modulating, {} silent, {} constant, {} empty, {} failed, {} skipped",
                s.modulating, s.silent, s.constant, s.no_data, s.failed, s.skipped
            ),
        }
    }
}

/// Reçoit les lignes de statut et les verdicts d'une exécution.
///
/// Injecté dans l'appelant batch; le classifieur lui-même n'en dépend pas.
/// Doit être `Sync` : les fichiers sont analysés en parallèle.
///
/// # Example
/// ```
/// use mw_core::traits::{ReportEvent, ReportSink};
/// use std::path::PathBuf;
///
/// let (tx, rx) = flume::unbounded();
/// tx.emit(ReportEvent::FolderMissing { folder: PathBuf::from("Dia 01-01-24") });
/// assert!(matches!(rx.try_recv(), Ok(ReportEvent::FolderMissing { .. })));
/// ```
pub trait ReportSink: Send + Sync {
    /// Publie un événement. Ne doit pas paniquer si le consommateur a disparu.
    fn emit(&self, event: ReportEvent);
}

impl ReportSink for flume::Sender<ReportEvent> {
    fn emit(&self, event: ReportEvent) {
        if self.send(event).is_err() {
            log::debug!("Report receiver dropped, event discarded");
        }
    }
}

/// Adapte une closure en sink.
///
/// # Example
/// ```
/// use mw_core::traits::{FnSink, ReportEvent, ReportSink};
/// let sink = FnSink(|e: ReportEvent| println!("{e}"));
/// sink.emit(ReportEvent::BudgetExhausted { skipped: 0 });
/// ```
pub struct FnSink<F>(pub F);

impl<F> ReportSink for FnSink<F>
where
    F: Fn(ReportEvent) + Send + Sync,
{
    fn emit(&self, event: ReportEvent) {
        (self.0)(event);
    }
}
