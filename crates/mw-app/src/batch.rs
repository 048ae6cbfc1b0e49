use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use mw_audio::AudioError;
use mw_audio::classifier::classify_file;
use mw_core::config::{AnalysisConfig, BatchConfig, MonitorConfig};
use mw_core::traits::{ReportEvent, ReportSink, RunSummary};
use mw_core::verdict::ClassificationResult;
use rayon::prelude::*;

use crate::folder::list_audio_files;

/// Issue de l'analyse d'un fichier.
#[derive(Debug)]
pub enum FileOutcome {
    Classified(ClassificationResult),
    Failed { file_name: String, reason: String },
    /// Non démarré : budget temps épuisé.
    Skipped,
}

/// Limites d'exécution d'un lot.
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchOptions {
    /// Aucun fichier n'est démarré après cette échéance.
    pub deadline: Option<Instant>,
    /// Threads d'analyse, 0 = pool rayon global.
    pub threads: usize,
}

impl BatchOptions {
    /// Options d'un lot démarrant maintenant.
    #[must_use]
    pub fn starting_now(config: &BatchConfig) -> Self {
        Self {
            deadline: config
                .budget_secs
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
            threads: config.threads,
        }
    }
}

/// Analyse un dossier complet et publie les résultats dans `sink`.
///
/// Un dossier absent ou vide est signalé via `FolderMissing` / `FolderEmpty`,
/// sans erreur, et le bilan le marque comme à surveiller.
///
/// # Errors
/// Retourne une erreur si le dossier ne peut être lu, si le pool de threads
/// ne peut être créé, ou sur un paramètre d'analyse invalide.
pub fn check_folder(
    folder: &Path,
    config: &MonitorConfig,
    sink: &dyn ReportSink,
) -> Result<RunSummary> {
    let nothing_to_check = RunSummary {
        no_recordings: true,
        ..RunSummary::default()
    };
    if !folder.is_dir() {
        sink.emit(ReportEvent::FolderMissing {
            folder: folder.to_path_buf(),
        });
        return Ok(nothing_to_check);
    }

    let files = list_audio_files(folder, &config.folder)?;
    if files.is_empty() {
        sink.emit(ReportEvent::FolderEmpty {
            folder: folder.to_path_buf(),
        });
        return Ok(nothing_to_check);
    }
    sink.emit(ReportEvent::RunStarted {
        folder: folder.to_path_buf(),
        file_count: files.len(),
    });

    let options = BatchOptions::starting_now(&config.batch);
    let outcomes = run_files(&files, &config.analysis, options, sink)?;
    let summary = report_outcomes(outcomes, sink);
    sink.emit(ReportEvent::RunFinished(summary));
    Ok(summary)
}

/// Analyse un seul fichier.
///
/// # Errors
/// Retourne une erreur sur un paramètre d'analyse invalide. Un fichier
/// non décodable est signalé via `FileFailed`.
pub fn check_file(path: &Path, config: &MonitorConfig, sink: &dyn ReportSink) -> Result<RunSummary> {
    let outcomes = run_files(
        &[path.to_path_buf()],
        &config.analysis,
        BatchOptions::default(),
        sink,
    )?;
    Ok(report_outcomes(outcomes, sink))
}

/// Classifie `files` en parallèle. L'ordre des résultats suit celui de `files`.
///
/// # Errors
/// Returns an error if the thread pool cannot be built or a non per-file
/// error (invalid parameter) occurs.
pub fn run_files(
    files: &[PathBuf],
    analysis: &AnalysisConfig,
    options: BatchOptions,
    sink: &dyn ReportSink,
) -> Result<Vec<FileOutcome>> {
    let work = || {
        files
            .par_iter()
            .map(|path| analyze_one(path, analysis, options.deadline, sink))
            .collect::<Result<Vec<_>, AudioError>>()
    };

    let outcomes = if options.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .thread_name(|i| format!("mw-worker-{i}"))
            .build()
            .context("Impossible de créer le pool d'analyse")?;
        pool.install(work)
    } else {
        work()
    };

    Ok(outcomes?)
}

fn analyze_one(
    path: &Path,
    analysis: &AnalysisConfig,
    deadline: Option<Instant>,
    sink: &dyn ReportSink,
) -> Result<FileOutcome, AudioError> {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Ok(FileOutcome::Skipped);
    }

    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    sink.emit(ReportEvent::FileStarted {
        file_name: file_name.clone(),
        max_duration_ms: analysis.max_duration_ms,
    });

    match classify_file(path, analysis) {
        Ok(result) => Ok(FileOutcome::Classified(result)),
        Err(e) if e.is_per_file() => {
            log::warn!("{}: {e}", path.display());
            Ok(FileOutcome::Failed {
                file_name,
                reason: e.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}

/// Publie les résultats dans l'ordre et calcule le bilan.
fn report_outcomes(outcomes: Vec<FileOutcome>, sink: &dyn ReportSink) -> RunSummary {
    let mut summary = RunSummary::default();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Classified(result) => {
                summary.record(result.label);
                sink.emit(ReportEvent::Classified(result));
            }
            FileOutcome::Failed { file_name, reason } => {
                summary.failed += 1;
                sink.emit(ReportEvent::FileFailed { file_name, reason });
            }
            FileOutcome::Skipped => summary.skipped += 1,
        }
    }
    if summary.skipped > 0 {
        sink.emit(ReportEvent::BudgetExhausted {
            skipped: summary.skipped,
        });
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use mw_core::verdict::Label;

    const RATE: u32 = 8000;

    fn write_wav(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn tone(seconds: usize, amplitude: i16) -> Vec<i16> {
        (0..seconds * RATE as usize)
            .map(|i| if (i / 16) % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    fn collect_sink() -> (flume::Sender<ReportEvent>, flume::Receiver<ReportEvent>) {
        flume::unbounded()
    }

    fn recording_day() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("a_dead.wav"), &vec![0; 3 * RATE as usize]);
        write_wav(&dir.path().join("b_live.wav"), &tone(3, 4000));
        std::fs::write(dir.path().join("c_broken.mp3"), b"not an mp3").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"ignored").unwrap();
        dir
    }

    #[test]
    fn folder_run_reports_in_file_order_and_survives_bad_files() {
        let dir = recording_day();
        let (tx, rx) = collect_sink();

        let summary = check_folder(dir.path(), &MonitorConfig::default(), &tx).unwrap();
        assert_eq!(summary.silent, 1);
        assert_eq!(summary.modulating, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.needs_attention());

        let events: Vec<ReportEvent> = rx.drain().collect();
        assert!(matches!(
            events.first(),
            Some(ReportEvent::RunStarted { file_count: 3, .. })
        ));
        let verdicts: Vec<String> = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    ReportEvent::Classified(_) | ReportEvent::FileFailed { .. }
                )
            })
            .map(ToString::to_string)
            .collect();
        assert_eq!(verdicts.len(), 3);
        assert_eq!(verdicts[0], "a_dead.wav: no sound detected");
        assert_eq!(verdicts[1], "b_live.wav: audio modulating correctly");
        assert!(verdicts[2].starts_with("c_broken.mp3: skipped"));
        assert!(matches!(events.last(), Some(ReportEvent::RunFinished(_))));
    }

    #[test]
    fn dedicated_pool_gives_same_results() {
        let dir = recording_day();
        let mut config = MonitorConfig::default();
        config.batch.threads = 2;
        let (tx, _rx) = collect_sink();
        let summary = check_folder(dir.path(), &config, &tx).unwrap();
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn missing_folder_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = collect_sink();
        let missing = dir.path().join("Dia 01-01-24");
        let summary = check_folder(&missing, &MonitorConfig::default(), &tx).unwrap();
        assert_eq!(summary.total(), 0);
        assert!(summary.needs_attention());
        let events: Vec<_> = rx.drain().collect();
        assert_eq!(events, vec![ReportEvent::FolderMissing { folder: missing }]);
    }

    #[test]
    fn folder_without_audio_needs_attention() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"ignored").unwrap();
        let (tx, rx) = collect_sink();
        let summary = check_folder(dir.path(), &MonitorConfig::default(), &tx).unwrap();
        assert!(summary.needs_attention());
        let events: Vec<_> = rx.drain().collect();
        assert_eq!(
            events,
            vec![ReportEvent::FolderEmpty {
                folder: dir.path().to_path_buf()
            }]
        );
    }

    #[test]
    fn empty_recording_needs_attention() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, &[]);
        let (tx, _rx) = collect_sink();
        let summary = check_file(&path, &MonitorConfig::default(), &tx).unwrap();
        assert_eq!(summary.no_data, 1);
        assert!(summary.needs_attention());
    }

    #[test]
    fn expired_budget_skips_everything() {
        let dir = recording_day();
        let files = list_audio_files(dir.path(), &MonitorConfig::default().folder).unwrap();
        let (tx, rx) = collect_sink();
        let options = BatchOptions {
            deadline: Some(Instant::now()),
            threads: 0,
        };
        let outcomes = run_files(&files, &AnalysisConfig::default(), options, &tx).unwrap();
        assert!(outcomes.iter().all(|o| matches!(o, FileOutcome::Skipped)));

        let summary = report_outcomes(outcomes, &tx);
        assert_eq!(summary.skipped, 3);
        assert!(summary.needs_attention());
        assert!(
            rx.drain()
                .any(|e| e == ReportEvent::BudgetExhausted { skipped: 3 })
        );
    }

    #[test]
    fn single_file_mode() {
        let dir = recording_day();
        let (tx, rx) = collect_sink();
        let summary = check_file(&dir.path().join("b_live.wav"), &MonitorConfig::default(), &tx)
            .unwrap();
        assert_eq!(summary.modulating, 1);
        let classified = rx.drain().find_map(|e| match e {
            ReportEvent::Classified(r) => Some(r),
            _ => None,
        });
        assert_eq!(classified.unwrap().label, Label::Modulating);
    }

    #[test]
    fn invalid_parameters_abort_the_run() {
        let dir = recording_day();
        let mut config = MonitorConfig::default();
        config.analysis.chunk_duration_ms = 0;
        let (tx, _rx) = collect_sink();
        assert!(check_folder(dir.path(), &config, &tx).is_err());
    }
}
