use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use clap::Parser;
use mw_core::config::{AnalysisConfig, MonitorConfig};
use mw_core::traits::RunSummary;

pub mod batch;
pub mod cli;
pub mod folder;
pub mod hotreload;
pub mod sink;
pub mod watch;

use cli::Mode;
use sink::{ConsoleSink, LogSink, Tee};

fn main() -> Result<ExitCode> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la cible
    let mode = cli.mode()?;

    // 4. Charger la config puis appliquer les overrides CLI
    let mut config = resolve_config(&cli.config)?;
    cli.apply_overrides(&mut config)?;
    config.validate().context("Configuration rejetée")?;

    let summary = match mode {
        Mode::File(path) => {
            if cli.levels {
                print_levels(&path, &config.analysis)?;
            }
            batch::check_file(&path, &config, &ConsoleSink)?
        }
        Mode::Folder(path) => batch::check_folder(&path, &config, &ConsoleSink)?,
        Mode::Today => {
            let path = folder::today_folder(&config.folder);
            batch::check_folder(&path, &config, &ConsoleSink)?
        }
        Mode::Watch => {
            run_watch(&cli, config)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    Ok(exit_code(&summary))
}

/// Mode surveillance : horaires quotidiens, hot-reload, arrêt sur Ctrl-C.
fn run_watch(cli: &cli::Cli, config: MonitorConfig) -> Result<()> {
    let config = Arc::new(ArcSwap::from_pointee(config));

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || stop_handler.store(true, Ordering::Relaxed))
        .context("Impossible d'installer le handler Ctrl-C")?;

    // Le watcher doit rester vivant pendant toute la boucle.
    let _watcher = if cli.config.exists() {
        let overrides = cli.clone();
        Some(hotreload::spawn_config_watcher(
            &cli.config,
            &config,
            move |c| overrides.apply_overrides(c),
        )?)
    } else {
        None
    };

    let (tx, rx) = flume::unbounded();
    let printer = sink::spawn_forwarder(rx, Tee(ConsoleSink, LogSink))?;

    let result = watch::run_watch(&config, &tx, &stop);

    drop(tx);
    if printer.join().is_err() {
        log::error!("Le thread de rapport a paniqué");
    }
    result
}

/// Affiche le niveau de chaque chunk d'un fichier.
fn print_levels(path: &Path, analysis: &AnalysisConfig) -> Result<()> {
    let signal = mw_audio::decode::decode_file_limited(path, Some(analysis.max_duration_ms))?;
    for level in mw_audio::chunk_levels(&signal, analysis)? {
        println!(
            "#{:<4} {:>8.1} ms {:>8.2} dBFS {}",
            level.index,
            level.duration_ms,
            level.dbfs,
            if level.silent { "silence" } else { "signal" }
        );
    }
    Ok(())
}

/// Resolve config: --config if present, defaults otherwise.
fn resolve_config(path: &Path) -> Result<MonitorConfig> {
    if path.exists() {
        mw_core::config::load_config(path)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            path.display()
        );
        Ok(MonitorConfig::default())
    }
}

/// 0 si tout module, 1 si un enregistreur semble muet, figé ou illisible.
fn exit_code(summary: &RunSummary) -> ExitCode {
    if summary.needs_attention() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
