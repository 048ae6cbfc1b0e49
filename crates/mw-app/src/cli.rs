use std::path::PathBuf;

use clap::Parser;
use mw_core::config::{AggregationPolicy, MonitorConfig};

/// modwatch — vérifie que les enregistreurs captent bien du signal.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Analyser un seul fichier audio.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Analyser tous les fichiers audio d'un dossier.
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Analyser le dossier du jour (ex. "Dia 19-10-26") sous --base-dir.
    #[arg(long, default_value_t = false)]
    pub today: bool,

    /// Rester actif et analyser le dossier du jour aux horaires configurés.
    #[arg(long, default_value_t = false)]
    pub watch: bool,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Dossier contenant les dossiers journaliers.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Durée d'un chunk en millisecondes.
    #[arg(long)]
    pub chunk_ms: Option<u32>,

    /// Seuil de silence en dBFS (ex. -50).
    #[arg(long, allow_negative_numbers = true)]
    pub threshold_db: Option<f32>,

    /// Durée maximale analysée par fichier, en millisecondes.
    #[arg(long)]
    pub max_ms: Option<u64>,

    /// Règle d'agrégation : "any" (défaut) ou "variance".
    #[arg(long)]
    pub policy: Option<String>,

    /// Écart-type minimal des niveaux (dB) pour la règle "variance".
    #[arg(long)]
    pub min_spread_db: Option<f32>,

    /// Nombre de threads d'analyse (0 = automatique).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Budget temps d'une exécution, en secondes.
    #[arg(long)]
    pub budget_secs: Option<u64>,

    /// Afficher le niveau de chaque chunk (avec --file).
    #[arg(long, default_value_t = false)]
    pub levels: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    File(PathBuf),
    Folder(PathBuf),
    Today,
    Watch,
}

impl Cli {
    /// Validate that exactly one mode is provided and return it.
    ///
    /// # Errors
    /// Returns an error if zero or more than one mode is specified.
    pub fn mode(&self) -> anyhow::Result<Mode> {
        let count = usize::from(self.file.is_some())
            + usize::from(self.folder.is_some())
            + usize::from(self.today)
            + usize::from(self.watch);

        if count == 0 {
            anyhow::bail!("Aucune cible spécifiée. Utilisez --file, --folder, --today, ou --watch.");
        }
        if count > 1 {
            anyhow::bail!(
                "Une seule cible à la fois. Spécifiez --file, --folder, --today, OU --watch."
            );
        }

        Ok(if let Some(ref path) = self.file {
            Mode::File(path.clone())
        } else if let Some(ref path) = self.folder {
            Mode::Folder(path.clone())
        } else if self.today {
            Mode::Today
        } else {
            Mode::Watch
        })
    }

    /// Apply command-line overrides on top of the loaded configuration.
    ///
    /// # Errors
    /// Returns an error on an unknown policy name.
    pub fn apply_overrides(&self, config: &mut MonitorConfig) -> anyhow::Result<()> {
        if let Some(ref dir) = self.base_dir {
            config.folder.base_dir.clone_from(dir);
        }
        if let Some(v) = self.chunk_ms {
            config.analysis.chunk_duration_ms = v;
        }
        if let Some(v) = self.threshold_db {
            config.analysis.silence_threshold_db = v;
        }
        if let Some(v) = self.max_ms {
            config.analysis.max_duration_ms = v;
        }
        if let Some(ref policy) = self.policy {
            config.analysis.policy = match policy.as_str() {
                "any" => AggregationPolicy::AnyLoudChunk,
                "variance" => AggregationPolicy::LevelVariance,
                other => anyhow::bail!("Règle inconnue '{other}' (attendu : any, variance)"),
            };
        }
        if let Some(v) = self.min_spread_db {
            config.analysis.min_spread_db = v;
        }
        if let Some(v) = self.threads {
            config.batch.threads = v;
        }
        if self.budget_secs.is_some() {
            config.batch.budget_secs = self.budget_secs;
        }
        Ok(())
    }
}
