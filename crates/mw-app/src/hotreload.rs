use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use mw_core::config::MonitorConfig;
use notify::{Event, EventKind, RecursiveMode, Watcher};

/// Lance un watcher qui recharge le fichier config dans l'`ArcSwap`.
///
/// `apply` est rejoué sur chaque config rechargée (overrides CLI).
/// Une config invalide est ignorée : l'ancienne reste active.
///
/// Retourne le Watcher (doit rester vivant tant que le moniteur tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn spawn_config_watcher<F>(
    config_path: &Path,
    config: &Arc<ArcSwap<MonitorConfig>>,
    apply: F,
) -> Result<impl Watcher + use<F>>
where
    F: Fn(&mut MonitorConfig) -> Result<()> + Send + 'static,
{
    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                match reload(&path, &apply) {
                    Ok(new_config) => {
                        config.store(Arc::new(new_config));
                        log::info!("Config rechargée depuis {}", path.display());
                    }
                    Err(e) => {
                        log::warn!("Erreur de rechargement config : {e:#}");
                    }
                }
            }
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Relit, applique les overrides puis revalide.
fn reload<F>(path: &Path, apply: &F) -> Result<MonitorConfig>
where
    F: Fn(&mut MonitorConfig) -> Result<()>,
{
    let mut config = mw_core::config::load_config(path)?;
    apply(&mut config)?;
    config.validate()?;
    Ok(config)
}
