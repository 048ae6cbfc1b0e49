use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use arc_swap::ArcSwap;
use chrono::NaiveDateTime;
use mw_core::config::MonitorConfig;
use mw_core::schedule::DailySchedule;
use mw_core::traits::ReportSink;

use crate::batch;
use crate::folder::today_folder;

/// Pas de sommeil maximal : borne la latence de réaction au Ctrl-C.
const SLEEP_SLICE: Duration = Duration::from_millis(500);

/// Boucle de surveillance : analyse le dossier du jour à chaque horaire.
///
/// La config est relue depuis `config` à chaque déclenchement, ce qui prend
/// en compte le hot-reload. Retourne quand `stop` passe à `true`.
///
/// # Errors
/// Returns an error only if the current schedule cannot be parsed.
pub fn run_watch(
    config: &Arc<ArcSwap<MonitorConfig>>,
    sink: &dyn ReportSink,
    stop: &AtomicBool,
) -> Result<()> {
    let now = || chrono::Local::now().naive_local();

    loop {
        let schedule = DailySchedule::parse(&config.load().schedule.times)?;
        let next = schedule.next_after(now());
        log::info!("Prochaine vérification : {}", next.format("%d/%m/%Y %H:%M"));

        if !sleep_until(next, stop, now) {
            log::info!("Arrêt de la surveillance");
            return Ok(());
        }

        let current = config.load_full();
        let folder = today_folder(&current.folder);
        log::info!("Déclenchement planifié sur {}", folder.display());
        if let Err(e) = batch::check_folder(&folder, &current, sink) {
            log::error!("Échec de l'analyse de {} : {e:#}", folder.display());
        }
    }
}

/// Dort jusqu'à `target` par tranches courtes.
///
/// Retourne `false` si `stop` est levé avant l'échéance.
fn sleep_until<C>(target: NaiveDateTime, stop: &AtomicBool, now: C) -> bool
where
    C: Fn() -> NaiveDateTime,
{
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let current = now();
        if current >= target {
            return true;
        }
        let remaining = (target - current).to_std().unwrap_or(Duration::ZERO);
        thread::sleep(remaining.min(SLEEP_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn past_target_fires_immediately() {
        let stop = AtomicBool::new(false);
        assert!(sleep_until(at(7, 0, 0), &stop, || at(7, 0, 1)));
    }

    #[test]
    fn stop_flag_wins() {
        let stop = AtomicBool::new(true);
        assert!(!sleep_until(at(7, 0, 0), &stop, || at(6, 0, 0)));
    }

    #[test]
    fn waits_until_clock_reaches_target() {
        let stop = AtomicBool::new(false);
        // Horloge simulée : avance d'une seconde à chaque lecture.
        let tick = Cell::new(0u32);
        let clock = || {
            let t = tick.get();
            tick.set(t + 1);
            at(6, 59, 58) + chrono::Duration::seconds(i64::from(t))
        };
        assert!(sleep_until(at(7, 0, 0), &stop, clock));
        assert_eq!(tick.get(), 3);
    }
}
