use std::io::Write;
use std::thread;

use mw_core::traits::{ReportEvent, ReportSink};
use mw_core::verdict::Label;

/// Écrit chaque événement comme une ligne sur stdout.
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn emit(&self, event: ReportEvent) {
        let mut out = std::io::stdout().lock();
        if writeln!(out, "{event}").is_err() {
            log::debug!("stdout fermé, événement perdu");
        }
    }
}

/// Route les événements vers la façade `log`.
///
/// Verdicts `Silent` / `ConstantNonSilent` et échecs en `warn`, le reste en `info`.
pub struct LogSink;

impl ReportSink for LogSink {
    fn emit(&self, event: ReportEvent) {
        match &event {
            ReportEvent::Classified(r)
                if matches!(r.label, Label::Silent | Label::ConstantNonSilent) =>
            {
                log::warn!("{event}");
            }
            ReportEvent::FileFailed { .. }
            | ReportEvent::FolderMissing { .. }
            | ReportEvent::FolderEmpty { .. }
            | ReportEvent::BudgetExhausted { .. } => log::warn!("{event}"),
            _ => log::info!("{event}"),
        }
    }
}

/// Diffuse un événement vers plusieurs sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: ReportSink, B: ReportSink> ReportSink for Tee<A, B> {
    fn emit(&self, event: ReportEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}

/// Lance un thread qui vide le canal dans `sink` jusqu'à fermeture de l'émetteur.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub fn spawn_forwarder<S>(
    rx: flume::Receiver<ReportEvent>,
    sink: S,
) -> std::io::Result<thread::JoinHandle<()>>
where
    S: ReportSink + 'static,
{
    thread::Builder::new()
        .name("mw-report".to_string())
        .spawn(move || {
            for event in rx.iter() {
                sink.emit(event);
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mw_core::traits::FnSink;
    use std::sync::{Arc, Mutex};

    #[test]
    fn forwarder_drains_until_sender_dropped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_sink = Arc::clone(&seen);
        let (tx, rx) = flume::unbounded();
        let handle = spawn_forwarder(
            rx,
            FnSink(move |e: ReportEvent| seen_sink.lock().unwrap().push(e)),
        )
        .unwrap();

        tx.emit(ReportEvent::BudgetExhausted { skipped: 1 });
        tx.emit(ReportEvent::BudgetExhausted { skipped: 2 });
        drop(tx);
        handle.join().unwrap();

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn tee_duplicates_events() {
        let (tx_a, rx_a) = flume::unbounded();
        let (tx_b, rx_b) = flume::unbounded();
        Tee(tx_a, tx_b).emit(ReportEvent::BudgetExhausted { skipped: 3 });
        assert_eq!(rx_a.len(), 1);
        assert_eq!(rx_b.len(), 1);
    }
}
