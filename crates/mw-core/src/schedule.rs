use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::FolderConfig;
use crate::error::CoreError;

/// Horaires quotidiens de déclenchement, triés et dédoublonnés.
///
/// Pure date arithmetic: the caller supplies `now`, nothing here reads the
/// system clock.
///
/// # Example
/// ```
/// use mw_core::schedule::DailySchedule;
/// use chrono::NaiveDate;
///
/// let schedule = DailySchedule::parse(&["18:00".into(), "07:00".into()]).unwrap();
/// let now = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let next = schedule.next_after(now);
/// assert_eq!(next.time().format("%H:%M").to_string(), "18:00");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailySchedule {
    slots: Vec<NaiveTime>,
}

impl DailySchedule {
    /// Parse `HH:MM` entries.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidTime` on a malformed entry and
    /// `CoreError::InvalidParameter` when no entry is given.
    pub fn parse(times: &[String]) -> Result<Self, CoreError> {
        let mut slots = times
            .iter()
            .map(|raw| {
                NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| CoreError::InvalidTime {
                    value: raw.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if slots.is_empty() {
            return Err(CoreError::InvalidParameter {
                name: "times",
                reason: "au moins un horaire requis".into(),
            });
        }

        slots.sort_unstable();
        slots.dedup();
        Ok(Self { slots })
    }

    /// Slots of the day, ascending.
    #[must_use]
    pub fn slots(&self) -> &[NaiveTime] {
        &self.slots
    }

    /// Premier créneau strictement postérieur à `now`.
    ///
    /// Passe au premier créneau du lendemain après le dernier de la journée.
    #[must_use]
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        if let Some(slot) = self.slots.iter().find(|s| **s > now.time()) {
            return today.and_time(*slot);
        }
        // `parse` guarantees at least one slot.
        let first = self.slots.first().copied().unwrap_or(NaiveTime::MIN);
        (today + Duration::days(1)).and_time(first)
    }
}

/// Nom du dossier journalier pour `date`, ex. `"Dia 19-10-26"`.
///
/// `name_format` doit avoir passé [`MonitorConfig::validate`](crate::config::MonitorConfig::validate).
///
/// # Example
/// ```
/// use mw_core::schedule::folder_name_for;
/// use chrono::NaiveDate;
/// let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
/// assert_eq!(folder_name_for(date, "Dia %d-%m-%y"), "Dia 19-10-26");
/// ```
#[must_use]
pub fn folder_name_for(date: NaiveDate, name_format: &str) -> String {
    date.format(name_format).to_string()
}

/// Chemin complet du dossier journalier sous `base_dir`.
#[must_use]
pub fn day_folder(folder: &FolderConfig, date: NaiveDate) -> PathBuf {
    folder
        .base_dir
        .join(folder_name_for(date, &folder.name_format))
}
