use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mw_core::config::FolderConfig;
use mw_core::schedule::day_folder;

/// Liste les fichiers audio reconnus d'un dossier, triés par chemin.
///
/// # Errors
/// Retourne une erreur si le dossier ne peut être lu.
pub fn list_audio_files(dir: &Path, folder: &FolderConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    scan_dir(dir, folder, &mut files)?;
    files.sort();
    Ok(files)
}

/// Extrait les fichiers reconnus, récursivement si configuré.
///
/// Les liens symboliques vers des dossiers ne sont pas suivis.
fn scan_dir(dir: &Path, folder: &FolderConfig, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Impossible de lire {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            if folder.recursive {
                scan_dir(&path, folder, files)?;
            }
        } else if file_type.is_symlink() && path.is_dir() {
            log::debug!("Lien vers un dossier ignoré : {}", path.display());
        } else if folder.accepts(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Dossier journalier d'aujourd'hui (heure locale).
#[must_use]
pub fn today_folder(folder: &FolderConfig) -> PathBuf {
    day_folder(folder, chrono::Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn lists_only_accepted_extensions_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.wav"));
        touch(&dir.path().join("a.MP3"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("c.ogg"));

        let files = list_audio_files(dir.path(), &FolderConfig::default()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.MP3", "b.wav", "c.ogg"]);
    }

    #[test]
    fn recursion_is_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub").join("x.wav"));
        touch(&dir.path().join("y.wav"));

        let flat = list_audio_files(dir.path(), &FolderConfig::default()).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = FolderConfig {
            recursive: true,
            ..FolderConfig::default()
        };
        assert_eq!(list_audio_files(dir.path(), &deep).unwrap().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_dirs_are_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&sub.join("x.wav"));
        std::os::unix::fs::symlink(dir.path(), sub.join("loop")).unwrap();

        let deep = FolderConfig {
            recursive: true,
            ..FolderConfig::default()
        };
        let files = list_audio_files(dir.path(), &deep).unwrap();
        assert_eq!(files, vec![sub.join("x.wav")]);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_audio_files(&dir.path().join("nope"), &FolderConfig::default()).is_err());
    }

    #[test]
    fn day_folder_uses_format() {
        let folder = FolderConfig {
            base_dir: PathBuf::from("rec"),
            name_format: "%Y-%m-%d".into(),
            ..FolderConfig::default()
        };
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(day_folder(&folder, date), PathBuf::from("rec/2026-10-19"));
    }
}
