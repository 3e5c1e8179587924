//! Picking the track that seeds an empty queue

use onair_config::SeedSettings;
use onair_core::{Error, Result, AUDIO_EXTENSIONS};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Random audio file below `library_dir`, following no symlinks
pub fn random_track(library_dir: &Path) -> Result<PathBuf> {
    if !library_dir.is_dir() {
        return Err(Error::validation(
            "library directory",
            library_dir.display().to_string(),
            "not a directory",
        ));
    }

    let candidates: Vec<PathBuf> = WalkDir::new(library_dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable library entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_audio(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    tracing::debug!(
        library = %library_dir.display(),
        candidates = candidates.len(),
        "scanned library"
    );

    candidates
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| {
            Error::validation(
                "library directory",
                library_dir.display().to_string(),
                "contains no audio files",
            )
        })
}

/// The configured track, else a random one from the library, else nothing
pub fn pick_seed_track(settings: &SeedSettings) -> Result<Option<PathBuf>> {
    if let Some(track) = &settings.track {
        return Ok(Some(track.clone()));
    }
    match &settings.library_dir {
        Some(dir) => random_track(dir).map(Some),
        None => Ok(None),
    }
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_random_track_only_picks_audio_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("artist/album");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("01.FLAC"), b"").unwrap();
        std::fs::write(nested.join("cover.jpg"), b"").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"").unwrap();

        for _ in 0..10 {
            let track = random_track(temp_dir.path()).unwrap();
            assert_eq!(track, nested.join("01.FLAC"));
        }
    }

    #[test]
    fn test_empty_library_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("readme.md"), b"").unwrap();
        assert!(random_track(temp_dir.path()).is_err());
        assert!(random_track(&temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_configured_track_wins_over_library() {
        let settings = SeedSettings {
            track: Some(PathBuf::from("/music/jingle.ogg")),
            library_dir: Some(PathBuf::from("/does/not/matter")),
        };
        assert_eq!(
            pick_seed_track(&settings).unwrap(),
            Some(PathBuf::from("/music/jingle.ogg"))
        );
        assert_eq!(pick_seed_track(&SeedSettings::default()).unwrap(), None);
    }
}
