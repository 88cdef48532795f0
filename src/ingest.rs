//! Ingestion of artifacts into a watched directory.
//!
//! The move half of the original drop-to-import flow: files carrying the
//! matching extension are moved into the watched directory (replacing any
//! same-named file), everything else is silently ignored. The watcher
//! picks the arrivals up as ordinary filesystem events.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Move matching files into `dest_dir`. Returns the imported file names.
///
/// `extension` is matched without its leading dot. Non-matching files are
/// skipped without error.
pub fn import_files(
    files: &[PathBuf],
    dest_dir: &Path,
    extension: &str,
) -> io::Result<Vec<String>> {
    let mut imported = Vec::new();

    for file in files {
        if file.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let dest = dest_dir.join(name);
        move_replacing(file, &dest)?;
        debug!(file = %name, dir = %dest_dir.display(), "artifact imported");
        imported.push(name.to_string());
    }

    Ok(imported)
}

/// Rename when possible, falling back to copy-and-remove across
/// filesystems. An existing destination is replaced.
fn move_replacing(src: &Path, dest: &Path) -> io::Result<()> {
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(src, dest)?;
            std::fs::remove_file(src)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn moves_matching_files_and_ignores_the_rest() {
        let staging = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        let model = staging.path().join("net.onnx");
        let stray = staging.path().join("notes.txt");
        fs::write(&model, b"weights").unwrap();
        fs::write(&stray, b"text").unwrap();

        let imported =
            import_files(&[model.clone(), stray.clone()], dest.path(), "onnx").unwrap();

        assert_eq!(imported, vec!["net.onnx".to_string()]);
        assert!(dest.path().join("net.onnx").exists());
        assert!(!model.exists(), "source was moved, not copied");
        assert!(stray.exists(), "non-matching file untouched");
        assert!(!dest.path().join("notes.txt").exists());
    }

    #[test]
    fn replaces_an_existing_destination() {
        let staging = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        fs::write(dest.path().join("net.onnx"), b"old").unwrap();
        let incoming = staging.path().join("net.onnx");
        fs::write(&incoming, b"new").unwrap();

        import_files(&[incoming], dest.path(), "onnx").unwrap();
        assert_eq!(fs::read(dest.path().join("net.onnx")).unwrap(), b"new");
    }
}
