use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Read a text file, treating a missing file as `None`.
pub fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Replace `path` with `contents` via a uniquely named temp file in the same
/// directory and a rename, so readers see either the old document or the new
/// one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = ensure_parent(path)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Open (creating if needed) the `<name>.lock` sibling of `path`.
///
/// The data file itself is replaced on every write, so locks are taken on
/// this stable companion instead.
pub fn open_lock_file(path: &Path) -> io::Result<File> {
    ensure_parent(path)?;
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(lock_path(path))
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> io::Result<&Path> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            Ok(parent)
        }
        None => Ok(Path::new(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_optional(&dir.path().join("nope.json")).unwrap(), None);
    }

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("matches.json");

        write_atomic(&path, b"{\"matches\":[]}").unwrap();
        write_atomic(&path, b"{\"matches\":[1]}").unwrap();

        assert_eq!(read_optional(&path).unwrap().as_deref(), Some("{\"matches\":[1]}"));
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn lock_file_sits_next_to_the_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("league").join("matches.json");

        open_lock_file(&path).unwrap();

        assert!(dir.path().join("league").join("matches.json.lock").exists());
        assert!(!path.exists());
    }
}
