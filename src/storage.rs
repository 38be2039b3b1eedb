//! Where artifacts go once a document has been tagged.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A flat, named collection of output files.
pub trait ArtifactStore {
    /// Store an artifact, replacing any previous one of the same name.
    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Read an artifact back.
    fn get(&self, name: &str) -> Result<Vec<u8>>;

    /// Names of the stored artifacts, sorted.
    fn names(&self) -> Result<Vec<String>>;
}

/// Artifact names are plain file names; anything that could escape the store is refused.
fn check_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(Error::Storage(format!("invalid artifact name: {:?}", name)));
    }
    Ok(())
}

/// Artifacts as files in one directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Use `root` as the output directory, creating it if needed.
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of an artifact.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ArtifactStore for DirStore {
    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        check_name(name)?;
        let path = self.path_of(name);
        fs::write(&path, bytes)?;
        log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        check_name(name)?;
        Ok(fs::read(self.path_of(name))?)
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Artifacts held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an artifact as UTF-8 text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.files
            .get(name)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if nothing was stored.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ArtifactStore for MemoryStore {
    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        check_name(name)?;
        self.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("no artifact named {:?}", name)))
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");

        let mut store = DirStore::create(&out).unwrap();
        assert!(out.is_dir());

        store.put("b.txt", b"second").unwrap();
        store.put("a.json", b"{}").unwrap();
        store.put("a.json", b"{\"x\":1}").unwrap();

        assert_eq!(store.get("a.json").unwrap(), b"{\"x\":1}");
        assert_eq!(store.names().unwrap(), vec!["a.json", "b.txt"]);
        assert_eq!(std::fs::read(out.join("b.txt")).unwrap(), b"second");
    }

    #[test]
    fn test_dir_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::create(dir.path()).unwrap();
        assert!(matches!(store.get("absent.md"), Err(Error::Io(_))));
    }

    #[test]
    fn test_names_cannot_escape() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::create(dir.path()).unwrap();
        for bad in ["", "..", "../x", "a/b", "a\\b"] {
            assert!(matches!(store.put(bad, b"x"), Err(Error::Storage(_))));
        }

        let mut memory = MemoryStore::new();
        assert!(memory.put("../x", b"x").is_err());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        store.put("extract.md", b"# Title\n").unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.text("extract.md"), Some("# Title\n"));
        assert!(matches!(store.get("other"), Err(Error::Storage(_))));
    }
}
