//! Persistence of single cache entries.
//!
//! Reads, writes and deletes `<key>.json` files inside the cache directory.
//! All paths come from [`PathResolver::resolve`]. Failures are logged here
//! and handed back as values; nothing panics and nothing retries.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use super::entry::CacheEntry;
use super::path::PathResolver;
use crate::error::{CacheError, Result};

/// Outcome of reading one entry.
#[derive(Debug)]
pub enum ReadOutcome {
    Found(CacheEntry),
    NotFound,
    /// The file existed but did not parse; it has already been deleted.
    Corrupt,
    Failed(CacheError),
}

/// A well-formed entry file found in the cache directory.
#[derive(Debug, Clone)]
pub struct EntryFile {
    pub key: String,
    pub path: PathBuf,
    pub modified: SystemTime,
    pub bytes: u64,
}

/// Single-entry persistence on top of a [`PathResolver`].
#[derive(Debug, Clone)]
pub struct CacheStore {
    resolver: PathResolver,
}

impl CacheStore {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Create the cache directory if needed and re-assert owner-only access.
    ///
    /// The permission change is best-effort; platforms that ignore the mode
    /// are not an error.
    pub fn ensure_dir(&self) -> Result<()> {
        let dir = self.resolver.dir();
        if !dir.is_dir() {
            let mut builder = fs::DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::DirBuilderExt;
                builder.mode(0o700);
            }
            builder.create(dir).map_err(|e| {
                warn!(dir = %dir.display(), error = %e, "Failed to create cache directory");
                CacheError::Io(e)
            })?;
            debug!(dir = %dir.display(), "Created cache directory");
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o700));
        }
        Ok(())
    }

    /// Serialize and write `entry` under `key`, overwriting any existing file.
    ///
    /// The file is created owner-only and, on Unix, opened with `O_NOFOLLOW`
    /// so a symlink planted after resolution is not followed. The file mtime
    /// is set to `modified` so bulk expiry and eviction order follow the
    /// cache's clock. Returns the number of bytes written.
    pub fn write(&self, key: &str, entry: &CacheEntry, modified: SystemTime) -> Result<u64> {
        let result = self.write_inner(key, entry, modified);
        match &result {
            Ok(bytes) => debug!(key, bytes, chunks = entry.chunks.len(), "Cache entry written"),
            Err(e) => warn!(key, error = %e, "Failed to persist cache entry"),
        }
        result
    }

    fn write_inner(&self, key: &str, entry: &CacheEntry, modified: SystemTime) -> Result<u64> {
        let path = self.resolver.resolve(key)?;
        let data = serde_json::to_vec(entry)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600).custom_flags(libc::O_NOFOLLOW);
        }

        let mut file = options.open(&path)?;
        file.write_all(&data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = file.set_permissions(fs::Permissions::from_mode(0o600));
        }
        let _ = file.set_modified(modified);

        Ok(data.len() as u64)
    }

    /// Read the entry stored under `key`.
    ///
    /// An unparsable file is deleted and reported as [`ReadOutcome::Corrupt`].
    pub fn read(&self, key: &str) -> ReadOutcome {
        let path = match self.resolver.resolve(key) {
            Ok(path) => path,
            Err(e) => return ReadOutcome::Failed(e),
        };

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ReadOutcome::NotFound,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cache entry");
                return ReadOutcome::Failed(CacheError::Io(e));
            }
        };

        match serde_json::from_slice::<CacheEntry>(&data) {
            Ok(entry) => ReadOutcome::Found(entry),
            Err(e) => {
                warn!(key, bytes = data.len(), error = %e, "Cache entry is corrupt, removing");
                remove_quietly(&path);
                ReadOutcome::Corrupt
            }
        }
    }

    /// Delete the entry under `key`. Absence is not an error.
    ///
    /// Returns `true` if a file was removed.
    pub fn delete(&self, key: &str) -> bool {
        match self.resolver.resolve(key) {
            Ok(path) => remove_quietly(&path),
            Err(_) => false,
        }
    }

    /// List well-formed entry files, oldest modification time first.
    ///
    /// Only regular files named like an entry are listed; symlinks and
    /// other foreign files are skipped. Entries that vanish mid-listing
    /// (another process deleting them) are skipped as well. Each `path` is
    /// the directory entry itself, never a link target.
    pub fn list(&self) -> Result<Vec<EntryFile>> {
        let read_dir = match fs::read_dir(self.resolver.dir()) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::Io(e)),
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir.flatten() {
            let name = dir_entry.file_name();
            let Some(key) = name.to_str().and_then(PathResolver::key_from_file_name) else {
                continue;
            };
            // Symlinks are never entries, even when they point at one.
            let path = dir_entry.path();
            let Ok(meta) = fs::symlink_metadata(&path) else {
                continue;
            };
            if !meta.file_type().is_file() {
                continue;
            }
            entries.push(EntryFile {
                key: key.to_string(),
                path,
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                bytes: meta.len(),
            });
        }

        entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.key.cmp(&b.key)));
        Ok(entries)
    }
}

/// Best-effort unlink. Returns `true` if the file was removed by this call.
pub(crate) fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Failed to remove cache file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::EditChunk;
    use serde_json::json;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn test_store(tmp: &TempDir) -> CacheStore {
        let store = CacheStore::new(PathResolver::new(tmp.path().join("cache")));
        store.ensure_dir().unwrap();
        store
    }

    fn sample_entry() -> CacheEntry {
        CacheEntry::new(
            vec![EditChunk(json!({"n": 1})), EditChunk(json!({"n": 2}))],
            1_000,
            "f".repeat(64),
        )
    }

    #[test]
    fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        let entry = sample_entry();
        let bytes = store.write("abcdef01", &entry, SystemTime::now()).unwrap();
        assert!(bytes > 0);

        match store.read("abcdef01") {
            ReadOutcome::Found(read) => assert_eq!(read, entry),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_read_missing() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        assert!(matches!(store.read("00000000"), ReadOutcome::NotFound));
    }

    #[test]
    fn test_read_invalid_key() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        assert!(matches!(
            store.read("../x"),
            ReadOutcome::Failed(CacheError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_corrupt_entry_self_heals() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        let path = tmp.path().join("cache").join("deadbeef.json");
        fs::write(&path, "{ this is not json").unwrap();

        assert!(matches!(store.read("deadbeef"), ReadOutcome::Corrupt));
        assert!(!path.exists(), "corrupt file should be deleted");
        assert!(matches!(store.read("deadbeef"), ReadOutcome::NotFound));
    }

    #[test]
    fn test_overwrite_existing() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        store.write("abcdef01", &sample_entry(), SystemTime::now()).unwrap();
        let replacement = CacheEntry::new(Vec::new(), 2_000, "0".repeat(64));
        store.write("abcdef01", &replacement, SystemTime::now()).unwrap();

        match store.read("abcdef01") {
            ReadOutcome::Found(read) => assert_eq!(read, replacement),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        store.write("abcdef01", &sample_entry(), SystemTime::now()).unwrap();
        assert!(store.delete("abcdef01"));
        assert!(!store.delete("abcdef01"));
        assert!(!store.delete("not-a-key"));
    }

    #[test]
    fn test_write_sets_mtime() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        let when = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        store.write("abcdef01", &sample_entry(), when).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].modified, when);
    }

    #[test]
    fn test_list_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        let base = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        store.write("cccccccc", &sample_entry(), base + Duration::from_secs(3)).unwrap();
        store.write("aaaaaaaa", &sample_entry(), base + Duration::from_secs(1)).unwrap();
        store.write("bbbbbbbb", &sample_entry(), base + Duration::from_secs(2)).unwrap();
        fs::write(tmp.path().join("cache").join("README.txt"), "keep me").unwrap();
        fs::write(tmp.path().join("cache").join("ABCDEF01.json"), "{}").unwrap();

        let keys: Vec<_> = store.list().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["aaaaaaaa", "bbbbbbbb", "cccccccc"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(PathResolver::new(tmp.path().join("never-created")));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_write_without_dir_fails_softly() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(PathResolver::new(tmp.path().join("never-created")));
        let err = store
            .write("abcdef01", &sample_entry(), SystemTime::now())
            .unwrap_err();
        assert!(matches!(err, CacheError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_list_skips_symlinked_alias() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        let dir = tmp.path().join("cache");
        store.write("abcdef01", &sample_entry(), SystemTime::now()).unwrap();
        std::os::unix::fs::symlink(dir.join("abcdef01.json"), dir.join("aaaaaaaa.json")).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "abcdef01");
        assert_eq!(listed[0].path, dir.join("abcdef01.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        store.write("abcdef01", &sample_entry(), SystemTime::now()).unwrap();

        let dir_mode = fs::metadata(tmp.path().join("cache")).unwrap().permissions().mode();
        let file_mode = fs::metadata(tmp.path().join("cache").join("abcdef01.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);
        assert_eq!(file_mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_dir_reasserts_mode() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);
        let dir = tmp.path().join("cache");
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
        store.ensure_dir().unwrap();
        assert_eq!(fs::metadata(&dir).unwrap().permissions().mode() & 0o777, 0o700);
    }
}
