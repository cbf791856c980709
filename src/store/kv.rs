use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::foundation::error::{SnapError, SnapResult};

/// String key-value storage with an optional size quota.
///
/// Contract: `set` fails with [`SnapError::CapacityExceeded`] (and changes nothing) when the new
/// value would push the store over its quota. Any other failure is a [`SnapError::Storage`] or
/// [`SnapError::Other`].
pub trait KvStore {
    /// Read a value.
    fn get(&self, key: &str) -> SnapResult<Option<String>>;
    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> SnapResult<()>;
    /// Delete a value; deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> SnapResult<()>;
    /// All keys currently stored, sorted.
    fn keys(&self) -> SnapResult<Vec<String>>;
}

impl<T: KvStore + ?Sized> KvStore for &mut T {
    fn get(&self, key: &str) -> SnapResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> SnapResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> SnapResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> SnapResult<Vec<String>> {
        (**self).keys()
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &str) -> SnapResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> SnapResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> SnapResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> SnapResult<Vec<String>> {
        (**self).keys()
    }
}

/// In-memory store; quota counts key plus value bytes.
#[derive(Clone, Debug, Default)]
pub struct InMemoryKvStore {
    map: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl InMemoryKvStore {
    /// Unlimited store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            map: BTreeMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently used.
    pub fn used_bytes(&self) -> usize {
        self.map.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &str) -> SnapResult<Option<String>> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> SnapResult<()> {
        if let Some(quota) = self.quota_bytes {
            let old = self.map.get(key).map_or(0, |v| key.len() + v.len());
            let next = self.used_bytes() - old + key.len() + value.len();
            if next > quota {
                return Err(SnapError::capacity(format!(
                    "writing '{key}' needs {next} bytes, quota is {quota}"
                )));
            }
        }
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SnapResult<()> {
        self.map.remove(key);
        Ok(())
    }

    fn keys(&self) -> SnapResult<Vec<String>> {
        Ok(self.map.keys().cloned().collect())
    }
}

/// One file per key under a directory; quota counts file bytes.
#[derive(Clone, Debug)]
pub struct FileKvStore {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileKvStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>, quota_bytes: Option<u64>) -> SnapResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create store directory '{}'", dir.display()))?;
        Ok(Self { dir, quota_bytes })
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }

    fn used_bytes_except(&self, skip: &Path) -> SnapResult<u64> {
        let rd = std::fs::read_dir(&self.dir)
            .with_context(|| format!("list store directory '{}'", self.dir.display()))?;
        let mut total = 0u64;
        for entry in rd.flatten() {
            let path = entry.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            total += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
        Ok(total)
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> SnapResult<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapError::storage(format!(
                "read '{}': {e}",
                path.display()
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> SnapResult<()> {
        let path = self.path_for(key);
        if let Some(quota) = self.quota_bytes {
            let next = self.used_bytes_except(&path)? + value.len() as u64;
            if next > quota {
                return Err(SnapError::capacity(format!(
                    "writing '{key}' needs {next} bytes, quota is {quota}"
                )));
            }
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .map_err(|e| SnapError::storage(format!("write '{}': {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| SnapError::storage(format!("replace '{}': {e}", path.display())))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SnapResult<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SnapError::storage(format!(
                "remove '{}': {e}",
                path.display()
            ))),
        }
    }

    fn keys(&self) -> SnapResult<Vec<String>> {
        let rd = std::fs::read_dir(&self.dir)
            .with_context(|| format!("list store directory '{}'", self.dir.display()))?;
        let mut out = Vec::new();
        for entry in rd.flatten() {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Some(key) = decode_key(stem) {
                out.push(key);
            }
        }
        out.sort();
        Ok(out)
    }
}

/// Percent-encode everything outside `[A-Za-z0-9._~-]` so keys map to unique file names.
fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn decode_key(stem: &str) -> Option<String> {
    urlencoding::decode(stem).ok().map(|k| k.into_owned())
}

#[cfg(test)]
#[path = "../../tests/unit/store/kv.rs"]
mod tests;
