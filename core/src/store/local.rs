// karat/src/store/local.rs

//! Per-visitor key/value storage: the "form submitted" flag, the cached
//! visitor profile and the uploaded-image list. Values are read on load and
//! overwritten wholesale on change.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{KaratError, KaratResult};

pub const FORM_SUBMITTED_KEY: &str = "form_submitted";
pub const USER_PROFILE_KEY: &str = "user_profile";
pub const UPLOADED_IMAGES_KEY: &str = "uploaded_images";

pub trait LocalStore: Send + Sync {
  fn get(&self, key: &str) -> KaratResult<Option<String>>;

  fn set(&self, key: &str, value: &str) -> KaratResult<()>;

  fn remove(&self, key: &str) -> KaratResult<()>;
}

impl dyn LocalStore + '_ {
  pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> KaratResult<Option<T>> {
    match self.get(key)? {
      Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
      None => Ok(None),
    }
  }

  pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> KaratResult<()> {
    let raw = serde_json::to_string(value)?;
    self.set(key, &raw)
  }

  pub fn flag(&self, key: &str) -> KaratResult<bool> {
    Ok(self.get(key)?.as_deref() == Some("true"))
  }
}

#[derive(Debug, Default)]
pub struct MemoryLocalStore {
  entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryLocalStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl LocalStore for MemoryLocalStore {
  fn get(&self, key: &str) -> KaratResult<Option<String>> {
    Ok(self.entries.lock().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> KaratResult<()> {
    self.entries.lock().insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> KaratResult<()> {
    self.entries.lock().remove(key);
    Ok(())
  }
}

/// A `LocalStore` persisted as one JSON object on disk. The whole file is
/// rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
  path: PathBuf,
  entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
  /// Opens (or lazily creates) the store at `path`. A missing file is an
  /// empty store; a malformed one is an error.
  pub fn open(path: impl AsRef<Path>) -> KaratResult<Self> {
    let path = path.as_ref().to_path_buf();
    let entries = match fs::read_to_string(&path) {
      Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
      Ok(raw) => serde_json::from_str(&raw)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "Local store file absent, starting empty.");
        BTreeMap::new()
      }
      Err(e) => {
        return Err(KaratError::LocalStore(format!("cannot read {}: {}", path.display(), e)));
      }
    };
    Ok(Self {
      path,
      entries: Mutex::new(entries),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn persist(&self, entries: &BTreeMap<String, String>) -> KaratResult<()> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)
        .map_err(|e| KaratError::LocalStore(format!("cannot create {}: {}", parent.display(), e)))?;
    }
    let raw = serde_json::to_string_pretty(entries)?;
    fs::write(&self.path, raw).map_err(|e| {
      warn!(path = %self.path.display(), error = %e, "Failed to write local store.");
      KaratError::LocalStore(format!("cannot write {}: {}", self.path.display(), e))
    })
  }
}

impl LocalStore for JsonFileStore {
  fn get(&self, key: &str) -> KaratResult<Option<String>> {
    Ok(self.entries.lock().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> KaratResult<()> {
    let mut entries = self.entries.lock();
    entries.insert(key.to_string(), value.to_string());
    self.persist(&entries)
  }

  fn remove(&self, key: &str) -> KaratResult<()> {
    let mut entries = self.entries.lock();
    if entries.remove(key).is_some() {
      self.persist(&entries)?;
    }
    Ok(())
  }
}
