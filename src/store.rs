use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cache::Cache;

const DATA_FILE: &str = "state.data";
const DIGEST_FILE: &str = "state.sum";
const DIGEST_LEN: usize = 32;

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    /// The digest file is missing, truncated, or does not match the data.
    Corrupted(String),
    /// The data matched its digest but is not a valid cache.
    Decode(serde_json::Error),
    Encode(serde_json::Error),
    MissingHome,
}

impl StoreError {
    /// Whether starting over from an empty cache (full resync) is a
    /// reasonable response to this failure.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Io(err) => err.kind() == io::ErrorKind::NotFound,
            StoreError::Corrupted(_) | StoreError::Decode(_) => true,
            StoreError::Encode(_) | StoreError::MissingHome => false,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
            StoreError::Corrupted(reason) => write!(f, "corrupted state: {}", reason),
            StoreError::Decode(err) => write!(f, "could not decode state: {}", err),
            StoreError::Encode(err) => write!(f, "could not encode state: {}", err),
            StoreError::MissingHome => write!(f, "HOME is not set; pass a state directory"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Decode(err) | StoreError::Encode(err) => Some(err),
            StoreError::Corrupted(_) | StoreError::MissingHome => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(value: io::Error) -> Self {
        StoreError::Io(value)
    }
}

/// Persists a [`Cache`] as a data file plus a SHA-256 digest of its bytes.
///
/// Pending commands and temp-id mappings are never written; they live only
/// as long as the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$HOME/lib/tdsync`.
    pub fn default_location() -> Result<Self, StoreError> {
        let home = std::env::var_os("HOME").ok_or(StoreError::MissingHome)?;
        Ok(Self::new(Path::new(&home).join("lib").join("tdsync")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    pub fn digest_path(&self) -> PathBuf {
        self.dir.join(DIGEST_FILE)
    }

    /// Writes data then digest. A failure between the two writes leaves a
    /// mismatched pair that the next `load` reports as corrupted.
    pub fn save(&self, cache: &Cache) -> Result<(), StoreError> {
        let data = serde_json::to_vec(cache).map_err(StoreError::Encode)?;
        let digest = Sha256::digest(&data);
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.data_path(), &data)?;
        std::fs::write(self.digest_path(), digest.as_slice())?;
        debug!(
            dir = %self.dir.display(),
            bytes = data.len(),
            sync_token = cache.sync_token(),
            "state saved"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<Cache, StoreError> {
        let data = std::fs::read(self.data_path())?;
        let stored = match std::fs::read(self.digest_path()) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::Corrupted("digest absent".to_string()));
            }
            Err(err) => return Err(StoreError::Io(err)),
        };
        verify_digest(&data, &stored)?;

        let cache: Cache = serde_json::from_slice(&data).map_err(StoreError::Decode)?;
        debug!(
            dir = %self.dir.display(),
            bytes = data.len(),
            sync_token = cache.sync_token(),
            "state loaded"
        );
        Ok(cache)
    }

    /// Removes both files. Missing files are not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        for path in [self.data_path(), self.digest_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(StoreError::Io(err)),
            }
        }
        Ok(())
    }
}

fn verify_digest(data: &[u8], stored: &[u8]) -> Result<(), StoreError> {
    if stored.len() != DIGEST_LEN {
        return Err(StoreError::Corrupted(format!(
            "digest is {} bytes, expected {}",
            stored.len(),
            DIGEST_LEN
        )));
    }
    let actual = Sha256::digest(data);
    if let Some(index) = actual
        .iter()
        .zip(stored)
        .position(|(left, right)| left != right)
    {
        return Err(StoreError::Corrupted(format!(
            "digest mismatch at byte {}",
            index
        )));
    }
    Ok(())
}
