//! Cookie signing key loading.
//!
//! The key file is read once at startup and its bytes are zeroized after the
//! key is derived. A truncated SHA-256 fingerprint is logged so operators can
//! tell which key is live without exposing it.

use std::path::{Path, PathBuf};

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use zeroize::Zeroize;

/// Minimum key file length accepted in release builds.
pub const SESSION_KEY_MIN_LEN: usize = 64;
const FINGERPRINT_BYTES: usize = 8;

/// Build mode for key validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Missing key files fall back to a generated key.
    Debug,
    /// Key files must exist and be long enough unless ephemeral keys are allowed.
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Errors raised while loading the session key.
#[derive(Debug, thiserror::Error)]
pub enum SessionKeyError {
    #[error("failed to read session key at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    TooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
}

/// Truncated SHA-256 fingerprint of the key's signing half, as 16 hex chars.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use skillflash::server::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

/// Read and derive the session key from `path`.
///
/// Falls back to a generated key when the file cannot be read and either
/// the build is a debug build or `allow_ephemeral` is set.
///
/// # Errors
///
/// Returns [`SessionKeyError::Read`] when the file is unreadable and no
/// fallback applies, and [`SessionKeyError::TooShort`] for short keys in
/// release builds.
pub fn load_session_key(
    path: &Path,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionKeyError> {
    let key = match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionKeyError::TooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            key
        }
        Err(error) if mode == BuildMode::Debug || allow_ephemeral => {
            warn!(
                path = %path.display(),
                %error,
                "using temporary session key; sessions will not survive a restart"
            );
            Key::generate()
        }
        Err(source) => {
            return Err(SessionKeyError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    info!(fingerprint = %key_fingerprint(&key), "session key loaded");
    Ok(key)
}
