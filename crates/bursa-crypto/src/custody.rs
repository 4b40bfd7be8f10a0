//! Key custody: protected storage and retrieval behind an authorization
//! gate.
//!
//! Custody is the only way key material enters or leaves persistent
//! storage. Retrieval invokes the [`AuthorizationGate`] synchronously as
//! part of the call - it is not a separate step a caller can skip - and no
//! method ever returns key bytes without the storage layer having enforced
//! its access-control policy. If that policy cannot be established at store
//! time, the call fails closed; there is no plaintext fallback.
//!
//! The file-backed implementation stores each key as `<id>.enc` (the
//! sealed container from [`crate::encryption`]) with owner-only
//! permissions, atomic temp-file-then-rename writes, and key-id validation
//! against path traversal.
//!
//! # Example
//!
//! ```no_run
//! use bursa_crypto::custody::{AlwaysAllowGate, FileKeyCustody, KeyCustody};
//! use bursa_crypto::keys::SecretKey;
//! use std::path::PathBuf;
//!
//! let custody = FileKeyCustody::new(
//!     PathBuf::from("/tmp/bursa-keys"),
//!     AlwaysAllowGate,
//!     "device-unlock-secret",
//! ).expect("custody setup");
//!
//! let key = SecretKey::generate();
//! custody.store("hot-wallet", &key).expect("store");
//! let loaded = custody.get("hot-wallet").expect("authorized retrieval");
//! assert_eq!(key, loaded);
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tracing::debug;
use zeroize::Zeroizing;

use bursa_core::CustodyError;

use crate::encryption::{open, seal, SealedSecret};
use crate::keys::SecretKey;

// ============================================================================
// AuthorizationGate
// ============================================================================

/// External collaborator deciding "is this principal currently authorized".
///
/// A gate is a blocking user-interaction boundary (biometric prompt,
/// passcode entry). Custody serializes gate invocations per key id, so no
/// other security-sensitive operation proceeds while a prompt is
/// outstanding for the same key.
pub trait AuthorizationGate: Send + Sync {
    /// Decide whether key material for `key_id` may be released right now.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError::AuthorizationFailed`] on denial, or
    /// [`CustodyError::Backend`] when the gate itself is unavailable.
    fn authorize(&self, key_id: &str) -> Result<(), CustodyError>;

    /// Returns `true` if retrieval requires a live user-presence check.
    fn requires_user_presence(&self) -> bool;
}

impl<G: AuthorizationGate + ?Sized> AuthorizationGate for Arc<G> {
    fn authorize(&self, key_id: &str) -> Result<(), CustodyError> {
        (**self).authorize(key_id)
    }

    fn requires_user_presence(&self) -> bool {
        (**self).requires_user_presence()
    }
}

/// Gate that allows every request without user presence.
///
/// For tests and development setups only; a production wallet wires in a
/// platform gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllowGate;

impl AuthorizationGate for AlwaysAllowGate {
    fn authorize(&self, _key_id: &str) -> Result<(), CustodyError> {
        Ok(())
    }

    fn requires_user_presence(&self) -> bool {
        false
    }
}

// ============================================================================
// KeyCustody
// ============================================================================

/// Protected key storage and retrieval.
pub trait KeyCustody: Send + Sync {
    /// Retrieve key material, invoking the authorization gate first.
    ///
    /// # Errors
    ///
    /// - [`CustodyError::ItemNotFound`] when nothing is stored under `id`
    /// - [`CustodyError::AuthorizationFailed`] on gate denial or a rejected
    ///   unlock secret
    /// - [`CustodyError::Backend`] on storage faults
    fn get(&self, id: &str) -> Result<SecretKey, CustodyError>;

    /// Store key material under `id`, overwriting any existing entry.
    ///
    /// A colliding id is overwritten via delete-then-retry rather than
    /// silently failing or duplicating.
    ///
    /// # Errors
    ///
    /// - [`CustodyError::AccessControlSetupFailed`] when the protection
    ///   policy cannot be established
    /// - [`CustodyError::Backend`] on storage faults
    fn store(&self, id: &str, key: &SecretKey) -> Result<(), CustodyError>;

    /// Returns `true` iff retrieval requires a live authorization check.
    fn is_protected(&self) -> bool;
}

// ============================================================================
// FileKeyCustody
// ============================================================================

/// File-backed custody: sealed containers in a directory, gated retrieval.
pub struct FileKeyCustody<G> {
    keys_dir: PathBuf,
    gate: G,
    unlock: Zeroizing<String>,
    // One lock per key id; holds gate prompts and file ops mutually
    // exclusive for that id.
    id_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<G> std::fmt::Debug for FileKeyCustody<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyCustody")
            .field("keys_dir", &self.keys_dir)
            .finish_non_exhaustive()
    }
}

impl<G: AuthorizationGate> FileKeyCustody<G> {
    /// Create a custody store rooted at `keys_dir`.
    ///
    /// The directory is created with owner-only permissions if missing.
    ///
    /// # Errors
    ///
    /// - [`CustodyError::AccessControlSetupFailed`] when `unlock` is empty -
    ///   custody fails closed rather than storing keys unprotected
    /// - [`CustodyError::Backend`] when the directory cannot be prepared
    pub fn new(keys_dir: PathBuf, gate: G, unlock: &str) -> Result<Self, CustodyError> {
        if unlock.is_empty() {
            return Err(CustodyError::access_control_setup_failed(
                "empty unlock secret; refusing unprotected storage",
            ));
        }

        if !keys_dir.exists() {
            fs::create_dir_all(&keys_dir)?;
        }
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&keys_dir)?.permissions();
            perms.set_mode(0o700);
            fs::set_permissions(&keys_dir, perms)?;
        }

        Ok(Self {
            keys_dir,
            gate,
            unlock: Zeroizing::new(unlock.to_string()),
            id_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Valid ids are non-empty, ASCII alphanumeric plus `-`/`_`, and do not
    /// start with a dot. Rules out path traversal and hidden temp files.
    fn validate_id(id: &str) -> Result<(), CustodyError> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(())
        } else {
            Err(CustodyError::InvalidKeyId { id: id.to_string() })
        }
    }

    fn key_path(&self, id: &str) -> PathBuf {
        self.keys_dir.join(format!("{id}.enc"))
    }

    fn id_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .id_locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(locks.entry(id.to_string()).or_default())
    }
}

impl<G: AuthorizationGate> KeyCustody for FileKeyCustody<G> {
    fn get(&self, id: &str) -> Result<SecretKey, CustodyError> {
        Self::validate_id(id)?;
        let lock = self.id_lock(id);
        let _guard = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        // The gate runs before any storage access; denial means no bytes
        // are even read.
        self.gate.authorize(id)?;

        let path = self.key_path(id);
        if !path.exists() {
            return Err(CustodyError::item_not_found(id));
        }

        let mut bytes = Vec::new();
        File::open(&path)?.read_to_end(&mut bytes)?;
        let sealed = SealedSecret::from_bytes(&bytes)?;
        open(&sealed, &self.unlock)
    }

    fn store(&self, id: &str, key: &SecretKey) -> Result<(), CustodyError> {
        Self::validate_id(id)?;
        let lock = self.id_lock(id);
        let _guard = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let path = self.key_path(id);
        if path.exists() {
            // Overwrite semantics: delete, then write fresh.
            fs::remove_file(&path)?;
            debug!(key_id = id, "replaced existing key entry");
        }

        let sealed = seal(key, &self.unlock)?;
        let bytes = sealed.to_bytes();

        let temp_path = self.keys_dir.join(format!(".{id}.tmp"));
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&temp_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms)?;
        }
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    fn is_protected(&self) -> bool {
        self.gate.requires_user_presence()
    }
}

// ============================================================================
// Tests
// ============================================================================
