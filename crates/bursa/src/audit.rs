//! Tamper-evident audit logging.
//!
//! Security-critical wallet events - signing, broadcasting, critical risk
//! breaches - are appended to a JSONL audit log. Each entry carries an
//! HMAC-SHA256 computed over the entry body concatenated with the previous
//! entry's HMAC, chaining the log so that any modification of a historical
//! entry invalidates every HMAC after it.
//!
//! Properties:
//!
//! - **Forward integrity**: tampering is detectable from the first altered
//!   entry onward.
//! - **Key separation**: the HMAC key lives in `audit.key` next to the log
//!   with owner-only permissions; an attacker who can only read the log
//!   cannot re-chain it.
//! - **Rotation**: when the active file exceeds the size threshold it is
//!   gzip-compressed and archived; the chain restarts in the fresh file
//!   while sequence numbers keep increasing.
//!
//! # Example
//!
//! ```no_run
//! use bursa::audit::{AuditEvent, AuditLogger};
//! use std::path::Path;
//!
//! let logger = AuditLogger::with_generated_key(Path::new("/var/log/bursa"))
//!     .expect("audit init");
//!
//! logger.log(AuditEvent::TransactionSigned {
//!     chain: "ethereum".to_string(),
//!     tx_hash: "0xabc".to_string(),
//!     recipient: "0xbbb".to_string(),
//!     value: "256".to_string(),
//! }).expect("append");
//!
//! assert!(logger.verify_chain().expect("verify").valid);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::error;
use zeroize::Zeroizing;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use bursa_core::{CustodyError, RiskAlert};
use bursa_risk::BreachSink;

type HmacSha256 = Hmac<Sha256>;

/// Name of the active audit log file.
const AUDIT_LOG_FILENAME: &str = "audit.jsonl";

/// Name of the HMAC key file.
const AUDIT_KEY_FILENAME: &str = "audit.key";

/// Fixed "previous HMAC" for the first entry of a chain.
const INITIAL_HMAC: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Default rotation threshold (10 MB).
const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

// ============================================================================
// Events and entries
// ============================================================================

/// A security-relevant wallet event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A transaction was canonically serialized and signed.
    TransactionSigned {
        /// Chain the signature targets.
        chain: String,
        /// Content hash of the canonical bytes.
        tx_hash: String,
        /// Recipient address.
        recipient: String,
        /// Transfer amount, decimal string.
        value: String,
    },
    /// Signed bytes were handed to the chain provider.
    TransactionBroadcast {
        /// Chain broadcast to.
        chain: String,
        /// Content hash of the canonical bytes.
        tx_hash: String,
        /// Hash assigned by the network.
        network_hash: String,
    },
    /// The risk analyzer produced a critical alert.
    RiskBreach {
        /// Alert severity, as text.
        severity: String,
        /// Alert message.
        message: String,
    },
}

/// One line of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// ISO 8601 timestamp.
    pub timestamp: String,
    /// The recorded event.
    #[serde(flatten)]
    pub event: AuditEvent,
    /// HMAC-SHA256 over the entry body and the previous entry's HMAC.
    pub hmac: String,
}

/// Body of an entry, hashed before the HMAC field exists.
#[derive(Serialize)]
struct AuditBody<'a> {
    seq: u64,
    timestamp: &'a str,
    #[serde(flatten)]
    event: &'a AuditEvent,
}

/// Outcome of verifying the active log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// `true` when every entry's HMAC chains correctly.
    pub valid: bool,
    /// Number of entries examined.
    pub entries: usize,
    /// Sequence number of the first invalid entry, when any.
    pub first_invalid_seq: Option<u64>,
}

// ============================================================================
// AuditLogger
// ============================================================================

struct ChainState {
    seq: u64,
    prev_hmac: String,
}

/// Appends HMAC-chained entries to the audit log.
pub struct AuditLogger {
    dir: PathBuf,
    key: Zeroizing<Vec<u8>>,
    max_file_size: u64,
    state: Mutex<ChainState>,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl AuditLogger {
    /// Create a logger writing under `dir` with the given HMAC key.
    ///
    /// If an `audit.jsonl` already exists, the chain resumes from its last
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError::Backend`] when the directory cannot be
    /// prepared or the existing log cannot be read.
    pub fn new(dir: &Path, key: &[u8; 32]) -> Result<Self, CustodyError> {
        fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(dir)?.permissions();
            perms.set_mode(0o700);
            fs::set_permissions(dir, perms)?;
        }

        let state = Self::resume_chain(&dir.join(AUDIT_LOG_FILENAME))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            key: Zeroizing::new(key.to_vec()),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            state: Mutex::new(state),
        })
    }

    /// Create a logger, loading the HMAC key from `audit.key` or
    /// generating a fresh one with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError::Backend`] on I/O failure or a malformed key
    /// file.
    pub fn with_generated_key(dir: &Path) -> Result<Self, CustodyError> {
        fs::create_dir_all(dir)?;
        let key_path = dir.join(AUDIT_KEY_FILENAME);

        let key: [u8; 32] = if key_path.exists() {
            let bytes = fs::read(&key_path)?;
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CustodyError::backend("audit key file must be 32 bytes"))?
        } else {
            let mut key = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut key);
            fs::write(&key_path, key)?;
            #[cfg(unix)]
            {
                let mut perms = fs::metadata(&key_path)?.permissions();
                perms.set_mode(0o600);
                fs::set_permissions(&key_path, perms)?;
            }
            key
        };

        Self::new(dir, &key)
    }

    /// Override the rotation threshold.
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Append an event to the log.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError::Backend`] on serialization or I/O failure.
    pub fn log(&self, event: AuditEvent) -> Result<(), CustodyError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        self.rotate_if_needed(&mut state)?;

        let seq = state.seq;
        let timestamp = Utc::now().to_rfc3339();
        let hmac = self.entry_hmac(seq, &timestamp, &event, &state.prev_hmac)?;

        let entry = AuditEntry {
            seq,
            timestamp,
            event,
            hmac: hmac.clone(),
        };
        let line = serde_json::to_string(&entry)
            .map_err(|e| CustodyError::backend(format!("audit serialization: {e}")))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())?;
        writeln!(file, "{line}")?;
        file.sync_all()?;

        state.seq = seq + 1;
        state.prev_hmac = hmac;
        Ok(())
    }

    /// Verify the HMAC chain of the active log file.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError::Backend`] when the file cannot be read or an
    /// entry is not valid JSON.
    pub fn verify_chain(&self) -> Result<VerificationReport, CustodyError> {
        let path = self.log_path();
        if !path.exists() {
            return Ok(VerificationReport {
                valid: true,
                entries: 0,
                first_invalid_seq: None,
            });
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut prev = INITIAL_HMAC.to_string();
        let mut entries = 0usize;

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(&line)
                .map_err(|e| CustodyError::backend(format!("audit entry parse: {e}")))?;

            let expected =
                self.entry_hmac(entry.seq, &entry.timestamp, &entry.event, &prev)?;
            if expected != entry.hmac {
                return Ok(VerificationReport {
                    valid: false,
                    entries,
                    first_invalid_seq: Some(entry.seq),
                });
            }
            prev = entry.hmac;
            entries += 1;
        }

        Ok(VerificationReport {
            valid: true,
            entries,
            first_invalid_seq: None,
        })
    }

    fn log_path(&self) -> PathBuf {
        self.dir.join(AUDIT_LOG_FILENAME)
    }

    fn entry_hmac(
        &self,
        seq: u64,
        timestamp: &str,
        event: &AuditEvent,
        prev: &str,
    ) -> Result<String, CustodyError> {
        let body = serde_json::to_string(&AuditBody {
            seq,
            timestamp,
            event,
        })
        .map_err(|e| CustodyError::backend(format!("audit serialization: {e}")))?;

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| CustodyError::backend("audit key rejected by HMAC"))?;
        mac.update(body.as_bytes());
        mac.update(prev.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Resume sequence and chain head from an existing log file.
    fn resume_chain(path: &Path) -> Result<ChainState, CustodyError> {
        if !path.exists() {
            return Ok(ChainState {
                seq: 0,
                prev_hmac: INITIAL_HMAC.to_string(),
            });
        }

        let reader = BufReader::new(File::open(path)?);
        let mut state = ChainState {
            seq: 0,
            prev_hmac: INITIAL_HMAC.to_string(),
        };
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(&line)
                .map_err(|e| CustodyError::backend(format!("audit entry parse: {e}")))?;
            state.seq = entry.seq + 1;
            state.prev_hmac = entry.hmac;
        }
        Ok(state)
    }

    /// Archive the active file as gzip once it crosses the size threshold.
    ///
    /// The chain restarts in the fresh file; sequence numbers continue.
    fn rotate_if_needed(&self, state: &mut ChainState) -> Result<(), CustodyError> {
        let path = self.log_path();
        let Ok(metadata) = fs::metadata(&path) else {
            return Ok(());
        };
        if metadata.len() < self.max_file_size {
            return Ok(());
        }

        let archive_path = self.dir.join(format!("audit-{:010}.jsonl.gz", state.seq));
        let mut input = File::open(&path)?;
        let mut encoder = GzEncoder::new(File::create(&archive_path)?, Compression::default());
        let mut buf = Vec::new();
        input.read_to_end(&mut buf)?;
        encoder.write_all(&buf)?;
        encoder.finish()?;
        fs::remove_file(&path)?;

        state.prev_hmac = INITIAL_HMAC.to_string();
        Ok(())
    }
}

impl BreachSink for AuditLogger {
    fn on_breach(&self, alert: &RiskAlert) {
        let event = AuditEvent::RiskBreach {
            severity: format!("{:?}", alert.severity).to_lowercase(),
            message: alert.message.clone(),
        };
        // The sink is infallible by contract; an unwritable audit log must
        // not change the analysis outcome.
        if let Err(err) = self.log(event) {
            error!(%err, "failed to audit risk breach");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use bursa_core::Severity;
    use tempfile::TempDir;

    fn signed_event(n: u64) -> AuditEvent {
        AuditEvent::TransactionSigned {
            chain: "ethereum".to_string(),
            tx_hash: format!("0x{n:064x}"),
            recipient: "0xbbb".to_string(),
            value: "256".to_string(),
        }
    }

    fn logger(dir: &TempDir) -> AuditLogger {
        AuditLogger::new(dir.path(), &[0x42u8; 32]).unwrap()
    }

    #[test]
    fn test_log_and_verify_round_trip() {
        let dir = TempDir::new().unwrap();
        let logger = logger(&dir);

        for n in 0..5 {
            logger.log(signed_event(n)).unwrap();
        }

        let report = logger.verify_chain().unwrap();
        assert!(report.valid);
        assert_eq!(report.entries, 5);
    }

    #[test]
    fn test_tampering_is_detected() {
        let dir = TempDir::new().unwrap();
        let logger = logger(&dir);
        for n in 0..3 {
            logger.log(signed_event(n)).unwrap();
        }

        // Flip the recipient in the middle entry.
        let path = dir.path().join(AUDIT_LOG_FILENAME);
        let content = fs::read_to_string(&path).unwrap();
        let tampered = content.replace("0xbbb", "0xEVIL");
        fs::write(&path, tampered).unwrap();

        let report = logger.verify_chain().unwrap();
        assert!(!report.valid);
        assert_eq!(report.first_invalid_seq, Some(0));
    }

    #[test]
    fn test_deleting_an_entry_breaks_the_chain() {
        let dir = TempDir::new().unwrap();
        let logger = logger(&dir);
        for n in 0..3 {
            logger.log(signed_event(n)).unwrap();
        }

        let path = dir.path().join(AUDIT_LOG_FILENAME);
        let content = fs::read_to_string(&path).unwrap();
        let without_middle: Vec<&str> = content
            .lines()
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(_, l)| l)
            .collect();
        fs::write(&path, without_middle.join("\n")).unwrap();

        assert!(!logger.verify_chain().unwrap().valid);
    }

    #[test]
    fn test_chain_resumes_across_logger_restarts() {
        let dir = TempDir::new().unwrap();
        {
            let logger = logger(&dir);
            logger.log(signed_event(0)).unwrap();
        }
        {
            let logger = logger(&dir);
            logger.log(signed_event(1)).unwrap();
            let report = logger.verify_chain().unwrap();
            assert!(report.valid);
            assert_eq!(report.entries, 2);
        }
    }

    #[test]
    fn test_rotation_archives_and_restarts_chain() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path(), &[0x42u8; 32])
            .unwrap()
            .with_max_file_size(64);

        for n in 0..4 {
            logger.log(signed_event(n)).unwrap();
        }

        let archives: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| {
                let name = e.unwrap().file_name().to_string_lossy().to_string();
                name.ends_with(".jsonl.gz").then_some(name)
            })
            .collect();
        assert!(!archives.is_empty());

        // The active file still verifies on its own.
        assert!(logger.verify_chain().unwrap().valid);
    }

    #[test]
    fn test_with_generated_key_persists_key() {
        let dir = TempDir::new().unwrap();
        {
            let logger = AuditLogger::with_generated_key(dir.path()).unwrap();
            logger.log(signed_event(0)).unwrap();
        }
        // Same key is loaded on restart, so the chain still verifies.
        let logger = AuditLogger::with_generated_key(dir.path()).unwrap();
        assert!(logger.verify_chain().unwrap().valid);
        assert!(dir.path().join(AUDIT_KEY_FILENAME).exists());
    }

    #[test]
    fn test_breach_sink_appends_risk_entries() {
        let dir = TempDir::new().unwrap();
        let logger = logger(&dir);

        let alert = RiskAlert::new(Severity::Critical, "recipient is denylisted");
        logger.on_breach(&alert);

        let report = logger.verify_chain().unwrap();
        assert!(report.valid);
        assert_eq!(report.entries, 1);

        let content = fs::read_to_string(dir.path().join(AUDIT_LOG_FILENAME)).unwrap();
        assert!(content.contains("risk_breach"));
        assert!(content.contains("denylisted"));
    }

    #[test]
    fn test_empty_log_verifies() {
        let dir = TempDir::new().unwrap();
        let logger = logger(&dir);
        let report = logger.verify_chain().unwrap();
        assert!(report.valid);
        assert_eq!(report.entries, 0);
    }
}
