//! Error types for the Bursa wallet core.
//!
//! This module provides the error taxonomy for all failure modes in the
//! wallet core, organized by domain:
//!
//! - [`CustodyError`] - Key custody and authorization failures
//! - [`ChainError`] - Chain provider (network/protocol) failures
//! - [`SimulationError`] - Transaction dry-run failures
//! - [`SignError`] - Signing and serialization failures
//! - [`RecoveryError`] - Secret splitting and reconstruction failures
//! - [`ConfigError`] - Configuration failures
//! - [`WalletError`] - Top-level error that wraps all of the above
//!
//! Authorization failures are kept distinct from funds/network failures so a
//! consumer can prompt for re-authentication instead of showing a generic
//! error. Transport failures from the chain provider arrive pre-wrapped as
//! tagged [`ChainError`] variants; raw vendor codes never cross this
//! boundary.
//!
//! # Example
//!
//! ```rust
//! use bursa_core::error::{ChainError, WalletError};
//!
//! fn broadcast(raw: &[u8]) -> Result<String, WalletError> {
//!     if raw.is_empty() {
//!         return Err(ChainError::rpc("empty transaction payload").into());
//!     }
//!     Ok("0xabc".to_string())
//! }
//! ```

// ============================================================================
// CustodyError
// ============================================================================

/// Errors that can occur in key custody operations.
///
/// Retrieval always passes through the authorization gate, so a denied gate
/// surfaces here as [`CustodyError::AuthorizationFailed`] - distinct from a
/// missing key, which is [`CustodyError::ItemNotFound`].
#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    /// No key material is stored under the requested id.
    #[error("no key stored under id: {id}")]
    ItemNotFound {
        /// The key id that was requested.
        id: String,
    },

    /// The authorization gate denied key release, or the unlock secret was
    /// rejected by the storage layer.
    #[error("authorization failed: {reason}")]
    AuthorizationFailed {
        /// Why authorization did not succeed.
        reason: String,
    },

    /// The access-control policy could not be established at store time.
    ///
    /// Custody fails closed: key material is never written to unprotected
    /// storage as a fallback.
    #[error("access control could not be established: {context}")]
    AccessControlSetupFailed {
        /// Context about the policy that could not be set up.
        context: String,
    },

    /// The storage backend failed (I/O, corrupt container, etc.).
    #[error("custody backend failure: {context}")]
    Backend {
        /// Context about the backend failure.
        context: String,
    },

    /// The key id is not a valid storage name.
    #[error("invalid key id: {id:?}")]
    InvalidKeyId {
        /// The rejected id.
        id: String,
    },
}

impl CustodyError {
    /// Create an `ItemNotFound` error.
    #[must_use]
    pub fn item_not_found(id: impl Into<String>) -> Self {
        Self::ItemNotFound { id: id.into() }
    }

    /// Create an `AuthorizationFailed` error.
    #[must_use]
    pub fn authorization_failed(reason: impl Into<String>) -> Self {
        Self::AuthorizationFailed {
            reason: reason.into(),
        }
    }

    /// Create an `AccessControlSetupFailed` error.
    #[must_use]
    pub fn access_control_setup_failed(context: impl Into<String>) -> Self {
        Self::AccessControlSetupFailed {
            context: context.into(),
        }
    }

    /// Create a `Backend` error.
    #[must_use]
    pub fn backend(context: impl Into<String>) -> Self {
        Self::Backend {
            context: context.into(),
        }
    }

    /// Returns `true` if this error should prompt re-authentication rather
    /// than a generic failure message.
    #[must_use]
    pub const fn is_authorization(&self) -> bool {
        matches!(self, Self::AuthorizationFailed { .. })
    }
}

impl From<std::io::Error> for CustodyError {
    fn from(err: std::io::Error) -> Self {
        Self::Backend {
            context: err.to_string(),
        }
    }
}

// ============================================================================
// ChainError
// ============================================================================

/// Tagged errors surfaced by a chain provider.
///
/// The core never inspects raw transport-layer exceptions; providers are
/// required to map their failures onto these variants.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The network could not be reached.
    #[error("network error: {context}")]
    Network {
        /// Context about the connectivity failure.
        context: String,
    },

    /// The address is malformed for the target chain.
    #[error("invalid address: {address}")]
    InvalidAddress {
        /// The malformed address string.
        address: String,
    },

    /// The remote endpoint returned an error response.
    #[error("rpc error: {message}")]
    Rpc {
        /// The provider's error message, already stripped of vendor codes.
        message: String,
    },

    /// A provider response could not be decoded.
    #[error("parse error: {context}")]
    Parse {
        /// Context about what failed to decode.
        context: String,
    },

    /// The chain identifier is not known to this wallet.
    #[error("unsupported chain: {chain}")]
    UnsupportedChain {
        /// The chain identifier that was requested.
        chain: String,
    },
}

impl ChainError {
    /// Create a `Network` error.
    #[must_use]
    pub fn network(context: impl Into<String>) -> Self {
        Self::Network {
            context: context.into(),
        }
    }

    /// Create an `InvalidAddress` error.
    #[must_use]
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
        }
    }

    /// Create an `Rpc` error.
    #[must_use]
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc {
            message: message.into(),
        }
    }

    /// Create a `Parse` error.
    #[must_use]
    pub fn parse(context: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
        }
    }

    /// Create an `UnsupportedChain` error.
    #[must_use]
    pub fn unsupported_chain(chain: impl Into<String>) -> Self {
        Self::UnsupportedChain {
            chain: chain.into(),
        }
    }
}

// ============================================================================
// SimulationError
// ============================================================================

/// Errors that abort a transaction dry-run.
///
/// Note the distinction from a *failed simulation*: insufficient funds is a
/// successful dry-run with `success == false`, while these variants mean the
/// dry-run could not be carried out at all.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// A balance or value string could not be parsed as a non-negative
    /// arbitrary-precision integer. Never silently defaulted to zero.
    #[error("invalid amount: {context}")]
    InvalidAmount {
        /// The input that failed to parse.
        context: String,
    },

    /// The chain provider failed while fetching balance state.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl SimulationError {
    /// Create an `InvalidAmount` error.
    #[must_use]
    pub fn invalid_amount(context: impl Into<String>) -> Self {
        Self::InvalidAmount {
            context: context.into(),
        }
    }
}

// ============================================================================
// SignError
// ============================================================================

/// Errors that can occur during signing operations.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// Key material could not be obtained from custody.
    ///
    /// Wraps the custody failure so callers can still distinguish a gate
    /// denial from a missing key.
    #[error("key unavailable: {0}")]
    KeyUnavailable(#[from] CustodyError),

    /// The transaction could not be canonically serialized.
    #[error("serialization failed: {context}")]
    Serialization {
        /// Context about the field that failed to serialize.
        context: String,
    },

    /// The key bytes are not valid for the selected curve.
    #[error("invalid key material for curve")]
    InvalidKey,

    /// The chain has no signing scheme registered.
    #[error("no signing scheme for chain: {chain}")]
    UnsupportedChain {
        /// The chain identifier.
        chain: String,
    },

    /// The cryptographic signing primitive failed.
    #[error("signature failed: {context}")]
    SignatureFailed {
        /// Context about the primitive failure.
        context: String,
    },
}

impl SignError {
    /// Create a `Serialization` error.
    #[must_use]
    pub fn serialization(context: impl Into<String>) -> Self {
        Self::Serialization {
            context: context.into(),
        }
    }

    /// Create a `SignatureFailed` error.
    #[must_use]
    pub fn signature_failed(context: impl Into<String>) -> Self {
        Self::SignatureFailed {
            context: context.into(),
        }
    }
}

// ============================================================================
// RecoveryError
// ============================================================================

/// Errors that can occur while splitting or reconstructing a secret.
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    /// The requested threshold is not supported by the strategy.
    ///
    /// The all-or-nothing XOR scheme only supports `threshold == total`.
    #[error("invalid threshold: {threshold} of {total}")]
    InvalidThreshold {
        /// Requested total number of shares.
        total: u32,
        /// Requested reconstruction threshold.
        threshold: u32,
    },

    /// The supplied share set is incomplete or internally inconsistent.
    #[error("invalid shares: {context}")]
    InvalidShares {
        /// What made the share set unusable.
        context: String,
    },

    /// Shares combined cleanly but the result does not decode as the
    /// expected secret encoding.
    #[error("reconstruction failed: {context}")]
    ReconstructionFailed {
        /// Context about the decode failure.
        context: String,
    },
}

impl RecoveryError {
    /// Create an `InvalidShares` error.
    #[must_use]
    pub fn invalid_shares(context: impl Into<String>) -> Self {
        Self::InvalidShares {
            context: context.into(),
        }
    }

    /// Create a `ReconstructionFailed` error.
    #[must_use]
    pub fn reconstruction_failed(context: impl Into<String>) -> Self {
        Self::ReconstructionFailed {
            context: context.into(),
        }
    }
}

// ============================================================================
// ConfigError
// ============================================================================

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O failed while reading or writing the config.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML or has the wrong shape.
    #[error("config parse error: {context}")]
    Parse {
        /// Parser diagnostic.
        context: String,
    },

    /// A config value failed validation.
    #[error("invalid config value for {field}: {context}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        context: String,
    },

    /// The home directory could not be determined for `~` expansion.
    #[error("could not determine home directory")]
    HomeDirNotFound,
}

impl ConfigError {
    /// Create a `Parse` error.
    #[must_use]
    pub fn parse(context: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
        }
    }

    /// Create an `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            context: context.into(),
        }
    }
}

// ============================================================================
// WalletError
// ============================================================================

/// Top-level error type for the wallet core.
///
/// Wraps all domain errors and adds the orchestrator's own invariant
/// failures. Use [`WalletError::user_message`] for text shown to a person;
/// the `Display` form carries technical detail and belongs in logs.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Chain provider failure.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Key custody failure.
    #[error("custody error: {0}")]
    Custody(#[from] CustodyError),

    /// Simulation could not be carried out.
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),

    /// Signing failure.
    #[error("sign error: {0}")]
    Sign(#[from] SignError),

    /// Recovery failure.
    #[error("recovery error: {0}")]
    Recovery(#[from] RecoveryError),

    /// Configuration failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A command that requires an active account was issued before
    /// `load_account`.
    #[error("no active account")]
    NoActiveAccount,

    /// `confirm_transaction` was called without a matching successful
    /// preparation. Programming error given correct UI sequencing.
    #[error("Cannot confirm: Simulation failed or not run")]
    ConfirmWithoutPrepare,
}

impl WalletError {
    /// A sanitized, non-technical message suitable for end users.
    ///
    /// Raw error detail stays in the `Display`/`Debug` forms for logging.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Chain(ChainError::Network { .. }) => {
                "Network unavailable. Check your connection and try again.".to_string()
            }
            Self::Chain(ChainError::InvalidAddress { .. }) => {
                "That address doesn't look right.".to_string()
            }
            Self::Chain(ChainError::UnsupportedChain { chain }) => {
                format!("The {chain} network is not supported.")
            }
            Self::Chain(_) => "The network request failed. Please try again.".to_string(),
            Self::Custody(e) | Self::Sign(SignError::KeyUnavailable(e))
                if e.is_authorization() =>
            {
                "Authentication required.".to_string()
            }
            Self::Custody(_) | Self::Sign(_) => {
                "The transaction could not be signed.".to_string()
            }
            Self::Simulation(SimulationError::InvalidAmount { .. }) => {
                "That amount doesn't look right.".to_string()
            }
            Self::Simulation(_) => "The transfer could not be checked.".to_string(),
            Self::Recovery(_) => "Recovery failed. Check your backup shares.".to_string(),
            Self::Config(_) => "The wallet is misconfigured.".to_string(),
            Self::NoActiveAccount => "Load an account first.".to_string(),
            Self::ConfirmWithoutPrepare => {
                "Cannot confirm: Simulation failed or not run".to_string()
            }
        }
    }

    /// Returns `true` if the failure should prompt re-authentication.
    #[must_use]
    pub const fn is_authorization(&self) -> bool {
        match self {
            Self::Custody(e) | Self::Sign(SignError::KeyUnavailable(e)) => e.is_authorization(),
            _ => false,
        }
    }
}

/// Convenience result alias for wallet-core operations.
pub type Result<T, E = WalletError> = std::result::Result<T, E>;

// ============================================================================
// Tests
// ============================================================================
