use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in OtpVault.
#[derive(Debug, Error)]
pub enum OtpVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Authentication failed — wrong password or tampered vault data")]
    Authentication,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault lifecycle errors ---
    #[error("Vault not installed at {0} (run `otpvault install` first)")]
    NotInstalled(PathBuf),

    #[error("Vault already installed at {0} (use `clean-install` to reset it)")]
    AlreadyInstalled(PathBuf),

    #[error("Vault at {0} is busy — another otpvault process holds the lock")]
    VaultBusy(PathBuf),

    #[error("Corrupt vault data: {0}")]
    CorruptStore(String),

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("This operation is destructive and requires explicit confirmation (--force)")]
    ConfirmationRequired,

    // --- Record errors ---
    #[error("A token for '{issuer}' / '{account}' with the same secret and type already exists")]
    DuplicateRecord { issuer: String, account: String },

    #[error("Token {0} not found")]
    NotFound(u64),

    #[error("Invalid token type: {0}")]
    InvalidKind(String),

    #[error("Invalid secret: {0}")]
    InvalidSecret(String),

    // --- Interchange errors ---
    #[error("Unsupported format '{0}' — use 'json', 'csv' or 'uri'")]
    UnsupportedFormat(String),

    #[error("Parse error in entry {entry}: {message}")]
    Parse { entry: usize, message: String },

    // --- Collaborator errors ---
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("QR encoding failed: {0}")]
    QrEncode(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for OtpVault results.
pub type Result<T> = std::result::Result<T, OtpVaultError>;
