//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum KryptoError {
    #[error("GPG-Prozess konnte nicht gestartet werden: {0}")]
    ProzessStart(String),

    #[error("GPG-Aufruf fehlgeschlagen (Exit-Code {code}): {stderr}")]
    GpgFehlgeschlagen { code: i32, stderr: String },

    #[error("Schluessel-Import fehlgeschlagen: {0}")]
    SchluesselImport(String),

    #[error("Kein Schluessel fuer Fingerprint {fingerprint}")]
    UnbekannterSchluessel { fingerprint: String },

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Ungueltige Schluessel-Metadaten: {0}")]
    UngueltigeDaten(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type KryptoResult<T> = Result<T, KryptoError>;

impl From<KryptoError> for tresor_core::TresorError {
    fn from(e: KryptoError) -> Self {
        tresor_core::TresorError::Krypto(e.to_string())
    }
}
