//! Fehlertypen fuer den Verbindungs-Hub

use thiserror::Error;

/// Fehlertyp fuer Verbindungsaufbau und -betrieb
#[derive(Debug, Error)]
pub enum HubError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Handshake fehlgeschlagen (Timeout, unbekannter oder inaktiver Schluessel)
    #[error("Handshake fehlgeschlagen: {0}")]
    Handshake(String),

    /// Protokollfehler (unerwarteter Frame)
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    /// Verbindung wurde getrennt
    #[error("Verbindung getrennt")]
    VerbindungGetrennt,
}

/// Result-Typ fuer den Verbindungs-Hub
pub type HubResult<T> = Result<T, HubError>;
