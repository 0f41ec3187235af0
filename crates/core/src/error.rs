//! Fehlertypen fuer Tresor
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule koennen eigene Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Tresor
pub type Result<T> = std::result::Result<T, TresorError>;

/// Alle moeglichen Fehler im Tresor-System
#[derive(Debug, Error)]
pub enum TresorError {
    // --- Eingabe & Autorisierung ---
    #[error("Ungueltige Eingabe: {0}")]
    Validierung(String),

    #[error("Zugriff verweigert: {0}")]
    ZugriffVerweigert(String),

    // --- Ressourcen ---
    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Schluessel {fingerprint} gehoert bereits einem anderen Benutzer")]
    SchluesselBenutzerKonflikt { fingerprint: String },

    // --- Krypto ---
    #[error("Krypto-Fehler: {0}")]
    Krypto(String),

    // --- Verbindung & Netzwerk ---
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl TresorError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Erstellt einen Validierungsfehler
    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler vor jedem Seiteneffekt abgelehnt wurde
    pub fn ist_ablehnung(&self) -> bool {
        matches!(
            self,
            Self::Validierung(_) | Self::ZugriffVerweigert(_) | Self::NichtGefunden(_)
        )
    }
}
