//! Gemeinsame Identifikationstypen fuer Tresor
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Benutzer-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenutzerId(pub Uuid);

impl BenutzerId {
    /// Erstellt eine neue zufaellige BenutzerId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for BenutzerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BenutzerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "benutzer:{}", self.0)
    }
}

/// Eindeutige ID eines oeffentlichen Schluessels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchluesselId(pub Uuid);

impl SchluesselId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for SchluesselId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SchluesselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "schluessel:{}", self.0)
    }
}

/// Eindeutige Projekt-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjektId(pub Uuid);

impl ProjektId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ProjektId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjektId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "projekt:{}", self.0)
    }
}

/// Eindeutige ID einer Projekt-Mitgliedschaft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MitgliedId(pub Uuid);

impl MitgliedId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for MitgliedId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MitgliedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mitglied:{}", self.0)
    }
}

/// Eindeutige ID eines benannten Projekt-Secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(pub Uuid);

impl CredentialId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "credential:{}", self.0)
    }
}

/// Eindeutige ID einer verschluesselten Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NachrichtId(pub Uuid);

impl NachrichtId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for NachrichtId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NachrichtId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nachricht:{}", self.0)
    }
}

/// Fingerprint eines oeffentlichen Schluessels
///
/// Adressiert Verbindungen und Nachrichten-Empfaenger. Der Wert kommt
/// als opakes Hex-Artefakt aus der Krypto-Engine und wird nur verglichen,
/// nie interpretiert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn neu(wert: impl Into<String>) -> Self {
        Self(wert.into())
    }

    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kanonisiert eine E-Mail-Adresse fuer Vergleiche und Persistenz
///
/// Benutzer werden ueber die E-Mail zusammengefuehrt; damit
/// `Alice@Example.org` und ` alice@example.org ` denselben Benutzer
/// treffen, wird vor jedem Lookup und jedem Insert getrimmt und
/// kleingeschrieben.
pub fn email_normalisieren(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Zugriffsstufe eines Projekt-Mitglieds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZugriffsStufe {
    Admin,
    Schreiben,
    Lesen,
}

impl ZugriffsStufe {
    /// Stabiler String fuer Persistenz und Wire-Format
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Schreiben => "write",
            Self::Lesen => "read",
        }
    }

    /// Darf diese Stufe Projekt-Mitglieder und Credentials mutieren?
    pub fn ist_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::str::FromStr for ZugriffsStufe {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "write" => Ok(Self::Schreiben),
            "read" => Ok(Self::Lesen),
            other => Err(format!("Unbekannte Zugriffsstufe: {other}")),
        }
    }
}

impl std::fmt::Display for ZugriffsStufe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.als_str())
    }
}

/// Art des verbundenen Clients
///
/// Interaktive Browser-Clients bekommen reich gerenderte Push-Artefakte,
/// duerfen aber keine Projekt-Operationen ausfuehren. Headless-CLI-Clients
/// bekommen kompakten Text und den vollen Operations-Wortschatz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KlientArt {
    Interaktiv,
    Cli,
}

impl KlientArt {
    pub fn ist_cli(&self) -> bool {
        matches!(self, Self::Cli)
    }
}
