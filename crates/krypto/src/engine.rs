//! Engine-Trait fuer asymmetrische Verschluesselung
//!
//! Die Services arbeiten ausschliesslich gegen dieses Trait. Produktiv
//! steht dahinter die `GpgEngine`, in Tests die `SpeicherEngine`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::KryptoResult;

/// Metadaten eines importierten oeffentlichen Schluessels
#[derive(Debug, Clone, PartialEq)]
pub struct SchluesselInfo {
    /// Hex-Fingerprint des Primaerschluessels
    pub fingerprint: String,
    /// E-Mail-Adresse aus der ersten UID
    pub email: String,
    /// Name aus der ersten UID
    pub name: String,
    /// Kommentar aus der ersten UID (leer wenn nicht vorhanden)
    pub kommentar: String,
    /// Ablaufdatum des Schluessels, falls gesetzt
    pub ablauf: Option<DateTime<Utc>>,
}

/// Asymmetrische Verschluesselung gegen registrierte oeffentliche Schluessel
#[async_trait]
pub trait KryptoEngine: Send + Sync {
    /// Verschluesselt Klartext fuer genau einen Empfaenger-Fingerprint.
    /// Liefert ASCII-armierten Geheimtext.
    async fn verschluesseln(&self, fingerprint: &str, klartext: &[u8]) -> KryptoResult<String>;

    /// Entschluesselt ASCII-armierten Geheimtext mit einem lokal
    /// vorhandenen privaten Schluessel.
    async fn entschluesseln(&self, geheimtext: &str) -> KryptoResult<Vec<u8>>;

    /// Importiert einen oeffentlichen Schluessel in den Schluesselbund
    /// und liefert die extrahierten Metadaten.
    async fn schluessel_importieren(&self, key_material: &str) -> KryptoResult<SchluesselInfo>;
}
