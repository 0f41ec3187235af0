//! Control-Protokoll fuer die persistente Client-Verbindung
//!
//! Definiert alle Nachrichten die zwischen Client und Server ueber die
//! bidirektionale Verbindung ausgetauscht werden.
//!
//! ## Design
//! - Request/Response Pattern: jede Nachricht hat eine `request_id: u32`
//! - JSON-Serialisierung via serde (nicht zeitkritisch)
//! - Tagged Enums fuer typsichere Nachrichtentypen
//! - Pro Erfolgs-Antwort ist genau eine Nutzlast-Variante belegt,
//!   bestimmt durch den ausloesenden Befehl

use serde::{Deserialize, Serialize};
use tresor_core::types::{BenutzerId, KlientArt, ProjektId, ZugriffsStufe};

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// Erster Frame jeder Verbindung: identifiziert den Schluessel des Clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalloAnfrage {
    /// Fingerprint des aktiven oeffentlichen Schluessels
    pub fingerprint: String,
    /// Interaktiver Browser oder Headless-CLI
    pub klient_art: KlientArt,
}

/// Bestaetigung des Handshakes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalloAntwort {
    pub benutzer_id: BenutzerId,
    pub name: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Projekt-Operationen
// ---------------------------------------------------------------------------

/// Befehls-Wortschatz fuer Projekt-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjektBefehl {
    List,
    Create,
    Update,
    Delete,
    AddMember,
    DeleteMember,
    ListCredentials,
    GetCredential,
    AddCredential,
    DeleteCredential,
}

/// Eine Projekt-Operation vom Headless-Client
///
/// Welche Felder belegt sein muessen haengt vom Befehl ab; der Dispatcher
/// validiert vor jedem Seiteneffekt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjektOperation {
    pub befehl: Option<ProjektBefehl>,
    pub projekt_id: Option<ProjektId>,
    pub name: Option<String>,
    pub umgebung: Option<String>,
    pub mitglied_email: Option<String>,
    pub mitglied_id: Option<BenutzerId>,
    pub zugriff: Option<ZugriffsStufe>,
    pub schluessel: Option<String>,
    pub wert: Option<String>,
}

// ---------------------------------------------------------------------------
// Antworten
// ---------------------------------------------------------------------------

/// Status einer Operations-Antwort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AntwortStatus {
    Erfolg,
    Fehler,
}

/// Projekt-Daten im Wire-Format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjektInfo {
    pub projekt_id: ProjektId,
    pub name: String,
    pub umgebung: String,
    pub standard_zugriff: ZugriffsStufe,
}

/// Credential-Daten im Wire-Format
///
/// `geheimtext` ist nur bei `GetCredential` belegt; Listen liefern
/// ausschliesslich die Existenz des benannten Secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialInfo {
    pub name: String,
    pub geheimtext: Option<String>,
    pub laeuft_ab: Option<String>,
}

/// Nutzlast einer erfolgreichen Operations-Antwort
///
/// Genau eine Variante pro Antwort, passend zum ausloesenden Befehl.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AntwortNutzlast {
    Projekt(ProjektInfo),
    ProjektListe(Vec<ProjektInfo>),
    Credential(CredentialInfo),
    CredentialListe(Vec<CredentialInfo>),
}

/// Antwort auf eine Projekt-Operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationsAntwort {
    pub status: AntwortStatus,
    pub info: Option<String>,
    pub fehler: Option<String>,
    pub nutzlast: Option<AntwortNutzlast>,
}

impl OperationsAntwort {
    /// Erfolgs-Antwort mit Nutzlast
    pub fn erfolg(info: impl Into<String>, nutzlast: Option<AntwortNutzlast>) -> Self {
        Self {
            status: AntwortStatus::Erfolg,
            info: Some(info.into()),
            fehler: None,
            nutzlast,
        }
    }

    /// Fehler-Antwort ohne Nutzlast
    pub fn fehlgeschlagen(fehler: impl Into<String>) -> Self {
        Self {
            status: AntwortStatus::Fehler,
            info: None,
            fehler: Some(fehler.into()),
            nutzlast: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Push-Artefakte
// ---------------------------------------------------------------------------

/// Frisch erzeugter Geheimtext fuer einen verbundenen Schluessel-Inhaber
///
/// Wird pro Empfaenger-Schluessel unabhaengig verschluesselt; kein
/// Empfaenger kann die Kopie eines anderen entschluesseln.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NachrichtArtefakt {
    pub betreff: String,
    pub geheimtext: String,
    pub absender_name: String,
    pub absender_email: String,
}

impl NachrichtArtefakt {
    /// Kompakte Text-Darstellung fuer Headless-Clients
    pub fn kompakt(&self) -> String {
        format!(
            "[{}] von {} <{}>\n{}",
            self.betreff, self.absender_name, self.absender_email, self.geheimtext
        )
    }
}

/// Hub-weites Ereignis: ein Schluessel wurde erstmals aktiviert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AktivierungsArtefakt {
    pub fingerprint: String,
    pub email: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Server -> Client oder Client -> Server)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingNachricht {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt den Timestamp zurueck)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongNachricht {
    pub echo_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: Rahmen
// ---------------------------------------------------------------------------

/// Alle moeglichen Frame-Inhalte (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RahmenInhalt {
    // Handshake
    Hallo(HalloAnfrage),
    HalloAntwort(HalloAntwort),

    // Operationen
    Operation(ProjektOperation),
    Antwort(OperationsAntwort),

    // Push-Artefakte (Server -> Client)
    Nachricht(NachrichtArtefakt),
    NachrichtKompakt { text: String },
    Aktivierung(AktivierungsArtefakt),

    // Keepalive
    Ping(PingNachricht),
    Pong(PongNachricht),
}

/// Protokoll-Nachricht mit Request/Response-Zuordnung
///
/// Jede Nachricht traegt eine `request_id` die der Client vergibt.
/// Der Server kopiert die ID in die Antwort; Push-Artefakte tragen die
/// request_id 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rahmen {
    pub request_id: u32,
    pub inhalt: RahmenInhalt,
}

impl Rahmen {
    /// Erstellt einen neuen Rahmen
    pub fn new(request_id: u32, inhalt: RahmenInhalt) -> Self {
        Self { request_id, inhalt }
    }

    /// Erstellt einen Ping-Rahmen
    pub fn ping(request_id: u32, timestamp_ms: u64) -> Self {
        Self::new(request_id, RahmenInhalt::Ping(PingNachricht { timestamp_ms }))
    }

    /// Erstellt einen Pong-Rahmen
    pub fn pong(request_id: u32, echo_timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            RahmenInhalt::Pong(PongNachricht { echo_timestamp_ms }),
        )
    }

    /// Erstellt eine Fehler-Antwort
    pub fn fehler(request_id: u32, nachricht: impl Into<String>) -> Self {
        Self::new(
            request_id,
            RahmenInhalt::Antwort(OperationsAntwort::fehlgeschlagen(nachricht)),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
