//! Datenbank-Records und Eingabe-Strukturen
//!
//! Records spiegeln die Tabellen 1:1 wider. `Neue*`-Strukturen tragen
//! die Pflichtfelder fuer INSERTs, `*Update`-Strukturen nur die Felder
//! die sich aendern sollen (None = unveraendert).

use chrono::{DateTime, Utc};
use tresor_core::ZugriffsStufe;
use uuid::Uuid;

// --- Benutzer ---

/// Ein Benutzer-Datensatz aus der `users`-Tabelle
#[derive(Debug, Clone, PartialEq)]
pub struct BenutzerRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub kommentar: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Eingabedaten fuer einen neuen Benutzer
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub kommentar: &'a str,
}

/// Teilaktualisierung eines Benutzers
#[derive(Debug, Clone, Default)]
pub struct BenutzerUpdate {
    pub name: Option<String>,
    pub kommentar: Option<String>,
}

// --- Oeffentliche Schluessel ---

/// Ein Schluessel-Datensatz aus der `public_keys`-Tabelle
///
/// `activated_at` ist None solange der Schluessel noch nicht freigeschaltet
/// wurde. Die Aktivierung ist eine Einbahnstrasse: einmal gesetzt wird der
/// Zeitstempel nie wieder geloescht.
#[derive(Debug, Clone, PartialEq)]
pub struct SchluesselRecord {
    pub id: Uuid,
    pub benutzer_id: Uuid,
    pub fingerprint: String,
    pub key_material: String,
    pub activated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SchluesselRecord {
    /// Gibt true zurueck wenn der Schluessel aktiviert ist
    pub fn ist_aktiv(&self) -> bool {
        self.activated_at.is_some()
    }
}

/// Eingabedaten fuer einen neuen Schluessel
#[derive(Debug, Clone)]
pub struct NeuerSchluessel<'a> {
    pub benutzer_id: Uuid,
    pub fingerprint: &'a str,
    pub key_material: &'a str,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Teilaktualisierung eines Schluessels
#[derive(Debug, Clone, Default)]
pub struct SchluesselUpdate {
    pub key_material: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

// --- Verschluesselte Nachrichten ---

/// Eine persistierte, bereits verschluesselte Nachricht
#[derive(Debug, Clone, PartialEq)]
pub struct NachrichtRecord {
    pub id: Uuid,
    pub schluessel_id: Uuid,
    pub absender_id: Uuid,
    pub betreff: String,
    pub geheimtext: String,
    pub created_at: DateTime<Utc>,
}

/// Eingabedaten fuer eine neue Nachricht
#[derive(Debug, Clone)]
pub struct NeueNachricht<'a> {
    pub schluessel_id: Uuid,
    pub absender_id: Uuid,
    pub betreff: &'a str,
    pub geheimtext: &'a str,
}

// --- Projekte & Mitglieder ---

/// Ein Projekt-Datensatz
#[derive(Debug, Clone, PartialEq)]
pub struct ProjektRecord {
    pub id: Uuid,
    pub name: String,
    pub umgebung: String,
    /// Zugriffsstufe fuer neue Mitglieder ohne explizite Angabe
    pub standard_zugriff: ZugriffsStufe,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Eingabedaten fuer ein neues Projekt
#[derive(Debug, Clone)]
pub struct NeuesProjekt<'a> {
    pub name: &'a str,
    pub umgebung: &'a str,
    pub standard_zugriff: ZugriffsStufe,
}

/// Teilaktualisierung eines Projekts
#[derive(Debug, Clone, Default)]
pub struct ProjektUpdate {
    pub name: Option<String>,
    pub umgebung: Option<String>,
    pub standard_zugriff: Option<ZugriffsStufe>,
}

/// Eine Projekt-Mitgliedschaft mit Zugriffsstufe
#[derive(Debug, Clone, PartialEq)]
pub struct MitgliedRecord {
    pub id: Uuid,
    pub projekt_id: Uuid,
    pub benutzer_id: Uuid,
    pub zugriff: ZugriffsStufe,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Eingabedaten fuer eine Mitgliedschaft (Upsert-Semantik)
#[derive(Debug, Clone)]
pub struct NeuesMitglied {
    pub projekt_id: Uuid,
    pub benutzer_id: Uuid,
    pub zugriff: ZugriffsStufe,
}

// --- Credentials ---

/// Ein Credential-Schluesselname innerhalb eines Projekts
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialKeyRecord {
    pub id: Uuid,
    pub projekt_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ein pro Empfaenger-Schluessel verschluesselter Credential-Wert
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialWertRecord {
    pub id: Uuid,
    pub credential_id: Uuid,
    pub mitglied_id: Uuid,
    pub schluessel_id: Uuid,
    pub geheimtext: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Eingabedaten fuer einen Credential-Wert (Upsert pro Schluessel)
#[derive(Debug, Clone)]
pub struct NeuerCredentialWert<'a> {
    pub credential_id: Uuid,
    pub mitglied_id: Uuid,
    pub schluessel_id: Uuid,
    pub geheimtext: &'a str,
    pub expires_at: Option<DateTime<Utc>>,
}
