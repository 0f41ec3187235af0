//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Die Services arbeiten ausschliesslich gegen
//! diese Traits; `SqliteDb` liefert die produktive Implementierung.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{
    BenutzerRecord, BenutzerUpdate, CredentialKeyRecord, CredentialWertRecord, MitgliedRecord,
    NachrichtRecord, NeueNachricht, NeuerBenutzer, NeuerCredentialWert, NeuerSchluessel,
    NeuesMitglied, NeuesProjekt, ProjektRecord, ProjektUpdate, SchluesselRecord, SchluesselUpdate,
};

/// Result-Alias fuer alle Repository-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://tresor.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://tresor.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Benutzer-Datenzugriffe
#[async_trait]
pub trait BenutzerRepository: Send + Sync {
    /// Einen neuen Benutzer anlegen
    async fn benutzer_erstellen(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Einen Benutzer anhand seiner ID laden
    async fn benutzer_nach_id(&self, id: Uuid) -> DbResult<Option<BenutzerRecord>>;

    /// Einen Benutzer anhand seiner E-Mail-Adresse laden
    async fn benutzer_nach_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Einen Benutzer teilweise aktualisieren
    async fn benutzer_aktualisieren(
        &self,
        id: Uuid,
        data: BenutzerUpdate,
    ) -> DbResult<BenutzerRecord>;
}

/// Repository fuer oeffentliche Schluessel
#[async_trait]
pub trait SchluesselRepository: Send + Sync {
    /// Einen neuen Schluessel anlegen (inaktiv)
    async fn schluessel_erstellen(&self, data: NeuerSchluessel<'_>) -> DbResult<SchluesselRecord>;

    /// Einen Schluessel anhand seiner ID laden
    async fn schluessel_nach_id(&self, id: Uuid) -> DbResult<Option<SchluesselRecord>>;

    /// Einen Schluessel anhand seines Fingerprints laden
    async fn schluessel_nach_fingerprint(
        &self,
        fingerprint: &str,
    ) -> DbResult<Option<SchluesselRecord>>;

    /// Einen Schluessel teilweise aktualisieren
    async fn schluessel_aktualisieren(
        &self,
        id: Uuid,
        data: SchluesselUpdate,
    ) -> DbResult<SchluesselRecord>;

    /// Einen Schluessel aktivieren (Einbahnstrasse)
    ///
    /// Gibt true zurueck wenn dies die erste Aktivierung war, false wenn
    /// der Schluessel bereits aktiv war.
    async fn schluessel_aktivieren(&self, id: Uuid, zeitpunkt: DateTime<Utc>) -> DbResult<bool>;

    /// Alle aktiven Schluessel eines Benutzers laden
    async fn aktive_schluessel_fuer_benutzer(
        &self,
        benutzer_id: Uuid,
    ) -> DbResult<Vec<SchluesselRecord>>;
}

/// Repository fuer verschluesselte Nachrichten
#[async_trait]
pub trait NachrichtenRepository: Send + Sync {
    /// Eine verschluesselte Nachricht persistieren
    async fn nachricht_erstellen(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord>;

    /// Nachrichten fuer einen Schluessel laden, neueste zuerst
    async fn nachrichten_fuer_schluessel(
        &self,
        schluessel_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<NachrichtRecord>>;
}

/// Repository fuer Projekte und Mitgliedschaften
#[async_trait]
pub trait ProjektRepository: Send + Sync {
    /// Ein neues Projekt anlegen
    async fn projekt_erstellen(&self, data: NeuesProjekt<'_>) -> DbResult<ProjektRecord>;

    /// Ein Projekt anhand seiner ID laden
    async fn projekt_nach_id(&self, id: Uuid) -> DbResult<Option<ProjektRecord>>;

    /// Ein Projekt teilweise aktualisieren
    async fn projekt_aktualisieren(&self, id: Uuid, data: ProjektUpdate)
        -> DbResult<ProjektRecord>;

    /// Ein Projekt samt Mitgliedern und Credentials loeschen
    async fn projekt_loeschen(&self, id: Uuid) -> DbResult<bool>;

    /// Alle Projekte laden in denen der Benutzer Mitglied ist
    async fn projekte_fuer_benutzer(&self, benutzer_id: Uuid) -> DbResult<Vec<ProjektRecord>>;

    /// Eine Mitgliedschaft anlegen oder die Zugriffsstufe aktualisieren
    async fn mitglied_setzen(&self, data: NeuesMitglied) -> DbResult<MitgliedRecord>;

    /// Die Mitgliedschaft eines Benutzers in einem Projekt laden
    async fn mitglied_nach_benutzer(
        &self,
        projekt_id: Uuid,
        benutzer_id: Uuid,
    ) -> DbResult<Option<MitgliedRecord>>;

    /// Alle Mitglieder eines Projekts laden
    async fn mitglieder_fuer_projekt(&self, projekt_id: Uuid) -> DbResult<Vec<MitgliedRecord>>;

    /// Eine Mitgliedschaft entfernen
    async fn mitglied_loeschen(&self, projekt_id: Uuid, benutzer_id: Uuid) -> DbResult<bool>;
}

/// Repository fuer Credential-Namen und ihre verschluesselten Werte
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Einen Credential-Namen in einem Projekt anlegen
    async fn credential_key_erstellen(
        &self,
        projekt_id: Uuid,
        name: &str,
    ) -> DbResult<CredentialKeyRecord>;

    /// Einen Credential-Namen innerhalb eines Projekts nachschlagen
    async fn credential_key_nach_name(
        &self,
        projekt_id: Uuid,
        name: &str,
    ) -> DbResult<Option<CredentialKeyRecord>>;

    /// Alle Credential-Namen eines Projekts laden
    async fn credential_keys_fuer_projekt(
        &self,
        projekt_id: Uuid,
    ) -> DbResult<Vec<CredentialKeyRecord>>;

    /// Einen Credential-Namen loeschen (Werte zuerst)
    async fn credential_key_loeschen(&self, id: Uuid) -> DbResult<bool>;

    /// Einen Wert fuer (Credential, Schluessel) setzen oder ueberschreiben
    async fn credential_wert_setzen(
        &self,
        data: NeuerCredentialWert<'_>,
    ) -> DbResult<CredentialWertRecord>;

    /// Den Wert fuer einen bestimmten Empfaenger-Schluessel laden
    async fn credential_wert_fuer_schluessel(
        &self,
        credential_id: Uuid,
        schluessel_id: Uuid,
    ) -> DbResult<Option<CredentialWertRecord>>;

    /// Alle Werte eines Credentials laden
    async fn credential_werte(&self, credential_id: Uuid) -> DbResult<Vec<CredentialWertRecord>>;

    /// Alle Werte eines Credentials loeschen, gibt die Anzahl zurueck
    async fn credential_werte_loeschen(&self, credential_id: Uuid) -> DbResult<u64>;
}
