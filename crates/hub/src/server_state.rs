//! Gemeinsamer Zustand des Hub-Servers
//!
//! Haelt die Fachlogik-Services und das Hub-Handle als Arc-Referenzen,
//! die sicher zwischen Verbindungs-Tasks geteilt werden.

use std::sync::Arc;
use std::time::Instant;

use tresor_db::models::BenutzerRecord;
use tresor_db::{
    BenutzerRepository, CredentialRepository, NachrichtenRepository, ProjektRepository,
    SchluesselRepository,
};
use tresor_krypto::KryptoEngine;
use tresor_protocol::control::{AktivierungsArtefakt, NachrichtArtefakt};
use tresor_verteilung::{
    AktivierungsErgebnis, CredentialService, IdentitaetsService, NachrichtenService,
    ProjektService, VersandErgebnis, VerteilungResult,
};

use crate::hub::VerbindungsHub;

/// Konfiguration fuer den Hub-Server
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Zeitfenster fuer den Hallo-Frame nach dem TCP-Connect
    pub handshake_timeout_sek: u64,
    /// Maximale gleichzeitige Clients
    pub max_klienten: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
            handshake_timeout_sek: 10,
            max_klienten: 512,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct HubState<D, K>
where
    D: BenutzerRepository
        + SchluesselRepository
        + NachrichtenRepository
        + ProjektRepository
        + CredentialRepository
        + 'static,
    K: KryptoEngine + 'static,
{
    /// Server-Konfiguration
    pub config: Arc<HubConfig>,
    /// Schluessel-Import, Aktivierung, Anmeldung
    pub identitaet: Arc<IdentitaetsService<D, K>>,
    /// Projekte und Mitgliedschaften
    pub projekte: Arc<ProjektService<D>>,
    /// Credentials mit Fan-out-Verschluesselung
    pub credentials: Arc<CredentialService<D, K>>,
    /// Benutzer-Nachrichten
    pub nachrichten: Arc<NachrichtenService<D, K>>,
    /// Live-Registry der verbundenen Fingerprints
    pub hub: VerbindungsHub,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl<D, K> HubState<D, K>
where
    D: BenutzerRepository
        + SchluesselRepository
        + NachrichtenRepository
        + ProjektRepository
        + CredentialRepository
        + 'static,
    K: KryptoEngine + 'static,
{
    /// Erstellt einen neuen HubState samt aller Services
    pub fn neu(config: HubConfig, db: Arc<D>, engine: Arc<K>, hub: VerbindungsHub) -> Arc<Self> {
        let identitaet = IdentitaetsService::neu(Arc::clone(&db), Arc::clone(&engine));
        let projekte = ProjektService::neu(Arc::clone(&db));
        let credentials =
            CredentialService::neu(Arc::clone(&db), Arc::clone(&engine), Arc::clone(&projekte));
        let nachrichten = NachrichtenService::neu(db, engine);

        Arc::new(Self {
            config: Arc::new(config),
            identitaet,
            projekte,
            credentials,
            nachrichten,
            hub,
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Versendet eine Nachricht und stoesst die Live-Zustellung an die
    /// gerade verbundenen Empfaenger-Schluessel an. Persistenz zuerst;
    /// fuer nicht verbundene Schluessel liegt die Nachricht im Postfach.
    pub async fn nachricht_senden_und_verteilen(
        &self,
        absender: &BenutzerRecord,
        empfaenger_email: &str,
        betreff: &str,
        klartext: &[u8],
    ) -> VerteilungResult<VersandErgebnis> {
        let ergebnis = self
            .nachrichten
            .nachricht_senden(absender.id, empfaenger_email, betreff, klartext)
            .await?;

        let zustellungen: Vec<(String, NachrichtArtefakt)> = ergebnis
            .zustellungen
            .iter()
            .map(|z| {
                (
                    z.fingerprint.clone(),
                    NachrichtArtefakt {
                        betreff: z.nachricht.betreff.clone(),
                        geheimtext: z.nachricht.geheimtext.clone(),
                        absender_name: absender.name.clone(),
                        absender_email: absender.email.clone(),
                    },
                )
            })
            .collect();
        self.hub.nachrichten_verteilen(zustellungen).await;

        Ok(ergebnis)
    }

    /// Aktiviert einen Schluessel; nur die allererste Aktivierung wird
    /// hub-weit gemeldet.
    pub async fn schluessel_aktivieren_und_melden(
        &self,
        fingerprint: &str,
    ) -> VerteilungResult<AktivierungsErgebnis> {
        let ergebnis = self.identitaet.schluessel_aktivieren(fingerprint).await?;

        if ergebnis.erstmalig {
            self.hub
                .aktivierung_verbreiten(AktivierungsArtefakt {
                    fingerprint: ergebnis.fingerprint.clone(),
                    email: ergebnis.email.clone(),
                    name: ergebnis.name.clone(),
                })
                .await;
        }

        Ok(ergebnis)
    }
}
