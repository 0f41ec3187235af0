//! Operations-Dispatcher – fuehrt Projekt-Operationen der CLI-Clients aus
//!
//! Der Dispatcher empfaengt Rahmen von einer KlientVerbindung, prueft
//! die Client-Art und uebersetzt `ProjektOperation`-Frames in Aufrufe
//! der Fachlogik-Services. Jede Autorisierung wird pro Aufruf frisch
//! in den Services geprueft, nie im Dispatcher gecacht.

use std::sync::Arc;
use uuid::Uuid;

use tresor_core::types::ProjektId;
use tresor_core::{KlientArt, ZugriffsStufe};
use tresor_db::models::{CredentialKeyRecord, ProjektRecord, ProjektUpdate};
use tresor_db::{
    BenutzerRepository, CredentialRepository, NachrichtenRepository, ProjektRepository,
    SchluesselRepository,
};
use tresor_krypto::KryptoEngine;
use tresor_protocol::control::{
    AntwortNutzlast, CredentialInfo, OperationsAntwort, ProjektBefehl, ProjektInfo,
    ProjektOperation, Rahmen, RahmenInhalt,
};

use crate::server_state::HubState;

/// Fester Fehlertext fuer fehlende Argumente oder fehlenden Operations-Zugriff
pub const ARGUMENT_FEHLER: &str = "Ungueltige Argumente fuer Projekt-Operation";

/// Verbindungs-Kontext nach erfolgreichem Handshake
#[derive(Debug, Clone)]
pub struct VerbindungsKontext {
    pub benutzer_id: Uuid,
    pub schluessel_id: Uuid,
    pub fingerprint: String,
    pub klient_art: KlientArt,
}

/// Uebersetzt eingehende Rahmen in Service-Aufrufe
pub struct OperationsDispatcher<D, K>
where
    D: BenutzerRepository
        + SchluesselRepository
        + NachrichtenRepository
        + ProjektRepository
        + CredentialRepository
        + 'static,
    K: KryptoEngine + 'static,
{
    state: Arc<HubState<D, K>>,
}

impl<D, K> OperationsDispatcher<D, K>
where
    D: BenutzerRepository
        + SchluesselRepository
        + NachrichtenRepository
        + ProjektRepository
        + CredentialRepository
        + 'static,
    K: KryptoEngine + 'static,
{
    pub fn neu(state: Arc<HubState<D, K>>) -> Self {
        Self { state }
    }

    /// Verarbeitet einen eingehenden Rahmen und gibt die Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine Antwort gesendet werden soll
    /// (z.B. bei Pong-Antworten des Clients).
    pub async fn dispatch(&self, rahmen: Rahmen, kontext: &VerbindungsKontext) -> Option<Rahmen> {
        let request_id = rahmen.request_id;

        match rahmen.inhalt {
            RahmenInhalt::Ping(ping) => Some(Rahmen::pong(request_id, ping.timestamp_ms)),

            RahmenInhalt::Pong(_) => {
                tracing::trace!("Pong empfangen (RTT-Messung)");
                None
            }

            RahmenInhalt::Operation(operation) => {
                // Nur Headless-Clients haben den Operations-Wortschatz
                if !kontext.klient_art.ist_cli() {
                    return Some(Rahmen::fehler(request_id, ARGUMENT_FEHLER));
                }

                let antwort = self.operation_ausfuehren(operation, kontext).await;
                Some(Rahmen::new(request_id, RahmenInhalt::Antwort(antwort)))
            }

            // Handshake- und Push-Frames haben nach dem Handshake
            // keinen Platz mehr in Richtung Server
            _ => Some(Rahmen::fehler(request_id, "Unerwarteter Frame")),
        }
    }

    async fn operation_ausfuehren(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let Some(befehl) = op.befehl else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };

        tracing::debug!(
            befehl = ?befehl,
            fingerprint = %kontext.fingerprint,
            "Projekt-Operation"
        );

        match befehl {
            ProjektBefehl::List => self.projekte_auflisten(kontext).await,
            ProjektBefehl::Create => self.projekt_erstellen(op, kontext).await,
            ProjektBefehl::Update => self.projekt_aktualisieren(op, kontext).await,
            ProjektBefehl::Delete => self.projekt_loeschen(op, kontext).await,
            ProjektBefehl::AddMember => self.mitglied_hinzufuegen(op, kontext).await,
            ProjektBefehl::DeleteMember => self.mitglied_entfernen(op, kontext).await,
            ProjektBefehl::ListCredentials => self.credentials_auflisten(op, kontext).await,
            ProjektBefehl::GetCredential => self.credential_lesen(op, kontext).await,
            ProjektBefehl::AddCredential => self.credential_setzen(op, kontext).await,
            ProjektBefehl::DeleteCredential => self.credential_entfernen(op, kontext).await,
        }
    }

    // -----------------------------------------------------------------------
    // Projekte
    // -----------------------------------------------------------------------

    async fn projekte_auflisten(&self, kontext: &VerbindungsKontext) -> OperationsAntwort {
        match self.state.projekte.projekte_auflisten(kontext.benutzer_id).await {
            Ok(projekte) => OperationsAntwort::erfolg(
                format!("{} Projekte", projekte.len()),
                Some(AntwortNutzlast::ProjektListe(
                    projekte.iter().map(projekt_info).collect(),
                )),
            ),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }

    async fn projekt_erstellen(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let Some(name) = op.name else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };
        let umgebung = op.umgebung.unwrap_or_default();
        let standard_zugriff = op.zugriff.unwrap_or(ZugriffsStufe::Lesen);

        match self
            .state
            .projekte
            .projekt_erstellen(kontext.benutzer_id, &name, &umgebung, standard_zugriff)
            .await
        {
            Ok(projekt) => OperationsAntwort::erfolg(
                "Projekt erstellt",
                Some(AntwortNutzlast::Projekt(projekt_info(&projekt))),
            ),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }

    async fn projekt_aktualisieren(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let Some(projekt_id) = op.projekt_id else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };
        if op.name.is_none() && op.umgebung.is_none() && op.zugriff.is_none() {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        }

        let update = ProjektUpdate {
            name: op.name,
            umgebung: op.umgebung,
            standard_zugriff: op.zugriff,
        };

        match self
            .state
            .projekte
            .projekt_aktualisieren(kontext.benutzer_id, projekt_id.inner(), update)
            .await
        {
            Ok(projekt) => OperationsAntwort::erfolg(
                "Projekt aktualisiert",
                Some(AntwortNutzlast::Projekt(projekt_info(&projekt))),
            ),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }

    async fn projekt_loeschen(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let Some(projekt_id) = op.projekt_id else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };

        match self
            .state
            .projekte
            .projekt_loeschen(kontext.benutzer_id, projekt_id.inner())
            .await
        {
            Ok(()) => OperationsAntwort::erfolg("Projekt geloescht", None),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Mitglieder
    // -----------------------------------------------------------------------

    async fn mitglied_hinzufuegen(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let (Some(projekt_id), Some(email)) = (op.projekt_id, op.mitglied_email) else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };

        match self
            .state
            .projekte
            .mitglied_hinzufuegen(kontext.benutzer_id, projekt_id.inner(), &email, op.zugriff)
            .await
        {
            Ok(mitglied) => OperationsAntwort::erfolg(
                format!("Mitglied gesetzt ({})", mitglied.zugriff.als_str()),
                None,
            ),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }

    async fn mitglied_entfernen(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let (Some(projekt_id), Some(mitglied_id)) = (op.projekt_id, op.mitglied_id) else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };

        match self
            .state
            .projekte
            .mitglied_entfernen(kontext.benutzer_id, projekt_id.inner(), mitglied_id.inner())
            .await
        {
            Ok(()) => OperationsAntwort::erfolg("Mitglied entfernt", None),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Credentials
    // -----------------------------------------------------------------------

    async fn credentials_auflisten(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let Some(projekt_id) = op.projekt_id else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };

        match self
            .state
            .credentials
            .credentials_auflisten(kontext.benutzer_id, projekt_id.inner())
            .await
        {
            Ok(keys) => OperationsAntwort::erfolg(
                format!("{} Credentials", keys.len()),
                Some(AntwortNutzlast::CredentialListe(
                    keys.iter().map(credential_info).collect(),
                )),
            ),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }

    async fn credential_lesen(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let (Some(projekt_id), Some(name)) = (op.projekt_id, op.schluessel) else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };

        // Geliefert wird der Geheimtext fuer genau den Schluessel der
        // Verbindung; entschluesselt wird ausschliesslich beim Client.
        match self
            .state
            .credentials
            .credential_lesen(
                kontext.benutzer_id,
                projekt_id.inner(),
                &name,
                kontext.schluessel_id,
            )
            .await
        {
            Ok(wert) => OperationsAntwort::erfolg(
                "Credential gelesen",
                Some(AntwortNutzlast::Credential(CredentialInfo {
                    name,
                    geheimtext: Some(wert.geheimtext),
                    laeuft_ab: wert.expires_at.map(|t| t.to_rfc3339()),
                })),
            ),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }

    async fn credential_setzen(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let (Some(projekt_id), Some(name), Some(wert)) = (op.projekt_id, op.schluessel, op.wert)
        else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };

        match self
            .state
            .credentials
            .credential_setzen(
                kontext.benutzer_id,
                projekt_id.inner(),
                &name,
                wert.as_bytes(),
            )
            .await
        {
            Ok(ergebnis) => OperationsAntwort::erfolg(
                format!(
                    "{} Werte gesetzt, {} uebersprungen",
                    ergebnis.gesetzte_werte,
                    ergebnis.fehler.len()
                ),
                Some(AntwortNutzlast::Credential(credential_info(
                    &ergebnis.credential,
                ))),
            ),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }

    async fn credential_entfernen(
        &self,
        op: ProjektOperation,
        kontext: &VerbindungsKontext,
    ) -> OperationsAntwort {
        let (Some(projekt_id), Some(name)) = (op.projekt_id, op.schluessel) else {
            return OperationsAntwort::fehlgeschlagen(ARGUMENT_FEHLER);
        };

        match self
            .state
            .credentials
            .credential_entfernen(kontext.benutzer_id, projekt_id.inner(), &name)
            .await
        {
            Ok(()) => OperationsAntwort::erfolg("Credential geloescht", None),
            Err(fehler) => OperationsAntwort::fehlgeschlagen(fehler.to_string()),
        }
    }
}

fn projekt_info(projekt: &ProjektRecord) -> ProjektInfo {
    ProjektInfo {
        projekt_id: ProjektId(projekt.id),
        name: projekt.name.clone(),
        umgebung: projekt.umgebung.clone(),
        standard_zugriff: projekt.standard_zugriff,
    }
}

fn credential_info(key: &CredentialKeyRecord) -> CredentialInfo {
    CredentialInfo {
        name: key.name.clone(),
        geheimtext: None,
        laeuft_ab: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::VerbindungsHub;
    use crate::server_state::HubConfig;
    use tokio::sync::watch;
    use tresor_core::types::BenutzerId;
    use tresor_db::SqliteDb;
    use tresor_krypto::SpeicherEngine;
    use tresor_protocol::control::AntwortStatus;

    struct Aufbau {
        state: Arc<HubState<SqliteDb, SpeicherEngine>>,
        dispatcher: OperationsDispatcher<SqliteDb, SpeicherEngine>,
        _shutdown_tx: watch::Sender<bool>,
    }

    async fn aufbau() -> Aufbau {
        let db = Arc::new(SqliteDb::in_memory().await.expect("In-Memory DB"));
        let engine = Arc::new(SpeicherEngine::neu());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);
        let state = HubState::neu(HubConfig::default(), db, engine, hub);
        Aufbau {
            dispatcher: OperationsDispatcher::neu(Arc::clone(&state)),
            state,
            _shutdown_tx: shutdown_tx,
        }
    }

    impl Aufbau {
        /// Importiert und aktiviert einen Schluessel, liefert den Kontext
        /// einer angemeldeten Verbindung
        async fn kontext(
            &self,
            fingerprint: &str,
            email: &str,
            klient_art: KlientArt,
        ) -> VerbindungsKontext {
            self.state
                .identitaet
                .schluessel_importieren(&format!("{fingerprint}:{email}:Test:"))
                .await
                .unwrap();
            self.state
                .identitaet
                .schluessel_aktivieren(fingerprint)
                .await
                .unwrap();
            let (benutzer, schluessel) =
                self.state.identitaet.anmelden(fingerprint).await.unwrap();
            VerbindungsKontext {
                benutzer_id: benutzer.id,
                schluessel_id: schluessel.id,
                fingerprint: schluessel.fingerprint,
                klient_art,
            }
        }

        async fn operation(
            &self,
            kontext: &VerbindungsKontext,
            op: ProjektOperation,
        ) -> OperationsAntwort {
            let rahmen = self
                .dispatcher
                .dispatch(Rahmen::new(7, RahmenInhalt::Operation(op)), kontext)
                .await
                .expect("Operationen haben immer eine Antwort");
            assert_eq!(rahmen.request_id, 7);
            match rahmen.inhalt {
                RahmenInhalt::Antwort(antwort) => antwort,
                inhalt => panic!("Erwartet Antwort, bekommen {inhalt:?}"),
            }
        }
    }

    #[tokio::test]
    async fn ping_wird_gespiegelt() {
        let a = aufbau().await;
        let kontext = a.kontext("FP-A", "alice@example.org", KlientArt::Cli).await;

        let antwort = a
            .dispatcher
            .dispatch(Rahmen::ping(3, 123456), &kontext)
            .await
            .expect("Pong erwartet");

        assert_eq!(antwort.request_id, 3);
        match antwort.inhalt {
            RahmenInhalt::Pong(p) => assert_eq!(p.echo_timestamp_ms, 123456),
            inhalt => panic!("Erwartet Pong, bekommen {inhalt:?}"),
        }
    }

    #[tokio::test]
    async fn interaktive_clients_ohne_operations_wortschatz() {
        let a = aufbau().await;
        let kontext = a
            .kontext("FP-A", "alice@example.org", KlientArt::Interaktiv)
            .await;

        let rahmen = a
            .dispatcher
            .dispatch(
                Rahmen::new(
                    1,
                    RahmenInhalt::Operation(ProjektOperation {
                        befehl: Some(ProjektBefehl::List),
                        ..Default::default()
                    }),
                ),
                &kontext,
            )
            .await
            .unwrap();

        match rahmen.inhalt {
            RahmenInhalt::Antwort(antwort) => {
                assert_eq!(antwort.status, AntwortStatus::Fehler);
                assert_eq!(antwort.fehler.as_deref(), Some(ARGUMENT_FEHLER));
            }
            inhalt => panic!("Erwartet Antwort, bekommen {inhalt:?}"),
        }
    }

    #[tokio::test]
    async fn fehlender_befehl_ist_argument_fehler() {
        let a = aufbau().await;
        let kontext = a.kontext("FP-A", "alice@example.org", KlientArt::Cli).await;

        let antwort = a.operation(&kontext, ProjektOperation::default()).await;
        assert_eq!(antwort.status, AntwortStatus::Fehler);
        assert_eq!(antwort.fehler.as_deref(), Some(ARGUMENT_FEHLER));
    }

    #[tokio::test]
    async fn projekt_anlegen_und_auflisten() {
        let a = aufbau().await;
        let kontext = a.kontext("FP-A", "alice@example.org", KlientArt::Cli).await;

        let antwort = a
            .operation(
                &kontext,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::Create),
                    name: Some("infra".into()),
                    umgebung: Some("production".into()),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(antwort.status, AntwortStatus::Erfolg);
        let Some(AntwortNutzlast::Projekt(projekt)) = antwort.nutzlast else {
            panic!("Erwartet Projekt-Nutzlast");
        };
        assert_eq!(projekt.name, "infra");
        assert_eq!(projekt.standard_zugriff, ZugriffsStufe::Lesen);

        let antwort = a
            .operation(
                &kontext,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::List),
                    ..Default::default()
                },
            )
            .await;
        let Some(AntwortNutzlast::ProjektListe(liste)) = antwort.nutzlast else {
            panic!("Erwartet Projekt-Liste");
        };
        assert_eq!(liste.len(), 1);
        assert_eq!(liste[0].umgebung, "production");
    }

    #[tokio::test]
    async fn credential_lebenszyklus() {
        let a = aufbau().await;
        let kontext = a.kontext("FP-A", "alice@example.org", KlientArt::Cli).await;

        let antwort = a
            .operation(
                &kontext,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::Create),
                    name: Some("infra".into()),
                    ..Default::default()
                },
            )
            .await;
        let Some(AntwortNutzlast::Projekt(projekt)) = antwort.nutzlast else {
            panic!("Erwartet Projekt-Nutzlast");
        };
        let projekt_id = projekt.projekt_id;

        let antwort = a
            .operation(
                &kontext,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::AddCredential),
                    projekt_id: Some(projekt_id),
                    schluessel: Some("DB_PASSWORD".into()),
                    wert: Some("s3cr3t".into()),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(antwort.status, AntwortStatus::Erfolg);

        // Der gelesene Geheimtext ist fuer den eigenen Schluessel bestimmt
        let antwort = a
            .operation(
                &kontext,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::GetCredential),
                    projekt_id: Some(projekt_id),
                    schluessel: Some("DB_PASSWORD".into()),
                    ..Default::default()
                },
            )
            .await;
        let Some(AntwortNutzlast::Credential(credential)) = antwort.nutzlast else {
            panic!("Erwartet Credential-Nutzlast");
        };
        let geheimtext = credential.geheimtext.expect("Geheimtext erwartet");
        let (fp, klartext) = SpeicherEngine::geheimtext_zerlegen(&geheimtext).unwrap();
        assert_eq!(fp, "FP-A");
        assert_eq!(klartext, b"s3cr3t");
        assert!(credential.laeuft_ab.is_some());

        let antwort = a
            .operation(
                &kontext,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::DeleteCredential),
                    projekt_id: Some(projekt_id),
                    schluessel: Some("DB_PASSWORD".into()),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(antwort.status, AntwortStatus::Erfolg);

        let antwort = a
            .operation(
                &kontext,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::ListCredentials),
                    projekt_id: Some(projekt_id),
                    ..Default::default()
                },
            )
            .await;
        let Some(AntwortNutzlast::CredentialListe(liste)) = antwort.nutzlast else {
            panic!("Erwartet Credential-Liste");
        };
        assert!(liste.is_empty());
    }

    #[tokio::test]
    async fn nicht_admins_werden_pro_aufruf_abgewiesen() {
        let a = aufbau().await;
        let alice = a.kontext("FP-A", "alice@example.org", KlientArt::Cli).await;
        let bob = a.kontext("FP-B", "bob@example.org", KlientArt::Cli).await;

        let antwort = a
            .operation(
                &alice,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::Create),
                    name: Some("infra".into()),
                    ..Default::default()
                },
            )
            .await;
        let Some(AntwortNutzlast::Projekt(projekt)) = antwort.nutzlast else {
            panic!("Erwartet Projekt-Nutzlast");
        };
        let projekt_id = projekt.projekt_id;

        a.operation(
            &alice,
            ProjektOperation {
                befehl: Some(ProjektBefehl::AddMember),
                projekt_id: Some(projekt_id),
                mitglied_email: Some("bob@example.org".into()),
                zugriff: Some(ZugriffsStufe::Lesen),
                ..Default::default()
            },
        )
        .await;

        // Bob ist Mitglied, aber kein Admin
        let antwort = a
            .operation(
                &bob,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::AddCredential),
                    projekt_id: Some(projekt_id),
                    schluessel: Some("X".into()),
                    wert: Some("x".into()),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(antwort.status, AntwortStatus::Fehler);

        let antwort = a
            .operation(
                &bob,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::DeleteMember),
                    projekt_id: Some(projekt_id),
                    mitglied_id: Some(BenutzerId(alice.benutzer_id)),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(antwort.status, AntwortStatus::Fehler);
    }

    #[tokio::test]
    async fn mitglied_entfernen_sperrt_credential_zugriff() {
        let a = aufbau().await;
        let alice = a.kontext("FP-A", "alice@example.org", KlientArt::Cli).await;
        let bob = a.kontext("FP-B", "bob@example.org", KlientArt::Cli).await;

        let antwort = a
            .operation(
                &alice,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::Create),
                    name: Some("infra".into()),
                    ..Default::default()
                },
            )
            .await;
        let Some(AntwortNutzlast::Projekt(projekt)) = antwort.nutzlast else {
            panic!("Erwartet Projekt-Nutzlast");
        };
        let projekt_id = projekt.projekt_id;

        a.operation(
            &alice,
            ProjektOperation {
                befehl: Some(ProjektBefehl::AddMember),
                projekt_id: Some(projekt_id),
                mitglied_email: Some("bob@example.org".into()),
                ..Default::default()
            },
        )
        .await;

        let antwort = a
            .operation(
                &bob,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::ListCredentials),
                    projekt_id: Some(projekt_id),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(antwort.status, AntwortStatus::Erfolg);

        a.operation(
            &alice,
            ProjektOperation {
                befehl: Some(ProjektBefehl::DeleteMember),
                projekt_id: Some(projekt_id),
                mitglied_id: Some(BenutzerId(bob.benutzer_id)),
                ..Default::default()
            },
        )
        .await;

        let antwort = a
            .operation(
                &bob,
                ProjektOperation {
                    befehl: Some(ProjektBefehl::ListCredentials),
                    projekt_id: Some(projekt_id),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(antwort.status, AntwortStatus::Fehler);
    }
}
