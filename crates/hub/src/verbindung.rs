//! KlientVerbindung – verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `KlientVerbindung` in einem eigenen
//! tokio-Task. Der erste Frame muss ein Hallo sein; danach laeuft die
//! Verbindung in einer select!-Schleife bis zum Trennen.
//!
//! ## Lebenszyklus
//! ```text
//! TCP-Connect -> Hallo/HalloAntwort -> registriert im Hub -> Betrieb
//!                     |                                        |
//!                     v                                        v
//!                 Abweisung                          Abmeldung + Cleanup
//! ```
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Client muss innerhalb von `verbindungs_timeout_sek` irgendetwas senden
//! - Bei Timeout wird die Verbindung getrennt

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use uuid::Uuid;

use tresor_db::{
    BenutzerRepository, CredentialRepository, NachrichtenRepository, ProjektRepository,
    SchluesselRepository,
};
use tresor_krypto::KryptoEngine;
use tresor_protocol::control::{HalloAntwort, Rahmen, RahmenInhalt};
use tresor_protocol::wire::RahmenCodec;

use tresor_core::types::BenutzerId;

use crate::dispatcher::{OperationsDispatcher, VerbindungsKontext};
use crate::error::{HubError, HubResult};
use crate::hub::{Registrierung, SEND_QUEUE_GROESSE};
use crate::server_state::HubState;

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Rahmen via `RahmenCodec`, dispatcht an `OperationsDispatcher`
/// und leitet Push-Artefakte aus dem Hub an den Client weiter.
pub struct KlientVerbindung<D, K>
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
    peer_addr: SocketAddr,
}

impl<D, K> KlientVerbindung<D, K>
where
    D: BenutzerRepository
        + SchluesselRepository
        + NachrichtenRepository
        + ProjektRepository
        + CredentialRepository
        + 'static,
    K: KryptoEngine + 'static,
{
    /// Erstellt eine neue KlientVerbindung
    pub fn neu(state: Arc<HubState<D, K>>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Diese Methode laeuft bis die Verbindung getrennt wird, der Hub
    /// die Verbindung verdraengt oder ein Shutdown-Signal eingeht.
    pub async fn verarbeiten(self, stream: TcpStream, mut shutdown_rx: watch::Receiver<bool>) {
        let peer_addr = self.peer_addr;
        let keepalive_intervall = Duration::from_secs(self.state.config.keepalive_sek);
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek);

        tracing::info!(peer = %peer_addr, "Neue Verbindung");

        let mut framed = Framed::new(stream, RahmenCodec::new());

        // Handshake: erster Frame muss ein Hallo sein
        let (kontext, mut sende_rx, verbindungs_id) = match self.handshake(&mut framed).await {
            Ok(ergebnis) => ergebnis,
            Err(fehler) => {
                tracing::info!(peer = %peer_addr, fehler = %fehler, "Handshake abgewiesen");
                return;
            }
        };

        tracing::info!(
            peer = %peer_addr,
            fingerprint = %kontext.fingerprint,
            klient_art = ?kontext.klient_art,
            "Verbindung angemeldet"
        );

        let dispatcher = OperationsDispatcher::neu(Arc::clone(&self.state));

        // Zeitpunkt des letzten empfangenen Frames
        let mut letzter_empfang = Instant::now();
        // Zeitpunkt des naechsten Ping
        let mut naechster_ping = Instant::now() + keepalive_intervall;
        let mut ping_request_id: u32 = 0;

        loop {
            let jetzt = Instant::now();

            // Timeout-Pruefung
            if jetzt.duration_since(letzter_empfang) > timeout_dauer {
                tracing::warn!(peer = %peer_addr, "Verbindungs-Timeout");
                break;
            }

            // Naechsten Ping-Zeitpunkt berechnen
            let ping_verzoegerung = if jetzt < naechster_ping {
                naechster_ping.duration_since(jetzt)
            } else {
                Duration::from_millis(1)
            };

            tokio::select! {
                // Eingehender Rahmen vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(rahmen)) => {
                            letzter_empfang = Instant::now();
                            tracing::trace!(
                                peer = %peer_addr,
                                request_id = rahmen.request_id,
                                "Rahmen empfangen"
                            );

                            if let Some(antwort) = dispatcher.dispatch(rahmen, &kontext).await {
                                if let Err(e) = framed.send(antwort).await {
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        fehler = %e,
                                        "Senden fehlgeschlagen"
                                    );
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Push-Artefakt aus dem Hub
                ausgehend = sende_rx.recv() => {
                    match ausgehend {
                        Some(rahmen) => {
                            if let Err(e) = framed.send(rahmen).await {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    fehler = %e,
                                    "Push-Senden fehlgeschlagen"
                                );
                                break;
                            }
                        }
                        // Der Hub hat unseren Eintrag fallengelassen:
                        // Shutdown, Takeover durch eine neuere Verbindung
                        // oder Stau
                        None => {
                            if *shutdown_rx.borrow() {
                                tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                                let abschied = Rahmen::fehler(0, "Server wird heruntergefahren");
                                let _ = framed.send(abschied).await;
                            } else {
                                tracing::info!(
                                    peer = %peer_addr,
                                    fingerprint = %kontext.fingerprint,
                                    "Vom Hub verdraengt"
                                );
                            }
                            break;
                        }
                    }
                }

                // Keepalive-Ping
                _ = tokio::time::sleep(ping_verzoegerung) => {
                    if jetzt >= naechster_ping {
                        ping_request_id = ping_request_id.wrapping_add(1);
                        let ts = std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as u64;
                        let ping = Rahmen::ping(ping_request_id, ts);

                        if let Err(e) = framed.send(ping).await {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %e,
                                "Ping-Senden fehlgeschlagen"
                            );
                            break;
                        }
                        naechster_ping = Instant::now() + keepalive_intervall;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        let abschied = Rahmen::fehler(0, "Server wird heruntergefahren");
                        let _ = framed.send(abschied).await;
                        break;
                    }
                }
            }
        }

        // Cleanup: der Hub ignoriert die Abmeldung falls laengst eine
        // neuere Verbindung den Fingerprint uebernommen hat
        self.state
            .hub
            .abmelden(&kontext.fingerprint, verbindungs_id)
            .await;

        tracing::info!(peer = %peer_addr, "Verbindungs-Task beendet");
    }

    /// Fuehrt den Handshake durch und registriert die Verbindung im Hub
    ///
    /// Der Hallo-Frame muss innerhalb von `handshake_timeout_sek`
    /// eintreffen, sonst wird die Verbindung ohne Antwort geschlossen.
    async fn handshake(
        &self,
        framed: &mut Framed<TcpStream, RahmenCodec>,
    ) -> HubResult<(VerbindungsKontext, mpsc::Receiver<Rahmen>, Uuid)> {
        let handshake_dauer = Duration::from_secs(self.state.config.handshake_timeout_sek);

        let frame = match tokio::time::timeout(handshake_dauer, framed.next()).await {
            Ok(frame) => frame,
            Err(_) => {
                return Err(HubError::Handshake(
                    "Kein Hallo innerhalb des Zeitfensters".into(),
                ))
            }
        };

        let rahmen = match frame {
            Some(Ok(rahmen)) => rahmen,
            Some(Err(e)) => return Err(HubError::Io(e)),
            None => return Err(HubError::VerbindungGetrennt),
        };

        let request_id = rahmen.request_id;
        let anfrage = match rahmen.inhalt {
            RahmenInhalt::Hallo(anfrage) => anfrage,
            _ => {
                let _ = framed
                    .send(Rahmen::fehler(request_id, "Erster Frame war kein Hallo"))
                    .await;
                return Err(HubError::Protokoll("Erster Frame war kein Hallo".into()));
            }
        };

        // Fingerprint aufloesen; nur aktivierte Schluessel duerfen sich
        // verbinden
        let (benutzer, schluessel) = match self.state.identitaet.anmelden(&anfrage.fingerprint).await
        {
            Ok(paar) => paar,
            Err(fehler) => {
                let _ = framed
                    .send(Rahmen::fehler(request_id, fehler.to_string()))
                    .await;
                return Err(HubError::Handshake(fehler.to_string()));
            }
        };

        framed
            .send(Rahmen::new(
                request_id,
                RahmenInhalt::HalloAntwort(HalloAntwort {
                    benutzer_id: BenutzerId(benutzer.id),
                    name: benutzer.name.clone(),
                    email: benutzer.email.clone(),
                }),
            ))
            .await?;

        let verbindungs_id = Uuid::new_v4();
        let (sende_tx, sende_rx) = mpsc::channel(SEND_QUEUE_GROESSE);

        // Registrierung verdraengt eine eventuell bestehende Verbindung
        // desselben Fingerprints
        self.state
            .hub
            .registrieren(Registrierung {
                fingerprint: schluessel.fingerprint.clone(),
                verbindungs_id,
                benutzer_id: benutzer.id,
                klient_art: anfrage.klient_art,
                tx: sende_tx,
            })
            .await;

        let kontext = VerbindungsKontext {
            benutzer_id: benutzer.id,
            schluessel_id: schluessel.id,
            fingerprint: schluessel.fingerprint,
            klient_art: anfrage.klient_art,
        };

        Ok((kontext, sende_rx, verbindungs_id))
    }
}
