//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `VerbindungsServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer
//! `KlientVerbindung`.
//!
//! ## Concurrency-Modell
//! Die Repository-Traits liefern Send-Futures (async-trait), alle
//! Verbindungs-Tasks laufen daher als gewoehnliche `tokio::spawn`-Tasks
//! auf dem Multi-Thread-Executor.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use tresor_db::{
    BenutzerRepository, CredentialRepository, NachrichtenRepository, ProjektRepository,
    SchluesselRepository,
};
use tresor_krypto::KryptoEngine;

use crate::server_state::HubState;
use crate::verbindung::KlientVerbindung;

/// TCP-Server fuer den Verbindungs-Hub
///
/// Bindet einen TCP-Socket und akzeptiert Verbindungen in einer Loop.
/// Jede Verbindung laeuft als eigener tokio-Task.
pub struct VerbindungsServer<D, K>
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
    listener: TcpListener,
}

impl<D, K> VerbindungsServer<D, K>
where
    D: BenutzerRepository
        + SchluesselRepository
        + NachrichtenRepository
        + ProjektRepository
        + CredentialRepository
        + 'static,
    K: KryptoEngine + 'static,
{
    /// Bindet den TCP-Socket
    ///
    /// Das Binden passiert getrennt vom Starten, damit Aufrufer die
    /// tatsaechliche Adresse abfragen koennen (Port 0 fuer Tests).
    pub async fn binden(
        state: Arc<HubState<D, K>>,
        bind_addr: SocketAddr,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self { state, listener })
    }

    /// Gibt die tatsaechlich gebundene Adresse zurueck
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(
        self,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let lokale_addr = self.listener.local_addr()?;

        tracing::info!(
            adresse = %lokale_addr,
            "TCP Hub-Server gestartet"
        );

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            // Client-Limit pruefen
                            let online = self.state.hub.klient_anzahl() as u32;
                            if online >= self.state.config.max_klienten {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    max = self.state.config.max_klienten,
                                    "Server voll – Verbindung abgelehnt"
                                );
                                drop(stream);
                                continue;
                            }

                            tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");

                            let verbindung = KlientVerbindung::neu(
                                Arc::clone(&self.state),
                                peer_addr,
                            );
                            let shutdown_rx_clone = shutdown_rx.clone();

                            tokio::spawn(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Hub-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("TCP Hub-Server gestoppt");
        Ok(())
    }
}
