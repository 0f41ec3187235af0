//! tresor-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Krypto-Engine und Verbindungs-Hub zu einem
//! lauffaehigen Server und stellt den Einstiegspunkt fuer
//! Integrationstests bereit.

pub mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;

use tresor_db::repository::DatabaseConfig;
use tresor_db::SqliteDb;
use tresor_hub::{HubConfig, HubState, VerbindungsHub, VerbindungsServer};
use tresor_krypto::{GpgConfig, GpgEngine, KryptoEngine, SpeicherEngine};

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen, Migrationen ausfuehren
    /// 2. Krypto-Engine waehlen
    /// 3. Verbindungs-Hub und TCP-Listener starten
    /// 4. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            "Server startet"
        );

        let db_config = DatabaseConfig {
            url: self.config.datenbank.url.clone(),
            max_verbindungen: self.config.datenbank.max_verbindungen,
            sqlite_wal: self.config.datenbank.wal,
        };
        let db = Arc::new(
            SqliteDb::oeffnen(&db_config)
                .await
                .context("Datenbankverbindung fehlgeschlagen")?,
        );

        match self.config.krypto.engine.as_str() {
            "speicher" => {
                tracing::warn!(
                    "Speicher-Engine aktiv – kein echtes Kryptosystem, nur fuer Entwicklung"
                );
                self.betreiben(db, Arc::new(SpeicherEngine::neu())).await
            }
            _ => {
                let gpg = GpgEngine::neu(GpgConfig {
                    gpg_pfad: self.config.krypto.gpg_pfad.clone(),
                    home_dir: self.config.krypto.gpg_home_dir.clone().map(PathBuf::from),
                });
                self.betreiben(db, Arc::new(gpg)).await
            }
        }
    }

    async fn betreiben<K: KryptoEngine + 'static>(
        self,
        db: Arc<SqliteDb>,
        engine: Arc<K>,
    ) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let hub = VerbindungsHub::starten(shutdown_rx.clone());
        let hub_config = HubConfig {
            keepalive_sek: self.config.server.keepalive_sek,
            verbindungs_timeout_sek: self.config.server.verbindungs_timeout_sek,
            handshake_timeout_sek: self.config.server.handshake_timeout_sek,
            max_klienten: self.config.server.max_klienten,
        };
        let state = HubState::neu(hub_config, db, engine, hub);

        let bind_addr: SocketAddr = self
            .config
            .tcp_bind_adresse()
            .parse()
            .context("Ungueltige Bind-Adresse")?;
        let server = VerbindungsServer::binden(state, bind_addr)
            .await
            .context("TCP-Socket binden fehlgeschlagen")?;

        let server_task = tokio::spawn(server.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = shutdown_tx.send(true);
        let _ = server_task.await;

        Ok(())
    }
}
