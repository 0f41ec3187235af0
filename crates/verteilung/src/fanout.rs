//! Fan-out-Verschluesselung: ein Klartext, viele Empfaenger-Schluessel
//!
//! Jeder Ziel-Schluessel wird in einem eigenen Task verschluesselt.
//! Einzelne Fehlschlaege brechen den Fan-out nicht ab; erst wenn ALLE
//! Empfaenger scheitern, wird der gesamte Vorgang zum Fehler.

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;
use uuid::Uuid;

use tresor_krypto::KryptoEngine;

use crate::error::{VerteilungError, VerteilungResult};

/// Ein Empfaenger-Schluessel als Ziel des Fan-outs
#[derive(Debug, Clone, PartialEq)]
pub struct ZielSchluessel {
    pub schluessel_id: Uuid,
    pub fingerprint: String,
}

/// Ein erfolgreich verschluesselter Geheimtext fuer ein Ziel
#[derive(Debug, Clone)]
pub struct Verschluesselt {
    pub ziel: ZielSchluessel,
    pub geheimtext: String,
}

/// Ergebnis eines Fan-outs: Erfolge und Fehlschlaege pro Ziel
#[derive(Debug, Default)]
pub struct FanoutErgebnis {
    pub erfolge: Vec<Verschluesselt>,
    pub fehler: Vec<(ZielSchluessel, String)>,
}

impl FanoutErgebnis {
    /// Der zuerst aufgetretene Fehlertext, falls es Fehlschlaege gab
    pub fn erster_fehler(&self) -> Option<&str> {
        self.fehler.first().map(|(_, msg)| msg.as_str())
    }
}

/// Verschluesselt `klartext` nebenlaeufig fuer alle `ziele`.
///
/// Leere Zielliste liefert ein leeres Ergebnis. Schlagen alle Ziele
/// fehl, wird der erste Fehler als `AlleEmpfaengerFehlgeschlagen`
/// zurueckgegeben; Teilerfolge sind kein Fehler.
pub async fn fuer_schluessel_verschluesseln<K>(
    engine: Arc<K>,
    ziele: Vec<ZielSchluessel>,
    klartext: Arc<Vec<u8>>,
) -> VerteilungResult<FanoutErgebnis>
where
    K: KryptoEngine + 'static,
{
    if ziele.is_empty() {
        return Ok(FanoutErgebnis::default());
    }

    let mut tasks = JoinSet::new();
    for ziel in ziele {
        let engine = Arc::clone(&engine);
        let klartext = Arc::clone(&klartext);
        tasks.spawn(async move {
            let resultat = engine.verschluesseln(&ziel.fingerprint, &klartext).await;
            (ziel, resultat)
        });
    }

    let mut ergebnis = FanoutErgebnis::default();
    while let Some(beendet) = tasks.join_next().await {
        let (ziel, resultat) =
            beendet.map_err(|e| VerteilungError::Intern(format!("Fanout-Task abgestuerzt: {e}")))?;

        match resultat {
            Ok(geheimtext) => ergebnis.erfolge.push(Verschluesselt { ziel, geheimtext }),
            Err(e) => {
                warn!(fingerprint = %ziel.fingerprint, fehler = %e, "Verschluesselung fehlgeschlagen");
                ergebnis.fehler.push((ziel, e.to_string()));
            }
        }
    }

    if ergebnis.erfolge.is_empty() {
        if let Some(erster) = ergebnis.erster_fehler() {
            return Err(VerteilungError::AlleEmpfaengerFehlgeschlagen(
                erster.to_string(),
            ));
        }
    }

    Ok(ergebnis)
}
