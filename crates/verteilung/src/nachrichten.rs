//! NachrichtenService – verschluesselte Nachrichten zwischen Benutzern
//!
//! Eine Nachricht an einen Benutzer wird fuer jeden seiner aktiven
//! Schluessel einzeln verschluesselt und pro Schluessel persistiert.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use tresor_core::email_normalisieren;
use tresor_db::{
    models::{NachrichtRecord, NeueNachricht},
    BenutzerRepository, NachrichtenRepository, SchluesselRepository,
};
use tresor_krypto::KryptoEngine;

use crate::error::{VerteilungError, VerteilungResult};
use crate::fanout::{fuer_schluessel_verschluesseln, ZielSchluessel};

/// Obergrenze fuer Betreff-Zeilen
const MAX_BETREFF: usize = 256;

/// Eine persistierte Nachricht samt Empfaenger-Fingerprint
#[derive(Debug)]
pub struct Zustellung {
    pub fingerprint: String,
    pub nachricht: NachrichtRecord,
}

/// Ergebnis eines Versands: persistierte Nachrichten plus Fehlschlaege
/// pro Fingerprint
#[derive(Debug)]
pub struct VersandErgebnis {
    pub zustellungen: Vec<Zustellung>,
    pub fehler: Vec<(String, String)>,
}

/// Versendet und listet verschluesselte Nachrichten
pub struct NachrichtenService<D, K> {
    db: Arc<D>,
    engine: Arc<K>,
}

impl<D, K> NachrichtenService<D, K>
where
    D: BenutzerRepository + SchluesselRepository + NachrichtenRepository,
    K: KryptoEngine + 'static,
{
    pub fn neu(db: Arc<D>, engine: Arc<K>) -> Arc<Self> {
        Arc::new(Self { db, engine })
    }

    /// Verschluesselt und persistiert eine Nachricht fuer alle aktiven
    /// Schluessel des Empfaengers.
    pub async fn nachricht_senden(
        &self,
        absender_id: Uuid,
        empfaenger_email: &str,
        betreff: &str,
        klartext: &[u8],
    ) -> VerteilungResult<VersandErgebnis> {
        if betreff.trim().is_empty() {
            return Err(VerteilungError::UngueltigeEingabe(
                "Betreff darf nicht leer sein".into(),
            ));
        }
        if betreff.len() > MAX_BETREFF {
            return Err(VerteilungError::UngueltigeEingabe(format!(
                "Betreff zu lang: {} Zeichen (Maximum: {MAX_BETREFF})",
                betreff.len()
            )));
        }
        if klartext.is_empty() {
            return Err(VerteilungError::UngueltigeEingabe(
                "Nachrichteninhalt darf nicht leer sein".into(),
            ));
        }

        let empfaenger_email = email_normalisieren(empfaenger_email);
        let empfaenger = self
            .db
            .benutzer_nach_email(&empfaenger_email)
            .await?
            .ok_or_else(|| {
                VerteilungError::NichtGefunden(format!("Benutzer {empfaenger_email}"))
            })?;

        let ziele: Vec<ZielSchluessel> = self
            .db
            .aktive_schluessel_fuer_benutzer(empfaenger.id)
            .await?
            .into_iter()
            .map(|s| ZielSchluessel {
                schluessel_id: s.id,
                fingerprint: s.fingerprint,
            })
            .collect();

        if ziele.is_empty() {
            return Err(VerteilungError::KeineEmpfaenger(format!(
                "{empfaenger_email} hat keine aktiven Schluessel"
            )));
        }

        let ergebnis = fuer_schluessel_verschluesseln(
            Arc::clone(&self.engine),
            ziele,
            Arc::new(klartext.to_vec()),
        )
        .await?;

        let mut zustellungen = Vec::with_capacity(ergebnis.erfolge.len());
        for verschluesselt in &ergebnis.erfolge {
            let record = self
                .db
                .nachricht_erstellen(NeueNachricht {
                    schluessel_id: verschluesselt.ziel.schluessel_id,
                    absender_id,
                    betreff: betreff.trim(),
                    geheimtext: &verschluesselt.geheimtext,
                })
                .await?;
            zustellungen.push(Zustellung {
                fingerprint: verschluesselt.ziel.fingerprint.clone(),
                nachricht: record,
            });
        }

        let fehler: Vec<(String, String)> = ergebnis
            .fehler
            .into_iter()
            .map(|(ziel, msg)| (ziel.fingerprint, msg))
            .collect();

        info!(
            empfaenger = %empfaenger_email,
            zugestellt = zustellungen.len(),
            uebersprungen = fehler.len(),
            "Nachricht versendet"
        );

        Ok(VersandErgebnis {
            zustellungen,
            fehler,
        })
    }

    /// Nachrichten fuer einen Fingerprint, neueste zuerst
    pub async fn nachrichten_auflisten(
        &self,
        fingerprint: &str,
        limit: i64,
        offset: i64,
    ) -> VerteilungResult<Vec<NachrichtRecord>> {
        let schluessel = self
            .db
            .schluessel_nach_fingerprint(fingerprint)
            .await?
            .ok_or_else(|| {
                VerteilungError::NichtGefunden(format!("Schluessel {fingerprint}"))
            })?;

        Ok(self
            .db
            .nachrichten_fuer_schluessel(schluessel.id, limit.clamp(1, 500), offset.max(0))
            .await?)
    }
}
