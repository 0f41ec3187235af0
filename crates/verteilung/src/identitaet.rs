//! IdentitaetsService – Schluessel-Import, Aktivierung, Anmeldung
//!
//! Ein Benutzer entsteht implizit beim Import seines oeffentlichen
//! Schluessels: die UID liefert Name, E-Mail und Kommentar. Benutzer
//! werden ueber die E-Mail, Schluessel ueber den Fingerprint
//! zusammengefuehrt.

use std::sync::Arc;
use tracing::info;

use tresor_core::email_normalisieren;
use tresor_db::{
    models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer, NeuerSchluessel, SchluesselRecord, SchluesselUpdate},
    BenutzerRepository, SchluesselRepository,
};
use tresor_krypto::KryptoEngine;

use crate::error::{VerteilungError, VerteilungResult};

/// Ergebnis eines Schluessel-Imports
#[derive(Debug, Clone)]
pub struct ImportErgebnis {
    pub benutzer: BenutzerRecord,
    pub schluessel: SchluesselRecord,
    /// true wenn der Schluessel neu angelegt wurde, false bei Re-Import
    pub schluessel_neu: bool,
}

/// Ergebnis einer Schluessel-Aktivierung
#[derive(Debug, Clone)]
pub struct AktivierungsErgebnis {
    pub fingerprint: String,
    pub email: String,
    pub name: String,
    /// true nur bei der allerersten Aktivierung dieses Schluessels
    pub erstmalig: bool,
}

/// Verwaltet Benutzer und ihre oeffentlichen Schluessel
pub struct IdentitaetsService<D, K> {
    db: Arc<D>,
    engine: Arc<K>,
}

impl<D, K> IdentitaetsService<D, K>
where
    D: BenutzerRepository + SchluesselRepository,
    K: KryptoEngine,
{
    pub fn neu(db: Arc<D>, engine: Arc<K>) -> Arc<Self> {
        Arc::new(Self { db, engine })
    }

    /// Importiert einen oeffentlichen Schluessel samt Benutzer.
    ///
    /// E-Mails werden vor jedem Vergleich kanonisiert (getrimmt,
    /// kleingeschrieben). Gehoert der Fingerprint bereits einem anderen
    /// Benutzer, wird der Import abgelehnt, bevor irgendetwas
    /// persistiert wird.
    pub async fn schluessel_importieren(&self, key_material: &str) -> VerteilungResult<ImportErgebnis> {
        if key_material.trim().is_empty() {
            return Err(VerteilungError::UngueltigeEingabe(
                "Schluesselmaterial darf nicht leer sein".into(),
            ));
        }

        let info = self.engine.schluessel_importieren(key_material).await?;
        let email = email_normalisieren(&info.email);

        // Eigentums-Pruefung vor jeder Mutation: ist der Fingerprint
        // schon vergeben, muss er dem Benutzer dieser E-Mail gehoeren
        let vorhandener_schluessel =
            self.db.schluessel_nach_fingerprint(&info.fingerprint).await?;
        if let Some(ref schluessel) = vorhandener_schluessel {
            let eigentuemer = self
                .db
                .benutzer_nach_id(schluessel.benutzer_id)
                .await?
                .ok_or_else(|| VerteilungError::Intern("Schluessel ohne Benutzer".into()))?;
            if eigentuemer.email != email {
                return Err(VerteilungError::SchluesselKonflikt {
                    fingerprint: info.fingerprint,
                });
            }
        }

        // Benutzer ueber E-Mail zusammenfuehren
        let benutzer = match self.db.benutzer_nach_email(&email).await? {
            Some(vorhanden) => {
                if vorhanden.name != info.name || vorhanden.kommentar != info.kommentar {
                    self.db
                        .benutzer_aktualisieren(
                            vorhanden.id,
                            BenutzerUpdate {
                                name: Some(info.name.clone()),
                                kommentar: Some(info.kommentar.clone()),
                            },
                        )
                        .await?
                } else {
                    vorhanden
                }
            }
            None => {
                self.db
                    .benutzer_erstellen(NeuerBenutzer {
                        name: &info.name,
                        email: &email,
                        kommentar: &info.kommentar,
                    })
                    .await?
            }
        };

        // Schluessel ueber Fingerprint zusammenfuehren
        let (schluessel, schluessel_neu) = match vorhandener_schluessel {
            Some(vorhanden) => {
                let aktualisiert = self
                    .db
                    .schluessel_aktualisieren(
                        vorhanden.id,
                        SchluesselUpdate {
                            key_material: Some(key_material.to_string()),
                            expires_at: info.ablauf,
                        },
                    )
                    .await?;
                (aktualisiert, false)
            }
            None => {
                let neu = self
                    .db
                    .schluessel_erstellen(NeuerSchluessel {
                        benutzer_id: benutzer.id,
                        fingerprint: &info.fingerprint,
                        key_material,
                        expires_at: info.ablauf,
                    })
                    .await?;
                (neu, true)
            }
        };

        info!(
            fingerprint = %schluessel.fingerprint,
            email = %benutzer.email,
            neu = schluessel_neu,
            "Schluessel importiert"
        );

        Ok(ImportErgebnis {
            benutzer,
            schluessel,
            schluessel_neu,
        })
    }

    /// Aktiviert einen Schluessel. Die Aktivierung ist eine
    /// Einbahnstrasse; ein erneuter Aufruf ist ein No-Op.
    pub async fn schluessel_aktivieren(
        &self,
        fingerprint: &str,
    ) -> VerteilungResult<AktivierungsErgebnis> {
        let schluessel = self
            .db
            .schluessel_nach_fingerprint(fingerprint)
            .await?
            .ok_or_else(|| {
                VerteilungError::NichtGefunden(format!("Schluessel {fingerprint}"))
            })?;

        let erstmalig = self
            .db
            .schluessel_aktivieren(schluessel.id, chrono::Utc::now())
            .await?;

        let benutzer = self
            .db
            .benutzer_nach_id(schluessel.benutzer_id)
            .await?
            .ok_or_else(|| VerteilungError::Intern("Schluessel ohne Benutzer".into()))?;

        if erstmalig {
            info!(fingerprint = %fingerprint, email = %benutzer.email, "Schluessel aktiviert");
        }

        Ok(AktivierungsErgebnis {
            fingerprint: schluessel.fingerprint,
            email: benutzer.email,
            name: benutzer.name,
            erstmalig,
        })
    }

    /// Loest einen Fingerprint zur Anmeldung auf. Der Schluessel muss
    /// existieren und aktiviert sein.
    pub async fn anmelden(
        &self,
        fingerprint: &str,
    ) -> VerteilungResult<(BenutzerRecord, SchluesselRecord)> {
        let schluessel = self
            .db
            .schluessel_nach_fingerprint(fingerprint)
            .await?
            .ok_or_else(|| {
                VerteilungError::NichtGefunden(format!("Schluessel {fingerprint}"))
            })?;

        if !schluessel.ist_aktiv() {
            return Err(VerteilungError::KeineBerechtigung(format!(
                "Schluessel {fingerprint} ist nicht aktiviert"
            )));
        }

        let benutzer = self
            .db
            .benutzer_nach_id(schluessel.benutzer_id)
            .await?
            .ok_or_else(|| VerteilungError::Intern("Schluessel ohne Benutzer".into()))?;

        Ok((benutzer, schluessel))
    }
}
