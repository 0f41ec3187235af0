//! CredentialService – projektweite Geheimnisse pro Empfaenger-Schluessel
//!
//! Ein Credential ist ein Name innerhalb eines Projekts. Beim Setzen
//! wird der Klartext fuer jeden aktiven Schluessel jedes Mitglieds
//! einzeln verschluesselt; eine Rotation ueberschreibt die Werte
//! in-place. Werte laufen drei Monate nach dem Setzen ab.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use chrono::{Months, Utc};
use tresor_db::{
    models::{CredentialKeyRecord, CredentialWertRecord, NeuerCredentialWert},
    BenutzerRepository, CredentialRepository, ProjektRepository, SchluesselRepository,
};
use tresor_krypto::KryptoEngine;

use crate::error::{VerteilungError, VerteilungResult};
use crate::fanout::{fuer_schluessel_verschluesseln, ZielSchluessel};
use crate::projekte::ProjektService;

/// Gueltigkeitsdauer eines gesetzten Credential-Werts in Monaten
const ABLAUF_MONATE: u32 = 3;

/// Ergebnis einer Rotation: wie viele Werte gesetzt wurden und welche
/// Empfaenger uebersprungen werden mussten
#[derive(Debug)]
pub struct RotationsErgebnis {
    pub credential: CredentialKeyRecord,
    pub gesetzte_werte: usize,
    pub fehler: Vec<(String, String)>,
}

/// Verwaltet Credential-Namen und ihre verschluesselten Werte
pub struct CredentialService<D, K> {
    db: Arc<D>,
    engine: Arc<K>,
    projekte: Arc<ProjektService<D>>,
}

impl<D, K> CredentialService<D, K>
where
    D: CredentialRepository + ProjektRepository + SchluesselRepository + BenutzerRepository,
    K: KryptoEngine + 'static,
{
    pub fn neu(db: Arc<D>, engine: Arc<K>, projekte: Arc<ProjektService<D>>) -> Arc<Self> {
        Arc::new(Self {
            db,
            engine,
            projekte,
        })
    }

    /// Setzt oder rotiert ein Credential (nur Admins).
    ///
    /// Der Klartext wird fuer jeden aktiven Schluessel jedes Mitglieds
    /// verschluesselt. Einzelne Fehlschlaege werden uebersprungen und
    /// gemeldet; erst wenn kein einziger Wert gesetzt werden konnte,
    /// schlaegt die Operation fehl.
    pub async fn credential_setzen(
        &self,
        anfrager_id: Uuid,
        projekt_id: Uuid,
        name: &str,
        klartext: &[u8],
    ) -> VerteilungResult<RotationsErgebnis> {
        if name.trim().is_empty() {
            return Err(VerteilungError::UngueltigeEingabe(
                "Credential-Name darf nicht leer sein".into(),
            ));
        }
        if klartext.is_empty() {
            return Err(VerteilungError::UngueltigeEingabe(
                "Credential-Wert darf nicht leer sein".into(),
            ));
        }

        self.projekte.admin_pruefen(projekt_id, anfrager_id).await?;

        let credential = match self.db.credential_key_nach_name(projekt_id, name.trim()).await? {
            Some(vorhanden) => vorhanden,
            None => {
                self.db
                    .credential_key_erstellen(projekt_id, name.trim())
                    .await?
            }
        };

        // Ziele einsammeln: jeder aktive Schluessel jedes Mitglieds
        let mut ziele = Vec::new();
        let mut mitglied_je_schluessel: HashMap<Uuid, Uuid> = HashMap::new();
        for m in self.db.mitglieder_fuer_projekt(projekt_id).await? {
            for schluessel in self.db.aktive_schluessel_fuer_benutzer(m.benutzer_id).await? {
                mitglied_je_schluessel.insert(schluessel.id, m.id);
                ziele.push(ZielSchluessel {
                    schluessel_id: schluessel.id,
                    fingerprint: schluessel.fingerprint,
                });
            }
        }

        if ziele.is_empty() {
            return Err(VerteilungError::KeineEmpfaenger(
                "Kein Mitglied hat einen aktiven Schluessel".into(),
            ));
        }

        let ergebnis = fuer_schluessel_verschluesseln(
            Arc::clone(&self.engine),
            ziele,
            Arc::new(klartext.to_vec()),
        )
        .await?;

        let ablauf = Utc::now().checked_add_months(Months::new(ABLAUF_MONATE));

        let mut gesetzte_werte = 0;
        for verschluesselt in &ergebnis.erfolge {
            let mitglied_id = mitglied_je_schluessel
                .get(&verschluesselt.ziel.schluessel_id)
                .copied()
                .ok_or_else(|| VerteilungError::Intern("Ziel ohne Mitglied".into()))?;

            self.db
                .credential_wert_setzen(NeuerCredentialWert {
                    credential_id: credential.id,
                    mitglied_id,
                    schluessel_id: verschluesselt.ziel.schluessel_id,
                    geheimtext: &verschluesselt.geheimtext,
                    expires_at: ablauf,
                })
                .await?;
            gesetzte_werte += 1;
        }

        let fehler: Vec<(String, String)> = ergebnis
            .fehler
            .into_iter()
            .map(|(ziel, msg)| (ziel.fingerprint, msg))
            .collect();

        info!(
            projekt_id = %projekt_id,
            credential = %credential.name,
            werte = gesetzte_werte,
            uebersprungen = fehler.len(),
            "Credential gesetzt"
        );

        Ok(RotationsErgebnis {
            credential,
            gesetzte_werte,
            fehler,
        })
    }

    /// Liest den fuer den angegebenen Schluessel verschluesselten Wert
    pub async fn credential_lesen(
        &self,
        anfrager_id: Uuid,
        projekt_id: Uuid,
        name: &str,
        schluessel_id: Uuid,
    ) -> VerteilungResult<CredentialWertRecord> {
        self.projekte.mitglied_pruefen(projekt_id, anfrager_id).await?;

        let credential = self
            .db
            .credential_key_nach_name(projekt_id, name)
            .await?
            .ok_or_else(|| VerteilungError::NichtGefunden(format!("Credential {name}")))?;

        self.db
            .credential_wert_fuer_schluessel(credential.id, schluessel_id)
            .await?
            .ok_or_else(|| {
                VerteilungError::NichtGefunden(format!(
                    "Kein Wert von '{name}' fuer diesen Schluessel"
                ))
            })
    }

    /// Loescht ein Credential samt aller Werte (Werte zuerst, nur Admins)
    pub async fn credential_entfernen(
        &self,
        anfrager_id: Uuid,
        projekt_id: Uuid,
        name: &str,
    ) -> VerteilungResult<()> {
        self.projekte.admin_pruefen(projekt_id, anfrager_id).await?;

        let credential = self
            .db
            .credential_key_nach_name(projekt_id, name)
            .await?
            .ok_or_else(|| VerteilungError::NichtGefunden(format!("Credential {name}")))?;

        self.db.credential_key_loeschen(credential.id).await?;

        info!(projekt_id = %projekt_id, credential = %name, "Credential geloescht");
        Ok(())
    }

    /// Alle Credential-Namen eines Projekts
    pub async fn credentials_auflisten(
        &self,
        anfrager_id: Uuid,
        projekt_id: Uuid,
    ) -> VerteilungResult<Vec<CredentialKeyRecord>> {
        self.projekte.mitglied_pruefen(projekt_id, anfrager_id).await?;
        Ok(self.db.credential_keys_fuer_projekt(projekt_id).await?)
    }
}
