//! ProjektService – Projekte, Mitgliedschaften, Zugriffsstufen

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use tresor_core::{email_normalisieren, ZugriffsStufe};
use tresor_db::{
    models::{MitgliedRecord, NeuesMitglied, NeuesProjekt, ProjektRecord, ProjektUpdate},
    BenutzerRepository, ProjektRepository,
};

use crate::error::{VerteilungError, VerteilungResult};

/// Verwaltet Projekte und ihre Mitglieder
pub struct ProjektService<D> {
    db: Arc<D>,
}

impl<D> ProjektService<D>
where
    D: ProjektRepository + BenutzerRepository,
{
    pub fn neu(db: Arc<D>) -> Arc<Self> {
        Arc::new(Self { db })
    }

    /// Legt ein Projekt an; der Ersteller wird automatisch Admin.
    pub async fn projekt_erstellen(
        &self,
        ersteller_id: Uuid,
        name: &str,
        umgebung: &str,
        standard_zugriff: ZugriffsStufe,
    ) -> VerteilungResult<ProjektRecord> {
        if name.trim().is_empty() {
            return Err(VerteilungError::UngueltigeEingabe(
                "Projektname darf nicht leer sein".into(),
            ));
        }

        let projekt = self
            .db
            .projekt_erstellen(NeuesProjekt {
                name: name.trim(),
                umgebung,
                standard_zugriff,
            })
            .await?;

        self.db
            .mitglied_setzen(NeuesMitglied {
                projekt_id: projekt.id,
                benutzer_id: ersteller_id,
                zugriff: ZugriffsStufe::Admin,
            })
            .await?;

        info!(projekt = %projekt.name, "Projekt angelegt");
        Ok(projekt)
    }

    /// Aktualisiert Name oder Umgebung (nur Admins)
    pub async fn projekt_aktualisieren(
        &self,
        anfrager_id: Uuid,
        projekt_id: Uuid,
        update: ProjektUpdate,
    ) -> VerteilungResult<ProjektRecord> {
        self.admin_pruefen(projekt_id, anfrager_id).await?;
        Ok(self.db.projekt_aktualisieren(projekt_id, update).await?)
    }

    /// Loescht ein Projekt samt Mitgliedern und Credentials (nur Admins)
    pub async fn projekt_loeschen(
        &self,
        anfrager_id: Uuid,
        projekt_id: Uuid,
    ) -> VerteilungResult<()> {
        self.admin_pruefen(projekt_id, anfrager_id).await?;

        if !self.db.projekt_loeschen(projekt_id).await? {
            return Err(VerteilungError::NichtGefunden(format!(
                "Projekt {projekt_id}"
            )));
        }

        info!(projekt_id = %projekt_id, "Projekt geloescht");
        Ok(())
    }

    /// Alle Projekte in denen der Benutzer Mitglied ist
    pub async fn projekte_auflisten(
        &self,
        benutzer_id: Uuid,
    ) -> VerteilungResult<Vec<ProjektRecord>> {
        Ok(self.db.projekte_fuer_benutzer(benutzer_id).await?)
    }

    /// Fuegt ein Mitglied ueber seine E-Mail hinzu oder aendert dessen
    /// Zugriffsstufe (nur Admins). Ohne explizite Stufe gilt der
    /// `standard_zugriff` des Projekts.
    pub async fn mitglied_hinzufuegen(
        &self,
        anfrager_id: Uuid,
        projekt_id: Uuid,
        email: &str,
        zugriff: Option<ZugriffsStufe>,
    ) -> VerteilungResult<MitgliedRecord> {
        self.admin_pruefen(projekt_id, anfrager_id).await?;

        let zugriff = match zugriff {
            Some(stufe) => stufe,
            None => {
                self.db
                    .projekt_nach_id(projekt_id)
                    .await?
                    .ok_or_else(|| {
                        VerteilungError::NichtGefunden(format!("Projekt {projekt_id}"))
                    })?
                    .standard_zugriff
            }
        };

        let email = email_normalisieren(email);
        let benutzer = self
            .db
            .benutzer_nach_email(&email)
            .await?
            .ok_or_else(|| VerteilungError::NichtGefunden(format!("Benutzer {email}")))?;

        let mitglied = self
            .db
            .mitglied_setzen(NeuesMitglied {
                projekt_id,
                benutzer_id: benutzer.id,
                zugriff,
            })
            .await?;

        info!(projekt_id = %projekt_id, email = %email, zugriff = zugriff.als_str(), "Mitglied gesetzt");
        Ok(mitglied)
    }

    /// Entfernt ein Mitglied; dessen Credential-Werte verschwinden mit
    /// (nur Admins). Das Entfernen eines Nicht-Mitglieds ist ein No-Op.
    pub async fn mitglied_entfernen(
        &self,
        anfrager_id: Uuid,
        projekt_id: Uuid,
        benutzer_id: Uuid,
    ) -> VerteilungResult<()> {
        self.admin_pruefen(projekt_id, anfrager_id).await?;

        if self.db.mitglied_loeschen(projekt_id, benutzer_id).await? {
            info!(projekt_id = %projekt_id, benutzer_id = %benutzer_id, "Mitglied entfernt");
        } else {
            debug!(projekt_id = %projekt_id, benutzer_id = %benutzer_id, "Kein Mitglied, nichts zu entfernen");
        }
        Ok(())
    }

    /// Alle Mitglieder eines Projekts (nur Mitglieder duerfen einsehen)
    pub async fn mitglieder_auflisten(
        &self,
        anfrager_id: Uuid,
        projekt_id: Uuid,
    ) -> VerteilungResult<Vec<MitgliedRecord>> {
        self.mitglied_pruefen(projekt_id, anfrager_id).await?;
        Ok(self.db.mitglieder_fuer_projekt(projekt_id).await?)
    }

    /// Laedt die Mitgliedschaft oder lehnt mit `KeineBerechtigung` ab
    pub async fn mitglied_pruefen(
        &self,
        projekt_id: Uuid,
        benutzer_id: Uuid,
    ) -> VerteilungResult<MitgliedRecord> {
        self.db
            .mitglied_nach_benutzer(projekt_id, benutzer_id)
            .await?
            .ok_or_else(|| {
                VerteilungError::KeineBerechtigung("Kein Mitglied dieses Projekts".into())
            })
    }

    /// Wie `mitglied_pruefen`, verlangt zusaetzlich Admin-Zugriff
    pub async fn admin_pruefen(
        &self,
        projekt_id: Uuid,
        benutzer_id: Uuid,
    ) -> VerteilungResult<MitgliedRecord> {
        let mitglied = self.mitglied_pruefen(projekt_id, benutzer_id).await?;
        if !mitglied.zugriff.ist_admin() {
            return Err(VerteilungError::KeineBerechtigung(
                "Admin-Zugriff erforderlich".into(),
            ));
        }
        Ok(mitglied)
    }
}
