//! SQLite-Implementierung des ProjektRepository

use async_trait::async_trait;
use chrono::Utc;
use std::str::FromStr;
use tresor_core::ZugriffsStufe;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{MitgliedRecord, NeuesMitglied, NeuesProjekt, ProjektRecord, ProjektUpdate};
use crate::repository::{DbResult, ProjektRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_uuid, parse_zeit};

#[async_trait]
impl ProjektRepository for SqliteDb {
    async fn projekt_erstellen(&self, data: NeuesProjekt<'_>) -> DbResult<ProjektRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        sqlx::query(
            "INSERT INTO projects (id, name, umgebung, standard_zugriff, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.name)
        .bind(data.umgebung)
        .bind(data.standard_zugriff.als_str())
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        Ok(ProjektRecord {
            id,
            name: data.name.to_string(),
            umgebung: data.umgebung.to_string(),
            standard_zugriff: data.standard_zugriff,
            created_at: now,
            updated_at: now,
        })
    }

    async fn projekt_nach_id(&self, id: Uuid) -> DbResult<Option<ProjektRecord>> {
        let row = sqlx::query(
            "SELECT id, name, umgebung, standard_zugriff, created_at, updated_at
             FROM projects WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_projekt(&r)).transpose()
    }

    async fn projekt_aktualisieren(
        &self,
        id: Uuid,
        data: ProjektUpdate,
    ) -> DbResult<ProjektRecord> {
        let mut sets: Vec<&str> = Vec::new();
        if data.name.is_some() {
            sets.push("name = ?");
        }
        if data.umgebung.is_some() {
            sets.push("umgebung = ?");
        }
        if data.standard_zugriff.is_some() {
            sets.push("standard_zugriff = ?");
        }

        if sets.is_empty() {
            return self
                .projekt_nach_id(id)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden(format!("Projekt {id}")));
        }

        sets.push("updated_at = ?");
        let sql = format!("UPDATE projects SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(ref v) = data.name {
            q = q.bind(v);
        }
        if let Some(ref v) = data.umgebung {
            q = q.bind(v);
        }
        if let Some(v) = data.standard_zugriff {
            q = q.bind(v.als_str());
        }
        q = q.bind(Utc::now().to_rfc3339());
        q = q.bind(id.to_string());

        let affected = q.execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Projekt {id}")));
        }

        self.projekt_nach_id(id)
            .await?
            .ok_or_else(|| DbError::intern("Projekt nach Update nicht gefunden"))
    }

    async fn projekt_loeschen(&self, id: Uuid) -> DbResult<bool> {
        // Mitglieder, Credential-Namen und -Werte haengen per ON DELETE
        // CASCADE am Projekt.
        let affected = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn projekte_fuer_benutzer(&self, benutzer_id: Uuid) -> DbResult<Vec<ProjektRecord>> {
        let rows = sqlx::query(
            "SELECT p.id, p.name, p.umgebung, p.standard_zugriff, p.created_at, p.updated_at
             FROM projects p
             JOIN project_members m ON m.projekt_id = p.id
             WHERE m.benutzer_id = ?
             ORDER BY p.name",
        )
        .bind(benutzer_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_projekt).collect()
    }

    async fn mitglied_setzen(&self, data: NeuesMitglied) -> DbResult<MitgliedRecord> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();

        // Upsert: existiert die Mitgliedschaft bereits, wird nur die
        // Zugriffsstufe angepasst.
        sqlx::query(
            "INSERT INTO project_members
                 (id, projekt_id, benutzer_id, zugriff, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (projekt_id, benutzer_id)
             DO UPDATE SET zugriff = excluded.zugriff, updated_at = excluded.updated_at",
        )
        .bind(id.to_string())
        .bind(data.projekt_id.to_string())
        .bind(data.benutzer_id.to_string())
        .bind(data.zugriff.als_str())
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        self.mitglied_nach_benutzer(data.projekt_id, data.benutzer_id)
            .await?
            .ok_or_else(|| DbError::intern("Mitglied nach Upsert nicht gefunden"))
    }

    async fn mitglied_nach_benutzer(
        &self,
        projekt_id: Uuid,
        benutzer_id: Uuid,
    ) -> DbResult<Option<MitgliedRecord>> {
        let row = sqlx::query(
            "SELECT id, projekt_id, benutzer_id, zugriff, created_at, updated_at
             FROM project_members WHERE projekt_id = ? AND benutzer_id = ?",
        )
        .bind(projekt_id.to_string())
        .bind(benutzer_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_mitglied(&r)).transpose()
    }

    async fn mitglieder_fuer_projekt(&self, projekt_id: Uuid) -> DbResult<Vec<MitgliedRecord>> {
        let rows = sqlx::query(
            "SELECT id, projekt_id, benutzer_id, zugriff, created_at, updated_at
             FROM project_members WHERE projekt_id = ? ORDER BY created_at",
        )
        .bind(projekt_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_mitglied).collect()
    }

    async fn mitglied_loeschen(&self, projekt_id: Uuid, benutzer_id: Uuid) -> DbResult<bool> {
        // Credential-Werte des Mitglieds haengen per ON DELETE CASCADE
        // an der Mitgliedschaft.
        let affected =
            sqlx::query("DELETE FROM project_members WHERE projekt_id = ? AND benutzer_id = ?")
                .bind(projekt_id.to_string())
                .bind(benutzer_id.to_string())
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(affected > 0)
    }
}

fn row_to_projekt(row: &sqlx::sqlite::SqliteRow) -> DbResult<ProjektRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let zugriff_str: String = row.try_get("standard_zugriff")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    let standard_zugriff = ZugriffsStufe::from_str(&zugriff_str)
        .map_err(|_| DbError::intern(format!("Ungueltige Zugriffsstufe '{zugriff_str}'")))?;

    Ok(ProjektRecord {
        id: parse_uuid(&id_str)?,
        name: row.try_get("name")?,
        umgebung: row.try_get("umgebung")?,
        standard_zugriff,
        created_at: parse_zeit(&created_at_str)?,
        updated_at: parse_zeit(&updated_at_str)?,
    })
}

fn row_to_mitglied(row: &sqlx::sqlite::SqliteRow) -> DbResult<MitgliedRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let projekt_id_str: String = row.try_get("projekt_id")?;
    let benutzer_id_str: String = row.try_get("benutzer_id")?;
    let zugriff_str: String = row.try_get("zugriff")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    let zugriff = ZugriffsStufe::from_str(&zugriff_str)
        .map_err(|_| DbError::intern(format!("Ungueltige Zugriffsstufe '{zugriff_str}'")))?;

    Ok(MitgliedRecord {
        id: parse_uuid(&id_str)?,
        projekt_id: parse_uuid(&projekt_id_str)?,
        benutzer_id: parse_uuid(&benutzer_id_str)?,
        zugriff,
        created_at: parse_zeit(&created_at_str)?,
        updated_at: parse_zeit(&updated_at_str)?,
    })
}
