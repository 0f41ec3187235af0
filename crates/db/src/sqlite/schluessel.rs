//! SQLite-Implementierung des SchluesselRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NeuerSchluessel, SchluesselRecord, SchluesselUpdate};
use crate::repository::{DbResult, SchluesselRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_uuid, parse_zeit, parse_zeit_opt};

const SELECT_FELDER: &str = "id, benutzer_id, fingerprint, key_material, activated_at, \
                             expires_at, created_at, updated_at";

#[async_trait]
impl SchluesselRepository for SqliteDb {
    async fn schluessel_erstellen(&self, data: NeuerSchluessel<'_>) -> DbResult<SchluesselRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        sqlx::query(
            "INSERT INTO public_keys
                 (id, benutzer_id, fingerprint, key_material, activated_at, expires_at,
                  created_at, updated_at)
             VALUES (?, ?, ?, ?, NULL, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.benutzer_id.to_string())
        .bind(data.fingerprint)
        .bind(data.key_material)
        .bind(data.expires_at.map(|t| t.to_rfc3339()))
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!(
                    "Fingerprint '{}' bereits registriert",
                    data.fingerprint
                ))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(SchluesselRecord {
            id,
            benutzer_id: data.benutzer_id,
            fingerprint: data.fingerprint.to_string(),
            key_material: data.key_material.to_string(),
            activated_at: None,
            expires_at: data.expires_at,
            created_at: now,
            updated_at: now,
        })
    }

    async fn schluessel_nach_id(&self, id: Uuid) -> DbResult<Option<SchluesselRecord>> {
        let sql = format!("SELECT {SELECT_FELDER} FROM public_keys WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_schluessel(&r)).transpose()
    }

    async fn schluessel_nach_fingerprint(
        &self,
        fingerprint: &str,
    ) -> DbResult<Option<SchluesselRecord>> {
        let sql = format!("SELECT {SELECT_FELDER} FROM public_keys WHERE fingerprint = ?");
        let row = sqlx::query(&sql)
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_schluessel(&r)).transpose()
    }

    async fn schluessel_aktualisieren(
        &self,
        id: Uuid,
        data: SchluesselUpdate,
    ) -> DbResult<SchluesselRecord> {
        let mut sets: Vec<&str> = Vec::new();
        if data.key_material.is_some() {
            sets.push("key_material = ?");
        }
        if data.expires_at.is_some() {
            sets.push("expires_at = ?");
        }

        if sets.is_empty() {
            return self
                .schluessel_nach_id(id)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden(format!("Schluessel {id}")));
        }

        sets.push("updated_at = ?");
        let sql = format!("UPDATE public_keys SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(ref v) = data.key_material {
            q = q.bind(v);
        }
        if let Some(v) = data.expires_at {
            q = q.bind(v.to_rfc3339());
        }
        q = q.bind(Utc::now().to_rfc3339());
        q = q.bind(id.to_string());

        let affected = q.execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Schluessel {id}")));
        }

        self.schluessel_nach_id(id)
            .await?
            .ok_or_else(|| DbError::intern("Schluessel nach Update nicht gefunden"))
    }

    async fn schluessel_aktivieren(&self, id: Uuid, zeitpunkt: DateTime<Utc>) -> DbResult<bool> {
        // Einbahnstrasse: nur setzen wenn noch NULL. rows_affected == 0
        // bedeutet der Schluessel war bereits aktiv (oder existiert nicht).
        let affected = sqlx::query(
            "UPDATE public_keys SET activated_at = ?, updated_at = ?
             WHERE id = ? AND activated_at IS NULL",
        )
        .bind(zeitpunkt.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 && self.schluessel_nach_id(id).await?.is_none() {
            return Err(DbError::nicht_gefunden(format!("Schluessel {id}")));
        }

        Ok(affected > 0)
    }

    async fn aktive_schluessel_fuer_benutzer(
        &self,
        benutzer_id: Uuid,
    ) -> DbResult<Vec<SchluesselRecord>> {
        let sql = format!(
            "SELECT {SELECT_FELDER} FROM public_keys
             WHERE benutzer_id = ? AND activated_at IS NOT NULL
             ORDER BY created_at"
        );
        let rows = sqlx::query(&sql)
            .bind(benutzer_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_schluessel).collect()
    }
}

fn row_to_schluessel(row: &sqlx::sqlite::SqliteRow) -> DbResult<SchluesselRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let benutzer_id_str: String = row.try_get("benutzer_id")?;
    let activated_at: Option<String> = row.try_get("activated_at")?;
    let expires_at: Option<String> = row.try_get("expires_at")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    Ok(SchluesselRecord {
        id: parse_uuid(&id_str)?,
        benutzer_id: parse_uuid(&benutzer_id_str)?,
        fingerprint: row.try_get("fingerprint")?,
        key_material: row.try_get("key_material")?,
        activated_at: parse_zeit_opt(activated_at.as_deref())?,
        expires_at: parse_zeit_opt(expires_at.as_deref())?,
        created_at: parse_zeit(&created_at_str)?,
        updated_at: parse_zeit(&updated_at_str)?,
    })
}
