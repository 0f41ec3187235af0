//! SQLite-Implementierung des CredentialRepository

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{CredentialKeyRecord, CredentialWertRecord, NeuerCredentialWert};
use crate::repository::{CredentialRepository, DbResult};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_uuid, parse_zeit, parse_zeit_opt};

#[async_trait]
impl CredentialRepository for SqliteDb {
    async fn credential_key_erstellen(
        &self,
        projekt_id: Uuid,
        name: &str,
    ) -> DbResult<CredentialKeyRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        sqlx::query(
            "INSERT INTO credential_keys (id, projekt_id, name, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(projekt_id.to_string())
        .bind(name)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!("Credential '{name}' existiert bereits im Projekt"))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(CredentialKeyRecord {
            id,
            projekt_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn credential_key_nach_name(
        &self,
        projekt_id: Uuid,
        name: &str,
    ) -> DbResult<Option<CredentialKeyRecord>> {
        let row = sqlx::query(
            "SELECT id, projekt_id, name, created_at, updated_at
             FROM credential_keys WHERE projekt_id = ? AND name = ?",
        )
        .bind(projekt_id.to_string())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_key(&r)).transpose()
    }

    async fn credential_keys_fuer_projekt(
        &self,
        projekt_id: Uuid,
    ) -> DbResult<Vec<CredentialKeyRecord>> {
        let rows = sqlx::query(
            "SELECT id, projekt_id, name, created_at, updated_at
             FROM credential_keys WHERE projekt_id = ? ORDER BY name",
        )
        .bind(projekt_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_key).collect()
    }

    async fn credential_key_loeschen(&self, id: Uuid) -> DbResult<bool> {
        // Werte zuerst, dann der Name selbst
        self.credential_werte_loeschen(id).await?;

        let affected = sqlx::query("DELETE FROM credential_keys WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn credential_wert_setzen(
        &self,
        data: NeuerCredentialWert<'_>,
    ) -> DbResult<CredentialWertRecord> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();

        // Pro (Credential, Empfaenger-Schluessel) existiert hoechstens ein
        // Wert; eine Rotation ueberschreibt den Geheimtext in-place.
        sqlx::query(
            "INSERT INTO credential_values
                 (id, credential_id, mitglied_id, schluessel_id, geheimtext, expires_at,
                  created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (credential_id, schluessel_id)
             DO UPDATE SET geheimtext = excluded.geheimtext,
                           mitglied_id = excluded.mitglied_id,
                           expires_at = excluded.expires_at,
                           updated_at = excluded.updated_at",
        )
        .bind(id.to_string())
        .bind(data.credential_id.to_string())
        .bind(data.mitglied_id.to_string())
        .bind(data.schluessel_id.to_string())
        .bind(data.geheimtext)
        .bind(data.expires_at.map(|t| t.to_rfc3339()))
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        self.credential_wert_fuer_schluessel(data.credential_id, data.schluessel_id)
            .await?
            .ok_or_else(|| DbError::intern("Credential-Wert nach Upsert nicht gefunden"))
    }

    async fn credential_wert_fuer_schluessel(
        &self,
        credential_id: Uuid,
        schluessel_id: Uuid,
    ) -> DbResult<Option<CredentialWertRecord>> {
        let row = sqlx::query(
            "SELECT id, credential_id, mitglied_id, schluessel_id, geheimtext, expires_at,
                    created_at, updated_at
             FROM credential_values WHERE credential_id = ? AND schluessel_id = ?",
        )
        .bind(credential_id.to_string())
        .bind(schluessel_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_wert(&r)).transpose()
    }

    async fn credential_werte(&self, credential_id: Uuid) -> DbResult<Vec<CredentialWertRecord>> {
        let rows = sqlx::query(
            "SELECT id, credential_id, mitglied_id, schluessel_id, geheimtext, expires_at,
                    created_at, updated_at
             FROM credential_values WHERE credential_id = ? ORDER BY created_at",
        )
        .bind(credential_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_wert).collect()
    }

    async fn credential_werte_loeschen(&self, credential_id: Uuid) -> DbResult<u64> {
        let affected = sqlx::query("DELETE FROM credential_values WHERE credential_id = ?")
            .bind(credential_id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }
}

fn row_to_key(row: &sqlx::sqlite::SqliteRow) -> DbResult<CredentialKeyRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let projekt_id_str: String = row.try_get("projekt_id")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    Ok(CredentialKeyRecord {
        id: parse_uuid(&id_str)?,
        projekt_id: parse_uuid(&projekt_id_str)?,
        name: row.try_get("name")?,
        created_at: parse_zeit(&created_at_str)?,
        updated_at: parse_zeit(&updated_at_str)?,
    })
}

fn row_to_wert(row: &sqlx::sqlite::SqliteRow) -> DbResult<CredentialWertRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let credential_id_str: String = row.try_get("credential_id")?;
    let mitglied_id_str: String = row.try_get("mitglied_id")?;
    let schluessel_id_str: String = row.try_get("schluessel_id")?;
    let expires_at: Option<String> = row.try_get("expires_at")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    Ok(CredentialWertRecord {
        id: parse_uuid(&id_str)?,
        credential_id: parse_uuid(&credential_id_str)?,
        mitglied_id: parse_uuid(&mitglied_id_str)?,
        schluessel_id: parse_uuid(&schluessel_id_str)?,
        geheimtext: row.try_get("geheimtext")?,
        expires_at: parse_zeit_opt(expires_at.as_deref())?,
        created_at: parse_zeit(&created_at_str)?,
        updated_at: parse_zeit(&updated_at_str)?,
    })
}
