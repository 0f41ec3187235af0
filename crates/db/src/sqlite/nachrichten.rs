//! SQLite-Implementierung des NachrichtenRepository

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{NachrichtRecord, NeueNachricht};
use crate::repository::{DbResult, NachrichtenRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_uuid, parse_zeit};

#[async_trait]
impl NachrichtenRepository for SqliteDb {
    async fn nachricht_erstellen(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO encrypted_messages
                 (id, schluessel_id, absender_id, betreff, geheimtext, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.schluessel_id.to_string())
        .bind(data.absender_id.to_string())
        .bind(data.betreff)
        .bind(data.geheimtext)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(NachrichtRecord {
            id,
            schluessel_id: data.schluessel_id,
            absender_id: data.absender_id,
            betreff: data.betreff.to_string(),
            geheimtext: data.geheimtext.to_string(),
            created_at: now,
        })
    }

    async fn nachrichten_fuer_schluessel(
        &self,
        schluessel_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<NachrichtRecord>> {
        let rows = sqlx::query(
            "SELECT id, schluessel_id, absender_id, betreff, geheimtext, created_at
             FROM encrypted_messages
             WHERE schluessel_id = ?
             ORDER BY created_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(schluessel_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_nachricht).collect()
    }
}

fn row_to_nachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<NachrichtRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let schluessel_id_str: String = row.try_get("schluessel_id")?;
    let absender_id_str: String = row.try_get("absender_id")?;
    let created_at_str: String = row.try_get("created_at")?;

    Ok(NachrichtRecord {
        id: parse_uuid(&id_str)?,
        schluessel_id: parse_uuid(&schluessel_id_str)?,
        absender_id: parse_uuid(&absender_id_str)?,
        betreff: row.try_get("betreff")?,
        geheimtext: row.try_get("geheimtext")?,
        created_at: parse_zeit(&created_at_str)?,
    })
}
