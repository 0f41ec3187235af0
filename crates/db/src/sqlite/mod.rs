//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod benutzer;
pub mod credentials;
pub mod nachrichten;
pub mod pool;
pub mod projekte;
pub mod schluessel;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::DbResult;

/// Parst eine als TEXT gespeicherte UUID
pub(crate) fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::intern(format!("Ungueltige UUID '{s}': {e}")))
}

/// Parst einen als RFC3339-TEXT gespeicherten Zeitstempel
pub(crate) fn parse_zeit(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltiger Zeitstempel '{s}': {e}")))
}

/// Parst einen optionalen Zeitstempel (NULL-Spalten)
pub(crate) fn parse_zeit_opt(s: Option<&str>) -> DbResult<Option<DateTime<Utc>>> {
    s.map(parse_zeit).transpose()
}
