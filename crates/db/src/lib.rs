//! tresor-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern bereit: die Services
//! arbeiten gegen Traits, `SqliteDb` liefert die SQLite-Implementierung
//! (WAL-Modus, Migrationen via `sqlx::migrate!`).

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{
    BenutzerRepository, CredentialRepository, DatabaseConfig, DbResult, NachrichtenRepository,
    ProjektRepository, SchluesselRepository,
};
pub use sqlite::SqliteDb;
