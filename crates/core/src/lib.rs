//! tresor-core – Gemeinsame Typen und Fehler
//!
//! Enthaelt die ID-Newtypes, Zugriffsstufen und den zentralen
//! Fehler-Enum, die von allen anderen Crates verwendet werden.

pub mod error;
pub mod types;

pub use error::{Result, TresorError};
pub use types::{
    email_normalisieren, BenutzerId, CredentialId, Fingerprint, KlientArt, MitgliedId,
    NachrichtId, ProjektId, SchluesselId, ZugriffsStufe,
};
