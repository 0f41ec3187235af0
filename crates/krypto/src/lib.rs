//! tresor-krypto – Kryptografie-Subsystem
//!
//! Kapselt die asymmetrische Verschluesselung hinter dem `KryptoEngine`-
//! Trait. Produktiv laeuft die `GpgEngine` (gpg-Subprozess), Tests nutzen
//! die deterministische `SpeicherEngine`.

pub mod engine;
pub mod error;
pub mod gpg;
pub mod speicher;

pub use engine::{KryptoEngine, SchluesselInfo};
pub use error::{KryptoError, KryptoResult};
pub use gpg::{GpgConfig, GpgEngine};
pub use speicher::SpeicherEngine;
