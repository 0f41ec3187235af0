//! tresor-verteilung – Fachlogik
//!
//! Buendelt die Services hinter dem Wire-Protokoll: Identitaeten
//! (Schluessel-Import und Aktivierung), Projekte mit Zugriffsstufen,
//! Credentials mit Fan-out-Verschluesselung und Benutzer-Nachrichten.

pub mod credentials;
pub mod error;
pub mod fanout;
pub mod identitaet;
pub mod nachrichten;
pub mod projekte;

pub use credentials::{CredentialService, RotationsErgebnis};
pub use error::{VerteilungError, VerteilungResult};
pub use fanout::{fuer_schluessel_verschluesseln, FanoutErgebnis, Verschluesselt, ZielSchluessel};
pub use identitaet::{AktivierungsErgebnis, IdentitaetsService, ImportErgebnis};
pub use nachrichten::{NachrichtenService, VersandErgebnis, Zustellung};
pub use projekte::ProjektService;
