//! tresor-hub – TCP Control Layer und Verbindungs-Registry
//!
//! Dieser Crate implementiert den Verbindungs-Hub fuer Tresor. Er
//! verwaltet TCP-Verbindungen, den Hallo-Handshake ueber den
//! Schluessel-Fingerprint, die Projekt-Operationen der Headless-Clients
//! und die Live-Zustellung frisch verschluesselter Artefakte.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (VerbindungsServer)
//!     |
//!     v
//! KlientVerbindung (pro Verbindung ein Task)
//!     |  Handshake: Hallo -> Anmeldung ueber Fingerprint -> HalloAntwort
//!     |
//!     +-- OperationsDispatcher  (Projekt-/Credential-Operationen, Ping)
//!     |
//!     v
//! VerbindungsHub – eine Schleife besitzt die Fingerprint-Registry
//!     |  registrieren: Takeover verdraengt die alte Verbindung
//!     |  zustellen:    Artefakte pro Fingerprint, volle Queue = Verdraengung
//!     |  ereignis:     Erst-Aktivierungen an alle Clients
//! ```

pub mod dispatcher;
pub mod error;
pub mod hub;
pub mod server_state;
pub mod tcp;
pub mod verbindung;

// Bequeme Re-Exporte
pub use dispatcher::{OperationsDispatcher, VerbindungsKontext, ARGUMENT_FEHLER};
pub use error::{HubError, HubResult};
pub use hub::{Registrierung, VerbindungsHub, SEND_QUEUE_GROESSE};
pub use server_state::{HubConfig, HubState};
pub use tcp::VerbindungsServer;
pub use verbindung::KlientVerbindung;
