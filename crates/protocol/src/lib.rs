//! tresor-protocol – Wire-Protokoll fuer Tresor
//!
//! Definiert den Request/Response-Wortschatz fuer Projekt-Operationen,
//! die Push-Artefakte des Hubs und den Frame-Codec fuer die persistente
//! bidirektionale Verbindung.

pub mod control;
pub mod wire;

pub use control::{
    AktivierungsArtefakt, AntwortNutzlast, AntwortStatus, CredentialInfo, HalloAnfrage,
    HalloAntwort, NachrichtArtefakt, OperationsAntwort, ProjektBefehl, ProjektInfo,
    ProjektOperation, Rahmen, RahmenInhalt,
};
pub use wire::RahmenCodec;
