//! Fehlertypen fuer die Fachlogik

use thiserror::Error;
use tresor_db::DbError;
use tresor_krypto::KryptoError;

/// Fehler der Verteilungs- und Projektlogik
#[derive(Debug, Error)]
pub enum VerteilungError {
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Keine Berechtigung: {0}")]
    KeineBerechtigung(String),

    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Schluessel {fingerprint} gehoert bereits einem anderen Benutzer")]
    SchluesselKonflikt { fingerprint: String },

    #[error("Empfaenger hat keine aktiven Schluessel: {0}")]
    KeineEmpfaenger(String),

    #[error("Verschluesselung fuer alle Empfaenger fehlgeschlagen: {0}")]
    AlleEmpfaengerFehlgeschlagen(String),

    #[error("Krypto-Fehler: {0}")]
    Krypto(#[from] KryptoError),

    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

pub type VerteilungResult<T> = Result<T, VerteilungError>;

impl From<VerteilungError> for tresor_core::TresorError {
    fn from(e: VerteilungError) -> Self {
        use tresor_core::TresorError;
        match e {
            VerteilungError::UngueltigeEingabe(msg) => TresorError::Validierung(msg),
            VerteilungError::KeineBerechtigung(msg) => TresorError::ZugriffVerweigert(msg),
            VerteilungError::NichtGefunden(msg) => TresorError::NichtGefunden(msg),
            VerteilungError::SchluesselKonflikt { fingerprint } => {
                TresorError::SchluesselBenutzerKonflikt { fingerprint }
            }
            VerteilungError::KeineEmpfaenger(msg) => TresorError::Validierung(msg),
            VerteilungError::AlleEmpfaengerFehlgeschlagen(msg) => TresorError::Krypto(msg),
            VerteilungError::Krypto(e) => TresorError::Krypto(e.to_string()),
            VerteilungError::Datenbank(e) => e.into(),
            VerteilungError::Intern(msg) => TresorError::Intern(msg),
        }
    }
}
