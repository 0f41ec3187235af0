//! GPG-Engine: Verschluesselung ueber das gpg-Kommandozeilenwerkzeug
//!
//! Alle Aufrufe laufen ueber einen tokio-Subprozess und werden durch
//! einen Mutex serialisiert, da GnuPG den Schluesselbund im Homedir
//! exklusiv sperrt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::engine::{KryptoEngine, SchluesselInfo};
use crate::error::{KryptoError, KryptoResult};

/// Konfiguration fuer die GPG-Engine
#[derive(Debug, Clone)]
pub struct GpgConfig {
    /// Pfad zum gpg-Binary
    pub gpg_pfad: String,
    /// Eigenes GnuPG-Homedir (None = Standard des Systems)
    pub home_dir: Option<PathBuf>,
}

impl Default for GpgConfig {
    fn default() -> Self {
        Self {
            gpg_pfad: "gpg".into(),
            home_dir: None,
        }
    }
}

/// Produktive Engine auf Basis des gpg-Binaries
pub struct GpgEngine {
    config: GpgConfig,
    // GnuPG sperrt pubring/trustdb exklusiv, daher nur ein Aufruf gleichzeitig
    lock: Mutex<()>,
}

impl GpgEngine {
    pub fn neu(config: GpgConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    /// Fuehrt gpg mit den gegebenen Argumenten aus, schreibt `stdin_daten`
    /// auf stdin und liefert stdout zurueck.
    async fn gpg_ausfuehren(&self, args: &[&str], stdin_daten: &[u8]) -> KryptoResult<Vec<u8>> {
        let mut cmd = Command::new(&self.config.gpg_pfad);

        if let Some(ref home) = self.config.home_dir {
            cmd.arg("--homedir").arg(home);
        }
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(args = ?args, "Starte gpg");

        let mut kind = cmd
            .spawn()
            .map_err(|e| KryptoError::ProzessStart(e.to_string()))?;

        if let Some(mut stdin) = kind.stdin.take() {
            stdin.write_all(stdin_daten).await?;
            stdin.shutdown().await?;
        }

        let output = kind.wait_with_output().await?;

        if !output.status.success() {
            return Err(KryptoError::GpgFehlgeschlagen {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl KryptoEngine for GpgEngine {
    async fn verschluesseln(&self, fingerprint: &str, klartext: &[u8]) -> KryptoResult<String> {
        let _guard = self.lock.lock().await;

        let stdout = self
            .gpg_ausfuehren(
                &[
                    "--batch",
                    "--quiet",
                    "--trust-model",
                    "always",
                    "--armor",
                    "--recipient",
                    fingerprint,
                    "--encrypt",
                ],
                klartext,
            )
            .await
            .map_err(|e| match e {
                KryptoError::GpgFehlgeschlagen { stderr, .. }
                    if stderr.contains("No public key") || stderr.contains("not found") =>
                {
                    KryptoError::UnbekannterSchluessel {
                        fingerprint: fingerprint.to_string(),
                    }
                }
                andere => andere,
            })?;

        String::from_utf8(stdout)
            .map_err(|e| KryptoError::Verschluesselung(format!("Ungueltiges UTF-8: {e}")))
    }

    async fn entschluesseln(&self, geheimtext: &str) -> KryptoResult<Vec<u8>> {
        let _guard = self.lock.lock().await;

        self.gpg_ausfuehren(&["--batch", "--quiet", "--decrypt"], geheimtext.as_bytes())
            .await
            .map_err(|e| match e {
                KryptoError::GpgFehlgeschlagen { stderr, code } => {
                    KryptoError::Entschluesselung(format!("gpg Exit-Code {code}: {stderr}"))
                }
                andere => andere,
            })
    }

    async fn schluessel_importieren(&self, key_material: &str) -> KryptoResult<SchluesselInfo> {
        let _guard = self.lock.lock().await;

        // Erst Metadaten extrahieren ohne zu importieren
        let colons = self
            .gpg_ausfuehren(
                &[
                    "--batch",
                    "--quiet",
                    "--with-colons",
                    "--import-options",
                    "show-only",
                    "--import",
                ],
                key_material.as_bytes(),
            )
            .await
            .map_err(|e| KryptoError::SchluesselImport(e.to_string()))?;

        let colons = String::from_utf8_lossy(&colons);
        let info = schluessel_info_aus_colons(&colons)?;

        // Dann tatsaechlich in den Schluesselbund uebernehmen
        self.gpg_ausfuehren(&["--batch", "--quiet", "--import"], key_material.as_bytes())
            .await
            .map_err(|e| KryptoError::SchluesselImport(e.to_string()))?;

        debug!(fingerprint = %info.fingerprint, email = %info.email, "Schluessel importiert");
        Ok(info)
    }
}

/// Extrahiert Fingerprint, UID und Ablaufdatum aus `--with-colons`-Ausgabe
fn schluessel_info_aus_colons(colons: &str) -> KryptoResult<SchluesselInfo> {
    let mut fingerprint: Option<String> = None;
    let mut uid: Option<String> = None;
    let mut ablauf: Option<DateTime<Utc>> = None;

    for zeile in colons.lines() {
        let felder: Vec<&str> = zeile.split(':').collect();
        match felder.first().copied() {
            Some("pub") => {
                // Feld 7: Ablauf als Unix-Epoche (leer = kein Ablauf)
                if let Some(epoche) = felder.get(6).filter(|s| !s.is_empty()) {
                    if let Ok(secs) = epoche.parse::<i64>() {
                        ablauf = DateTime::from_timestamp(secs, 0);
                    }
                }
            }
            // Der erste fpr-Eintrag gehoert zum Primaerschluessel
            Some("fpr") if fingerprint.is_none() => {
                fingerprint = felder.get(9).map(|s| s.to_string());
            }
            Some("uid") if uid.is_none() => {
                uid = felder.get(9).map(|s| s.to_string());
            }
            _ => {}
        }
    }

    let fingerprint = fingerprint
        .filter(|f| !f.is_empty())
        .ok_or_else(|| KryptoError::UngueltigeDaten("kein Fingerprint in gpg-Ausgabe".into()))?;
    let uid = uid
        .filter(|u| !u.is_empty())
        .ok_or_else(|| KryptoError::UngueltigeDaten("keine UID in gpg-Ausgabe".into()))?;

    let (name, kommentar, email) = uid_zerlegen(&uid)?;

    Ok(SchluesselInfo {
        fingerprint,
        email,
        name,
        kommentar,
        ablauf,
    })
}

/// Zerlegt eine UID der Form "Name (Kommentar) <email>" in ihre Teile
fn uid_zerlegen(uid: &str) -> KryptoResult<(String, String, String)> {
    let email = match (uid.rfind('<'), uid.rfind('>')) {
        (Some(start), Some(ende)) if start < ende => uid[start + 1..ende].trim().to_string(),
        _ => {
            return Err(KryptoError::UngueltigeDaten(format!(
                "UID ohne E-Mail-Adresse: '{uid}'"
            )))
        }
    };

    let vor_email = uid[..uid.rfind('<').unwrap_or(0)].trim();

    let (name, kommentar) = match (vor_email.rfind('('), vor_email.rfind(')')) {
        (Some(start), Some(ende)) if start < ende => (
            vor_email[..start].trim().to_string(),
            vor_email[start + 1..ende].trim().to_string(),
        ),
        _ => (vor_email.to_string(), String::new()),
    };

    Ok((name, kommentar, email))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLONS_BEISPIEL: &str = "\
pub:u:4096:1:AABBCCDD11223344:1700000000:1790000000::u:::scESC::::::23::0:
fpr:::::::::0123456789ABCDEF0123456789ABCDEF01234567:
uid:u::::1700000000::HASH::Max Mustermann (Arbeit) <max@example.org>::::::::::0:
sub:u:4096:1:5566778899AABBCC:1700000000::::::e::::::23:
fpr:::::::::FFFF6789ABCDEF0123456789ABCDEF01234567FF:
";

    #[test]
    fn colons_parsen() {
        let info = schluessel_info_aus_colons(COLONS_BEISPIEL).unwrap();
        assert_eq!(
            info.fingerprint,
            "0123456789ABCDEF0123456789ABCDEF01234567"
        );
        assert_eq!(info.name, "Max Mustermann");
        assert_eq!(info.kommentar, "Arbeit");
        assert_eq!(info.email, "max@example.org");
        assert!(info.ablauf.is_some());
    }

    #[test]
    fn colons_ohne_ablauf() {
        let colons = COLONS_BEISPIEL.replacen(":1790000000:", "::", 1);
        let info = schluessel_info_aus_colons(&colons).unwrap();
        assert!(info.ablauf.is_none());
    }

    #[test]
    fn colons_ohne_fingerprint_ist_fehler() {
        let err = schluessel_info_aus_colons("uid:u::::::::Max <m@x.de>::::::::::0:\n");
        assert!(err.is_err());
    }

    #[test]
    fn uid_mit_kommentar() {
        let (name, kommentar, email) = uid_zerlegen("Max Mustermann (Arbeit) <max@example.org>")
            .unwrap();
        assert_eq!(name, "Max Mustermann");
        assert_eq!(kommentar, "Arbeit");
        assert_eq!(email, "max@example.org");
    }

    #[test]
    fn uid_ohne_kommentar() {
        let (name, kommentar, email) = uid_zerlegen("Erika <erika@example.org>").unwrap();
        assert_eq!(name, "Erika");
        assert_eq!(kommentar, "");
        assert_eq!(email, "erika@example.org");
    }

    #[test]
    fn uid_ohne_email_ist_fehler() {
        assert!(uid_zerlegen("Nur ein Name").is_err());
    }
}
