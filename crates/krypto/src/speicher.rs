//! Speicher-Engine: deterministische In-Memory-Implementierung fuer Tests
//!
//! Kein echtes Kryptosystem. Geheimtexte haben die Form
//! `tresor-ct:<fingerprint>:<base64(klartext)>`, damit Tests pruefen
//! koennen fuer welchen Empfaenger verschluesselt wurde.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::engine::{KryptoEngine, SchluesselInfo};
use crate::error::{KryptoError, KryptoResult};

const PREFIX: &str = "tresor-ct";

#[derive(Debug, Clone)]
struct HinterlegterSchluessel {
    email: String,
    name: String,
    kommentar: String,
}

/// In-Memory-Engine mit steuerbaren Fehlschlaegen
#[derive(Default)]
pub struct SpeicherEngine {
    schluessel: RwLock<HashMap<String, HinterlegterSchluessel>>,
    fehlschlaege: RwLock<HashSet<String>>,
}

impl SpeicherEngine {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert einen Schluessel direkt, ohne den Importpfad
    pub fn schluessel_hinterlegen(&self, fingerprint: &str, email: &str, name: &str) {
        self.schluessel.write().insert(
            fingerprint.to_string(),
            HinterlegterSchluessel {
                email: email.to_string(),
                name: name.to_string(),
                kommentar: String::new(),
            },
        );
    }

    /// Laesst jede Verschluesselung fuer diesen Fingerprint fehlschlagen
    pub fn fehlschlag_markieren(&self, fingerprint: &str) {
        self.fehlschlaege.write().insert(fingerprint.to_string());
    }

    /// Zerlegt einen Speicher-Geheimtext in (Fingerprint, Klartext)
    pub fn geheimtext_zerlegen(geheimtext: &str) -> KryptoResult<(String, Vec<u8>)> {
        let mut teile = geheimtext.splitn(3, ':');
        match (teile.next(), teile.next(), teile.next()) {
            (Some(PREFIX), Some(fp), Some(b64)) => {
                let klartext = BASE64.decode(b64).map_err(|e| {
                    KryptoError::Entschluesselung(format!("Ungueltiges Base64: {e}"))
                })?;
                Ok((fp.to_string(), klartext))
            }
            _ => Err(KryptoError::Entschluesselung(
                "Kein Speicher-Geheimtext".into(),
            )),
        }
    }
}

#[async_trait]
impl KryptoEngine for SpeicherEngine {
    async fn verschluesseln(&self, fingerprint: &str, klartext: &[u8]) -> KryptoResult<String> {
        if self.fehlschlaege.read().contains(fingerprint) {
            return Err(KryptoError::Verschluesselung(format!(
                "Fehlschlag injiziert fuer {fingerprint}"
            )));
        }
        if !self.schluessel.read().contains_key(fingerprint) {
            return Err(KryptoError::UnbekannterSchluessel {
                fingerprint: fingerprint.to_string(),
            });
        }

        Ok(format!(
            "{PREFIX}:{fingerprint}:{}",
            BASE64.encode(klartext)
        ))
    }

    async fn entschluesseln(&self, geheimtext: &str) -> KryptoResult<Vec<u8>> {
        let (_, klartext) = Self::geheimtext_zerlegen(geheimtext)?;
        Ok(klartext)
    }

    /// Erwartet Material der Form `fingerprint:email:name[:kommentar]`
    async fn schluessel_importieren(&self, key_material: &str) -> KryptoResult<SchluesselInfo> {
        let teile: Vec<&str> = key_material.trim().split(':').collect();
        if teile.len() < 3 || teile.iter().take(3).any(|t| t.is_empty()) {
            return Err(KryptoError::SchluesselImport(
                "Erwarte 'fingerprint:email:name[:kommentar]'".into(),
            ));
        }

        let info = SchluesselInfo {
            fingerprint: teile[0].to_string(),
            email: teile[1].to_string(),
            name: teile[2].to_string(),
            kommentar: teile.get(3).unwrap_or(&"").to_string(),
            ablauf: None,
        };

        self.schluessel.write().insert(
            info.fingerprint.clone(),
            HinterlegterSchluessel {
                email: info.email.clone(),
                name: info.name.clone(),
                kommentar: info.kommentar.clone(),
            },
        );

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verschluesseln_und_entschluesseln() {
        let engine = SpeicherEngine::neu();
        engine.schluessel_hinterlegen("FP01", "a@example.org", "A");

        let ct = engine.verschluesseln("FP01", b"geheim").await.unwrap();
        assert!(ct.starts_with("tresor-ct:FP01:"));

        let klartext = engine.entschluesseln(&ct).await.unwrap();
        assert_eq!(klartext, b"geheim");
    }

    #[tokio::test]
    async fn unbekannter_fingerprint() {
        let engine = SpeicherEngine::neu();
        let err = engine.verschluesseln("FEHLT", b"x").await;
        assert!(matches!(
            err,
            Err(KryptoError::UnbekannterSchluessel { .. })
        ));
    }

    #[tokio::test]
    async fn injizierter_fehlschlag() {
        let engine = SpeicherEngine::neu();
        engine.schluessel_hinterlegen("FP01", "a@example.org", "A");
        engine.fehlschlag_markieren("FP01");

        let err = engine.verschluesseln("FP01", b"x").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn import_mit_kommentar() {
        let engine = SpeicherEngine::neu();
        let info = engine
            .schluessel_importieren("FP02:b@example.org:Bob:Ops")
            .await
            .unwrap();

        assert_eq!(info.fingerprint, "FP02");
        assert_eq!(info.kommentar, "Ops");

        // Danach ist der Schluessel nutzbar
        assert!(engine.verschluesseln("FP02", b"x").await.is_ok());
    }

    #[tokio::test]
    async fn import_ungueltiges_material() {
        let engine = SpeicherEngine::neu();
        assert!(engine.schluessel_importieren("nur-ein-feld").await.is_err());
    }
}
