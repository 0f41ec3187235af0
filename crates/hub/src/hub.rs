//! Verbindungs-Hub – verteilt Push-Artefakte an verbundene Clients
//!
//! Der Hub besitzt die Zuordnung Fingerprint -> Verbindung exklusiv:
//! eine einzige Schleife konsumiert vier Befehls-Kanaele und wendet
//! jeden Befehl in Ankunftsreihenfolge vollstaendig an, bevor der
//! naechste gelesen wird. Kein anderer Task fasst die Registry an.
//!
//! ## Verdraengung
//! - Registriert sich ein Fingerprint erneut, verliert die alte
//!   Verbindung (Takeover). Ihr Sende-Kanal wird geschlossen, worauf
//!   ihre Verbindungs-Schleife den Transport abbaut.
//! - Ist die Sende-Queue beim Zustellen voll, wird der Client
//!   verdraengt statt die Hub-Schleife zu blockieren.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use tresor_core::KlientArt;
use tresor_protocol::control::{AktivierungsArtefakt, NachrichtArtefakt, Rahmen, RahmenInhalt};

/// Groesse der Sende-Queue pro Verbindung
pub const SEND_QUEUE_GROESSE: usize = 64;

/// Kapazitaet der Befehls-Kanaele an die Hub-Schleife
const BEFEHLS_PUFFER: usize = 256;

// ---------------------------------------------------------------------------
// Befehle an die Hub-Schleife
// ---------------------------------------------------------------------------

/// Anmeldung einer frisch authentifizierten Verbindung
#[derive(Debug)]
pub struct Registrierung {
    pub fingerprint: String,
    pub verbindungs_id: Uuid,
    pub benutzer_id: Uuid,
    pub klient_art: KlientArt,
    /// Sende-Queue der Verbindung; der Hub haelt das einzige Sender-Ende
    pub tx: mpsc::Sender<Rahmen>,
}

#[derive(Debug)]
struct Abmeldung {
    fingerprint: String,
    verbindungs_id: Uuid,
}

// ---------------------------------------------------------------------------
// VerbindungsHub (Handle)
// ---------------------------------------------------------------------------

/// Handle auf die Hub-Schleife (Clone teilt die Kanaele)
#[derive(Clone)]
pub struct VerbindungsHub {
    registrieren_tx: mpsc::Sender<Registrierung>,
    abmelden_tx: mpsc::Sender<Abmeldung>,
    zustellen_tx: mpsc::Sender<Vec<(String, NachrichtArtefakt)>>,
    ereignis_tx: mpsc::Sender<AktivierungsArtefakt>,
    anzahl: Arc<AtomicUsize>,
}

impl VerbindungsHub {
    /// Startet die Hub-Schleife als eigenen Task und gibt das Handle zurueck
    pub fn starten(shutdown_rx: watch::Receiver<bool>) -> Self {
        let (registrieren_tx, registrieren_rx) = mpsc::channel(BEFEHLS_PUFFER);
        let (abmelden_tx, abmelden_rx) = mpsc::channel(BEFEHLS_PUFFER);
        let (zustellen_tx, zustellen_rx) = mpsc::channel(BEFEHLS_PUFFER);
        let (ereignis_tx, ereignis_rx) = mpsc::channel(BEFEHLS_PUFFER);
        let anzahl = Arc::new(AtomicUsize::new(0));

        tokio::spawn(hub_schleife(
            registrieren_rx,
            abmelden_rx,
            zustellen_rx,
            ereignis_rx,
            shutdown_rx,
            Arc::clone(&anzahl),
        ));

        Self {
            registrieren_tx,
            abmelden_tx,
            zustellen_tx,
            ereignis_tx,
            anzahl,
        }
    }

    /// Meldet eine Verbindung an; ein bereits registrierter Fingerprint
    /// fuehrt zum Takeover, nicht zu einem Fehler.
    pub async fn registrieren(&self, registrierung: Registrierung) {
        let _ = self.registrieren_tx.send(registrierung).await;
    }

    /// Meldet eine Verbindung ab. Wirkt nur wenn die Verbindungs-ID noch
    /// die registrierte ist; nach einem Takeover ist der Aufruf ein No-Op.
    pub async fn abmelden(&self, fingerprint: &str, verbindungs_id: Uuid) {
        let _ = self
            .abmelden_tx
            .send(Abmeldung {
                fingerprint: fingerprint.to_string(),
                verbindungs_id,
            })
            .await;
    }

    /// Stellt Nachricht-Artefakte an die jeweils verbundenen Fingerprints zu.
    /// Nicht verbundene Empfaenger werden stillschweigend uebersprungen.
    pub async fn nachrichten_verteilen(&self, zustellungen: Vec<(String, NachrichtArtefakt)>) {
        if zustellungen.is_empty() {
            return;
        }
        let _ = self.zustellen_tx.send(zustellungen).await;
    }

    /// Meldet ein Aktivierungs-Ereignis an alle verbundenen Clients
    pub async fn aktivierung_verbreiten(&self, artefakt: AktivierungsArtefakt) {
        let _ = self.ereignis_tx.send(artefakt).await;
    }

    /// Anzahl der aktuell registrierten Verbindungen
    pub fn klient_anzahl(&self) -> usize {
        self.anzahl.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Hub-Schleife
// ---------------------------------------------------------------------------

struct KlientEintrag {
    verbindungs_id: Uuid,
    benutzer_id: Uuid,
    klient_art: KlientArt,
    tx: mpsc::Sender<Rahmen>,
}

enum SendeFehler {
    Voll,
    Geschlossen,
}

impl KlientEintrag {
    /// Reiht einen Rahmen nicht-blockierend in die Sende-Queue ein
    fn senden(&self, rahmen: Rahmen) -> Result<(), SendeFehler> {
        match self.tx.try_send(rahmen) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(SendeFehler::Voll),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SendeFehler::Geschlossen),
        }
    }
}

/// Rendert ein Nachricht-Artefakt passend zur Client-Art
fn artefakt_rendern(klient_art: KlientArt, artefakt: NachrichtArtefakt) -> Rahmen {
    match klient_art {
        KlientArt::Cli => Rahmen::new(
            0,
            RahmenInhalt::NachrichtKompakt {
                text: artefakt.kompakt(),
            },
        ),
        KlientArt::Interaktiv => Rahmen::new(0, RahmenInhalt::Nachricht(artefakt)),
    }
}

async fn hub_schleife(
    mut registrieren_rx: mpsc::Receiver<Registrierung>,
    mut abmelden_rx: mpsc::Receiver<Abmeldung>,
    mut zustellen_rx: mpsc::Receiver<Vec<(String, NachrichtArtefakt)>>,
    mut ereignis_rx: mpsc::Receiver<AktivierungsArtefakt>,
    mut shutdown_rx: watch::Receiver<bool>,
    anzahl: Arc<AtomicUsize>,
) {
    let mut klienten: HashMap<String, KlientEintrag> = HashMap::new();

    loop {
        tokio::select! {
            Some(reg) = registrieren_rx.recv() => {
                let fingerprint = reg.fingerprint;
                let eintrag = KlientEintrag {
                    verbindungs_id: reg.verbindungs_id,
                    benutzer_id: reg.benutzer_id,
                    klient_art: reg.klient_art,
                    tx: reg.tx,
                };
                match klienten.insert(fingerprint.clone(), eintrag) {
                    Some(alt) => {
                        // Takeover: das alte Sender-Ende faellt hier aus dem
                        // Scope; die verdraengte Verbindung sieht ihre Queue
                        // geschlossen und baut den Transport ab.
                        tracing::info!(
                            fingerprint = %fingerprint,
                            alte_verbindung = %alt.verbindungs_id,
                            "Fingerprint erneut verbunden – alte Verbindung verdraengt"
                        );
                    }
                    None => {
                        tracing::debug!(fingerprint = %fingerprint, "Verbindung registriert");
                    }
                }
            }

            Some(ab) = abmelden_rx.recv() => {
                match klienten.get(&ab.fingerprint) {
                    Some(eintrag) if eintrag.verbindungs_id == ab.verbindungs_id => {
                        klienten.remove(&ab.fingerprint);
                        tracing::debug!(fingerprint = %ab.fingerprint, "Verbindung abgemeldet");
                    }
                    _ => {
                        // Veraltete Abmeldung nach einem Takeover
                        tracing::trace!(
                            fingerprint = %ab.fingerprint,
                            "Abmeldung ohne passende Verbindung ignoriert"
                        );
                    }
                }
            }

            Some(liste) = zustellen_rx.recv() => {
                for (fingerprint, artefakt) in liste {
                    let Some(eintrag) = klienten.get(&fingerprint) else {
                        tracing::trace!(fingerprint = %fingerprint, "Empfaenger nicht verbunden");
                        continue;
                    };
                    let rahmen = artefakt_rendern(eintrag.klient_art, artefakt);
                    if let Err(fehler) = eintrag.senden(rahmen) {
                        match fehler {
                            SendeFehler::Voll => tracing::warn!(
                                fingerprint = %fingerprint,
                                benutzer_id = %eintrag.benutzer_id,
                                "Sende-Queue voll – Verbindung verdraengt"
                            ),
                            SendeFehler::Geschlossen => tracing::debug!(
                                fingerprint = %fingerprint,
                                "Sende-Queue geschlossen – Verbindung entfernt"
                            ),
                        }
                        klienten.remove(&fingerprint);
                    }
                }
            }

            Some(artefakt) = ereignis_rx.recv() => {
                let mut verdraengt = Vec::new();
                for (fingerprint, eintrag) in &klienten {
                    let rahmen = Rahmen::new(0, RahmenInhalt::Aktivierung(artefakt.clone()));
                    if eintrag.senden(rahmen).is_err() {
                        verdraengt.push(fingerprint.clone());
                    }
                }
                for fingerprint in verdraengt {
                    tracing::warn!(fingerprint = %fingerprint, "Ereignis nicht zustellbar – Verbindung verdraengt");
                    klienten.remove(&fingerprint);
                }
            }

            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!(verbindungen = klienten.len(), "Hub faehrt herunter");
                    // Alle Sender-Enden fallen weg; jede Verbindung sieht
                    // ihre Queue geschlossen und beendet sich.
                    klienten.clear();
                    anzahl.store(0, Ordering::Relaxed);
                    break;
                }
            }

            else => break,
        }

        anzahl.store(klienten.len(), Ordering::Relaxed);
    }

    tracing::debug!("Hub-Schleife beendet");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn artefakt(betreff: &str) -> NachrichtArtefakt {
        NachrichtArtefakt {
            betreff: betreff.to_string(),
            geheimtext: "-----BEGIN PGP MESSAGE-----".to_string(),
            absender_name: "Alice".to_string(),
            absender_email: "alice@example.org".to_string(),
        }
    }

    fn registrierung(
        fingerprint: &str,
        klient_art: KlientArt,
        kapazitaet: usize,
    ) -> (Registrierung, mpsc::Receiver<Rahmen>) {
        let (tx, rx) = mpsc::channel(kapazitaet);
        (
            Registrierung {
                fingerprint: fingerprint.to_string(),
                verbindungs_id: Uuid::new_v4(),
                benutzer_id: Uuid::new_v4(),
                klient_art,
                tx,
            },
            rx,
        )
    }

    /// Laesst die Hub-Schleife anstehende Befehle verarbeiten
    async fn kurz_warten() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn cli_bekommt_kompakten_text() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);

        let (reg, mut rx) = registrierung("FP-A", KlientArt::Cli, SEND_QUEUE_GROESSE);
        hub.registrieren(reg).await;
        kurz_warten().await;

        hub.nachrichten_verteilen(vec![("FP-A".into(), artefakt("deploy"))])
            .await;

        let rahmen = rx.recv().await.expect("Zustellung erwartet");
        assert_eq!(rahmen.request_id, 0);
        match rahmen.inhalt {
            RahmenInhalt::NachrichtKompakt { text } => {
                assert!(text.contains("[deploy]"));
                assert!(text.contains("alice@example.org"));
            }
            inhalt => panic!("Erwartet NachrichtKompakt, bekommen {inhalt:?}"),
        }
    }

    #[tokio::test]
    async fn interaktiv_bekommt_reiches_artefakt() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);

        let (reg, mut rx) = registrierung("FP-A", KlientArt::Interaktiv, SEND_QUEUE_GROESSE);
        hub.registrieren(reg).await;
        kurz_warten().await;

        hub.nachrichten_verteilen(vec![("FP-A".into(), artefakt("deploy"))])
            .await;

        let rahmen = rx.recv().await.expect("Zustellung erwartet");
        match rahmen.inhalt {
            RahmenInhalt::Nachricht(a) => assert_eq!(a.betreff, "deploy"),
            inhalt => panic!("Erwartet Nachricht, bekommen {inhalt:?}"),
        }
    }

    #[tokio::test]
    async fn takeover_verdraengt_alte_verbindung() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);

        let (reg_alt, mut rx_alt) = registrierung("FP-A", KlientArt::Cli, SEND_QUEUE_GROESSE);
        hub.registrieren(reg_alt).await;
        kurz_warten().await;

        let (reg_neu, mut rx_neu) = registrierung("FP-A", KlientArt::Cli, SEND_QUEUE_GROESSE);
        hub.registrieren(reg_neu).await;
        kurz_warten().await;

        // Die alte Verbindung sieht ihre Queue geschlossen
        assert!(rx_alt.recv().await.is_none());

        hub.nachrichten_verteilen(vec![("FP-A".into(), artefakt("neu"))])
            .await;
        let rahmen = rx_neu.recv().await.expect("Neue Verbindung gewinnt");
        assert!(matches!(rahmen.inhalt, RahmenInhalt::NachrichtKompakt { .. }));
    }

    #[tokio::test]
    async fn veraltete_abmeldung_ist_no_op() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);

        let (reg, mut rx) = registrierung("FP-A", KlientArt::Cli, SEND_QUEUE_GROESSE);
        hub.registrieren(reg).await;
        kurz_warten().await;

        // Abmeldung mit fremder Verbindungs-ID trifft die Registrierung nicht
        hub.abmelden("FP-A", Uuid::new_v4()).await;
        kurz_warten().await;

        hub.nachrichten_verteilen(vec![("FP-A".into(), artefakt("noch da"))])
            .await;
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn abmeldung_schliesst_queue() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);

        let (reg, mut rx) = registrierung("FP-A", KlientArt::Cli, SEND_QUEUE_GROESSE);
        let verbindungs_id = reg.verbindungs_id;
        hub.registrieren(reg).await;
        kurz_warten().await;
        assert_eq!(hub.klient_anzahl(), 1);

        hub.abmelden("FP-A", verbindungs_id).await;
        kurz_warten().await;

        assert!(rx.recv().await.is_none());
        assert_eq!(hub.klient_anzahl(), 0);
    }

    #[tokio::test]
    async fn volle_queue_fuehrt_zur_verdraengung() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);

        // Queue mit Kapazitaet 1, die niemand leert
        let (reg, mut rx) = registrierung("FP-A", KlientArt::Cli, 1);
        hub.registrieren(reg).await;
        kurz_warten().await;

        hub.nachrichten_verteilen(vec![
            ("FP-A".into(), artefakt("eins")),
            ("FP-A".into(), artefakt("zwei")),
        ])
        .await;
        kurz_warten().await;

        // Die erste Zustellung steht noch in der Queue, danach ist die
        // Verbindung verdraengt und die Queue geschlossen.
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
        assert_eq!(hub.klient_anzahl(), 0);
    }

    #[tokio::test]
    async fn zustellung_an_unbekannten_fingerprint_wird_uebersprungen() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);

        let (reg, mut rx) = registrierung("FP-A", KlientArt::Cli, SEND_QUEUE_GROESSE);
        hub.registrieren(reg).await;
        kurz_warten().await;

        hub.nachrichten_verteilen(vec![
            ("FP-UNBEKANNT".into(), artefakt("verloren")),
            ("FP-A".into(), artefakt("angekommen")),
        ])
        .await;

        let rahmen = rx.recv().await.expect("FP-A bleibt erreichbar");
        match rahmen.inhalt {
            RahmenInhalt::NachrichtKompakt { text } => assert!(text.contains("[angekommen]")),
            inhalt => panic!("Erwartet NachrichtKompakt, bekommen {inhalt:?}"),
        }
    }

    #[tokio::test]
    async fn aktivierung_erreicht_alle() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);

        let (reg_a, mut rx_a) = registrierung("FP-A", KlientArt::Cli, SEND_QUEUE_GROESSE);
        let (reg_b, mut rx_b) = registrierung("FP-B", KlientArt::Interaktiv, SEND_QUEUE_GROESSE);
        hub.registrieren(reg_a).await;
        hub.registrieren(reg_b).await;
        kurz_warten().await;

        hub.aktivierung_verbreiten(AktivierungsArtefakt {
            fingerprint: "FP-C".into(),
            email: "carol@example.org".into(),
            name: "Carol".into(),
        })
        .await;

        for rx in [&mut rx_a, &mut rx_b] {
            let rahmen = rx.recv().await.expect("Ereignis erwartet");
            match rahmen.inhalt {
                RahmenInhalt::Aktivierung(a) => assert_eq!(a.fingerprint, "FP-C"),
                inhalt => panic!("Erwartet Aktivierung, bekommen {inhalt:?}"),
            }
        }
    }

    #[tokio::test]
    async fn shutdown_schliesst_alle_queues() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub = VerbindungsHub::starten(shutdown_rx);

        let (reg, mut rx) = registrierung("FP-A", KlientArt::Cli, SEND_QUEUE_GROESSE);
        hub.registrieren(reg).await;
        kurz_warten().await;

        shutdown_tx.send(true).expect("Hub lebt noch");
        kurz_warten().await;

        assert!(rx.recv().await.is_none());
        assert_eq!(hub.klient_anzahl(), 0);
    }
}
