//! Integration-Tests fuer den IdentitaetsService

use std::sync::Arc;

use tresor_db::{BenutzerRepository, SqliteDb};
use tresor_krypto::SpeicherEngine;
use tresor_verteilung::{IdentitaetsService, VerteilungError};

async fn service() -> Arc<IdentitaetsService<SqliteDb, SpeicherEngine>> {
    let (svc, _db) = service_mit_db().await;
    svc
}

async fn service_mit_db() -> (Arc<IdentitaetsService<SqliteDb, SpeicherEngine>>, Arc<SqliteDb>) {
    let db = Arc::new(SqliteDb::in_memory().await.expect("In-Memory DB"));
    let engine = Arc::new(SpeicherEngine::neu());
    (IdentitaetsService::neu(Arc::clone(&db), engine), db)
}

#[tokio::test]
async fn import_legt_benutzer_und_schluessel_an() {
    let svc = service().await;

    let ergebnis = svc
        .schluessel_importieren("FP0001:alice@example.org:Alice:Ops")
        .await
        .expect("Import fehlgeschlagen");

    assert!(ergebnis.schluessel_neu);
    assert_eq!(ergebnis.benutzer.email, "alice@example.org");
    assert_eq!(ergebnis.benutzer.name, "Alice");
    assert_eq!(ergebnis.benutzer.kommentar, "Ops");
    assert_eq!(ergebnis.schluessel.fingerprint, "FP0001");
    assert!(!ergebnis.schluessel.ist_aktiv());
}

#[tokio::test]
async fn reimport_fuehrt_zusammen() {
    let svc = service().await;

    let erster = svc
        .schluessel_importieren("FP0001:alice@example.org:Alice:")
        .await
        .unwrap();

    // Gleicher Fingerprint, gleiche E-Mail, neuer Name
    let zweiter = svc
        .schluessel_importieren("FP0001:alice@example.org:Alice Admin:")
        .await
        .unwrap();

    assert!(!zweiter.schluessel_neu);
    assert_eq!(zweiter.benutzer.id, erster.benutzer.id);
    assert_eq!(zweiter.schluessel.id, erster.schluessel.id);
    assert_eq!(zweiter.benutzer.name, "Alice Admin");
}

#[tokio::test]
async fn reimport_mit_email_varianten_fuehrt_zusammen() {
    let svc = service().await;

    let erster = svc
        .schluessel_importieren("FP0001:Alice@Example.org:Alice:")
        .await
        .unwrap();

    // Gleicher Fingerprint, dieselbe E-Mail in anderer Schreibweise
    let zweiter = svc
        .schluessel_importieren("FP0001: alice@EXAMPLE.org :Alice:")
        .await
        .expect("Schreibweisen-Variante muss zusammengefuehrt werden");

    assert!(!zweiter.schluessel_neu);
    assert_eq!(zweiter.benutzer.id, erster.benutzer.id);
    assert_eq!(zweiter.schluessel.id, erster.schluessel.id);
    // Persistiert wird die kanonische Form
    assert_eq!(erster.benutzer.email, "alice@example.org");
}

#[tokio::test]
async fn fremder_fingerprint_wird_abgelehnt() {
    let svc = service().await;

    svc.schluessel_importieren("FP0001:alice@example.org:Alice:")
        .await
        .unwrap();

    // Gleicher Fingerprint, andere E-Mail
    let err = svc
        .schluessel_importieren("FP0001:mallory@example.org:Mallory:")
        .await;

    assert!(matches!(
        err,
        Err(VerteilungError::SchluesselKonflikt { .. })
    ));
}

#[tokio::test]
async fn abgelehnter_import_hinterlaesst_keine_spuren() {
    let (svc, db) = service_mit_db().await;

    let alice = svc
        .schluessel_importieren("FP0001:alice@example.org:Alice:")
        .await
        .unwrap();

    svc.schluessel_importieren("FP0001:mallory@example.org:Mallory:")
        .await
        .expect_err("Fremder Fingerprint muss abgelehnt werden");

    // Der Fehlschlag darf keinen Benutzer anlegen und den
    // Schluessel-Eigentuemer nicht anfassen
    assert!(db
        .benutzer_nach_email("mallory@example.org")
        .await
        .unwrap()
        .is_none());

    let unveraendert = db
        .benutzer_nach_email("alice@example.org")
        .await
        .unwrap()
        .expect("Alice muss erhalten bleiben");
    assert_eq!(unveraendert.id, alice.benutzer.id);
    assert_eq!(unveraendert.name, "Alice");
}

#[tokio::test]
async fn aktivierung_ist_einbahnstrasse() {
    let svc = service().await;
    svc.schluessel_importieren("FP0001:alice@example.org:Alice:")
        .await
        .unwrap();

    let erste = svc.schluessel_aktivieren("FP0001").await.unwrap();
    assert!(erste.erstmalig);
    assert_eq!(erste.email, "alice@example.org");

    let zweite = svc.schluessel_aktivieren("FP0001").await.unwrap();
    assert!(!zweite.erstmalig);
}

#[tokio::test]
async fn aktivierung_unbekannter_fingerprint() {
    let svc = service().await;
    let err = svc.schluessel_aktivieren("FEHLT").await;
    assert!(matches!(err, Err(VerteilungError::NichtGefunden(_))));
}

#[tokio::test]
async fn anmelden_verlangt_aktiven_schluessel() {
    let svc = service().await;
    svc.schluessel_importieren("FP0001:alice@example.org:Alice:")
        .await
        .unwrap();

    // Vor der Aktivierung: abgelehnt
    let err = svc.anmelden("FP0001").await;
    assert!(matches!(err, Err(VerteilungError::KeineBerechtigung(_))));

    svc.schluessel_aktivieren("FP0001").await.unwrap();

    let (benutzer, schluessel) = svc.anmelden("FP0001").await.unwrap();
    assert_eq!(benutzer.email, "alice@example.org");
    assert!(schluessel.ist_aktiv());
}
