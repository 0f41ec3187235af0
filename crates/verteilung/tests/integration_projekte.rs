//! Integration-Tests fuer den ProjektService

use std::sync::Arc;

use tresor_core::ZugriffsStufe;
use tresor_db::SqliteDb;
use tresor_krypto::SpeicherEngine;
use tresor_verteilung::{IdentitaetsService, ProjektService, VerteilungError};
use uuid::Uuid;

struct Aufbau {
    projekte: Arc<ProjektService<SqliteDb>>,
    identitaet: Arc<IdentitaetsService<SqliteDb, SpeicherEngine>>,
}

async fn aufbau() -> Aufbau {
    let db = Arc::new(SqliteDb::in_memory().await.expect("In-Memory DB"));
    let engine = Arc::new(SpeicherEngine::neu());
    Aufbau {
        projekte: ProjektService::neu(Arc::clone(&db)),
        identitaet: IdentitaetsService::neu(db, engine),
    }
}

impl Aufbau {
    async fn benutzer(&self, fingerprint: &str, email: &str, name: &str) -> Uuid {
        self.identitaet
            .schluessel_importieren(&format!("{fingerprint}:{email}:{name}:"))
            .await
            .unwrap()
            .benutzer
            .id
    }
}

#[tokio::test]
async fn ersteller_wird_admin() {
    let a = aufbau().await;
    let alice = a.benutzer("FP01", "alice@example.org", "Alice").await;

    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "production", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    let mitglied = a.projekte.mitglied_pruefen(projekt.id, alice).await.unwrap();
    assert_eq!(mitglied.zugriff, ZugriffsStufe::Admin);
}

#[tokio::test]
async fn leerer_projektname_wird_abgelehnt() {
    let a = aufbau().await;
    let alice = a.benutzer("FP01", "alice@example.org", "Alice").await;

    let err = a.projekte.projekt_erstellen(alice, "   ", "", ZugriffsStufe::Lesen).await;
    assert!(matches!(err, Err(VerteilungError::UngueltigeEingabe(_))));
}

#[tokio::test]
async fn nur_admins_verwalten_mitglieder() {
    let a = aufbau().await;
    let alice = a.benutzer("FP01", "alice@example.org", "Alice").await;
    let bob = a.benutzer("FP02", "bob@example.org", "Bob").await;

    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    a.projekte
        .mitglied_hinzufuegen(alice, projekt.id, "bob@example.org", Some(ZugriffsStufe::Lesen))
        .await
        .unwrap();

    // Bob (Lesen) darf keine Mitglieder hinzufuegen
    let err = a
        .projekte
        .mitglied_hinzufuegen(bob, projekt.id, "alice@example.org", Some(ZugriffsStufe::Lesen))
        .await;
    assert!(matches!(err, Err(VerteilungError::KeineBerechtigung(_))));

    // Aussenstehende erst recht nicht
    let carol = a.benutzer("FP03", "carol@example.org", "Carol").await;
    let err = a
        .projekte
        .mitglied_hinzufuegen(carol, projekt.id, "bob@example.org", Some(ZugriffsStufe::Admin))
        .await;
    assert!(matches!(err, Err(VerteilungError::KeineBerechtigung(_))));
}

#[tokio::test]
async fn mitglied_mit_unbekannter_email() {
    let a = aufbau().await;
    let alice = a.benutzer("FP01", "alice@example.org", "Alice").await;
    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    let err = a
        .projekte
        .mitglied_hinzufuegen(alice, projekt.id, "niemand@example.org", Some(ZugriffsStufe::Lesen))
        .await;
    assert!(matches!(err, Err(VerteilungError::NichtGefunden(_))));
}

#[tokio::test]
async fn zugriffsstufe_per_upsert_aendern() {
    let a = aufbau().await;
    let alice = a.benutzer("FP01", "alice@example.org", "Alice").await;
    let bob = a.benutzer("FP02", "bob@example.org", "Bob").await;

    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    a.projekte
        .mitglied_hinzufuegen(alice, projekt.id, "bob@example.org", Some(ZugriffsStufe::Lesen))
        .await
        .unwrap();
    a.projekte
        .mitglied_hinzufuegen(alice, projekt.id, "bob@example.org", Some(ZugriffsStufe::Schreiben))
        .await
        .unwrap();

    let mitglied = a.projekte.mitglied_pruefen(projekt.id, bob).await.unwrap();
    assert_eq!(mitglied.zugriff, ZugriffsStufe::Schreiben);

    let mitglieder = a
        .projekte
        .mitglieder_auflisten(alice, projekt.id)
        .await
        .unwrap();
    assert_eq!(mitglieder.len(), 2);
}

#[tokio::test]
async fn projekt_loeschen_nur_admin() {
    let a = aufbau().await;
    let alice = a.benutzer("FP01", "alice@example.org", "Alice").await;
    let bob = a.benutzer("FP02", "bob@example.org", "Bob").await;

    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();
    a.projekte
        .mitglied_hinzufuegen(alice, projekt.id, "bob@example.org", Some(ZugriffsStufe::Schreiben))
        .await
        .unwrap();

    let err = a.projekte.projekt_loeschen(bob, projekt.id).await;
    assert!(matches!(err, Err(VerteilungError::KeineBerechtigung(_))));

    a.projekte.projekt_loeschen(alice, projekt.id).await.unwrap();

    let liste = a.projekte.projekte_auflisten(alice).await.unwrap();
    assert!(liste.is_empty());
}
