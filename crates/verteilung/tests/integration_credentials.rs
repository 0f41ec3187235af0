//! Integration-Tests fuer den CredentialService

use std::sync::Arc;

use chrono::{Duration, Utc};
use tresor_core::ZugriffsStufe;
use tresor_db::SqliteDb;
use tresor_krypto::SpeicherEngine;
use tresor_verteilung::{
    CredentialService, IdentitaetsService, ProjektService, VerteilungError,
};
use uuid::Uuid;

struct Aufbau {
    engine: Arc<SpeicherEngine>,
    identitaet: Arc<IdentitaetsService<SqliteDb, SpeicherEngine>>,
    projekte: Arc<ProjektService<SqliteDb>>,
    credentials: Arc<CredentialService<SqliteDb, SpeicherEngine>>,
}

async fn aufbau() -> Aufbau {
    let db = Arc::new(SqliteDb::in_memory().await.expect("In-Memory DB"));
    let engine = Arc::new(SpeicherEngine::neu());
    let projekte = ProjektService::neu(Arc::clone(&db));
    Aufbau {
        engine: Arc::clone(&engine),
        identitaet: IdentitaetsService::neu(Arc::clone(&db), Arc::clone(&engine)),
        credentials: CredentialService::neu(db, engine, Arc::clone(&projekte)),
        projekte,
    }
}

impl Aufbau {
    /// Importiert und aktiviert einen Schluessel, liefert die Benutzer-ID
    async fn benutzer(&self, fingerprint: &str, email: &str) -> Uuid {
        let ergebnis = self
            .identitaet
            .schluessel_importieren(&format!("{fingerprint}:{email}:Test:"))
            .await
            .unwrap();
        self.identitaet
            .schluessel_aktivieren(fingerprint)
            .await
            .unwrap();
        ergebnis.benutzer.id
    }
}

#[tokio::test]
async fn setzen_verschluesselt_pro_mitglied_und_schluessel() {
    let a = aufbau().await;
    let alice = a.benutzer("FP-A1", "alice@example.org").await;
    a.identitaet
        .schluessel_importieren("FP-A2:alice@example.org:Test:")
        .await
        .unwrap();
    a.identitaet.schluessel_aktivieren("FP-A2").await.unwrap();
    a.benutzer("FP-B1", "bob@example.org").await;

    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();
    a.projekte
        .mitglied_hinzufuegen(alice, projekt.id, "bob@example.org", Some(ZugriffsStufe::Lesen))
        .await
        .unwrap();

    let ergebnis = a
        .credentials
        .credential_setzen(alice, projekt.id, "DB_PASSWORD", b"s3cr3t")
        .await
        .unwrap();

    // Alice hat zwei aktive Schluessel, Bob einen
    assert_eq!(ergebnis.gesetzte_werte, 3);
    assert!(ergebnis.fehler.is_empty());
    assert_eq!(ergebnis.credential.name, "DB_PASSWORD");
}

#[tokio::test]
async fn jeder_liest_nur_seinen_wert() {
    let a = aufbau().await;
    let alice = a.benutzer("FP-A1", "alice@example.org").await;
    let bob = a.benutzer("FP-B1", "bob@example.org").await;

    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();
    a.projekte
        .mitglied_hinzufuegen(alice, projekt.id, "bob@example.org", Some(ZugriffsStufe::Lesen))
        .await
        .unwrap();

    a.credentials
        .credential_setzen(alice, projekt.id, "API_TOKEN", b"tok")
        .await
        .unwrap();

    let (_, schluessel_bob) = a.identitaet.anmelden("FP-B1").await.unwrap();
    let wert = a
        .credentials
        .credential_lesen(bob, projekt.id, "API_TOKEN", schluessel_bob.id)
        .await
        .unwrap();

    // Der Geheimtext der Speicher-Engine traegt den Empfaenger-Fingerprint
    let (fp, klartext) = SpeicherEngine::geheimtext_zerlegen(&wert.geheimtext).unwrap();
    assert_eq!(fp, "FP-B1");
    assert_eq!(klartext, b"tok");
}

#[tokio::test]
async fn nur_admins_duerfen_setzen_und_entfernen() {
    let a = aufbau().await;
    let alice = a.benutzer("FP-A1", "alice@example.org").await;
    let bob = a.benutzer("FP-B1", "bob@example.org").await;

    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    // Weder Lesen noch Schreiben reichen fuer Credential-Mutationen
    for stufe in [ZugriffsStufe::Lesen, ZugriffsStufe::Schreiben] {
        a.projekte
            .mitglied_hinzufuegen(alice, projekt.id, "bob@example.org", Some(stufe))
            .await
            .unwrap();

        let err = a
            .credentials
            .credential_setzen(bob, projekt.id, "X", b"x")
            .await;
        assert!(matches!(err, Err(VerteilungError::KeineBerechtigung(_))));

        let err = a.credentials.credential_entfernen(bob, projekt.id, "X").await;
        assert!(matches!(err, Err(VerteilungError::KeineBerechtigung(_))));
    }

    let liste = a
        .credentials
        .credentials_auflisten(bob, projekt.id)
        .await
        .unwrap();
    assert!(liste.is_empty(), "Abgelehnte Operationen persistieren nichts");
}

#[tokio::test]
async fn rotation_ueberschreibt_in_place() {
    let a = aufbau().await;
    let alice = a.benutzer("FP-A1", "alice@example.org").await;
    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    a.credentials
        .credential_setzen(alice, projekt.id, "TOKEN", b"alt")
        .await
        .unwrap();
    let ergebnis = a
        .credentials
        .credential_setzen(alice, projekt.id, "TOKEN", b"neu")
        .await
        .unwrap();

    assert_eq!(ergebnis.gesetzte_werte, 1);

    let (_, schluessel) = a.identitaet.anmelden("FP-A1").await.unwrap();
    let wert = a
        .credentials
        .credential_lesen(alice, projekt.id, "TOKEN", schluessel.id)
        .await
        .unwrap();
    let (_, klartext) = SpeicherEngine::geheimtext_zerlegen(&wert.geheimtext).unwrap();
    assert_eq!(klartext, b"neu");

    // Nur ein Name im Projekt, kein Duplikat durch die Rotation
    let liste = a
        .credentials
        .credentials_auflisten(alice, projekt.id)
        .await
        .unwrap();
    assert_eq!(liste.len(), 1);
}

#[tokio::test]
async fn teilfehlschlag_wird_gemeldet() {
    let a = aufbau().await;
    let alice = a.benutzer("FP-A1", "alice@example.org").await;
    a.benutzer("FP-B1", "bob@example.org").await;

    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();
    a.projekte
        .mitglied_hinzufuegen(alice, projekt.id, "bob@example.org", Some(ZugriffsStufe::Lesen))
        .await
        .unwrap();

    a.engine.fehlschlag_markieren("FP-B1");

    let ergebnis = a
        .credentials
        .credential_setzen(alice, projekt.id, "TOKEN", b"x")
        .await
        .unwrap();

    assert_eq!(ergebnis.gesetzte_werte, 1);
    assert_eq!(ergebnis.fehler.len(), 1);
    assert_eq!(ergebnis.fehler[0].0, "FP-B1");
}

#[tokio::test]
async fn alle_fehlschlaege_sind_ein_fehler() {
    let a = aufbau().await;
    let alice = a.benutzer("FP-A1", "alice@example.org").await;
    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    a.engine.fehlschlag_markieren("FP-A1");

    let err = a
        .credentials
        .credential_setzen(alice, projekt.id, "TOKEN", b"x")
        .await;
    assert!(matches!(
        err,
        Err(VerteilungError::AlleEmpfaengerFehlgeschlagen(_))
    ));
}

#[tokio::test]
async fn werte_laufen_in_drei_monaten_ab() {
    let a = aufbau().await;
    let alice = a.benutzer("FP-A1", "alice@example.org").await;
    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    a.credentials
        .credential_setzen(alice, projekt.id, "TOKEN", b"x")
        .await
        .unwrap();

    let (_, schluessel) = a.identitaet.anmelden("FP-A1").await.unwrap();
    let wert = a
        .credentials
        .credential_lesen(alice, projekt.id, "TOKEN", schluessel.id)
        .await
        .unwrap();

    let ablauf = wert.expires_at.expect("Ablauf muss gesetzt sein");
    assert!(ablauf > Utc::now() + Duration::days(80));
    assert!(ablauf < Utc::now() + Duration::days(95));
}

#[tokio::test]
async fn entfernen_loescht_werte_und_namen() {
    let a = aufbau().await;
    let alice = a.benutzer("FP-A1", "alice@example.org").await;
    let projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    a.credentials
        .credential_setzen(alice, projekt.id, "TOKEN", b"x")
        .await
        .unwrap();
    a.credentials
        .credential_entfernen(alice, projekt.id, "TOKEN")
        .await
        .unwrap();

    let liste = a
        .credentials
        .credentials_auflisten(alice, projekt.id)
        .await
        .unwrap();
    assert!(liste.is_empty());

    let (_, schluessel) = a.identitaet.anmelden("FP-A1").await.unwrap();
    let err = a
        .credentials
        .credential_lesen(alice, projekt.id, "TOKEN", schluessel.id)
        .await;
    assert!(matches!(err, Err(VerteilungError::NichtGefunden(_))));
}

#[tokio::test]
async fn ohne_aktive_schluessel_kein_setzen() {
    let a = aufbau().await;
    // Import ohne Aktivierung
    let ergebnis = a
        .identitaet
        .schluessel_importieren("FP-A1:alice@example.org:Test:")
        .await
        .unwrap();
    let alice = ergebnis.benutzer.id;

    let db_projekt = a
        .projekte
        .projekt_erstellen(alice, "infra", "", ZugriffsStufe::Lesen)
        .await
        .unwrap();

    let err = a
        .credentials
        .credential_setzen(alice, db_projekt.id, "TOKEN", b"x")
        .await;
    assert!(matches!(err, Err(VerteilungError::KeineEmpfaenger(_))));
}
