//! End-to-end exercise of the public crate surface: mail body in, record
//! stored, alerts computed, mailing-list payload out.

use clubdesk::applicants::checker::{check_duplicate_contact, is_suspect_parent_email};
use clubdesk::applicants::parser::{parse_csv, parse_message};
use clubdesk::applicants::{
    ApplicantStore, ApplicantUpdate, AuditLedger, Gender, IngestSource, IngestionPipeline,
    InMemoryStore,
};
use clubdesk::ecomail::{EcomailError, SubscriberDirectory, SyncEngine};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const MAIL: &str = "\
Jak se jmenuješ?: Nikola
Jaké je tvé příjmení?: Nováková
Kam ti můžeme poslat e-mail?: rodice.novakovi@example.cz
Na jaké číslo ti můžeme zavolat?: 777 603 960
Kdy ses narodil(a)?: 03.11.2009
Odkud pocházíš?: Praha
Kam chodíš do školy?: ZŠ Vodičkova
Co tě nejvíc zajímá?: divadlo, hudba
Jsi spíš introvert nebo extrovert?: extrovert
Nesouhlas se zasíláním novinek: Nesouhlasím

55555
";

struct EmptyDirectory {
    pushed: Arc<Mutex<Vec<(String, Value)>>>,
}

impl SubscriberDirectory for EmptyDirectory {
    fn lookup(&self, _email: &str) -> Result<Option<Value>, EcomailError> {
        Ok(None)
    }

    fn upsert(&self, list_id: &str, payload: &Value) -> Result<Value, EcomailError> {
        self.pushed
            .lock()
            .expect("mutex poisoned")
            .push((list_id.to_string(), payload.clone()));
        Ok(json!({}))
    }
}

#[test]
fn mail_intake_flows_from_body_to_mailing_list_payload() {
    let store = InMemoryStore::new();
    let pipeline = IngestionPipeline::new(&store, "operator");

    let payload = parse_message(MAIL, None);
    let summary = pipeline.run(vec![payload], IngestSource::Mailbox);
    assert_eq!(summary.imported, 1);
    assert!(summary.errors.is_empty());

    let record = store.active_records().expect("list").remove(0);
    assert_eq!(record.membership_id, "55555");
    assert_eq!(record.guessed_gender, Gender::Female);
    assert!(!record.newsletter_consent);

    // Parent-looking address gets flagged; no contact overlaps yet.
    assert!(is_suspect_parent_email(&record));
    let duplicates =
        check_duplicate_contact(&store, &record.email, &record.phone, record.id).expect("check");
    assert!(duplicates.is_empty());

    // Operator corrects the email and the flag clears.
    store
        .apply_update(
            record.id,
            ApplicantUpdate::Email("nikola.novakova@example.cz".to_string()),
        )
        .expect("update");
    let record = store.fetch(record.id).expect("fetch").expect("exists");
    assert!(!is_suspect_parent_email(&record));

    // Push to the list: new subscriber, so consent travels along.
    let pushed = Arc::new(Mutex::new(Vec::new()));
    let engine = SyncEngine::new(EmptyDirectory {
        pushed: pushed.clone(),
    });
    engine.push(&record, "17").expect("push");
    store.mark_exported(record.id).expect("mark");

    let pushed = pushed.lock().expect("mutex poisoned");
    assert_eq!(pushed[0].0, "17");
    let data = &pushed[0].1["subscriber_data"];
    assert_eq!(data["email"], "nikola.novakova@example.cz");
    assert_eq!(data["birthday"], "2009-11-03");
    assert_eq!(data["status"], "unsubscribed");

    let exported = store.fetch(record.id).expect("fetch").expect("exists");
    assert!(exported.exported_to_list);
    assert!(exported.exported_at.is_some());
}

#[test]
fn csv_and_mail_channels_converge_on_one_record() {
    let store = InMemoryStore::new();
    let pipeline = IngestionPipeline::new(&store, "operator");

    pipeline.run(vec![parse_message(MAIL, None)], IngestSource::Mailbox);

    let csv = "jmeno,prijmeni,email,cislo_karty\n\
               Nikola,Nováková,rodice.novakovi@example.cz,55555\n";
    let summary = pipeline.run(parse_csv(csv).expect("parses"), IngestSource::CsvUpload);
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.duplicates, 1);

    let records = store.active_records().expect("list");
    assert_eq!(records.len(), 1);
    let entries = AuditLedger::entries_for(&store, records[0].id).expect("entries");
    assert_eq!(
        entries.last().expect("entry").action,
        "Duplicate import attempt via CSV upload"
    );
}
