use super::common::*;
use crate::applicants::checker::{check_duplicate_contact, is_suspect_parent_email};
use crate::applicants::domain::{
    ApplicantUpdate, ApplicationStatus, Gender, IngestSource,
};
use crate::applicants::ingest::IngestionPipeline;
use crate::applicants::memory::InMemoryStore;
use crate::applicants::parser::parse_csv;
use crate::applicants::repository::{ApplicantStore, AuditLedger};

#[test]
fn mail_to_record_end_to_end() {
    let store = InMemoryStore::new();
    let summary = ingest_mail(
        &store,
        &application_mail("Jan", "Novák", "jan.novak@example.cz", "12345"),
    );
    assert_eq!(summary.imported, 1);

    let record = only_record(&store);
    assert_eq!(record.membership_id, "12345");
    assert_eq!(record.phone, "777603960");
    assert_eq!(record.guessed_gender, Gender::Male);
    assert_eq!(record.status, ApplicationStatus::New);
    assert!(record.newsletter_consent);
    assert!(!record.deleted);

    let entries = AuditLedger::entries_for(&store, record.id).expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "Created via mailbox");
    assert_eq!(entries[0].actor, ACTOR);
}

#[test]
fn csv_batch_flows_through_the_same_pipeline() {
    let store = InMemoryStore::new();
    let csv = "\u{feff}jmeno,prijmeni,email,telefon,cislo_karty,nesouhlas\n\
               Jana,Nováková,jana@example.cz,777 111 222,100,\n\
               Honza,Novotný,honza@example.cz,777 333 444,101,Nesouhlasím\n";
    let payloads = parse_csv(csv).expect("parses");
    let summary = IngestionPipeline::new(&store, ACTOR).run(payloads, IngestSource::CsvUpload);
    assert_eq!(summary.imported, 2);

    let records = store.active_records().expect("list");
    let jana = records.iter().find(|r| r.first_name == "Jana").expect("jana");
    let honza = records.iter().find(|r| r.first_name == "Honza").expect("honza");
    assert_eq!(jana.guessed_gender, Gender::Female);
    assert!(jana.newsletter_consent);
    assert_eq!(honza.guessed_gender, Gender::Male);
    assert!(!honza.newsletter_consent);
}

#[test]
fn mail_then_csv_of_same_person_is_one_record() {
    let store = InMemoryStore::new();
    ingest_mail(
        &store,
        &application_mail("Jan", "Novák", "jan@example.cz", "12345"),
    );

    // Same person exported later with the membership number lost.
    let csv = "jmeno,prijmeni,email,id\nJan,Novák,jan@example.cz,99999\n";
    let payloads = parse_csv(csv).expect("parses");
    let summary = IngestionPipeline::new(&store, ACTOR).run(payloads, IngestSource::CsvUpload);
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.duplicates, 1);

    let record = only_record(&store);
    assert_eq!(record.membership_id, "12345");
}

#[test]
fn delete_then_reimport_restores_with_edits_intact() {
    let store = InMemoryStore::new();
    ingest_mail(
        &store,
        &application_mail("Jan", "Novák", "jan@example.cz", "12345"),
    );
    let record = only_record(&store);

    store
        .apply_update(record.id, ApplicantUpdate::Note("zavolat rodičům".to_string()))
        .expect("update");
    store.soft_delete(record.id).expect("delete");
    assert!(store.active_records().expect("list").is_empty());

    let summary = ingest_mail(
        &store,
        &application_mail("Jan", "Novák", "jan@example.cz", "12345"),
    );
    assert_eq!(summary.imported, 1);

    let restored = only_record(&store);
    assert_eq!(restored.id, record.id);
    assert_eq!(restored.note, "zavolat rodičům");

    let actions: Vec<String> = AuditLedger::entries_for(&store, record.id)
        .expect("entries")
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions.last().map(String::as_str),
        Some("Restored via mailbox")
    );
}

#[test]
fn updates_are_written_to_the_ledger_by_the_caller() {
    let store = InMemoryStore::new();
    ingest_mail(
        &store,
        &application_mail("Jan", "Novák", "jan@example.cz", "12345"),
    );
    let record = only_record(&store);

    let change = store
        .apply_update(record.id, ApplicantUpdate::City("Brno".to_string()))
        .expect("update");
    assert_eq!(change.field, "city");
    assert_eq!(change.old_value, "Praha");
    assert_eq!(change.new_value, "Brno");
}

#[test]
fn siblings_share_a_phone_and_get_flagged() {
    let store = InMemoryStore::new();
    ingest_mail(
        &store,
        &application_mail("Jan", "Novák", "jan@example.cz", "1"),
    );
    ingest_mail(
        &store,
        &application_mail("Eva", "Nováková", "eva@example.cz", "2"),
    );

    let records = store.active_records().expect("list");
    let eva = records.iter().find(|r| r.first_name == "Eva").expect("eva");
    let duplicates =
        check_duplicate_contact(&store, &eva.email, &eva.phone, eva.id).expect("check");
    assert_eq!(duplicates.phone_matches.len(), 1);
    assert!(duplicates.email_matches.is_empty());
}

#[test]
fn parent_email_heuristic_runs_on_the_stored_record() {
    let store = InMemoryStore::new();
    ingest_mail(
        &store,
        &application_mail("Jan", "Novák", "marie.svobodova@example.cz", "1"),
    );
    let record = only_record(&store);
    assert!(is_suspect_parent_email(&record));

    let store2 = InMemoryStore::new();
    ingest_mail(
        &store2,
        &application_mail("Jan", "Novák", "jan.novak@example.cz", "1"),
    );
    assert!(!is_suspect_parent_email(&only_record(&store2)));
}
