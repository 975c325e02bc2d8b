use crate::applicants::domain::{ApplicantRecord, IngestSource};
use crate::applicants::ingest::IngestionPipeline;
use crate::applicants::memory::InMemoryStore;
use crate::applicants::parser::parse_message;
use crate::applicants::repository::ApplicantStore;

pub(super) const ACTOR: &str = "operator";

pub(super) fn application_mail(first: &str, last: &str, email: &str, membership_id: &str) -> String {
    format!(
        "Jak se jmenuješ?: {first}\n\
         Jaké je tvé příjmení?: {last}\n\
         Kam ti můžeme poslat e-mail?: {email}\n\
         Na jaké číslo ti můžeme zavolat?: 777 603 960\n\
         Kdy ses narodil(a)?: 14.05.2008\n\
         Odkud pocházíš?: Praha\n\
         Kam chodíš do školy?: Gymnázium Na Zatlance\n\
         Co tě nejvíc zajímá?: hudba, film\n\
         Jsi spíš introvert nebo extrovert?: introvert\n\
         Nesouhlas se zasíláním novinek:\n\
         \n\
         {membership_id}\n"
    )
}

pub(super) fn ingest_mail(
    store: &InMemoryStore,
    body: &str,
) -> crate::applicants::ingest::IngestSummary {
    let payload = parse_message(body, None);
    IngestionPipeline::new(store, ACTOR).run(vec![payload], IngestSource::Mailbox)
}

pub(super) fn only_record(store: &InMemoryStore) -> ApplicantRecord {
    let records = store.active_records().expect("list");
    assert_eq!(records.len(), 1, "expected exactly one active record");
    records.into_iter().next().expect("record")
}
