//! Live contact checks surfaced as alerts on the applicant detail view.

use serde::Serialize;

use super::domain::{ApplicantId, ApplicantRecord};
use super::normalize::{clean_phone, remove_diacritics};
use super::repository::{ApplicantStore, RepositoryError};

/// Other active records sharing a contact point with the inspected one.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ContactDuplicates {
    pub email_matches: Vec<ApplicantId>,
    pub phone_matches: Vec<ApplicantId>,
}

impl ContactDuplicates {
    pub fn is_empty(&self) -> bool {
        self.email_matches.is_empty() && self.phone_matches.is_empty()
    }
}

/// Finds active records, other than `exclude_id`, that share the email or
/// the normalized phone. Phones shorter than six digits are too ambiguous
/// to compare.
pub fn check_duplicate_contact(
    store: &dyn ApplicantStore,
    email: &str,
    phone: &str,
    exclude_id: ApplicantId,
) -> Result<ContactDuplicates, RepositoryError> {
    let email = email.trim();
    let phone = clean_phone(phone);
    let compare_phone = phone.len() > 5;

    let mut duplicates = ContactDuplicates::default();
    for record in store.active_records()? {
        if record.id == exclude_id {
            continue;
        }
        if !email.is_empty() && record.email.trim() == email {
            duplicates.email_matches.push(record.id);
        }
        if compare_phone && clean_phone(&record.phone) == phone {
            duplicates.phone_matches.push(record.id);
        }
    }
    Ok(duplicates)
}

/// Heuristic for "the email looks like a parent's, not the applicant's".
///
/// Fires when no part of either name appears in the local part: no name
/// word of three or more letters, and the first+last initial pair nowhere
/// in it. Multi-word names are matched word by word.
pub fn is_suspect_parent_email(record: &ApplicantRecord) -> bool {
    let local = match record.email.split_once('@') {
        Some((local, _)) => remove_diacritics(local),
        None => return false,
    };
    if local.is_empty() {
        return false;
    }

    let first = remove_diacritics(record.first_name.trim());
    let last = remove_diacritics(record.last_name.trim());
    if first.is_empty() && last.is_empty() {
        return false;
    }

    for token in first.split_whitespace().chain(last.split_whitespace()) {
        if token.len() >= 3 && local.contains(token) {
            return false;
        }
    }

    if let (Some(f), Some(l)) = (first.chars().next(), last.chars().next()) {
        let initials: String = [f, l].iter().collect();
        if local.contains(&initials) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicants::domain::NewApplicant;
    use crate::applicants::memory::InMemoryStore;

    fn draft(first: &str, last: &str, email: &str, phone: &str) -> NewApplicant {
        NewApplicant {
            membership_id: email.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            ..NewApplicant::default()
        }
    }

    fn record(first: &str, last: &str, email: &str) -> ApplicantRecord {
        let store = InMemoryStore::new();
        store.insert(draft(first, last, email, "")).expect("insert")
    }

    #[test]
    fn shared_phone_is_reported_with_formatting_differences() {
        let store = InMemoryStore::new();
        let a = store
            .insert(draft("Jan", "Novák", "a@x.cz", "777 603 960"))
            .expect("insert");
        let b = store
            .insert(draft("Eva", "Malá", "b@x.cz", "777-603-960"))
            .expect("insert");
        let dup = check_duplicate_contact(&store, &b.email, &b.phone, b.id).expect("check");
        assert_eq!(dup.phone_matches, vec![a.id]);
        assert!(dup.email_matches.is_empty());
    }

    #[test]
    fn deleted_records_do_not_count() {
        let store = InMemoryStore::new();
        let a = store
            .insert(draft("Jan", "Novák", "a@x.cz", "777603960"))
            .expect("insert");
        let b = store
            .insert(draft("Eva", "Malá", "b@x.cz", "777603960"))
            .expect("insert");
        store.soft_delete(a.id).expect("delete");
        let dup = check_duplicate_contact(&store, &b.email, &b.phone, b.id).expect("check");
        assert!(dup.is_empty());
    }

    #[test]
    fn short_phones_are_not_compared() {
        let store = InMemoryStore::new();
        store
            .insert(draft("Jan", "Novák", "a@x.cz", "12345"))
            .expect("insert");
        let b = store
            .insert(draft("Eva", "Malá", "b@x.cz", "12345"))
            .expect("insert");
        let dup = check_duplicate_contact(&store, &b.email, &b.phone, b.id).expect("check");
        assert!(dup.phone_matches.is_empty());
    }

    #[test]
    fn shared_email_is_reported() {
        let store = InMemoryStore::new();
        let a = store
            .insert(draft("Jan", "Novák", "rodina@x.cz", ""))
            .expect("insert");
        let b = store
            .insert(draft("Eva", "Malá", "rodina@x.cz ", ""))
            .expect("insert");
        let dup = check_duplicate_contact(&store, &b.email, &b.phone, b.id).expect("check");
        assert_eq!(dup.email_matches, vec![a.id]);
    }

    #[test]
    fn own_name_in_local_part_is_not_suspect() {
        let rec = record("Štěpánka", "Malečková", "stepanka.m@example.cz");
        assert!(!is_suspect_parent_email(&rec));
    }

    #[test]
    fn initials_are_not_suspect() {
        let rec = record("Jan", "Novák", "jn2008@example.cz");
        assert!(!is_suspect_parent_email(&rec));
    }

    #[test]
    fn initials_count_anywhere_in_the_local_part() {
        let rec = record("Jan", "Novák", "x.jn.2008@example.cz");
        assert!(!is_suspect_parent_email(&rec));
    }

    #[test]
    fn each_word_of_a_multiword_name_counts() {
        let rec = record("Anna Marie", "Dvořáková", "marie.d@example.cz");
        assert!(!is_suspect_parent_email(&rec));
    }

    #[test]
    fn unrelated_local_part_is_suspect() {
        let rec = record("Jan", "Novák", "marie.svobodova@example.cz");
        assert!(is_suspect_parent_email(&rec));
    }

    #[test]
    fn short_name_tokens_do_not_clear_the_flag() {
        // "An" is under three letters; only the initials rule can clear it.
        let rec = record("An", "Yu", "completely.other@example.cz");
        assert!(is_suspect_parent_email(&rec));
    }
}
