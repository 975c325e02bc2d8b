//! Gender guessing from Czech naming conventions.
//!
//! The guess is advisory only; operators can override it on the record.

use crate::applicants::domain::Gender;

/// Male first names ending in 'a' (nicknames mostly).
const MALE_A_EXCEPTIONS: &[&str] = &[
    "honza", "pepa", "láďa", "míra", "jirka", "tom", "mustafa", "nikola", "luca", "sasha",
    "břeťa", "viťa",
];

/// Male names ending in 'e'.
const MALE_E_NAMES: &[&str] = &["mike", "dave", "steve", "joe", "dan", "kae"];

/// Female names ending in 'e' that the suffix rules alone would miss.
const FEMALE_E_NAMES: &[&str] = &[
    "libuše", "danuše", "miluše", "květuše", "dagmar", "alice", "beatrice", "charlotte",
    "denise", "eliane", "emilie", "eveline", "justine", "michelle", "nicole", "noemi",
    "simone", "sylvie", "vivien", "zoe",
];

/// Female names with no feminine suffix at all.
const FEMALE_OTHER_NAMES: &[&str] = &[
    "nela", "dagmar", "miriam", "ester", "ruth", "rachel", "karen", "carmen", "zoe",
];

/// Guesses gender from first and last name.
///
/// Surname in -ová (any -á really) wins outright; otherwise the first name
/// is matched against suffix rules with exception lists for names the
/// suffixes misclassify.
pub fn guess_gender(first_name: &str, last_name: &str) -> Gender {
    let first = first_name.trim().to_lowercase();
    if first.is_empty() {
        return Gender::Unknown;
    }

    let last = last_name.trim().to_lowercase();
    if last.ends_with('á') {
        return Gender::Female;
    }

    if first.ends_with('a') {
        if MALE_A_EXCEPTIONS.contains(&first.as_str()) {
            return Gender::Male;
        }
        return Gender::Female;
    }

    if first.ends_with("ie") {
        return Gender::Female;
    }

    if first.ends_with('e') {
        if MALE_E_NAMES.contains(&first.as_str()) {
            return Gender::Male;
        }
        if FEMALE_E_NAMES.contains(&first.as_str()) {
            return Gender::Female;
        }
    }

    if FEMALE_OTHER_NAMES.contains(&first.as_str()) {
        return Gender::Female;
    }

    Gender::Male
}
