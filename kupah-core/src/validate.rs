//! Completeness and validity predicates over a [`UserProfile`].

use chrono::{Datelike, Utc};

use crate::enums::Gender;
use crate::profile::UserProfile;

/// Returns true when `s` is exactly nine decimal digits.
#[must_use]
pub fn is_nine_digits(s: &str) -> bool {
    s.len() == 9 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Returns true when a birth year yields an age in 0..=120.
#[must_use]
pub fn is_valid_birth_year(year: i32) -> bool {
    let current = Utc::now().year();
    let age = current - year;
    (0..=120).contains(&age)
}

/// Enumerates the missing or invalid fields of a profile.
///
/// The returned strings feed the `VALIDATION:` system line of the
/// info-collection prompt, so they are short field-level phrases rather than
/// structured errors.
#[must_use]
pub fn profile_problems(p: &UserProfile) -> Vec<String> {
    let mut problems = Vec::new();

    if p.first_name.as_deref().is_none_or(str::is_empty) {
        problems.push("first_name missing".to_string());
    }
    if p.last_name.as_deref().is_none_or(str::is_empty) {
        problems.push("last_name missing".to_string());
    }
    match p.id_number.as_deref() {
        None | Some("") => problems.push("id_number missing (9 digits)".to_string()),
        Some(id) if !is_nine_digits(id) => {
            problems.push("id_number invalid (9 digits)".to_string());
        }
        Some(_) => {}
    }
    if p.gender == Gender::Unspecified {
        problems.push("gender missing".to_string());
    }
    match p.birth_year {
        None => problems.push("birth_year missing".to_string()),
        Some(year) if !is_valid_birth_year(year) => {
            problems.push("birth_year invalid (age must be 0-120)".to_string());
        }
        Some(_) => {}
    }
    if p.hmo_name.is_none() {
        problems.push("hmo_name missing".to_string());
    }
    match p.hmo_card_number.as_deref() {
        None | Some("") => problems.push("hmo_card_number missing (9 digits)".to_string()),
        Some(card) if !is_nine_digits(card) => {
            problems.push("hmo_card_number invalid (9 digits)".to_string());
        }
        Some(_) => {}
    }
    if p.membership_tier.is_none() {
        problems.push("membership_tier missing".to_string());
    }

    problems
}

/// True when every collected field is present and valid.
#[must_use]
pub fn is_profile_complete(p: &UserProfile) -> bool {
    profile_problems(p).is_empty()
}
