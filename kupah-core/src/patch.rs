//! LLM-proposed partial profile updates and the canonicalizing merge.
//!
//! The info-phase model replies with a `profile_patch` object holding only
//! the fields it wants to update. The patch is deliberately stringly-typed:
//! the model may send `"maccabi"`, `"זכר"`, or a numeric birth year, and the
//! merge below is the single place where those synonyms are canonicalized
//! into the typed domain values. Unknown keys are ignored at
//! deserialization; null values are ignored at merge; a field whose value
//! fails schema validation is rolled back individually with a warning.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::enums::{Gender, Hmo, Tier};
use crate::profile::UserProfile;
use crate::validate::{is_nine_digits, is_valid_birth_year};

/// Partial profile update as produced by the info-phase LLM contract.
///
/// Every field is optional; absent and `null` both mean "no change".
/// Numeric values for the string-ish fields (id numbers, birth year) are
/// accepted and stringified, since JSON-mode models alternate freely
/// between `"1990"` and `1990`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "de_stringish")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "de_stringish")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "de_stringish")]
    pub id_number: Option<String>,
    #[serde(default, deserialize_with = "de_stringish")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "de_stringish")]
    pub birth_year: Option<String>,
    #[serde(default, deserialize_with = "de_stringish")]
    pub hmo_name: Option<String>,
    #[serde(default, deserialize_with = "de_stringish")]
    pub hmo_card_number: Option<String>,
    #[serde(default, deserialize_with = "de_stringish")]
    pub membership_tier: Option<String>,
}

impl ProfilePatch {
    /// True when the patch carries no updates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == ProfilePatch::default()
    }
}

/// Accepts a string or a number, yielding its string form; `null` and any
/// other JSON type collapse to `None` so a malformed field never sinks the
/// whole patch.
fn de_stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Applies a patch to a profile, canonicalizing synonyms and rejecting
/// invalid values field by field.
///
/// Accepted synonyms (case-insensitive):
///
/// | field | inputs → canonical |
/// |---|---|
/// | `hmo_name` | maccabi→מכבי, meuhedet→מאוחדת, clalit→כללית |
/// | `membership_tier` | gold→זהב, silver→כסף, bronze→ארד |
/// | `gender` | male/זכר→male, female/נקבה→female |
///
/// The previous profile value is kept for any field that fails validation;
/// the rejection is logged with the `request_id` for traceability. A no-op
/// patch returns a bit-identical clone.
#[must_use]
pub fn merge_patch(
    profile: &UserProfile,
    patch: &ProfilePatch,
    request_id: Option<&str>,
) -> UserProfile {
    let mut merged = profile.clone();
    let rid = request_id.unwrap_or("-");

    if let Some(name) = trimmed(&patch.first_name) {
        merged.first_name = Some(name.to_string());
    }
    if let Some(name) = trimmed(&patch.last_name) {
        merged.last_name = Some(name.to_string());
    }

    if let Some(id) = trimmed(&patch.id_number) {
        if is_nine_digits(id) {
            merged.id_number = Some(id.to_string());
        } else {
            warn!(request_id = rid, value = id, "ignoring invalid id_number");
        }
    }

    if let Some(raw) = trimmed(&patch.gender) {
        match raw.to_lowercase().as_str() {
            "male" | "זכר" => merged.gender = Gender::Male,
            "female" | "נקבה" => merged.gender = Gender::Female,
            "other" => merged.gender = Gender::Other,
            "unspecified" => merged.gender = Gender::Unspecified,
            other => warn!(request_id = rid, value = other, "ignoring invalid gender"),
        }
    }

    if let Some(raw) = trimmed(&patch.birth_year) {
        match raw.parse::<i32>() {
            Ok(year) if is_valid_birth_year(year) => merged.birth_year = Some(year),
            _ => warn!(request_id = rid, value = raw, "ignoring invalid birth_year"),
        }
    }

    if let Some(raw) = trimmed(&patch.hmo_name) {
        let canonical = match raw.to_lowercase().as_str() {
            "maccabi" => Some(Hmo::Maccabi),
            "meuhedet" => Some(Hmo::Meuhedet),
            "clalit" => Some(Hmo::Clalit),
            _ => Hmo::parse(raw),
        };
        match canonical {
            Some(hmo) => merged.hmo_name = Some(hmo),
            None => warn!(request_id = rid, value = raw, "ignoring invalid hmo_name"),
        }
    }

    if let Some(card) = trimmed(&patch.hmo_card_number) {
        if is_nine_digits(card) {
            merged.hmo_card_number = Some(card.to_string());
        } else {
            warn!(
                request_id = rid,
                value = card,
                "ignoring invalid hmo_card_number"
            );
        }
    }

    if let Some(raw) = trimmed(&patch.membership_tier) {
        let canonical = match raw.to_lowercase().as_str() {
            "gold" => Some(Tier::Gold),
            "silver" => Some(Tier::Silver),
            "bronze" => Some(Tier::Bronze),
            _ => Tier::parse(raw),
        };
        match canonical {
            Some(tier) => merged.membership_tier = Some(tier),
            None => warn!(
                request_id = rid,
                value = raw,
                "ignoring invalid membership_tier"
            ),
        }
    }

    merged
}

fn trimmed(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch_from(json: &str) -> ProfilePatch {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn noop_patch_leaves_profile_bit_identical() {
        let profile = UserProfile {
            first_name: Some("רות".into()),
            id_number: Some("123456789".into()),
            ..UserProfile::default()
        };
        let merged = merge_patch(&profile, &ProfilePatch::default(), None);
        assert_eq!(merged, profile);
    }

    #[test]
    fn english_synonyms_canonicalize_to_hebrew() {
        let patch = patch_from(r#"{"hmo_name": "Maccabi", "membership_tier": "GOLD"}"#);
        let merged = merge_patch(&UserProfile::default(), &patch, None);
        assert_eq!(merged.hmo_name, Some(Hmo::Maccabi));
        assert_eq!(merged.membership_tier, Some(Tier::Gold));
    }

    #[test]
    fn hebrew_canonical_values_pass_through() {
        let patch = patch_from(r#"{"hmo_name": "מאוחדת", "membership_tier": "כסף"}"#);
        let merged = merge_patch(&UserProfile::default(), &patch, None);
        assert_eq!(merged.hmo_name, Some(Hmo::Meuhedet));
        assert_eq!(merged.membership_tier, Some(Tier::Silver));
    }

    #[test]
    fn hebrew_gender_words_map_to_english_values() {
        let patch = patch_from(r#"{"gender": "זכר"}"#);
        let merged = merge_patch(&UserProfile::default(), &patch, None);
        assert_eq!(merged.gender, Gender::Male);

        let patch = patch_from(r#"{"gender": "נקבה"}"#);
        let merged = merge_patch(&UserProfile::default(), &patch, None);
        assert_eq!(merged.gender, Gender::Female);
    }

    #[test]
    fn numeric_birth_year_and_id_are_accepted() {
        let patch = patch_from(r#"{"birth_year": 1990, "id_number": 123456789}"#);
        let merged = merge_patch(&UserProfile::default(), &patch, None);
        assert_eq!(merged.birth_year, Some(1990));
        assert_eq!(merged.id_number.as_deref(), Some("123456789"));
    }

    #[test]
    fn invalid_fields_roll_back_individually() {
        let profile = UserProfile {
            id_number: Some("111111111".into()),
            ..UserProfile::default()
        };
        let patch = patch_from(
            r#"{"id_number": "12", "first_name": "דנה", "hmo_name": "kaiser", "birth_year": "1850"}"#,
        );
        let merged = merge_patch(&profile, &patch, Some("req-9"));
        // Bad values keep their previous state, good ones land.
        assert_eq!(merged.id_number.as_deref(), Some("111111111"));
        assert_eq!(merged.first_name.as_deref(), Some("דנה"));
        assert_eq!(merged.hmo_name, None);
        assert_eq!(merged.birth_year, None);
    }

    #[test]
    fn null_and_unknown_keys_are_ignored() {
        let patch = patch_from(r#"{"first_name": null, "favorite_color": "blue"}"#);
        assert!(patch.is_empty());
        let merged = merge_patch(&UserProfile::default(), &patch, None);
        assert_eq!(merged, UserProfile::default());
    }

    #[test]
    fn values_are_trimmed_before_validation() {
        let patch = patch_from(r#"{"hmo_card_number": "  987654321  ", "hmo_name": " clalit "}"#);
        let merged = merge_patch(&UserProfile::default(), &patch, None);
        assert_eq!(merged.hmo_card_number.as_deref(), Some("987654321"));
        assert_eq!(merged.hmo_name, Some(Hmo::Clalit));
    }
}
