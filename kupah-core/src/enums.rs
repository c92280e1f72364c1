//! String-tagged domain enums and their canonical wire values.
//!
//! HMO and tier values are Hebrew strings in canonical form; they serialize
//! exactly as they appear in the knowledge-base documents and on the wire.
//! Parsing here accepts canonical values only; synonym normalization
//! (English names, Hebrew gender words) is the job of
//! [`crate::patch::merge_patch`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three Israeli health funds.
///
/// # Examples
///
/// ```
/// use kupah_core::Hmo;
///
/// assert_eq!(Hmo::Maccabi.as_str(), "מכבי");
/// assert_eq!(Hmo::parse("כללית"), Some(Hmo::Clalit));
/// assert_eq!(serde_json::to_string(&Hmo::Meuhedet).unwrap(), "\"מאוחדת\"");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hmo {
    #[serde(rename = "מכבי")]
    Maccabi,
    #[serde(rename = "מאוחדת")]
    Meuhedet,
    #[serde(rename = "כללית")]
    Clalit,
}

impl Hmo {
    /// All variants, in the order benefit tables usually list them.
    pub const ALL: [Hmo; 3] = [Hmo::Maccabi, Hmo::Meuhedet, Hmo::Clalit];

    /// The canonical Hebrew value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Hmo::Maccabi => "מכבי",
            Hmo::Meuhedet => "מאוחדת",
            Hmo::Clalit => "כללית",
        }
    }

    /// Parses a canonical Hebrew value; returns `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "מכבי" => Some(Hmo::Maccabi),
            "מאוחדת" => Some(Hmo::Meuhedet),
            "כללית" => Some(Hmo::Clalit),
            _ => None,
        }
    }

    /// Case-insensitive substring match against both the Hebrew and English
    /// fund names, used when classifying table headers and contact bullets.
    #[must_use]
    pub fn match_in_text(text: &str) -> Option<Self> {
        let low = text.to_lowercase();
        if low.contains("מכבי") || low.contains("maccabi") {
            Some(Hmo::Maccabi)
        } else if low.contains("מאוחדת") || low.contains("meuhedet") {
            Some(Hmo::Meuhedet)
        } else if low.contains("כללית") || low.contains("clalit") {
            Some(Hmo::Clalit)
        } else {
            None
        }
    }
}

impl fmt::Display for Hmo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supplemental membership tier (זהב gold, כסף silver, ארד bronze).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "זהב")]
    Gold,
    #[serde(rename = "כסף")]
    Silver,
    #[serde(rename = "ארד")]
    Bronze,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Gold, Tier::Silver, Tier::Bronze];

    /// The canonical Hebrew value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Gold => "זהב",
            Tier::Silver => "כסף",
            Tier::Bronze => "ארד",
        }
    }

    /// Parses a canonical Hebrew value; returns `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "זהב" => Some(Tier::Gold),
            "כסף" => Some(Tier::Silver),
            "ארד" => Some(Tier::Bronze),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User gender as collected during the info phase.
///
/// `Unspecified` is the empty default; validation treats it the same as a
/// missing field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unspecified,
}

impl Gender {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation locale. Hebrew is the default for this service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    He,
    En,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::He => f.write_str("he"),
            Locale::En => f.write_str("en"),
        }
    }
}

/// Dialogue phase label.
///
/// The label is monotone within a single handled request: it may advance
/// `InfoCollection` → `Qna` but never the reverse; across requests the caller
/// owns it and may reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    InfoCollection,
    Qna,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::InfoCollection => f.write_str("INFO_COLLECTION"),
            Phase::Qna => f.write_str("QNA"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmo_round_trips_hebrew_wire_values() {
        for hmo in Hmo::ALL {
            let json = serde_json::to_string(&hmo).unwrap();
            assert_eq!(json, format!("\"{}\"", hmo.as_str()));
            let back: Hmo = serde_json::from_str(&json).unwrap();
            assert_eq!(back, hmo);
            assert_eq!(Hmo::parse(hmo.as_str()), Some(hmo));
        }
        assert_eq!(Hmo::parse("maccabi"), None);
    }

    #[test]
    fn hmo_substring_match_covers_both_languages() {
        assert_eq!(Hmo::match_in_text("מרפאות מכבי בצפון"), Some(Hmo::Maccabi));
        assert_eq!(Hmo::match_in_text("Meuhedet hotline"), Some(Hmo::Meuhedet));
        assert_eq!(Hmo::match_in_text("CLALIT members"), Some(Hmo::Clalit));
        assert_eq!(Hmo::match_in_text("שירותי בריאות אחרים"), None);
    }

    #[test]
    fn tier_round_trips_hebrew_wire_values() {
        for tier in Tier::ALL {
            let json = serde_json::to_string(&tier).unwrap();
            let back: Tier = serde_json::from_str(&json).unwrap();
            assert_eq!(back, tier);
        }
        assert_eq!(Tier::parse("gold"), None);
    }

    #[test]
    fn phase_uses_screaming_snake_wire_form() {
        assert_eq!(
            serde_json::to_string(&Phase::InfoCollection).unwrap(),
            "\"INFO_COLLECTION\""
        );
        assert_eq!(serde_json::to_string(&Phase::Qna).unwrap(), "\"QNA\"");
        assert_eq!(Phase::default(), Phase::InfoCollection);
    }

    #[test]
    fn gender_defaults_to_unspecified() {
        assert_eq!(Gender::default(), Gender::Unspecified);
        assert_eq!(serde_json::to_string(&Gender::Male).unwrap(), "\"male\"");
    }
}
