//! The atomic retrieval unit.

use serde::{Deserialize, Serialize};

use kupah_core::{Hmo, Tier};

/// What a chunk represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// One benefit fact for a service × HMO × tier cell.
    Benefit,
    /// Phone numbers, extensions, and URLs for reaching a fund.
    Contact,
    /// A plain service-name bullet.
    Service,
    /// Free-standing paragraph text.
    Blurb,
}

/// One atomic, filterable knowledge-base record.
///
/// `text` is normalized plain text (entities unescaped, whitespace runs
/// collapsed); `source_uri` is `file://<abs path>#<anchor>` and unique
/// within a build. Benefit chunks always carry a service and an HMO.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KbChunk {
    pub text: String,
    pub source_uri: String,
    pub hmo: Option<Hmo>,
    #[serde(default)]
    pub tier_tags: Vec<Tier>,
    pub section: Option<String>,
    pub service: Option<String>,
    pub kind: ChunkKind,
}

impl KbChunk {
    /// Compact fielded line handed to the embedder; field labels anchor the
    /// metadata so retrieval can key on section, service, fund, and tier as
    /// well as the body text. Empty fields are omitted.
    #[must_use]
    pub fn embedding_payload(&self) -> String {
        let mut bits: Vec<String> = Vec::with_capacity(6);
        if let Some(section) = self.section.as_deref().filter(|s| !s.is_empty()) {
            bits.push(format!("section:{section}"));
        }
        if let Some(service) = self.service.as_deref().filter(|s| !s.is_empty()) {
            bits.push(format!("service:{service}"));
        }
        if let Some(hmo) = self.hmo {
            bits.push(format!("hmo:{hmo}"));
        }
        if !self.tier_tags.is_empty() {
            let tags: Vec<&str> = self.tier_tags.iter().map(Tier::as_str).collect();
            bits.push(format!("tier:{}", tags.join("|")));
        }
        bits.push(format!("kind:{}", self.kind_str()));
        bits.push(format!("text:{}", self.text));
        bits.join(" | ")
    }

    /// The wire name of this chunk's kind.
    #[must_use]
    pub fn kind_str(&self) -> &'static str {
        match self.kind {
            ChunkKind::Benefit => "benefit",
            ChunkKind::Contact => "contact",
            ChunkKind::Service => "service",
            ChunkKind::Blurb => "blurb",
        }
    }

    /// Human-readable tier list for context rendering (empty string when
    /// untagged).
    #[must_use]
    pub fn tier_tags_str(&self) -> String {
        self.tier_tags
            .iter()
            .map(Tier::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_payload_includes_only_populated_fields() {
        let chunk = KbChunk {
            text: "90% הנחה על ייעוץ גנטי".into(),
            source_uri: "file:///kb/gen.html#t1_1".into(),
            hmo: Some(Hmo::Maccabi),
            tier_tags: vec![Tier::Gold],
            section: Some("בדיקות גנטיות".into()),
            service: Some("ייעוץ גנטי".into()),
            kind: ChunkKind::Benefit,
        };
        assert_eq!(
            chunk.embedding_payload(),
            "section:בדיקות גנטיות | service:ייעוץ גנטי | hmo:מכבי | tier:זהב | kind:benefit | text:90% הנחה על ייעוץ גנטי"
        );
    }

    #[test]
    fn blurb_payload_is_kind_and_text_only() {
        let chunk = KbChunk {
            text: "מידע כללי".into(),
            source_uri: "file:///kb/a.html#p1".into(),
            hmo: None,
            tier_tags: vec![],
            section: None,
            service: None,
            kind: ChunkKind::Blurb,
        };
        assert_eq!(chunk.embedding_payload(), "kind:blurb | text:מידע כללי");
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChunkKind::Benefit).unwrap(),
            "\"benefit\""
        );
        let kind: ChunkKind = serde_json::from_str("\"contact\"").unwrap();
        assert_eq!(kind, ChunkKind::Contact);
    }
}
