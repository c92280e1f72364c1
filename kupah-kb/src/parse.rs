//! HTML → chunk extraction.
//!
//! Each document is walked in tree order over `h1/h2/h3/table/ul/p` nodes:
//! headings update the running section tracker, tables become atomic
//! benefit records (one per service × HMO × tier), top-level list items
//! become contact or service records, and paragraphs become blurbs.
//!
//! Anchors come from a monotone per-document counter (`#p<n>`, `#c<n>`,
//! `#s<n>`) and from a document-scoped row counter for table cells
//! (`#t<row>_<col>`, with a segment suffix when one cell splits into
//! several tier records), keeping every `source_uri` unique and
//! reproducible across platforms.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use kupah_core::{Hmo, Tier};

use crate::chunk::{ChunkKind, KbChunk};

static WALK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, table, ul, p").expect("static selector"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("static selector"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("static selector"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static TIER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(זהב|כסף|ארד)\s*[:：]").expect("static regex"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\d{2,3}-\d{6,7}|\d-\d{3}-\d{2}-\d{2}-\d{2}|\*?\d{3,4})").expect("static regex")
});
static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"שלוחה\s*(\d+)").expect("static regex"));

/// Extracts all chunks from one HTML document.
///
/// `path` is the absolute source path used to mint `file://` URIs.
#[must_use]
pub fn extract_chunks(path: &str, html_str: &str) -> Vec<KbChunk> {
    let doc = Html::parse_document(html_str);
    let mut out = Vec::new();
    let mut section: Option<String> = None;
    // Monotone counters scoped to this document.
    let mut anchor: usize = 0;
    let mut table_row: usize = 0;

    for node in doc.select(&WALK) {
        match node.value().name() {
            "h1" | "h2" | "h3" => {
                let heading = clean(&text_of(node));
                section = (!heading.is_empty()).then_some(heading);
            }
            "table" => {
                extract_table(path, node, section.as_deref(), &mut table_row, &mut out);
            }
            "ul" => {
                extract_list(path, node, section.as_deref(), &mut anchor, &mut out);
            }
            "p" => {
                let text = clean(&text_of(node));
                if !text.is_empty() {
                    anchor += 1;
                    out.push(KbChunk {
                        text,
                        source_uri: format!("file://{path}#p{anchor}"),
                        hmo: None,
                        tier_tags: vec![],
                        section: section.clone(),
                        service: None,
                        kind: ChunkKind::Blurb,
                    });
                }
            }
            _ => {}
        }
    }

    out
}

/// One benefit record per (service row × HMO column × tier segment).
fn extract_table(
    path: &str,
    table: ElementRef<'_>,
    section: Option<&str>,
    table_row: &mut usize,
    out: &mut Vec<KbChunk>,
) {
    let rows: Vec<ElementRef<'_>> = table.select(&ROWS).collect();
    let Some((header, data_rows)) = rows.split_first() else {
        return;
    };

    // Identify HMO columns by case-insensitive substring match on both the
    // Hebrew and English fund names.
    let mut hmo_cols: HashMap<usize, Hmo> = HashMap::new();
    for (idx, cell) in header.select(&CELLS).enumerate() {
        if let Some(hmo) = Hmo::match_in_text(&clean(&text_of(cell))) {
            hmo_cols.insert(idx, hmo);
        }
    }

    for tr in data_rows {
        let cells: Vec<ElementRef<'_>> = tr.select(&CELLS).collect();
        if cells.is_empty() {
            continue;
        }
        *table_row += 1;
        let row = *table_row;
        let service = clean(&text_of(cells[0]));

        for (col, td) in cells.iter().enumerate().skip(1) {
            let Some(&hmo) = hmo_cols.get(&col) else {
                continue;
            };
            let cell_text = clean(&text_of(*td));

            for (seg, (tier, body)) in split_tiers(&cell_text).into_iter().enumerate() {
                let suffix = if seg == 0 {
                    String::new()
                } else {
                    format!("_{seg}")
                };
                out.push(KbChunk {
                    text: body,
                    source_uri: format!("file://{path}#t{row}_{col}{suffix}"),
                    hmo: Some(hmo),
                    tier_tags: tier.into_iter().collect(),
                    section: section.map(str::to_string),
                    service: Some(service.clone()),
                    kind: ChunkKind::Benefit,
                });
            }
        }
    }
}

/// Splits a benefit cell into tier-labelled segments.
///
/// Segments are introduced by a זהב/כסף/ארד marker immediately followed by
/// a colon (ASCII or full-width); text before the first marker is dropped,
/// matching how the source tables lay out tier breakdowns. A cell without
/// markers yields a single untagged segment.
fn split_tiers(cell_text: &str) -> Vec<(Option<Tier>, String)> {
    let marks: Vec<(usize, usize, Tier)> = TIER_MARKER
        .captures_iter(cell_text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let tier = Tier::parse(caps.get(1)?.as_str())?;
            Some((whole.start(), whole.end(), tier))
        })
        .collect();

    if marks.is_empty() {
        return vec![(None, cell_text.to_string())];
    }

    let mut segments = Vec::with_capacity(marks.len());
    for (i, &(_, body_start, tier)) in marks.iter().enumerate() {
        let body_end = marks.get(i + 1).map_or(cell_text.len(), |next| next.0);
        let body = cell_text[body_start..body_end].trim();
        if !body.is_empty() {
            segments.push((Some(tier), body.to_string()));
        }
    }
    segments
}

/// Classifies each top-level `<li>` as a contact (phones, extension, URLs,
/// or an explicit "טלפון") or a plain service bullet.
fn extract_list(
    path: &str,
    ul: ElementRef<'_>,
    section: Option<&str>,
    anchor: &mut usize,
    out: &mut Vec<KbChunk>,
) {
    let items = ul
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "li");

    for li in items {
        let text = clean(&text_of(li));
        if text.is_empty() {
            continue;
        }

        let urls: Vec<String> = li
            .select(&LINKS)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect();
        let phones: Vec<&str> = PHONE.find_iter(&text).map(|m| m.as_str()).collect();
        let hmo = Hmo::match_in_text(&text);

        if !phones.is_empty() || text.contains("טלפון") || !urls.is_empty() {
            let mut bits: Vec<String> = Vec::new();
            if !phones.is_empty() {
                bits.push(phones.join("; "));
            }
            if let Some(ext) = EXTENSION
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
            {
                bits.push(format!("שלוחה {ext}"));
            }
            if !urls.is_empty() {
                bits.push(urls.join("; "));
            }
            let payload = if bits.is_empty() {
                text.clone()
            } else {
                bits.join(" | ")
            };

            *anchor += 1;
            out.push(KbChunk {
                text: payload,
                source_uri: format!("file://{path}#c{anchor}"),
                hmo,
                tier_tags: vec![],
                section: section.map(str::to_string),
                service: None,
                kind: ChunkKind::Contact,
            });
        } else {
            *anchor += 1;
            out.push(KbChunk {
                text: text.clone(),
                source_uri: format!("file://{path}#s{anchor}"),
                hmo: None,
                tier_tags: vec![],
                section: section.map(str::to_string),
                service: Some(text),
                kind: ChunkKind::Service,
            });
        }
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

/// Collapses every whitespace run (tabs, spaces, newlines) to one space and
/// trims the ends. Entities are already decoded by the HTML parser.
fn clean(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}
