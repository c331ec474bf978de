use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::loader::FootnoteUnit;
use crate::output::OrderedMap;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\d+)\}").unwrap());

/// Footnote texts of one chapter keyed by index. Duplicate indices: last one wins.
pub fn footnote_index(units: &[FootnoteUnit]) -> HashMap<String, String> {
    let mut index = HashMap::with_capacity(units.len());
    for unit in units {
        match (unit.index.as_deref(), unit.text.as_deref()) {
            (Some(i), Some(t)) if !i.is_empty() && !t.is_empty() => {
                index.insert(i.to_string(), t.to_string());
            }
            _ => {}
        }
    }
    index
}

/// Marker keys in source order, duplicates included.
pub fn extract_markers(text: &str) -> Vec<String> {
    MARKER_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Text with every marker removed and the ends trimmed. Inner spacing is left as is.
pub fn strip_markers(text: &str) -> String {
    MARKER_RE.replace_all(text, "").trim().to_string()
}

/// Footnotes referenced by `markers` that exist in the chapter index.
pub fn resolve_footnotes(
    markers: &[String],
    footnotes: &HashMap<String, String>,
) -> OrderedMap<String> {
    let mut resolved = OrderedMap::new();
    for marker in markers {
        if let Some(text) = footnotes.get(marker) {
            resolved.insert(marker.clone(), text.clone());
        }
    }
    resolved
}

// ── Tests ──
