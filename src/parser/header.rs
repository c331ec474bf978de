use std::sync::LazyLock;

use regex::Regex;

use crate::output::OrderedMap;

/// Header templates tried in order; the first that matches wins.
const HEADER_TEMPLATES: &[(&str, &[&str])] = &[
    (
        r"(?i)^\d+\.\s*(.+?)\s+Name\s*\{(.+?)\}\s+Theme\s*\{(.+?)\}",
        &["name", "description", "theme"],
    ),
    (
        r"(?i)^\d+\.\s*(.+?)\s+Name\s*\{(.+?)\}\s+Historical Background\s*\{(.+?)\}\s+Theme:?\s*\{(.+?)\}\s+Topics and their Interconnection\s*\{(.+?)\}",
        &["name", "description", "historical_background", "theme", "topics_interconnection"],
    ),
];

static TEMPLATES: LazyLock<Vec<(Regex, &'static [&'static str])>> = LazyLock::new(|| {
    HEADER_TEMPLATES
        .iter()
        .map(|(pattern, fields)| (Regex::new(pattern).unwrap(), *fields))
        .collect()
});

/// Parse the verse-zero header line into chapter info, falling back to `{raw: text}`.
pub fn parse_chapter_info(text: &str) -> OrderedMap<String> {
    let text = text.trim();
    for (re, fields) in TEMPLATES.iter() {
        if let Some(caps) = re.captures(text) {
            let mut info = OrderedMap::new();
            for (i, field) in fields.iter().enumerate() {
                let value = caps.get(i + 1).map_or("", |m| m.as_str()).trim();
                info.insert(field.to_string(), value.to_string());
            }
            return info;
        }
    }
    let mut info = OrderedMap::new();
    info.insert("raw".to_string(), text.to_string());
    info
}

// ── Tests ──
