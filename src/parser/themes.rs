use std::sync::LazyLock;

use regex::Regex;
use tracing::error;

/// Theme label and the keywords that signal it, in output order.
/// "merciful" is listed on its own since it does not contain "mercy".
pub const THEME_PATTERNS: &[(&str, &str)] = &[
    ("divine mercy", r"mercy|merciful|compassion|forgiveness"),
    ("prophethood", r"prophet|messenger|revelation"),
    ("law", r"law|commandment|decree"),
    ("parables", r"parable|example|story"),
];

static DEFAULT_TAGGER: LazyLock<Result<ThemeTagger, regex::Error>> =
    LazyLock::new(|| ThemeTagger::new(THEME_PATTERNS));

pub struct ThemeTagger {
    themes: Vec<(String, Regex)>,
}

impl ThemeTagger {
    pub fn new(table: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let themes = table
            .iter()
            .map(|(label, pattern)| Ok((label.to_string(), Regex::new(pattern)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { themes })
    }

    /// Every theme whose pattern occurs anywhere in the lower-cased text, once each.
    pub fn tag(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.themes
            .iter()
            .filter(|(_, re)| re.is_match(&lower))
            .map(|(label, _)| label.clone())
            .collect()
    }
}

/// Tag with the built-in table. A broken table is logged and yields no themes.
pub fn extract_themes(text: &str) -> Vec<String> {
    match DEFAULT_TAGGER.as_ref() {
        Ok(tagger) => tagger.tag(text),
        Err(e) => {
            error!(error = %e, "Theme table failed to compile");
            Vec::new()
        }
    }
}

// ── Tests ──
