//! Rule-based language service: regex tokenizer, stopword filter, and
//! capitalisation/gazetteer entity and noun-phrase tagging. Needs no model files.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{stopwords, Annotation, LanguageService};
use crate::error::AnnotationError;
use crate::output::Entity;

/// Texts longer than this (in characters) are refused by `annotate`.
pub const DEFAULT_MAX_LENGTH: usize = 1_000_000;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<neg>\w+?)n't\b|'(?:s|m|d|ll|re|ve)\b|\d+(?:[.,]\d+)*\b|\w+(?:-\w+)*|[^\w\s]",
    )
    .unwrap()
});

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+(?:st|nd|rd|th)$").unwrap());

const PRONOUNS: &[&str] = &["i", "me", "we", "us", "you", "he", "him", "she", "it", "they", "them"];
const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "his", "her", "its", "their", "our", "my",
    "your", "every", "each", "some", "no", "all",
];
const CONNECTORS: &[&str] = &["of", "the", "al", "bin", "ibn"];
const SENTENCE_END: &[&str] = &[".", "!", "?"];

const NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve", "twenty", "forty", "seventy", "hundred", "thousand",
];
const ORDINAL_WORDS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

const PLACES: &[&str] = &[
    "makkah", "mecca", "madinah", "medina", "yathrib", "egypt", "syria", "arabia", "abyssinia",
    "jerusalem", "palestine", "iraq", "yemen", "taif", "hijaz", "sinai", "babylon", "rome",
    "persia", "canaan", "midian", "badr", "uhud", "hunain", "tabuk", "khaybar",
];
const GROUPS: &[&str] = &[
    "jews", "christians", "muslims", "arabs", "quraish", "quraysh", "ansar", "muhajirin",
    "romans", "persians", "hypocrites", "believers", "jewish", "christian", "muslim", "arab",
];
const PERSONS: &[&str] = &[
    "allah", "muhammad", "moses", "abraham", "jesus", "noah", "adam", "joseph", "david",
    "solomon", "jacob", "isaac", "ishmael", "aaron", "mary", "pharaoh", "gabriel", "lot", "jonah",
    "job", "zechariah", "john", "elijah", "hud", "salih", "shuaib", "luqman", "iblis",
];

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

pub struct HeuristicService {
    stopwords: HashSet<String>,
    max_length: usize,
}

impl Default for HeuristicService {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicService {
    pub fn new() -> Self {
        Self {
            stopwords: stopwords::ENGLISH.iter().map(|w| w.to_string()).collect(),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    fn check_length(&self, text: &str) -> Result<(), String> {
        let len = text.chars().count();
        if len > self.max_length {
            return Err(format!(
                "text of length {} exceeds maximum of {}",
                len, self.max_length
            ));
        }
        Ok(())
    }

    fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }

    fn is_content_word(&self, word: &str) -> bool {
        word.chars().next().is_some_and(char::is_alphabetic)
            && word.chars().all(|c| c.is_alphabetic() || c == '-')
            && !self.is_stopword(word)
    }

    fn entities(&self, tokens: &[Token], text: &str) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut sentence_start = true;
        let mut i = 0;

        while i < tokens.len() {
            let tok = tokens[i];

            if let Some(label) = number_label(tok.text) {
                out.push(Entity {
                    text: tok.text.to_string(),
                    label: label.to_string(),
                });
                sentence_start = false;
                i += 1;
                continue;
            }

            if is_capitalized(tok.text) {
                let end = capitalized_run_end(tokens, i);
                // A sentence-initial capital alone is not a name unless it is a known one.
                if sentence_start
                    && !is_known_name(tok.text)
                    && (self.is_stopword(tok.text) || end - i == 1)
                {
                    sentence_start = false;
                    i += 1;
                    continue;
                }
                let mut start = i;
                while start < end && self.is_stopword(tokens[start].text) {
                    start += 1;
                }
                if start < end {
                    let span = &text[tokens[start].start..tokens[end - 1].end];
                    out.push(Entity {
                        text: span.to_string(),
                        label: entity_label(span).to_string(),
                    });
                }
                sentence_start = false;
                i = end;
                continue;
            }

            sentence_start = SENTENCE_END.contains(&tok.text);
            i += 1;
        }
        out
    }

    fn noun_chunks(&self, tokens: &[Token], text: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let lower = tokens[i].text.to_lowercase();
            if PRONOUNS.contains(&lower.as_str()) {
                out.push(tokens[i].text.to_string());
                i += 1;
                continue;
            }

            let head = if DETERMINERS.contains(&lower.as_str()) { i + 1 } else { i };
            let mut j = head;
            while j < tokens.len() && self.is_content_word(tokens[j].text) {
                j += 1;
            }
            if j > head {
                out.push(text[tokens[i].start..tokens[j - 1].end].to_string());
                i = j;
            } else {
                i += 1;
            }
        }
        out
    }
}

impl LanguageService for HeuristicService {
    fn stopwords(&self) -> &HashSet<String> {
        &self.stopwords
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, AnnotationError> {
        Ok(token_spans(text).into_iter().map(|t| t.text.to_string()).collect())
    }

    fn annotate(&self, text: &str) -> Result<Annotation, AnnotationError> {
        self.check_length(text).map_err(AnnotationError::Model)?;
        let tokens = token_spans(text);
        Ok(Annotation {
            entities: self.entities(&tokens, text),
            noun_chunks: self.noun_chunks(&tokens, text),
        })
    }
}

/// Words, numbers, clitics (`'s`, `n't`, ...) and single punctuation marks with byte offsets.
fn token_spans(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for caps in TOKEN_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        match caps.name("neg") {
            Some(stem) => {
                tokens.push(Token {
                    start: stem.start(),
                    end: stem.end(),
                    text: stem.as_str(),
                });
                tokens.push(Token {
                    start: stem.end(),
                    end: m.end(),
                    text: &text[stem.end()..m.end()],
                });
            }
            None => tokens.push(Token {
                start: m.start(),
                end: m.end(),
                text: m.as_str(),
            }),
        }
    }
    tokens
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
        && word.chars().all(|c| c.is_alphanumeric() || c == '-')
}

fn is_known_name(word: &str) -> bool {
    let lower = word.to_lowercase();
    let lower = lower.as_str();
    PERSONS.contains(&lower) || PLACES.contains(&lower) || GROUPS.contains(&lower)
}

/// End (exclusive) of a run of capitalised words starting at `start`, allowing
/// lower-case connectors such as "of the" between them.
fn capitalized_run_end(tokens: &[Token], start: usize) -> usize {
    let mut end = start + 1;
    let mut j = start + 1;
    while j < tokens.len() {
        if is_capitalized(tokens[j].text) {
            j += 1;
            end = j;
            continue;
        }
        let mut k = j;
        while k < tokens.len() && CONNECTORS.contains(&tokens[k].text) {
            k += 1;
        }
        if k > j && k < tokens.len() && is_capitalized(tokens[k].text) {
            j = k + 1;
            end = j;
        } else {
            break;
        }
    }
    end
}

fn number_label(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        if word.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
            return Some("CARDINAL");
        }
        if ORDINAL_RE.is_match(word) {
            return Some("ORDINAL");
        }
        return None;
    }
    if NUMBER_WORDS.contains(&lower.as_str()) {
        Some("CARDINAL")
    } else if ORDINAL_WORDS.contains(&lower.as_str()) {
        Some("ORDINAL")
    } else {
        None
    }
}

fn entity_label(span: &str) -> &'static str {
    let lower = span.to_lowercase();
    let first = lower.split_whitespace().next().unwrap_or("");
    if PLACES.contains(&lower.as_str()) {
        "GPE"
    } else if GROUPS.contains(&lower.as_str())
        || (!lower.contains(' ') && (lower.ends_with("ites") || lower.ends_with("ians")))
    {
        "NORP"
    } else if first == "day" {
        "EVENT"
    } else {
        "PERSON"
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        HeuristicService::new().tokenize(text).unwrap()
    }

    fn labelled(a: &Annotation) -> Vec<(&str, &str)> {
        a.entities
            .iter()
            .map(|e| (e.text.as_str(), e.label.as_str()))
            .collect()
    }

    #[test]
    fn tokenizer_splits_clitics_and_punctuation() {
        assert_eq!(
            tokens("he didn't see Allah's sign, 3.5 times"),
            vec!["he", "did", "n't", "see", "Allah", "'s", "sign", ",", "3.5", "times"]
        );
    }

    #[test]
    fn tokenizer_keeps_hyphenated_words() {
        assert_eq!(tokens("Al-Baqarah (the Cow)"), vec!["Al-Baqarah", "(", "the", "Cow", ")"]);
    }

    #[test]
    fn stopword_list_is_nltk_english() {
        let svc = HeuristicService::new();
        assert_eq!(svc.stopwords().len(), 179);
        assert!(svc.stopwords().contains("the"));
        assert!(svc.stopwords().contains("wouldn't"));
        assert!(!svc.stopwords().contains("allah"));
    }

    #[test]
    fn entities_in_document_order() {
        let svc = HeuristicService::new();
        let a = svc
            .annotate("In the name of Allah, the Compassionate. Moses went to Egypt with seventy Israelites.")
            .unwrap();
        assert_eq!(
            labelled(&a),
            vec![
                ("Allah", "PERSON"),
                ("Compassionate", "PERSON"),
                ("Moses", "PERSON"),
                ("Egypt", "GPE"),
                ("seventy", "CARDINAL"),
                ("Israelites", "NORP"),
            ]
        );
    }

    #[test]
    fn runs_join_over_connectors() {
        let svc = HeuristicService::new();
        let a = svc.annotate("the Master of the Day of Judgment, the Lord of the Universe").unwrap();
        assert_eq!(
            labelled(&a),
            vec![
                ("Master of the Day of Judgment", "PERSON"),
                ("Lord of the Universe", "PERSON"),
            ]
        );
    }

    #[test]
    fn sentence_initial_word_is_not_an_entity() {
        let svc = HeuristicService::new();
        let a = svc.annotate("Praise is only for Him. Truly the first day").unwrap();
        assert_eq!(labelled(&a), vec![("first", "ORDINAL")]);
    }

    #[test]
    fn capitalised_stopwords_trimmed() {
        let svc = HeuristicService::new();
        let a = svc.annotate("and then He sent The Messenger").unwrap();
        assert_eq!(labelled(&a), vec![("Messenger", "PERSON")]);
    }

    #[test]
    fn day_runs_are_events() {
        let svc = HeuristicService::new();
        let a = svc.annotate("on the Day of Resurrection").unwrap();
        assert_eq!(labelled(&a), vec![("Day of Resurrection", "EVENT")]);
    }

    #[test]
    fn noun_chunks_with_determiners_and_pronouns() {
        let svc = HeuristicService::new();
        let a = svc.annotate("He is Merciful and a Prophet").unwrap();
        assert_eq!(a.noun_chunks, vec!["He", "Merciful", "a Prophet"]);
    }

    #[test]
    fn noun_chunks_keep_duplicates() {
        let svc = HeuristicService::new();
        let a = svc.annotate("the Book, the Book").unwrap();
        assert_eq!(a.noun_chunks, vec!["the Book", "the Book"]);
    }

    #[test]
    fn lone_determiner_is_not_a_chunk() {
        let svc = HeuristicService::new();
        let a = svc.annotate("the, of").unwrap();
        assert!(a.noun_chunks.is_empty());
    }

    #[test]
    fn over_long_text_is_refused() {
        let svc = HeuristicService::new().with_max_length(5);
        let err = svc.annotate("longer than five").unwrap_err();
        assert!(matches!(err, AnnotationError::Model(_)));
        assert!(svc.annotate("short").is_ok());
        assert_eq!(svc.tokenize("longer than five").unwrap().len(), 3);
    }

    #[test]
    fn over_long_text_keeps_keywords() {
        let svc = HeuristicService::new().with_max_length(10);
        let rec = crate::nlp::analyze(&svc, "mercy mercy guidance light");
        assert_eq!(
            rec.keywords,
            Some(vec!["mercy".to_string(), "guidance".to_string(), "light".to_string()])
        );
        assert_eq!(rec.freq_dist.as_ref().and_then(|f| f.get("mercy")), Some(&2));
        assert!(rec.named_entities.is_none());
        assert!(rec.noun_chunks.is_none());
    }

    #[test]
    fn sentence_initial_multi_word_name() {
        let svc = HeuristicService::new();
        let a = svc.annotate("Abu Lahab perished. Then Zaid bin Haritha came.").unwrap();
        assert_eq!(
            labelled(&a),
            vec![("Abu Lahab", "PERSON"), ("Zaid bin Haritha", "PERSON")]
        );
    }

    #[test]
    fn empty_text() {
        let svc = HeuristicService::new();
        assert_eq!(svc.annotate("").unwrap(), Annotation::default());
    }
}
