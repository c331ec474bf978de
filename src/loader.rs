use std::path::Path;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, warn};

use crate::error::LoadError;

const CHAPTER_TAG: &[u8] = b"sura";
const VERSE_TAG: &[u8] = b"aya";
const FOOTNOTE_TAG: &[u8] = b"footer";
const DEFAULT_COLLECTION: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Default)]
pub struct Chapter {
    pub index: Option<String>,
    pub verses: Vec<VerseUnit>,
    pub footnotes: Vec<FootnoteUnit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerseUnit {
    pub index: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FootnoteUnit {
    pub index: Option<String>,
    pub text: Option<String>,
}

/// Read and parse a tafsir markup file, recovering from malformed markup.
pub fn load(path: &Path) -> Result<Document, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes);
    let doc = parse_document(&content).ok_or_else(|| LoadError::NoRoot {
        path: path.to_path_buf(),
    })?;
    info!(
        path = %path.display(),
        collection = %doc.name,
        chapters = doc.chapters.len(),
        "Loaded tafsir source"
    );
    Ok(doc)
}

/// Best-effort parse of the whole markup. Returns `None` only when no root element exists.
pub fn parse_document(xml: &str) -> Option<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;

    let mut root: Option<Document> = None;
    let mut root_tag: Vec<u8> = Vec::new();
    // Element nesting below the root; 0 = direct child of root.
    let mut depth: usize = 0;
    let mut current: Option<Chapter> = None;
    let mut last_error_pos = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_none() {
                    root_tag = e.name().as_ref().to_vec();
                    root = Some(new_root(&e));
                    continue;
                }
                if e.name().as_ref() == CHAPTER_TAG && current.is_some() {
                    // A chapter opening inside an unclosed one is its sibling.
                    depth = 0;
                }
                open_element(&e, depth, &mut current, root.as_mut());
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if root.is_none() {
                    // Self-closing root: a document with no chapters.
                    root = Some(new_root(&e));
                    break;
                }
                if e.name().as_ref() == CHAPTER_TAG && current.is_some() {
                    depth = 0;
                }
                open_element(&e, depth, &mut current, root.as_mut());
                if depth == 0 && e.name().as_ref() == CHAPTER_TAG {
                    close_chapter(&mut current, root.as_mut());
                }
            }
            Ok(Event::End(e)) => {
                if depth == 0 {
                    if root.is_some() && e.name().as_ref() == root_tag.as_slice() {
                        break;
                    }
                    // Stray closing tag at chapter level.
                    continue;
                }
                depth -= 1;
                if depth == 0 && e.name().as_ref() == CHAPTER_TAG {
                    close_chapter(&mut current, root.as_mut());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                let pos = reader.buffer_position();
                warn!(position = pos, error = %e, "Recovering from malformed markup");
                if last_error_pos == Some(pos) {
                    break;
                }
                last_error_pos = Some(pos);
            }
        }
    }

    close_chapter(&mut current, root.as_mut());
    root
}

fn new_root(e: &BytesStart) -> Document {
    Document {
        name: attribute(e, b"name").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        chapters: Vec::new(),
    }
}

fn open_element(
    e: &BytesStart,
    depth: usize,
    current: &mut Option<Chapter>,
    root: Option<&mut Document>,
) {
    let name = e.name();
    match name.as_ref() {
        CHAPTER_TAG if depth == 0 => {
            // An unclosed previous chapter ends where the next one begins.
            close_chapter(current, root);
            *current = Some(Chapter {
                index: attribute(e, b"index"),
                ..Default::default()
            });
        }
        VERSE_TAG if depth == 1 => {
            if let Some(chapter) = current.as_mut() {
                chapter.verses.push(VerseUnit {
                    index: attribute(e, b"index"),
                    text: attribute(e, b"text"),
                });
            }
        }
        FOOTNOTE_TAG if depth == 1 => {
            if let Some(chapter) = current.as_mut() {
                chapter.footnotes.push(FootnoteUnit {
                    index: attribute(e, b"index"),
                    text: attribute(e, b"text"),
                });
            }
        }
        other => {
            debug!(tag = %String::from_utf8_lossy(other), depth, "Ignoring element");
        }
    }
}

fn close_chapter(current: &mut Option<Chapter>, root: Option<&mut Document>) {
    if let (Some(chapter), Some(doc)) = (current.take(), root) {
        doc.chapters.push(chapter);
    }
}

/// Attribute value with XML and common HTML entities unescaped. A value that
/// still holds an unknown entity is kept as raw text.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .with_checks(false)
        .filter_map(Result::ok)
        .find(|a| a.key.as_ref() == key)
        .map(|a| attribute_value(&a))
}

fn attribute_value(attr: &Attribute) -> String {
    match attr.unescape_value_with(html_entity) {
        Ok(v) => v.into_owned(),
        Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
    }
}

/// The five XML entities plus named entities seen in HTML-exported corpora.
fn html_entity(name: &str) -> Option<&'static str> {
    let resolved = match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "hellip" => "\u{2026}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        _ => return None,
    };
    Some(resolved)
}

// ── Tests ──
