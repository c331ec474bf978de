pub mod header;
pub mod markers;
pub mod themes;

use std::collections::HashMap;

use crate::loader::Chapter;
use crate::nlp::{self, LanguageService};
use crate::output::{
    timestamp, ChapterIndex, ChapterOutput, Metadata, OrderedMap, VerseRecord, SCHEMA_VERSION,
};

/// Verse index that carries the chapter header instead of verse text.
pub const HEADER_INDEX: &str = "0";

/// One chapter: footnotes → index, header verse → chapter info, other verses → records.
pub fn assemble_chapter(
    collection: &str,
    chapter: &Chapter,
    service: &dyn LanguageService,
) -> ChapterOutput {
    let footnotes = markers::footnote_index(&chapter.footnotes);
    let mut sura_info = OrderedMap::new();
    let mut ayah = Vec::with_capacity(chapter.verses.len());

    for unit in &chapter.verses {
        let Some(text) = unit.text.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        if unit.index.as_deref() == Some(HEADER_INDEX) {
            sura_info = header::parse_chapter_info(text);
        } else {
            ayah.push(build_verse(unit.index.clone(), text, &footnotes, service));
        }
    }

    ChapterOutput {
        qurantafseer: collection.to_string(),
        sura_index: chapter.index.as_deref().map(ChapterIndex::from_raw),
        sura_info,
        ayah,
        metadata: Metadata {
            processed_timestamp: timestamp(),
            version: SCHEMA_VERSION.to_string(),
        },
    }
}

pub fn build_verse(
    index: Option<String>,
    raw_text: &str,
    footnotes: &HashMap<String, String>,
    service: &dyn LanguageService,
) -> VerseRecord {
    let markers = markers::extract_markers(raw_text);
    let clean_text = markers::strip_markers(raw_text);
    let footers = markers::resolve_footnotes(&markers, footnotes);

    let mut analysis = nlp::analyze(service, &clean_text);
    analysis.themes = themes::extract_themes(&clean_text);
    analysis.advanced_analysis_timestamp = timestamp();

    VerseRecord {
        aya_index: index,
        raw_text: raw_text.to_string(),
        clean_text,
        markers,
        footers,
        analysis,
    }
}

// ── Tests ──
