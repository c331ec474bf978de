pub mod heuristic;
pub mod stopwords;

use std::collections::{HashMap, HashSet};

use tracing::error;

use crate::error::AnnotationError;
use crate::output::{AnalysisRecord, Entity, OrderedMap};

pub use heuristic::HeuristicService;

pub const MAX_KEYWORDS: usize = 20;

/// Entities and noun phrases of one text, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub entities: Vec<Entity>,
    pub noun_chunks: Vec<String>,
}

/// Tokenizer, stopword set and entity/phrase tagger shared by the whole run.
pub trait LanguageService {
    fn stopwords(&self) -> &HashSet<String>;
    fn tokenize(&self, text: &str) -> Result<Vec<String>, AnnotationError>;
    fn annotate(&self, text: &str) -> Result<Annotation, AnnotationError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyAnalysis {
    pub keywords: Vec<String>,
    pub freq_dist: OrderedMap<usize>,
}

/// Top keywords of the lower-cased text: alphabetic, non-stopword, most frequent first.
/// Ties keep first-occurrence order.
pub fn frequency_analysis(
    service: &dyn LanguageService,
    text: &str,
) -> Result<FrequencyAnalysis, AnnotationError> {
    let tokens = service.tokenize(&text.to_lowercase())?;
    let stopwords = service.stopwords();

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();
    for token in tokens {
        if !is_alphabetic(&token) || stopwords.contains(&token) {
            continue;
        }
        match position.get(&token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                position.insert(token.clone(), counts.len());
                counts.push((token, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(MAX_KEYWORDS);

    let mut freq_dist = OrderedMap::new();
    let mut keywords = Vec::with_capacity(counts.len());
    for (word, count) in counts {
        keywords.push(word.clone());
        freq_dist.insert(word, count);
    }
    Ok(FrequencyAnalysis { keywords, freq_dist })
}

/// Frequency pass then annotation pass. A failure is logged and whatever was
/// computed before it is kept; themes and timestamp are filled by the caller.
pub fn analyze(service: &dyn LanguageService, text: &str) -> AnalysisRecord {
    let mut record = AnalysisRecord::default();
    if let Err(e) = fill_analysis(service, text, &mut record) {
        error!(error = %e, "Error in linguistic analysis; keeping partial results");
    }
    record
}

fn fill_analysis(
    service: &dyn LanguageService,
    text: &str,
    record: &mut AnalysisRecord,
) -> Result<(), AnnotationError> {
    let freq = frequency_analysis(service, text)?;
    record.keywords = Some(freq.keywords);
    record.freq_dist = Some(freq.freq_dist);

    let annotation = service.annotate(text)?;
    record.named_entities = Some(annotation.entities);
    record.noun_chunks = Some(annotation.noun_chunks);
    Ok(())
}

fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

// ── Tests ──
