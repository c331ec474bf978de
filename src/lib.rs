//! Tafsir corpus processing: tolerant XML loading, footnote linking, header
//! parsing, keyword/theme/entity analysis and one JSON record per sura.

pub mod error;
pub mod loader;
pub mod nlp;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod settings;
