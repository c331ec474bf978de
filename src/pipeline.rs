use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, info_span};

use crate::error::PipelineError;
use crate::loader::{self, Document};
use crate::nlp::LanguageService;
use crate::output::{ChapterOutput, JsonPersister};
use crate::parser;

/// What a sink did with a chapter.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Written(PathBuf),
    Skipped,
}

/// Receives each assembled chapter. An `Err` aborts the whole run.
pub trait ChapterSink {
    fn accept(&mut self, chapter: &ChapterOutput) -> anyhow::Result<Delivery>;
}

/// Write failures are logged and reported as `Skipped`; the run continues.
impl ChapterSink for JsonPersister {
    fn accept(&mut self, chapter: &ChapterOutput) -> anyhow::Result<Delivery> {
        match self.write(chapter) {
            Ok(path) => Ok(Delivery::Written(path)),
            Err(e) => {
                error!(error = %e, "Error saving sura analysis");
                Ok(Delivery::Skipped)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub chapters: usize,
    pub written: usize,
    pub skipped: usize,
}

/// Load `path` and run every chapter through `sink`.
pub fn process_file(
    path: &Path,
    service: &dyn LanguageService,
    sink: &mut dyn ChapterSink,
) -> Result<RunSummary, PipelineError> {
    info!(path = %path.display(), "Starting to process tafsir XML file");
    let document = loader::load(path).inspect_err(|e| {
        error!(path = %path.display(), error = %e, "Error loading tafsir file");
    })?;
    let summary = run(document, service, sink)?;
    info!(path = %path.display(), "Completed processing the tafsir XML file");
    Ok(summary)
}

/// Process chapters strictly in order, one at a time. Each chapter is dropped
/// once its output has been handed to the sink.
pub fn run(
    document: Document,
    service: &dyn LanguageService,
    sink: &mut dyn ChapterSink,
) -> Result<RunSummary, PipelineError> {
    let Document { name, chapters } = document;

    let pb = ProgressBar::new(chapters.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} suras")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut summary = RunSummary::default();
    for chapter in chapters {
        let label = chapter.index.clone().unwrap_or_else(|| "unknown".to_string());
        let span = info_span!("sura", index = %label);
        let _entered = span.enter();

        let output = parser::assemble_chapter(&name, &chapter, service);
        drop(chapter);

        match sink.accept(&output) {
            Ok(Delivery::Written(_)) => summary.written += 1,
            Ok(Delivery::Skipped) => summary.skipped += 1,
            Err(e) => {
                error!(error = %e, "Error processing sura; aborting run");
                pb.abandon();
                return Err(PipelineError::Chapter {
                    index: label,
                    source: e.into(),
                });
            }
        }
        summary.chapters += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        chapters = summary.chapters,
        written = summary.written,
        skipped = summary.skipped,
        "Processed all suras"
    );
    Ok(summary)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Chapter, VerseUnit};
    use crate::nlp::HeuristicService;

    const SAMPLE: &str = "tests/fixtures/maududi_sample.xml";

    #[derive(Default)]
    struct Collect(Vec<ChapterOutput>);

    impl ChapterSink for Collect {
        fn accept(&mut self, chapter: &ChapterOutput) -> anyhow::Result<Delivery> {
            self.0.push(chapter.clone());
            Ok(Delivery::Skipped)
        }
    }

    /// Fails on the chapter with the given index.
    struct FailOn {
        index: &'static str,
        seen: Vec<String>,
    }

    impl ChapterSink for FailOn {
        fn accept(&mut self, chapter: &ChapterOutput) -> anyhow::Result<Delivery> {
            let index = chapter
                .sura_index
                .as_ref()
                .map(|i| i.to_string())
                .unwrap_or_default();
            self.seen.push(index.clone());
            if index == self.index {
                anyhow::bail!("sink rejected sura {}", index);
            }
            Ok(Delivery::Skipped)
        }
    }

    fn document(indices: &[&str]) -> Document {
        Document {
            name: "Test".into(),
            chapters: indices
                .iter()
                .map(|i| Chapter {
                    index: Some(i.to_string()),
                    verses: vec![VerseUnit {
                        index: Some("1".into()),
                        text: Some("A parable of mercy {1}".into()),
                    }],
                    footnotes: Vec::new(),
                })
                .collect(),
        }
    }

    /// Output JSON with the two embedded timestamps blanked.
    fn without_timestamps(path: &Path) -> serde_json::Value {
        let mut v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        v["metadata"]["processed_timestamp"] = serde_json::Value::Null;
        for aya in v["ayah"].as_array_mut().unwrap() {
            aya["analysis"]["advanced_analysis_timestamp"] = serde_json::Value::Null;
        }
        v
    }

    #[test]
    fn writes_one_file_per_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonPersister::new(dir.path());
        let summary =
            process_file(Path::new(SAMPLE), &HeuristicService::new(), &mut sink).unwrap();
        assert_eq!(summary, RunSummary { chapters: 2, written: 2, skipped: 0 });

        let v = without_timestamps(&dir.path().join("sura_2.json"));
        assert_eq!(v["qurantafseer"], "Sayyid Abul Ala Maududi");
        assert_eq!(v["sura_index"], 2);
        assert_eq!(v["sura_info"]["theme"], "Guidance");
        assert_eq!(v["ayah"].as_array().unwrap().len(), 2);
        assert_eq!(v["ayah"][0]["markers"], serde_json::json!(["1"]));
        assert_eq!(v["ayah"][0]["footers"], serde_json::json!({"1": "commentary"}));
        assert_eq!(
            v["ayah"][0]["analysis"]["themes"],
            serde_json::json!(["divine mercy", "prophethood"])
        );
        assert!(dir.path().join("sura_1.json").exists());
    }

    #[test]
    fn rerun_is_reproducible_apart_from_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let svc = HeuristicService::new();
        let mut sink = JsonPersister::new(dir.path());

        process_file(Path::new(SAMPLE), &svc, &mut sink).unwrap();
        let first = without_timestamps(&dir.path().join("sura_1.json"));
        process_file(Path::new(SAMPLE), &svc, &mut sink).unwrap();
        let second = without_timestamps(&dir.path().join("sura_1.json"));
        assert_eq!(first, second);
    }

    #[test]
    fn label_index_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonPersister::new(dir.path());
        run(document(&["1-3"]), &HeuristicService::new(), &mut sink).unwrap();
        let v = without_timestamps(&dir.path().join("sura_1-3.json"));
        assert_eq!(v["sura_index"], "1-3");
    }

    #[test]
    fn chapter_failure_aborts_run() {
        let mut sink = FailOn {
            index: "2",
            seen: Vec::new(),
        };
        let err = run(document(&["1", "2", "3"]), &HeuristicService::new(), &mut sink).unwrap_err();
        assert!(matches!(err, PipelineError::Chapter { ref index, .. } if index == "2"));
        // Chapter 3 is never processed.
        assert_eq!(sink.seen, vec!["1", "2"]);
    }

    #[test]
    fn write_failure_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonPersister::new(dir.path().join("not_created"));
        let summary = run(document(&["1", "2"]), &HeuristicService::new(), &mut sink).unwrap();
        assert_eq!(summary, RunSummary { chapters: 2, written: 0, skipped: 2 });
    }

    #[test]
    fn chapters_processed_in_document_order() {
        let mut sink = Collect::default();
        run(document(&["3", "1", "2"]), &HeuristicService::new(), &mut sink).unwrap();
        let order: Vec<String> = sink
            .0
            .iter()
            .filter_map(|c| c.sura_index.as_ref().map(|i| i.to_string()))
            .collect();
        assert_eq!(order, vec!["3", "1", "2"]);
    }

    #[test]
    fn missing_source_is_load_error() {
        let mut sink = Collect::default();
        let err = process_file(
            Path::new("tests/fixtures/missing.xml"),
            &HeuristicService::new(),
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn malformed_source_still_processed() {
        let mut sink = Collect::default();
        let summary = process_file(
            Path::new("tests/fixtures/malformed.xml"),
            &HeuristicService::new(),
            &mut sink,
        )
        .unwrap();
        assert_eq!(summary.chapters, 2);
        assert_eq!(sink.0[0].qurantafseer, "Broken Tafsir");
        assert_eq!(sink.0[0].ayah[0].markers, vec!["1"]);
        assert_eq!(
            sink.0[0].ayah[0].footers.get("1").map(String::as_str),
            Some("note")
        );
    }
}
