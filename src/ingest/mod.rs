pub mod describe;
pub mod normalize;
pub mod reconcile;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{self, ExamRow};
use crate::fetch::{topic_url, FetchFailure, Fetcher};
use crate::paragraphs::extract_paragraphs;
use reconcile::Outcome;

/// Exams tried in order; the first one present in the catalog is used.
pub const EXAM_PREFERENCE: [&str; 2] = ["UPSC", "JEE"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("none of the exams {preferred:?} found in the exams collection")]
    CatalogMissing { preferred: Vec<String> },
    #[error("chapter {chapter} has no subject ids")]
    NoSubject { chapter: String },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub exam: String,
    pub chapters: usize,
    pub topics: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub fetch_failed: usize,
}

pub fn select_exam(conn: &Connection) -> Result<ExamRow> {
    for name in EXAM_PREFERENCE {
        if let Some(exam) = db::find_exam_by_name(conn, name)? {
            return Ok(exam);
        }
    }
    Err(IngestError::CatalogMissing {
        preferred: EXAM_PREFERENCE.iter().map(|s| s.to_string()).collect(),
    }
    .into())
}

/// Sequential fetch → extract → reconcile over every chapter topic.
pub struct Ingestor<'a, F> {
    conn: &'a Connection,
    fetcher: F,
    limit: Option<usize>,
}

impl<'a, F: Fetcher> Ingestor<'a, F> {
    pub fn new(conn: &'a Connection, fetcher: F) -> Self {
        Self {
            conn,
            fetcher,
            limit: None,
        }
    }

    /// Stop after this many topics.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub async fn run(&self) -> Result<RunReport> {
        let exam = select_exam(self.conn)?;
        info!("Using exam: {} ({})", exam.name, exam.id);

        let chapters = db::fetch_chapters(self.conn)?;
        let total: usize = chapters.iter().map(|c| c.topics.len()).sum();
        let budget = self.limit.map_or(total, |n| n.min(total));

        let pb = ProgressBar::new(budget as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                .progress_chars("=> "),
        );

        let mut report = RunReport {
            exam: exam.name,
            chapters: chapters.len(),
            ..Default::default()
        };

        'chapters: for chapter in &chapters {
            chapter.primary_subject()?;

            for entry in &chapter.topics {
                if report.topics >= budget {
                    break 'chapters;
                }
                let topic = entry.label();

                let description = match self.fetch_paragraphs(topic).await {
                    Ok(paragraphs) => describe::extract(&paragraphs),
                    Err(e) => {
                        warn!("Fetch failed for {}: {}", topic, e);
                        report.fetch_failed += 1;
                        Vec::new()
                    }
                };

                match reconcile::reconcile(self.conn, chapter, topic, description)? {
                    Outcome::Inserted => {
                        info!("Inserted → {} → {}", chapter.name, topic);
                        report.inserted += 1;
                    }
                    Outcome::SkippedDuplicate => {
                        info!("Skipped duplicate → {} → {}", chapter.name, topic);
                        report.skipped += 1;
                    }
                }
                report.topics += 1;
                pb.inc(1);
            }
        }

        pb.finish_and_clear();
        Ok(report)
    }

    /// Non-200 responses count as failures; the body is only parsed on success.
    async fn fetch_paragraphs(&self, topic: &str) -> Result<Vec<String>, FetchFailure> {
        let page = self.fetcher.fetch(&topic_url(topic)).await?;
        if page.status != 200 {
            return Err(FetchFailure::Status(page.status));
        }
        Ok(extract_paragraphs(&page.body))
    }
}
