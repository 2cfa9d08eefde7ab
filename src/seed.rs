use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::info;

use crate::db::{self, ChapterRow, ExamRow, SubjectRow};

/// Catalog export: `{"exams": [...], "subjects": [...], "chapters": [...]}`.
/// Field names follow the document store (`_id`, `subjectIds`, ...).
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub exams: Vec<ExamRow>,
    #[serde(default)]
    pub subjects: Vec<SubjectRow>,
    #[serde(default)]
    pub chapters: Vec<ChapterRow>,
}

pub struct SeedCounts {
    pub exams: usize,
    pub subjects: usize,
    pub chapters: usize,
}

pub fn load_file(path: &Path) -> Result<CatalogFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid catalog JSON in {}", path.display()))
}

/// Insert catalog documents; ids already present are left as they are.
pub fn seed(conn: &Connection, catalog: &CatalogFile) -> Result<SeedCounts> {
    let counts = SeedCounts {
        exams: db::insert_exams(conn, &catalog.exams)?,
        subjects: db::insert_subjects(conn, &catalog.subjects)?,
        chapters: db::insert_chapters(conn, &catalog.chapters)?,
    };
    info!(
        "Seeded {} exams, {} subjects, {} chapters",
        counts.exams, counts.subjects, counts.chapters
    );
    Ok(counts)
}
