use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ingest::IngestError;

pub const DB_PATH: &str = "data/content.sqlite";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

/// Sequence-valued fields are stored as JSON text, so `chapter_ids = '["c1"]'`
/// is sequence equality on the stored document.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS exams (
            id            TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            description   TEXT,
            upcoming_date TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_exams_name ON exams(name);

        CREATE TABLE IF NOT EXISTS subjects (
            id        TEXT PRIMARY KEY,
            name      TEXT NOT NULL,
            exam_ids  TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS chapters (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            subject_ids TEXT NOT NULL DEFAULT '[]',
            topics      TEXT NOT NULL DEFAULT '[]'
        );

        -- No UNIQUE(chapter_ids, title): the ingest pass checks before it writes.
        CREATE TABLE IF NOT EXISTS contents (
            id          INTEGER PRIMARY KEY,
            chapter_ids TEXT NOT NULL,
            subject_id  TEXT NOT NULL,
            title       TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '[]',
            views       INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_contents_title ON contents(title);
        ",
    )?;
    Ok(())
}

fn json_col<T: DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ── Catalog ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRow {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub upcoming_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRow {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub exam_ids: Vec<String>,
}

/// Chapter topics come in two shapes: bare labels from older data, and
/// `{name, slug}` objects from newer data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TopicEntry {
    Label(String),
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slug: Option<String>,
    },
}

impl TopicEntry {
    pub fn label(&self) -> &str {
        match self {
            TopicEntry::Label(label) => label,
            TopicEntry::Named { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRow {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject_ids: Vec<String>,
    #[serde(default)]
    pub topics: Vec<TopicEntry>,
}

impl ChapterRow {
    /// The first subject id is authoritative for content written under this chapter.
    pub fn primary_subject(&self) -> Result<&str, IngestError> {
        self.subject_ids
            .first()
            .map(String::as_str)
            .ok_or_else(|| IngestError::NoSubject {
                chapter: self.id.clone(),
            })
    }
}

pub fn insert_exams(conn: &Connection, rows: &[ExamRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO exams (id, name, description, upcoming_date)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for r in rows {
            count += stmt.execute(rusqlite::params![r.id, r.name, r.description, r.upcoming_date])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn insert_subjects(conn: &Connection, rows: &[SubjectRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO subjects (id, name, exam_ids) VALUES (?1, ?2, ?3)")?;
        for r in rows {
            count += stmt.execute(rusqlite::params![
                r.id,
                r.name,
                serde_json::to_string(&r.exam_ids)?,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn insert_chapters(conn: &Connection, rows: &[ChapterRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO chapters (id, name, subject_ids, topics)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for r in rows {
            count += stmt.execute(rusqlite::params![
                r.id,
                r.name,
                serde_json::to_string(&r.subject_ids)?,
                serde_json::to_string(&r.topics)?,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn find_exam_by_name(conn: &Connection, name: &str) -> Result<Option<ExamRow>> {
    let exam = conn
        .query_row(
            "SELECT id, name, description, upcoming_date FROM exams WHERE name = ?1
             ORDER BY rowid LIMIT 1",
            [name],
            |row| {
                Ok(ExamRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    upcoming_date: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(exam)
}

/// Every chapter in insertion order.
pub fn fetch_chapters(conn: &Connection) -> Result<Vec<ChapterRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, subject_ids, topics FROM chapters ORDER BY rowid")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ChapterRow {
                id: row.get(0)?,
                name: row.get(1)?,
                subject_ids: json_col(row, 2)?,
                topics: json_col(row, 3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load chapters")?;
    Ok(rows)
}

// ── Contents ──

/// One description entry: a plain summary line, or a tagged point such as
/// `{"point": "Example", "expression": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedPoint {
    Line(String),
    Tagged { point: String, expression: String },
}

impl ExtractedPoint {
    pub fn example(expression: impl Into<String>) -> Self {
        ExtractedPoint::Tagged {
            point: "Example".to_string(),
            expression: expression.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentRow {
    pub chapter_ids: Vec<String>,
    pub subject_id: String,
    pub title: String,
    pub description: Vec<ExtractedPoint>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

/// Look up a content record by its exact `(chapter_ids, title)` key.
pub fn find_content(conn: &Connection, chapter_ids: &[String], title: &str) -> Result<Option<i64>> {
    let key = serde_json::to_string(chapter_ids)?;
    let id = conn
        .query_row(
            "SELECT id FROM contents WHERE chapter_ids = ?1 AND title = ?2 LIMIT 1",
            rusqlite::params![key, title],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn insert_content(conn: &Connection, row: &ContentRow) -> Result<i64> {
    conn.execute(
        "INSERT INTO contents (chapter_ids, subject_id, title, description, views, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            serde_json::to_string(&row.chapter_ids)?,
            row.subject_id,
            row.title,
            serde_json::to_string(&row.description)?,
            row.views,
            row.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn fetch_contents(conn: &Connection, limit: Option<usize>) -> Result<Vec<ContentRow>> {
    let sql = format!(
        "SELECT chapter_ids, subject_id, title, description, views, created_at
         FROM contents ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            let created: String = row.get(5)?;
            let created_at = DateTime::parse_from_rfc3339(&created)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Utc);
            Ok(ContentRow {
                chapter_ids: json_col(row, 0)?,
                subject_id: row.get(1)?,
                title: row.get(2)?,
                description: json_col(row, 3)?,
                views: row.get(4)?,
                created_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub exams: usize,
    pub subjects: usize,
    pub chapters: usize,
    pub topics: usize,
    pub contents: usize,
    pub empty_descriptions: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };
    let topics = fetch_chapters(conn)?.iter().map(|c| c.topics.len()).sum();
    Ok(Stats {
        exams: count("SELECT COUNT(*) FROM exams")?,
        subjects: count("SELECT COUNT(*) FROM subjects")?,
        chapters: count("SELECT COUNT(*) FROM chapters")?,
        topics,
        contents: count("SELECT COUNT(*) FROM contents")?,
        empty_descriptions: count("SELECT COUNT(*) FROM contents WHERE description = '[]'")?,
    })
}
