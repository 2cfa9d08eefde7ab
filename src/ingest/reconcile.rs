use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use super::normalize::normalize;
use crate::db::{self, ChapterRow, ContentRow, ExtractedPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    SkippedDuplicate,
}

/// Insert a content record for `topic` under `chapter` unless one already
/// exists for the same chapter and normalized title.
///
/// Check-then-insert, not atomic: two processes racing on the same key can
/// both insert.
pub fn reconcile(
    conn: &Connection,
    chapter: &ChapterRow,
    topic: &str,
    description: Vec<ExtractedPoint>,
) -> Result<Outcome> {
    let subject_id = chapter.primary_subject()?;
    let title = normalize(topic);
    let chapter_ids = vec![chapter.id.clone()];

    if db::find_content(conn, &chapter_ids, &title)?.is_some() {
        return Ok(Outcome::SkippedDuplicate);
    }

    db::insert_content(
        conn,
        &ContentRow {
            chapter_ids,
            subject_id: subject_id.to_string(),
            title,
            description,
            views: 0,
            created_at: Utc::now(),
        },
    )?;
    Ok(Outcome::Inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TopicEntry;
    use crate::ingest::IngestError;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn
    }

    fn chapter(id: &str, subjects: &[&str]) -> ChapterRow {
        ChapterRow {
            id: id.to_string(),
            name: format!("Chapter {}", id),
            subject_ids: subjects.iter().map(|s| s.to_string()).collect(),
            topics: vec![TopicEntry::Label("Heat.".into())],
        }
    }

    fn desc(s: &str) -> Vec<ExtractedPoint> {
        vec![ExtractedPoint::Line(s.to_string())]
    }

    #[test]
    fn inserts_normalized_record() {
        let conn = memory();
        let outcome = reconcile(&conn, &chapter("c1", &["s1", "s2"]), "Heat.", desc("first")).unwrap();
        assert_eq!(outcome, Outcome::Inserted);

        let rows = db::fetch_contents(&conn, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].chapter_ids, vec!["c1".to_string()]);
        assert_eq!(rows[0].subject_id, "s1");
        assert_eq!(rows[0].title, "Heat");
        assert_eq!(rows[0].description, desc("first"));
        assert_eq!(rows[0].views, 0);
    }

    #[test]
    fn second_call_skips_whatever_the_description() {
        let conn = memory();
        let c = chapter("c1", &["s1"]);
        assert_eq!(reconcile(&conn, &c, "Heat", desc("first")).unwrap(), Outcome::Inserted);
        assert_eq!(
            reconcile(&conn, &c, "Heat", desc("second")).unwrap(),
            Outcome::SkippedDuplicate
        );
        // Dots do not make a new key.
        assert_eq!(
            reconcile(&conn, &c, "He.at.", Vec::new()).unwrap(),
            Outcome::SkippedDuplicate
        );

        let rows = db::fetch_contents(&conn, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, desc("first"));
    }

    #[test]
    fn same_title_in_another_chapter_is_separate() {
        let conn = memory();
        assert_eq!(
            reconcile(&conn, &chapter("c1", &["s1"]), "Heat", desc("a")).unwrap(),
            Outcome::Inserted
        );
        assert_eq!(
            reconcile(&conn, &chapter("c2", &["s1"]), "Heat", desc("b")).unwrap(),
            Outcome::Inserted
        );
        assert_eq!(db::fetch_contents(&conn, None).unwrap().len(), 2);
    }

    #[test]
    fn subject_is_not_part_of_the_key() {
        let conn = memory();
        reconcile(&conn, &chapter("c1", &["s1"]), "Heat", desc("a")).unwrap();
        assert_eq!(
            reconcile(&conn, &chapter("c1", &["s9"]), "Heat", desc("a")).unwrap(),
            Outcome::SkippedDuplicate
        );
    }

    #[test]
    fn chapter_without_subject_fails_before_writing() {
        let conn = memory();
        let err = reconcile(&conn, &chapter("c1", &[]), "Heat", desc("a")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::NoSubject { chapter }) if chapter == "c1"
        ));
        assert!(db::fetch_contents(&conn, None).unwrap().is_empty());
    }
}
