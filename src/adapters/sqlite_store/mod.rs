//! SQLite-backed segment store.
//!
//! Segments are keyed by id with a `UNIQUE(collection_key, ordinal)` constraint,
//! so successor lookups are index hits instead of title string matching.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS segments (
        id TEXT PRIMARY KEY,
        collection_key TEXT NOT NULL,
        ordinal INTEGER NOT NULL CHECK (ordinal >= 1),
        folder TEXT NOT NULL,
        canonical_media TEXT NOT NULL,
        raw_media TEXT NOT NULL,
        stitched_preview TEXT,
        stitched_boundary_offset REAL,
        transcript TEXT,
        alignment_notes TEXT,
        problem_notes TEXT,
        reviewer_comment TEXT,
        is_annotated INTEGER NOT NULL DEFAULT 0,
        annotated_by TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (collection_key, ordinal),
        CHECK (annotated_by IS NULL OR is_annotated = 1)
    );

    CREATE INDEX IF NOT EXISTS idx_segments_folder ON segments(folder);
    CREATE INDEX IF NOT EXISTS idx_segments_annotated ON segments(is_annotated);
    CREATE INDEX IF NOT EXISTS idx_segments_created_at ON segments(created_at);
"#;

const COLUMNS: &str = "id, collection_key, ordinal, folder, canonical_media, raw_media, \
     stitched_preview, stitched_boundary_offset, transcript, alignment_notes, \
     problem_notes, reviewer_comment, is_annotated, annotated_by, created_at, updated_at";

/// SQLite-based segment store.
pub struct SqliteSegmentStore {
    conn: Mutex<Connection>,
}

impl SqliteSegmentStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn open(path: &Path) -> Result<Self, DomainError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened segment store at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DomainError> {
        self.conn
            .lock()
            .map_err(|e| DomainError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    fn require_changed(changed: usize, segment: &Segment) -> Result<(), DomainError> {
        if changed == 0 {
            return Err(DomainError::NotFound(segment.name()));
        }
        Ok(())
    }

    fn row_to_segment(row: &Row<'_>) -> rusqlite::Result<Segment> {
        let id: String = row.get(0)?;
        let id = Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

        Ok(Segment {
            id,
            collection_key: row.get(1)?,
            ordinal: row.get(2)?,
            folder: row.get(3)?,
            canonical_media: row.get(4)?,
            raw_media: row.get(5)?,
            stitched_preview: row.get(6)?,
            stitched_boundary_offset: row.get(7)?,
            annotation: Annotation {
                transcript: row.get(8)?,
                alignment_notes: row.get(9)?,
                problem_notes: row.get(10)?,
                reviewer_comment: row.get(11)?,
            },
            is_annotated: row.get(12)?,
            annotated_by: row.get::<_, Option<String>>(13)?.map(UserRef),
            created_at: parse_timestamp(row, 14)?,
            updated_at: parse_timestamp(row, 15)?,
        })
    }

    fn query_segments(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Segment>, DomainError> {
        let mut stmt = conn.prepare(sql)?;
        let segments = stmt
            .query_map(params, Self::row_to_segment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(segments)
    }
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Escape LIKE wildcards so user queries match literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl SegmentStorePort for SqliteSegmentStore {
    #[instrument(skip(self, segment), fields(segment = %segment.name()))]
    async fn insert(&self, segment: &Segment) -> Result<(), DomainError> {
        let conn = self.lock()?;

        let result = conn.execute(
            &format!(
                "INSERT INTO segments ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                COLUMNS
            ),
            params![
                segment.id.to_string(),
                segment.collection_key,
                segment.ordinal,
                segment.folder,
                segment.canonical_media,
                segment.raw_media,
                segment.stitched_preview,
                segment.stitched_boundary_offset,
                segment.annotation.transcript,
                segment.annotation.alignment_notes,
                segment.annotation.problem_notes,
                segment.annotation.reviewer_comment,
                segment.is_annotated,
                segment.annotated_by.as_ref().map(|u| u.as_str()),
                segment.created_at.to_rfc3339(),
                segment.updated_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                debug!("Inserted segment {}", segment.id);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(DomainError::Duplicate(segment.name()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_key(&self, key: &SegmentKey) -> Result<Option<Segment>, DomainError> {
        let conn = self.lock()?;
        let segment = conn
            .query_row(
                &format!(
                    "SELECT {} FROM segments WHERE collection_key = ?1 AND ordinal = ?2",
                    COLUMNS
                ),
                params![key.collection_key, key.ordinal],
                Self::row_to_segment,
            )
            .optional()?;
        Ok(segment)
    }

    #[instrument(skip(self, segment), fields(segment = %segment.name()))]
    async fn update_stitch(&self, segment: &Segment) -> Result<(), DomainError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE segments SET stitched_preview = ?2, stitched_boundary_offset = ?3, \
             updated_at = ?4 WHERE id = ?1",
            params![
                segment.id.to_string(),
                segment.stitched_preview,
                segment.stitched_boundary_offset,
                segment.updated_at.to_rfc3339(),
            ],
        )?;
        Self::require_changed(changed, segment)
    }

    async fn update_annotation(&self, segment: &Segment) -> Result<(), DomainError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            r#"
            UPDATE segments SET
                transcript = ?2,
                alignment_notes = ?3,
                problem_notes = ?4,
                reviewer_comment = ?5,
                is_annotated = ?6,
                annotated_by = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
            params![
                segment.id.to_string(),
                segment.annotation.transcript,
                segment.annotation.alignment_notes,
                segment.annotation.problem_notes,
                segment.annotation.reviewer_comment,
                segment.is_annotated,
                segment.annotated_by.as_ref().map(|u| u.as_str()),
                segment.updated_at.to_rfc3339(),
            ],
        )?;
        Self::require_changed(changed, segment)
    }

    async fn delete(&self, id: &SegmentId) -> Result<(), DomainError> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM segments WHERE id = ?1", params![id.to_string()])?;
        if changed == 0 {
            return Err(DomainError::NotFound(id.to_string()));
        }
        debug!("Deleted segment {}", id);
        Ok(())
    }

    async fn list_collection(&self, collection_key: &str) -> Result<Vec<Segment>, DomainError> {
        let conn = self.lock()?;
        Self::query_segments(
            &conn,
            &format!(
                "SELECT {} FROM segments WHERE collection_key = ?1 ORDER BY ordinal",
                COLUMNS
            ),
            params![collection_key],
        )
    }

    async fn list_by_status(
        &self,
        annotated: bool,
        limit: usize,
    ) -> Result<Vec<Segment>, DomainError> {
        let conn = self.lock()?;
        Self::query_segments(
            &conn,
            &format!(
                "SELECT {} FROM segments WHERE is_annotated = ?1 \
                 ORDER BY collection_key, ordinal LIMIT ?2",
                COLUMNS
            ),
            params![annotated, limit as i64],
        )
    }

    async fn list_folder(&self, folder: &str) -> Result<Vec<Segment>, DomainError> {
        let conn = self.lock()?;
        Self::query_segments(
            &conn,
            &format!(
                "SELECT {} FROM segments WHERE folder = ?1 ORDER BY collection_key, ordinal",
                COLUMNS
            ),
            params![folder],
        )
    }

    async fn search(
        &self,
        folder: Option<&str>,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Segment>, DomainError> {
        let conn = self.lock()?;
        Self::query_segments(
            &conn,
            &format!(
                "SELECT {} FROM segments \
                 WHERE (?1 IS NULL OR folder = ?1) \
                   AND ((collection_key || '_' || printf('%04d', ordinal)) LIKE ?2 ESCAPE '\\' \
                        OR transcript LIKE ?2 ESCAPE '\\') \
                 ORDER BY collection_key, ordinal LIMIT ?3",
                COLUMNS
            ),
            params![folder, like_pattern(query), limit as i64],
        )
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Segment>, DomainError> {
        let conn = self.lock()?;
        Self::query_segments(
            &conn,
            &format!(
                "SELECT {} FROM segments ORDER BY created_at DESC, collection_key, ordinal LIMIT ?1",
                COLUMNS
            ),
            params![limit as i64],
        )
    }

    #[instrument(skip(self))]
    async fn collections(&self) -> Result<Vec<CollectionSummary>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT collection_key, COUNT(*), COALESCE(SUM(is_annotated), 0),
                   MIN(ordinal), MAX(ordinal)
            FROM segments
            GROUP BY collection_key
            ORDER BY collection_key
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(CollectionSummary {
                    collection_key: row.get(0)?,
                    segment_count: row.get::<_, i64>(1)? as u64,
                    annotated_count: row.get::<_, i64>(2)? as u64,
                    first_ordinal: row.get(3)?,
                    last_ordinal: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn stats(&self) -> Result<StoreStats, DomainError> {
        let conn = self.lock()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_annotated), 0) FROM segments",
            [],
            |row| {
                Ok(StoreStats {
                    total_segments: row.get::<_, i64>(0)? as u64,
                    annotated_segments: row.get::<_, i64>(1)? as u64,
                })
            },
        )?;
        Ok(stats)
    }

    async fn count_annotated_by(&self, user: &UserRef) -> Result<u64, DomainError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM segments WHERE annotated_by = ?1 AND is_annotated = 1",
            params![user.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(key: &str, ordinal: u32, folder: &str) -> Segment {
        let name = SegmentKey::new(key, ordinal).name();
        Segment::new(
            SegmentKey::new(key, ordinal),
            folder,
            format!("videos/{}.mp4", name),
            format!("raw/{}.mp4", name),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        let mut seg = segment("TVRI_SB_061119", 52, "batch1");
        seg.set_stitch("stitched/x.mp4".to_string(), 10.0);
        store.insert(&seg).await.unwrap();

        let loaded = store.find_by_key(&seg.key()).await.unwrap().unwrap();
        assert_eq!(loaded.id, seg.id);
        assert_eq!(loaded.name(), "TVRI_SB_061119_0052");
        assert_eq!(loaded.stitched_boundary_offset, Some(10.0));
        assert_eq!(loaded.created_at.timestamp_millis(), seg.created_at.timestamp_millis());
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        store.insert(&segment("A", 1, "f")).await.unwrap();
        let err = store.insert(&segment("A", 1, "f")).await.unwrap_err();
        assert_eq!(err, DomainError::Duplicate("A_0001".to_string()));
    }

    #[tokio::test]
    async fn test_find_by_key_absent_is_none() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        store.insert(&segment("A", 1, "f")).await.unwrap();
        assert!(store.find_by_key(&SegmentKey::new("A", 2)).await.unwrap().is_none());
        assert!(store.find_by_key(&SegmentKey::new("A", 1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_collection_is_ordered_by_ordinal() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        for ordinal in [3, 1, 2] {
            store.insert(&segment("A", ordinal, "f")).await.unwrap();
        }
        store.insert(&segment("B", 1, "f")).await.unwrap();

        let ordinals: Vec<u32> = store
            .list_collection("A")
            .await
            .unwrap()
            .iter()
            .map(|s| s.ordinal)
            .collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update_persists_annotation() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        let mut seg = segment("A", 1, "f");
        store.insert(&seg).await.unwrap();

        seg.apply_annotation(
            AnnotationUpdate {
                transcript: Some("halo".to_string()),
                ..Default::default()
            },
            Some(UserRef::new("ana")),
        );
        store.update_annotation(&seg).await.unwrap();

        let loaded = store.find_by_key(&seg.key()).await.unwrap().unwrap();
        assert!(loaded.is_annotated);
        assert_eq!(loaded.annotation.transcript.as_deref(), Some("halo"));
        assert_eq!(loaded.annotated_by, Some(UserRef::new("ana")));
        assert_eq!(store.count_annotated_by(&UserRef::new("ana")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stitch_write_keeps_concurrent_annotation() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        let seg = segment("A", 1, "f");
        store.insert(&seg).await.unwrap();

        // Two copies loaded before either write, as a cut and a save would
        let mut cut_copy = seg.clone();
        let mut annotate_copy = seg.clone();

        annotate_copy.apply_annotation(
            AnnotationUpdate {
                transcript: Some("halo".to_string()),
                ..Default::default()
            },
            Some(UserRef::new("ana")),
        );
        store.update_annotation(&annotate_copy).await.unwrap();

        cut_copy.set_stitch("stitched/A_0001_x.mp4".to_string(), 4.0);
        store.update_stitch(&cut_copy).await.unwrap();

        let loaded = store.find_by_key(&seg.key()).await.unwrap().unwrap();
        assert!(loaded.is_annotated);
        assert_eq!(loaded.annotated_by, Some(UserRef::new("ana")));
        assert_eq!(loaded.annotation.transcript.as_deref(), Some("halo"));
        assert_eq!(loaded.stitched_preview.as_deref(), Some("stitched/A_0001_x.mp4"));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_are_not_found() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        let seg = segment("A", 1, "f");
        assert!(matches!(store.update_stitch(&seg).await, Err(DomainError::NotFound(_))));
        assert!(matches!(
            store.update_annotation(&seg).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(store.delete(&seg.id).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_collections_grouped_with_counts() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        for ordinal in [1, 2, 5] {
            store.insert(&segment("A", ordinal, "f")).await.unwrap();
        }
        let mut annotated = segment("B", 1, "g");
        annotated.apply_annotation(AnnotationUpdate::default(), None);
        store.insert(&annotated).await.unwrap();

        let collections = store.collections().await.unwrap();
        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].collection_key, "A");
        assert_eq!(collections[0].segment_count, 3);
        assert_eq!(collections[0].last_ordinal, 5);
        assert_eq!(collections[0].gap_count(), 2);
        assert_eq!(collections[1].annotated_count, 1);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_segments, 4);
        assert_eq!(stats.annotated_segments, 1);
    }

    #[tokio::test]
    async fn test_search_matches_identifier_and_transcript_literally() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        store.insert(&segment("TVRI_SB", 1, "f")).await.unwrap();
        let mut with_text = segment("OTHER", 7, "g");
        with_text.apply_annotation(
            AnnotationUpdate {
                transcript: Some("terima kasih 100%".to_string()),
                ..Default::default()
            },
            None,
        );
        store.insert(&with_text).await.unwrap();

        let by_name = store.search(None, "SB_0001", 10).await.unwrap();
        assert_eq!(by_name.len(), 1);

        let by_text = store.search(None, "100%", 10).await.unwrap();
        assert_eq!(by_text[0].name(), "OTHER_0007");

        let scoped = store.search(Some("f"), "kasih", 10).await.unwrap();
        assert!(scoped.is_empty());
    }

    #[tokio::test]
    async fn test_list_by_status_and_folder() {
        let store = SqliteSegmentStore::in_memory().unwrap();
        store.insert(&segment("A", 1, "f")).await.unwrap();
        let mut done = segment("A", 2, "g");
        done.apply_annotation(AnnotationUpdate::default(), None);
        store.insert(&done).await.unwrap();

        assert_eq!(store.list_by_status(false, 10).await.unwrap().len(), 1);
        assert_eq!(store.list_by_status(true, 10).await.unwrap()[0].ordinal, 2);
        assert_eq!(store.list_folder("g").await.unwrap().len(), 1);
    }
}
