//! Chunk storage and similarity search using sqlite-vec.
//!
//! The index holds document chunks alongside their embeddings in a single
//! SQLite file: a `chunks` table for content and provenance, and a vec0
//! virtual table for the vectors, keyed by chunk rowid.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info};
use zerocopy::IntoBytes;

use crate::chunk::{ChunkMetadata, DocChunk, ScoredChunk};
use crate::error::{IndexError, Result};

/// Default embedding dimensions (nomic-embed-text produces 768-dim vectors).
pub const DEFAULT_EMBEDDING_DIMS: usize = 768;

// ─────────────────────────────────────────────────────────────────────────────
// Extension Setup
// ─────────────────────────────────────────────────────────────────────────────

/// Initialize the sqlite-vec extension.
///
/// This must be called before opening any connection that uses vector
/// operations. Note: `sqlite3_auto_extension` applies globally to all
/// connections opened afterwards.
pub fn init_vector_extension() {
    use rusqlite::ffi::sqlite3_auto_extension;
    use sqlite_vec::sqlite3_vec_init;

    unsafe {
        #[allow(clippy::missing_transmute_annotations)]
        sqlite3_auto_extension(Some(std::mem::transmute(sqlite3_vec_init as *const ())));
    }
}

/// Check if the sqlite-vec extension is loaded.
pub fn check_vector_extension(conn: &Connection) -> Result<String> {
    let version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
    Ok(version)
}

// ─────────────────────────────────────────────────────────────────────────────
// Chunk Index
// ─────────────────────────────────────────────────────────────────────────────

/// Document chunk index backed by SQLite.
///
/// Stores chunk text with provenance metadata and a vector embedding per
/// chunk. Search embeds nothing itself; callers supply query vectors of the
/// index's dimensionality.
pub struct ChunkIndex {
    /// The SQLite connection (wrapped in Mutex for thread safety).
    conn: Mutex<Connection>,
    /// Embedding dimensionality this index was created with.
    dims: usize,
}

impl std::fmt::Debug for ChunkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkIndex")
            .field("dims", &self.dims)
            .finish_non_exhaustive()
    }
}

impl ChunkIndex {
    /// Open or create a chunk index at the given path.
    ///
    /// Creates the database file and initializes the schema if it doesn't
    /// exist.
    pub fn open(path: impl AsRef<Path>, dims: usize) -> Result<Self> {
        init_vector_extension();

        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|_| {
                    IndexError::Database(rusqlite::Error::InvalidPath(path.to_path_buf()))
                })?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let index = Self {
            conn: Mutex::new(conn),
            dims,
        };
        index.initialize()?;

        info!("Chunk index opened at {:?}", path);
        Ok(index)
    }

    /// Create an in-memory index (useful for testing).
    pub fn open_in_memory(dims: usize) -> Result<Self> {
        init_vector_extension();

        let conn = Connection::open_in_memory()?;
        let index = Self {
            conn: Mutex::new(conn),
            dims,
        };
        index.initialize()?;

        info!("In-memory chunk index created");
        Ok(index)
    }

    /// Embedding dimensionality this index was created with.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Initialize the database with pragmas and schema.
    fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        // Enable WAL mode for better concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL
            )
            "#,
        )?;

        let sql = format!(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS chunk_embeddings USING vec0(
                chunk_id INTEGER PRIMARY KEY,
                embedding float[{dims}]
            )
            "#,
            dims = self.dims
        );
        conn.execute_batch(&sql)?;

        Ok(())
    }

    /// Validate a vector against the index dimensionality.
    fn check_dims(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dims {
            return Err(IndexError::Dimensions {
                expected: self.dims,
                actual: embedding.len(),
            });
        }
        Ok(())
    }

    /// Insert a chunk with its embedding.
    ///
    /// Returns the rowid assigned to the chunk.
    pub fn insert(&self, chunk: &DocChunk, embedding: &[f32]) -> Result<i64> {
        self.check_dims(embedding)?;

        let metadata_json = serde_json::to_string(&chunk.metadata)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO chunks (content, metadata) VALUES (?1, ?2)",
            params![chunk.content, metadata_json],
        )?;
        let chunk_id = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO chunk_embeddings (chunk_id, embedding) VALUES (?1, ?2)",
            params![chunk_id, embedding.as_bytes()],
        )?;

        debug!("Indexed chunk {}", chunk_id);
        Ok(chunk_id)
    }

    /// Search for chunks similar to a query embedding.
    ///
    /// Returns the top-k most similar chunks ordered by distance (ascending).
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        self.check_dims(query_embedding)?;

        // vec0 rejects KNN scans with LIMIT 0
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            r#"
            SELECT chunk_id, distance
            FROM chunk_embeddings
            WHERE embedding MATCH ?1
            ORDER BY distance
            LIMIT ?2
            "#,
        )?;

        let mut rows = stmt.query(params![query_embedding.as_bytes(), limit as i64])?;

        let mut matches: Vec<(i64, f32)> = Vec::new();
        while let Some(row) = rows.next()? {
            matches.push((row.get(0)?, row.get(1)?));
        }
        drop(rows);
        drop(stmt);

        let mut results = Vec::with_capacity(matches.len());
        for (chunk_id, distance) in matches {
            let (content, metadata_json): (String, String) = conn.query_row(
                "SELECT content, metadata FROM chunks WHERE id = ?1",
                params![chunk_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)?;

            results.push(ScoredChunk {
                chunk: DocChunk { content, metadata },
                distance,
            });
        }

        debug!("Found {} similar chunks (limit: {})", results.len(), limit);
        Ok(results)
    }

    /// Get the count of indexed chunks.
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Check whether the index holds no chunks.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
