//! Persistent vector collection using SQLite and sqlite-vec.
//!
//! One database file holds any number of named collections; documents,
//! chunks, and embedding vectors are scoped to the collection they were
//! ingested into.
use rusqlite::{Connection, Result, params};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use tracing::info;

pub mod documents;
pub mod search;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    indexed_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    modified_at DATETIME NOT NULL,
    UNIQUE(collection_id, filename),
    FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_doc_collection ON documents(collection_id);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    content TEXT NOT NULL,
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chunk_document ON chunks(document_id);
"#;

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// A chunk of document text ready for insertion, borrowed from the caller.
#[derive(Debug, Clone)]
pub struct Chunk<'a> {
    pub position: usize,
    pub content: &'a str,
}

/// A wrapper around a SQLite connection initialized with sqlite-vec and the
/// application schema.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open a database at the given path and initialize the schema.
    ///
    /// `dimensions` fixes the width of the embedding column; it must match
    /// the embedder used for ingestion and querying.
    pub fn open<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();
        info!("Initializing vector store: {}", path.display());

        init_sqlite_vec();
        let conn = Connection::open(path)?;
        Self::init_schema(&conn, dimensions)?;

        info!("Vector store initialized");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn, dimensions)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection, dimensions: usize) -> Result<()> {
        // Verify sqlite-vec is loaded
        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("sqlite-vec version: {}", vec_version);

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;

        // The vec0 virtual table needs the dimension baked into its DDL.
        conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS vec_chunks USING vec0(embedding FLOAT[{dimensions}]);"
        ))?;

        Ok(())
    }

    /// Get or create a collection by name, returning its row id.
    pub fn collection(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO collections (name) VALUES (?) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        self.conn.query_row(
            "SELECT id FROM collections WHERE name = ?",
            params![name],
            |row| row.get(0),
        )
    }
}

/// Serialize a float32 vector into bytes for the vec0 virtual table.
pub fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_init() {
        let store = Store::open_in_memory(384).expect("Failed to open in-memory store");

        let tables: usize = store.conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('collections', 'documents', 'chunks', 'vec_chunks');",
            [],
            |row| row.get(0),
        ).unwrap();

        assert_eq!(tables, 4);
    }

    #[test]
    fn test_collection_get_or_create() {
        let store = Store::open_in_memory(384).unwrap();

        let a = store.collection("doc_chunks").unwrap();
        let b = store.collection("doc_chunks").unwrap();
        assert_eq!(a, b, "same name should resolve to the same collection");

        let other = store.collection("other").unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_serialize_vector() {
        let vec = vec![1.0, 2.0, -3.5];
        let bytes = serialize_vector(&vec);
        assert_eq!(bytes.len(), 12);

        // 1.0f32 in hex: 0x3f800000 -> little endian: 00 00 80 3f
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x80, 0x3f]);
        // 2.0f32 in hex: 0x40000000 -> little endian: 00 00 00 40
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x40]);
        // -3.5f32 in hex: 0xc0600000 -> little endian: 00 00 60 c0
        assert_eq!(&bytes[8..12], &[0x00, 0x00, 0x60, 0xc0]);
    }
}
