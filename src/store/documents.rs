use super::{Chunk, Store, serialize_vector};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result, params};
use std::collections::HashMap;

impl Store {
    /// Returns a map of filename -> modified_at for all documents in a collection.
    pub fn list_documents(&self, collection_id: i64) -> Result<HashMap<String, DateTime<Utc>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT filename, modified_at FROM documents WHERE collection_id = ?")?;
        let rows = stmt.query_map(params![collection_id], |row| {
            let filename: String = row.get(0)?;
            let modified_at: DateTime<Utc> = row.get(1)?;
            Ok((filename, modified_at))
        })?;

        let mut docs = HashMap::new();
        for row in rows {
            let (filename, modified_at) = row?;
            docs.insert(filename, modified_at);
        }

        Ok(docs)
    }

    /// Deletes a document and its chunks from a collection.
    pub fn delete_document(&self, collection_id: i64, filename: &str) -> Result<bool> {
        let doc_id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM documents WHERE collection_id = ? AND filename = ?",
                params![collection_id, filename],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(doc_id) = doc_id {
            // Virtual tables don't participate in FK cascades
            self.conn.execute(
                "DELETE FROM vec_chunks WHERE rowid IN (SELECT id FROM chunks WHERE document_id = ?)",
                params![doc_id],
            )?;

            // Cascade deletes chunks
            let rows = self
                .conn
                .execute("DELETE FROM documents WHERE id = ?", params![doc_id])?;
            Ok(rows > 0)
        } else {
            Ok(false)
        }
    }

    /// Inserts or replaces a document with its chunks and embeddings.
    ///
    /// Re-ingesting an existing filename replaces all of its prior chunks
    /// and vectors in a single transaction.
    pub fn upsert_document(
        &mut self,
        collection_id: i64,
        filename: &str,
        modified_at: DateTime<Utc>,
        chunks: &[Chunk<'_>],
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        assert_eq!(
            chunks.len(),
            embeddings.len(),
            "chunks and embeddings length mismatch"
        );

        let tx = self.conn.transaction()?;

        let doc_id: i64 = tx.query_row(
            r#"
            INSERT INTO documents (collection_id, filename, modified_at, indexed_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(collection_id, filename) DO UPDATE SET
                modified_at = excluded.modified_at,
                indexed_at = CURRENT_TIMESTAMP
            RETURNING id
            "#,
            params![collection_id, filename, modified_at],
            |row| row.get(0),
        )?;

        // Clean up old contents if any (re-ingestion)
        tx.execute(
            "DELETE FROM vec_chunks WHERE rowid IN (SELECT id FROM chunks WHERE document_id = ?)",
            params![doc_id],
        )?;
        tx.execute("DELETE FROM chunks WHERE document_id = ?", params![doc_id])?;

        for (i, chunk) in chunks.iter().enumerate() {
            tx.execute(
                "INSERT INTO chunks (document_id, position, content) VALUES (?, ?, ?)",
                params![doc_id, chunk.position as i64, chunk.content],
            )?;
            let chunk_id = tx.last_insert_rowid();

            let vector_blob = serialize_vector(&embeddings[i]);
            tx.execute(
                "INSERT INTO vec_chunks (rowid, embedding) VALUES (?, ?)",
                params![chunk_id, vector_blob],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_crud() {
        let mut store = Store::open_in_memory(384).unwrap();
        let coll = store.collection("doc_chunks").unwrap();
        let now = Utc::now();
        let filename = "manual.md";

        let chunks = vec![
            Chunk {
                position: 0,
                content: "Hello",
            },
            Chunk {
                position: 1,
                content: "World",
            },
        ];
        let embeddings = vec![vec![0.1; 384], vec![0.2; 384]];

        store
            .upsert_document(coll, filename, now, &chunks, &embeddings)
            .unwrap();

        let docs = store.list_documents(coll).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs.contains_key(filename));

        let chunks_count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(chunks_count, 2);

        let vec_chunks_count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM vec_chunks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(vec_chunks_count, 2);

        // Re-ingest: old chunks replaced
        let new_chunks = vec![Chunk {
            position: 0,
            content: "Replaced",
        }];
        let new_embeddings = vec![vec![0.5; 384]];
        store
            .upsert_document(coll, filename, Utc::now(), &new_chunks, &new_embeddings)
            .unwrap();

        let chunks_count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(chunks_count, 1);

        let vec_chunks_count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM vec_chunks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(vec_chunks_count, 1);

        // Delete
        let deleted = store.delete_document(coll, filename).unwrap();
        assert!(deleted);

        let chunks_count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(chunks_count, 0);

        let vec_chunks_count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM vec_chunks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(vec_chunks_count, 0);
    }

    #[test]
    fn test_delete_missing_document() {
        let store = Store::open_in_memory(384).unwrap();
        let coll = store.collection("doc_chunks").unwrap();
        assert!(!store.delete_document(coll, "nope.md").unwrap());
    }

    #[test]
    fn test_same_filename_in_different_collections() {
        let mut store = Store::open_in_memory(384).unwrap();
        let a = store.collection("a").unwrap();
        let b = store.collection("b").unwrap();
        let now = Utc::now();

        let chunks = vec![Chunk {
            position: 0,
            content: "text",
        }];
        let embeddings = vec![vec![0.1; 384]];

        store
            .upsert_document(a, "shared.md", now, &chunks, &embeddings)
            .unwrap();
        store
            .upsert_document(b, "shared.md", now, &chunks, &embeddings)
            .unwrap();

        assert_eq!(store.list_documents(a).unwrap().len(), 1);
        assert_eq!(store.list_documents(b).unwrap().len(), 1);

        // Deleting from one collection leaves the other intact
        store.delete_document(a, "shared.md").unwrap();
        assert_eq!(store.list_documents(a).unwrap().len(), 0);
        assert_eq!(store.list_documents(b).unwrap().len(), 1);
    }
}
