//! One-shot ingestion pipeline: loader → chunker → embedder → vector store.
//!
//! Ingestion is differential: files whose modification time matches the
//! stored document are skipped unless `force` is set.
pub mod chunker;
pub mod loader;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use tracing::{info, warn};

use crate::embedder::Embedder;
use crate::store::{Chunk, Store};

/// Outcome counters for one ingestion run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Total chunks written across added and updated documents.
    pub chunks: usize,
}

/// Orchestrates one ingestion run over a documents directory.
pub struct Ingestor<'a, E: Embedder + ?Sized> {
    store: &'a mut Store,
    embedder: &'a E,
    collection_id: i64,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl<'a, E: Embedder + ?Sized> Ingestor<'a, E> {
    pub fn new(
        store: &'a mut Store,
        embedder: &'a E,
        collection_id: i64,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            collection_id,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Ingest all supported files under `dir` with differential sync.
    pub fn run<P: AsRef<Path>>(&mut self, dir: P, force: bool) -> Result<IngestReport> {
        let dir = dir.as_ref();
        anyhow::ensure!(
            dir.is_dir(),
            "documents directory not found: {}",
            dir.display()
        );

        let existing = self
            .store
            .list_documents(self.collection_id)
            .context("failed to list existing documents")?;

        let mut report = IngestReport::default();

        // Walk builder respects .gitignore by default
        let walker = WalkBuilder::new(dir).hidden(false).build();

        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let ext = path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            if !loader::is_supported_extension(ext) {
                continue;
            }

            // Store names relative to the documents directory, with forward
            // slashes for cross-platform consistency.
            let rel_name = path
                .strip_prefix(dir)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            let metadata = entry.metadata()?;
            let mod_time: DateTime<Utc> = metadata.modified()?.into();

            let is_new = !existing.contains_key(&rel_name);
            if !is_new && !force {
                if let Some(stored) = existing.get(&rel_name) {
                    if stored.timestamp() == mod_time.timestamp() {
                        report.skipped += 1;
                        continue;
                    }
                }
            }

            match self.ingest_file(path, &rel_name, mod_time) {
                Ok(n) => {
                    report.chunks += n;
                    if is_new {
                        report.added += 1;
                    } else {
                        report.updated += 1;
                    }
                    info!("Ingested {rel_name} ({n} chunks)");
                }
                Err(e) => {
                    warn!("Failed to ingest {rel_name}: {e:#}");
                    report.failed += 1;
                }
            }
        }

        info!(
            "Ingestion complete: {} added, {} updated, {} skipped, {} failed, {} chunks",
            report.added, report.updated, report.skipped, report.failed, report.chunks
        );

        Ok(report)
    }

    /// Load, chunk, embed and store one file. Returns the chunk count.
    fn ingest_file(
        &mut self,
        path: &Path,
        rel_name: &str,
        mod_time: DateTime<Utc>,
    ) -> Result<usize> {
        let text = loader::load_text(path)?;
        let pieces = chunker::split_into_chunks(&text, self.chunk_size, self.chunk_overlap);
        if pieces.is_empty() {
            // Still record the document so it is skipped next run
            self.store
                .upsert_document(self.collection_id, rel_name, mod_time, &[], &[])?;
            return Ok(0);
        }

        let text_refs: Vec<&str> = pieces.iter().map(String::as_str).collect();
        let vectors = self
            .embedder
            .embed_batch(&text_refs)
            .context("embedding failed")?;

        let chunks: Vec<Chunk> = pieces
            .iter()
            .enumerate()
            .map(|(position, content)| Chunk {
                position,
                content: content.as_str(),
            })
            .collect();

        self.store
            .upsert_document(self.collection_id, rel_name, mod_time, &chunks, &vectors)?;

        Ok(chunks.len())
    }
}
