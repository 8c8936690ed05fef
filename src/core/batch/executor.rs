//! Batch execution on a bounded worker pool.

use super::{HashResult, PhotoHasher};
use crate::config::HashingConfig;
use crate::core::hasher::{platform_heif_decoder, HeifDecoder};
use crate::error::Result;
use crate::events::{
    null_sink, BatchEvent, BatchSummary, Event, EventSink, HashEvent, HashProgress,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::info;

/// Builder for [`BatchHasher`]
pub struct BatchHasherBuilder {
    config: HashingConfig,
    events: Arc<dyn EventSink>,
    heif_decoder: Option<Arc<dyn HeifDecoder>>,
}

impl BatchHasherBuilder {
    /// Start from default configuration, no sink and the platform HEIF decoder
    pub fn new() -> Self {
        Self {
            config: HashingConfig::default(),
            events: null_sink(),
            heif_decoder: platform_heif_decoder(),
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: HashingConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the event sink
    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Install (or remove, with `None`) the HEIC/HEIF decoder
    pub fn heif_decoder(mut self, decoder: Option<Arc<dyn HeifDecoder>>) -> Self {
        self.heif_decoder = decoder;
        self
    }

    /// Validate the configuration and start the worker pool
    pub fn build(self) -> Result<BatchHasher> {
        self.config.validate()?;

        let hasher =
            PhotoHasher::from_config(&self.config, self.heif_decoder, Arc::clone(&self.events))?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers)
            .thread_name(|index| format!("hash-worker-{}", index))
            .build()?;

        Ok(BatchHasher {
            hasher,
            pool,
            batch_size: self.config.batch_size,
            events: self.events,
        })
    }
}

impl Default for BatchHasherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared progress state; the callback only ever runs under this lock
struct Progress<F> {
    completed: usize,
    on_progress: F,
}

/// Hashes many files concurrently, one [`HashResult`] per distinct path.
pub struct BatchHasher {
    hasher: PhotoHasher,
    pool: ThreadPool,
    batch_size: usize,
    events: Arc<dyn EventSink>,
}

impl BatchHasher {
    /// Create a new batch hasher builder
    pub fn builder() -> BatchHasherBuilder {
        BatchHasherBuilder::new()
    }

    /// Batch hasher with this configuration and builder defaults otherwise
    pub fn new(config: HashingConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// The per-file hasher used by the workers
    pub fn hasher(&self) -> &PhotoHasher {
        &self.hasher
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Hash every path.
    pub fn hash_all<P>(&self, paths: &[P]) -> HashMap<PathBuf, HashResult>
    where
        P: AsRef<Path> + Sync,
    {
        self.hash_all_with_progress(paths, |_, _, _| {})
    }

    /// Hash every path, calling `on_progress(current, total, path)` once per
    /// input after its result is ready.
    ///
    /// `current` runs 1, 2, ..., `total` in order even though files finish
    /// in any order. A path listed twice is hashed twice and counted twice
    /// but has one entry in the returned map.
    pub fn hash_all_with_progress<P, F>(
        &self,
        paths: &[P],
        on_progress: F,
    ) -> HashMap<PathBuf, HashResult>
    where
        P: AsRef<Path> + Sync,
        F: FnMut(usize, usize, &Path) + Send,
    {
        let start = Instant::now();
        let total = paths.len();

        info!(total_files = total, workers = self.workers(), "hashing batch started");
        self.events.emit(Event::Batch(BatchEvent::Started {
            total_files: total,
            workers: self.workers(),
        }));

        let progress = Mutex::new(Progress {
            completed: 0,
            on_progress,
        });
        let mut results = HashMap::with_capacity(total);

        // Paths are handed to the pool one chunk at a time
        for chunk in paths.chunks(self.batch_size) {
            let chunk_results: Vec<(PathBuf, HashResult)> = self.pool.install(|| {
                chunk
                    .par_iter()
                    .map(|path| {
                        let path = path.as_ref();
                        let result = self.hasher.hash(path);
                        self.report_progress(&progress, total, path);
                        (path.to_path_buf(), result)
                    })
                    .collect()
            });
            results.extend(chunk_results);
        }

        let summary = BatchSummary::from_results(&results, start.elapsed());
        info!(
            total_files = summary.total_files,
            complete = summary.complete,
            identity_only = summary.identity_only,
            unreadable = summary.unreadable,
            duration_ms = summary.duration_ms,
            "hashing batch completed"
        );
        self.events.emit(Event::Batch(BatchEvent::Completed(summary)));

        results
    }

    fn report_progress<F>(&self, progress: &Mutex<Progress<F>>, total: usize, path: &Path)
    where
        F: FnMut(usize, usize, &Path),
    {
        let mut progress = progress.lock().unwrap_or_else(PoisonError::into_inner);
        progress.completed += 1;
        let current = progress.completed;

        (progress.on_progress)(current, total, path);
        self.events.emit(Event::Hash(HashEvent::Progress(HashProgress {
            completed: current,
            total,
            current_path: path.to_path_buf(),
        })));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::HashStatus;
    use crate::events::EventChannel;
    use std::fs;
    use tempfile::TempDir;

    fn write_files(dir: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.path().join(format!("file_{}.bin", i));
                fs::write(&path, format!("contents {}", i)).unwrap();
                path
            })
            .collect()
    }

    fn batch(config: HashingConfig) -> BatchHasher {
        BatchHasher::builder()
            .config(config)
            .heif_decoder(None)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = BatchHasher::builder()
            .config(HashingConfig::new().max_workers(0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn pool_uses_max_workers() {
        let hasher = batch(HashingConfig::new().max_workers(3));
        assert_eq!(hasher.workers(), 3);
    }

    #[test]
    fn empty_batch_returns_empty_map() {
        let hasher = batch(HashingConfig::default());
        let paths: Vec<PathBuf> = Vec::new();
        assert!(hasher.hash_all(&paths).is_empty());
    }

    #[test]
    fn progress_is_monotonic_across_chunks() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(&dir, 7);
        let hasher = batch(HashingConfig::new().max_workers(4).batch_size(3));

        let mut seen = Vec::new();
        let results = hasher.hash_all_with_progress(&paths, |current, total, _| {
            seen.push((current, total));
        });

        assert_eq!(results.len(), 7);
        let expected: Vec<_> = (1..=7).map(|i| (i, 7)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn duplicate_paths_collapse_but_count() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(&dir, 2);
        let doubled = vec![paths[0].clone(), paths[1].clone(), paths[0].clone()];

        let hasher = batch(HashingConfig::default());
        let mut calls = 0;
        let results = hasher.hash_all_with_progress(&doubled, |_, _, _| calls += 1);

        assert_eq!(results.len(), 2);
        assert_eq!(calls, 3);
    }

    #[test]
    fn emits_started_progress_and_completed() {
        let dir = TempDir::new().unwrap();
        let mut paths = write_files(&dir, 2);
        paths.push(dir.path().join("missing.jpg"));

        let (sender, receiver) = EventChannel::new();
        let hasher = BatchHasher::builder()
            .events(Arc::new(sender))
            .heif_decoder(None)
            .build()
            .unwrap();

        let results = hasher.hash_all(&paths);
        drop(hasher);

        assert_eq!(
            results[&paths[2]].status(),
            HashStatus::Unreadable
        );

        let events: Vec<_> = receiver.iter().collect();
        assert!(matches!(
            events.first(),
            Some(Event::Batch(BatchEvent::Started { total_files: 3, .. }))
        ));

        match events.last() {
            Some(Event::Batch(BatchEvent::Completed(summary))) => {
                assert_eq!(summary.total_files, 3);
                assert_eq!(summary.identity_only, 2);
                assert_eq!(summary.unreadable, 1);
            }
            other => panic!("Expected Completed event, got {:?}", other),
        }

        let progress_count = events
            .iter()
            .filter(|e| matches!(e, Event::Hash(HashEvent::Progress(_))))
            .count();
        assert_eq!(progress_count, 3);
    }
}
