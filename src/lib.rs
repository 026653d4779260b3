//! Parallel trie-accelerated top-n weighted edit-distance search.
//!
//! Build an [`Engine`] once from a word list and a [`PenaltyModel`], then
//! issue [`Engine::query`] calls; construction is the only fallible step.

pub mod config;
pub mod dictionary;
pub mod error;
pub mod penalty;
pub mod search;
pub mod stats;
pub mod trie;
pub mod word;

use std::num::NonZeroUsize;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

pub use config::EngineConfig;
pub use dictionary::load_words;
pub use error::ProxtrieError;
pub use penalty::PenaltyModel;
pub use stats::StatsSink;
pub use word::Word;

use search::Scratch;
use trie::{BuilderTrie, VectorizedTrie};

/// A built, query-ready search index over a fixed word list.
pub struct Engine {
    penalty: PenaltyModel,
    trie: VectorizedTrie,
    scratch: Mutex<Scratch>,
    threads: usize,
    pruning: bool,
    stats: Option<Arc<dyn StatsSink>>,
}

impl Engine {
    /// Builds a trie over `words` and wires it to `penalty` and `config`.
    /// The only failure mode reachable here is an unvalidated word slipping
    /// through a caller's own [`Word`] construction; this function itself
    /// never fails, but keeps the `Result` signature the type family uses
    /// everywhere else fallible construction happens.
    pub fn build(
        words: impl IntoIterator<Item = Word>,
        penalty: PenaltyModel,
        config: EngineConfig,
    ) -> Result<Engine, ProxtrieError> {
        let words: Vec<Word> = words.into_iter().collect();
        let span = tracing::info_span!("build", word_count = words.len());
        let _guard = span.enter();

        let builder = BuilderTrie::new();
        builder.insert_all(&words);
        let collisions = builder.collisions.load(Ordering::Relaxed);
        tracing::debug!(collisions, "builder trie populated");

        let trie = {
            let _vectorize = tracing::info_span!("vectorize").entered();
            let trie = VectorizedTrie::from_builder(&builder);
            tracing::debug!(num_nodes = trie.num_nodes(), "vectorized trie ready");
            trie
        };

        let stats: Option<Arc<dyn StatsSink>> = if config.stats {
            let sink: Arc<dyn StatsSink> = Arc::new(stats::RecordingSink::new());
            sink.record_counter("collisions", &collisions.to_string());
            Some(sink)
        } else {
            None
        };

        Ok(Engine {
            penalty,
            trie,
            scratch: Mutex::new(Scratch::new()),
            threads: config.resolved_threads(),
            pruning: config.pruning,
            stats,
        })
    }

    /// Returns up to `n` `(distance, word)` pairs ascending by distance.
    pub fn query(&self, q: &str, n: NonZeroUsize) -> Vec<(f32, String)> {
        let span = tracing::info_span!("query", query = q, n = n.get());
        let _guard = span.enter();

        let mut scratch = self.scratch.lock().unwrap();
        let results = if self.threads <= 1 {
            search::sequential::query(&self.trie, &self.penalty, &mut scratch, q, n.get(), self.pruning)
        } else {
            search::parallel::query(
                &self.trie,
                &self.penalty,
                &mut scratch,
                q,
                n.get(),
                self.threads,
                self.pruning,
                self.stats.as_deref(),
            )
        };
        tracing::debug!(results = results.len(), "query finished");
        results
    }

    /// Number of nodes in the underlying vectorized trie, including the
    /// root. Exposed for the CLI's `build-check` subcommand.
    pub fn num_nodes(&self) -> usize {
        self.trie.num_nodes()
    }

    pub fn stats(&self) -> Option<&dyn StatsSink> {
        self.stats.as_deref()
    }
}
