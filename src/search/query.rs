//! The query side: loads a bundle and answers ranked queries against it.

use crate::bundle::IndexBundle;
use crate::entry::IndexEntry;
use crate::error::{CorruptIndexError, NotReadyError, QueryError};
use lru::LruCache;
use rapidfuzz::distance::jaro_winkler;
use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::index::{QueryTerm, TextIndex, build_index};
use super::scoring::SUGGESTION_THRESHOLD;
use super::tokenize::Tokenizer;

/// Number of recent queries whose results are kept.
const QUERY_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// Where a client is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    /// No bundle loaded yet; queries fail with [`NotReadyError`].
    Uninitialized,
    /// A validated bundle is resident.
    Ready,
    /// The bundle was unreadable or corrupt; search is off for this session.
    Unavailable(CorruptIndexError),
}

/// One ranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub entry: Arc<IndexEntry>,
    pub score: f64,
    /// Indexed terms that matched, for highlighting.
    pub matched_terms: Vec<String>,
}

/// Answers queries against one loaded bundle.
pub struct QueryClient {
    tokenizer: Tokenizer,
    state: ClientState,
    index: Option<TextIndex>,
    documents: BTreeMap<u32, Arc<IndexEntry>>,
    cache: LruCache<String, Vec<SearchHit>>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("state", &self.state)
            .field("documents", &self.documents.len())
            .field("cached_queries", &self.cache.len())
            .finish()
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::default(),
            state: ClientState::Uninitialized,
            index: None,
            documents: BTreeMap::new(),
            cache: LruCache::new(QUERY_CACHE_SIZE),
        }
    }

    pub const fn state(&self) -> &ClientState {
        &self.state
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self.state, ClientState::Ready)
    }

    /// The tokenizer queries go through, for highlighting with identical rules.
    pub const fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Parses a bundle image and makes it queryable.
    ///
    /// On failure the client becomes [`ClientState::Unavailable`] and drops any previous index.
    pub fn initialize(&mut self, bytes: &[u8]) -> Result<(), CorruptIndexError> {
        match IndexBundle::parse(bytes) {
            Ok(bundle) => {
                self.install(bundle);
                Ok(())
            }
            Err(error) => {
                self.mark_unavailable(error.clone());
                Err(error)
            }
        }
    }

    /// Turns search off after a failed fetch or parse.
    pub fn mark_unavailable(&mut self, error: CorruptIndexError) {
        tracing::warn!("Search unavailable: {}", error);
        self.index = None;
        self.documents.clear();
        self.cache.clear();
        self.state = ClientState::Unavailable(error);
    }

    fn install(&mut self, bundle: IndexBundle) {
        let index = match bundle.index {
            Some(index) => {
                tracing::debug!("Pre-generated search index loaded");
                index
            }
            None => {
                tracing::info!("No pre-generated search index in bundle, indexing on the fly");
                build_index(bundle.documents.values())
            }
        };

        self.documents = bundle
            .documents
            .into_iter()
            .map(|(reference, entry)| (reference, Arc::new(entry)))
            .collect();
        self.index = Some(index);
        self.cache.clear();
        self.state = ClientState::Ready;
    }

    /// Looks up an entry from the back-reference table.
    pub fn entry(&self, reference: u32) -> Option<&Arc<IndexEntry>> {
        self.documents.get(&reference)
    }

    /// Splits user text into query terms with the index tokenizer.
    ///
    /// In a `word*` piece, sub-words that end before the `*` must match exactly; the ones
    /// running up to it match any indexed term starting with their lowercased form or
    /// their stem, so `pkg.Rea*` finds `pkg.Reader` and `installation*` finds `instal`.
    pub fn parse_query(&self, text: &str) -> Vec<QueryTerm> {
        let mut terms = vec![];
        for piece in text.split_whitespace() {
            match piece.strip_suffix('*') {
                Some(prefix) => self.push_prefix_terms(prefix, &mut terms),
                None => {
                    terms.extend(self.tokenizer.terms(piece).into_iter().map(QueryTerm::Exact));
                }
            }
        }
        terms
    }

    fn push_prefix_terms(&self, prefix: &str, terms: &mut Vec<QueryTerm>) {
        for span in Tokenizer::spans(prefix) {
            let word = &prefix[span.clone()];
            if span.end < prefix.len() {
                terms.extend(self.tokenizer.stem(word).map(QueryTerm::Exact));
                continue;
            }
            let raw = word.to_lowercase();
            if let Some(stem) = self.tokenizer.stem(word)
                && stem != raw
            {
                terms.push(QueryTerm::Prefix(stem));
            }
            terms.push(QueryTerm::Prefix(raw));
        }
    }

    /// Runs a query. Results are ranked by descending score, ties by ascending reference.
    ///
    /// Blank text yields no results rather than an error.
    pub fn query(&mut self, text: &str) -> Result<Vec<SearchHit>, QueryError> {
        let index = match &self.state {
            ClientState::Uninitialized => return Err(NotReadyError.into()),
            ClientState::Unavailable(error) => return Err(error.clone().into()),
            ClientState::Ready => match &self.index {
                Some(index) => index,
                None => return Err(NotReadyError.into()),
            },
        };

        let key = text.trim();
        if key.is_empty() {
            return Ok(vec![]);
        }
        if let Some(hits) = self.cache.get(key) {
            tracing::trace!("Query cache hit for '{}'", key);
            return Ok(hits.clone());
        }

        let terms = self.parse_query(key);
        let hits: Vec<SearchHit> = index
            .search(&terms)
            .into_iter()
            .filter_map(|scored| {
                self.documents.get(&scored.reference).map(|entry| SearchHit {
                    entry: Arc::clone(entry),
                    score: scored.score,
                    matched_terms: scored.matched_terms,
                })
            })
            .collect();

        tracing::debug!("Query '{}' matched {} entries", key, hits.len());
        self.cache.put(key.to_string(), hits.clone());
        Ok(hits)
    }

    /// Entries whose name resembles `text`, for a "did you mean" line when nothing matched.
    pub fn suggest(&self, text: &str, limit: usize) -> Vec<Arc<IndexEntry>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return vec![];
        }

        let mut candidates: Vec<(f64, &Arc<IndexEntry>)> = self
            .documents
            .values()
            .filter_map(|entry| {
                let score =
                    jaro_winkler::similarity(needle.chars(), entry.name.to_lowercase().chars());
                (score > SUGGESTION_THRESHOLD).then_some((score, entry))
            })
            .collect();
        candidates.sort_by(|(a, x), (b, y)| b.total_cmp(a).then(x.reference.cmp(&y.reference)));

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|(_, entry)| seen.insert(entry.name.clone()))
            .take(limit)
            .map(|(_, entry)| Arc::clone(entry))
            .collect()
    }
}
