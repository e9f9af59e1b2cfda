//! Full-text search over index entries.
//!
//! This module provides the tokenizer shared by building and querying, the field-weighted
//! inverted index, BM25 scoring, the query client and its asynchronous session wrapper.

// Module declarations
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod session;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use index::{
    FieldSpec, NAME_BOOST, Posting, QueryTerm, REFERENCE_FIELD, ScoredReference, TextIndex,
    TextIndexBuilder, build_index, default_fields,
};
pub use query::{ClientState, QueryClient, SearchHit};
pub use session::{PendingPolicy, QueryOutcome, SearchSession, SessionPhase};
pub use tokenize::{Token, Tokenizer};
