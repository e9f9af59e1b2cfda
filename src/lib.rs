pub mod builder;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod extract;
pub mod reference;
pub mod render;
pub mod search;
pub mod source;
pub mod tracing;

pub use builder::{
    BuildReport, EngineCapability, IndexBuilder, LunrIndexBuilder, SerializedBundle, build,
    build_bundle,
};
pub use bundle::{BUNDLE_FORMAT, DEFAULT_BUNDLE_PATH, IndexBundle};
pub use config::Config;
pub use entry::{EntryDraft, EntryKind, EntrySet, IndexEntry};
pub use error::{
    BundleWriteError, CorruptIndexError, IndexBuildUnavailable, MalformedEntryWarning,
    MalformedReason, NotReadyError, QueryError, Result,
};
pub use extract::{EntryExtractor, ExtractOptions, classify_object};
pub use reference::ReferenceAssigner;
pub use render::{
    DedupPolicy, RenderOptions, RenderedResult, Segment, build_href, highlight, render_hits,
    render_result,
};
pub use search::{
    ClientState, PendingPolicy, QueryClient, QueryOutcome, SearchHit, SearchSession,
    SessionPhase, TextIndex, Tokenizer,
};
pub use source::GeneratorIndex;
