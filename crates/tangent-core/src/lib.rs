//! Shared data model for the tangent retrieval engine.
//!
//! Every type here is a plain, serializable value — no behavior lives in
//! this crate beyond small constructors and the occasional invariant
//! check. Components further up the dependency graph own the logic that
//! produces and consumes these types.

mod error;
mod memory;
mod routing;
mod suggestion;
mod vibe;

pub use error::TangentError;
pub use memory::{EdgeKind, Memory, RelatedMemory, SearchResult};
pub use routing::{
    CascadeResult, Confidence, Item, OrthogonalMetadata, RetrievalPath, ScoredCandidate, Source,
    Strategy,
};
pub use suggestion::{FeedbackType, Suggestion, SuggestionSource};
pub use vibe::{StrategyWeights, VibeProfile};

pub type Result<T> = std::result::Result<T, TangentError>;
