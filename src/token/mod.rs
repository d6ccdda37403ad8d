//! Token model shared by all pipeline stages.

pub mod model;
pub mod tag;

pub use model::{
    CleanToken, NormalizedPayload, NormalizedToken, OriginalToken, Span, Stage, StageElement,
    StageOutput, TagToken, Token, TranscribedToken, lineage,
};
pub use tag::{PAUSE_MARKER, SENTENCE_MARKER, TagKind, classify_tag};
