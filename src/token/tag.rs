//! Classification of structural tag tokens.
//!
//! Both the response serializer and the content reconstructor go through
//! [`classify_tag`] so they never disagree on what a tag is.

use super::model::{StageElement, TagToken};
use serde::{Deserialize, Serialize};

/// Reserved tag name marking a sentence boundary.
pub const SENTENCE_MARKER: &str = "<sentence>";

/// Tag name used for prosodic pauses by the bundled engine.
pub const PAUSE_MARKER: &str = "<pau>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    SentenceBoundary,
    Pause,
}

/// Classify a tag by name. Anything that is not the sentence marker is a pause.
pub fn classify_tag(name: &str) -> TagKind {
    if name.trim() == SENTENCE_MARKER {
        TagKind::SentenceBoundary
    } else {
        TagKind::Pause
    }
}

impl TagToken {
    pub fn kind(&self) -> TagKind {
        classify_tag(self.name())
    }
}

impl<T> StageElement<T> {
    /// `None` for content tokens.
    pub fn tag_kind(&self) -> Option<TagKind> {
        match self {
            StageElement::Token(_) => None,
            StageElement::Tag(tag) => Some(tag.kind()),
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, StageElement::Tag(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::model::{CleanToken, OriginalToken, Span};
    use std::sync::Arc;

    #[test]
    fn test_sentence_marker_is_boundary() {
        assert_eq!(classify_tag("<sentence>"), TagKind::SentenceBoundary);
    }

    #[test]
    fn test_incidental_whitespace_is_trimmed() {
        assert_eq!(classify_tag("  <sentence>\n"), TagKind::SentenceBoundary);
    }

    #[test]
    fn test_other_names_are_pauses() {
        assert_eq!(classify_tag(PAUSE_MARKER), TagKind::Pause);
        assert_eq!(classify_tag("<sil>"), TagKind::Pause);
        assert_eq!(classify_tag("<SENTENCE>"), TagKind::Pause);
        assert_eq!(classify_tag(""), TagKind::Pause);
    }

    #[test]
    fn test_content_token_is_never_a_tag() {
        // A content token whose text happens to equal the marker stays content.
        let token = CleanToken::new(
            SENTENCE_MARKER,
            0,
            OriginalToken::new(SENTENCE_MARKER, Span::new(0, 10, 0)),
        );
        let element = StageElement::Token(Arc::new(token));
        assert_eq!(element.tag_kind(), None);
        assert!(!element.is_tag());
    }

    #[test]
    fn test_tag_element_kind() {
        let element: StageElement<CleanToken> = StageElement::Tag(TagToken::new("<pau>", 3));
        assert_eq!(element.tag_kind(), Some(TagKind::Pause));
        assert!(element.is_tag());
    }
}
