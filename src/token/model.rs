//! Token records and stage outputs.
//!
//! Every content token keeps an `Arc` back-reference to the token it was
//! derived from in the preceding stage, down to a [`CleanToken`] that owns the
//! original input span. Tokens are immutable once constructed; later stages
//! build new tokens instead of editing old ones.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Pipeline stage that produced a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Clean,
    Normalize,
    Transcribe,
}

impl Stage {
    /// Length of the parent chain for a content token of this stage.
    pub fn depth(self) -> usize {
        match self {
            Stage::Clean => 1,
            Stage::Normalize => 2,
            Stage::Transcribe => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Clean => "clean",
            Stage::Normalize => "normalize",
            Stage::Transcribe => "transcribe",
        };
        f.write_str(name)
    }
}

/// Byte range in the original input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// Position of the original token among all original tokens.
    pub source_index: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, source_index: usize) -> Self {
        Self {
            start,
            end,
            source_index,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The slice of `text` this span covers, if it lies on char boundaries.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

/// Common read-only view over content tokens of every stage.
pub trait Token: fmt::Debug + Send + Sync {
    /// Surface form at this token's stage.
    fn name(&self) -> &str;

    /// Position within the producing stage's output.
    fn index(&self) -> usize;

    fn stage(&self) -> Stage;

    /// Span of the original input this token derives from.
    fn span(&self) -> Span;

    /// The token this one was derived from; `None` for clean tokens.
    fn parent(&self) -> Option<&dyn Token>;
}

/// Walk the parent chain, starting with `token` itself.
pub fn lineage(token: &dyn Token) -> Vec<&dyn Token> {
    let mut chain = vec![token];
    let mut current = token;
    while let Some(parent) = current.parent() {
        chain.push(parent);
        current = parent;
    }
    chain
}

/// The slice of the input as seen by the engine before cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalToken {
    name: String,
    span: Span,
}

impl OriginalToken {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Output of the Clean stage: the root of every lineage chain.
#[derive(Debug, Clone)]
pub struct CleanToken {
    name: String,
    index: usize,
    original: OriginalToken,
}

impl CleanToken {
    pub fn new(name: impl Into<String>, index: usize, original: OriginalToken) -> Self {
        Self {
            name: name.into(),
            index,
            original,
        }
    }

    pub fn original(&self) -> &OriginalToken {
        &self.original
    }
}

impl Token for CleanToken {
    fn name(&self) -> &str {
        &self.name
    }

    fn index(&self) -> usize {
        self.index
    }

    fn stage(&self) -> Stage {
        Stage::Clean
    }

    fn span(&self) -> Span {
        self.original.span
    }

    fn parent(&self) -> Option<&dyn Token> {
        None
    }
}

/// Stage-specific data attached to a normalized token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedPayload {
    /// Candidate normalized strings, most likely first. May be empty.
    pub variants: Vec<String>,
    /// Part-of-speech tag, if the engine reports one.
    pub pos: Option<String>,
    /// Whether the engine spell-corrected the input word.
    pub spell_corrected: bool,
}

#[derive(Debug, Clone)]
pub struct NormalizedToken {
    name: String,
    index: usize,
    parent: Arc<CleanToken>,
    payload: NormalizedPayload,
}

impl NormalizedToken {
    pub fn new(
        name: impl Into<String>,
        index: usize,
        parent: Arc<CleanToken>,
        payload: NormalizedPayload,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            parent,
            payload,
        }
    }

    pub fn clean_token(&self) -> &CleanToken {
        &self.parent
    }

    pub fn variants(&self) -> &[String] {
        &self.payload.variants
    }

    pub fn pos(&self) -> Option<&str> {
        self.payload.pos.as_deref()
    }

    pub fn spell_corrected(&self) -> bool {
        self.payload.spell_corrected
    }
}

impl Token for NormalizedToken {
    fn name(&self) -> &str {
        &self.name
    }

    fn index(&self) -> usize {
        self.index
    }

    fn stage(&self) -> Stage {
        Stage::Normalize
    }

    fn span(&self) -> Span {
        self.parent.span()
    }

    fn parent(&self) -> Option<&dyn Token> {
        Some(self.parent.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct TranscribedToken {
    name: String,
    index: usize,
    parent: Arc<NormalizedToken>,
    variants: Vec<String>,
}

impl TranscribedToken {
    /// `variants` holds the phonemic renderings; `name` is the one used for
    /// reconstruction (normally the first variant).
    pub fn new(
        name: impl Into<String>,
        index: usize,
        parent: Arc<NormalizedToken>,
        variants: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            parent,
            variants,
        }
    }

    pub fn normalized_token(&self) -> &NormalizedToken {
        &self.parent
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }
}

impl Token for TranscribedToken {
    fn name(&self) -> &str {
        &self.name
    }

    fn index(&self) -> usize {
        self.index
    }

    fn stage(&self) -> Stage {
        Stage::Transcribe
    }

    fn span(&self) -> Span {
        self.parent.span()
    }

    fn parent(&self) -> Option<&dyn Token> {
        Some(self.parent.as_ref())
    }
}

// Identity is the original span plus stage position, never the surface text.
macro_rules! impl_token_identity {
    ($($ty:ty),*) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.span() == other.span() && self.index == other.index
                }
            }

            impl Eq for $ty {}

            impl Hash for $ty {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    self.span().hash(state);
                    self.index.hash(state);
                }
            }
        )*
    };
}

impl_token_identity!(CleanToken, NormalizedToken, TranscribedToken);

/// Structural marker (sentence boundary or pause) interleaved with content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagToken {
    name: String,
    index: usize,
}

impl TagToken {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// One element of a stage output: either a content token or a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageElement<T> {
    Token(Arc<T>),
    Tag(TagToken),
}

impl<T: Token> StageElement<T> {
    pub fn name(&self) -> &str {
        match self {
            StageElement::Token(token) => token.name(),
            StageElement::Tag(tag) => tag.name(),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            StageElement::Token(token) => token.index(),
            StageElement::Tag(tag) => tag.index(),
        }
    }

    pub fn as_token(&self) -> Option<&Arc<T>> {
        match self {
            StageElement::Token(token) => Some(token),
            StageElement::Tag(_) => None,
        }
    }
}

/// Ordered output of one stage, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput<T> {
    elements: Vec<StageElement<T>>,
}

impl<T> Default for StageOutput<T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<T: Token> StageOutput<T> {
    pub fn new(elements: Vec<StageElement<T>>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[StageElement<T>] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StageElement<T>> {
        self.elements.iter()
    }

    pub fn get(&self, index: usize) -> Option<&StageElement<T>> {
        self.elements.get(index)
    }

    /// Content tokens only, in order.
    pub fn tokens(&self) -> impl Iterator<Item = &Arc<T>> {
        self.elements.iter().filter_map(StageElement::as_token)
    }

    /// Tag tokens only, in order.
    pub fn tags(&self) -> impl Iterator<Item = &TagToken> {
        self.elements.iter().filter_map(|element| match element {
            StageElement::Tag(tag) => Some(tag),
            StageElement::Token(_) => None,
        })
    }
}

impl<'a, T> IntoIterator for &'a StageOutput<T> {
    type Item = &'a StageElement<T>;
    type IntoIter = std::slice::Iter<'a, StageElement<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(name: &str, index: usize, start: usize, end: usize) -> Arc<CleanToken> {
        Arc::new(CleanToken::new(
            name,
            index,
            OriginalToken::new(name, Span::new(start, end, index)),
        ))
    }

    #[test]
    fn test_span_slices_original_text() {
        let text = "það voru 55";
        let span = Span::new(0, 4, 0);
        assert_eq!(span.slice(text), Some("það"));
        assert_eq!(span.len(), 4);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_slice_off_char_boundary_is_none() {
        // 'ð' occupies bytes 3..5
        let span = Span::new(0, 4, 0);
        assert_eq!(span.slice("það"), None);
    }

    #[test]
    fn test_lineage_lengths_match_stage_depth() {
        let root = clean("km", 0, 0, 2);
        let norm = Arc::new(NormalizedToken::new(
            "kílómetrar",
            0,
            Arc::clone(&root),
            NormalizedPayload::default(),
        ));
        let transcribed =
            TranscribedToken::new("c_h i: l ou m E t r a r", 0, Arc::clone(&norm), vec![]);

        assert_eq!(lineage(root.as_ref()).len(), Stage::Clean.depth());
        assert_eq!(lineage(norm.as_ref()).len(), Stage::Normalize.depth());
        assert_eq!(lineage(&transcribed).len(), Stage::Transcribe.depth());

        let chain = lineage(&transcribed);
        assert_eq!(chain[0].stage(), Stage::Transcribe);
        assert_eq!(chain[1].name(), "kílómetrar");
        assert_eq!(chain[2].name(), "km");
        assert!(chain[2].parent().is_none());
    }

    #[test]
    fn test_derived_tokens_inherit_span() {
        let root = clean("55", 2, 9, 11);
        let norm = NormalizedToken::new(
            "fimmtíu og fimm",
            3,
            Arc::clone(&root),
            NormalizedPayload::default(),
        );
        assert_eq!(norm.span(), Span::new(9, 11, 2));
        assert_eq!(norm.clean_token().name(), "55");
    }

    #[test]
    fn test_identity_ignores_surface_text() {
        let a = CleanToken::new("eftir", 4, OriginalToken::new("eftir", Span::new(0, 5, 4)));
        let b = CleanToken::new("EFTIR", 4, OriginalToken::new("EFTIR", Span::new(0, 5, 4)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_text_at_different_positions_is_distinct() {
        let a = clean("og", 1, 3, 5);
        let b = clean("og", 5, 12, 14);
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalized_payload_accessors() {
        let norm = NormalizedToken::new(
            "kílómetrar",
            0,
            clean("km", 0, 0, 2),
            NormalizedPayload {
                variants: vec!["kílómetrar".into(), "kílómetra".into()],
                pos: Some("n".into()),
                spell_corrected: true,
            },
        );
        assert_eq!(norm.variants().len(), 2);
        assert_eq!(norm.pos(), Some("n"));
        assert!(norm.spell_corrected());
    }

    #[test]
    fn test_stage_output_filters_tokens_and_tags() {
        let output = StageOutput::new(vec![
            StageElement::Token(clean("Hæ", 0, 0, 3)),
            StageElement::Tag(TagToken::new("<sentence>", 1)),
            StageElement::Token(clean("bæ", 2, 4, 7)),
        ]);
        assert_eq!(output.len(), 3);
        assert_eq!(output.tokens().count(), 2);
        assert_eq!(output.tags().count(), 1);
        assert_eq!(output.get(1).map(|e| e.name()), Some("<sentence>"));
        let names: Vec<&str> = output.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["Hæ", "<sentence>", "bæ"]);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Clean.to_string(), "clean");
        assert_eq!(Stage::Transcribe.to_string(), "transcribe");
    }

    #[test]
    fn test_tokens_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StageOutput<TranscribedToken>>();
    }
}
