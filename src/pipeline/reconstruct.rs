//! Reassemble a stage output into sentence strings.

use crate::token::{StageElement, StageOutput, TagKind, Token};

/// Rebuild one string per sentence from a stage output.
///
/// Content tokens contribute their surface name, followed by `word_separator`
/// (when non-empty) and a single space. Every sentence-boundary tag closes the
/// current sentence, even an empty one, so `k` boundaries always produce `k`
/// sentences plus one for any non-empty trailing text. Pause tags are written
/// like content unless `suppress_tags` is set.
pub fn reconstruct<T: Token>(
    output: &StageOutput<T>,
    word_separator: &str,
    suppress_tags: bool,
) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for element in output {
        match element {
            StageElement::Token(token) => append_word(&mut current, token.name(), word_separator),
            StageElement::Tag(tag) => match tag.kind() {
                TagKind::SentenceBoundary => {
                    sentences.push(current.trim_end().to_string());
                    current.clear();
                }
                TagKind::Pause => {
                    if !suppress_tags {
                        append_word(&mut current, tag.name(), word_separator);
                    }
                }
            },
        }
    }

    let trailing = current.trim_end();
    if !trailing.is_empty() {
        sentences.push(trailing.to_string());
    }
    sentences
}

/// Single-string form used for Clean responses: sentences joined by a space.
pub fn reconstruct_text<T: Token>(
    output: &StageOutput<T>,
    word_separator: &str,
    suppress_tags: bool,
) -> String {
    reconstruct(output, word_separator, suppress_tags)
        .into_iter()
        .filter(|sentence| !sentence.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn append_word(accumulator: &mut String, word: &str, word_separator: &str) {
    accumulator.push_str(word);
    accumulator.push_str(word_separator);
    accumulator.push(' ');
}
