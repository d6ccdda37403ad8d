//! Pronunciation dictionary files.
//!
//! One entry per line: a word, a tab (or any run of whitespace) and the
//! phonemic rendering, which may itself contain spaces. Lines starting with
//! `#` and blank lines are skipped.
//!
//! ```text
//! # word   phonemes
//! eftir    E p t I r
//! ```

use crate::error::{FrontendError, Result};
use crate::pipeline::PronunciationDict;
use std::fs;
use std::path::Path;

/// Parse dictionary text. Later entries for the same word replace earlier ones.
pub fn parse(contents: &str) -> Result<PronunciationDict> {
    let mut dictionary = PronunciationDict::new();

    for (number, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (word, phonemes) = line
            .split_once(|c: char| c.is_whitespace())
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        if phonemes.is_empty() {
            return Err(FrontendError::DictionaryParse {
                line: number + 1,
                message: format!("missing phonemes for '{}'", word),
            });
        }

        dictionary.insert(word.to_string(), phonemes.to_string());
    }

    Ok(dictionary)
}

/// Load and parse a dictionary file.
pub fn load(path: &Path) -> Result<PronunciationDict> {
    let contents = fs::read_to_string(path).map_err(|source| FrontendError::DictionaryRead {
        path: path.display().to_string(),
        source,
    })?;
    let dictionary = parse(&contents)?;
    tracing::debug!(
        path = %path.display(),
        entries = dictionary.len(),
        "loaded pronunciation dictionary"
    );
    Ok(dictionary)
}

/// Layer `overrides` on top of `base`; entries in `overrides` win.
pub fn merge(base: &PronunciationDict, overrides: PronunciationDict) -> PronunciationDict {
    let mut merged = base.clone();
    merged.extend(overrides);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_tab_separated_entries() {
        let dictionary = parse("eftir\tE p t I r\nhestur\th E s t Y r\n").unwrap();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary["eftir"], "E p t I r");
        assert_eq!(dictionary["hestur"], "h E s t Y r");
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let dictionary = parse("# header\n\n  \neftir   E p t I r\n").unwrap();
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary["eftir"], "E p t I r");
    }

    #[test]
    fn test_parse_reports_line_number() {
        let result = parse("eftir\tE p t I r\n# note\nhestur\n");
        match result {
            Err(FrontendError::DictionaryParse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("hestur"));
            }
            other => panic!("Expected DictionaryParse, got: {:?}", other),
        }
    }

    #[test]
    fn test_later_entry_replaces_earlier() {
        let dictionary = parse("eftir\ta\neftir\tb\n").unwrap();
        assert_eq!(dictionary["eftir"], "b");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all("sögðu\ts 9 G D Y\n".as_bytes()).unwrap();
        let dictionary = load(file.path()).unwrap();
        assert_eq!(dictionary["sögðu"], "s 9 G D Y");
    }

    #[test]
    fn test_load_missing_file_is_internal_error() {
        let result = load(Path::new("/tmp/nonexistent_tts_frontend_dict_98765.tsv"));
        match result {
            Err(e @ FrontendError::DictionaryRead { .. }) => {
                assert_eq!(e.kind(), ErrorKind::Internal);
                assert!(e.to_string().contains("nonexistent_tts_frontend_dict_98765"));
            }
            other => panic!("Expected DictionaryRead, got: {:?}", other),
        }
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let base = parse("eftir\tfile\nhestur\tfile\n").unwrap();
        let merged = merge(&base, PronunciationDict::from([("eftir".into(), "request".into())]));
        assert_eq!(merged["eftir"], "request");
        assert_eq!(merged["hestur"], "file");
    }
}
