//! Small rule-based engine used by the daemon and CLI out of the box.
//!
//! The rules are deliberately shallow: whitespace tokenization with
//! punctuation splitting, HTML tag stripping, Icelandic cardinals up to 999,
//! a short abbreviation table and a grapheme-to-phoneme table. Production
//! deployments plug a full engine in through [`LinguisticEngine`].

use super::{CleanUnit, EngineToken, LinguisticEngine, NormalizedUnit, TranscribedUnit};
use crate::error::{FrontendError, Result};
use crate::pipeline::config::{Domain, PipelineConfig};
use crate::token::tag::{PAUSE_MARKER, SENTENCE_MARKER};

/// Punctuation split off the front of a word.
const LEADING_PUNCT: &[char] = &['(', '[', '"', '\'', '„', '“', '«'];

/// Punctuation split off the end of a word.
const TRAILING_PUNCT: &[char] = &[
    '.', ',', '!', '?', ';', ':', ')', ']', '"', '\'', '“', '”', '»', '…',
];

/// Abbreviations kept whole by the cleaner even though they end in a period.
const DOTTED_ABBREVIATIONS: &[&str] = &["t.d.", "o.s.frv.", "e.", "nr.", "kl.", "mín.", "sek."];

/// Character references decoded in HTML mode.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&#39;", "'"),
];

/// Character references that separate words like whitespace.
const HTML_SPACES: &[&str] = &["&nbsp;", "&#160;", "&#xa0;"];

/// HTML elements whose end marks a pause.
const BLOCK_ELEMENTS: &[&str] = &[
    "p",
    "div",
    "li",
    "ul",
    "ol",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "tr",
    "td",
    "table",
    "blockquote",
    "section",
    "article",
];

const ABBREVIATIONS: &[(&str, &[&str])] = &[
    ("km", &["kílómetrar", "kílómetra"]),
    ("kg", &["kíló", "kílógrömm"]),
    ("cm", &["sentimetrar"]),
    ("t.d.", &["til dæmis"]),
    ("o.s.frv.", &["og svo framvegis"]),
    ("e.", &["enska"]),
    ("nr.", &["númer"]),
    ("kl.", &["klukkan"]),
    ("%", &["prósent"]),
    ("π", &["pí"]),
    ("°", &["gráður"]),
    ("&", &["og"]),
];

/// Sport-domain entries take precedence over the general table.
const SPORT_ABBREVIATIONS: &[(&str, &[&str])] = &[
    ("km", &["kílómetrar"]),
    ("m", &["metrar"]),
    ("mín.", &["mínútur", "mínútna"]),
    ("sek.", &["sekúndur"]),
];

const UNITS: [&str; 20] = [
    "núll", "einn", "tveir", "þrír", "fjórir", "fimm", "sex", "sjö", "átta", "níu", "tíu",
    "ellefu", "tólf", "þrettán", "fjórtán", "fimmtán", "sextán", "sautján", "átján", "nítján",
];

const NEUTER_UNITS: [&str; 5] = ["núll", "eitt", "tvö", "þrjú", "fjögur"];

const TENS: [&str; 10] = [
    "", "", "tuttugu", "þrjátíu", "fjörutíu", "fimmtíu", "sextíu", "sjötíu", "áttatíu", "níutíu",
];

/// Two-letter graphemes, matched before single letters.
const DIGRAPHS: &[(&str, &str)] = &[
    ("au", "9i"),
    ("ei", "ei"),
    ("ey", "ei"),
    ("hv", "k_h v"),
    ("hj", "C"),
    ("hl", "l_0"),
    ("hr", "r_0"),
    ("hn", "n_0"),
    ("ng", "N k"),
    ("ll", "t l"),
    ("pp", "h p"),
    ("tt", "h t"),
    ("kk", "h k"),
];

const GRAPHEMES: &[(char, &str)] = &[
    ('a', "a"),
    ('á', "au"),
    ('b', "p"),
    ('c', "k"),
    ('d', "t"),
    ('ð', "D"),
    ('e', "E"),
    ('é', "j E"),
    ('f', "f"),
    ('g', "k"),
    ('h', "h"),
    ('i', "I"),
    ('í', "i"),
    ('j', "j"),
    ('k', "k_h"),
    ('l', "l"),
    ('m', "m"),
    ('n', "n"),
    ('o', "O"),
    ('ó', "ou"),
    ('p', "p_h"),
    ('q', "k"),
    ('r', "r"),
    ('s', "s"),
    ('t', "t_h"),
    ('u', "Y"),
    ('ú', "u"),
    ('v', "v"),
    ('w', "v"),
    ('x', "k s"),
    ('y', "I"),
    ('ý', "i"),
    ('z', "s"),
    ('þ', "T"),
    ('æ', "ai"),
    ('ö', "9"),
];

const VOWEL_PHONES: &[&str] = &[
    "a", "au", "E", "I", "i", "O", "ou", "Y", "u", "9", "9i", "ei", "ai",
];

/// Rule-based reference engine. Stateless; safe to share across requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicEngine;

impl BasicEngine {
    pub fn new() -> Self {
        Self
    }

    fn normalize_word(&self, text: &str, source: usize, domain: Domain) -> NormalizedUnit {
        let lower = text.to_lowercase();

        if let Some(variants) = lookup_abbreviation(&lower, domain) {
            let variants: Vec<String> = variants.iter().map(|v| v.to_string()).collect();
            return NormalizedUnit::token(variants[0].clone(), source).with_variants(variants);
        }

        if let Some(spoken) = spell_numeral(&lower, domain) {
            return NormalizedUnit::token(spoken, source).with_pos("ta");
        }

        NormalizedUnit::token(lower, source)
    }

    fn transcribe_word(&self, word: &str, config: &PipelineConfig) -> String {
        if let Some(entry) = config.custom_dictionary().get(word) {
            return entry.clone();
        }

        let mut phones = graphemes_to_phones(word);
        let vowels: Vec<usize> = phones
            .iter()
            .enumerate()
            .filter(|(_, phone)| VOWEL_PHONES.contains(&phone.as_str()))
            .map(|(i, _)| i)
            .collect();

        if config.stress_labels()
            && let Some(&first) = vowels.first()
        {
            phones[first].push('1');
        }

        let symbol = config.syllabification_symbol();
        if !symbol.is_empty() {
            // One consonant goes to the onset of the following syllable.
            let mut boundaries: Vec<usize> = vowels
                .windows(2)
                .map(|pair| if pair[1] - pair[0] == 1 { pair[1] } else { pair[1] - 1 })
                .collect();
            boundaries.dedup();
            for position in boundaries.into_iter().rev() {
                phones.insert(position, symbol.to_string());
            }
        }

        phones.join(" ")
    }
}

impl LinguisticEngine for BasicEngine {
    fn clean(&self, text: &str, parse_html: bool) -> Result<Vec<CleanUnit>> {
        let mut units = Vec::new();
        let mut word_start: Option<usize> = None;
        let mut chars = text.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            if parse_html
                && ch == '<'
                && let Some(rel_end) = text[pos..].find('>')
            {
                if let Some(start) = word_start.take() {
                    push_word(&mut units, &text[start..pos], start, parse_html);
                }
                let tag_end = pos + rel_end;
                if is_block_boundary(&text[pos + 1..tag_end])
                    && units.last().is_some_and(|unit: &CleanUnit| !unit.is_structural)
                {
                    units.push(CleanUnit::tag(PAUSE_MARKER));
                }
                while chars.next_if(|&(p, _)| p <= tag_end).is_some() {}
                continue;
            }

            let html_space = if parse_html && ch == '&' {
                HTML_SPACES
                    .iter()
                    .find(|entity| starts_with_ignore_case(&text[pos..], entity))
            } else {
                None
            };

            if ch.is_whitespace() || html_space.is_some() {
                if let Some(start) = word_start.take() {
                    push_word(&mut units, &text[start..pos], start, parse_html);
                }
                if let Some(entity) = html_space {
                    let entity_end = pos + entity.len();
                    while chars.next_if(|&(p, _)| p < entity_end).is_some() {}
                }
            } else if word_start.is_none() {
                word_start = Some(pos);
            }
        }

        if let Some(start) = word_start {
            push_word(&mut units, &text[start..], start, parse_html);
        }

        // A trailing block end carries no information.
        if units.last().is_some_and(|unit| unit.is_structural) {
            units.pop();
        }

        Ok(units)
    }

    fn normalize(
        &self,
        tokens: &[EngineToken],
        domain: Domain,
        _parse_html: bool,
        split_sentences: bool,
    ) -> Result<Vec<NormalizedUnit>> {
        let mut units: Vec<NormalizedUnit> = Vec::new();
        let mut content_since_boundary = false;

        for token in tokens {
            let text = token.text.as_str();

            if token.is_structural {
                push_tag(&mut units, text);
                continue;
            }

            if !text.is_empty() && text.chars().all(|c| matches!(c, '.' | '!' | '?' | '…')) {
                if split_sentences {
                    if content_since_boundary {
                        push_tag(&mut units, SENTENCE_MARKER);
                        content_since_boundary = false;
                    }
                } else {
                    push_tag(&mut units, PAUSE_MARKER);
                }
                continue;
            }

            if matches!(text, "," | ";" | ":" | "-" | "–" | "—") {
                if content_since_boundary {
                    push_tag(&mut units, PAUSE_MARKER);
                }
                continue;
            }

            if !text.chars().any(char::is_alphanumeric)
                && lookup_abbreviation(text, domain).is_none()
            {
                // quotes, brackets and other silent symbols
                continue;
            }

            units.push(self.normalize_word(text, token.index, domain));
            content_since_boundary = true;
        }

        Ok(units)
    }

    fn transcribe(
        &self,
        tokens: &[EngineToken],
        config: &PipelineConfig,
    ) -> Result<Vec<TranscribedUnit>> {
        if !self.supports_dialect(config.dialect()) {
            return Err(FrontendError::UnsupportedDialect {
                dialect: config.dialect().to_string(),
            });
        }

        let joiner = if config.word_separator().is_empty() {
            " ".to_string()
        } else {
            format!(" {} ", config.word_separator())
        };

        let units = tokens
            .iter()
            .map(|token| {
                if token.is_structural {
                    return TranscribedUnit::tag(token.text.clone());
                }
                let rendered: Vec<String> = token
                    .text
                    .split_whitespace()
                    .map(|word| self.transcribe_word(word, config))
                    .collect();
                TranscribedUnit::token(rendered.join(&joiner), token.index)
            })
            .collect();

        Ok(units)
    }

    fn name(&self) -> &str {
        "basic"
    }
}

/// Split a whitespace-delimited word into punctuation and core units.
fn push_word(units: &mut Vec<CleanUnit>, word: &str, start: usize, parse_html: bool) {
    let mut core_start = 0;
    for (i, c) in word.char_indices() {
        if !LEADING_PUNCT.contains(&c) {
            break;
        }
        let from = start + i;
        units.push(CleanUnit::token(c.to_string(), from, from + c.len_utf8()));
        core_start = i + c.len_utf8();
    }

    let core = &word[core_start..];
    let core_offset = start + core_start;

    if DOTTED_ABBREVIATIONS.contains(&core.to_lowercase().as_str()) {
        units.push(CleanUnit::token(
            core,
            core_offset,
            core_offset + core.len(),
        ));
        return;
    }

    let mut core_end = core.len();
    let mut trailing = Vec::new();
    for (i, c) in core.char_indices().rev() {
        if !TRAILING_PUNCT.contains(&c) {
            break;
        }
        // the ';' closing a character reference belongs to the word
        if parse_html && c == ';' && ends_with_entity(&core[..i + 1]) {
            break;
        }
        trailing.push((i, c));
        core_end = i;
    }

    if core_end > 0 {
        let cleaned = clean_text(&core[..core_end], parse_html);
        if !cleaned.is_empty() {
            units.push(CleanUnit::token(
                cleaned,
                core_offset,
                core_offset + core_end,
            ));
        }
    }

    for (i, c) in trailing.into_iter().rev() {
        let from = core_offset + i;
        units.push(CleanUnit::token(c.to_string(), from, from + c.len_utf8()));
    }
}

/// Drop characters the later stages cannot pronounce.
fn clean_text(raw: &str, parse_html: bool) -> String {
    let mut decoded = raw.to_string();
    if parse_html {
        for (entity, replacement) in HTML_ENTITIES {
            decoded = decoded.replace(entity, replacement);
        }
    }
    decoded
        .chars()
        .filter(|&c| c.is_alphanumeric() || "-.,/%°$€£&+=':".contains(c))
        .collect()
}

fn ends_with_entity(text: &str) -> bool {
    HTML_ENTITIES
        .iter()
        .any(|(entity, _)| text.ends_with(entity))
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn is_block_boundary(tag: &str) -> bool {
    let tag = tag.trim();
    let (closing, body) = match tag.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, tag),
    };
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    name == "br" || (closing && BLOCK_ELEMENTS.contains(&name.as_str()))
}

fn push_tag(units: &mut Vec<NormalizedUnit>, name: &str) {
    if units
        .last()
        .is_some_and(|last| last.is_structural && last.text == name)
    {
        return;
    }
    units.push(NormalizedUnit::tag(name));
}

fn lookup_abbreviation(word: &str, domain: Domain) -> Option<&'static [&'static str]> {
    let find = |table: &'static [(&str, &'static [&'static str])]| {
        table
            .iter()
            .find(|(abbr, _)| *abbr == word)
            .map(|(_, variants)| *variants)
    };
    match domain {
        Domain::Sport => find(SPORT_ABBREVIATIONS).or_else(|| find(ABBREVIATIONS)),
        Domain::Other => find(ABBREVIATIONS),
    }
}

/// Spoken form of a numeric token, or `None` if it is not numeric.
fn spell_numeral(word: &str, domain: Domain) -> Option<String> {
    if is_digits(word) {
        return spell_digits(word, false);
    }

    // "2-1": a score in sport, a range elsewhere
    if let Some((left, right)) = word.split_once('-')
        && is_digits(left)
        && is_digits(right)
    {
        return match domain {
            Domain::Sport => Some(format!(
                "{} {}",
                spell_digits(left, true)?,
                spell_digits(right, true)?
            )),
            Domain::Other => Some(format!(
                "{} til {}",
                spell_digits(left, false)?,
                spell_digits(right, false)?
            )),
        };
    }

    // "1.000" groups thousands; "3.14" and "3,14" are decimals
    if let Some((left, right)) = word.split_once(['.', ','])
        && is_digits(left)
        && is_digits(right)
    {
        if word.contains('.') && right.len() == 3 && !right.contains('.') {
            return spell_digits(&format!("{}{}", left, right), false);
        }
        return Some(format!(
            "{} komma {}",
            spell_digits(left, false)?,
            spell_digits(right, false)?
        ));
    }

    None
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn spell_digits(digits: &str, neuter: bool) -> Option<String> {
    let n: u64 = digits.parse().ok()?;
    if n < 1000 {
        return Some(spell_number(n as usize, neuter));
    }
    let spoken: Vec<&str> = digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| unit_word(d as usize, neuter))
        .collect();
    Some(spoken.join(" "))
}

fn unit_word(n: usize, neuter: bool) -> &'static str {
    if neuter && n < NEUTER_UNITS.len() {
        NEUTER_UNITS[n]
    } else {
        UNITS[n]
    }
}

fn below_hundred(n: usize, neuter: bool) -> String {
    if n < 20 {
        return unit_word(n, neuter).to_string();
    }
    let tens = TENS[n / 10];
    match n % 10 {
        0 => tens.to_string(),
        unit => format!("{} og {}", tens, unit_word(unit, neuter)),
    }
}

fn spell_number(n: usize, neuter: bool) -> String {
    if n < 100 {
        return below_hundred(n, neuter);
    }
    let hundreds = n / 100;
    let rest = n % 100;
    let head = if hundreds == 1 {
        "eitt hundrað".to_string()
    } else {
        format!("{} hundruð", unit_word(hundreds, true))
    };
    if rest == 0 {
        head
    } else if rest < 20 || rest % 10 == 0 {
        format!("{} og {}", head, below_hundred(rest, neuter))
    } else {
        format!("{} {}", head, below_hundred(rest, neuter))
    }
}

fn graphemes_to_phones(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.to_lowercase().chars().collect();
    let mut phones = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect();
            if let Some((_, rendering)) = DIGRAPHS.iter().find(|(g, _)| *g == pair) {
                phones.extend(rendering.split(' ').map(str::to_string));
                i += 2;
                continue;
            }
        }
        if let Some((_, rendering)) = GRAPHEMES.iter().find(|(g, _)| *g == chars[i]) {
            phones.extend(rendering.split(' ').map(str::to_string));
        }
        i += 1;
    }

    phones
}
