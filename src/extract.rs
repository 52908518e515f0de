//! Pattern-based field extraction from noisy speech transcripts.
//!
//! Every extractor either returns a value in its kind's canonical format or
//! `None`. There is no semantic understanding here: digits are pulled out of
//! identifier answers and filler words are stripped from free text.
//!
//! Normalizations:
//! - Devanagari and Gujarati digits are mapped to ASCII before matching.
//! - Aadhaar numbers are returned as 12 bare digits (`123456789012`).
//! - Mobile numbers are returned as 10 bare digits, with a spoken `+91`/`0`
//!   prefix dropped.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::Language;

/// Shortest free-text answer accepted.
pub const MIN_TEXT_LEN: usize = 2;

const MOBILE_LEN: usize = 10;
const AADHAR_LEN: usize = 12;
const BANK_ACCOUNT_LEN: std::ops::RangeInclusive<usize> = 9..=18;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

static AADHAR_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{4}\s*[0-9]{4}\s*[0-9]{4}").unwrap());

static IFSC_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{4}0[A-Z0-9]{6}\b").unwrap());

static IFSC_ANYWHERE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{4}0[A-Z0-9]{6}").unwrap());

static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([0-9][0-9,]*(?:\.[0-9]+)?)\s*(hectares?|acres?|bighas?|gunthas?|sq\.?\s?(?:m|ft|metres?|meters?|feet)|square\s+(?:metres?|meters?|feet)|हेक्टेयर|एकड़|बीघा|વીઘા|હેક્ટર|એકર)?",
    )
    .unwrap()
});

/// Politeness particles, copulas and "name" words, always stripped.
const FILLERS_EN: &[&str] = &[
    "my", "name", "name's", "is", "am", "i", "i'm", "im", "it", "it's", "its", "the", "this",
    "was", "are", "please", "sir", "madam", "ma'am", "ji", "father", "father's", "mother",
    "mother's", "husband", "husband's", "daughter", "daughter's",
];

const FILLERS_HI: &[&str] = &[
    "mera", "meri", "mere", "naam", "hai", "hain", "tha", "thi", "ka", "ki", "ke", "kripya",
    "pita", "mata", "pati", "beti", "मेरा", "मेरी", "मेरे", "नाम", "है", "हैं", "था", "थी", "का",
    "की", "के", "जी", "कृपया", "पिता", "माता", "पति", "बेटी",
];

const FILLERS_GU: &[&str] = &[
    "maru", "mari", "mara", "naam", "che", "chhe", "hatu", "મારું", "મારી", "મારા", "નામ", "છે",
    "હતું", "હતા", "જી", "કૃપા", "કરીને", "પિતા", "પિતાનું", "માતા", "માતાનું", "પતિ", "પતિનું",
    "દીકરી", "દીકરીનું",
];

/// Words that mean the speaker is talking about the interaction rather
/// than answering the question.
pub const COMMAND_WORDS: &[&str] = &[
    "what", "stop", "help", "yes", "no", "repeat", "again", "wait", "cancel", "hello", "hi",
    "hey", "ok", "okay", "sorry", "pardon", "huh", "kya", "ruko", "madad", "haan", "han", "nahi",
    "nahin", "kyun", "kaise", "क्या", "रुको", "मदद", "हाँ", "हां", "नहीं", "दोबारा", "फिर", "શું",
    "રોકો", "મદદ", "હા", "ના", "ફરીથી",
];

/// Words that, next to a command word, make up a question about the
/// conversation ("can you repeat that", "what did you say").
const INTERACTION_WORDS: &[&str] = &[
    "you", "your", "u", "me", "did", "do", "does", "say", "said", "saying", "can", "could",
    "will", "would", "tell", "that", "question", "mean", "understand", "understood", "know",
    "don't", "dont", "not", "speak", "slowly", "louder", "hear", "heard", "ask", "asking",
    "asked", "one", "more", "time", "aap", "aapne", "kaha", "bolo", "boliye", "samjha", "samajh",
    "se", "आप", "आपने", "कहा", "बोलो", "बोलिए", "समझा", "समझ", "से", "તમે", "કહ્યું", "બોલો",
    "સમજાયું", "ફરી",
];

static COMMAND_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| COMMAND_WORDS.iter().copied().collect());

static INTERACTION_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| INTERACTION_WORDS.iter().copied().collect());

static FILLER_EN: Lazy<HashSet<&'static str>> = Lazy::new(|| FILLERS_EN.iter().copied().collect());
static FILLER_HI: Lazy<HashSet<&'static str>> = Lazy::new(|| FILLERS_HI.iter().copied().collect());
static FILLER_GU: Lazy<HashSet<&'static str>> = Lazy::new(|| FILLERS_GU.iter().copied().collect());

/// The shape of value a field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Mobile,
    Aadhar,
    BankAccount,
    Ifsc,
    Number,
    Text,
}

impl FieldKind {
    /// Map a form field key to the extractor used for it.
    pub fn for_field(key: &str) -> Self {
        match key {
            "mobile" => Self::Mobile,
            "aadhar" => Self::Aadhar,
            "bankAccount" => Self::BankAccount,
            "ifsc" => Self::Ifsc,
            "familyMembers" | "income" | "landArea" | "plotSize" => Self::Number,
            _ => Self::Text,
        }
    }
}

/// Extract a value for `kind` from `transcript`.
pub fn extract_field(transcript: &str, kind: FieldKind, language: Language) -> Option<String> {
    match kind {
        FieldKind::Mobile => extract_mobile(transcript),
        FieldKind::Aadhar => extract_aadhar(transcript),
        FieldKind::BankAccount => extract_bank_account(transcript),
        FieldKind::Ifsc => extract_ifsc(transcript),
        FieldKind::Number => extract_number(transcript),
        FieldKind::Text => extract_text(transcript, language),
    }
}

/// Map Devanagari (U+0966..) and Gujarati (U+0AE6..) digits to ASCII.
fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{0966}'..='\u{096F}' => char::from(b'0' + (c as u32 - 0x0966) as u8),
            '\u{0AE6}'..='\u{0AEF}' => char::from(b'0' + (c as u32 - 0x0AE6) as u8),
            _ => c,
        })
        .collect()
}

fn all_digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn extract_mobile(transcript: &str) -> Option<String> {
    let text = normalize_digits(transcript);
    if let Some(run) = DIGIT_RUN
        .find_iter(&text)
        .find(|m| m.as_str().len() == MOBILE_LEN)
    {
        return Some(run.as_str().to_string());
    }

    let digits = all_digits(&text);
    let digits = match digits.len() {
        12 if digits.starts_with("91") => &digits[2..],
        11 if digits.starts_with('0') => &digits[1..],
        _ => digits.as_str(),
    };
    let truncated: String = digits.chars().take(MOBILE_LEN).collect();
    (truncated.len() == MOBILE_LEN).then_some(truncated)
}

pub fn extract_aadhar(transcript: &str) -> Option<String> {
    let text = normalize_digits(transcript);
    if let Some(m) = AADHAR_GROUPED.find(&text) {
        return Some(all_digits(m.as_str()));
    }

    let truncated: String = all_digits(&text).chars().take(AADHAR_LEN).collect();
    (truncated.len() == AADHAR_LEN).then_some(truncated)
}

pub fn extract_bank_account(transcript: &str) -> Option<String> {
    let text = normalize_digits(transcript);
    if let Some(run) = DIGIT_RUN
        .find_iter(&text)
        .find(|m| BANK_ACCOUNT_LEN.contains(&m.as_str().len()))
    {
        return Some(run.as_str().to_string());
    }

    let digits = all_digits(&text);
    BANK_ACCOUNT_LEN.contains(&digits.len()).then_some(digits)
}

pub fn extract_ifsc(transcript: &str) -> Option<String> {
    let upper = normalize_digits(transcript).to_uppercase();
    if let Some(m) = IFSC_TOKEN.find(&upper) {
        return Some(m.as_str().to_string());
    }
    let squashed: String = upper
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    IFSC_ANYWHERE
        .find(&squashed)
        .map(|m| m.as_str().to_string())
}

pub fn extract_number(transcript: &str) -> Option<String> {
    let text = normalize_digits(transcript);
    let caps = NUMBER_WITH_UNIT.captures(&text)?;
    let number = caps.get(1)?.as_str().replace(',', "");
    let number = number.trim_end_matches('.');
    if number.is_empty() {
        return None;
    }
    match caps.get(2) {
        Some(unit) => Some(format!("{} {}", number, unit.as_str().to_lowercase())),
        None => Some(number.to_string()),
    }
}

fn is_edge_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | '!' | '?' | ';' | ':' | '।' | '"' | '\'' | '(' | ')'
    )
}

fn is_filler(word: &str, language: Language) -> bool {
    if FILLER_EN.contains(word) {
        return true;
    }
    match language {
        Language::En => false,
        Language::Hi => FILLER_HI.contains(word),
        Language::Gu => FILLER_GU.contains(word),
    }
}

/// Whether `word` (already lower-cased, punctuation trimmed) is a command
/// or chit-chat word.
pub fn is_command_word(word: &str) -> bool {
    COMMAND_SET.contains(word)
}

pub fn extract_text(transcript: &str, language: Language) -> Option<String> {
    let mut kept: Vec<(&str, String)> = transcript
        .split_whitespace()
        .filter_map(|token| {
            let bare = token.trim_matches(is_edge_punctuation).to_lowercase();
            if bare.is_empty() || is_filler(&bare, language) {
                None
            } else {
                Some((token, bare))
            }
        })
        .collect();

    if kept.iter().any(|(_, bare)| is_command_word(bare)) {
        let is_meta = |bare: &str| is_command_word(bare) || INTERACTION_SET.contains(bare);
        let content: usize = kept
            .iter()
            .filter(|(_, bare)| !is_meta(bare.as_str()))
            .map(|(_, bare)| bare.chars().filter(|c| c.is_alphanumeric()).count())
            .sum();
        if content < MIN_TEXT_LEN {
            return None;
        }
        // "No, it's Rajesh" → "Rajesh"
        let leading = kept
            .iter()
            .take_while(|(_, bare)| is_meta(bare.as_str()))
            .count();
        kept.drain(..leading);
    }

    let cleaned = kept
        .iter()
        .map(|(token, _)| *token)
        .collect::<Vec<_>>()
        .join(" ");
    let cleaned = cleaned.trim_matches(is_edge_punctuation).trim().to_string();

    if cleaned.chars().count() < MIN_TEXT_LEN || !cleaned.chars().any(char::is_alphanumeric) {
        return None;
    }
    Some(cleaned)
}
