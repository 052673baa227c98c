use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

use crate::types::Entity;

/// Trait for the entity-recognition resource used by the analyzer.
///
/// Implementations return entities in document order without
/// deduplication.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Vec<Entity>;
}

/// On-disk gazetteer layout (`gazetteer.json` in the model directory):
/// surface form -> label
#[derive(Debug, Clone, Deserialize)]
pub struct GazetteerFile {
    pub entries: HashMap<String, String>,
}

struct PatternRule {
    label: &'static str,
    regex: Regex,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Found {
    span: Span,
    label: String,
}

/// Entity recognizer built from three passes over the text:
/// 1. regex rules for numeric, temporal and monetary expressions
/// 2. a case-sensitive gazetteer, longest phrase first
/// 3. runs of capitalized words nothing else claimed, labelled with the
///    fallback label (or PERSON after an honorific)
pub struct RuleBasedRecognizer {
    rules: Vec<PatternRule>,
    gazetteer: HashMap<String, String>,
    max_phrase_tokens: usize,
    fallback_label: String,
}

impl RuleBasedRecognizer {
    pub fn new(gazetteer: GazetteerFile, fallback_label: &str) -> Result<Self, String> {
        let mut entries = HashMap::with_capacity(gazetteer.entries.len());
        let mut max_phrase_tokens = 1;
        for (surface, label) in gazetteer.entries {
            let surface = surface.trim().to_string();
            let label = label.trim().to_string();
            if surface.is_empty() || label.is_empty() {
                return Err(format!("gazetteer entry '{}' -> '{}' is incomplete", surface, label));
            }
            let phrase_tokens = word_tokens(&surface).len();
            if phrase_tokens == 0 {
                return Err(format!("gazetteer entry '{}' has no word characters", surface));
            }
            max_phrase_tokens = max_phrase_tokens.max(phrase_tokens);
            entries.insert(surface, label);
        }

        Ok(Self {
            rules: compile_rules()?,
            gazetteer: entries,
            max_phrase_tokens,
            fallback_label: fallback_label.to_string(),
        })
    }

    /// Recognizer with the built-in gazetteer
    pub fn builtin(fallback_label: &str) -> Result<Self, String> {
        let entries = BUILTIN_GAZETTEER
            .iter()
            .map(|(surface, label)| (surface.to_string(), label.to_string()))
            .collect();
        Self::new(GazetteerFile { entries }, fallback_label)
    }

    fn pattern_pass(&self, text: &str) -> Vec<Found> {
        let mut candidates: Vec<Found> = self
            .rules
            .iter()
            .flat_map(|rule| {
                rule.regex.find_iter(text).map(move |m| Found {
                    span: Span { start: m.start(), end: m.end() },
                    label: rule.label.to_string(),
                })
            })
            .collect();

        // earlier start wins, then the longer match
        candidates.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then((b.span.end - b.span.start).cmp(&(a.span.end - a.span.start)))
        });

        let mut accepted: Vec<Found> = Vec::new();
        for candidate in candidates {
            let overlaps = accepted
                .last()
                .map(|last| candidate.span.start < last.span.end)
                .unwrap_or(false);
            if !overlaps {
                accepted.push(candidate);
            }
        }
        accepted
    }

    fn gazetteer_pass(&self, text: &str, tokens: &[Span], claimed: &mut [bool]) -> Vec<Found> {
        let mut found = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if claimed[i] {
                i += 1;
                continue;
            }
            let last = (i + self.max_phrase_tokens).min(tokens.len());
            let mut matched = None;
            for j in (i..last).rev() {
                if claimed[i..=j].iter().any(|c| *c) {
                    continue;
                }
                let phrase = &text[tokens[i].start..tokens[j].end];
                if let Some(label) = self.gazetteer.get(phrase) {
                    matched = Some((j, label.clone()));
                    break;
                }
            }
            match matched {
                Some((j, label)) => {
                    claimed[i..=j].iter_mut().for_each(|c| *c = true);
                    found.push(Found {
                        span: Span { start: tokens[i].start, end: tokens[j].end },
                        label,
                    });
                    i = j + 1;
                }
                None => i += 1,
            }
        }
        found
    }

    fn proper_noun_pass(&self, text: &str, tokens: &[Span], claimed: &[bool]) -> Vec<Found> {
        let mut found = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if claimed[i] || !is_capitalized(&text[tokens[i].start..tokens[i].end]) {
                i += 1;
                continue;
            }

            // extend over capitalized tokens separated only by spaces
            let mut j = i;
            while j + 1 < tokens.len()
                && !claimed[j + 1]
                && is_capitalized(&text[tokens[j + 1].start..tokens[j + 1].end])
                && is_inline_gap(&text[tokens[j].end..tokens[j + 1].start])
            {
                j += 1;
            }

            let mut first = i;
            let mut last = j;
            while first <= last && is_stopword(&text[tokens[first].start..tokens[first].end]) {
                first += 1;
            }
            while last > first && is_stopword(&text[tokens[last].start..tokens[last].end]) {
                last -= 1;
            }

            // a lone capitalized word opening a sentence is usually just a word
            let lone_opener = first == i && first == last && starts_sentence(text, tokens, first);

            if first <= last && !lone_opener {
                let label = if first > 0 && follows_honorific(text, tokens[first - 1], tokens[first]) {
                    "PERSON".to_string()
                } else {
                    self.fallback_label.clone()
                };
                found.push(Found {
                    span: Span { start: tokens[first].start, end: tokens[last].end },
                    label,
                });
            }
            i = j + 1;
        }
        found
    }
}

impl EntityRecognizer for RuleBasedRecognizer {
    fn recognize(&self, text: &str) -> Vec<Entity> {
        let mut found = self.pattern_pass(text);

        let tokens = word_tokens(text);
        let mut claimed = claimed_tokens(&tokens, &found);

        found.extend(self.gazetteer_pass(text, &tokens, &mut claimed));
        found.extend(self.proper_noun_pass(text, &tokens, &claimed));

        found.sort_by_key(|f| f.span.start);
        found
            .into_iter()
            .map(|f| Entity::new(&text[f.span.start..f.span.end], f.label))
            .collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '\'' | '\u{2019}' | '-' | '&')
}

fn is_edge_punct(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '-' | '&')
}

/// Word spans with surrounding punctuation and possessive `'s` removed
fn word_tokens(text: &str) -> Vec<Span> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    let push = |s: usize, e: usize, tokens: &mut Vec<Span>| {
        let raw = &text[s..e];
        let mut word = raw.trim_start_matches(is_edge_punct);
        let s = s + (raw.len() - word.len());
        for suffix in ["'s", "\u{2019}s"] {
            if let Some(stripped) = word.strip_suffix(suffix) {
                word = stripped;
                break;
            }
        }
        let word = word.trim_end_matches(is_edge_punct);
        if !word.is_empty() {
            tokens.push(Span { start: s, end: s + word.len() });
        }
    };

    for (i, c) in text.char_indices() {
        if is_word_char(c) {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            push(s, i, &mut tokens);
        }
    }
    if let Some(s) = start {
        push(s, text.len(), &mut tokens);
    }
    tokens
}

/// Marks tokens that overlap an already accepted (sorted, disjoint) span
fn claimed_tokens(tokens: &[Span], found: &[Found]) -> Vec<bool> {
    let mut claimed = vec![false; tokens.len()];
    let mut k = 0;
    for (i, token) in tokens.iter().enumerate() {
        while k < found.len() && found[k].span.end <= token.start {
            k += 1;
        }
        if k < found.len() && found[k].span.start < token.end {
            claimed[i] = true;
        }
    }
    claimed
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

fn is_inline_gap(gap: &str) -> bool {
    !gap.is_empty() && gap.chars().all(|c| c == ' ' || c == '\t')
}

fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.contains(&lower.as_str()) || HONORIFICS.contains(&lower.as_str())
}

fn starts_sentence(text: &str, tokens: &[Span], index: usize) -> bool {
    if index == 0 {
        return true;
    }
    let prev = tokens[index - 1];
    if HONORIFICS.contains(&text[prev.start..prev.end].to_lowercase().as_str()) {
        return false;
    }
    text[prev.end..tokens[index].start]
        .chars()
        .any(|c| matches!(c, '.' | '!' | '?' | '\n'))
}

fn follows_honorific(text: &str, prev: Span, current: Span) -> bool {
    let prev_word = text[prev.start..prev.end].to_lowercase();
    let gap = &text[prev.end..current.start];
    HONORIFICS.contains(&prev_word.as_str()) && matches!(gap, " " | ". " | ".")
}

fn compile_rules() -> Result<Vec<PatternRule>, String> {
    pattern_sources()
        .into_iter()
        .map(|(label, pattern)| {
            Regex::new(&pattern)
                .map(|regex| PatternRule { label, regex })
                .map_err(|e| format!("invalid {} pattern: {}", label, e))
        })
        .collect()
}

const MONTH: &str = r"(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)";

fn pattern_sources() -> Vec<(&'static str, String)> {
    vec![
        (
            "MONEY",
            r"[$€£¥]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?i:k|bn|million|billion|thousand)\b)?|\b\d[\d,]*(?:\.\d+)?\s?(?i:dollars?|bucks|euros?|cents?|usd|eur|gbp)\b".to_string(),
        ),
        (
            "PERCENT",
            r"\b\d+(?:\.\d+)?(?:\s?%|\s?(?i:percent|per cent)\b)".to_string(),
        ),
        (
            "TIME",
            r"\b(?:[01]?\d|2[0-3]):[0-5]\d(?:\s?(?i:[ap]m\b|[ap]\.m\.))?|\b(?:1[0-2]|0?[1-9])\s?(?i:[ap]m\b|[ap]\.m\.)|\b(?i:noon|midnight|tonight|this (?:morning|afternoon|evening))\b".to_string(),
        ),
        (
            "DATE",
            format!(
                r"\b{m}\b(?:\s+\d{{1,2}}(?:st|nd|rd|th)?)?(?:,?\s+\d{{4}})?|\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?{m}\b(?:,?\s+\d{{4}})?|\b(?:Mon|Tues|Wednes|Thurs|Fri|Satur|Sun)day\b|\b\d{{4}}-\d{{2}}-\d{{2}}\b|\b\d{{1,2}}/\d{{1,2}}/\d{{2,4}}\b|\b(?:19|20)\d0s\b|\b(?i:today|yesterday|tomorrow|(?:last|next|this) (?:week|month|year|weekend))\b",
                m = MONTH
            ),
        ),
        (
            "QUANTITY",
            r"\b\d+(?:\.\d+)?\s?(?i:kg|kilograms?|grams?|lbs?|pounds|km|kilometers?|kilometres?|miles?|meters?|metres?|feet|foot|ft|inches|inch|tons?|liters?|litres?|gallons?|mph|gb|mb|tb)\b".to_string(),
        ),
        (
            "ORDINAL",
            r"\b\d+(?i:st|nd|rd|th)\b|\b(?i:first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|eleventh|twelfth|twentieth|hundredth)\b".to_string(),
        ),
        (
            "CARDINAL",
            r"\b\d[\d,]*(?:\.\d+)?\b|\b(?i:zero|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|dozen|hundred|thousand|million|billion)\b".to_string(),
        ),
    ]
}

const HONORIFICS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sir", "president", "senator", "governor",
];

// Capitalized words that start sentences or fill slots without naming anything
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "i", "i'm", "i've", "i'd", "i'll", "me", "my", "we", "our", "you", "your",
    "he", "she", "it", "it's", "they", "them", "their", "his", "her", "this", "that", "these",
    "those", "there", "here", "what", "when", "where", "why", "how", "who", "which", "and", "but",
    "or", "so", "if", "then", "because", "in", "on", "at", "for", "from", "with", "to", "of", "by",
    "as", "is", "are", "was", "were", "be", "been", "do", "does", "did", "don't", "can", "can't",
    "will", "would", "should", "could", "just", "also", "not", "no", "yes", "yeah", "yep", "nope",
    "oh", "ok", "okay", "well", "hey", "hi", "hello", "thanks", "thank", "please", "lol", "lmao",
    "omg", "imo", "imho", "edit", "tl", "all", "any", "some", "every", "each", "both", "many",
    "most", "more", "much", "one", "great", "good", "nice", "wow", "sure", "maybe", "still",
    "even", "only", "now", "today", "let", "let's", "go", "get", "got", "see", "look", "love",
    "agreed", "true", "exactly", "honestly", "seriously", "actually",
];

// (surface, label)
const BUILTIN_GAZETTEER: &[(&str, &str)] = &[
    ("Apple", "ORG"),
    ("Google", "ORG"),
    ("Microsoft", "ORG"),
    ("Amazon", "ORG"),
    ("Meta", "ORG"),
    ("Facebook", "ORG"),
    ("Twitter", "ORG"),
    ("Reddit", "ORG"),
    ("Tesla", "ORG"),
    ("Netflix", "ORG"),
    ("Nvidia", "ORG"),
    ("NVIDIA", "ORG"),
    ("Intel", "ORG"),
    ("AMD", "ORG"),
    ("IBM", "ORG"),
    ("OpenAI", "ORG"),
    ("Samsung", "ORG"),
    ("Sony", "ORG"),
    ("Nintendo", "ORG"),
    ("Disney", "ORG"),
    ("Walmart", "ORG"),
    ("SpaceX", "ORG"),
    ("NASA", "ORG"),
    ("FBI", "ORG"),
    ("CIA", "ORG"),
    ("NATO", "ORG"),
    ("European Union", "ORG"),
    ("YouTube", "ORG"),
    ("Instagram", "ORG"),
    ("TikTok", "ORG"),
    ("Spotify", "ORG"),
    ("Uber", "ORG"),
    ("iPhone", "PRODUCT"),
    ("iPad", "PRODUCT"),
    ("MacBook", "PRODUCT"),
    ("Android", "PRODUCT"),
    ("Windows", "PRODUCT"),
    ("PlayStation", "PRODUCT"),
    ("Xbox", "PRODUCT"),
    ("ChatGPT", "PRODUCT"),
    ("Germany", "GPE"),
    ("France", "GPE"),
    ("United States", "GPE"),
    ("USA", "GPE"),
    ("UK", "GPE"),
    ("United Kingdom", "GPE"),
    ("China", "GPE"),
    ("Japan", "GPE"),
    ("India", "GPE"),
    ("Canada", "GPE"),
    ("Russia", "GPE"),
    ("Ukraine", "GPE"),
    ("Brazil", "GPE"),
    ("Mexico", "GPE"),
    ("Australia", "GPE"),
    ("Italy", "GPE"),
    ("Spain", "GPE"),
    ("New York", "GPE"),
    ("London", "GPE"),
    ("Paris", "GPE"),
    ("Berlin", "GPE"),
    ("Tokyo", "GPE"),
    ("California", "GPE"),
    ("Texas", "GPE"),
    ("Seattle", "GPE"),
    ("Chicago", "GPE"),
    ("Los Angeles", "GPE"),
    ("San Francisco", "GPE"),
    ("Europe", "LOC"),
    ("Asia", "LOC"),
    ("Africa", "LOC"),
    ("Earth", "LOC"),
    ("Mars", "LOC"),
    ("American", "NORP"),
    ("Americans", "NORP"),
    ("British", "NORP"),
    ("German", "NORP"),
    ("Germans", "NORP"),
    ("French", "NORP"),
    ("Chinese", "NORP"),
    ("Japanese", "NORP"),
    ("Russian", "NORP"),
    ("Russians", "NORP"),
    ("Canadian", "NORP"),
    ("European", "NORP"),
    ("Democrats", "NORP"),
    ("Republicans", "NORP"),
    ("English", "LANGUAGE"),
    ("Spanish", "LANGUAGE"),
    ("Elon Musk", "PERSON"),
    ("Musk", "PERSON"),
    ("Biden", "PERSON"),
    ("Trump", "PERSON"),
    ("Obama", "PERSON"),
    ("Taylor Swift", "PERSON"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> RuleBasedRecognizer {
        RuleBasedRecognizer::builtin("MISC").unwrap()
    }

    fn pairs(entities: &[Entity]) -> Vec<(&str, &str)> {
        entities.iter().map(|e| (e.text.as_str(), e.label.as_str())).collect()
    }

    #[test]
    fn product_launch_sentence() {
        let entities = recognizer().recognize("Apple released the iPhone in September for $999.");
        assert_eq!(
            pairs(&entities),
            vec![
                ("Apple", "ORG"),
                ("iPhone", "PRODUCT"),
                ("September", "DATE"),
                ("$999", "MONEY"),
            ]
        );
    }

    #[test]
    fn numeric_and_temporal_patterns() {
        let entities = recognizer().recognize("The event is happening today at 4pm with 12% off 5 km away.");
        assert_eq!(
            pairs(&entities),
            vec![("today", "DATE"), ("4pm", "TIME"), ("12%", "PERCENT"), ("5 km", "QUANTITY")]
        );
    }

    #[test]
    fn ordinals_and_cardinals() {
        let entities = recognizer().recognize("The top two companies are Google and Microsoft, 1st and 1,000 fans.");
        assert_eq!(
            pairs(&entities),
            vec![
                ("two", "CARDINAL"),
                ("Google", "ORG"),
                ("Microsoft", "ORG"),
                ("1st", "ORDINAL"),
                ("1,000", "CARDINAL"),
            ]
        );
    }

    #[test]
    fn multi_word_gazetteer_entries_win_over_single_words() {
        let entities = recognizer().recognize("Moving from New York to Germany");
        assert_eq!(pairs(&entities), vec![("New York", "GPE"), ("Germany", "GPE")]);
    }

    #[test]
    fn unknown_capitalized_runs_use_fallback_label() {
        let entities = recognizer().recognize("Today Khaleel is learning about data pipelines in Germany.");
        assert_eq!(
            pairs(&entities),
            vec![("Today", "DATE"), ("Khaleel", "MISC"), ("Germany", "GPE")]
        );

        let entities = recognizer().recognize("I met Ada Lovelace yesterday");
        assert_eq!(pairs(&entities), vec![("Ada Lovelace", "MISC"), ("yesterday", "DATE")]);
    }

    #[test]
    fn honorific_marks_person() {
        let entities = recognizer().recognize("We spoke with Dr. Watson about it");
        assert_eq!(pairs(&entities), vec![("Watson", "PERSON")]);
    }

    #[test]
    fn possessives_and_duplicates_are_kept_in_order() {
        let entities = recognizer().recognize("Google's search beats Google Maps? Google!");
        let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts.first(), Some(&"Google"));
        assert_eq!(texts.iter().filter(|t| t.starts_with("Google")).count(), 3);
    }

    #[test]
    fn sentence_openers_are_not_entities() {
        let entities = recognizer().recognize("The weather is nice. Thanks everyone");
        assert!(entities.is_empty(), "{:?}", entities);

        let entities = recognizer().recognize("Moving from New York to Germany");
        assert_eq!(pairs(&entities), vec![("New York", "GPE"), ("Germany", "GPE")]);
    }

    #[test]
    fn empty_text_has_no_entities() {
        assert!(recognizer().recognize("").is_empty());
    }

    #[test]
    fn custom_gazetteer_is_used() {
        let gazetteer = GazetteerFile {
            entries: HashMap::from([("Rust Foundation".to_string(), "ORG".to_string())]),
        };
        let recognizer = RuleBasedRecognizer::new(gazetteer, "MISC").unwrap();
        let entities = recognizer.recognize("Funding from the Rust Foundation");
        assert_eq!(pairs(&entities), vec![("Rust Foundation", "ORG")]);
    }

    #[test]
    fn incomplete_gazetteer_entry_is_rejected() {
        let gazetteer = GazetteerFile {
            entries: HashMap::from([("Acme".to_string(), " ".to_string())]),
        };
        assert!(RuleBasedRecognizer::new(gazetteer, "MISC").is_err());
    }

    #[test]
    fn all_rules_compile() {
        assert_eq!(compile_rules().unwrap().len(), 7);
    }
}
