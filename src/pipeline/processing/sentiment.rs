use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Polarity and subjectivity for one text
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SentimentScore {
    /// -1.0 (negative) to 1.0 (positive)
    pub polarity: f64,
    /// 0.0 (objective) to 1.0 (opinionated)
    pub subjectivity: f64,
}

/// Trait for the sentiment resource used by the analyzer
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentScore;
}

/// Lexicon entry for a single word
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WordScore {
    pub polarity: f64,
    pub subjectivity: f64,
}

/// On-disk lexicon layout (`lexicon.json` in the model directory)
#[derive(Debug, Clone, Deserialize)]
pub struct LexiconFile {
    pub words: HashMap<String, WordScore>,
    #[serde(default)]
    pub intensifiers: HashMap<String, f64>,
    #[serde(default)]
    pub negations: Vec<String>,
}

/// Lexicon-based sentiment model.
///
/// Each lexicon word found in the text is one assessment. An intensifier
/// directly before a word scales both of its scores; a negation within
/// `negation_window` tokens before it flips and halves its polarity. The
/// text score is the mean over assessments, or zero when nothing matched.
#[derive(Debug, Clone)]
pub struct LexiconSentiment {
    words: HashMap<String, WordScore>,
    intensifiers: HashMap<String, f64>,
    negations: HashSet<String>,
    negation_window: usize,
}

const NEGATION_FACTOR: f64 = -0.5;

impl LexiconSentiment {
    pub fn from_lexicon(lexicon: LexiconFile) -> Result<Self, String> {
        for (word, score) in &lexicon.words {
            if !(-1.0..=1.0).contains(&score.polarity) || !(0.0..=1.0).contains(&score.subjectivity) {
                return Err(format!(
                    "lexicon entry '{}' out of range (polarity {}, subjectivity {})",
                    word, score.polarity, score.subjectivity
                ));
            }
        }
        for (word, factor) in &lexicon.intensifiers {
            if !factor.is_finite() || *factor <= 0.0 {
                return Err(format!("intensifier '{}' has invalid factor {}", word, factor));
            }
        }

        Ok(Self {
            words: lexicon
                .words
                .into_iter()
                .map(|(w, s)| (w.to_lowercase(), s))
                .collect(),
            intensifiers: lexicon
                .intensifiers
                .into_iter()
                .map(|(w, f)| (w.to_lowercase(), f))
                .collect(),
            negations: lexicon.negations.into_iter().map(|w| w.to_lowercase()).collect(),
            negation_window: 3,
        })
    }

    /// The built-in general-purpose English lexicon
    pub fn builtin() -> Self {
        let words = BUILTIN_WORDS
            .iter()
            .map(|(w, p, s)| (w.to_string(), WordScore { polarity: *p, subjectivity: *s }))
            .collect();
        let intensifiers = BUILTIN_INTENSIFIERS
            .iter()
            .map(|(w, f)| (w.to_string(), *f))
            .collect();
        let negations = BUILTIN_NEGATIONS.iter().map(|w| w.to_string()).collect();

        Self {
            words,
            intensifiers,
            negations,
            negation_window: 3,
        }
    }

    fn is_negation(&self, token: &str) -> bool {
        self.negations.contains(token) || token.ends_with("n't")
    }
}

impl SentimentScorer for LexiconSentiment {
    fn score(&self, text: &str) -> SentimentScore {
        let tokens = tokenize(text);

        let mut polarity_sum = 0.0;
        let mut subjectivity_sum = 0.0;
        let mut assessments = 0usize;
        let mut last_negation: Option<usize> = None;
        let mut pending_intensity: Option<(usize, f64)> = None;

        for (i, token) in tokens.iter().enumerate() {
            if self.is_negation(token) {
                last_negation = Some(i);
                continue;
            }
            if let Some(factor) = self.intensifiers.get(token.as_str()) {
                pending_intensity = Some((i, *factor));
                continue;
            }
            let Some(entry) = self.words.get(token.as_str()) else {
                continue;
            };

            let mut polarity = entry.polarity;
            let mut subjectivity = entry.subjectivity;

            if let Some((at, factor)) = pending_intensity.take() {
                if at + 1 == i {
                    polarity = (polarity * factor).clamp(-1.0, 1.0);
                    subjectivity = (subjectivity * factor).clamp(0.0, 1.0);
                }
            }
            if let Some(at) = last_negation {
                if i - at <= self.negation_window {
                    polarity *= NEGATION_FACTOR;
                }
            }

            polarity_sum += polarity;
            subjectivity_sum += subjectivity;
            assessments += 1;
        }

        if assessments == 0 {
            return SentimentScore::default();
        }

        let n = assessments as f64;
        SentimentScore {
            polarity: (polarity_sum / n).clamp(-1.0, 1.0),
            subjectivity: (subjectivity_sum / n).clamp(0.0, 1.0),
        }
    }
}

/// Lowercased runs of alphanumerics and apostrophes
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| t.replace('\u{2019}', "'").to_lowercase())
        .collect()
}

const BUILTIN_NEGATIONS: &[&str] = &["not", "no", "never", "nor", "cannot", "without"];

const BUILTIN_INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.2),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("super", 1.4),
    ("totally", 1.3),
    ("absolutely", 1.4),
    ("pretty", 1.1),
    ("quite", 1.1),
    ("slightly", 0.6),
    ("somewhat", 0.7),
    ("barely", 0.5),
];

// (word, polarity, subjectivity)
const BUILTIN_WORDS: &[(&str, f64, f64)] = &[
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("excellent", 1.0, 1.0),
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("wonderful", 1.0, 1.0),
    ("fantastic", 0.4, 0.9),
    ("brilliant", 0.9, 1.0),
    ("perfect", 1.0, 1.0),
    ("impressive", 1.0, 1.0),
    ("beautiful", 0.85, 1.0),
    ("nice", 0.6, 1.0),
    ("cool", 0.35, 0.65),
    ("fun", 0.3, 0.2),
    ("funny", 0.25, 1.0),
    ("happy", 0.8, 1.0),
    ("glad", 0.5, 1.0),
    ("love", 0.5, 0.6),
    ("loved", 0.7, 0.8),
    ("favorite", 0.5, 1.0),
    ("interesting", 0.5, 0.5),
    ("important", 0.4, 1.0),
    ("easy", 0.433, 0.833),
    ("fine", 0.417, 0.5),
    ("okay", 0.5, 0.5),
    ("ok", 0.5, 0.5),
    ("safe", 0.5, 0.5),
    ("free", 0.4, 0.8),
    ("true", 0.35, 0.65),
    ("right", 0.286, 0.536),
    ("new", 0.136, 0.455),
    ("real", 0.2, 0.3),
    ("huge", 0.4, 0.9),
    ("lol", 0.8, 0.7),
    ("thanks", 0.2, 0.2),
    ("helpful", 0.5, 0.5),
    ("bad", -0.7, 0.667),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("terrible", -1.0, 1.0),
    ("horrible", -1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("poor", -0.4, 0.6),
    ("sad", -0.5, 1.0),
    ("sorry", -0.5, 1.0),
    ("hate", -0.8, 0.9),
    ("angry", -0.5, 1.0),
    ("annoying", -0.8, 0.9),
    ("boring", -1.0, 1.0),
    ("stupid", -0.8, 1.0),
    ("dumb", -0.375, 0.5),
    ("ugly", -0.7, 1.0),
    ("wrong", -0.5, 0.9),
    ("weird", -0.5, 1.0),
    ("crazy", -0.6, 0.9),
    ("ridiculous", -0.333, 1.0),
    ("useless", -0.5, 0.0),
    ("disappointing", -0.6, 0.7),
    ("dangerous", -0.6, 0.9),
    ("hard", -0.292, 0.542),
    ("small", -0.25, 0.4),
    ("broken", -0.4, 0.4),
    ("fake", -0.5, 1.0),
    ("scam", -0.8, 0.9),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LexiconSentiment {
        LexiconSentiment::builtin()
    }

    #[test]
    fn empty_and_neutral_text_score_zero() {
        assert_eq!(model().score(""), SentimentScore::default());
        assert_eq!(model().score("The train leaves at noon."), SentimentScore::default());
    }

    #[test]
    fn scores_are_averaged_over_assessments() {
        let score = model().score("good and bad");
        assert!((score.polarity - 0.0).abs() < 1e-9);
        assert!((score.subjectivity - (0.6 + 0.667) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn negation_flips_and_halves_polarity() {
        let score = model().score("This is not good");
        assert!((score.polarity - (-0.35)).abs() < 1e-9);

        let score = model().score("it isn't great");
        assert!((score.polarity - (-0.4)).abs() < 1e-9);
    }

    #[test]
    fn negation_outside_window_is_ignored() {
        let score = model().score("not that this one is really ever good");
        assert!(score.polarity > 0.0);
    }

    #[test]
    fn intensifier_only_applies_to_adjacent_word() {
        let plain = model().score("good");
        let boosted = model().score("very good");
        assert!(boosted.polarity > plain.polarity);
        assert!((boosted.polarity - 0.91).abs() < 1e-9);

        let detached = model().score("very much good");
        assert_eq!(detached, plain);
    }

    #[test]
    fn scores_stay_in_range() {
        let score = model().score("extremely awesome extremely perfect!!!");
        assert!(score.polarity <= 1.0);
        assert!(score.subjectivity <= 1.0);

        let score = model().score("extremely terrible");
        assert!(score.polarity >= -1.0);
    }

    #[test]
    fn out_of_range_lexicon_is_rejected() {
        let lexicon = LexiconFile {
            words: HashMap::from([(
                "good".to_string(),
                WordScore { polarity: 2.0, subjectivity: 0.5 },
            )]),
            intensifiers: HashMap::new(),
            negations: Vec::new(),
        };
        assert!(LexiconSentiment::from_lexicon(lexicon).is_err());
    }

    #[test]
    fn tokenizer_keeps_contractions() {
        assert_eq!(tokenize("Don't STOP—now!"), vec!["don't", "stop", "now"]);
    }
}
