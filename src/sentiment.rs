//! Lexicon polarity scoring for cleaned article text.

use std::collections::HashMap;

const NORMALIZATION_ALPHA: f64 = 15.0;
const NEGATION_SCALAR: f64 = -0.74;
const NEGATION_LOOKBACK: usize = 3;

const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "without", "cannot",
    "dont", "doesnt", "didnt", "isnt", "wasnt", "arent", "wont", "hardly",
];

const VALENCES: &[(&str, f64)] = &[
    ("agreement", 1.6),
    ("achieve", 1.8),
    ("benefit", 2.0),
    ("breakthrough", 2.4),
    ("celebrate", 2.7),
    ("clean", 1.7),
    ("commitment", 1.3),
    ("cooperation", 1.6),
    ("effective", 2.1),
    ("encouraging", 2.2),
    ("good", 1.9),
    ("great", 3.1),
    ("hope", 1.9),
    ("improve", 1.9),
    ("innovation", 1.6),
    ("optimistic", 2.3),
    ("progress", 1.8),
    ("protect", 1.6),
    ("recovery", 1.5),
    ("renewable", 1.2),
    ("resilient", 1.6),
    ("success", 2.7),
    ("support", 1.7),
    ("sustainable", 1.5),
    ("welcome", 2.0),
    ("win", 2.8),
    ("alarming", -2.3),
    ("catastrophe", -3.4),
    ("catastrophic", -3.3),
    ("crisis", -3.1),
    ("damage", -2.2),
    ("danger", -2.4),
    ("dead", -3.3),
    ("death", -2.9),
    ("destroy", -2.9),
    ("devastating", -3.1),
    ("disaster", -3.1),
    ("drought", -2.0),
    ("emergency", -2.1),
    ("fail", -2.5),
    ("failure", -2.3),
    ("fear", -2.2),
    ("flood", -1.8),
    ("harm", -2.5),
    ("kill", -3.7),
    ("killed", -3.5),
    ("loss", -1.3),
    ("pollution", -1.9),
    ("risk", -1.1),
    ("threat", -2.4),
    ("toxic", -2.5),
    ("victims", -2.6),
    ("war", -2.9),
    ("warning", -1.4),
    ("worse", -2.1),
    ("worst", -3.1),
];

pub trait SentimentScorer: Send + Sync {
    /// Polarity of `text` in `[-1, 1]`.
    fn polarity(&self, text: &str) -> f64;
}

/// Fixed-lexicon scorer: summed word valences, negated when a negator sits
/// within the previous three tokens, squashed by `s / sqrt(s^2 + 15)`.
pub struct LexiconSentiment {
    valences: HashMap<String, f64>,
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self {
            valences: VALENCES
                .iter()
                .map(|(word, valence)| ((*word).to_string(), *valence))
                .collect(),
        }
    }
}

impl SentimentScorer for LexiconSentiment {
    fn polarity(&self, text: &str) -> f64 {
        let tokens = text.split_whitespace().collect::<Vec<&str>>();
        let mut total = 0.0_f64;

        for (index, token) in tokens.iter().enumerate() {
            let Some(valence) = self.valences.get(*token) else {
                continue;
            };
            let window_start = index.saturating_sub(NEGATION_LOOKBACK);
            let negated = tokens[window_start..index]
                .iter()
                .any(|previous| NEGATORS.contains(previous));
            total += if negated {
                valence * NEGATION_SCALAR
            } else {
                *valence
            };
        }

        normalize(total)
    }
}

fn normalize(score: f64) -> f64 {
    if score == 0.0 {
        return 0.0;
    }
    (score / (score * score + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_of_neutral_text_is_zero() {
        let scorer = LexiconSentiment::default();
        assert_eq!(scorer.polarity(""), 0.0);
        assert_eq!(scorer.polarity("the committee met on tuesday"), 0.0);
    }

    #[test]
    fn polarity_follows_lexicon_sign() {
        let scorer = LexiconSentiment::default();
        assert!(scorer.polarity("a great success for renewable energy") > 0.5);
        assert!(scorer.polarity("the drought was a devastating disaster") < -0.5);
    }

    #[test]
    fn negation_flips_and_dampens_valence() {
        let scorer = LexiconSentiment::default();
        let plain = scorer.polarity("the summit was a success");
        let negated = scorer.polarity("the summit was not a success");
        assert!(plain > 0.0);
        assert!(negated < 0.0);
        assert!(negated.abs() < plain.abs());
    }

    #[test]
    fn polarity_stays_within_unit_interval() {
        let scorer = LexiconSentiment::default();
        let extreme = "catastrophe ".repeat(500);
        let score = scorer.polarity(&extreme);
        assert!((-1.0..=1.0).contains(&score));
        assert!(score < -0.99);
    }
}
