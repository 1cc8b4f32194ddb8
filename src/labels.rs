//! The service's three-value sentiment vocabulary and the table that maps a
//! model's native labels onto it.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl SentimentLabel {
    /// Maps a raw model label onto the service vocabulary.
    ///
    /// Both semantic names (`positive`, any case) and positional codes
    /// (`LABEL_0` negative, `LABEL_1` neutral, `LABEL_2` positive) are
    /// understood. Anything else is neutral.
    pub fn from_model_label(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "POSITIVE" | "LABEL_2" => SentimentLabel::Positive,
            "NEGATIVE" | "LABEL_0" => SentimentLabel::Negative,
            "NEUTRAL" | "LABEL_1" => SentimentLabel::Neutral,
            _ => SentimentLabel::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_labels_map_case_insensitively() {
        for (raw, expected) in [
            ("positive", SentimentLabel::Positive),
            ("Positive", SentimentLabel::Positive),
            ("POSITIVE", SentimentLabel::Positive),
            ("negative", SentimentLabel::Negative),
            ("NeGaTiVe", SentimentLabel::Negative),
            ("neutral", SentimentLabel::Neutral),
        ] {
            assert_eq!(SentimentLabel::from_model_label(raw), expected, "{raw}");
        }
    }

    #[test]
    fn positional_codes_follow_negative_neutral_positive_order() {
        assert_eq!(SentimentLabel::from_model_label("LABEL_0"), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_model_label("LABEL_1"), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_model_label("LABEL_2"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_model_label("label_2"), SentimentLabel::Positive);
    }

    #[test]
    fn unknown_labels_default_to_neutral() {
        for raw in ["UNKNOWN_TAG", "LABEL_3", "", " positive", "joy"] {
            assert_eq!(SentimentLabel::from_model_label(raw), SentimentLabel::Neutral, "{raw:?}");
        }
    }

    #[test]
    fn serializes_as_uppercase_name() {
        let json = serde_json::to_string(&SentimentLabel::Negative).unwrap();
        assert_eq!(json, r#""NEGATIVE""#);
        assert_eq!(SentimentLabel::Positive.to_string(), "POSITIVE");
        assert_eq!(SentimentLabel::default(), SentimentLabel::Neutral);
    }
}
