use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentiment expressed toward a mentioned stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Neutral => "NEUTRAL",
            Sentiment::Negative => "NEGATIVE",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Only the exact upper-case literals are accepted.
impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sentiment::ALL
            .into_iter()
            .find(|sentiment| sentiment.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "expected one of POSITIVE, NEUTRAL, NEGATIVE, got {:?}",
                    s
                )
            })
    }
}

/// One reference to a publicly traded company found in a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MentionRecord {
    /// Full company name, e.g. "NVIDIA Corporation"
    #[schemars(length(min = 1))]
    pub company_name: String,

    /// Exchange ticker, e.g. "NVDA"
    #[schemars(length(min = 1, max = 10))]
    pub stock_ticker: String,

    /// Approximate position in the source audio
    pub timestamp_seconds: u64,

    /// Speaker's stance toward the stock at this mention
    pub sentiment: Sentiment,

    /// Verbatim transcript excerpt around the mention
    #[schemars(length(min = 20))]
    pub context_snippet: String,
}

/// Top-level reply: every mention in transcript order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MentionsList {
    pub mentions: Vec<MentionRecord>,
}

impl MentionsList {
    pub fn new(mentions: Vec<MentionRecord>) -> Self {
        MentionsList { mentions }
    }

    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MentionRecord> {
        self.mentions.iter()
    }

    /// Mentions of one ticker, compared case-insensitively, in transcript order.
    pub fn by_ticker(&self, ticker: &str) -> Vec<&MentionRecord> {
        self.mentions
            .iter()
            .filter(|m| m.stock_ticker.eq_ignore_ascii_case(ticker))
            .collect()
    }
}

impl IntoIterator for MentionsList {
    type Item = MentionRecord;
    type IntoIter = std::vec::IntoIter<MentionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.mentions.into_iter()
    }
}

impl<'a> IntoIterator for &'a MentionsList {
    type Item = &'a MentionRecord;
    type IntoIter = std::slice::Iter<'a, MentionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.mentions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ticker: &str, ts: u64) -> MentionRecord {
        MentionRecord {
            company_name: "Example Corp".to_string(),
            stock_ticker: ticker.to_string(),
            timestamp_seconds: ts,
            sentiment: Sentiment::Neutral,
            context_snippet: "a snippet long enough to pass".to_string(),
        }
    }

    #[test]
    fn test_sentiment_literals() {
        assert_eq!("POSITIVE".parse::<Sentiment>(), Ok(Sentiment::Positive));
        assert_eq!("NEGATIVE".parse::<Sentiment>(), Ok(Sentiment::Negative));
        assert!("positive".parse::<Sentiment>().is_err());
        assert!("BULLISH".parse::<Sentiment>().is_err());
        assert_eq!(Sentiment::Neutral.to_string(), "NEUTRAL");
    }

    #[test]
    fn test_sentiment_serializes_upper_case() {
        let json = serde_json::to_string(&Sentiment::Positive).unwrap();
        assert_eq!(json, "\"POSITIVE\"");
    }

    #[test]
    fn test_by_ticker_keeps_duplicates_in_order() {
        let list = MentionsList::new(vec![record("NVDA", 10), record("AAPL", 20), record("nvda", 30)]);
        let nvda: Vec<u64> = list.by_ticker("NVDA").iter().map(|m| m.timestamp_seconds).collect();
        assert_eq!(nvda, vec![10, 30]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_generated_schema_describes_every_field() {
        let schema = serde_json::to_value(schemars::schema_for!(MentionsList)).unwrap();
        let properties = &schema["definitions"]["MentionRecord"]["properties"];
        for field in [
            "company_name",
            "stock_ticker",
            "timestamp_seconds",
            "sentiment",
            "context_snippet",
        ] {
            assert!(
                properties[field]["description"].is_string(),
                "{} has no description",
                field
            );
        }
        assert_eq!(
            properties["stock_ticker"]["description"],
            "Exchange ticker, e.g. \"NVDA\""
        );
    }
}
