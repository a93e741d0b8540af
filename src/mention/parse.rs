//! Turning a raw model reply into a validated [`MentionsList`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::schema::{MAX_TICKER_CHARS, MIN_SNIPPET_CHARS};
use super::types::{MentionRecord, MentionsList, Sentiment};
use crate::error::{SchemaValidationError, Violation};
use crate::TARGET_EXTRACTION;

static LEADING_THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A\s*<think>.*?</think>").expect("static regex"));

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("static regex"));

/// Parse `raw_text` as a mentions reply.
///
/// The reply is rejected as a whole if any mention breaks a field rule; all
/// violations found are reported together.
pub fn parse(raw_text: &str) -> Result<MentionsList, SchemaValidationError> {
    let value: Value = match serde_json::from_str(raw_text.trim()) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(&unwrap_json_body(raw_text)).map_err(|e| {
            debug!(target: TARGET_EXTRACTION, "Reply is not JSON ({}): {}", e, preview(raw_text));
            SchemaValidationError::Malformed(e.to_string())
        })?,
    };

    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(SchemaValidationError::Malformed(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            )))
        }
    };

    let items = match object.get("mentions") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(SchemaValidationError::Invalid(vec![Violation::top_level(
                "mentions",
                format!("expected an array, found {}", json_type_name(other)),
            )]))
        }
        None => {
            return Err(SchemaValidationError::Invalid(vec![Violation::top_level(
                "mentions",
                "missing",
            )]))
        }
    };

    let mut mentions = Vec::with_capacity(items.len());
    let mut violations = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match item {
            Value::Object(fields) => match validate_mention(fields) {
                Ok(mention) => mentions.push(mention),
                Err(found) => violations.extend(
                    found
                        .into_iter()
                        .map(|(field, reason)| Violation::at(index, field, reason)),
                ),
            },
            other => violations.push(Violation::at(
                index,
                "mention",
                format!("expected an object, found {}", json_type_name(other)),
            )),
        }
    }

    if !violations.is_empty() {
        debug!(target: TARGET_EXTRACTION, "Rejecting reply with {} violation(s)", violations.len());
        return Err(SchemaValidationError::Invalid(violations));
    }

    Ok(MentionsList::new(mentions))
}

/// Strip a leading reasoning block and Markdown fences around the JSON
/// payload. Only used once the reply failed to parse as bare JSON.
fn unwrap_json_body(raw_text: &str) -> String {
    let without_thinking = LEADING_THINK_BLOCK.replace(raw_text, "");
    let text = without_thinking.trim().trim_start_matches('\u{feff}');

    match FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim().to_string(),
        None => text.to_string(),
    }
}

fn validate_mention(fields: &Map<String, Value>) -> Result<MentionRecord, Vec<(&'static str, String)>> {
    let mut errors = Vec::new();

    let company_name = collect(
        &mut errors,
        "company_name",
        required_str(fields, "company_name").and_then(validate_company_name),
    );
    let stock_ticker = collect(
        &mut errors,
        "stock_ticker",
        required_str(fields, "stock_ticker").and_then(validate_ticker),
    );
    let timestamp_seconds = collect(
        &mut errors,
        "timestamp_seconds",
        required(fields, "timestamp_seconds").and_then(validate_timestamp),
    );
    let sentiment = collect(
        &mut errors,
        "sentiment",
        required_str(fields, "sentiment").and_then(validate_sentiment),
    );
    let context_snippet = collect(
        &mut errors,
        "context_snippet",
        required_str(fields, "context_snippet").and_then(validate_snippet),
    );

    match (company_name, stock_ticker, timestamp_seconds, sentiment, context_snippet) {
        (Some(company_name), Some(stock_ticker), Some(timestamp_seconds), Some(sentiment), Some(context_snippet))
            if errors.is_empty() =>
        {
            Ok(MentionRecord {
                company_name,
                stock_ticker,
                timestamp_seconds,
                sentiment,
                context_snippet,
            })
        }
        _ => Err(errors),
    }
}

fn collect<T>(
    errors: &mut Vec<(&'static str, String)>,
    field: &'static str,
    result: Result<T, String>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(reason) => {
            errors.push((field, reason));
            None
        }
    }
}

fn required<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<&'a Value, String> {
    match fields.get(name) {
        None | Some(Value::Null) => Err("missing".to_string()),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<&'a str, String> {
    let value = required(fields, name)?;
    value
        .as_str()
        .ok_or_else(|| format!("expected a string, found {}", json_type_name(value)))
}

pub fn validate_company_name(name: &str) -> Result<String, String> {
    if name.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(name.to_string())
}

pub fn validate_ticker(ticker: &str) -> Result<String, String> {
    let len = ticker.chars().count();
    if len == 0 {
        return Err("must not be empty".to_string());
    }
    if ticker.chars().any(char::is_whitespace) {
        return Err(format!("must not contain whitespace, got {:?}", ticker));
    }
    if len > MAX_TICKER_CHARS {
        return Err(format!(
            "must be at most {} characters, got {}",
            MAX_TICKER_CHARS, len
        ));
    }
    Ok(ticker.to_string())
}

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Accepts integers, integral floats and numeric strings; never clamps.
pub fn validate_timestamp(value: &Value) -> Result<u64, String> {
    match value {
        Value::Number(number) => {
            if let Some(seconds) = number.as_u64() {
                return Ok(seconds);
            }
            if number.as_i64().is_some() {
                return Err(format!("must be non-negative, got {}", number));
            }
            match number.as_f64() {
                Some(f) if f < 0.0 => Err(format!("must be non-negative, got {}", number)),
                Some(f) if f.fract() == 0.0 && f <= MAX_EXACT_FLOAT => Ok(f as u64),
                Some(f) if f.fract() == 0.0 => {
                    Err(format!("is too large to represent exactly, got {}", number))
                }
                _ => Err(format!("expected an integer, got {}", number)),
            }
        }
        Value::String(text) => {
            if let Ok(seconds) = text.parse::<u64>() {
                Ok(seconds)
            } else if text.parse::<i64>().is_ok() {
                Err(format!("must be non-negative, got {:?}", text))
            } else {
                Err(format!("expected an integer, got {:?}", text))
            }
        }
        other => Err(format!("expected an integer, found {}", json_type_name(other))),
    }
}

pub fn validate_sentiment(sentiment: &str) -> Result<Sentiment, String> {
    sentiment.parse()
}

pub fn validate_snippet(snippet: &str) -> Result<String, String> {
    let len = snippet.chars().count();
    if len < MIN_SNIPPET_CHARS {
        return Err(format!(
            "must be at least {} characters, got {}",
            MIN_SNIPPET_CHARS, len
        ));
    }
    Ok(snippet.to_string())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn preview(text: &str) -> String {
    text.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mention(ticker: &str, sentiment: &str, snippet: &str) -> Value {
        json!({
            "company_name": format!("{} Inc.", ticker),
            "stock_ticker": ticker,
            "timestamp_seconds": 42,
            "sentiment": sentiment,
            "context_snippet": snippet,
        })
    }

    fn reply(mentions: Vec<Value>) -> String {
        json!({ "mentions": mentions }).to_string()
    }

    const SNIPPET: &str = "The stock seems to be unstoppable right now.";

    #[test]
    fn test_missing_field_is_rejected() {
        for field in [
            "company_name",
            "stock_ticker",
            "timestamp_seconds",
            "sentiment",
            "context_snippet",
        ] {
            let mut m = mention("NVDA", "POSITIVE", SNIPPET);
            m.as_object_mut().unwrap().remove(field);
            let err = parse(&reply(vec![m])).unwrap_err();
            assert_eq!(
                err.violations(),
                &[Violation::at(0, field, "missing")],
                "field {}",
                field
            );
        }
    }

    #[test]
    fn test_missing_mentions_key_is_rejected() {
        let err = parse(r#"{"results": []}"#).unwrap_err();
        assert_eq!(err.violations(), &[Violation::top_level("mentions", "missing")]);
    }

    #[test]
    fn test_sentiment_outside_enum_is_rejected() {
        for sentiment in ["BULLISH", "positive", "Neutral", "", "MIXED"] {
            let err = parse(&reply(vec![mention("NVDA", sentiment, SNIPPET)])).unwrap_err();
            assert_eq!(err.violations().len(), 1);
            assert_eq!(err.violations()[0].field, "sentiment");
        }
        let err = parse(&reply(vec![json!({
            "company_name": "NVIDIA",
            "stock_ticker": "NVDA",
            "timestamp_seconds": 1,
            "sentiment": 1,
            "context_snippet": SNIPPET,
        })]))
        .unwrap_err();
        assert_eq!(err.violations()[0].field, "sentiment");
    }

    #[test]
    fn test_snippet_length_floor() {
        let nineteen = "a".repeat(19);
        let twenty = "a".repeat(20);

        let err = parse(&reply(vec![mention("NVDA", "NEUTRAL", &nineteen)])).unwrap_err();
        assert_eq!(err.violations()[0].field, "context_snippet");

        let list = parse(&reply(vec![mention("NVDA", "NEUTRAL", &twenty)])).unwrap();
        assert_eq!(list.mentions[0].context_snippet, twenty);
    }

    #[test]
    fn test_snippet_length_counts_characters() {
        // 20 characters, more than 20 bytes
        let snippet = "股票".repeat(10);
        assert!(parse(&reply(vec![mention("2330", "POSITIVE", &snippet)])).is_ok());
        let short = "股票".repeat(9);
        assert!(parse(&reply(vec![mention("2330", "POSITIVE", &short)])).is_err());
    }

    #[test]
    fn test_order_is_preserved() {
        let list = parse(&reply(vec![
            mention("AAA", "POSITIVE", SNIPPET),
            mention("BBB", "NEUTRAL", SNIPPET),
            mention("CCC", "NEGATIVE", SNIPPET),
        ]))
        .unwrap();
        let tickers: Vec<&str> = list.iter().map(|m| m.stock_ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA", "BBB", "CCC"]);
    }

    #[test]
    fn test_empty_mentions_is_not_an_error() {
        let list = parse(r#"{"mentions": []}"#).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_one_bad_record_rejects_the_whole_reply() {
        let err = parse(&reply(vec![
            mention("AAA", "POSITIVE", SNIPPET),
            mention("BBB", "UNSURE", SNIPPET),
            mention("CCC", "NEGATIVE", "too short"),
        ]))
        .unwrap_err();
        let located: Vec<(Option<usize>, &str)> =
            err.violations().iter().map(|v| (v.index, v.field)).collect();
        assert_eq!(
            located,
            vec![(Some(1), "sentiment"), (Some(2), "context_snippet")]
        );
    }

    #[test]
    fn test_prose_is_malformed() {
        let err = parse("I found two companies: NVIDIA and Apple.").unwrap_err();
        assert!(matches!(err, SchemaValidationError::Malformed(_)));

        let err = parse("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, SchemaValidationError::Malformed(_)));
    }

    #[test]
    fn test_fenced_and_thinking_replies_are_unwrapped() {
        let body = reply(vec![mention("NVDA", "POSITIVE", SNIPPET)]);
        let fenced = format!("Here you go:\n```json\n{}\n```\n", body);
        assert_eq!(parse(&fenced).unwrap().len(), 1);

        let thinking = format!("<think>Let me look for tickers.</think>\n{}", body);
        assert_eq!(parse(&thinking).unwrap().len(), 1);
    }

    #[test]
    fn test_bare_reply_is_not_rewritten() {
        let quoted = "NVIDIA <think>long pause</think> is on a tear, buy NVDA";
        let list = parse(&reply(vec![mention("NVDA", "POSITIVE", quoted)])).unwrap();
        assert_eq!(list.mentions[0].context_snippet, quoted);

        let fenced = "They said ```nvda``` twice, ```buy``` it";
        let list = parse(&reply(vec![mention("NVDA", "POSITIVE", fenced)])).unwrap();
        assert_eq!(list.mentions[0].context_snippet, fenced);
    }

    #[test]
    fn test_timestamp_beyond_exact_range_is_rejected() {
        let raw = format!(
            r#"{{"mentions": [{{"company_name": "NVIDIA", "stock_ticker": "NVDA", "timestamp_seconds": 18446744073709551616, "sentiment": "POSITIVE", "context_snippet": "{}"}}]}}"#,
            SNIPPET
        );
        let err = parse(&raw).unwrap_err();
        assert_eq!(err.violations()[0].field, "timestamp_seconds");

        assert!(validate_timestamp(&json!(1e300)).is_err());
        assert_eq!(validate_timestamp(&json!(9_007_199_254_740_992.0)), Ok(9_007_199_254_740_992));
        assert!(validate_timestamp(&json!(9_007_199_254_740_994.0)).is_err());
    }

    #[test]
    fn test_whitespace_is_not_stripped_from_values() {
        let mut m = mention("NVDA", " POSITIVE\n", SNIPPET);
        m["timestamp_seconds"] = json!(" 5 ");
        let err = parse(&reply(vec![m])).unwrap_err();
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["timestamp_seconds", "sentiment"]);
    }

    #[test]
    fn test_timestamp_conversion() {
        assert_eq!(validate_timestamp(&json!(95)), Ok(95));
        assert_eq!(validate_timestamp(&json!("95")), Ok(95));
        assert_eq!(validate_timestamp(&json!(95.0)), Ok(95));
        assert!(validate_timestamp(&json!(-1)).is_err());
        assert!(validate_timestamp(&json!("-1")).is_err());
        assert!(validate_timestamp(&json!(9.5)).is_err());
        assert!(validate_timestamp(&json!("soon")).is_err());
        assert!(validate_timestamp(&json!(true)).is_err());
    }

    #[test]
    fn test_ticker_and_company_rules() {
        assert!(validate_ticker("NVDA").is_ok());
        assert!(validate_ticker("BRK.B").is_ok());
        assert!(validate_ticker("").is_err());
        assert!(validate_ticker("NV DA").is_err());
        assert!(validate_ticker("ABCDEFGHIJK").is_err());
        assert!(validate_company_name("   ").is_err());
        assert!(validate_company_name("Apple Inc.").is_ok());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let mut m = mention("NVDA", "POSITIVE", SNIPPET);
        m["confidence"] = json!(0.9);
        let list = parse(&json!({"mentions": [m], "notes": "none"}).to_string()).unwrap();
        assert_eq!(list.mentions[0].stock_ticker, "NVDA");
    }
}
