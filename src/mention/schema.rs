//! Formatting instructions embedded in the extraction prompt.
//!
//! The field table is written out by hand rather than derived from the
//! types, so the text the model sees only changes when this file does.

/// Minimum length of `context_snippet`, in characters.
pub const MIN_SNIPPET_CHARS: usize = 20;

/// Maximum length of `stock_ticker`, in characters.
pub const MAX_TICKER_CHARS: usize = 10;

/// Description of one field of a mention object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub json_type: &'static str,
    pub constraint: &'static str,
    pub description: &'static str,
}

pub const MENTION_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "company_name",
        json_type: "string",
        constraint: "non-empty",
        description: "Full name of the mentioned company, e.g. \"NVIDIA Corporation\"",
    },
    FieldSpec {
        name: "stock_ticker",
        json_type: "string",
        constraint: "1-10 characters, no spaces",
        description: "Stock ticker of the company, e.g. \"NVDA\"",
    },
    FieldSpec {
        name: "timestamp_seconds",
        json_type: "integer",
        constraint: "non-negative",
        description: "Approximate time in the audio, in seconds, when the company is mentioned",
    },
    FieldSpec {
        name: "sentiment",
        json_type: "string",
        constraint: "one of \"POSITIVE\", \"NEUTRAL\", \"NEGATIVE\"",
        description: "Sentiment the speakers express toward the stock",
    },
    FieldSpec {
        name: "context_snippet",
        json_type: "string",
        constraint: "at least 20 characters",
        description: "Verbatim transcript excerpt (1-2 sentences) surrounding the mention",
    },
];

/// Render the reply contract as plain-text instructions for the model.
pub fn describe_schema() -> String {
    let fields = MENTION_FIELDS
        .iter()
        .map(|f| {
            format!(
                "    \"{}\" ({}, {}): {}",
                f.name, f.json_type, f.constraint, f.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"The output must be a single JSON object with exactly one top-level key:
  "mentions" (array, required): every mention found in the transcript, in the order it occurs. Use an empty array when there are none.

Each element of "mentions" is an object with these required fields:
{fields}

The same company may appear several times if it is mentioned at different points.

Example of a well-formed reply:
{{"mentions": [{{"company_name": "NVIDIA Corporation", "stock_ticker": "NVDA", "timestamp_seconds": 95, "sentiment": "POSITIVE", "context_snippet": "NVIDIA is just on a tear. Their stock, NVDA, seems to be unstoppable."}}]}}

Return only the JSON object. Do not wrap it in prose or add commentary."#,
        fields = fields
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_schema_is_deterministic() {
        assert_eq!(describe_schema(), describe_schema());
    }

    #[test]
    fn test_describe_schema_names_every_field() {
        let text = describe_schema();
        for field in MENTION_FIELDS {
            assert!(text.contains(&format!("\"{}\"", field.name)), "{} missing", field.name);
        }
        assert!(text.contains("\"mentions\""));
        assert!(text.contains("\"POSITIVE\", \"NEUTRAL\", \"NEGATIVE\""));
    }
}
