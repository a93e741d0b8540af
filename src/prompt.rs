/// Generate the prompt asking the model to list every stock mention in a podcast transcript
pub fn extraction_prompt(transcript: &str, format_instructions: &str) -> String {
    format!(
        r#"You are an expert financial analyst. Your task is to identify all mentions of publicly traded companies and their stock tickers from the following podcast transcript.
Provide a list of all mentions you find.

For each mention:
- Give the company's full name and its stock ticker
- Estimate the time in seconds at which it is mentioned in the audio
- Judge the speakers' sentiment toward the stock
- Quote the surrounding transcript text verbatim

{format_instructions}

Here is the podcast transcript:
---
{transcript}
---
"#,
        format_instructions = format_instructions,
        transcript = transcript
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_transcript_and_instructions() {
        let prompt = extraction_prompt("NVIDIA is just on a tear.", "RETURN JSON");
        assert!(prompt.contains("---\nNVIDIA is just on a tear.\n---"));
        assert!(prompt.contains("RETURN JSON"));
        assert!(prompt.contains("publicly traded companies"));
    }

    #[test]
    fn test_instructions_precede_transcript() {
        let prompt = extraction_prompt("TRANSCRIPT BODY", "FORMAT RULES");
        let rules = prompt.find("FORMAT RULES").unwrap();
        let body = prompt.find("TRANSCRIPT BODY").unwrap();
        assert!(rules < body);
    }
}
