use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use prettytable::{Cell, Row as PrettyRow, Table};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use tickertape::llm::ReplayBackend;
use tickertape::logging::configure_logging;
use tickertape::prompt::extraction_prompt;
use tickertape::{
    describe_schema, BackendKind, Extractor, ExtractorConfig, LLMClient, MentionsList, Sentiment,
};

const SAMPLE_TRANSCRIPT: &str = r#"
...so then we were talking about the AI boom, and of course, NVIDIA is just on a tear.
Their stock, NVDA, seems to be unstoppable. I think it's a great long term hold.
On the other hand, some people are still skeptical.
Later in the show, we also touched on Apple's new product launch. I'm not so sure about the Vision Pro.
The market seems hesitant, and the AAPL stock reflects that uncertainty. It's pretty neutral for now.
"#;

#[derive(Parser, Debug)]
#[clap(about = "Find stock mentions in a podcast transcript")]
struct Args {
    /// Transcript file, or "-" for stdin. Uses a built-in sample when omitted
    #[clap(short, long)]
    transcript: Option<PathBuf>,

    /// Completion backend: bedrock, ollama or openai
    #[clap(short, long)]
    backend: Option<BackendKind>,

    /// Model identifier (defaults depend on the backend)
    #[clap(short, long)]
    model: Option<String>,

    /// AWS region for Bedrock
    #[clap(short, long)]
    region: Option<String>,

    /// Sampling temperature
    #[clap(short = 'T', long)]
    temperature: Option<f32>,

    /// Maximum number of tokens the model may generate
    #[clap(long)]
    max_tokens: Option<u32>,

    /// Seconds to wait for the model before giving up
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// Parse a saved model reply instead of calling a model
    #[clap(long)]
    replay: Option<PathBuf>,

    /// Print the rendered prompt and exit
    #[clap(long)]
    print_prompt: bool,

    /// Print the reply formatting instructions and exit
    #[clap(long)]
    print_schema: bool,

    /// Print mentions as JSON instead of a table
    #[clap(short, long)]
    json: bool,

    /// Log prompts and replies to the console
    #[clap(short, long)]
    verbose: bool,
}

/// Environment first, then command-line overrides.
fn build_config(args: &Args) -> Result<ExtractorConfig> {
    let mut config = ExtractorConfig::from_env().context("invalid environment configuration")?;

    if let Some(backend) = args.backend {
        if backend != config.backend {
            config = config.with_backend(backend);
        }
    }
    if let Some(model) = &args.model {
        config.model_id = model.clone();
    }
    if let Some(region) = &args.region {
        config.region = region.clone();
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(max_tokens) = args.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(secs) = args.timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    config.validate()?;
    Ok(config)
}

fn read_transcript(path: Option<&Path>) -> Result<String> {
    match path {
        None => Ok(SAMPLE_TRANSCRIPT.to_string()),
        Some(path) if path == Path::new("-") => {
            let mut transcript = String::new();
            io::stdin()
                .read_to_string(&mut transcript)
                .context("failed to read transcript from stdin")?;
            Ok(transcript)
        }
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript {}", path.display())),
    }
}

fn format_timestamp(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn sentiment_cell(sentiment: Sentiment) -> Cell {
    let style = match sentiment {
        Sentiment::Positive => "Fg",
        Sentiment::Neutral => "Fy",
        Sentiment::Negative => "Fr",
    };
    Cell::new(sentiment.as_str()).style_spec(style)
}

fn print_table(mentions: &MentionsList) {
    if mentions.is_empty() {
        println!("{}", "No stock mentions found.".yellow());
        return;
    }

    println!(
        "{}",
        format!("Found {} stock mentions", mentions.len()).green().bold()
    );

    let mut table = Table::new();
    table.add_row(PrettyRow::new(vec![
        Cell::new("#"),
        Cell::new("Company"),
        Cell::new("Ticker"),
        Cell::new("Time"),
        Cell::new("Sentiment"),
        Cell::new("Context"),
    ]));

    for (i, mention) in mentions.iter().enumerate() {
        table.add_row(PrettyRow::new(vec![
            Cell::new(&(i + 1).to_string()),
            Cell::new(&mention.company_name),
            Cell::new(&mention.stock_ticker),
            Cell::new(&format_timestamp(mention.timestamp_seconds)),
            sentiment_cell(mention.sentiment),
            Cell::new(&mention.context_snippet),
        ]));
    }

    table.printstd();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    configure_logging(args.verbose);

    if args.print_schema {
        println!("{}", describe_schema());
        return Ok(());
    }

    let transcript = read_transcript(args.transcript.as_deref())?;

    if args.print_prompt {
        println!("{}", extraction_prompt(&transcript, &describe_schema()));
        return Ok(());
    }

    let config = build_config(&args)?;

    let client = match &args.replay {
        Some(path) => {
            let reply = fs::read_to_string(path)
                .with_context(|| format!("failed to read saved reply {}", path.display()))?;
            info!("Replaying saved reply from {}", path.display());
            LLMClient::Replay(ReplayBackend::reply(reply))
        }
        None => LLMClient::from_config(&config).await,
    };

    let extractor = Extractor::new(config, client)?;
    let mentions = extractor.extract(&transcript).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&mentions)?);
    } else {
        print_table(&mentions);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "0:00");
        assert_eq!(format_timestamp(95), "1:35");
        assert_eq!(format_timestamp(3600), "60:00");
    }

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::try_parse_from([
            "tickertape",
            "--backend",
            "ollama",
            "--model",
            "qwen3:8b",
            "--max-tokens",
            "512",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.backend, Some(BackendKind::Ollama));
        assert_eq!(args.model.as_deref(), Some("qwen3:8b"));
        assert_eq!(args.max_tokens, Some(512));
        assert!(args.json);
    }

    #[test]
    fn test_sample_transcript_is_used_by_default() {
        let transcript = read_transcript(None).unwrap();
        assert!(transcript.contains("NVDA"));
        assert!(transcript.contains("AAPL"));
    }
}
