use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, ValueEnum};
use owo_colors::OwoColorize;
use serde_json::json;
use tracing::debug;

use crate::assistant::image::{MAX_IMAGE_BYTES, encode_image_bytes};
use crate::assistant::{self, AskError, AskRequest, Usage};
use crate::config::{Overrides, Settings};
use crate::logging::{self, LogConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct AskArgs {
    /// Question about the page; read from stdin when omitted.
    pub question: Option<String>,

    /// Address of the page the question is about.
    #[arg(long, default_value = "")]
    pub url: String,

    /// Title of the page.
    #[arg(long, default_value = "")]
    pub title: String,

    /// Page text, or JSON with `headings` and `paragraphs` arrays.
    #[arg(long, conflicts_with = "page_content_file")]
    pub page_content: Option<String>,

    /// Read page content from a file.
    #[arg(long, value_name = "PATH")]
    pub page_content_file: Option<PathBuf>,

    /// Attach a JPEG, PNG or WebP screenshot of the page.
    #[arg(long, value_name = "PATH")]
    pub screenshot: Option<PathBuf>,

    /// Answer with the provider's web search instead of the page.
    #[arg(long)]
    pub web_search: bool,

    /// Ask for a short answer.
    #[arg(long)]
    pub simple: bool,

    #[arg(long)]
    pub model: Option<String>,

    /// Named profile from the config file.
    #[arg(long)]
    pub profile: Option<String>,

    #[arg(long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Shorthand for `--output json`.
    #[arg(long)]
    pub json: bool,

    /// Print the upstream request instead of sending it.
    #[arg(long)]
    pub dry_run: bool,

    /// Print token usage on stderr.
    #[arg(long)]
    pub show_usage: bool,

    #[arg(short, long)]
    pub verbose: bool,

    /// Silence logs and usage; errors are still printed.
    #[arg(short, long)]
    pub quiet: bool,
}

impl AskArgs {
    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output.unwrap_or(OutputFormat::Text)
        }
    }
}

pub fn run(args: AskArgs) -> Result<(), String> {
    let overrides = Overrides {
        model: args.model.clone(),
        ..Overrides::default()
    };
    let settings = Settings::resolve(args.profile.as_deref(), &overrides)?;
    logging::init(LogConfig::for_cli(args.verbose, args.quiet, settings.debug));

    debug!(
        model = %settings.assistant.model,
        api_key_present = settings.assistant.api_key_present(),
        "resolved settings"
    );

    let request = build_request(&args)?;
    let output = args.output_format();

    if args.dry_run {
        let prepared =
            assistant::prepare(&request, &settings.assistant).map_err(|err| err.to_string())?;
        let body = json!({
            "dry_run": true,
            "mode": prepared.mode,
            "endpoint": prepared.endpoint,
            "model": settings.assistant.model,
            "output": output.as_str(),
            "payload": prepared.payload,
        });
        let rendered = serde_json::to_string_pretty(&body)
            .map_err(|err| format!("Failed to render dry-run output: {err}"))?;
        println!("{rendered}");
        if args.show_usage && !args.quiet {
            eprintln!("usage: unavailable latency_ms=0 (dry-run)");
        }
        return Ok(());
    }

    let started = Instant::now();
    let result = assistant::ask(&request, &settings.assistant).map_err(|err| err.to_string())?;
    let latency_ms = started.elapsed().as_millis();

    match output {
        OutputFormat::Text => println!("{}", result.answer),
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&result)
                .map_err(|err| format!("Failed to render answer: {err}"))?;
            println!("{rendered}");
        }
    }

    if args.show_usage && !args.quiet {
        eprintln!("{}", usage_line(&result.usage, latency_ms).dimmed());
    }
    Ok(())
}

fn build_request(args: &AskArgs) -> Result<AskRequest, String> {
    let question = match &args.question {
        Some(question) => question.clone(),
        None => read_stdin_question()?,
    };

    let page_content = match (&args.page_content, &args.page_content_file) {
        (Some(content), _) => Some(content.clone()),
        (None, Some(path)) => Some(fs::read_to_string(path).map_err(|err| {
            format!("Failed to read page content '{}': {err}", path.display())
        })?),
        (None, None) => None,
    };

    let screenshot = match &args.screenshot {
        Some(path) => Some(read_screenshot(path)?),
        None => None,
    };

    Ok(AskRequest {
        question,
        url: args.url.clone(),
        title: args.title.clone(),
        page_content,
        screenshot,
        use_web_search: args.web_search,
        is_simple: args.simple,
    })
}

/// Rejects files whose base64 form would exceed the screenshot ceiling
/// before reading them.
fn read_screenshot(path: &Path) -> Result<String, String> {
    let len = fs::metadata(path)
        .map_err(|err| format!("Failed to read screenshot '{}': {err}", path.display()))?
        .len();
    let projected = usize::try_from(len)
        .map(encoded_len)
        .unwrap_or(usize::MAX);
    if projected > MAX_IMAGE_BYTES {
        return Err(AskError::PayloadTooLarge {
            size: projected,
            limit: MAX_IMAGE_BYTES,
        }
        .to_string());
    }

    let bytes = fs::read(path)
        .map_err(|err| format!("Failed to read screenshot '{}': {err}", path.display()))?;
    encode_image_bytes(&bytes)
}

fn encoded_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3).saturating_mul(4)
}

fn read_stdin_question() -> Result<String, String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err("No question provided. Pass it as an argument or pipe it on stdin.".to_string());
    }

    let mut question = String::new();
    stdin
        .read_to_string(&mut question)
        .map_err(|err| format!("Failed to read question from stdin: {err}"))?;
    Ok(question.trim().to_string())
}

fn usage_line(usage: &Usage, latency_ms: u128) -> String {
    format!(
        "usage: prompt_tokens={} completion_tokens={} total_tokens={} latency_ms={latency_ms}",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    )
}

#[cfg(test)]
mod tests {
    use super::{AskArgs, OutputFormat, encoded_len, usage_line};
    use crate::assistant::Usage;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        ask: AskArgs,
    }

    #[test]
    fn json_flag_overrides_output() {
        let cli = TestCli::parse_from(["test", "--output", "text", "--json", "hello"]);
        assert_eq!(cli.ask.output_format(), OutputFormat::Json);

        let cli = TestCli::parse_from(["test", "hello"]);
        assert_eq!(cli.ask.output_format(), OutputFormat::Text);
    }

    #[test]
    fn page_content_sources_conflict() {
        let result = TestCli::try_parse_from([
            "test",
            "--page-content",
            "inline",
            "--page-content-file",
            "page.txt",
            "hello",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn encoded_len_matches_base64_padding() {
        assert_eq!(encoded_len(0), 0);
        assert_eq!(encoded_len(1), 4);
        assert_eq!(encoded_len(3), 4);
        assert_eq!(encoded_len(4), 8);
    }

    #[test]
    fn usage_line_lists_all_counters() {
        let line = usage_line(
            &Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            42,
        );
        assert_eq!(
            line,
            "usage: prompt_tokens=10 completion_tokens=5 total_tokens=15 latency_ms=42"
        );
    }
}
