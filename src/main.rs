use std::io;
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use owo_colors::OwoColorize;
use pageask::commands::ask::{self, AskArgs};
use pageask::commands::config::{self, ConfigArgs};
use pageask::commands::serve::{self, ServeArgs};

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  pageask ask --url https://example.com --title Example \"What is this page about?\"\n  pageask ask --web-search --simple \"Latest Rust release?\"\n  pageask serve --port 8080\n  pageask config check\n  pageask completion bash > ~/.local/share/bash-completion/completions/pageask";

const ASK_HELP_EXAMPLES: &str = "Examples:\n  pageask ask --url https://example.com --page-content-file page.txt \"Summarize this page\"\n  pageask ask --screenshot shot.png \"What does the chart show?\"\n  echo \"Who wrote this?\" | pageask ask --title \"Blog post\"\n  pageask ask --dry-run --json \"Explain the pricing table\"";

#[derive(Debug, Parser)]
#[command(
    name = "pageask",
    about = "Ask a language model about the web page you are reading",
    version = pageask::VERSION,
    propagate_version = true,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Ask a question about a page", after_help = ASK_HELP_EXAMPLES)]
    Ask(AskArgs),
    #[command(about = "Serve the ask API over HTTP")]
    Serve(ServeArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "pageask", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "pageask", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "pageask", &mut io::stdout()),
    }
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask(args) => ask::run(args),
        Commands::Serve(args) => serve::run(args),
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{} {err}", "error:".red().bold());
        process::exit(1);
    }
}
