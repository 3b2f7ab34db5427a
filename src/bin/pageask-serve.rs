use std::process;

use clap::Parser;
use pageask::commands::serve::{self, ServeArgs};

#[derive(Debug, Parser)]
#[command(
    name = "pageask-serve",
    about = "Serve the page assistant ask API over HTTP",
    version = pageask::VERSION
)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    if let Err(err) = serve::run(cli.serve) {
        eprintln!("{err}");
        process::exit(1);
    }
}
