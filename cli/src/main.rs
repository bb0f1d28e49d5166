use clap::Parser;
use presentation::cli::{self, Cli};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    shared::telemetry::init("info");
    cli::run(Cli::parse()).await
}
