use clap::{Parser, Subcommand};

mod cmd;
mod core;
mod engine;
mod rules;

#[derive(Parser, Debug)]
#[command(
    name = "taxband",
    version,
    about = "UK progressive tax band and allowance calculator"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute tax for one input record against a scheme
    Compute(cmd::compute::ComputeCommand),
    /// Compute a CSV batch of input records
    Batch(cmd::batch::BatchCommand),
    /// List the configured schemes
    Schemes(cmd::schemes::SchemesCommand),
    /// Print input/result schemas
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Compute(cmd) => cmd.exec(),
        Command::Batch(cmd) => cmd.exec(),
        Command::Schemes(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
