use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use asm2html::{
    convert::{convert, ConversionArgs},
    instrumentation,
};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[clap(long)]
    #[clap(help = "Enable chrome tracing")]
    #[clap(long_help = "Enable chrome tracing which on program exit will generate
a json file to be opened with a chrome tracing compatible
viewer.")]
    trace: bool,
    #[clap(long, default_value_t = Level::INFO)]
    #[clap(help = "One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`")]
    log_level: Level,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[clap(about = "Convert an assembly source file to an annotated HTML page")]
    #[clap(aliases = &["c", "conv"])]
    Convert(ConversionArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _trace_guard = instrumentation::init(cli.log_level, cli.trace);

    match &cli.command {
        Command::Convert(args) => convert(args),
    }
}
