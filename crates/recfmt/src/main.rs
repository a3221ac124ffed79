//! recfmt CLI: inspect fixed-length record files through a layout.
//!
//! `dump` prints every record of a data file as a JSON line; `check`
//! compiles a layout and lists its fields.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::{debug, warn};

use recfmt::{FormatterFactory, RecfmtConfig};

/// recfmt CLI.
#[derive(Parser)]
#[command(name = "recfmt", about = "Fixed-length record formatter")]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print each record of a data file as a JSON line.
    Dump(DumpArgs),
    /// Compile a layout file and print its fields.
    Check(CheckArgs),
}

#[derive(Parser)]
struct DumpArgs {
    /// Layout definition file.
    #[arg(short, long)]
    layout: PathBuf,

    /// Data file to read.
    data: PathBuf,

    /// Stop after this many records.
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Parser)]
struct CheckArgs {
    /// Layout definition file.
    #[arg(short, long)]
    layout: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RecfmtConfig::load()?;

    let mut tracing = config.tracing()?;
    if cli.verbose {
        tracing = tracing.verbose();
    }
    if let Err(e) = recfmt::init_tracing_with_config(&tracing) {
        eprintln!("warning: {e}");
    }

    let factory = FormatterFactory::from_config(&config)?;
    match cli.command {
        Commands::Dump(args) => dump(&factory, args),
        Commands::Check(args) => check(&factory, args),
    }
}

fn dump(factory: &FormatterFactory, args: DumpArgs) -> Result<()> {
    let data = File::open(&args.data).into_diagnostic()?;
    let mut formatter = factory.create_formatter(&args.layout);
    formatter.set_input_stream(data).initialize()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0u64;
    while args.limit.map_or(true, |limit| count < limit) {
        let Some(record) = formatter.read_record()? else {
            break;
        };
        let line = serde_json::to_string(&record).into_diagnostic()?;
        writeln!(out, "{line}").into_diagnostic()?;
        count += 1;
    }
    formatter.close()?;

    if count == 0 {
        warn!(data = %args.data.display(), "no records found");
    }
    debug!(records = count, "dump finished");
    Ok(())
}

fn check(factory: &FormatterFactory, args: CheckArgs) -> Result<()> {
    let layout = factory.compile(&args.layout)?;
    let definition = layout.definition();

    println!(
        "record type [{}]: {} bytes, charset {}, separator {:?}",
        definition.record_type,
        layout.record_length(),
        layout.charset(),
        definition.record_separator.as_deref().unwrap_or(""),
    );
    for field in layout.fields() {
        let def = field.definition();
        let scale = if def.scale > 0 {
            format!(", {}", def.scale)
        } else {
            String::new()
        };
        println!(
            "{:>6}  {:<24} {}({}{}){}",
            def.position,
            def.name,
            field.convertor().name(),
            def.length,
            scale,
            if def.filler { "  filler" } else { "" },
        );
    }
    Ok(())
}
