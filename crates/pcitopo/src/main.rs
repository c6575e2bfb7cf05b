//! Implements the CLI for pcitopo

use clap::Parser;
use pcitopo::cli::Cli;
use pcitopo::output::write_output;
use pcitopo_core::EnumerateConfiguration;
use pcitopo_core::names::NoNames;
use proc_exit::Code;
use proc_exit::Exit;
use std::io::BufWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(target_env = "musl")]
use mimalloc::MiMalloc;

#[cfg(target_env = "musl")]
#[cfg_attr(target_env = "musl", global_allocator)]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> eyre::Result<Exit> {
    color_eyre::install()?;
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
        .from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    let cli = Cli::parse();

    let config = EnumerateConfiguration::try_from(&cli)?;
    // A failed walk still gives us whatever was found before the failure
    let (topology, failed) = match config.enumerate() {
        Ok(topology) => (topology, false),
        Err(err) => {
            let (partial, error) = err.into_parts();
            eprintln!("Error: {:?}", eyre::Report::new(error));
            (partial, true)
        }
    };

    let mut stdout = BufWriter::new(std::io::stdout().lock());
    write_output(&mut stdout, &cli.command, cli.format, &topology, &NoNames)?;

    Ok(if failed {
        Exit::new(Code::FAILURE)
    } else {
        Exit::new(Code::SUCCESS)
    })
}
