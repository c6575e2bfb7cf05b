//! Rendering of command results

use crate::cli::Commands;
use crate::cli::Format;
use eyre::WrapErr;
use pcitopo_core::Topology;
use pcitopo_core::dump;
use pcitopo_core::names::NameResolver;
use std::io::Write;

/// Write the output of `command` for an already enumerated topology
pub fn write_output(
    out: &mut impl Write,
    command: &Commands,
    format: Format,
    topology: &Topology,
    names: &dyn NameResolver,
) -> eyre::Result<()> {
    match command {
        Commands::Dump => match format {
            Format::Human => dump::write_tree(out, topology, names)?,
            #[cfg(feature = "json")]
            Format::Json => {
                serde_json::to_writer_pretty(&mut *out, topology)?;
                writeln!(out)?;
            }
        },
        Commands::Show { address } => {
            let function = topology
                .function(address)
                .ok_or_else(|| eyre::eyre!("No PCI function at {address}"))?;
            match format {
                Format::Human => dump::write_function(out, address, function, names)?,
                #[cfg(feature = "json")]
                Format::Json => {
                    serde_json::to_writer_pretty(&mut *out, function)?;
                    writeln!(out)?;
                }
            }
        }
        Commands::Summary => {
            let counts = topology.counts();
            match format {
                Format::Human => dump::write_summary(out, &counts)?,
                #[cfg(feature = "json")]
                Format::Json => {
                    serde_json::to_writer_pretty(&mut *out, &counts)?;
                    writeln!(out)?;
                }
            }
        }
    }
    out.flush().wrap_err("Failed to write output")
}
