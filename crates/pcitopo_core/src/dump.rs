//! Human readable output of a topology
//!
//! Output is sorted by address so that it is stable between runs. Attributes
//! without a value are left out.

use crate::address::FunctionAddress;
use crate::attribute::Attribute;
use crate::names::NameResolver;
use crate::topology::Function;
use crate::topology::Topology;
use crate::topology::TopologyCounts;
use itertools::Itertools;
use std::io::Write;

/// Write the whole topology as an indented tree
pub fn write_tree(
    out: &mut impl Write,
    topology: &Topology,
    names: &dyn NameResolver,
) -> std::io::Result<()> {
    for (_, domain) in topology.domains.iter().sorted_by_key(|&(k, _)| k) {
        writeln!(out, "Domain {}", domain.number)?;
        for (_, bus) in domain.buses.iter().sorted_by_key(|&(k, _)| k) {
            writeln!(out, "  Bus {}", bus.number)?;
            for (_, device) in bus.devices.iter().sorted_by_key(|&(k, _)| k) {
                writeln!(out, "    Device {}", device.number)?;
                for (_, function) in device.functions.iter().sorted_by_key(|&(k, _)| k) {
                    let attributes = format_attributes(function, names);
                    if attributes.is_empty() {
                        writeln!(out, "      Function {}", function.number)?;
                    } else {
                        writeln!(out, "      Function {}: {attributes}", function.number)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Write a single function on one line, prefixed by its address
pub fn write_function(
    out: &mut impl Write,
    address: &FunctionAddress,
    function: &Function,
    names: &dyn NameResolver,
) -> std::io::Result<()> {
    let attributes = format_attributes(function, names);
    if attributes.is_empty() {
        writeln!(out, "{address}")
    } else {
        writeln!(out, "{address} {attributes}")
    }
}

/// Write node counts per level
pub fn write_summary(out: &mut impl Write, counts: &TopologyCounts) -> std::io::Result<()> {
    writeln!(out, "Domains:   {}", counts.domains)?;
    writeln!(out, "Buses:     {}", counts.buses)?;
    writeln!(out, "Devices:   {}", counts.devices)?;
    writeln!(out, "Functions: {}", counts.functions)
}

fn format_attributes(function: &Function, names: &dyn NameResolver) -> String {
    function
        .attributes()
        .map(|(attribute, value)| {
            let name = match attribute {
                Attribute::Vendor => names.vendor_name(&function.vendor),
                Attribute::Device => names.device_name(&function.vendor, &function.device),
                Attribute::SubsystemVendor => names.vendor_name(&function.subsystem_vendor),
                _ => None,
            };
            match name {
                Some(name) => format!("{attribute}={value} [{name}]"),
                None => format!("{attribute}={value}"),
            }
        })
        .join(" ")
}
