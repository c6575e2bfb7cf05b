//! Parsing of PCI addresses out of sysfs directory names
//!
//! Components are kept as the hex strings found in the directory name (casing
//! and leading zeros included). They are only used as map keys and labels, so
//! there is no reason to reinterpret them as numbers.

use crate::error::AddressParseError;
use crate::error::EntryKind;
use compact_str::CompactString;
use std::fmt::Display;
use std::str::FromStr;
use winnow::ModalResult;
use winnow::Parser;
use winnow::error::StrContext;
use winnow::error::StrContextValue;
use winnow::token::take_while;

/// Prefix marking a domain directory in the root of the hierarchy
pub const DOMAIN_PREFIX: &str = "pci";

/// Address parsed out of a `pciDDDD:BB` directory name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainAddress {
    pub domain: CompactString,
    /// Root bus of the host bridge
    pub bus: CompactString,
}

impl DomainAddress {
    /// Parse a domain directory name, such as `pci0000:00`
    pub fn parse(name: &str) -> Result<Self, AddressParseError> {
        domain_entry
            .parse(name)
            .map_err(|error| AddressParseError::from_parse(EntryKind::Domain, &error, name))
    }
}

impl Display for DomainAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{DOMAIN_PREFIX}{}:{}", self.domain, self.bus)
    }
}

/// Address of a single function, as found in `DDDD:BB:DD.F` directory names
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionAddress {
    pub domain: CompactString,
    pub bus: CompactString,
    pub device: CompactString,
    pub function: CompactString,
}

impl FunctionAddress {
    pub fn new(
        domain: impl Into<CompactString>,
        bus: impl Into<CompactString>,
        device: impl Into<CompactString>,
        function: impl Into<CompactString>,
    ) -> Self {
        Self {
            domain: domain.into(),
            bus: bus.into(),
            device: device.into(),
            function: function.into(),
        }
    }

    /// Parse a function directory name, such as `0000:00:1f.3`
    pub fn parse(name: &str) -> Result<Self, AddressParseError> {
        function_entry
            .parse(name)
            .map_err(|error| AddressParseError::from_parse(EntryKind::Function, &error, name))
    }
}

impl FromStr for FunctionAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for FunctionAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}.{}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

fn domain_entry(i: &mut &str) -> ModalResult<DomainAddress> {
    (
        DOMAIN_PREFIX.context(StrContext::Label("domain prefix")),
        hex_component.context(StrContext::Label("domain")),
        ':',
        hex_component.context(StrContext::Label("bus")),
    )
        .map(|(_, domain, _, bus)| DomainAddress {
            domain: domain.into(),
            bus: bus.into(),
        })
        .parse_next(i)
}

fn function_entry(i: &mut &str) -> ModalResult<FunctionAddress> {
    (
        hex_component.context(StrContext::Label("domain")),
        ':',
        hex_component.context(StrContext::Label("bus")),
        ':',
        hex_component.context(StrContext::Label("device")),
        '.',
        hex_component.context(StrContext::Label("function")),
    )
        .map(|(domain, _, bus, _, device, _, function)| {
            FunctionAddress::new(domain, bus, device, function)
        })
        .parse_next(i)
}

/// One non-empty run of hex digits
fn hex_component<'input>(i: &mut &'input str) -> ModalResult<&'input str> {
    take_while(1.., |c: char| c.is_ascii_hexdigit())
        .context(StrContext::Expected(StrContextValue::Description(
            "hex digits",
        )))
        .parse_next(i)
}
