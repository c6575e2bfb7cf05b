//! The nested domain → bus → device → function tree
//!
//! Every level owns its children directly. Inserting a function walks down
//! from the root with the entry API, creating missing ancestors as it goes, so
//! the node is always modified in place.

use crate::address::FunctionAddress;
use crate::attribute::Attribute;
use crate::attribute::parse_enable;
use ahash::AHashMap;
use compact_str::CompactString;
use compact_str::ToCompactString;
use strum::VariantArray;

/// A single PCI function and its attributes.
///
/// Attributes that could not be read are empty (or 0 for `enable`).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Function {
    /// Function number (`F` in `DDDD:BB:DD.F`)
    pub number: CompactString,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "CompactString::is_empty"))]
    pub class: CompactString,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "CompactString::is_empty"))]
    pub revision: CompactString,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "CompactString::is_empty"))]
    pub vendor: CompactString,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "CompactString::is_empty"))]
    pub device: CompactString,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "CompactString::is_empty"))]
    pub subsystem_vendor: CompactString,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "CompactString::is_empty"))]
    pub subsystem_device: CompactString,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_zero"))]
    pub enable: u16,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "CompactString::is_empty"))]
    pub irq: CompactString,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "CompactString::is_empty"))]
    pub local_cpus: CompactString,
}

#[cfg(feature = "serde")]
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u16) -> bool {
    *value == 0
}

impl Function {
    /// Store the (trimmed) contents of an attribute file
    pub fn set_attribute(&mut self, attribute: Attribute, value: CompactString) {
        match attribute {
            Attribute::Class => self.class = value,
            Attribute::Vendor => self.vendor = value,
            Attribute::Device => self.device = value,
            Attribute::Enable => self.enable = parse_enable(&value),
            Attribute::Revision => self.revision = value,
            Attribute::SubsystemVendor => self.subsystem_vendor = value,
            Attribute::SubsystemDevice => self.subsystem_device = value,
            Attribute::Irq => self.irq = value,
            Attribute::LocalCpus => self.local_cpus = value,
        }
    }

    /// Get the value of an attribute, `None` if it is empty (or 0 for `enable`)
    #[must_use]
    pub fn attribute(&self, attribute: Attribute) -> Option<CompactString> {
        let value = match attribute {
            Attribute::Class => &self.class,
            Attribute::Vendor => &self.vendor,
            Attribute::Device => &self.device,
            Attribute::Enable => {
                return (self.enable != 0).then(|| self.enable.to_compact_string());
            }
            Attribute::Revision => &self.revision,
            Attribute::SubsystemVendor => &self.subsystem_vendor,
            Attribute::SubsystemDevice => &self.subsystem_device,
            Attribute::Irq => &self.irq,
            Attribute::LocalCpus => &self.local_cpus,
        };
        (!value.is_empty()).then(|| value.clone())
    }

    /// All attributes that have a value, in file name order
    pub fn attributes(&self) -> impl Iterator<Item = (Attribute, CompactString)> + '_ {
        Attribute::VARIANTS
            .iter()
            .filter_map(|&attribute| Some((attribute, self.attribute(attribute)?)))
    }
}

/// A device slot on a bus
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Device {
    pub number: CompactString,
    pub functions: AHashMap<CompactString, Function>,
}

impl Device {
    #[must_use]
    pub fn new(number: CompactString) -> Self {
        Self {
            number,
            functions: AHashMap::new(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bus {
    pub number: CompactString,
    pub devices: AHashMap<CompactString, Device>,
}

impl Bus {
    #[must_use]
    pub fn new(number: CompactString) -> Self {
        Self {
            number,
            devices: AHashMap::new(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Domain {
    pub number: CompactString,
    pub buses: AHashMap<CompactString, Bus>,
}

impl Domain {
    #[must_use]
    pub fn new(number: CompactString) -> Self {
        Self {
            number,
            buses: AHashMap::new(),
        }
    }
}

/// Number of nodes at each level of a [`Topology`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TopologyCounts {
    pub domains: usize,
    pub buses: usize,
    pub devices: usize,
    pub functions: usize,
}

/// A snapshot of the PCI hierarchy, keyed by domain number
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Topology {
    pub domains: AHashMap<CompactString, Domain>,
}

impl Topology {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Get a domain, creating it if it doesn't exist yet
    pub fn domain_mut(&mut self, number: &str) -> &mut Domain {
        self.domains
            .entry(number.into())
            .or_insert_with(|| Domain::new(number.into()))
    }

    fn bus_mut(&mut self, domain: &str, bus: &str) -> &mut Bus {
        self.domain_mut(domain)
            .buses
            .entry(bus.into())
            .or_insert_with(|| Bus::new(bus.into()))
    }

    fn device_mut(&mut self, domain: &str, bus: &str, device: &str) -> &mut Device {
        self.bus_mut(domain, bus)
            .devices
            .entry(device.into())
            .or_insert_with(|| Device::new(device.into()))
    }

    /// Insert a function, creating its domain, bus and device as needed.
    ///
    /// A function already present at the same address is replaced by the new
    /// one, which is returned. Within one enumeration pass this only happens
    /// if the hierarchy changed under us.
    pub fn insert(&mut self, address: &FunctionAddress, mut function: Function) -> Option<Function> {
        let device = self.device_mut(&address.domain, &address.bus, &address.device);
        function.number.clone_from(&address.function);
        let old = device.functions.insert(address.function.clone(), function);
        if old.is_some() {
            tracing::warn!("Duplicate PCI function {address}, keeping the latest one");
        }
        old
    }

    /// Fold another topology into this one.
    ///
    /// Domains, buses and devices are unioned (empty ones included). Functions
    /// follow the same replacement rule as [`Topology::insert`].
    pub fn merge(&mut self, other: Self) {
        for (domain_number, domain) in other.domains {
            self.domain_mut(&domain_number);
            for (bus_number, bus) in domain.buses {
                self.bus_mut(&domain_number, &bus_number);
                for (device_number, device) in bus.devices {
                    self.device_mut(&domain_number, &bus_number, &device_number);
                    for (function_number, function) in device.functions {
                        let address = FunctionAddress {
                            domain: domain_number.clone(),
                            bus: bus_number.clone(),
                            device: device_number.clone(),
                            function: function_number,
                        };
                        self.insert(&address, function);
                    }
                }
            }
        }
    }

    /// Look up a single function
    #[must_use]
    pub fn function(&self, address: &FunctionAddress) -> Option<&Function> {
        self.domains
            .get(&address.domain)?
            .buses
            .get(&address.bus)?
            .devices
            .get(&address.device)?
            .functions
            .get(&address.function)
    }

    /// Iterate over all functions with their addresses, in no particular order
    pub fn functions(&self) -> impl Iterator<Item = (FunctionAddress, &Function)> + '_ {
        self.domains.values().flat_map(|domain| {
            domain.buses.values().flat_map(move |bus| {
                bus.devices.values().flat_map(move |device| {
                    device.functions.values().map(move |function| {
                        (
                            FunctionAddress {
                                domain: domain.number.clone(),
                                bus: bus.number.clone(),
                                device: device.number.clone(),
                                function: function.number.clone(),
                            },
                            function,
                        )
                    })
                })
            })
        })
    }

    #[must_use]
    pub fn counts(&self) -> TopologyCounts {
        let mut counts = TopologyCounts {
            domains: self.domains.len(),
            ..Default::default()
        };
        for bus in self.domains.values().flat_map(|d| d.buses.values()) {
            counts.buses += 1;
            counts.devices += bus.devices.len();
            counts.functions += bus
                .devices
                .values()
                .map(|d| d.functions.len())
                .sum::<usize>();
        }
        counts
    }
}
