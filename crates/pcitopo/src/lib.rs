//! Library part of pcitopo: CLI definition (also used by the xtask tooling)
//! and output rendering

pub mod cli;
mod conversion;
pub mod output;
