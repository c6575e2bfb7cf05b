//! Conversion from CLI arguments to library configuration

use crate::cli::Cli;
use pcitopo_core::EnumerateConfiguration;

impl TryFrom<&Cli> for EnumerateConfiguration {
    type Error = eyre::Error;

    fn try_from(value: &Cli) -> Result<Self, Self::Error> {
        let mut builder = Self::builder();

        builder.root(value.root.clone());
        builder.parallel(value.parallel);

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_configuration_from_cli() {
        let cli = Cli::try_parse_from(["pcitopo", "--root", "/tmp/sys", "--parallel", "dump"])
            .unwrap();
        let config = EnumerateConfiguration::try_from(&cli).unwrap();
        assert_eq!(config.root, Path::new("/tmp/sys"));
        assert!(config.parallel);
    }
}
