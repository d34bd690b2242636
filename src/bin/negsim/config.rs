// Copyright 2021 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the simulation configuration file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use negsim::policy::Policy;
use negsim::report::{self, Format};

use crate::args::RunArgs;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the configuration from the file given by `path`. A trace
/// given on the command line overrides the one in the file.
pub fn load_from_path(path: impl AsRef<Path>, trace: Option<PathBuf>) -> Result<Config> {
    let dir = match path.as_ref().parent() {
        Some(p) => p,
        None => return Err(anyhow!("the configuration file path has no parent")),
    };
    let raw_config = fs::read(path.as_ref()).context("failed to read the configuration file")?;
    let mut config = parse(&raw_config)?;

    // When loading the configuration from a path, the zone and trace
    // paths are interpreted relative to the configuration file's
    // directory.
    if config.zone.is_relative() {
        config.zone = dir.join(&config.zone);
    }
    if let Some(ref mut trace_path) = config.trace {
        if trace_path.is_relative() {
            *trace_path = dir.join(&trace_path);
        }
    }
    if trace.is_some() {
        config.trace = trace;
    }

    log_config_summary(&config);
    Ok(config)
}

/// Loads the configuration from the parsed command line arguments
/// given by `args`.
pub fn load_from_args(args: RunArgs) -> Result<Config> {
    let config = Config {
        zone: args.zone.ok_or_else(|| anyhow!("no zone file was given"))?,
        policy: ConfigPolicy(args.policy.unwrap_or_default()),
        trace: args.trace,
        report: ReportConfig {
            format: ConfigFormat(args.format.unwrap_or_default()),
            interval: args.interval.unwrap_or(report::DEFAULT_INTERVAL),
        },
        trace_filter: TraceFilterConfig {
            top_level_only: !args.all_names,
        },
    };
    config.validate()?;
    log_config_summary(&config);
    Ok(config)
}

/// Parses and validates a configuration file's contents.
fn parse(raw_config: &[u8]) -> Result<Config> {
    let config: Config =
        toml::from_slice(raw_config).context("failed to parse the configuration file")?;
    config.validate()?;
    Ok(config)
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let trace = match config.trace {
        Some(ref path) => path.display().to_string(),
        None => String::from("standard input"),
    };
    debug!(
        "Configuration loaded:\n\
         Zone:     {}\n\
         Policy:   {}\n\
         Trace:    {}\n\
         Names:    {}\n\
         Report:   {} every {} seconds",
        config.zone.display(),
        config.policy.0,
        trace,
        if config.trace_filter.top_level_only {
            "root and TLDs only"
        } else {
            "all"
        },
        config.report.format.0,
        config.report.interval,
    );
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub zone: PathBuf,
    #[serde(default = "default_policy")]
    pub policy: ConfigPolicy,
    pub trace: Option<PathBuf>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub trace_filter: TraceFilterConfig,
}

impl Config {
    fn validate(&self) -> Result<()> {
        if self.report.interval == 0 {
            Err(anyhow!("the report interval must be positive"))
        } else {
            Ok(())
        }
    }
}

fn default_policy() -> ConfigPolicy {
    ConfigPolicy(Policy::default())
}

/// The configuration of periodic reporting.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_format")]
    pub format: ConfigFormat,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_format() -> ConfigFormat {
    ConfigFormat(Format::default())
}

fn default_interval() -> u64 {
    report::DEFAULT_INTERVAL
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            interval: default_interval(),
        }
    }
}

/// The configuration of which trace queries are replayed.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceFilterConfig {
    #[serde(default = "default_top_level_only")]
    pub top_level_only: bool,
}

fn default_top_level_only() -> bool {
    true
}

impl Default for TraceFilterConfig {
    fn default() -> Self {
        Self {
            top_level_only: default_top_level_only(),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER NEGSIM TYPES FOR SERDE                               //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type
/// from [`negsim`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over a [`negsim`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigPolicy, Policy, "negative-caching policy");
make_serde_wrapper!(ConfigFormat, Format, "report format");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_applies_defaults() {
        let config = parse(b"zone = \"root.zone\"\n").unwrap();
        assert_eq!(config.zone, PathBuf::from("root.zone"));
        assert_eq!(config.policy.0, Policy::Rfc8198);
        assert!(config.trace.is_none());
        assert_eq!(config.report.format.0, Format::Csv);
        assert_eq!(config.report.interval, 3600);
        assert!(config.trace_filter.top_level_only);
    }

    #[test]
    fn parse_reads_all_sections() {
        let config = parse(
            b"zone = \"root.zone\"\n\
              policy = \"rfc2308\"\n\
              trace = \"queries.log\"\n\
              [report]\n\
              format = \"text\"\n\
              interval = 60\n\
              [trace_filter]\n\
              top_level_only = false\n",
        )
        .unwrap();
        assert_eq!(config.policy.0, Policy::Rfc2308);
        assert_eq!(config.trace, Some(PathBuf::from("queries.log")));
        assert_eq!(config.report.format.0, Format::Text);
        assert_eq!(config.report.interval, 60);
        assert!(!config.trace_filter.top_level_only);
    }

    #[test]
    fn parse_rejects_bad_configs() {
        assert!(parse(b"zone = \"root.zone\"\npolicy = \"rfc1035\"\n").is_err());
        assert!(parse(b"zone = \"root.zone\"\nbogus = 1\n").is_err());
        assert!(parse(b"zone = \"root.zone\"\n[report]\ninterval = 0\n").is_err());
        assert!(parse(b"policy = \"rfc2308\"\n").is_err());
    }
}
