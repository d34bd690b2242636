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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use negsim::policy::Policy;
use negsim::report::Format;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Simulates negative caching in a DNS resolver
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a query trace against a root zone
    Run(RunArgs),
}

#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("required").required(true).args(["config", "zone"])))]
pub struct RunArgs {
    /// Set the configuration file to use
    #[arg(
        long,
        conflicts_with_all = ["zone", "policy", "format", "interval", "all_names"],
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Set the root zone file
    #[arg(long, value_name = "FILE")]
    pub zone: Option<PathBuf>,

    /// Set the negative-caching policy (rfc2308, rfc4035, or rfc8198)
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<Policy>,

    /// Set the report format (csv or text)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<Format>,

    /// Set the reporting interval
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Replay queries for all names, not only the root and TLDs
    #[arg(long)]
    pub all_names: bool,

    /// Read the trace from FILE instead of standard input
    #[arg(value_name = "FILE")]
    pub trace: Option<PathBuf>,
}
