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

//! Implements the `run` command (i.e., running a simulation).

use std::fmt::Write;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::process;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{error, info};

use negsim::oracle::Oracle;
use negsim::replay::replay;
use negsim::report::Reporter;
use negsim::resolver::Resolver;
use negsim::trace::TraceReader;
use negsim::zone::Zone;

use crate::args::RunArgs;
use crate::config;

/// Runs a simulation.
pub fn run(args: RunArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed to run:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
    info!("Exiting with success.");
}

fn try_running(run_args: RunArgs) -> Result<()> {
    info!(
        "Negsim v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    // Get the configuration, either from the file system or from the
    // command line arguments, as appropriate.
    let config = if let Some(ref config_path) = run_args.config {
        info!("Loading the configuration from {}.", config_path.display());
        config::load_from_path(config_path, run_args.trace)
    } else {
        info!("Loading the configuration from the command line.");
        config::load_from_args(run_args)
    }
    .context("failed to load the configuration")?;

    info!("Loading the zone from {}.", config.zone.display());
    let zone_file = File::open(&config.zone)
        .with_context(|| format!("failed to open {}", config.zone.display()))?;
    let zone = Zone::load(BufReader::new(zone_file)).context("failed to load the zone")?;
    let oracle =
        Oracle::new(zone, config.policy.0).context("the zone does not support the policy")?;
    let mut resolver = Resolver::new(oracle);

    let input: Box<dyn BufRead> = match config.trace {
        Some(ref path) => {
            info!("Replaying the trace in {}.", path.display());
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => {
            info!("Replaying the trace from standard input.");
            Box::new(io::stdin().lock())
        }
    };
    let mut trace = TraceReader::new(input).top_level_only(config.trace_filter.top_level_only);
    let mut reporter = Reporter::new(
        BufWriter::new(io::stdout().lock()),
        config.report.format.0,
        config.report.interval,
    );

    replay(&mut resolver, &mut trace, &mut reporter).context("the replay failed")?;
    Ok(())
}
