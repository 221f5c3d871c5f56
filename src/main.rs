//! ditau_gen_study: generator-level study of boosted di-tau events
//!
//!
//! # Introduction (for the physicist)
//!
//! This program looks at simulated collision events, at generator level, in
//! search of topologies where a Higgs-like boson decays into a pair of tau
//! leptons recoiling against a hard quark or gluon.
//!
//! For every event which holds at least two generated taus, it records the
//! flavor composition of the partons at increasing transverse momentum
//! thresholds, and the efficiency of a cut on the leading object's transverse
//! momentum. Events whose leading parton is hard enough additionally feed
//! angular separation histograms between the taus, the leading parton, the
//! boson and the missing transverse momentum.
//!
//!
//! # Introduction (for the computer guy)
//!
//! The program follows a simple pipeline:
//!
//! * read in parameters and bind the input columns
//! * loop over events, in batches,
//!     * rebuilding the selected objects of every category,
//!     * classifying the generated particles by role,
//!     * filling histograms if the event passes the di-tau gates
//! * merge the batch results, then display / store them.

#![warn(missing_docs)]

mod analysis;
mod classify;
mod config;
mod error;
mod factory;
mod histo;
mod momentum;
mod numeric;
mod objects;
mod output;
mod scheduling;
mod source;
#[cfg(test)]
mod testing;

use clap::Parser;
use eyre::{ensure, WrapErr};

use crate::{
    analysis::Bindings,
    config::{Cli, Configuration},
    source::EventStore,
};

use std::time::Instant;

/// We'll use eyre's type-erased result type throughout the application
type Result<T> = eyre::Result<T>;

/// This will act as our main function, with suitable error handling
fn main() -> Result<()> {
    // ### CONFIGURATION READOUT ###

    // Parse the command line and set up logging accordingly
    let cli = Cli::parse();
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // The work of loading, parsing, and checking the configuration is offloaded
    // to a dedicated struct
    let cfg = Configuration::load(cli).wrap_err("Failed to load the configuration")?;

    // ### ANALYSIS INITIALIZATION ###

    // Load the input events and bind the columns of every object category
    let store = EventStore::open(&cfg.input, &cfg.tree)
        .wrap_err_with(|| format!("Failed to open {}", cfg.input.display()))?;
    ensure!(store.num_events() > 0, "The input event tree holds no events");
    let bindings =
        Bindings::bind(&store, &cfg.selection).wrap_err("Failed to bind the input columns")?;

    // Start the clock after input I/O, to avoid IO-induced timing fluctuations
    let saved_time = Instant::now();

    // ### ANALYSIS EXECUTION ###

    // This kernel analyzes a range of events and returns the accumulated
    // intermediary results
    let results = scheduling::run_analysis(store.num_events(), |events, progress| {
        analysis::analyze_events(&bindings, events, progress)
    })?;

    // ### RESULTS DISPLAY AND STORAGE ###

    // Measure how much time has elapsed
    let elapsed_time = saved_time.elapsed();

    // Send the results to the log and to disk
    output::dump_results(&cfg, &results, elapsed_time).wrap_err("Failed to output the results")?;

    // ...and we're done
    Ok(())
}
