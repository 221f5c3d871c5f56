//! Mechanism for loading and sharing the analysis configuration

use crate::{
    factory::{LeptonSelection, ObjectCut, SortOrder},
    numeric::Float,
    objects::{ElectronId, MuonId},
    Result,
};

use clap::Parser;
use eyre::{ensure, WrapErr};
use log::{info, warn};
use serde::Deserialize;

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

/// Default location of the event tree inside of the input file
pub const DEFAULT_TREE: &str = "ggNtuplizer/EventTree";

/// Default isolation discriminator family of standard taus
pub const DEFAULT_TAU_ISOLATION: &str = "IsolationMVArun2v1DBoldDMwLT";

/// Default isolation discriminator family of boosted taus
pub const DEFAULT_BOOSTED_TAU_ISOLATION: &str = "IsolationMVArun2v2DBoldDMwLT";

/// Command-line interface
#[derive(Debug, Parser)]
#[command(name = "ditau_gen_study")]
#[command(about = "Generator-level study of boosted di-tau events", version)]
pub struct Cli {
    /// Input ROOT file holding the event tree
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output histogram file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Path of the event tree inside of the input file
    #[arg(short, long, default_value = DEFAULT_TREE)]
    pub tree: String,

    /// JSON file overriding (part of) the default selection
    #[arg(short, long)]
    pub selection: Option<PathBuf>,

    /// Increase verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Analysis parameters
///
/// Every field has a default, so a selection file only needs to mention the
/// parameters which it overrides.
///
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Selection {
    /// Kinematic cut on muons
    pub muon: ObjectCut,

    /// Identification working point of muons
    pub muon_id: MuonId,

    /// Upper bound on the relative isolation of muons, if any
    pub muon_max_isolation: Option<Float>,

    /// Kinematic cut on electrons
    pub electron: ObjectCut,

    /// Identification working point of electrons
    pub electron_id: ElectronId,

    /// Upper bound on the relative isolation of electrons, if any
    pub electron_max_isolation: Option<Float>,

    /// Kinematic cut on taus (which must also pass the loosest isolation)
    pub tau: ObjectCut,

    /// Kinematic cut on boosted taus (which must also pass the loosest
    /// isolation)
    pub boosted_tau: ObjectCut,

    /// Isolation discriminator family of standard taus
    pub tau_isolation: String,

    /// Isolation discriminator family of boosted taus
    pub boosted_tau_isolation: String,

    /// Ordering of the jet collection
    pub jet_order: SortOrder,

    /// The leading parton must have a pt strictly above this value
    pub lead_parton_min_pt: Float,
}
//
impl Default for Selection {
    fn default() -> Self {
        Self {
            muon: ObjectCut::new(10., 2.4),
            muon_id: MuonId::Loose,
            muon_max_isolation: None,
            electron: ObjectCut::new(10., 2.5),
            electron_id: ElectronId::Veto,
            electron_max_isolation: None,
            tau: ObjectCut::new(20., 2.3),
            boosted_tau: ObjectCut::new(20., 2.3),
            tau_isolation: DEFAULT_TAU_ISOLATION.to_owned(),
            boosted_tau_isolation: DEFAULT_BOOSTED_TAU_ISOLATION.to_owned(),
            jet_order: SortOrder::Ascending,
            lead_parton_min_pt: 400.,
        }
    }
}
//
impl Selection {
    /// Load a selection file
    pub fn load(file_name: &Path) -> Result<Self> {
        let file = File::open(file_name)?;
        let selection = serde_json::from_reader(BufReader::new(file))?;
        Ok(selection)
    }

    /// Complete selection of muons
    pub fn muons(&self) -> LeptonSelection<MuonId> {
        LeptonSelection {
            cut: self.muon,
            id: self.muon_id,
            max_isolation: self.muon_max_isolation,
        }
    }

    /// Complete selection of electrons
    pub fn electrons(&self) -> LeptonSelection<ElectronId> {
        LeptonSelection {
            cut: self.electron,
            id: self.electron_id,
            max_isolation: self.electron_max_isolation,
        }
    }

    /// Check that the selection makes sense
    fn check(&self) -> Result<()> {
        for (name, cut) in [
            ("muon", &self.muon),
            ("electron", &self.electron),
            ("tau", &self.tau),
            ("boosted_tau", &self.boosted_tau),
        ] {
            ensure!(cut.min_pt >= 0., "The {} pt threshold must not be negative", name);
            ensure!(cut.max_abs_eta > 0., "The {} |eta| bound must be positive", name);
        }
        for (name, max_isolation) in [
            ("muon", self.muon_max_isolation),
            ("electron", self.electron_max_isolation),
        ] {
            if let Some(max) = max_isolation {
                ensure!(max > 0., "The {} isolation bound must be positive", name);
            }
        }
        ensure!(
            !self.tau_isolation.is_empty() && !self.boosted_tau_isolation.is_empty(),
            "Isolation discriminator families must be named"
        );
        ensure!(
            self.lead_parton_min_pt >= 0.,
            "The leading parton pt threshold must not be negative"
        );
        Ok(())
    }
}

/// Analysis configuration
#[derive(Debug)]
pub struct Configuration {
    /// Input ROOT file holding the event tree
    pub input: PathBuf,

    /// Output histogram file
    pub output: PathBuf,

    /// Path of the event tree inside of the input file
    pub tree: String,

    /// Analysis parameters
    pub selection: Selection,
}
//
impl Configuration {
    /// Assemble the configuration from the command line and the optional
    /// selection file, check it, and print it out
    pub fn load(cli: Cli) -> Result<Self> {
        let selection = match &cli.selection {
            Some(file_name) => Selection::load(file_name).wrap_err_with(|| {
                format!("Failed to load the selection from {}", file_name.display())
            })?,
            None => Selection::default(),
        };
        selection.check().wrap_err("Invalid selection")?;

        let config = Configuration {
            input: cli.input,
            output: cli.output,
            tree: cli.tree,
            selection,
        };
        config.print();
        Ok(config)
    }

    /// Display the configuration
    pub fn print(&self) {
        let sel = &self.selection;
        let cut = |c: &ObjectCut| format!("pt > {}, |eta| < {}", c.min_pt, c.max_abs_eta);
        let iso = |max: Option<Float>| match max {
            Some(max) => format!(", relative isolation < {}", max),
            None => String::new(),
        };
        info!("Input file      : {}", self.input.display());
        info!("Event tree      : {}", self.tree);
        info!("Output file     : {}", self.output.display());
        info!(
            "Muons           : {}, {} ID{}",
            cut(&sel.muon),
            sel.muon_id,
            iso(sel.muon_max_isolation)
        );
        info!(
            "Electrons       : {}, {} ID{}",
            cut(&sel.electron),
            sel.electron_id,
            iso(sel.electron_max_isolation)
        );
        info!("Taus            : {}, VLoose {}", cut(&sel.tau), sel.tau_isolation);
        info!(
            "Boosted taus    : {}, VLoose {}",
            cut(&sel.boosted_tau),
            sel.boosted_tau_isolation
        );
        info!("Jet ordering    : {}", sel.jet_order);
        info!("Lead parton     : pt > {}", sel.lead_parton_min_pt);
        if sel.jet_order == SortOrder::Ascending {
            warn!("Jets are sorted by increasing pt, lead_gen_jet_eff uses the softest jet");
        }
    }
}
