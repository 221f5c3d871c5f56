//! Test fixtures: in-memory event stores following the upstream column layout

pub use crate::config::{
    DEFAULT_BOOSTED_TAU_ISOLATION as BOOSTED_TAU_ISOLATION,
    DEFAULT_TAU_ISOLATION as TAU_ISOLATION,
};

use crate::{
    factory::WORKING_POINTS,
    numeric::Float,
    source::{Column, EventStore},
};

use std::collections::BTreeMap;

/// Objects of one synthetic event, with sensible defaults for every field
/// which is not explicitly specified
#[derive(Clone, Debug, Default)]
pub struct EventRecord {
    gens: Vec<(Float, Float, Float, i32)>,
    jets: Vec<(Float, Float)>,
    muons: Vec<(Float, Float, i32)>,
    electrons: Vec<(Float, Float, i32)>,
    taus: Vec<(Float, Float, bool)>,
    boosted_taus: Vec<(Float, Float, bool)>,
    met: (Float, Float),
}
//
impl EventRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gen(mut self, pt: Float, eta: Float, phi: Float, pid: i32) -> Self {
        self.gens.push((pt, eta, phi, pid));
        self
    }

    pub fn jet(mut self, pt: Float, eta: Float) -> Self {
        self.jets.push((pt, eta));
        self
    }

    pub fn muon(mut self, pt: Float, eta: Float, id_bits: i32) -> Self {
        self.muons.push((pt, eta, id_bits));
        self
    }

    pub fn electron(mut self, pt: Float, eta: Float, id_bits: i32) -> Self {
        self.electrons.push((pt, eta, id_bits));
        self
    }

    pub fn tau(mut self, pt: Float, eta: Float, vloose: bool) -> Self {
        self.taus.push((pt, eta, vloose));
        self
    }

    pub fn boosted_tau(mut self, pt: Float, eta: Float, vloose: bool) -> Self {
        self.boosted_taus.push((pt, eta, vloose));
        self
    }

    pub fn met(mut self, pt: Float, phi: Float) -> Self {
        self.met = (pt, phi);
        self
    }
}

/// Builder of in-memory event stores
#[derive(Debug, Default)]
pub struct StoreBuilder {
    num_events: usize,
    columns: BTreeMap<String, Column>,
}
//
impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the store
    pub fn event(mut self, record: EventRecord) -> Self {
        let gens = &record.gens;
        self.int("nMC", gens.len());
        self.floats("mcPt", gens.iter().map(|g| g.0));
        self.floats("mcEta", gens.iter().map(|g| g.1));
        self.floats("mcPhi", gens.iter().map(|g| g.2));
        self.floats("mcMass", gens.iter().map(|_| 0.));
        self.ints("mcPID", gens.iter().map(|g| g.3));
        self.ints("mcStatus", gens.iter().map(|_| 1));
        self.float("genMET", record.met.0);
        self.float("genMETPhi", record.met.1);

        let jets = &record.jets;
        self.int("nJet", jets.len());
        self.floats("jetPt", jets.iter().map(|j| j.0));
        self.floats("jetEta", jets.iter().map(|j| j.1));
        self.floats("jetPhi", jets.iter().map(|_| 0.));
        self.floats("jetEn", jets.iter().map(|j| j.0 * j.1.cosh()));

        for (prefix, count, leptons) in [
            ("mu", "nMu", &record.muons),
            ("ele", "nEle", &record.electrons),
        ] {
            self.int(count, leptons.len());
            self.floats(&format!("{}Pt", prefix), leptons.iter().map(|l| l.0));
            self.floats(&format!("{}Eta", prefix), leptons.iter().map(|l| l.1));
            self.floats(&format!("{}Phi", prefix), leptons.iter().map(|_| 0.));
            self.ints(&format!("{}Charge", prefix), leptons.iter().map(|_| -1));
            self.ints(&format!("{}IDbit", prefix), leptons.iter().map(|l| l.2));
            self.floats(&format!("{}D0", prefix), leptons.iter().map(|_| 0.001));
            self.floats(&format!("{}Dz", prefix), leptons.iter().map(|_| 0.01));
            for kind in ["Ch", "Neu", "Pho", "PU"] {
                self.floats(&format!("{}PF{}Iso", prefix, kind), leptons.iter().map(|_| 0.));
            }
        }
        self.floats("eleSCEta", record.electrons.iter().map(|e| e.1));

        let taus = &record.taus;
        self.int("nTau", taus.len());
        self.floats("tauPt", taus.iter().map(|t| t.0));
        self.floats("tauEta", taus.iter().map(|t| t.1));
        self.floats("tauPhi", taus.iter().map(|_| 0.));
        self.floats("tauMass", taus.iter().map(|_| 1.777));
        self.floats("tauCharge", taus.iter().map(|_| 1.));
        self.ints("tauDecayMode", taus.iter().map(|_| 0));
        self.floats("tauDxy", taus.iter().map(|_| 0.));
        self.floats("tauDz", taus.iter().map(|_| 0.));
        self.isolation("tau", TAU_ISOLATION, taus);
        for flag in [
            "pfTausDiscriminationByDecayModeFinding",
            "pfTausDiscriminationByDecayModeFindingNewDMs",
            "ByLooseMuonRejection3",
            "ByTightMuonRejection3",
            "ByMVA6LooseElectronRejection",
            "ByMVA6TightElectronRejection",
        ] {
            self.bools(&format!("tau{}", flag), taus.iter().map(|_| true));
        }

        let boosted = &record.boosted_taus;
        self.int("nBoostedTau", boosted.len());
        self.floats("boostedTauPt", boosted.iter().map(|t| t.0));
        self.floats("boostedTauEta", boosted.iter().map(|t| t.1));
        for name in ["Phi", "dz", "dxy"] {
            self.floats(&format!("boostedTau{}", name), boosted.iter().map(|_| 0.));
        }
        self.floats("boostedTauMass", boosted.iter().map(|_| 1.777));
        self.floats("boostedTauCharge", boosted.iter().map(|_| -1.));
        self.ints("boostedTauDecayMode", boosted.iter().map(|_| 0));
        self.isolation("boostedTau", BOOSTED_TAU_ISOLATION, boosted);
        let mut flags = vec![
            "pfTausDiscriminationByDecayModeFinding".to_owned(),
            "pfTausDiscriminationByDecayModeFindingNewDMs".to_owned(),
            "ByLooseMuonRejection3".to_owned(),
            "ByTightMuonRejection3".to_owned(),
            "LeadChargedHadronExists".to_owned(),
        ];
        flags.extend(WORKING_POINTS.iter().map(|wp| format!("ByMVA6{}ElectronRejection", wp)));
        flags.extend(
            ["Loose", "Medium", "Tight"]
                .iter()
                .map(|wp| format!("By{}CombinedIsolationDeltaBetaCorr3Hits", wp)),
        );
        for flag in flags {
            self.bools(&format!("boostedTau{}", flag), boosted.iter().map(|_| true));
        }
        for (cone, charged) in [("Signal", 1), ("Isolation", 0)] {
            let kinds = [("ChargedHadr", charged), ("NeutrHadr", 0), ("Gamma", 0), ("", charged)];
            for (kind, count) in kinds {
                let name = format!("boostedTauNum{}PF{}Cands", cone, kind);
                self.ints(&name, boosted.iter().map(|_| count));
            }
        }

        self.num_events += 1;
        self
    }

    /// Shorten the array of one column in one event
    pub fn truncate(&mut self, name: &str, event: usize, len: usize) {
        match self.columns.get_mut(name) {
            Some(Column::IntArray(rows)) => rows[event].truncate(len),
            Some(Column::FloatArray(rows)) => rows[event].truncate(len),
            Some(Column::BoolArray(rows)) => rows[event].truncate(len),
            _ => panic!("{} is not an array column", name),
        }
    }

    /// Overwrite the contents of an existing column
    pub fn replace(&mut self, name: &str, column: Column) {
        let slot = self.columns.get_mut(name);
        *slot.unwrap_or_else(|| panic!("No column named {}", name)) = column;
    }

    /// Drop a column from the store
    pub fn remove(&mut self, name: &str) {
        assert!(self.columns.remove(name).is_some(), "No column named {}", name);
    }

    /// Build the event store
    pub fn build(self) -> EventStore {
        EventStore::from_columns(self.num_events, self.columns.into_iter().collect())
            .expect("Fixture columns should be consistent")
    }

    /// Columns of an isolation discriminator family, passing or failing every
    /// working point together
    fn isolation(&mut self, prefix: &str, family: &str, taus: &[(Float, Float, bool)]) {
        self.floats(
            &format!("{}By{}raw", prefix, family),
            taus.iter().map(|t| if t.2 { 0.9 } else { 0.1 }),
        );
        for wp in WORKING_POINTS {
            let name = format!("{}By{}{}", prefix, wp, family);
            self.bools(&name, taus.iter().map(|t| t.2));
        }
    }

    fn column(&mut self, name: &str, empty: Column) -> &mut Column {
        self.columns.entry(name.to_owned()).or_insert(empty)
    }

    fn int(&mut self, name: &str, value: usize) {
        match self.column(name, Column::Int(Vec::new())) {
            Column::Int(v) => v.push(value as i32),
            _ => unreachable!(),
        }
    }

    fn float(&mut self, name: &str, value: Float) {
        match self.column(name, Column::Float(Vec::new())) {
            Column::Float(v) => v.push(value),
            _ => unreachable!(),
        }
    }

    fn ints(&mut self, name: &str, values: impl Iterator<Item = i32>) {
        match self.column(name, Column::IntArray(Vec::new())) {
            Column::IntArray(v) => v.push(values.collect()),
            _ => unreachable!(),
        }
    }

    fn floats(&mut self, name: &str, values: impl Iterator<Item = Float>) {
        match self.column(name, Column::FloatArray(Vec::new())) {
            Column::FloatArray(v) => v.push(values.collect()),
            _ => unreachable!(),
        }
    }

    fn bools(&mut self, name: &str, values: impl Iterator<Item = bool>) {
        match self.column(name, Column::BoolArray(Vec::new())) {
            Column::BoolArray(v) => v.push(values.collect()),
            _ => unreachable!(),
        }
    }
}
