//! Per-event analysis: object reconstruction, di-tau classification, and
//! filling of the study's histograms
//!
//! Each event goes through two gates. Gate A requires at least two generated
//! taus, gate B requires a hard leading parton. Events which fail a gate stop
//! contributing to histograms at that point, which is not an error.

use crate::{
    classify::{flavor, RoleBuckets},
    config::Selection,
    error::DataError,
    factory::{
        BoostedTauColumns, Category, ElectronColumns, GenColumns, GenFactory, JetColumns,
        MuonColumns, ObjectFactory, TauColumns,
    },
    histo::{Histogram1D, HistogramBook, HistogramSink},
    numeric::Float,
    objects::Kinematics,
    scheduling::Progress,
    source::EventStore,
    Result,
};

use eyre::WrapErr;
use log::{debug, trace};
use serde::Serialize;

use std::{collections::BTreeMap, ops::Range};

/// Counter of processed events
pub const NEVENTS: &str = "nevents";

/// Flavor composition of the partons, without pt threshold
pub const PT0_JET_FLAVOR: &str = "pt0_jet_flavor";

/// Flavor composition of the partons above increasing pt thresholds
pub const FLAVOR_THRESHOLDS: [(&str, Float); 3] = [
    ("pt400_jet_flavor", 400.),
    ("pt600_jet_flavor", 600.),
    ("pt800_jet_flavor", 800.),
];

/// Cumulative pt distribution of the first jet of the jet collection
pub const LEAD_GEN_JET_EFF: &str = "lead_gen_jet_eff";

/// Cumulative pt distribution of the leading parton
pub const LEAD_JET_EFF: &str = "lead_jet_eff";

/// Flavor of the leading parton of selected events
pub const LEAD_JET_FLAVOR: &str = "lead_jet_flavor";

/// Angular separation of the two leading taus
pub const DR_TAUS: &str = "dr_taus";

/// Azimuthal difference of the two leading taus
pub const DPHI_TAUS: &str = "dphi_taus";

/// Angular separation of the leading parton and missing momentum
pub const DR_JET_MET: &str = "dr_jet_MET";

/// Angular separation of the leading Higgs and missing momentum
pub const DR_HIGGS_MET: &str = "dr_higgs_MET";

/// Weight of every observation (generator-level events are unweighted)
const WEIGHT: Float = 1.;

/// Book the histograms which the analysis fills
pub fn book_histograms() -> HistogramBook {
    let mut book = HistogramBook::new();
    let flavor = |name: &str, title: &str| Histogram1D::new(name, title, 8, -0.5, 7.5);
    let eff = |name: &str, title: &str| Histogram1D::new(name, title, 100, 0., 1000.);
    let dr = |name: &str, title: &str| Histogram1D::new(name, title, 50, 0., 5.);

    book.book(Histogram1D::new(NEVENTS, "Processed events", 2, 0., 2.));
    book.book(flavor(PT0_JET_FLAVOR, "Parton flavor"));
    for (name, threshold) in FLAVOR_THRESHOLDS {
        book.book(flavor(name, &format!("Parton flavor, pt > {}", threshold)));
    }
    book.book(flavor(LEAD_JET_FLAVOR, "Leading parton flavor"));
    book.book(eff(LEAD_GEN_JET_EFF, "Events with a jet above pt"));
    book.book(eff(LEAD_JET_EFF, "Events with a parton above pt"));
    book.book(dr(DR_TAUS, "#DeltaR(#tau, #tau)"));
    book.book(Histogram1D::new(DPHI_TAUS, "#Delta#phi(#tau, #tau)", 64, -3.2, 3.2));
    book.book(dr(DR_JET_MET, "#DeltaR(parton, MET)"));
    book.book(dr(DR_HIGGS_MET, "#DeltaR(H, MET)"));
    book
}

/// Column bindings of every object category
///
/// These are set up once per run and shared by every worker.
///
#[derive(Clone, Copy, Debug)]
pub struct Bindings<'store> {
    gen: GenColumns<'store>,
    jets: JetColumns<'store>,
    muons: MuonColumns<'store>,
    electrons: ElectronColumns<'store>,
    taus: TauColumns<'store>,
    boosted_taus: BoostedTauColumns<'store>,
    lead_parton_min_pt: Float,
}
//
impl<'store> Bindings<'store> {
    /// Bind the columns of every object category, according to the selection
    pub fn bind(
        store: &'store EventStore,
        selection: &Selection,
    ) -> std::result::Result<Self, DataError> {
        Ok(Self {
            gen: GenColumns::bind(store)?,
            jets: JetColumns::bind(store, selection.jet_order)?,
            muons: MuonColumns::bind(store, selection.muons())?,
            electrons: ElectronColumns::bind(store, selection.electrons())?,
            taus: TauColumns::bind(store, selection.tau, &selection.tau_isolation)?,
            boosted_taus: BoostedTauColumns::bind(
                store,
                selection.boosted_tau,
                &selection.boosted_tau_isolation,
            )?,
            lead_parton_min_pt: selection.lead_parton_min_pt,
        })
    }
}

/// Raw and selected object counts of one category, summed over events
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ObjectTally {
    /// Number of raw objects
    pub total: u64,

    /// Number of objects which passed selection
    pub selected: u64,
}

/// Object tallies of every category, keyed by category name
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ObjectTallies(BTreeMap<&'static str, ObjectTally>);
//
impl ObjectTallies {
    /// Account for the current collection of a factory
    fn record<C: Category>(&mut self, factory: &ObjectFactory<C>) {
        let tally = self.0.entry(C::NAME).or_default();
        tally.total += factory.num_total() as u64;
        tally.selected += factory.num_selected() as u64;
    }

    /// Iterate over the tallies, by category name
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ObjectTally)> {
        self.0.iter().map(|(name, tally)| (*name, tally))
    }

    /// Add the tallies of another set of events
    pub fn merge(&mut self, other: &Self) {
        for (name, tally) in other.iter() {
            let mine = self.0.entry(name).or_default();
            mine.total += tally.total;
            mine.selected += tally.selected;
        }
    }
}

/// Accumulated results of the analysis over a set of events
#[derive(Clone, Debug)]
pub struct AnalysisResults {
    /// Number of processed events
    pub num_events: usize,

    /// Filled histograms
    pub histograms: HistogramBook,

    /// Object counts of every category
    pub tallies: ObjectTallies,
}
//
impl AnalysisResults {
    /// Integrate the results of another set of events
    pub fn merge(&mut self, other: &Self) {
        self.num_events += other.num_events;
        self.histograms.merge(&other.histograms);
        self.tallies.merge(&other.tallies);
    }
}

/// Per-event analysis driver, owning one factory per object category
pub struct EventProcessor<'store> {
    gen: GenFactory<'store>,
    jets: ObjectFactory<JetColumns<'store>>,
    muons: ObjectFactory<MuonColumns<'store>>,
    electrons: ObjectFactory<ElectronColumns<'store>>,
    taus: ObjectFactory<TauColumns<'store>>,
    boosted_taus: ObjectFactory<BoostedTauColumns<'store>>,
    lead_parton_min_pt: Float,
    num_events: usize,
    tallies: ObjectTallies,
}
//
impl<'store> EventProcessor<'store> {
    /// Set up the factories of every object category
    pub fn new(bindings: &Bindings<'store>) -> Self {
        Self {
            gen: GenFactory::new(bindings.gen),
            jets: ObjectFactory::new(bindings.jets),
            muons: ObjectFactory::new(bindings.muons),
            electrons: ObjectFactory::new(bindings.electrons),
            taus: ObjectFactory::new(bindings.taus),
            boosted_taus: ObjectFactory::new(bindings.boosted_taus),
            lead_parton_min_pt: bindings.lead_parton_min_pt,
            num_events: 0,
            tallies: ObjectTallies::default(),
        }
    }

    /// Analyze one event, sending observations to `sink`
    ///
    /// Only data faults are reported as errors. Events which fail one of the
    /// gates simply produce fewer observations.
    ///
    pub fn process(&mut self, event: usize, sink: &mut impl HistogramSink) -> Result<()> {
        // Keep track of the number of events processed
        sink.fill(NEVENTS, 1., WEIGHT);
        self.num_events += 1;

        // Run all the factories
        self.rebuild_all(event)?;

        // Only look at di-tau events
        let Some(buckets) = RoleBuckets::classify(self.gen.particles().objects()) else {
            trace!("Event {} has fewer than two generated taus", event);
            return Ok(());
        };

        // Parton composition, at increasing pt thresholds
        for parton in &buckets.partons {
            let flavor = flavor(parton.pid) as Float;
            sink.fill(PT0_JET_FLAVOR, flavor, WEIGHT);
            for (name, threshold) in FLAVOR_THRESHOLDS {
                if parton.pt() > threshold {
                    sink.fill(name, flavor, WEIGHT);
                }
            }
        }

        // Leading object pt, for selection efficiency studies
        if let Some(jet) = self.jets.leading() {
            sink.fill_cumulative(LEAD_GEN_JET_EFF, jet.pt(), WEIGHT);
        }
        if let Some(parton) = buckets.leading_parton() {
            sink.fill_cumulative(LEAD_JET_EFF, parton.pt(), WEIGHT);
        }

        // Require a high pt leading parton
        let lead_parton = match buckets.leading_parton() {
            Some(parton) if parton.pt() > self.lead_parton_min_pt => parton,
            _ => {
                trace!("Event {} has no hard leading parton", event);
                return Ok(());
            }
        };

        // Final observables
        let met = self.gen.met();
        let (tau1, tau2) = (&buckets.taus[0].p4, &buckets.taus[1].p4);
        sink.fill(LEAD_JET_FLAVOR, flavor(lead_parton.pid) as Float, WEIGHT);
        sink.fill(DR_TAUS, tau1.delta_r(tau2), WEIGHT);
        sink.fill(DPHI_TAUS, tau1.delta_phi(tau2), WEIGHT);
        sink.fill(DR_JET_MET, lead_parton.p4.delta_r(met), WEIGHT);
        if let Some(higgs) = buckets.leading_boson() {
            sink.fill(DR_HIGGS_MET, higgs.p4.delta_r(met), WEIGHT);
        }
        trace!("Event {} passed all gates", event);
        Ok(())
    }

    /// Rebuild every object collection for `event`
    fn rebuild_all(&mut self, event: usize) -> Result<()> {
        self.gen
            .rebuild(event)
            .wrap_err_with(|| rebuild_failure::<GenColumns>(event))?;
        rebuild(&mut self.jets, event)?;
        rebuild(&mut self.muons, event)?;
        rebuild(&mut self.electrons, event)?;
        rebuild(&mut self.taus, event)?;
        rebuild(&mut self.boosted_taus, event)?;

        self.tallies.record(self.gen.particles());
        self.tallies.record(&self.jets);
        self.tallies.record(&self.muons);
        self.tallies.record(&self.electrons);
        self.tallies.record(&self.taus);
        self.tallies.record(&self.boosted_taus);
        Ok(())
    }

    /// Package the accumulated results together with a histogram book
    pub fn finish(self, histograms: HistogramBook) -> AnalysisResults {
        AnalysisResults {
            num_events: self.num_events,
            histograms,
            tallies: self.tallies,
        }
    }
}

/// Rebuild one factory, attaching the category and event to any fault
fn rebuild<C: Category>(factory: &mut ObjectFactory<C>, event: usize) -> Result<()> {
    factory
        .rebuild(event)
        .wrap_err_with(|| rebuild_failure::<C>(event))
}

/// Error message of a failed rebuild
fn rebuild_failure<C: Category>(event: usize) -> String {
    format!("Failed to rebuild the {} of event {}", C::NAME, event)
}

/// Analyze a range of events into a fresh histogram book
///
/// This is the kernel which the scheduler runs for each batch of events.
///
pub fn analyze_events(
    bindings: &Bindings<'_>,
    events: Range<usize>,
    progress: &Progress,
) -> Result<AnalysisResults> {
    let first_event = events.start;
    let mut processor = EventProcessor::new(bindings);
    let mut histograms = book_histograms();
    for event in events {
        processor.process(event, &mut histograms)?;
        progress.event_done();
    }
    debug!("Processed {} events from event {}", processor.num_events, first_event);
    Ok(processor.finish(histograms))
}
