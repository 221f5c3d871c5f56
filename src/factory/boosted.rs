//! Hadronically decaying taus, reconstructed for boosted topologies

use crate::{
    error::DataError,
    factory::{Category, IsolationColumns, ObjectCut},
    momentum::FourMomentum,
    numeric::Float,
    objects::{BoostedTau, ElectronRejection, PfCandidateCounts},
    source::{ArrayColumn, EventStore, ScalarColumn},
};

/// Bound columns counting particle-flow candidates in a tau cone
#[derive(Clone, Copy, Debug)]
struct CandidateColumns<'store> {
    charged_hadrons: ArrayColumn<'store, i32>,
    neutral_hadrons: ArrayColumn<'store, i32>,
    gammas: ArrayColumn<'store, i32>,
    total: ArrayColumn<'store, i32>,
}
//
impl<'store> CandidateColumns<'store> {
    /// Bind "boostedTauNum<cone>PF{ChargedHadr,NeutrHadr,Gamma,}Cands"
    fn bind(store: &'store EventStore, cone: &str) -> Result<Self, DataError> {
        let cands =
            |kind: &str| store.array::<i32>(&format!("boostedTauNum{}PF{}Cands", cone, kind));
        Ok(Self {
            charged_hadrons: cands("ChargedHadr")?,
            neutral_hadrons: cands("NeutrHadr")?,
            gammas: cands("Gamma")?,
            total: cands("")?,
        })
    }

    fn get(&self, event: usize, index: usize) -> Result<PfCandidateCounts, DataError> {
        Ok(PfCandidateCounts {
            charged_hadrons: self.charged_hadrons.get(event, index)?,
            neutral_hadrons: self.neutral_hadrons.get(event, index)?,
            gammas: self.gammas.get(event, index)?,
            total: self.total.get(event, index)?,
        })
    }
}

/// Bound columns of the boosted tau category
#[derive(Clone, Copy, Debug)]
pub struct BoostedTauColumns<'store> {
    count: ScalarColumn<'store, i32>,
    pt: ArrayColumn<'store, Float>,
    eta: ArrayColumn<'store, Float>,
    phi: ArrayColumn<'store, Float>,
    mass: ArrayColumn<'store, Float>,
    charge: ArrayColumn<'store, Float>,
    dz: ArrayColumn<'store, Float>,
    dxy: ArrayColumn<'store, Float>,
    isolation: IsolationColumns<'store>,
    decay_mode: ArrayColumn<'store, i32>,
    decay_mode_finding: ArrayColumn<'store, bool>,
    decay_mode_finding_new_dms: ArrayColumn<'store, bool>,
    electron_rejection: [ArrayColumn<'store, bool>; 5],
    loose_muon_rejection: ArrayColumn<'store, bool>,
    tight_muon_rejection: ArrayColumn<'store, bool>,
    combined_isolation: [ArrayColumn<'store, bool>; 3],
    lead_charged_hadron_exists: ArrayColumn<'store, bool>,
    signal_candidates: CandidateColumns<'store>,
    isolation_candidates: CandidateColumns<'store>,
    cut: ObjectCut,
}
//
impl<'store> BoostedTauColumns<'store> {
    /// Bind the boosted tau columns of an event store, using the named
    /// isolation discriminator family
    pub fn bind(
        store: &'store EventStore,
        cut: ObjectCut,
        isolation_family: &str,
    ) -> Result<Self, DataError> {
        let flag = |name: &str| store.array::<bool>(&format!("boostedTau{}", name));
        let electron_rejection = |wp: &str| flag(&format!("ByMVA6{}ElectronRejection", wp));
        let combined_isolation =
            |wp: &str| flag(&format!("By{}CombinedIsolationDeltaBetaCorr3Hits", wp));
        Ok(Self {
            count: store.scalar("nBoostedTau")?,
            pt: store.array("boostedTauPt")?,
            eta: store.array("boostedTauEta")?,
            phi: store.array("boostedTauPhi")?,
            mass: store.array("boostedTauMass")?,
            charge: store.array("boostedTauCharge")?,
            dz: store.array("boostedTaudz")?,
            dxy: store.array("boostedTaudxy")?,
            isolation: IsolationColumns::bind(store, "boostedTau", isolation_family)?,
            decay_mode: store.array("boostedTauDecayMode")?,
            decay_mode_finding: flag("pfTausDiscriminationByDecayModeFinding")?,
            decay_mode_finding_new_dms: flag("pfTausDiscriminationByDecayModeFindingNewDMs")?,
            electron_rejection: [
                electron_rejection("VLoose")?,
                electron_rejection("Loose")?,
                electron_rejection("Medium")?,
                electron_rejection("Tight")?,
                electron_rejection("VTight")?,
            ],
            loose_muon_rejection: flag("ByLooseMuonRejection3")?,
            tight_muon_rejection: flag("ByTightMuonRejection3")?,
            combined_isolation: [
                combined_isolation("Loose")?,
                combined_isolation("Medium")?,
                combined_isolation("Tight")?,
            ],
            lead_charged_hadron_exists: flag("LeadChargedHadronExists")?,
            signal_candidates: CandidateColumns::bind(store, "Signal")?,
            isolation_candidates: CandidateColumns::bind(store, "Isolation")?,
            cut,
        })
    }
}
//
impl Category for BoostedTauColumns<'_> {
    type Object = BoostedTau;

    const NAME: &'static str = "boosted taus";

    fn count(&self, event: usize) -> Result<usize, DataError> {
        self.count.count(event)
    }

    fn extract(&self, event: usize, index: usize) -> Result<BoostedTau, DataError> {
        let [vloose, loose, medium, tight, vtight] = self.electron_rejection;
        let [loose_iso, medium_iso, tight_iso] = self.combined_isolation;
        Ok(BoostedTau {
            p4: FourMomentum::from_pt_eta_phi_m(
                self.pt.get(event, index)?,
                self.eta.get(event, index)?,
                self.phi.get(event, index)?,
                self.mass.get(event, index)?,
            ),
            charge: self.charge.get(event, index)?,
            dz: self.dz.get(event, index)?,
            dxy: self.dxy.get(event, index)?,
            isolation: self.isolation.get(event, index)?,
            decay_mode: self.decay_mode.get(event, index)?,
            decay_mode_finding: self.decay_mode_finding.get(event, index)?,
            decay_mode_finding_new_dms: self.decay_mode_finding_new_dms.get(event, index)?,
            electron_rejection: ElectronRejection {
                vloose: vloose.get(event, index)?,
                loose: loose.get(event, index)?,
                medium: medium.get(event, index)?,
                tight: tight.get(event, index)?,
                vtight: vtight.get(event, index)?,
            },
            loose_muon_rejection: self.loose_muon_rejection.get(event, index)?,
            tight_muon_rejection: self.tight_muon_rejection.get(event, index)?,
            combined_isolation: [
                loose_iso.get(event, index)?,
                medium_iso.get(event, index)?,
                tight_iso.get(event, index)?,
            ],
            lead_charged_hadron_exists: self.lead_charged_hadron_exists.get(event, index)?,
            signal_candidates: self.signal_candidates.get(event, index)?,
            isolation_candidates: self.isolation_candidates.get(event, index)?,
        })
    }

    fn admit(&self, tau: &BoostedTau) -> bool {
        self.cut.accepts(tau) && tau.isolation.vloose
    }
}
