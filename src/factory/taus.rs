//! Hadronically decaying taus, standard reconstruction

use crate::{
    error::DataError,
    factory::{Category, IsolationColumns, ObjectCut},
    momentum::FourMomentum,
    numeric::Float,
    objects::Tau,
    source::{ArrayColumn, EventStore, ScalarColumn},
};

/// Bound columns of the tau category
#[derive(Clone, Copy, Debug)]
pub struct TauColumns<'store> {
    count: ScalarColumn<'store, i32>,
    pt: ArrayColumn<'store, Float>,
    eta: ArrayColumn<'store, Float>,
    phi: ArrayColumn<'store, Float>,
    mass: ArrayColumn<'store, Float>,
    charge: ArrayColumn<'store, Float>,
    decay_mode: ArrayColumn<'store, i32>,
    dxy: ArrayColumn<'store, Float>,
    dz: ArrayColumn<'store, Float>,
    isolation: IsolationColumns<'store>,
    decay_mode_finding: ArrayColumn<'store, bool>,
    decay_mode_finding_new_dms: ArrayColumn<'store, bool>,
    loose_muon_rejection: ArrayColumn<'store, bool>,
    tight_muon_rejection: ArrayColumn<'store, bool>,
    loose_electron_rejection: ArrayColumn<'store, bool>,
    tight_electron_rejection: ArrayColumn<'store, bool>,
    cut: ObjectCut,
}
//
impl<'store> TauColumns<'store> {
    /// Bind the tau columns of an event store, using the named isolation
    /// discriminator family
    pub fn bind(
        store: &'store EventStore,
        cut: ObjectCut,
        isolation_family: &str,
    ) -> Result<Self, DataError> {
        Ok(Self {
            count: store.scalar("nTau")?,
            pt: store.array("tauPt")?,
            eta: store.array("tauEta")?,
            phi: store.array("tauPhi")?,
            mass: store.array("tauMass")?,
            charge: store.array("tauCharge")?,
            decay_mode: store.array("tauDecayMode")?,
            dxy: store.array("tauDxy")?,
            dz: store.array("tauDz")?,
            isolation: IsolationColumns::bind(store, "tau", isolation_family)?,
            decay_mode_finding: store.array("taupfTausDiscriminationByDecayModeFinding")?,
            decay_mode_finding_new_dms: store
                .array("taupfTausDiscriminationByDecayModeFindingNewDMs")?,
            loose_muon_rejection: store.array("tauByLooseMuonRejection3")?,
            tight_muon_rejection: store.array("tauByTightMuonRejection3")?,
            loose_electron_rejection: store.array("tauByMVA6LooseElectronRejection")?,
            tight_electron_rejection: store.array("tauByMVA6TightElectronRejection")?,
            cut,
        })
    }
}
//
impl Category for TauColumns<'_> {
    type Object = Tau;

    const NAME: &'static str = "taus";

    fn count(&self, event: usize) -> Result<usize, DataError> {
        self.count.count(event)
    }

    fn extract(&self, event: usize, index: usize) -> Result<Tau, DataError> {
        Ok(Tau {
            p4: FourMomentum::from_pt_eta_phi_m(
                self.pt.get(event, index)?,
                self.eta.get(event, index)?,
                self.phi.get(event, index)?,
                self.mass.get(event, index)?,
            ),
            charge: self.charge.get(event, index)?,
            decay_mode: self.decay_mode.get(event, index)?,
            dxy: self.dxy.get(event, index)?,
            dz: self.dz.get(event, index)?,
            isolation: self.isolation.get(event, index)?,
            decay_mode_finding: self.decay_mode_finding.get(event, index)?,
            decay_mode_finding_new_dms: self.decay_mode_finding_new_dms.get(event, index)?,
            loose_muon_rejection: self.loose_muon_rejection.get(event, index)?,
            tight_muon_rejection: self.tight_muon_rejection.get(event, index)?,
            loose_electron_rejection: self.loose_electron_rejection.get(event, index)?,
            tight_electron_rejection: self.tight_electron_rejection.get(event, index)?,
        })
    }

    fn admit(&self, tau: &Tau) -> bool {
        self.cut.accepts(tau) && tau.isolation.vloose
    }
}
