//! Reconstructed electrons

use crate::{
    error::DataError,
    factory::{Category, LeptonSelection, PfIsolationColumns},
    momentum::FourMomentum,
    numeric::Float,
    objects::{Electron, ElectronId, ELECTRON_MASS},
    source::{ArrayColumn, EventStore, ScalarColumn},
};

/// Bound columns of the electron category
#[derive(Clone, Copy, Debug)]
pub struct ElectronColumns<'store> {
    count: ScalarColumn<'store, i32>,
    pt: ArrayColumn<'store, Float>,
    eta: ArrayColumn<'store, Float>,
    phi: ArrayColumn<'store, Float>,
    charge: ArrayColumn<'store, i32>,
    id_bits: ArrayColumn<'store, i32>,
    d0: ArrayColumn<'store, Float>,
    dz: ArrayColumn<'store, Float>,
    sc_eta: ArrayColumn<'store, Float>,
    isolation: PfIsolationColumns<'store>,
    selection: LeptonSelection<ElectronId>,
}
//
impl<'store> ElectronColumns<'store> {
    /// Bind the electron columns of an event store
    pub fn bind(
        store: &'store EventStore,
        selection: LeptonSelection<ElectronId>,
    ) -> Result<Self, DataError> {
        Ok(Self {
            count: store.scalar("nEle")?,
            pt: store.array("elePt")?,
            eta: store.array("eleEta")?,
            phi: store.array("elePhi")?,
            charge: store.array("eleCharge")?,
            id_bits: store.array("eleIDbit")?,
            d0: store.array("eleD0")?,
            dz: store.array("eleDz")?,
            sc_eta: store.array("eleSCEta")?,
            isolation: PfIsolationColumns::bind(store, "ele")?,
            selection,
        })
    }
}
//
impl Category for ElectronColumns<'_> {
    type Object = Electron;

    const NAME: &'static str = "electrons";

    fn count(&self, event: usize) -> Result<usize, DataError> {
        self.count.count(event)
    }

    fn extract(&self, event: usize, index: usize) -> Result<Electron, DataError> {
        Ok(Electron {
            p4: FourMomentum::from_pt_eta_phi_m(
                self.pt.get(event, index)?,
                self.eta.get(event, index)?,
                self.phi.get(event, index)?,
                ELECTRON_MASS,
            ),
            charge: self.charge.get(event, index)?,
            id_bits: self.id_bits.get(event, index)?,
            d0: self.d0.get(event, index)?,
            dz: self.dz.get(event, index)?,
            sc_eta: self.sc_eta.get(event, index)?,
            isolation: self.isolation.get(event, index)?,
        })
    }

    fn admit(&self, electron: &Electron) -> bool {
        self.selection.cut.accepts(electron)
            && electron.passes_id(self.selection.id)
            && self.selection.isolated(electron.relative_isolation())
    }
}
