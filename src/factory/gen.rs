//! Generated particles and generator-level missing transverse momentum

use crate::{
    error::DataError,
    factory::{Category, ObjectFactory},
    momentum::FourMomentum,
    numeric::Float,
    objects::GenParticle,
    source::{ArrayColumn, EventStore, ScalarColumn},
};

/// Bound columns of the generated particle category
#[derive(Clone, Copy, Debug)]
pub struct GenColumns<'store> {
    count: ScalarColumn<'store, i32>,
    pt: ArrayColumn<'store, Float>,
    eta: ArrayColumn<'store, Float>,
    phi: ArrayColumn<'store, Float>,
    mass: ArrayColumn<'store, Float>,
    pid: ArrayColumn<'store, i32>,
    status: ArrayColumn<'store, i32>,
    met_pt: ScalarColumn<'store, Float>,
    met_phi: ScalarColumn<'store, Float>,
}
//
impl<'store> GenColumns<'store> {
    /// Bind the generated particle columns of an event store
    pub fn bind(store: &'store EventStore) -> Result<Self, DataError> {
        Ok(Self {
            count: store.scalar("nMC")?,
            pt: store.array("mcPt")?,
            eta: store.array("mcEta")?,
            phi: store.array("mcPhi")?,
            mass: store.array("mcMass")?,
            pid: store.array("mcPID")?,
            status: store.array("mcStatus")?,
            met_pt: store.scalar("genMET")?,
            met_phi: store.scalar("genMETPhi")?,
        })
    }

    /// Missing transverse momentum of an event
    fn met(&self, event: usize) -> Result<FourMomentum, DataError> {
        let (pt, phi) = (self.met_pt.get(event)?, self.met_phi.get(event)?);
        Ok(FourMomentum::from_pt_eta_phi_m(pt, 0., phi, 0.))
    }
}
//
impl Category for GenColumns<'_> {
    type Object = GenParticle;

    const NAME: &'static str = "generated particles";

    fn count(&self, event: usize) -> Result<usize, DataError> {
        self.count.count(event)
    }

    fn extract(&self, event: usize, index: usize) -> Result<GenParticle, DataError> {
        Ok(GenParticle {
            p4: FourMomentum::from_pt_eta_phi_m(
                self.pt.get(event, index)?,
                self.eta.get(event, index)?,
                self.phi.get(event, index)?,
                self.mass.get(event, index)?,
            ),
            pid: self.pid.get(event, index)?,
            status: self.status.get(event, index)?,
        })
    }

    // Every particle is kept, classification happens at the event level
    fn admit(&self, _particle: &GenParticle) -> bool {
        true
    }
}

/// Factory of generated particles, which also provides the event's missing
/// transverse momentum
pub struct GenFactory<'store> {
    columns: GenColumns<'store>,
    particles: ObjectFactory<GenColumns<'store>>,
    met: FourMomentum,
}
//
impl<'store> GenFactory<'store> {
    /// Set up a factory from bound columns
    pub fn new(columns: GenColumns<'store>) -> Self {
        Self {
            columns,
            particles: ObjectFactory::new(columns),
            met: FourMomentum::from_pt_eta_phi_e(0., 0., 0., 0.),
        }
    }

    /// Discard the previous event and load `event`
    pub fn rebuild(&mut self, event: usize) -> Result<(), DataError> {
        self.particles.rebuild(event)?;
        self.met = self.columns.met(event)?;
        Ok(())
    }

    /// Generated particles of the current event, by decreasing pt
    pub fn particles(&self) -> &ObjectFactory<GenColumns<'store>> {
        &self.particles
    }

    /// Missing transverse momentum of the current event
    pub fn met(&self) -> &FourMomentum {
        &self.met
    }
}
