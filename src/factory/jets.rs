//! Jets

use crate::{
    error::DataError,
    factory::{Category, SortOrder},
    momentum::FourMomentum,
    numeric::Float,
    objects::Jet,
    source::{ArrayColumn, EventStore, ScalarColumn},
};

/// Bound columns of the jet category
#[derive(Clone, Copy, Debug)]
pub struct JetColumns<'store> {
    count: ScalarColumn<'store, i32>,
    pt: ArrayColumn<'store, Float>,
    eta: ArrayColumn<'store, Float>,
    phi: ArrayColumn<'store, Float>,
    energy: ArrayColumn<'store, Float>,

    /// Jets have historically been sorted by increasing pt, unlike every
    /// other category, so the ordering is left to the configuration.
    order: SortOrder,
}
//
impl<'store> JetColumns<'store> {
    /// Bind the jet columns of an event store
    pub fn bind(store: &'store EventStore, order: SortOrder) -> Result<Self, DataError> {
        Ok(Self {
            count: store.scalar("nJet")?,
            pt: store.array("jetPt")?,
            eta: store.array("jetEta")?,
            phi: store.array("jetPhi")?,
            energy: store.array("jetEn")?,
            order,
        })
    }
}
//
impl Category for JetColumns<'_> {
    type Object = Jet;

    const NAME: &'static str = "jets";

    fn count(&self, event: usize) -> Result<usize, DataError> {
        self.count.count(event)
    }

    fn extract(&self, event: usize, index: usize) -> Result<Jet, DataError> {
        Ok(Jet {
            p4: FourMomentum::from_pt_eta_phi_e(
                self.pt.get(event, index)?,
                self.eta.get(event, index)?,
                self.phi.get(event, index)?,
                self.energy.get(event, index)?,
            ),
        })
    }

    // Jet thresholds are applied by the event selection
    fn admit(&self, _jet: &Jet) -> bool {
        true
    }

    fn sort_order(&self) -> SortOrder {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        factory::ObjectFactory,
        objects::Kinematics,
        testing::{EventRecord, StoreBuilder},
    };

    fn pts(order: SortOrder) -> Vec<Float> {
        let store = StoreBuilder::new()
            .event(EventRecord::new().jet(45., 0.).jet(450., 0.5).jet(15., 4.5))
            .build();
        let mut factory = ObjectFactory::new(JetColumns::bind(&store, order).unwrap());
        factory.rebuild(0).unwrap();
        assert_eq!(factory.num_selected(), factory.num_total());
        factory.objects().iter().map(|j| j.pt()).collect()
    }

    #[test]
    fn every_jet_is_kept() {
        assert_eq!(pts(SortOrder::Descending).len(), 3);
    }

    #[test]
    fn ordering_follows_configuration() {
        assert_eq!(pts(SortOrder::Ascending), [15., 45., 450.]);
        assert_eq!(pts(SortOrder::Descending), [450., 45., 15.]);
    }
}
