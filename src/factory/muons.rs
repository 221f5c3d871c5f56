//! Reconstructed muons

use crate::{
    error::DataError,
    factory::{Category, LeptonSelection, PfIsolationColumns},
    momentum::FourMomentum,
    numeric::Float,
    objects::{Muon, MuonId, MUON_MASS},
    source::{ArrayColumn, EventStore, ScalarColumn},
};

/// Bound columns of the muon category
#[derive(Clone, Copy, Debug)]
pub struct MuonColumns<'store> {
    count: ScalarColumn<'store, i32>,
    pt: ArrayColumn<'store, Float>,
    eta: ArrayColumn<'store, Float>,
    phi: ArrayColumn<'store, Float>,
    charge: ArrayColumn<'store, i32>,
    id_bits: ArrayColumn<'store, i32>,
    d0: ArrayColumn<'store, Float>,
    dz: ArrayColumn<'store, Float>,
    isolation: PfIsolationColumns<'store>,
    selection: LeptonSelection<MuonId>,
}
//
impl<'store> MuonColumns<'store> {
    /// Bind the muon columns of an event store
    pub fn bind(
        store: &'store EventStore,
        selection: LeptonSelection<MuonId>,
    ) -> Result<Self, DataError> {
        Ok(Self {
            count: store.scalar("nMu")?,
            pt: store.array("muPt")?,
            eta: store.array("muEta")?,
            phi: store.array("muPhi")?,
            charge: store.array("muCharge")?,
            id_bits: store.array("muIDbit")?,
            d0: store.array("muD0")?,
            dz: store.array("muDz")?,
            isolation: PfIsolationColumns::bind(store, "mu")?,
            selection,
        })
    }
}
//
impl Category for MuonColumns<'_> {
    type Object = Muon;

    const NAME: &'static str = "muons";

    fn count(&self, event: usize) -> Result<usize, DataError> {
        self.count.count(event)
    }

    fn extract(&self, event: usize, index: usize) -> Result<Muon, DataError> {
        Ok(Muon {
            p4: FourMomentum::from_pt_eta_phi_m(
                self.pt.get(event, index)?,
                self.eta.get(event, index)?,
                self.phi.get(event, index)?,
                MUON_MASS,
            ),
            charge: self.charge.get(event, index)?,
            id_bits: self.id_bits.get(event, index)?,
            d0: self.d0.get(event, index)?,
            dz: self.dz.get(event, index)?,
            isolation: self.isolation.get(event, index)?,
        })
    }

    fn admit(&self, muon: &Muon) -> bool {
        self.selection.cut.accepts(muon)
            && muon.passes_id(self.selection.id)
            && self.selection.isolated(muon.relative_isolation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        factory::{ObjectCut, ObjectFactory},
        objects::Kinematics,
        source::Column,
        testing::{EventRecord, StoreBuilder},
    };

    fn loose(max_isolation: Option<Float>) -> LeptonSelection<MuonId> {
        LeptonSelection {
            cut: ObjectCut::new(10., 2.4),
            id: MuonId::Loose,
            max_isolation,
        }
    }

    #[test]
    fn selection_requires_kinematics_and_loose_id() {
        let store = StoreBuilder::new()
            .event(
                EventRecord::new()
                    .muon(25., 0.5, 0b001)
                    .muon(40., 1.0, 0b110)
                    .muon(8., 0.1, 0b111)
                    .muon(30., 2.45, 0b111)
                    .muon(60., -2.0, 0b111),
            )
            .build();
        let columns = MuonColumns::bind(&store, loose(None)).unwrap();
        let mut factory = ObjectFactory::new(columns);
        factory.rebuild(0).unwrap();

        assert_eq!(factory.num_total(), 5);
        assert_eq!(factory.num_selected(), 2);
        let pts = factory.objects().iter().map(|m| m.pt()).collect::<Vec<_>>();
        assert_eq!(pts, [60., 25.]);
        assert!(factory.objects().iter().all(|m| columns.admit(m)));

        // Tighter working points only keep the muons which carry their bit
        let tight = LeptonSelection {
            id: MuonId::Tight,
            ..loose(None)
        };
        let mut factory = ObjectFactory::new(MuonColumns::bind(&store, tight).unwrap());
        factory.rebuild(0).unwrap();
        let pts = factory.objects().iter().map(|m| m.pt()).collect::<Vec<_>>();
        assert_eq!(pts, [60., 40.]);
    }

    #[test]
    fn isolation_requirement_is_optional() {
        let mut builder = StoreBuilder::new().event(
            EventRecord::new()
                .muon(20., 0.1, 0b001)
                .muon(50., 0.2, 0b001),
        );
        // Relative isolations of 2/20 = 0.1 and 15/50 = 0.3
        builder.replace("muPFChIso", Column::FloatArray(vec![vec![2., 15.]]));
        let store = builder.build();

        let mut factory = ObjectFactory::new(MuonColumns::bind(&store, loose(None)).unwrap());
        factory.rebuild(0).unwrap();
        assert_eq!(factory.num_selected(), 2);

        let isolated = MuonColumns::bind(&store, loose(Some(0.15))).unwrap();
        let mut factory = ObjectFactory::new(isolated);
        factory.rebuild(0).unwrap();
        assert_eq!(factory.num_selected(), 1);
        assert_eq!(factory.leading().unwrap().pt(), 20.);
    }
}
