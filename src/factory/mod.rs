//! Reconstruction of per-event physics object collections
//!
//! Each object category reads its own set of columns: one object count per
//! event, and several arrays which are indexed in lock-step. The shared
//! `ObjectFactory` scans those arrays for the current event, keeps the objects
//! which pass the category's selection, and sorts them by transverse momentum.
//! What differs between categories (column set, record type, selection and
//! ordering) is expressed through the `Category` trait.

mod boosted;
mod electrons;
mod gen;
mod jets;
mod muons;
mod taus;

pub use self::{
    boosted::BoostedTauColumns,
    electrons::ElectronColumns,
    gen::{GenColumns, GenFactory},
    jets::JetColumns,
    muons::MuonColumns,
    taus::TauColumns,
};

use crate::{
    error::DataError,
    numeric::Float,
    objects::{IsolationWorkingPoints, Kinematics, PfIsolation},
    source::{ArrayColumn, EventStore},
};

use serde::Deserialize;

use std::fmt;

/// Standard working points of isolation discriminators, as spelled in the
/// names of the upstream columns
pub const WORKING_POINTS: [&str; 5] = ["VLoose", "Loose", "Medium", "Tight", "VTight"];

/// Ordering of a rebuilt object collection
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Increasing transverse momentum (lowest pt first)
    Ascending,

    /// Decreasing transverse momentum (leading object first)
    Descending,
}
//
impl SortOrder {
    /// Sort objects by transverse momentum, preserving the original order of
    /// objects with equal pt
    pub fn sort<T: Kinematics>(self, objects: &mut [T]) {
        match self {
            SortOrder::Ascending => objects.sort_by(|a, b| a.pt().total_cmp(&b.pt())),
            SortOrder::Descending => objects.sort_by(|a, b| b.pt().total_cmp(&a.pt())),
        }
    }
}
//
impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

/// Kinematic part of an object selection
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ObjectCut {
    /// Transverse momentum must be strictly above this value
    pub min_pt: Float,

    /// Absolute pseudorapidity must be strictly below this value
    pub max_abs_eta: Float,
}
//
impl ObjectCut {
    /// Set up a kinematic cut
    pub const fn new(min_pt: Float, max_abs_eta: Float) -> Self {
        Self { min_pt, max_abs_eta }
    }

    /// Decide whether an object passes the cut
    pub fn accepts(&self, object: &impl Kinematics) -> bool {
        object.pt() > self.min_pt && object.eta().abs() < self.max_abs_eta
    }
}

/// Selection of charged leptons: kinematic cut, identification working point
/// and optional isolation requirement
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeptonSelection<Id> {
    /// Kinematic cut
    pub cut: ObjectCut,

    /// Identification working point which must be passed
    pub id: Id,

    /// Relative isolation must be strictly below this value, if set
    pub max_isolation: Option<Float>,
}
//
impl<Id> LeptonSelection<Id> {
    /// Decide whether a relative isolation value passes the requirement
    pub fn isolated(&self, relative_isolation: Float) -> bool {
        self.max_isolation.map_or(true, |max| relative_isolation < max)
    }
}

/// Object category, as seen by the generic factory
///
/// Implementors hold their bound columns, and are cheap to copy so that every
/// worker can own its factories.
///
pub trait Category: Copy {
    /// Record type produced for this category
    type Object: Kinematics;

    /// Human-readable category name, for reporting
    const NAME: &'static str;

    /// Number of raw objects of this category in an event
    fn count(&self, event: usize) -> Result<usize, DataError>;

    /// Build the full record of one raw object
    fn extract(&self, event: usize, index: usize) -> Result<Self::Object, DataError>;

    /// Decide whether an object belongs in the selected collection
    fn admit(&self, object: &Self::Object) -> bool;

    /// Ordering of the selected collection
    fn sort_order(&self) -> SortOrder {
        SortOrder::Descending
    }
}

/// Per-event builder and owner of one category's object collection
pub struct ObjectFactory<C: Category> {
    /// Bound columns and selection of the category
    category: C,

    /// Selected objects of the current event
    objects: Vec<C::Object>,

    /// Number of raw objects in the current event
    num_total: usize,
}
//
impl<C: Category> ObjectFactory<C> {
    /// Set up a factory, initially holding an empty collection
    pub fn new(category: C) -> Self {
        Self {
            category,
            objects: Vec::new(),
            num_total: 0,
        }
    }

    /// Discard the previous collection and build the one of `event`
    ///
    /// On error, the factory is left with an empty collection.
    ///
    pub fn rebuild(&mut self, event: usize) -> Result<(), DataError> {
        self.objects.clear();
        self.num_total = 0;
        let result = self.scan(event);
        if result.is_err() {
            self.objects.clear();
        }
        result
    }

    /// Scan the raw objects of an event, keeping those which pass selection
    fn scan(&mut self, event: usize) -> Result<(), DataError> {
        let count = self.category.count(event)?;
        for index in 0..count {
            let object = self.category.extract(event, index)?;
            if self.category.admit(&object) {
                self.objects.push(object);
            }
        }
        self.category.sort_order().sort(&mut self.objects);
        self.num_total = count;
        Ok(())
    }

    /// Number of raw objects in the current event
    pub fn num_total(&self) -> usize {
        self.num_total
    }

    /// Number of selected objects in the current event
    pub fn num_selected(&self) -> usize {
        self.objects.len()
    }

    /// Selected objects of the current event
    pub fn objects(&self) -> &[C::Object] {
        &self.objects
    }

    /// First object of the collection, in the category's ordering
    pub fn leading(&self) -> Option<&C::Object> {
        self.objects.first()
    }
}

/// Bound columns of an isolation discriminator family
#[derive(Clone, Copy, Debug)]
pub struct IsolationColumns<'store> {
    raw: ArrayColumn<'store, Float>,
    working_points: [ArrayColumn<'store, bool>; 5],
}
//
impl<'store> IsolationColumns<'store> {
    /// Bind "<prefix>By<family>raw" and "<prefix>By<WP><family>" columns
    pub fn bind(
        store: &'store EventStore,
        prefix: &str,
        family: &str,
    ) -> Result<Self, DataError> {
        let wp = |idx: usize| {
            store.array::<bool>(&format!("{}By{}{}", prefix, WORKING_POINTS[idx], family))
        };
        Ok(Self {
            raw: store.array(&format!("{}By{}raw", prefix, family))?,
            working_points: [wp(0)?, wp(1)?, wp(2)?, wp(3)?, wp(4)?],
        })
    }

    /// Read the discriminator outcome of one object
    pub fn get(&self, event: usize, index: usize) -> Result<IsolationWorkingPoints, DataError> {
        let [vloose, loose, medium, tight, vtight] = self.working_points;
        Ok(IsolationWorkingPoints {
            raw: self.raw.get(event, index)?,
            vloose: vloose.get(event, index)?,
            loose: loose.get(event, index)?,
            medium: medium.get(event, index)?,
            tight: tight.get(event, index)?,
            vtight: vtight.get(event, index)?,
        })
    }
}

/// Bound particle-flow isolation columns of a lepton category
#[derive(Clone, Copy, Debug)]
pub struct PfIsolationColumns<'store> {
    charged_hadrons: ArrayColumn<'store, Float>,
    neutral_hadrons: ArrayColumn<'store, Float>,
    photons: ArrayColumn<'store, Float>,
    pileup: ArrayColumn<'store, Float>,
}
//
impl<'store> PfIsolationColumns<'store> {
    /// Bind "<prefix>PF{Ch,Neu,Pho,PU}Iso" columns
    pub fn bind(store: &'store EventStore, prefix: &str) -> Result<Self, DataError> {
        let iso = |kind: &str| store.array::<Float>(&format!("{}PF{}Iso", prefix, kind));
        Ok(Self {
            charged_hadrons: iso("Ch")?,
            neutral_hadrons: iso("Neu")?,
            photons: iso("Pho")?,
            pileup: iso("PU")?,
        })
    }

    /// Read the isolation sums of one object
    pub fn get(&self, event: usize, index: usize) -> Result<PfIsolation, DataError> {
        Ok(PfIsolation {
            charged_hadrons: self.charged_hadrons.get(event, index)?,
            neutral_hadrons: self.neutral_hadrons.get(event, index)?,
            photons: self.photons.get(event, index)?,
            pileup: self.pileup.get(event, index)?,
        })
    }
}
