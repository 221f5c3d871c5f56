//! Event-level classification of generated particles
//!
//! Generated particles are sorted into role buckets according to the magnitude
//! of their identity code. Only events with at least two tau-like particles
//! (di-tau events) are considered for further study.

use crate::objects::GenParticle;

/// Identity code of the Higgs boson
pub const HIGGS_PID: u32 = 25;

/// Identity code of the tau lepton
pub const TAU_PID: u32 = 15;

/// Identity code of the gluon
pub const GLUON_PID: u32 = 21;

/// Flavor axis value which gluons are recorded under, so that they sit next
/// to the quark codes 1 to 5 on flavor histograms
pub const GLUON_FLAVOR: u32 = 7;

/// Minimal number of tau-like particles in a di-tau event
pub const MIN_TAUS: usize = 2;

/// Role of a generated particle in the event topology
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Higgs-like boson
    Boson,

    /// Tau-like lepton
    Lepton,

    /// Quark or gluon
    Parton,
}
//
impl Role {
    /// Role of a particle with the given identity code, if it has any
    pub fn of(pid: i32) -> Option<Self> {
        match pid.unsigned_abs() {
            HIGGS_PID => Some(Role::Boson),
            TAU_PID => Some(Role::Lepton),
            1..=5 | GLUON_PID => Some(Role::Parton),
            _ => None,
        }
    }
}

/// Flavor axis value of a parton, with gluons remapped to `GLUON_FLAVOR`
pub fn flavor(pid: i32) -> u32 {
    match pid.unsigned_abs() {
        GLUON_PID => GLUON_FLAVOR,
        other => other,
    }
}

/// Generated particles of one event, sorted into disjoint role buckets
///
/// Each bucket preserves the ordering of the generated particle collection, so
/// its first member is the leading one.
///
#[derive(Debug, Default)]
pub struct RoleBuckets<'event> {
    /// Higgs-like bosons
    pub bosons: Vec<&'event GenParticle>,

    /// Tau-like leptons
    pub taus: Vec<&'event GenParticle>,

    /// Quarks and gluons
    pub partons: Vec<&'event GenParticle>,
}
//
impl<'event> RoleBuckets<'event> {
    /// Sort generated particles into role buckets
    pub fn partition(particles: &'event [GenParticle]) -> Self {
        let mut buckets = Self::default();
        for particle in particles {
            match Role::of(particle.pid) {
                Some(Role::Boson) => buckets.bosons.push(particle),
                Some(Role::Lepton) => buckets.taus.push(particle),
                Some(Role::Parton) => buckets.partons.push(particle),
                None => {}
            }
        }
        buckets
    }

    /// Partition the generated particles of an event, keeping the result only
    /// if the event has a di-tau topology
    pub fn classify(particles: &'event [GenParticle]) -> Option<Self> {
        let buckets = Self::partition(particles);
        (buckets.taus.len() >= MIN_TAUS).then_some(buckets)
    }

    /// Leading Higgs-like boson, if any
    pub fn leading_boson(&self) -> Option<&'event GenParticle> {
        self.bosons.first().copied()
    }

    /// Leading quark or gluon, if any
    pub fn leading_parton(&self) -> Option<&'event GenParticle> {
        self.partons.first().copied()
    }
}
