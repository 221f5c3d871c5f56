//! This module defines the physics objects which are reconstructed from the
//! columnar event data, one record type per object category.
//!
//! Records are built in one go with all of their fields, and are only handed
//! out by shared reference afterwards, so they never exist in a partially
//! initialized state nor change after construction.

// Field names mirror the upstream columns
#![allow(missing_docs)]

use crate::{momentum::FourMomentum, numeric::Float};

use serde::Deserialize;

use std::fmt;

/// Muon rest mass (GeV)
pub const MUON_MASS: Float = 0.105_658;

/// Electron rest mass (GeV)
pub const ELECTRON_MASS: Float = 0.000_511;

/// Kinematic core shared by every physics object
pub trait Kinematics {
    /// 4-momentum of the object
    fn p4(&self) -> &FourMomentum;

    /// Transverse momentum
    fn pt(&self) -> Float {
        self.p4().pt()
    }

    /// Pseudorapidity
    fn eta(&self) -> Float {
        self.p4().eta()
    }

    /// Azimuthal angle
    fn phi(&self) -> Float {
        self.p4().phi()
    }
}

/// Implement Kinematics for record types which store a `p4` field
macro_rules! impl_kinematics {
    ($($object:ty),*) => {
        $(
            impl Kinematics for $object {
                fn p4(&self) -> &FourMomentum {
                    &self.p4
                }
            }
        )*
    };
}

impl_kinematics!(GenParticle, Jet, Muon, Electron, Tau, BoostedTau);

/// Muon identification working point
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MuonId {
    Loose,
    Medium,
    Tight,
}
//
impl MuonId {
    /// Position of this working point in the muon identification bits
    fn bit(self) -> u32 {
        match self {
            MuonId::Loose => 0,
            MuonId::Medium => 1,
            MuonId::Tight => 2,
        }
    }
}
//
impl fmt::Display for MuonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuonId::Loose => write!(f, "loose"),
            MuonId::Medium => write!(f, "medium"),
            MuonId::Tight => write!(f, "tight"),
        }
    }
}

/// Electron identification working point
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ElectronId {
    Veto,
    Loose,
    Medium,
    Tight,
}
//
impl ElectronId {
    /// Position of this working point in the electron identification bits
    fn bit(self) -> u32 {
        match self {
            ElectronId::Veto => 0,
            ElectronId::Loose => 1,
            ElectronId::Medium => 2,
            ElectronId::Tight => 3,
        }
    }
}
//
impl fmt::Display for ElectronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElectronId::Veto => write!(f, "veto"),
            ElectronId::Loose => write!(f, "loose"),
            ElectronId::Medium => write!(f, "medium"),
            ElectronId::Tight => write!(f, "tight"),
        }
    }
}

/// Outcome of an isolation discriminator at its standard working points
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IsolationWorkingPoints {
    /// Raw discriminator output
    pub raw: Float,
    pub vloose: bool,
    pub loose: bool,
    pub medium: bool,
    pub tight: bool,
    pub vtight: bool,
}

/// Outcome of the MVA electron rejection at its standard working points
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElectronRejection {
    pub vloose: bool,
    pub loose: bool,
    pub medium: bool,
    pub tight: bool,
    pub vtight: bool,
}

/// Number of particle-flow candidates of each kind in a tau cone
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PfCandidateCounts {
    pub charged_hadrons: i32,
    pub neutral_hadrons: i32,
    pub gammas: i32,
    pub total: i32,
}

/// Particle-flow isolation sums of a lepton
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PfIsolation {
    pub charged_hadrons: Float,
    pub neutral_hadrons: Float,
    pub photons: Float,
    pub pileup: Float,
}
//
impl PfIsolation {
    /// Isolation relative to the lepton pt, with delta-beta pileup correction
    pub fn relative(&self, pt: Float) -> Float {
        let neutral = (self.neutral_hadrons + self.photons - 0.5 * self.pileup).max(0.);
        (self.charged_hadrons + neutral) / pt
    }
}

/// Generated (Monte Carlo truth) particle
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub struct GenParticle {
    pub p4: FourMomentum,

    /// Particle identity code (PDG convention, signed)
    pub pid: i32,

    /// Generator status code
    pub status: i32,
}

/// Jet
#[derive(Clone, Debug, PartialEq)]
pub struct Jet {
    pub p4: FourMomentum,
}

/// Reconstructed muon
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub struct Muon {
    pub p4: FourMomentum,
    pub charge: i32,

    /// Identification bits (0: loose, 1: medium, 2: tight)
    pub id_bits: i32,

    /// Transverse impact parameter
    pub d0: Float,

    /// Longitudinal impact parameter
    pub dz: Float,
    pub isolation: PfIsolation,
}
//
impl Muon {
    /// Truth that the muon passes an identification working point
    pub fn passes_id(&self, id: MuonId) -> bool {
        self.id_bits & (1 << id.bit()) != 0
    }

    /// Delta-beta corrected relative isolation
    pub fn relative_isolation(&self) -> Float {
        self.isolation.relative(self.pt())
    }
}

/// Reconstructed electron
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub struct Electron {
    pub p4: FourMomentum,
    pub charge: i32,

    /// Identification bits (0: veto, 1: loose, 2: medium, 3: tight)
    pub id_bits: i32,
    pub d0: Float,
    pub dz: Float,

    /// Pseudorapidity of the supercluster
    pub sc_eta: Float,
    pub isolation: PfIsolation,
}
//
impl Electron {
    /// Truth that the electron passes an identification working point
    pub fn passes_id(&self, id: ElectronId) -> bool {
        self.id_bits & (1 << id.bit()) != 0
    }

    /// Delta-beta corrected relative isolation
    pub fn relative_isolation(&self) -> Float {
        self.isolation.relative(self.pt())
    }
}

/// Hadronically decaying tau, standard reconstruction
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub struct Tau {
    pub p4: FourMomentum,
    pub charge: Float,
    pub decay_mode: i32,
    pub dxy: Float,
    pub dz: Float,
    pub isolation: IsolationWorkingPoints,
    pub decay_mode_finding: bool,
    pub decay_mode_finding_new_dms: bool,
    pub loose_muon_rejection: bool,
    pub tight_muon_rejection: bool,
    pub loose_electron_rejection: bool,
    pub tight_electron_rejection: bool,
}

/// Hadronically decaying tau, reconstructed for boosted topologies
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub struct BoostedTau {
    pub p4: FourMomentum,
    pub charge: Float,
    pub dz: Float,
    pub dxy: Float,
    pub isolation: IsolationWorkingPoints,
    pub decay_mode: i32,
    pub decay_mode_finding: bool,
    pub decay_mode_finding_new_dms: bool,
    pub electron_rejection: ElectronRejection,
    pub loose_muon_rejection: bool,
    pub tight_muon_rejection: bool,

    /// Combined isolation with delta-beta correction (loose, medium, tight)
    pub combined_isolation: [bool; 3],
    pub lead_charged_hadron_exists: bool,
    pub signal_candidates: PfCandidateCounts,
    pub isolation_candidates: PfCandidateCounts,
}
