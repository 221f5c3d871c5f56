//! This module implements the 4-momentum handling logic of physics objects,
//! expressed in detector coordinates.

use crate::numeric::{
    floats::consts::{PI, TAU},
    Float,
};
use nalgebra::SVector;

/// 4-momentum dimension
pub const MOMENTUM_DIM: usize = 4;

/// Storage for the components of a 4-momentum
type Components = SVector<Float, MOMENTUM_DIM>;

/// Convenience const for accessing the transverse momentum component
pub const PT: usize = 0;

/// Convenience const for accessing the pseudorapidity component
pub const ETA: usize = 1;

/// Convenience const for accessing the azimuthal angle component
pub const PHI: usize = 2;

/// Relativistic 4-momentum in detector coordinates (pt, eta, phi, E)
///
/// Objects are recorded either with their mass or with their energy, so both
/// constructors are provided. Once built, a momentum is never modified.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FourMomentum(Components);
//
impl FourMomentum {
    /// Build a 4-momentum from its transverse momentum, pseudorapidity,
    /// azimuthal angle and energy
    pub fn from_pt_eta_phi_e(pt: Float, eta: Float, phi: Float, e: Float) -> Self {
        Self(Components::new(pt, eta, phi, e))
    }

    /// Build a 4-momentum from its transverse momentum, pseudorapidity,
    /// azimuthal angle and invariant mass
    pub fn from_pt_eta_phi_m(pt: Float, eta: Float, phi: Float, m: Float) -> Self {
        let p = pt * eta.cosh();
        Self::from_pt_eta_phi_e(pt, eta, phi, (p * p + m * m).sqrt())
    }

    /// Transverse momentum
    pub fn pt(&self) -> Float {
        self.0[PT]
    }

    /// Pseudorapidity
    pub fn eta(&self) -> Float {
        self.0[ETA]
    }

    /// Azimuthal angle
    pub fn phi(&self) -> Float {
        self.0[PHI]
    }

    /// Azimuthal difference with another momentum, wrapped to (-π, π]
    pub fn delta_phi(&self, other: &Self) -> Float {
        let dphi = (self.phi() - other.phi()) % TAU;
        if dphi > PI {
            dphi - TAU
        } else if dphi <= -PI {
            dphi + TAU
        } else {
            dphi
        }
    }

    /// Angular separation with another momentum in the (eta, phi) plane
    pub fn delta_r(&self, other: &Self) -> Float {
        let deta = self.eta() - other.eta();
        let dphi = self.delta_phi(other);
        (deta * deta + dphi * dphi).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn delta_phi_wraps_into_half_open_range() {
        let a = FourMomentum::from_pt_eta_phi_m(10., 0., 3.0, 0.);
        let b = FourMomentum::from_pt_eta_phi_m(10., 0., -3.0, 0.);
        assert_relative_eq!(a.delta_phi(&b), 6.0 - TAU, epsilon = 1e-6);
        assert_relative_eq!(b.delta_phi(&a), TAU - 6.0, epsilon = 1e-6);

        // Exactly opposite directions land on +π, never on -π
        let c = FourMomentum::from_pt_eta_phi_m(10., 0., 0., 0.);
        let d = FourMomentum::from_pt_eta_phi_m(10., 0., PI, 0.);
        assert_relative_eq!(c.delta_phi(&d), PI, epsilon = 1e-6);
        assert!(c.delta_phi(&d) > 0.);
    }

    #[test]
    fn delta_r_combines_eta_and_phi() {
        let a = FourMomentum::from_pt_eta_phi_m(50., 0.5, 0.2, 0.);
        let b = FourMomentum::from_pt_eta_phi_m(30., -0.5, 0.2 + 1.0, 0.);
        assert_relative_eq!(a.delta_r(&b), (2.0 as Float).sqrt(), epsilon = 1e-5);
        assert_relative_eq!(a.delta_r(&b), b.delta_r(&a), epsilon = 1e-6);
        assert_relative_eq!(a.delta_r(&a), 0.);
    }

    #[test]
    fn mass_and_energy_constructors_agree() {
        let m = FourMomentum::from_pt_eta_phi_m(40., 1.2, -0.7, 1.777);
        let p = 40. * Float::cosh(1.2);
        let energy = Float::sqrt(p * p + 1.777 * 1.777);
        assert_eq!(m, FourMomentum::from_pt_eta_phi_e(40., 1.2, -0.7, energy));
    }
}
