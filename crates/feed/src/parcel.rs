//! Computational parcel created at injection time.

use carrier::mesh::FaceLocator;
use glam::DVec3;

/// Sphere volume for a given diameter.
#[inline]
pub fn sphere_volume(diameter: f64) -> f64 {
    std::f64::consts::FRAC_PI_6 * diameter.powi(3)
}

/// A discrete parcel standing in for a cluster of physical particles.
///
/// The injector fills every field; the transport solver owns the parcel
/// afterwards.
#[derive(Clone, Copy, Debug)]
pub struct Parcel {
    /// World position (an owner-cell centre at creation)
    pub position: DVec3,
    /// Current velocity
    pub velocity: DVec3,
    /// Sphere-equivalent diameter
    pub diameter: f64,
    /// Mesh cell holding the parcel
    pub cell: usize,
    /// Mesh point-location token for the seeding face
    pub face: FaceLocator,
}

impl Parcel {
    /// Create a parcel at rest with zero diameter; the injector assigns
    /// velocity and diameter separately.
    pub fn new(position: DVec3, cell: usize, face: FaceLocator) -> Self {
        Self {
            position,
            velocity: DVec3::ZERO,
            diameter: 0.0,
            cell,
            face,
        }
    }

    /// Sphere volume implied by the parcel diameter.
    #[inline]
    pub fn volume(&self) -> f64 {
        sphere_volume(self.diameter)
    }
}
