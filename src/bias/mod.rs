use crate::prelude::Epoch;

pub(crate) mod tropo;
pub use tropo::TroposphereModel;

pub(crate) mod iono;
pub use iono::KbModel;

pub(crate) mod spaceborn;
pub use spaceborn::SatelliteClockCorrection;

/// Ongoing conditions for one satellite, as seen from the
/// (coarse) receiver position, that propagation models depend on.
#[derive(Debug, Clone, Copy)]
pub struct BiasRuntime {
    /// [Epoch] of observation
    pub t: Epoch,
    /// Satellite (elevation, azimuth) in degrees
    pub sv_elevation_azimuth_deg_deg: (f64, f64),
    /// Receiver geodetic coordinates: (latitude, longitude) in degrees,
    /// altitude above the WGS84 ellipsoid in meters
    pub rx_lat_long_alt_deg_deg_m: (f64, f64, f64),
    /// Carrier frequency of the signal
    pub frequency_hz: f64,
}

/// Propagation delay model.
pub trait Bias {
    /// Returns delay in meters for this [BiasRuntime].
    fn bias_m(&self, rtm: &BiasRuntime) -> f64;
}
