use log::{debug, error};
use nalgebra::{Rotation3, Vector3};

use crate::{
    bias::SatelliteClockCorrection,
    constants::{EARTH_ANGULAR_VEL_RAD, EARTH_GRAVITATION_MU_M3_S2},
    prelude::{Epoch, Error, Unit, SV},
    time::gpst_week_tow,
};

mod store;
mod ublox;

pub use store::EphemerisStore;
pub use ublox::{convert_ublox_ephemeris, convert_ublox_klobuchar};

/// Half time span used to differentiate the orbit (s)
const VELOCITY_HALF_SPAN_S: f64 = 0.5;

/// Satellite orbit and clock model, valid over a time window around its ToE.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct EphemerisModel {
    /// [SV]
    pub sv: SV,

    /// Time of Issue of Ephemeris, in GPST
    pub toe: Epoch,

    /// Time of Clock, in GPST
    pub toc: Epoch,

    /// Issue of data (ephemeris)
    pub iode: u16,

    /// Semi-major axis (in meters)
    pub semi_major_axis_m: f64,

    /// Eccentricity
    pub eccentricity: f64,

    /// m0 (in radians)
    pub m0_rad: f64,

    /// (in radians)
    pub i0_rad: f64,

    /// (in radians/s)
    pub idot_rad_s: f64,

    /// Mean motion difference (in radians/s)
    pub dn_rad_s: f64,

    /// (in radians)
    pub omega0_rad: f64,

    /// (in radians)
    pub omega_rad: f64,

    /// (in radians/s)
    pub omega_dot_rad_s: f64,

    /// Sine / Cosine (in radians)
    pub cus_cuc_rad: (f64, f64),

    /// Sine / Cosine (in radians)
    pub cis_cic_rad: (f64, f64),

    /// Sine / Cosine (in meters)
    pub crs_crc_m: (f64, f64),

    /// Clock polynomial (af0 [s], af1 [s/s], af2 [s/s²])
    pub af: (f64, f64, f64),

    /// Total group delay (in seconds)
    pub tgd_s: f64,

    /// Curve fit interval (in hours)
    pub fit_interval_h: f64,

    /// Satellite declared itself healthy
    pub healthy: bool,
}

/// Satellite state resolved from [EphemerisModel] at a given instant.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SatelliteState {
    /// ECEF position (m)
    pub position_m: Vector3<f64>,
    /// ECEF velocity (m/s)
    pub velocity_m_s: Vector3<f64>,
    /// Onboard clock correction
    pub clock: SatelliteClockCorrection,
}

impl EphemerisModel {
    /// Returns True if this [EphemerisModel] may be used at `t`.
    pub fn is_valid(&self, t: Epoch, validity_s: f64) -> bool {
        let half_fit_s = self.fit_interval_h * 3600.0 / 2.0;
        self.healthy && (t - self.toe).abs().to_seconds() <= validity_s.max(half_fit_s)
    }

    /// Returns ToE in seconds of week
    pub fn weekly_toe_seconds(&self) -> f64 {
        gpst_week_tow(self.toe).1
    }

    /// Resolves Kepler equations at `t`, returns ECEF position (m)
    /// and eccentric anomaly (rad).
    fn kepler(&self, t: Epoch) -> Result<(Vector3<f64>, f64), Error> {
        let e = self.eccentricity;
        let e_2 = e.powi(2);
        let a = self.semi_major_axis_m;
        let a_3 = a.powi(3);

        let (cus, cuc) = self.cus_cuc_rad;
        let (cis, cic) = self.cis_cic_rad;
        let (crs, crc) = self.crs_crc_m;
        let (i0, idot) = (self.i0_rad, self.idot_rad_s);
        let (omega0, omega, omega_dot) = (self.omega0_rad, self.omega_rad, self.omega_dot_rad_s);

        let t_k = (t - self.toe).to_seconds();

        let n0 = (EARTH_GRAVITATION_MU_M3_S2 / a_3).sqrt();
        let n = n0 + self.dn_rad_s;
        let m = self.m0_rad + n * t_k;

        let mut e_k = m;
        let mut converged = false;

        for _ in 0..30 {
            let e_k_next = m + e * e_k.sin();
            let delta = (e_k_next - e_k).abs();
            e_k = e_k_next;
            if delta < 1.0E-13 {
                converged = true;
                break;
            }
        }

        if !converged || !e_k.is_finite() {
            error!("{}({}) - kepler solver in failure", t, self.sv);
            return Err(Error::KeplerSolver(t, self.sv));
        }

        let (sin_e_k, cos_e_k) = e_k.sin_cos();
        let v_k = ((1.0 - e_2).sqrt() * sin_e_k).atan2(cos_e_k - e);

        let phi = v_k + omega;
        let (sin_2phi, cos_2phi) = (2.0 * phi).sin_cos();

        let u_k = phi + cuc * cos_2phi + cus * sin_2phi;
        let r_k = a * (1.0 - e * cos_e_k) + crc * cos_2phi + crs * sin_2phi;
        let i_k = i0 + idot * t_k + cic * cos_2phi + cis * sin_2phi;
        let omega_k = omega0 + (omega_dot - EARTH_ANGULAR_VEL_RAD) * t_k
            - EARTH_ANGULAR_VEL_RAD * self.weekly_toe_seconds();

        let orbital_plane = Vector3::new(r_k * u_k.cos(), r_k * u_k.sin(), 0.0);

        // orbital plane to ECEF rotation
        let rot_x3 = Rotation3::from_axis_angle(&Vector3::x_axis(), i_k);
        let rot_z3 = Rotation3::from_axis_angle(&Vector3::z_axis(), omega_k);
        let ecef = rot_z3 * rot_x3 * orbital_plane;

        Ok((ecef, e_k))
    }

    /// Resolves [SatelliteState] at `t` (transmission instant).
    pub fn resolve(&self, t: Epoch) -> Result<SatelliteState, Error> {
        let (position_m, e_k) = self.kepler(t)?;

        let dt = VELOCITY_HALF_SPAN_S * Unit::Second;
        let (before, _) = self.kepler(t - dt)?;
        let (after, _) = self.kepler(t + dt)?;
        let velocity_m_s = (after - before) / (2.0 * VELOCITY_HALF_SPAN_S);

        let clock = SatelliteClockCorrection::new(
            self.af,
            (t - self.toc).to_seconds(),
            self.eccentricity,
            self.semi_major_axis_m.sqrt(),
            e_k,
            self.tgd_s,
        );

        debug!(
            "{}({}) - kepler x={:.3} y={:.3} z={:.3} clock={:.3E}s",
            t,
            self.sv,
            position_m[0],
            position_m[1],
            position_m[2],
            clock.total_s()
        );

        Ok(SatelliteState {
            position_m,
            velocity_m_s,
            clock,
        })
    }
}
