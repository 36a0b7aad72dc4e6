use crate::{
    constants::{RELATIVISTIC_F, SPEED_OF_LIGHT_M_S},
    prelude::{Duration, Unit},
};

/// Satellite onboard clock correction, to the constellation timescale,
/// resolved from broadcast clock polynomial.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct SatelliteClockCorrection {
    /// Polynomial offset (af0 + af1 dt + af2 dt²) in seconds
    pub offset_s: f64,
    /// Polynomial drift (af1 + 2 af2 dt) in s/s
    pub drift_s_s: f64,
    /// Relativistic (orbit eccentricity) term in seconds
    pub relativistic_s: f64,
    /// Total group delay (L1) in seconds
    pub tgd_s: f64,
}

impl SatelliteClockCorrection {
    /// Resolves the clock polynomial `dt` seconds past ToC.
    /// `ecc`, `sqrt_a` and `e_k` (eccentric anomaly) feed the relativistic term.
    pub fn new(
        af: (f64, f64, f64),
        dt: f64,
        ecc: f64,
        sqrt_a: f64,
        e_k: f64,
        tgd_s: f64,
    ) -> Self {
        let (af0, af1, af2) = af;
        Self {
            offset_s: af0 + af1 * dt + af2 * dt.powi(2),
            drift_s_s: af1 + 2.0 * af2 * dt,
            relativistic_s: RELATIVISTIC_F * ecc * sqrt_a * e_k.sin(),
            tgd_s,
        }
    }

    /// Total clock error (in seconds) the satellite time leads the system time by.
    pub fn total_s(&self) -> f64 {
        self.offset_s + self.relativistic_s - self.tgd_s
    }

    /// Total clock error, as [Duration]
    pub fn duration(&self) -> Duration {
        self.total_s() * Unit::Second
    }

    /// Clock error expressed as range (meters)
    pub fn range_m(&self) -> f64 {
        self.total_s() * SPEED_OF_LIGHT_M_S
    }

    /// Clock drift expressed as range rate (m/s)
    pub fn range_rate_m_s(&self) -> f64 {
        self.drift_s_s * SPEED_OF_LIGHT_M_S
    }
}

#[cfg(test)]
mod test {
    use super::SatelliteClockCorrection;
    use crate::constants::SPEED_OF_LIGHT_M_S;

    #[test]
    fn clock_polynomial() {
        let corr = SatelliteClockCorrection::new((1.0E-4, 1.0E-11, 0.0), 100.0, 0.0, 5153.6, 1.0, 0.0);
        assert!((corr.offset_s - (1.0E-4 + 1.0E-9)).abs() < 1.0E-15);
        assert_eq!(corr.drift_s_s, 1.0E-11);
        assert_eq!(corr.relativistic_s, 0.0);
        assert!((corr.range_m() - corr.total_s() * SPEED_OF_LIGHT_M_S).abs() < 1.0E-9);
    }

    #[test]
    fn relativistic_and_group_delay() {
        let corr = SatelliteClockCorrection::new(
            (0.0, 0.0, 0.0),
            0.0,
            0.01,
            5153.6,
            std::f64::consts::FRAC_PI_2,
            5.0E-9,
        );
        // ~ -22.9 ns for e=0.01 at E=90°
        assert!(corr.relativistic_s < -2.2E-8 && corr.relativistic_s > -2.4E-8);
        assert!((corr.total_s() - (corr.relativistic_s - 5.0E-9)).abs() < 1.0E-18);
    }
}
