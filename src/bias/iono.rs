use crate::{
    bias::{Bias, BiasRuntime},
    constants::{L1_FREQUENCY_HZ, SPEED_OF_LIGHT_M_S},
    prelude::TimeScale,
};

use std::f64::consts::PI;

/// Klobuchar Model, as broadcast along GPS ephemerides.
/// Coefficients are expressed in the broadcast units
/// (seconds, per semicircle powers).
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct KbModel {
    /// alpha coefficients
    pub alpha: (f64, f64, f64, f64),
    /// beta coefficients
    pub beta: (f64, f64, f64, f64),
}

impl KbModel {
    /// Builds [KbModel] from broadcast coefficient arrays.
    pub fn from_coefficients(alpha: &[f64], beta: &[f64]) -> Option<Self> {
        if alpha.len() < 4 || beta.len() < 4 {
            return None;
        }
        if alpha.iter().chain(beta.iter()).any(|c| !c.is_finite()) {
            return None;
        }
        Some(Self {
            alpha: (alpha[0], alpha[1], alpha[2], alpha[3]),
            beta: (beta[0], beta[1], beta[2], beta[3]),
        })
    }
}

impl Bias for KbModel {
    fn bias_m(&self, rtm: &BiasRuntime) -> f64 {
        // all angles in semicircles
        let (elev, azim_rad) = (
            rtm.sv_elevation_azimuth_deg_deg.0 / 180.0,
            rtm.sv_elevation_azimuth_deg_deg.1.to_radians(),
        );

        let (phi_u, lambda_u) = (
            rtm.rx_lat_long_alt_deg_deg_m.0 / 180.0,
            rtm.rx_lat_long_alt_deg_deg_m.1 / 180.0,
        );

        let (_, nanos) = rtm.t.to_time_scale(TimeScale::GPST).to_time_of_week();
        let tow = nanos as f64 * 1.0E-9;

        let psi = 0.0137 / (elev + 0.11) - 0.022;

        let phi_i = (phi_u + psi * azim_rad.cos()).clamp(-0.416, 0.416);
        let lambda_i = lambda_u + psi * azim_rad.sin() / (phi_i * PI).cos();
        let phi_m = phi_i + 0.064 * ((lambda_i - 1.617) * PI).cos();

        let mut t_s = (43.2E3 * lambda_i + tow) % 86.4E3;
        if t_s < 0.0 {
            t_s += 86.4E3;
        }

        let f = 1.0 + 16.0 * (0.53 - elev).powi(3);

        let mut a_i = self.alpha.0
            + self.alpha.1 * phi_m
            + self.alpha.2 * phi_m.powi(2)
            + self.alpha.3 * phi_m.powi(3);
        if a_i < 0.0 {
            a_i = 0.0_f64;
        }

        let mut p_i = self.beta.0
            + self.beta.1 * phi_m
            + self.beta.2 * phi_m.powi(2)
            + self.beta.3 * phi_m.powi(3);
        if p_i < 72.0E3 {
            p_i = 72.0E3;
        }

        let x_i = 2.0 * PI * (t_s - 50400.0) / p_i;

        let delay_s = match x_i.abs() < 1.57 {
            true => f * (5.0E-9 + a_i * (1.0 - x_i.powi(2) / 2.0 + x_i.powi(4) / 24.0)),
            false => f * 5.0E-9,
        };

        delay_s * SPEED_OF_LIGHT_M_S * (L1_FREQUENCY_HZ / rtm.frequency_hz).powi(2)
    }
}

#[cfg(test)]
mod test {
    use super::KbModel;
    use crate::bias::{Bias, BiasRuntime};
    use crate::prelude::{Epoch, TimeScale};

    fn model() -> KbModel {
        KbModel {
            alpha: (1.1176E-8, 7.4506E-9, -5.9605E-8, -5.9605E-8),
            beta: (90112.0, 0.0, -196608.0, -65536.0),
        }
    }

    fn runtime(tow_s: f64, elevation_deg: f64, frequency_hz: f64) -> BiasRuntime {
        BiasRuntime {
            t: Epoch::from_time_of_week(2190, (tow_s * 1.0E9) as u64, TimeScale::GPST),
            sv_elevation_azimuth_deg_deg: (elevation_deg, 120.0),
            rx_lat_long_alt_deg_deg_m: (48.8, 2.3, 100.0),
            frequency_hz,
        }
    }

    #[test]
    fn coefficients() {
        assert!(KbModel::from_coefficients(&[0.0; 3], &[0.0; 4]).is_none());
        assert!(KbModel::from_coefficients(&[f64::NAN; 4], &[0.0; 4]).is_none());
        let kb = KbModel::from_coefficients(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0])
            .unwrap();
        assert_eq!(kb.alpha, (1.0, 2.0, 3.0, 4.0));
        assert_eq!(kb.beta, (5.0, 6.0, 7.0, 8.0));
    }

    #[test]
    fn klobuchar_plausible_delay() {
        let kb = model();
        // night time: only the constant 5ns term (mapped)
        let night = kb.bias_m(&runtime(3.0 * 3600.0, 60.0, 1575.42E6));
        // local afternoon peak
        let day = kb.bias_m(&runtime(14.0 * 3600.0 - 2.3 / 15.0 * 3600.0, 60.0, 1575.42E6));
        assert!(night > 1.0 && night < 3.0, "night delay {}", night);
        assert!(day > night, "day delay {} should exceed night {}", day, night);
        assert!(day < 30.0, "day delay {}", day);
    }

    #[test]
    fn klobuchar_frequency_scaling() {
        let kb = model();
        let l1 = kb.bias_m(&runtime(50000.0, 45.0, 1575.42E6));
        let g1 = kb.bias_m(&runtime(50000.0, 45.0, 1602.0E6));
        let ratio = l1 / g1;
        let expected = (1602.0E6_f64 / 1575.42E6).powi(2);
        assert!((ratio - expected).abs() < 1.0E-9);
    }

    #[test]
    fn klobuchar_low_elevation_larger() {
        let kb = model();
        let zenith = kb.bias_m(&runtime(50000.0, 89.0, 1575.42E6));
        let low = kb.bias_m(&runtime(50000.0, 10.0, 1575.42E6));
        assert!(low > zenith);
    }
}
