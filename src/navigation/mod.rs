//! Coarse position fix
use itertools::Itertools;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Rotation3, Vector3};

use crate::{
    constants::{EARTH_ANGULAR_VEL_RAD, SPEED_OF_LIGHT_M_S},
    measurement::ProcessedMeasurement,
    prelude::{Config, Constellation, Epoch, Error},
};

/// Solutions closer than this to Earth center are non sense (m)
pub(crate) const MIN_POSITION_NORM_M: f64 = 6.0E6;

/// Solutions further than this from Earth center are non sense (m)
pub(crate) const MAX_POSITION_NORM_M: f64 = 1.0E7;

/// Rotates satellite position `sat_pos_m` by Earth rotation during the
/// signal flight, expressing it in the ECEF frame at reception.
pub fn sagnac_rotation(sat_pos_m: &Vector3<f64>, flight_time_s: f64) -> Vector3<f64> {
    let rotation =
        Rotation3::from_axis_angle(&Vector3::z_axis(), -EARTH_ANGULAR_VEL_RAD * flight_time_s);
    rotation * sat_pos_m
}

/// Coarse position and clock solution.
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseFix {
    /// [Epoch] of reception
    pub epoch: Epoch,
    /// ECEF position (m)
    pub position_ecef_m: Vector3<f64>,
    /// Receiver clock bias, per [Constellation], expressed in meters.
    /// The first entry is the reference timescale, others include
    /// their inter system bias.
    pub clock_biases_m: Vec<(Constellation, f64)>,
    /// Postfit residuals (m), in measurement order
    pub residuals_m: Vec<f64>,
    /// Geometric dilution of precision
    pub gdop: f64,
    /// Number of iterations performed
    pub iterations: usize,
}

impl CoarseFix {
    /// Position and clock states, as one flat list:
    /// x, y, z (m) followed by clock biases (m).
    pub fn to_vec(&self) -> Vec<f64> {
        let mut v = self.position_ecef_m.iter().copied().collect::<Vec<_>>();
        v.extend(self.clock_biases_m.iter().map(|(_, b)| *b));
        v
    }
}

/// Clock column layout: reference constellation first (GPS when present).
fn clock_layout(measurements: &[ProcessedMeasurement]) -> Vec<Constellation> {
    let mut layout = measurements
        .iter()
        .map(|m| m.sv.constellation)
        .unique()
        .collect::<Vec<_>>();

    if let Some(index) = layout.iter().position(|c| *c == Constellation::GPS) {
        layout.swap(0, index);
    }
    layout
}

/// Predicted range (m) and line of sight unit vector, from `position`.
fn geometry(
    meas: &ProcessedMeasurement,
    position: &Vector3<f64>,
    cfg: &Config,
) -> (f64, Vector3<f64>) {
    let mut sat_pos = meas.sat_pos;

    if cfg.modeling.earth_rotation {
        let flight_time_s = (sat_pos - position).norm() / SPEED_OF_LIGHT_M_S;
        sat_pos = sagnac_rotation(&sat_pos, flight_time_s);
    }

    let los = sat_pos - position;
    let rho = los.norm();
    (rho, los / rho)
}

/// Pseudo range model at state `x`: returns the predicted
/// pseudo range (m) and line of sight unit vector.
fn model(
    meas: &ProcessedMeasurement,
    x: &DVector<f64>,
    clock_index: usize,
    cfg: &Config,
) -> (f64, Vector3<f64>) {
    let position = Vector3::new(x[0], x[1], x[2]);
    let (rho, unit) = geometry(meas, &position, cfg);

    let mut predicted = rho + x[3];

    if clock_index > 0 {
        predicted += x[3 + clock_index];
    }

    if cfg.modeling.sv_clock_bias {
        predicted -= meas.sat_clock.range_m();
    }

    (predicted, unit)
}

fn solve(measurements: &[ProcessedMeasurement], cfg: &Config) -> Result<CoarseFix, Error> {
    let nrows = measurements.len();

    if nrows < cfg.min_coarse_fix_measurements {
        return Err(Error::NotEnoughMeasurements(
            nrows,
            cfg.min_coarse_fix_measurements,
        ));
    }

    let epoch = measurements[0].recv_time;
    let layout = clock_layout(measurements);
    let ndf = 3 + layout.len();

    if nrows < ndf {
        return Err(Error::NotEnoughMeasurements(nrows, ndf));
    }

    let clock_indexes = measurements
        .iter()
        .map(|meas| {
            layout
                .iter()
                .position(|c| *c == meas.sv.constellation)
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();

    let mut x = DVector::<f64>::zeros(ndf);
    let mut g = DMatrix::<f64>::zeros(nrows, ndf);
    let mut w = DMatrix::<f64>::zeros(nrows, nrows);
    let mut y = DVector::<f64>::zeros(nrows);

    for (i, meas) in measurements.iter().enumerate() {
        let sigma = meas.observables.pseudorange_std_m;
        w[(i, i)] = if cfg.weighted && sigma > 0.0 {
            1.0 / sigma.powi(2)
        } else {
            1.0
        };
    }

    let mut converged = false;
    let mut iterations = 0;

    for ith in 0..cfg.max_iterations {
        iterations = ith + 1;

        for (i, meas) in measurements.iter().enumerate() {
            let clock_index = clock_indexes[i];
            let (predicted, unit) = model(meas, &x, clock_index, cfg);

            g.fill_row(i, 0.0);
            g[(i, 0)] = -unit[0];
            g[(i, 1)] = -unit[1];
            g[(i, 2)] = -unit[2];
            g[(i, 3)] = 1.0;

            if clock_index > 0 {
                g[(i, 3 + clock_index)] = 1.0;
            }

            y[i] = meas.observables.pseudorange_m - predicted;
        }

        let gt = g.transpose();
        let gt_w = gt * w.clone();
        let gt_w_g = gt_w.clone() * g.clone();
        let gt_w_g_inv = gt_w_g.try_inverse().ok_or(Error::MatrixInversion)?;

        let dx = gt_w_g_inv * gt_w * y.clone();
        x += &dx;

        let dx_norm = (dx[0].powi(2) + dx[1].powi(2) + dx[2].powi(2)).sqrt();
        debug!("{} - coarse fix (i={}) |dx|={:.3E}m", epoch, ith, dx_norm);

        if !dx_norm.is_finite() {
            return Err(Error::InvalidState);
        }

        if dx_norm < cfg.convergence_m {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(Error::NotConverged);
    }

    let position_ecef_m = Vector3::new(x[0], x[1], x[2]);

    if x.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidState);
    }

    let norm = position_ecef_m.norm();
    if !(MIN_POSITION_NORM_M..=MAX_POSITION_NORM_M).contains(&norm) {
        debug!("coarse fix rejected: |x|={:.3}m", norm);
        return Err(Error::InvalidState);
    }

    let gt_g = g.transpose() * g.clone();
    let gdop = gt_g
        .try_inverse()
        .ok_or(Error::MatrixInversion)?
        .trace()
        .sqrt();

    let clock_biases_m = layout
        .iter()
        .enumerate()
        .map(|(k, c)| {
            let bias = if k == 0 { x[3] } else { x[3] + x[3 + k] };
            (*c, bias)
        })
        .collect();

    let residuals_m = measurements
        .iter()
        .zip(clock_indexes.iter())
        .map(|(meas, clock_index)| {
            let (predicted, _) = model(meas, &x, *clock_index, cfg);
            meas.observables.pseudorange_m - predicted
        })
        .collect();

    Ok(CoarseFix {
        epoch,
        position_ecef_m,
        clock_biases_m,
        residuals_m,
        gdop,
        iterations,
    })
}

/// Attempts a coarse position fix from qualified measurements.
/// Returns None when geometry or measurement count does not allow it,
/// or the iterative solver fails.
pub fn calc_pos_fix(measurements: &[ProcessedMeasurement], cfg: &Config) -> Option<CoarseFix> {
    match solve(measurements, cfg) {
        Ok(fix) => {
            debug!(
                "{} - coarse fix x={:.3} y={:.3} z={:.3} gdop={:.2} ({} iterations)",
                fix.epoch,
                fix.position_ecef_m[0],
                fix.position_ecef_m[1],
                fix.position_ecef_m[2],
                fix.gdop,
                fix.iterations
            );
            Some(fix)
        },
        Err(Error::NotEnoughMeasurements(n, min)) => {
            debug!("coarse fix: not enough measurements ({}/{})", n, min);
            None
        },
        Err(e) => {
            warn!("coarse fix failed: {}", e);
            None
        },
    }
}

#[cfg(test)]
mod test {
    use super::{calc_pos_fix, clock_layout, sagnac_rotation, solve};
    use crate::{
        constants::{EARTH_ANGULAR_VEL_RAD, SPEED_OF_LIGHT_M_S},
        measurement::ProcessedMeasurement,
        prelude::{Config, Constellation, Error, Vector3, SV},
    };

    /// Measurements from satellites spread around `rx`,
    /// consistent with the solver model (no satellite clock).
    fn measurements(
        rx: Vector3<f64>,
        bias_m: f64,
        glonass_isb_m: f64,
    ) -> Vec<ProcessedMeasurement> {
        let directions = [
            (0.0_f64, 80.0_f64),
            (45.0, 40.0),
            (120.0, 25.0),
            (200.0, 55.0),
            (270.0, 30.0),
            (330.0, 15.0),
            (160.0, 70.0),
            (90.0, 10.0),
        ];

        let up = rx.normalize();
        let east = Vector3::new(-rx[1], rx[0], 0.0).normalize();
        let north = up.cross(&east);

        directions
            .iter()
            .enumerate()
            .map(|(i, (az_deg, el_deg))| {
                let (az, el) = (az_deg.to_radians(), el_deg.to_radians());
                let horizontal = east * az.sin() + north * az.cos();
                let los = (horizontal * el.cos() + up * el.sin()).normalize();

                let rho = 2.1E7;
                let sat_at_rx_frame = rx + los * rho;

                // position at transmission, expressed at transmission frame
                let mut sat_pos = sat_at_rx_frame;
                for _ in 0..5 {
                    let flight = (sat_pos - rx).norm() / SPEED_OF_LIGHT_M_S;
                    sat_pos = sagnac_rotation(&sat_at_rx_frame, -flight);
                }

                let constellation = if i % 4 == 3 {
                    Constellation::Glonass
                } else {
                    Constellation::GPS
                };

                let mut pr = rho + bias_m;
                if constellation == Constellation::Glonass {
                    pr += glonass_isb_m;
                }

                let mut meas = ProcessedMeasurement::default();
                meas.sv = SV::new(constellation, i as u8 + 1);
                meas.sat_pos = sat_pos;
                meas.observables.pseudorange_m = pr;
                meas.observables.pseudorange_std_m = 3.0;
                meas
            })
            .collect()
    }

    #[test]
    fn sagnac() {
        let sat = Vector3::new(2.0E7, 0.0, 0.0);
        let rotated = sagnac_rotation(&sat, 0.07);
        let angle = EARTH_ANGULAR_VEL_RAD * 0.07;
        assert!((rotated[0] - 2.0E7 * angle.cos()).abs() < 1.0E-6);
        assert!((rotated[1] + 2.0E7 * angle.sin()).abs() < 1.0E-6);
        assert!((rotated.norm() - sat.norm()).abs() < 1.0E-6);
    }

    #[test]
    fn layout() {
        let rx = Vector3::new(4_000_000.0, 3_000_000.0, 3_900_000.0);
        let mut meas = measurements(rx, 0.0, 0.0);
        meas.rotate_left(3); // glonass first
        assert_eq!(
            clock_layout(&meas),
            vec![Constellation::GPS, Constellation::Glonass]
        );
    }

    #[test]
    fn coarse_fix() {
        let cfg = Config::default();
        let rx = Vector3::new(4_000_000.0, 3_000_000.0, 3_900_000.0);
        let meas = measurements(rx, 1500.0, 30.0);

        let fix = calc_pos_fix(&meas, &cfg).unwrap();
        let error = (fix.position_ecef_m - rx).norm();
        assert!(error < 1.0E-2, "coarse fix error too large: {}", error);

        assert_eq!(fix.clock_biases_m.len(), 2);
        assert_eq!(fix.clock_biases_m[0].0, Constellation::GPS);
        assert!((fix.clock_biases_m[0].1 - 1500.0).abs() < 1.0E-2);
        assert!((fix.clock_biases_m[1].1 - 1530.0).abs() < 1.0E-2);
        assert!(fix.residuals_m.iter().all(|r| r.abs() < 1.0E-2));
        assert!(fix.gdop > 1.0 && fix.gdop < 10.0);
        assert_eq!(fix.to_vec().len(), 5);
    }

    #[test]
    fn not_enough_measurements() {
        let cfg = Config::default();
        let rx = Vector3::new(4_000_000.0, 3_000_000.0, 3_900_000.0);
        let meas = measurements(rx, 0.0, 0.0);
        assert!(calc_pos_fix(&meas[..5], &cfg).is_none());
        assert!(calc_pos_fix(&[], &cfg).is_none());
    }

    #[test]
    fn invalid_observables() {
        let cfg = Config::default();
        let rx = Vector3::new(4_000_000.0, 3_000_000.0, 3_900_000.0);
        let mut meas = measurements(rx, 0.0, 0.0);
        meas[2].observables.pseudorange_m = f64::NAN;
        assert!(calc_pos_fix(&meas, &cfg).is_none());
    }

    #[test]
    fn position_below_earth_surface() {
        let cfg = Config::default();
        let rx = Vector3::new(1.0E5, 2.0E5, 3.0E5);
        let meas = measurements(rx, 0.0, 0.0);
        assert!(matches!(solve(&meas, &cfg), Err(Error::InvalidState)));
        assert!(calc_pos_fix(&meas, &cfg).is_none());
    }

    #[test]
    fn position_above_earth_surface() {
        let mut cfg = Config::default();
        cfg.max_iterations = 20;
        let rx = Vector3::new(6.0E6, 8.0E6, 2.0E6);
        let meas = measurements(rx, 0.0, 0.0);
        assert!(matches!(solve(&meas, &cfg), Err(Error::InvalidState)));
    }
}
