//! Atmosphere and clock corrections, from a coarse position
use log::debug;
use map_3d::{ecef2geodetic, Ellipsoid};

use crate::{
    bias::{Bias, BiasRuntime},
    constants::SPEED_OF_LIGHT_M_S,
    ephemeris::EphemerisStore,
    measurement::{FinalObservables, ProcessedMeasurement},
    navigation::{sagnac_rotation, MAX_POSITION_NORM_M, MIN_POSITION_NORM_M},
    prelude::{Config, Vector3},
};

/// Receiver geodetic coordinates: latitude, longitude (rad), altitude (m)
fn geodetic(position_ecef_m: &Vector3<f64>) -> (f64, f64, f64) {
    ecef2geodetic(
        position_ecef_m[0],
        position_ecef_m[1],
        position_ecef_m[2],
        Ellipsoid::WGS84,
    )
}

/// Elevation and azimuth (degrees) of `sat_pos_m`, seen from `rx_ecef_m`
/// located at (`lat_rad`, `lon_rad`).
pub fn elevation_azimuth(
    sat_pos_m: &Vector3<f64>,
    rx_ecef_m: &Vector3<f64>,
    lat_rad: f64,
    lon_rad: f64,
) -> (f64, f64) {
    let los = (sat_pos_m - rx_ecef_m).normalize();

    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();

    // ECEF to ENU
    let e = -sin_lon * los[0] + cos_lon * los[1];
    let n = -sin_lat * cos_lon * los[0] - sin_lat * sin_lon * los[1] + cos_lat * los[2];
    let u = cos_lat * cos_lon * los[0] + cos_lat * sin_lon * los[1] + sin_lat * los[2];

    let elevation = u.clamp(-1.0, 1.0).asin().to_degrees();

    let mut azimuth = e.atan2(n).to_degrees();
    if azimuth < 0.0 {
        azimuth += 360.0;
    }

    (elevation, azimuth)
}

/// Corrects one measurement, returns true on success.
fn correct(
    meas: &mut ProcessedMeasurement,
    rx_ecef_m: &Vector3<f64>,
    rx_geodetic: (f64, f64, f64),
    store: &EphemerisStore,
    cfg: &Config,
) -> bool {
    let (lat_rad, lon_rad, alt_m) = rx_geodetic;

    let sat_pos = if cfg.modeling.earth_rotation {
        let flight_time_s = (meas.sat_pos - rx_ecef_m).norm() / SPEED_OF_LIGHT_M_S;
        sagnac_rotation(&meas.sat_pos, flight_time_s)
    } else {
        meas.sat_pos
    };

    let (elevation_deg, azimuth_deg) = elevation_azimuth(&sat_pos, rx_ecef_m, lat_rad, lon_rad);

    if !(elevation_deg > 0.0) {
        debug!(
            "{}({}) - below horizon (elev={:.2}°)",
            meas.recv_time, meas.sv, elevation_deg
        );
        return false;
    }

    let rtm = BiasRuntime {
        t: meas.recv_time,
        sv_elevation_azimuth_deg_deg: (elevation_deg, azimuth_deg),
        rx_lat_long_alt_deg_deg_m: (lat_rad.to_degrees(), lon_rad.to_degrees(), alt_m),
        frequency_hz: meas.carrier.frequency(),
    };

    let tropo_m = match cfg.modeling.tropo_delay {
        true => Some(cfg.troposphere.bias_m(&rtm)),
        false => Some(0.0),
    };

    let iono_m = match cfg.modeling.iono_delay {
        true => store.klobuchar().map(|kb| kb.bias_m(&rtm)),
        false => Some(0.0),
    };

    let (tropo_m, iono_m) = match (tropo_m, iono_m) {
        (Some(tropo), Some(iono)) => (tropo, iono),
        (tropo, iono) => {
            if !cfg.allow_incomplete_delay {
                debug!(
                    "{}({}) - missing atmospheric delay (tropo={:?} iono={:?})",
                    meas.recv_time, meas.sv, tropo, iono
                );
                return false;
            }
            (tropo.unwrap_or_default(), iono.unwrap_or_default())
        },
    };

    let (clock_m, clock_rate_m_s) = match cfg.modeling.sv_clock_bias {
        true => (meas.sat_clock.range_m(), meas.sat_clock.range_rate_m_s()),
        false => (0.0, 0.0),
    };

    let pseudorange_m = meas.observables.pseudorange_m + clock_m - tropo_m - iono_m;
    let pseudorange_rate_m_s = meas.observables.pseudorange_rate_m_s + clock_rate_m_s;

    if !pseudorange_m.is_finite()
        || !pseudorange_rate_m_s.is_finite()
        || sat_pos.iter().any(|v| !v.is_finite())
    {
        debug!("{}({}) - non finite correction", meas.recv_time, meas.sv);
        return false;
    }

    debug!(
        "{}({}) - elev={:.2}° clock={:.3}m tropo={:.3}m iono={:.3}m",
        meas.recv_time, meas.sv, elevation_deg, clock_m, tropo_m, iono_m
    );

    meas.observables_final = FinalObservables {
        pseudorange_m: Some(pseudorange_m),
        pseudorange_rate_m_s: Some(pseudorange_rate_m_s),
        ..Default::default()
    };

    meas.sat_pos_final = Some(sat_pos);
    true
}

/// Corrects [ProcessedMeasurement]s in place, given the coarse receiver position.
/// Measurements that cannot be corrected are left untouched.
/// Returns the number of corrected measurements.
pub fn correct_measurements(
    measurements: &mut [ProcessedMeasurement],
    position_ecef_m: &Vector3<f64>,
    store: &EphemerisStore,
    cfg: &Config,
) -> usize {
    let norm = position_ecef_m.norm();
    if !(MIN_POSITION_NORM_M..=MAX_POSITION_NORM_M).contains(&norm) {
        debug!("correction: invalid receiver position |x|={:.3}m", norm);
        return 0;
    }

    let rx_geodetic = geodetic(position_ecef_m);

    measurements
        .iter_mut()
        .map(|meas| correct(meas, position_ecef_m, rx_geodetic, store, cfg))
        .filter(|corrected| *corrected)
        .count()
}
