use log::debug;

use crate::{
    bias::KbModel,
    constants::{SEMICIRCLE_RAD, WEEK_SECONDS},
    ephemeris::EphemerisModel,
    prelude::{Constellation, Epoch, Error, Unit, SV},
    report::EphemerisReport,
    time::{gpst_epoch, gpst_week_tow, resolve_week},
};

/// Fit interval (hours) when not broadcast
const DEFAULT_FIT_INTERVAL_H: f64 = 4.0;

/// Brings ToC within half a week of ToE, when both straddle a week boundary.
fn closest_week(t: Epoch, toe: Epoch) -> Epoch {
    let dt_s = (t - toe).to_seconds();
    if dt_s > WEEK_SECONDS / 2.0 {
        t - WEEK_SECONDS * Unit::Second
    } else if dt_s < -WEEK_SECONDS / 2.0 {
        t + WEEK_SECONDS * Unit::Second
    } else {
        t
    }
}

/// Converts receiver native GPS [EphemerisReport] to [EphemerisModel].
/// The truncated broadcast week is resolved using `reference`,
/// which must be a recent past instant.
pub fn convert_ublox_ephemeris(
    report: &EphemerisReport,
    reference: Epoch,
) -> Result<EphemerisModel, Error> {
    if report.sv_id == 0 || report.sv_id > 32 {
        return Err(Error::InvalidEphemeris(format!(
            "invalid gps satellite number {}",
            report.sv_id
        )));
    }

    let sv = SV::new(Constellation::GPS, report.sv_id);

    if !(report.sqrt_a > 0.0) {
        return Err(Error::InvalidEphemeris(format!(
            "{}: invalid semi major axis",
            sv
        )));
    }

    if !(0.0..1.0).contains(&report.ecc) {
        return Err(Error::InvalidEphemeris(format!("{}: invalid eccentricity", sv)));
    }

    let parameters = [
        report.m0,
        report.delta_n,
        report.omega0,
        report.omega_dot,
        report.omega,
        report.i0,
        report.i_dot,
        report.cuc,
        report.cus,
        report.cic,
        report.cis,
        report.crc,
        report.crs,
        report.af0,
        report.af1,
        report.af2,
        report.tgd,
        report.toe,
        report.toc,
    ];

    if parameters.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidEphemeris(format!("{}: non finite parameter", sv)));
    }

    let (reference_week, _) = gpst_week_tow(reference);
    let week = resolve_week(report.gps_week, reference_week);

    let toe = gpst_epoch(week, report.toe);
    let toc = closest_week(gpst_epoch(week, report.toc), toe);

    let fit_interval_h = if report.fit_interval > 0.0 {
        report.fit_interval
    } else {
        DEFAULT_FIT_INTERVAL_H
    };

    debug!(
        "{}({}) - ephemeris week={} (broadcast {}) iode={}",
        toe, sv, week, report.gps_week, report.iode
    );

    Ok(EphemerisModel {
        sv,
        toe,
        toc,
        iode: report.iode,
        semi_major_axis_m: report.sqrt_a.powi(2),
        eccentricity: report.ecc,
        m0_rad: report.m0 * SEMICIRCLE_RAD,
        dn_rad_s: report.delta_n * SEMICIRCLE_RAD,
        i0_rad: report.i0 * SEMICIRCLE_RAD,
        idot_rad_s: report.i_dot * SEMICIRCLE_RAD,
        omega0_rad: report.omega0 * SEMICIRCLE_RAD,
        omega_rad: report.omega * SEMICIRCLE_RAD,
        omega_dot_rad_s: report.omega_dot * SEMICIRCLE_RAD,
        cus_cuc_rad: (report.cus, report.cuc),
        cis_cic_rad: (report.cis, report.cic),
        crs_crc_m: (report.crs, report.crc),
        af: (report.af0, report.af1, report.af2),
        tgd_s: report.tgd,
        fit_interval_h,
        healthy: report.sv_health == 0,
    })
}

/// Retrieves the ionosphere model broadcast along this [EphemerisReport].
pub fn convert_ublox_klobuchar(report: &EphemerisReport) -> Option<KbModel> {
    if !report.iono_coeffs_valid {
        return None;
    }
    KbModel::from_coefficients(&report.iono_alpha, &report.iono_beta)
}
