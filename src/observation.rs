//! Raw observables extraction from receiver reports
use log::{debug, trace};

use crate::{
    carrier::Carrier,
    prelude::{Config, Constellation, SV},
    report::{MeasurementReport, RawMeasurement},
};

/// GLONASS frequency slot offset, in u-blox reports
const GLONASS_FREQUENCY_INDEX_OFFSET: i8 = 7;

/// One satellite raw observables, on its primary band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawObservation {
    /// [SV]
    pub sv: SV,
    /// [Carrier] signal
    pub carrier: Carrier,
    /// GLONASS frequency channel
    pub glonass_frequency: Option<i8>,
    /// Pseudo range (m)
    pub pseudorange_m: f64,
    /// Pseudo range standard deviation (m)
    pub pseudorange_std_m: f64,
    /// Pseudo range rate (m/s)
    pub pseudorange_rate_m_s: f64,
    /// Pseudo range rate standard deviation (m/s)
    pub pseudorange_rate_std_m_s: f64,
    /// Carrier to noise density ratio (dB-Hz)
    pub cno_dbhz: f64,
}

/// Identifies [Constellation] from u-blox gnssId.
pub fn ublox_constellation(gnss_id: u8) -> Option<Constellation> {
    match gnss_id {
        0 => Some(Constellation::GPS),
        1 => Some(Constellation::SBAS),
        2 => Some(Constellation::Galileo),
        3 => Some(Constellation::BeiDou),
        5 => Some(Constellation::QZSS),
        6 => Some(Constellation::Glonass),
        _ => None,
    }
}

/// Non finite values collapse to zero.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn extract(meas: &RawMeasurement, cfg: &Config) -> Option<RawObservation> {
    let constellation = ublox_constellation(meas.gnss_id)?;
    let sv = SV::new(constellation, meas.sv_id);

    if !meas.tracking_status.pseudorange_valid {
        trace!("({}) - pseudo range not valid", sv);
        return None;
    }

    if !(meas.pseudorange.is_finite() && meas.pseudorange > 0.0) {
        debug!("({}) - invalid pseudo range {}", sv, meas.pseudorange);
        return None;
    }

    let cno_dbhz = meas.cno as f64;
    if let Some(min_cno) = cfg.min_cno_dbhz {
        if cno_dbhz < min_cno {
            trace!("({}) - below signal mask ({} dB-Hz)", sv, cno_dbhz);
            return None;
        }
    }

    let glonass_frequency = match constellation {
        Constellation::Glonass => match meas.glonass_frequency_index {
            index @ 0..=13 => Some(index as i8 - GLONASS_FREQUENCY_INDEX_OFFSET),
            index => {
                debug!("({}) - invalid frequency slot {}", sv, index);
                return None;
            },
        },
        _ => None,
    };

    let carrier = Carrier::from_ublox(
        constellation,
        meas.sig_id,
        glonass_frequency.unwrap_or_default(),
    )?;

    let wavelength = carrier.wavelength();

    let rate = -finite_or_zero(meas.doppler) * wavelength;
    let rate_std = finite_or_zero(meas.doppler_stdev).abs() * wavelength;

    Some(RawObservation {
        sv,
        carrier,
        glonass_frequency,
        pseudorange_m: meas.pseudorange,
        pseudorange_std_m: finite_or_zero(meas.pseudorange_stdev).abs(),
        pseudorange_rate_m_s: rate,
        pseudorange_rate_std_m_s: rate_std,
        cno_dbhz,
    })
}

/// Converts one [MeasurementReport] to [RawObservation]s,
/// skipping records we cannot exploit.
pub fn extract_observations(report: &MeasurementReport, cfg: &Config) -> Vec<RawObservation> {
    report
        .measurements
        .iter()
        .filter_map(|meas| extract(meas, cfg))
        .collect()
}
