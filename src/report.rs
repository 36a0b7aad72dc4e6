//! Inbound receiver reports
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{prelude::Epoch, time::gpst_epoch};

/// One inbound receiver message, stamped by the transport.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ReceiverEvent {
    /// Monotonic receive timestamp (ns)
    pub log_mono_time: u64,
    /// Receiver report
    pub ublox_gnss: ReceiverReport,
}

/// Receiver report: exactly one variant per message.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "which"))]
pub enum ReceiverReport {
    /// Raw measurements of one receiver epoch
    #[cfg_attr(feature = "serde", serde(rename = "measurementReport"))]
    MeasurementReport(MeasurementReport),
    /// Decoded broadcast ephemeris of one satellite
    #[cfg_attr(feature = "serde", serde(rename = "ephemeris"))]
    Ephemeris(EphemerisReport),
    /// Any report we do not interprete
    #[cfg_attr(feature = "serde", serde(other))]
    Unknown,
}

/// Raw measurements of one receiver epoch (u-blox RXM-RAWX).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct MeasurementReport {
    /// Receiver time of week (s)
    pub rcv_tow: f64,
    /// GPS week number (full, not truncated)
    pub gps_week: u16,
    /// GPS leap seconds
    pub leap_seconds: u16,
    /// Per signal measurements
    pub measurements: Vec<RawMeasurement>,
}

impl MeasurementReport {
    /// Receive [Epoch] of this report, in GPST.
    pub fn epoch(&self) -> Epoch {
        gpst_epoch(self.gps_week as u32, self.rcv_tow)
    }
}

/// Measurement validity flags
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct TrackingStatus {
    pub pseudorange_valid: bool,
    pub carrier_phase_valid: bool,
    pub half_cycle_valid: bool,
    pub half_cycle_subtracted: bool,
}

/// One signal measurement, receiver native.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct RawMeasurement {
    /// Satellite number within its constellation
    pub sv_id: u8,
    /// u-blox GNSS identifier
    pub gnss_id: u8,
    /// u-blox signal identifier
    pub sig_id: u8,
    pub tracking_status: TrackingStatus,
    /// Pseudo range (m)
    pub pseudorange: f64,
    /// Carrier phase (cycles)
    pub carrier_cycles: f64,
    /// Doppler (Hz)
    pub doppler: f64,
    /// GLONASS frequency slot + 7 (0..13)
    pub glonass_frequency_index: u8,
    /// Carrier phase lock time (ms)
    pub locktime: u16,
    /// Carrier to noise density ratio (dB-Hz)
    pub cno: u8,
    /// Pseudo range standard deviation (m)
    pub pseudorange_stdev: f64,
    /// Carrier phase standard deviation (cycles)
    pub carrier_phase_stdev: f64,
    /// Doppler standard deviation (Hz)
    pub doppler_stdev: f64,
}

/// GPS LNAV broadcast ephemeris (subframes 1 to 3), decoded by the receiver.
/// Angles are expressed in semicircles, as broadcast.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct EphemerisReport {
    pub sv_id: u8,
    /// Broadcast (10 bit) week number
    pub gps_week: u16,
    /// Time of ephemeris (s of week)
    pub toe: f64,
    /// Time of clock (s of week)
    pub toc: f64,
    /// Clock bias (s)
    pub af0: f64,
    /// Clock drift (s/s)
    pub af1: f64,
    /// Clock drift rate (s/s²)
    pub af2: f64,
    pub iode: u16,
    pub iodc: u16,
    /// Square root of semi major axis (m^1/2)
    pub sqrt_a: f64,
    pub ecc: f64,
    pub m0: f64,
    pub delta_n: f64,
    pub omega0: f64,
    pub omega_dot: f64,
    pub omega: f64,
    pub i0: f64,
    pub i_dot: f64,
    /// Harmonic corrections (rad)
    pub cuc: f64,
    pub cus: f64,
    pub cic: f64,
    pub cis: f64,
    /// Harmonic corrections (m)
    pub crc: f64,
    pub crs: f64,
    /// Total group delay (s)
    pub tgd: f64,
    pub sv_health: u8,
    pub sv_acc: f64,
    /// Fit interval (hours), 0 means 4 hours
    pub fit_interval: f64,
    pub iono_coeffs_valid: bool,
    pub iono_alpha: Vec<f64>,
    pub iono_beta: Vec<f64>,
}

#[cfg(all(test, feature = "serde"))]
mod test {
    use super::{ReceiverEvent, ReceiverReport};

    #[test]
    fn measurement_report_decoding() {
        let content = r#"{"logMonoTime": 123, "ubloxGnss": {"which": "measurementReport",
            "rcvTow": 100.5, "gpsWeek": 2190, "measurements": [{"svId": 3, "gnssId": 0,
            "trackingStatus": {"pseudorangeValid": true}, "pseudorange": 2.1E7, "doppler": -100.0,
            "cno": 40, "pseudorangeStdev": 3.0, "dopplerStdev": 0.5}]}}"#;
        let event: ReceiverEvent = serde_json::from_str(content).unwrap();
        assert_eq!(event.log_mono_time, 123);
        match event.ublox_gnss {
            ReceiverReport::MeasurementReport(report) => {
                assert_eq!(report.gps_week, 2190);
                assert_eq!(report.rcv_tow, 100.5);
                assert_eq!(report.measurements.len(), 1);
                let meas = &report.measurements[0];
                assert_eq!(meas.sv_id, 3);
                assert!(meas.tracking_status.pseudorange_valid);
                assert!(!meas.tracking_status.carrier_phase_valid);
                assert_eq!(meas.glonass_frequency_index, 0);
            },
            report => panic!("decoded wrong variant {:?}", report),
        }
    }

    #[test]
    fn ephemeris_decoding() {
        let content = r#"{"logMonoTime": 1, "ubloxGnss": {"which": "ephemeris", "svId": 7,
            "gpsWeek": 142, "toe": 7200.0, "sqrtA": 5153.6, "ionoAlpha": [1.0, 2.0, 3.0, 4.0]}}"#;
        let event: ReceiverEvent = serde_json::from_str(content).unwrap();
        match event.ublox_gnss {
            ReceiverReport::Ephemeris(eph) => {
                assert_eq!(eph.sv_id, 7);
                assert_eq!(eph.gps_week, 142);
                assert_eq!(eph.sqrt_a, 5153.6);
                assert_eq!(eph.iono_alpha.len(), 4);
                assert!(eph.iono_beta.is_empty());
            },
            report => panic!("decoded wrong variant {:?}", report),
        }
    }

    #[test]
    fn unknown_report_decoding() {
        let content = r#"{"logMonoTime": 1, "ubloxGnss": {"which": "hwStatus"}}"#;
        let event: ReceiverEvent = serde_json::from_str(content).unwrap();
        assert_eq!(event.ublox_gnss, ReceiverReport::Unknown);
    }
}
