//! Outbound measurement messages
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constellation::ConstellationId, measurement::ProcessedMeasurement, prelude::Constellation,
};

/// One satellite measurement, as published.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct OutputRecord {
    /// [ConstellationId]
    pub constellation_id: ConstellationId,
    /// Satellite number within its constellation
    pub sv_id: u16,
    /// GLONASS frequency channel, 0 for other constellations
    pub glonass_frequency: i8,
    /// Pseudo range (m)
    pub pseudorange: f64,
    /// Pseudo range standard deviation (m)
    pub pseudorange_std: f64,
    /// Pseudo range rate (m/s)
    pub pseudorange_rate: f64,
    /// Pseudo range rate standard deviation (m/s)
    pub pseudorange_rate_std: f64,
    /// Satellite ECEF position (m)
    pub sat_pos: [f64; 3],
    /// Satellite ECEF velocity (m/s)
    pub sat_vel: [f64; 3],
}

/// Measurements published for one receiver epoch.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct OutputMessage {
    /// Monotonic timestamp of the receiver report this was built from
    pub ublox_mono_time: u64,
    /// [OutputRecord]s, in qualification order
    pub corrected_measurements: Vec<OutputRecord>,
}

impl OutputMessage {
    /// Message published when a measurement report produced nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.corrected_measurements.is_empty()
    }
}

/// Satellite number: identifier with its constellation letter stripped.
fn satellite_number(meas: &ProcessedMeasurement) -> u16 {
    let id = meas.satellite_id();
    id.get(1..)
        .and_then(|number| number.parse::<u16>().ok())
        .unwrap_or(meas.sv.prn as u16)
}

/// Serializes one [ProcessedMeasurement]. Corrected observables
/// are preferred over raw ones, field by field.
pub fn create_measurement_msg(meas: &ProcessedMeasurement) -> OutputRecord {
    let constellation_id =
        ConstellationId::from_constellation(meas.sv.constellation).unwrap_or_default();

    let glonass_frequency = match meas.sv.constellation {
        Constellation::Glonass => meas.glonass_frequency.unwrap_or_default(),
        _ => 0,
    };

    let sat_pos = meas.sat_position_m();

    OutputRecord {
        constellation_id,
        sv_id: satellite_number(meas),
        glonass_frequency,
        pseudorange: meas.pseudorange_m(),
        pseudorange_std: meas.pseudorange_std_m(),
        pseudorange_rate: meas.pseudorange_rate_m_s(),
        pseudorange_rate_std: meas.pseudorange_rate_std_m_s(),
        sat_pos: [sat_pos[0], sat_pos[1], sat_pos[2]],
        sat_vel: [meas.sat_vel[0], meas.sat_vel[1], meas.sat_vel[2]],
    }
}

/// Builds the [OutputMessage] of one receiver epoch.
pub fn create_output_message(
    ublox_mono_time: u64,
    measurements: &[ProcessedMeasurement],
) -> OutputMessage {
    OutputMessage {
        ublox_mono_time,
        corrected_measurements: measurements.iter().map(create_measurement_msg).collect(),
    }
}

#[cfg(test)]
mod test {
    use super::{create_measurement_msg, create_output_message, OutputMessage};
    use crate::{
        constellation::ConstellationId,
        measurement::ProcessedMeasurement,
        prelude::{Constellation, Vector3, SV},
    };

    fn measurement(sv: SV) -> ProcessedMeasurement {
        let mut meas = ProcessedMeasurement::default();
        meas.sv = sv;
        meas
    }

    #[test]
    fn zero_observables() {
        let meas = measurement(SV::new(Constellation::GPS, 1));
        let record = create_measurement_msg(&meas);
        assert_eq!(record.pseudorange, 0.0);
        assert_eq!(record.pseudorange_rate, 0.0);
        assert_eq!(record.constellation_id, ConstellationId::Gps);
        assert_eq!(record.constellation_id.to_string(), "gps");
    }

    #[test]
    fn corrected_observables_priority() {
        let mut meas = measurement(SV::new(Constellation::GPS, 1));
        meas.observables.pseudorange_rate_m_s = -12.0;
        meas.observables_final.pseudorange_m = Some(1.0);

        let record = create_measurement_msg(&meas);
        assert_eq!(record.pseudorange, 1.0);
        assert_eq!(record.pseudorange_rate, -12.0);
    }

    #[test]
    fn corrected_position() {
        let mut meas = measurement(SV::new(Constellation::GPS, 1));
        meas.sat_pos = Vector3::new(1.0, 2.0, 3.0);
        meas.sat_vel = Vector3::new(4.0, 5.0, 6.0);
        assert_eq!(create_measurement_msg(&meas).sat_pos, [1.0, 2.0, 3.0]);

        meas.sat_pos_final = Some(Vector3::new(1.5, 2.5, 3.5));
        let record = create_measurement_msg(&meas);
        assert_eq!(record.sat_pos, [1.5, 2.5, 3.5]);
        assert_eq!(record.sat_vel, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn idempotence() {
        let mut meas = measurement(SV::new(Constellation::Galileo, 11));
        meas.observables.pseudorange_m = 2.3456789E7;
        meas.observables.pseudorange_std_m = 2.7;
        meas.sat_vel = Vector3::new(-1234.5, 987.6, 0.1);

        let (first, second) = (create_measurement_msg(&meas), create_measurement_msg(&meas));
        assert_eq!(first, second);
        assert_eq!(first.pseudorange.to_bits(), second.pseudorange.to_bits());
    }

    #[test]
    fn satellite_numbers() {
        let meas = measurement(SV::new(Constellation::GPS, 1));
        assert_eq!(meas.satellite_id(), "G01");
        let record = create_measurement_msg(&meas);
        assert_eq!(record.sv_id, 1);
        assert_eq!(record.glonass_frequency, 0);

        let mut meas = measurement(SV::new(Constellation::Glonass, 14));
        meas.glonass_frequency = Some(-7);
        assert_eq!(meas.satellite_id(), "R14");
        let record = create_measurement_msg(&meas);
        assert_eq!(record.sv_id, 14);
        assert_eq!(record.constellation_id, ConstellationId::Glonass);
        assert_eq!(record.glonass_frequency, -7);

        // frequency channel only published for glonass
        let mut meas = measurement(SV::new(Constellation::GPS, 3));
        meas.glonass_frequency = Some(2);
        assert_eq!(create_measurement_msg(&meas).glonass_frequency, 0);
    }

    #[test]
    fn message() {
        let meas = [
            measurement(SV::new(Constellation::GPS, 5)),
            measurement(SV::new(Constellation::GPS, 2)),
        ];
        let msg = create_output_message(42, &meas);
        assert_eq!(msg.ublox_mono_time, 42);
        assert_eq!(msg.corrected_measurements.len(), 2);
        assert_eq!(msg.corrected_measurements[0].sv_id, 5);
        assert_eq!(msg.corrected_measurements[1].sv_id, 2);

        let empty = OutputMessage::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.ublox_mono_time, 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_layout() {
        let mut meas = measurement(SV::new(Constellation::Glonass, 14));
        meas.glonass_frequency = Some(3);
        let msg = create_output_message(7, &[meas]);

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["ubloxMonoTime"], 7);
        let record = &value["correctedMeasurements"][0];
        assert_eq!(record["constellationId"], "glonass");
        assert_eq!(record["svId"], 14);
        assert_eq!(record["glonassFrequency"], 3);
        assert_eq!(record["satPos"].as_array().map(|a| a.len()), Some(3));
        assert!(record.get("pseudorangeRateStd").is_some());
    }
}
