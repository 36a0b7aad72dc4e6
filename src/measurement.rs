//! Measurement qualification
use log::debug;

use crate::{
    bias::SatelliteClockCorrection,
    carrier::Carrier,
    constants::SPEED_OF_LIGHT_M_S,
    constellation::satellite_id,
    ephemeris::EphemerisStore,
    observation::RawObservation,
    prelude::{Config, Epoch, Unit, Vector3, SV},
};

/// Satellite orbit radius we consider plausible (m)
const MIN_ORBIT_RADIUS_M: f64 = 1.0E6;
const MAX_ORBIT_RADIUS_M: f64 = 1.0E8;

/// Raw observables, as measured.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Observables {
    /// Pseudo range (m)
    pub pseudorange_m: f64,
    /// Pseudo range standard deviation (m)
    pub pseudorange_std_m: f64,
    /// Pseudo range rate (m/s)
    pub pseudorange_rate_m_s: f64,
    /// Pseudo range rate standard deviation (m/s)
    pub pseudorange_rate_std_m_s: f64,
}

/// Corrected observables. Each field is only present
/// once the corrector managed to resolve it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FinalObservables {
    pub pseudorange_m: Option<f64>,
    pub pseudorange_std_m: Option<f64>,
    pub pseudorange_rate_m_s: Option<f64>,
    pub pseudorange_rate_std_m_s: Option<f64>,
}

impl FinalObservables {
    pub fn is_empty(&self) -> bool {
        self.pseudorange_m.is_none()
            && self.pseudorange_std_m.is_none()
            && self.pseudorange_rate_m_s.is_none()
            && self.pseudorange_rate_std_m_s.is_none()
    }
}

/// Qualified measurement: one satellite observation with
/// usable orbital state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedMeasurement {
    /// [SV]
    pub sv: SV,
    /// [Carrier] signal
    pub carrier: Carrier,
    /// GLONASS frequency channel
    pub glonass_frequency: Option<i8>,
    /// Reception [Epoch]
    pub recv_time: Epoch,
    /// Transmission [Epoch], in system time
    pub sat_time: Epoch,
    /// Raw [Observables]
    pub observables: Observables,
    /// Corrected observables
    pub observables_final: FinalObservables,
    /// Satellite ECEF position at transmission (m)
    pub sat_pos: Vector3<f64>,
    /// Satellite ECEF velocity at transmission (m/s)
    pub sat_vel: Vector3<f64>,
    /// Satellite onboard clock correction
    pub sat_clock: SatelliteClockCorrection,
    /// Satellite ECEF position at transmission, expressed in
    /// the ECEF frame at reception, once corrected
    pub sat_pos_final: Option<Vector3<f64>>,
}

impl ProcessedMeasurement {
    /// Satellite identifier ("G01", "R14"..)
    pub fn satellite_id(&self) -> String {
        satellite_id(&self.sv)
    }

    /// Best pseudo range estimate: corrected or raw (m)
    pub fn pseudorange_m(&self) -> f64 {
        self.observables_final
            .pseudorange_m
            .unwrap_or(self.observables.pseudorange_m)
    }

    /// Best pseudo range standard deviation (m)
    pub fn pseudorange_std_m(&self) -> f64 {
        self.observables_final
            .pseudorange_std_m
            .unwrap_or(self.observables.pseudorange_std_m)
    }

    /// Best pseudo range rate estimate (m/s)
    pub fn pseudorange_rate_m_s(&self) -> f64 {
        self.observables_final
            .pseudorange_rate_m_s
            .unwrap_or(self.observables.pseudorange_rate_m_s)
    }

    /// Best pseudo range rate standard deviation (m/s)
    pub fn pseudorange_rate_std_m_s(&self) -> f64 {
        self.observables_final
            .pseudorange_rate_std_m_s
            .unwrap_or(self.observables.pseudorange_rate_std_m_s)
    }

    /// Satellite position, corrected when available (m)
    pub fn sat_position_m(&self) -> Vector3<f64> {
        self.sat_pos_final.unwrap_or(self.sat_pos)
    }

    /// True once the corrector processed this measurement
    pub fn is_corrected(&self) -> bool {
        !self.observables_final.is_empty()
    }
}

fn is_plausible(position: &Vector3<f64>, velocity: &Vector3<f64>, clock_s: f64) -> bool {
    let r = position.norm();
    r.is_finite()
        && (MIN_ORBIT_RADIUS_M..MAX_ORBIT_RADIUS_M).contains(&r)
        && velocity.iter().all(|v| v.is_finite())
        && clock_s.is_finite()
}

fn qualify(
    obs: &RawObservation,
    t_rx: Epoch,
    store: &EphemerisStore,
    cfg: &Config,
) -> Option<ProcessedMeasurement> {
    let sv = obs.sv;
    let pseudorange = obs.pseudorange_m;

    if !pseudorange.is_finite() || pseudorange <= 0.0 {
        debug!("{}({}) - invalid pseudo range", t_rx, sv);
        return None;
    }

    let t_tx = t_rx - (pseudorange / SPEED_OF_LIGHT_M_S) * Unit::Second;

    let model = match store.select(sv, t_tx, cfg.ephemeris_validity_s) {
        Some(model) => model,
        None => {
            debug!("{}({}) - no valid ephemeris", t_rx, sv);
            return None;
        },
    };

    // signal left when the onboard clock read t_tx
    let clock = match model.resolve(t_tx) {
        Ok(state) => state.clock,
        Err(e) => {
            debug!("{}({}) - orbital state error: {}", t_rx, sv, e);
            return None;
        },
    };

    if !clock.total_s().is_finite() {
        debug!("{}({}) - invalid clock state", t_rx, sv);
        return None;
    }

    let sat_time = t_tx - clock.duration();

    let state = match model.resolve(sat_time) {
        Ok(state) => state,
        Err(e) => {
            debug!("{}({}) - orbital state error: {}", t_rx, sv, e);
            return None;
        },
    };

    if !is_plausible(&state.position_m, &state.velocity_m_s, state.clock.total_s()) {
        debug!("{}({}) - implausible orbital state", t_rx, sv);
        return None;
    }

    Some(ProcessedMeasurement {
        sv,
        carrier: obs.carrier,
        glonass_frequency: obs.glonass_frequency,
        recv_time: t_rx,
        sat_time,
        observables: Observables {
            pseudorange_m: pseudorange,
            pseudorange_std_m: obs.pseudorange_std_m,
            pseudorange_rate_m_s: obs.pseudorange_rate_m_s,
            pseudorange_rate_std_m_s: obs.pseudorange_rate_std_m_s,
        },
        observables_final: FinalObservables::default(),
        sat_pos: state.position_m,
        sat_vel: state.velocity_m_s,
        sat_clock: state.clock,
        sat_pos_final: None,
    })
}

/// Qualifies [RawObservation]s received at `t_rx` against the [EphemerisStore].
/// Satellites without usable model or geometry are dropped. Returns None
/// when no measurement remains.
pub fn process_measurements(
    observations: &[RawObservation],
    t_rx: Epoch,
    store: &EphemerisStore,
    cfg: &Config,
) -> Option<Vec<ProcessedMeasurement>> {
    let processed = observations
        .iter()
        .filter_map(|obs| qualify(obs, t_rx, store, cfg))
        .collect::<Vec<_>>();

    if processed.is_empty() {
        debug!("{} - no qualified measurement", t_rx);
        None
    } else {
        debug!(
            "{} - {}/{} qualified measurements",
            t_rx,
            processed.len(),
            observations.len()
        );
        Some(processed)
    }
}
