//! Per report dispatch
use log::{debug, warn};

use crate::{
    correction::correct_measurements,
    ephemeris::{convert_ublox_ephemeris, convert_ublox_klobuchar, EphemerisStore},
    measurement::{process_measurements, ProcessedMeasurement},
    navigation::calc_pos_fix,
    observation::{extract_observations, RawObservation},
    output::{create_output_message, OutputMessage},
    prelude::{Config, Epoch},
    report::{EphemerisReport, MeasurementReport, ReceiverReport},
    time::ReferenceEpoch,
};

/// Qualifies and, when enabled, corrects the observations of one epoch.
/// Returns None when nothing survives qualification.
pub fn get_corrected_measurements(
    observations: &[RawObservation],
    t: Epoch,
    store: &EphemerisStore,
    cfg: &Config,
) -> Option<Vec<ProcessedMeasurement>> {
    if observations.is_empty() {
        debug!("{} - no observations", t);
        return None;
    }

    let mut measurements = process_measurements(observations, t, store, cfg)?;

    if cfg.correct {
        match calc_pos_fix(&measurements, cfg) {
            Some(fix) => {
                let corrected =
                    correct_measurements(&mut measurements, &fix.position_ecef_m, store, cfg);
                debug!(
                    "{} - corrected {}/{} measurements",
                    t,
                    corrected,
                    measurements.len()
                );
            },
            None => {
                debug!("{} - no coarse fix: correction skipped", t);
            },
        }
    }

    Some(measurements)
}

/// Handles one [MeasurementReport]. The first non empty report
/// latches the [ReferenceEpoch], prior qualification.
pub fn process_measurement_report(
    report: &MeasurementReport,
    mono_time: u64,
    reference: &mut ReferenceEpoch,
    store: &EphemerisStore,
    cfg: &Config,
) -> Option<OutputMessage> {
    if report.measurements.is_empty() {
        debug!("empty measurement report");
        return None;
    }

    let t = report.epoch();
    reference.set_if_absent(t);

    let observations = extract_observations(report, cfg);
    let measurements = get_corrected_measurements(&observations, t, store, cfg)?;

    Some(create_output_message(mono_time, &measurements))
}

/// Handles one [EphemerisReport]: ingested only once the [ReferenceEpoch] is known.
/// Returns true when the store was updated.
pub fn process_ephemeris_report(
    report: &EphemerisReport,
    reference: &ReferenceEpoch,
    store: &mut EphemerisStore,
) -> bool {
    let t_ref = match reference.get() {
        Some(t) => t,
        None => {
            debug!("G{:02} - ephemeris dropped: no reference epoch", report.sv_id);
            return false;
        },
    };

    match convert_ublox_ephemeris(report, t_ref) {
        Ok(model) => {
            if let Some(kb) = convert_ublox_klobuchar(report) {
                store.set_klobuchar(kb);
            }
            store.insert(model.sv, model);
            true
        },
        Err(e) => {
            warn!("{} - ephemeris conversion error: {}", t_ref, e);
            false
        },
    }
}

/// Dispatches receiver reports, owning the state that outlives one report.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    cfg: Config,
    store: EphemerisStore,
    reference: ReferenceEpoch,
}

impl Dispatcher {
    /// Creates a new [Dispatcher] with empty state.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            store: Default::default(),
            reference: Default::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// [EphemerisStore] built so far
    pub fn store(&self) -> &EphemerisStore {
        &self.store
    }

    /// [ReferenceEpoch] of this run
    pub fn reference(&self) -> &ReferenceEpoch {
        &self.reference
    }

    /// Processes one [ReceiverReport] stamped `mono_time`.
    /// Produces at most one [OutputMessage].
    pub fn process(&mut self, report: &ReceiverReport, mono_time: u64) -> Option<OutputMessage> {
        match report {
            ReceiverReport::MeasurementReport(report) => process_measurement_report(
                report,
                mono_time,
                &mut self.reference,
                &self.store,
                &self.cfg,
            ),
            ReceiverReport::Ephemeris(report) => {
                process_ephemeris_report(report, &self.reference, &mut self.store);
                None
            },
            ReceiverReport::Unknown => None,
        }
    }
}
