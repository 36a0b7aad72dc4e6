#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod bias;
mod carrier;
mod cfg;
mod constants;
mod constellation;
mod correction;
mod dispatcher;
mod ephemeris;
mod error;
mod measurement;
mod navigation;
mod observation;
mod output;
mod report;
mod time;

#[cfg(feature = "serde")]
#[cfg_attr(docrs, doc(cfg(feature = "serde")))]
mod driver;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::bias::{Bias, BiasRuntime, KbModel, SatelliteClockCorrection, TroposphereModel};
    pub use crate::carrier::Carrier;
    pub use crate::cfg::{Config, Modeling};
    pub use crate::constellation::{parse_satellite_id, satellite_id, ConstellationId};
    pub use crate::correction::{correct_measurements, elevation_azimuth};
    pub use crate::dispatcher::{
        get_corrected_measurements, process_ephemeris_report, process_measurement_report,
        Dispatcher,
    };
    pub use crate::ephemeris::{
        convert_ublox_ephemeris, convert_ublox_klobuchar, EphemerisModel, EphemerisStore,
        SatelliteState,
    };
    pub use crate::error::Error;
    pub use crate::measurement::{
        process_measurements, FinalObservables, Observables, ProcessedMeasurement,
    };
    pub use crate::navigation::{calc_pos_fix, sagnac_rotation, CoarseFix};
    pub use crate::observation::{extract_observations, ublox_constellation, RawObservation};
    pub use crate::output::{
        create_measurement_msg, create_output_message, OutputMessage, OutputRecord,
    };
    pub use crate::report::{
        EphemerisReport, MeasurementReport, RawMeasurement, ReceiverEvent, ReceiverReport,
        TrackingStatus,
    };
    pub use crate::time::{gpst_epoch, gpst_week_tow, resolve_week, ReferenceEpoch};

    #[cfg(feature = "serde")]
    pub use crate::driver::{Driver, JsonLinesPublisher, JsonLinesTransport, Publisher, Transport};

    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale, Unit};
    pub use nalgebra::Vector3;
}

// pub export
pub use error::Error;
