#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::{bias::TroposphereModel, prelude::Error};

fn default_correct() -> bool {
    false
}

fn default_min_coarse_fix_measurements() -> usize {
    6
}

fn default_max_iterations() -> usize {
    10
}

fn default_convergence_m() -> f64 {
    1.0E-4
}

fn default_weighted() -> bool {
    true
}

fn default_ephemeris_validity_s() -> f64 {
    7200.0
}

fn default_allow_incomplete_delay() -> bool {
    false
}

fn default_sv_clock() -> bool {
    true
}

fn default_tropo() -> bool {
    true
}

fn default_iono() -> bool {
    true
}

fn default_earth_rot() -> bool {
    true
}

/// Physical effects compensated by the measurement corrector.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Modeling {
    /// Compensate for onboard clock offset to system time (+/- 100km),
    /// relativistic and group delay terms included.
    #[cfg_attr(feature = "serde", serde(default = "default_sv_clock"))]
    pub sv_clock_bias: bool,
    /// Compensate for troposphere delay (+/- 10m)
    #[cfg_attr(feature = "serde", serde(default = "default_tropo"))]
    pub tropo_delay: bool,
    /// Compensate for ionosphere delay (+/- 10m),
    /// when a broadcast model is known.
    #[cfg_attr(feature = "serde", serde(default = "default_iono"))]
    pub iono_delay: bool,
    /// Compensate for Earth rotation during signal propagation
    /// (static +5/+10m eastern error).
    #[cfg_attr(feature = "serde", serde(default = "default_earth_rot"))]
    pub earth_rotation: bool,
}

impl Default for Modeling {
    fn default() -> Self {
        Self {
            sv_clock_bias: default_sv_clock(),
            tropo_delay: default_tropo(),
            iono_delay: default_iono(),
            earth_rotation: default_earth_rot(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Run the coarse fix + atmosphere/clock correction stage
    /// on every qualified measurement set.
    #[cfg_attr(feature = "serde", serde(default = "default_correct"))]
    pub correct: bool,
    /// Minimal number of qualified measurements to attempt a coarse fix.
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_min_coarse_fix_measurements")
    )]
    pub min_coarse_fix_measurements: usize,
    /// Maximal number of least squares iterations of the coarse fix.
    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,
    /// Coarse fix is declared converged once the position update
    /// falls below this norm [m].
    #[cfg_attr(feature = "serde", serde(default = "default_convergence_m"))]
    pub convergence_m: f64,
    /// Weight each coarse fix equation by the pseudo range variance.
    #[cfg_attr(feature = "serde", serde(default = "default_weighted"))]
    pub weighted: bool,
    /// Broadcast ephemeris is usable within +/- this many seconds of its ToE.
    #[cfg_attr(feature = "serde", serde(default = "default_ephemeris_validity_s"))]
    pub ephemeris_validity_s: f64,
    /// Correct a measurement even though part of the atmospheric
    /// delay could not be determined.
    #[cfg_attr(feature = "serde", serde(default = "default_allow_incomplete_delay"))]
    pub allow_incomplete_delay: bool,
    /// Troposphere model used by the corrector.
    #[cfg_attr(feature = "serde", serde(default))]
    pub troposphere: TroposphereModel,
    /// Minimal C/N0 [dB-Hz] for an observation to be extracted.
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_cno_dbhz: Option<f64>,
    /// [Modeling] toggles of the corrector.
    #[cfg_attr(feature = "serde", serde(default))]
    pub modeling: Modeling,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            correct: default_correct(),
            min_coarse_fix_measurements: default_min_coarse_fix_measurements(),
            max_iterations: default_max_iterations(),
            convergence_m: default_convergence_m(),
            weighted: default_weighted(),
            ephemeris_validity_s: default_ephemeris_validity_s(),
            allow_incomplete_delay: default_allow_incomplete_delay(),
            troposphere: TroposphereModel::default(),
            min_cno_dbhz: None,
            modeling: Modeling::default(),
        }
    }
}

impl Config {
    /// Returns default [Config] with the correction stage enabled.
    pub fn with_correction() -> Self {
        let mut s = Self::default();
        s.correct = true;
        s
    }

    /// Verifies [Config] consistency.
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_coarse_fix_measurements < 4 {
            return Err(Error::InvalidConfig(format!(
                "coarse fix requires at least 4 measurements, got {}",
                self.min_coarse_fix_measurements
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.convergence_m > 0.0) {
            return Err(Error::InvalidConfig(
                "convergence_m must be positive".to_string(),
            ));
        }
        if !(self.ephemeris_validity_s > 0.0) {
            return Err(Error::InvalidConfig(
                "ephemeris_validity_s must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads [Config] from a JSON file, missing fields take their default value.
    #[cfg(feature = "serde")]
    pub fn from_file(path: &std::path::Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
