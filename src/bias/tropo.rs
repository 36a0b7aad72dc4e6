use crate::{
    bias::{Bias, BiasRuntime},
    prelude::Error,
};

#[cfg(feature = "serde")]
use serde::Deserialize;

#[derive(Default, Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TroposphereModel {
    #[default]
    Niel,
}

impl std::str::FromStr for TroposphereModel {
    type Err = Error;
    fn from_str(s: &str) -> Result<TroposphereModel, Error> {
        let c = s.trim().to_lowercase();
        match c.as_str() {
            "niel" => Ok(TroposphereModel::Niel),
            _ => Err(Error::UnknownTropoModel(c.to_string())),
        }
    }
}

impl std::fmt::Display for TroposphereModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Niel => write!(f, "niel"),
        }
    }
}

impl Bias for TroposphereModel {
    fn bias_m(&self, rtm: &BiasRuntime) -> f64 {
        match self {
            Self::Niel => niel_model(rtm),
        }
    }
}

fn niel_model(rtm: &BiasRuntime) -> f64 {
    const NS: f64 = 324.8;

    let (elevation_deg, _) = rtm.sv_elevation_azimuth_deg_deg;
    let (_, _, h) = rtm.rx_lat_long_alt_deg_deg_m;

    let elev = elevation_deg.to_radians();
    let h_km = (h / 1000.0).max(0.0);

    let f = match elevation_deg < 90.0 {
        true => 1.0_f64 / (elev.sin() + 0.00143 / (elev.tan() + 0.0455)),
        false => 1.0,
    };

    let delta_n = -7.32 * (0.005577 * NS).exp();

    let delta_r =
        (NS + 0.5 * delta_n - NS * h_km - 0.5 * delta_n * h_km.powi(2) + 1430.0 + 732.0) * 0.001;

    f * delta_r.max(0.0)
}

#[cfg(test)]
mod test {
    use super::TroposphereModel;
    use crate::bias::{Bias, BiasRuntime};
    use crate::prelude::Epoch;
    use rstest::*;
    use std::str::FromStr;

    fn runtime(elevation_deg: f64, alt_m: f64) -> BiasRuntime {
        BiasRuntime {
            t: Epoch::default(),
            sv_elevation_azimuth_deg_deg: (elevation_deg, 0.0),
            rx_lat_long_alt_deg_deg_m: (45.0, 5.0, alt_m),
            frequency_hz: 1575.42E6,
        }
    }

    #[test]
    fn model_parsing() {
        assert_eq!(
            TroposphereModel::from_str(" Niel ").unwrap(),
            TroposphereModel::Niel
        );
        assert!(TroposphereModel::from_str("unb4").is_err());
    }

    #[rstest]
    #[case(90.0, 0.0, 2.0, 3.0)]
    #[case(30.0, 0.0, 4.0, 6.0)]
    #[case(10.0, 0.0, 11.0, 17.0)]
    #[case(90.0, 1500.0, 1.5, 2.5)]
    fn niel_delay(
        #[case] elevation_deg: f64,
        #[case] alt_m: f64,
        #[case] min_m: f64,
        #[case] max_m: f64,
    ) {
        let delay = TroposphereModel::Niel.bias_m(&runtime(elevation_deg, alt_m));
        assert!(
            delay > min_m && delay < max_m,
            "tropo delay {} not within [{}, {}] (elev={})",
            delay,
            min_m,
            max_m,
            elevation_deg
        );
    }

    #[test]
    fn niel_increases_towards_horizon() {
        let mut last = 0.0;
        for elev in [90.0, 60.0, 45.0, 30.0, 15.0, 5.0] {
            let delay = TroposphereModel::Niel.bias_m(&runtime(elev, 100.0));
            assert!(delay > last, "delay should increase at low elevation");
            last = delay;
        }
    }
}
