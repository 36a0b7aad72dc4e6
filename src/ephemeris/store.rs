use std::collections::HashMap;

use log::debug;

use crate::{
    bias::KbModel,
    ephemeris::EphemerisModel,
    prelude::{Epoch, SV},
};

/// Maximal number of models retained per satellite.
const MAX_MODELS_PER_SV: usize = 16;

/// [EphemerisModel]s indexed by satellite, each list ordered by ToE.
/// Models are never removed by the pipeline, the oldest are only dropped
/// once a satellite holds too many of them.
#[derive(Debug, Clone, Default)]
pub struct EphemerisStore {
    models: HashMap<SV, Vec<EphemerisModel>>,
    klobuchar: Option<KbModel>,
}

impl EphemerisStore {
    /// Inserts a new [EphemerisModel]. A model sharing the ToE of an existing one
    /// (re-broadcast) replaces it, any other model augments the list.
    pub fn insert(&mut self, sv: SV, model: EphemerisModel) {
        let models = self.models.entry(sv).or_default();

        match models.binary_search_by(|m| m.toe.cmp(&model.toe)) {
            Ok(index) => {
                debug!("{}({}) - ephemeris update (iode={})", model.toe, sv, model.iode);
                models[index] = model;
            },
            Err(index) => {
                debug!("{}({}) - new ephemeris (iode={})", model.toe, sv, model.iode);
                models.insert(index, model);
                if models.len() > MAX_MODELS_PER_SV {
                    models.remove(0);
                }
            },
        }
    }

    /// Selects the best [EphemerisModel] for `sv` at `t`: the healthy model
    /// with closest ToE, within validity window.
    pub fn select(&self, sv: SV, t: Epoch, validity_s: f64) -> Option<&EphemerisModel> {
        self.models
            .get(&sv)?
            .iter()
            .filter(|m| m.is_valid(t, validity_s))
            .min_by(|a, b| {
                let dt_a = (t - a.toe).abs();
                let dt_b = (t - b.toe).abs();
                dt_a.cmp(&dt_b)
            })
    }

    /// Latches broadcast ionosphere model.
    pub fn set_klobuchar(&mut self, model: KbModel) {
        self.klobuchar = Some(model);
    }

    /// Latest broadcast ionosphere model, if any.
    pub fn klobuchar(&self) -> Option<&KbModel> {
        self.klobuchar.as_ref()
    }

    /// Total number of stored models.
    pub fn len(&self) -> usize {
        self.models.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of satellites we hold at least one model for.
    pub fn num_satellites(&self) -> usize {
        self.models.len()
    }

    /// Returns all models stored for this satellite, ordered by ToE.
    pub fn models(&self, sv: SV) -> &[EphemerisModel] {
        self.models.get(&sv).map(|m| m.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod test {
    use super::{EphemerisStore, MAX_MODELS_PER_SV};
    use crate::{
        bias::KbModel,
        ephemeris::EphemerisModel,
        prelude::{Constellation, Unit, SV},
        time::gpst_epoch,
    };

    fn model(sv: SV, toe_s: f64, iode: u16) -> EphemerisModel {
        let toe = gpst_epoch(2190, toe_s);
        EphemerisModel {
            sv,
            toe,
            toc: toe,
            iode,
            semi_major_axis_m: 26_560_000.0,
            fit_interval_h: 4.0,
            healthy: true,
            ..Default::default()
        }
    }

    #[test]
    fn insertion_policy() {
        let g01 = SV::new(Constellation::GPS, 1);
        let mut store = EphemerisStore::default();
        assert!(store.is_empty());

        store.insert(g01, model(g01, 7200.0, 1));
        store.insert(g01, model(g01, 0.0, 2));
        assert_eq!(store.len(), 2);

        // re-broadcast replaces
        store.insert(g01, model(g01, 7200.0, 3));
        assert_eq!(store.len(), 2);

        let models = store.models(g01);
        assert_eq!(models[0].iode, 2);
        assert_eq!(models[1].iode, 3);
        assert_eq!(store.num_satellites(), 1);
    }

    #[test]
    fn capacity() {
        let g02 = SV::new(Constellation::GPS, 2);
        let mut store = EphemerisStore::default();
        for i in 0..MAX_MODELS_PER_SV + 4 {
            store.insert(g02, model(g02, i as f64 * 7200.0, i as u16));
        }
        assert_eq!(store.len(), MAX_MODELS_PER_SV);
        assert_eq!(store.models(g02)[0].iode, 4);
    }

    #[test]
    fn selection() {
        let g01 = SV::new(Constellation::GPS, 1);
        let g03 = SV::new(Constellation::GPS, 3);

        let mut store = EphemerisStore::default();
        store.insert(g01, model(g01, 0.0, 1));
        store.insert(g01, model(g01, 7200.0, 2));

        let mut unhealthy = model(g01, 14400.0, 3);
        unhealthy.healthy = false;
        store.insert(g01, unhealthy);

        let t = gpst_epoch(2190, 5000.0);
        assert_eq!(store.select(g01, t, 7200.0).map(|m| m.iode), Some(2));

        let t = gpst_epoch(2190, 3000.0);
        assert_eq!(store.select(g01, t, 7200.0).map(|m| m.iode), Some(1));

        // unhealthy model never selected
        let t = gpst_epoch(2190, 14400.0);
        assert_eq!(store.select(g01, t, 7200.0).map(|m| m.iode), Some(2));

        let t = gpst_epoch(2190, 7200.0) + 3.0 * Unit::Hour;
        assert!(store.select(g01, t, 7200.0).is_none());
        assert!(store.select(g03, t, 7200.0).is_none());
    }

    #[test]
    fn ionosphere() {
        let mut store = EphemerisStore::default();
        assert!(store.klobuchar().is_none());
        let kb = KbModel::from_coefficients(&[1.0E-8, 0.0, 0.0, 0.0], &[90000.0, 0.0, 0.0, 0.0])
            .unwrap();
        store.set_klobuchar(kb);
        assert_eq!(store.klobuchar(), Some(&kb));
    }
}
