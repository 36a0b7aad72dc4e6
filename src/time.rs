//! GPS time helpers and the reference epoch latch
use log::debug;

use crate::{
    constants::WEEK_ROLLOVER,
    prelude::{Epoch, TimeScale},
};

/// Builds a GPST [Epoch] from a (week, seconds of week) pair.
/// Negative or non finite seconds are clamped to the start of week.
pub fn gpst_epoch(week: u32, tow_s: f64) -> Epoch {
    let nanos = match tow_s.is_finite() && tow_s > 0.0 {
        true => (tow_s * 1.0E9).round() as u64,
        false => 0,
    };
    Epoch::from_time_of_week(week, nanos, TimeScale::GPST)
}

/// Returns (week, seconds of week) of this [Epoch], in GPST.
pub fn gpst_week_tow(t: Epoch) -> (u32, f64) {
    let (week, nanos) = t.to_time_scale(TimeScale::GPST).to_time_of_week();
    (week, nanos as f64 * 1.0E-9)
}

/// Resolves a truncated (10 bit) broadcast week number, using `anchor_week`
/// (a full week number in the recent past) to pick the roll-over period.
pub fn resolve_week(broadcast_week: u16, anchor_week: u32) -> u32 {
    let truncated = broadcast_week as i64 % WEEK_ROLLOVER as i64;
    let anchor = anchor_week as i64;
    let rollover = WEEK_ROLLOVER as i64;

    let mut week = (anchor / rollover) * rollover + truncated;
    if week > anchor + rollover / 2 {
        week -= rollover;
    } else if week < anchor - rollover / 2 {
        week += rollover;
    }
    week.max(truncated) as u32
}

/// Time of the first measurement report ever observed in this run.
/// It is a set-once latch: the first [ReferenceEpoch::set_if_absent] fixes it for good.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferenceEpoch {
    epoch: Option<Epoch>,
}

impl ReferenceEpoch {
    /// Returns reference [Epoch], if already established.
    pub fn get(&self) -> Option<Epoch> {
        self.epoch
    }

    /// Latches `t` if no reference exists yet. Returns true when `t` became the reference.
    pub fn set_if_absent(&mut self, t: Epoch) -> bool {
        if self.epoch.is_some() {
            return false;
        }
        debug!("{} - reference epoch established", t);
        self.epoch = Some(t);
        true
    }

    /// Returns the full GPS week number of the reference, if established.
    pub fn week(&self) -> Option<u32> {
        self.epoch.map(|t| gpst_week_tow(t).0)
    }
}
