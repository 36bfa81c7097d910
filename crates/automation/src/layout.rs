//! Tank layout synchronisation: keeps topology-dependent water fields in
//! step with the selected irrigation system type.
//!
//! Only the fields listed on [`TankLayout`] (plus a batch-volume cap) are
//! ever touched here. pH/EC targets, irrigation timing, diagnostics and the
//! rest of the operator's water settings survive a topology switch.

use tracing::debug;

use crate::forms::{SystemType, WaterFormState};

/// Topology preset for one irrigation system type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankLayout {
    pub tanks_count: u32,
    pub clean_tank_fill_l: f64,
    pub nutrient_tank_target_l: f64,
    pub drain_control: bool,
    pub drain_target_percent: f64,
    pub refill_duration_seconds: u32,
    pub refill_timeout_seconds: u32,
}

impl SystemType {
    pub fn layout(self) -> TankLayout {
        match self {
            Self::Drip => TankLayout {
                tanks_count: 2,
                clean_tank_fill_l: 300.0,
                nutrient_tank_target_l: 280.0,
                drain_control: false,
                drain_target_percent: 0.0,
                refill_duration_seconds: 120,
                refill_timeout_seconds: 900,
            },
            Self::SubstrateTrays => TankLayout {
                tanks_count: 2,
                clean_tank_fill_l: 300.0,
                nutrient_tank_target_l: 280.0,
                drain_control: true,
                drain_target_percent: 20.0,
                refill_duration_seconds: 120,
                refill_timeout_seconds: 900,
            },
            // Single recirculating reservoir topped up continuously; there is
            // no separate clean tank to fill.
            Self::Nft => TankLayout {
                tanks_count: 1,
                clean_tank_fill_l: 0.0,
                nutrient_tank_target_l: 200.0,
                drain_control: false,
                drain_target_percent: 0.0,
                refill_duration_seconds: 60,
                refill_timeout_seconds: 600,
            },
        }
    }
}

/// Switch `form` to `system_type` and re-derive its tank layout.
///
/// Re-selecting the current type is a no-op. Tank volumes are kept when the
/// old and new topologies have the same number of tanks and the form holds
/// usable volumes; otherwise the new preset volumes apply. The irrigation
/// batch is capped at the resulting nutrient tank target.
pub fn sync_system_to_tank_layout(form: &mut WaterFormState, system_type: SystemType) {
    if form.system_type == system_type {
        return;
    }

    let previous = form.system_type;
    let next = system_type.layout();
    let keep_volumes = previous.layout().tanks_count == next.tanks_count
        && form.clean_tank_fill_l > 0.0
        && form.nutrient_tank_target_l > 0.0;

    form.system_type = system_type;
    form.tanks_count = next.tanks_count;
    if !keep_volumes {
        form.clean_tank_fill_l = next.clean_tank_fill_l;
        form.nutrient_tank_target_l = next.nutrient_tank_target_l;
    }
    form.enable_drain_control = next.drain_control;
    form.drain_target_percent = next.drain_target_percent;
    form.refill_duration_seconds = next.refill_duration_seconds;
    form.refill_timeout_seconds = next.refill_timeout_seconds;

    if form.irrigation_batch_l > form.nutrient_tank_target_l {
        debug!(
            batch_l = form.irrigation_batch_l,
            tank_l = form.nutrient_tank_target_l,
            "capping irrigation batch at nutrient tank target"
        );
        form.irrigation_batch_l = form.nutrient_tank_target_l;
    }

    debug!(from = %previous, to = %system_type, keep_volumes, "tank layout synced");
}

// ===========================================================================
// Tests
// ===========================================================================
