mod client;
mod error;
mod model;
mod modes;
mod protocol;
mod schedule;

pub use client::{
    DEFAULT_POLLING_INTERVAL_MIN, DEFAULT_ZONE_ID, MIN_POLLING_INTERVAL_MIN, MonetaClient,
    MonetaClientBuilder,
};
pub use error::{Error, Result};
pub use model::*;
pub use modes::{
    Displayed, HvacAction, OperatingMode, Preset, auto_setpoint_route, clamp_setpoint,
    display_target, hvac_action, operating_mode, preset_for, valid_modes,
};
pub use schedule::{
    DEFAULT_STEP_MINUTES, canonical_calendar, day_signature, merge_day, weekly_summary,
};
