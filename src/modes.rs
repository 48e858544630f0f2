//! Pure translation between the vendor's zone/mode/season model and the
//! simplified operating-mode vocabulary shown to the platform. No side
//! effects, no network access.

use crate::model::{Category, Limits, SeasonName, SetpointType, Zone, ZoneMode};

/// Platform-facing operating mode for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    Off,
    Heat,
    Cool,
    Auto,
}

/// Sub-state shown as a preset label while the operating mode reads AUTO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    FollowSchedule,
    Boost,
    Away,
}

impl Preset {
    pub fn label(&self) -> &'static str {
        match self {
            Preset::FollowSchedule => "follow schedule",
            Preset::Boost => "boost",
            Preset::Away => "away",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacAction {
    Idle,
    Heating,
    Cooling,
}

/// Map a zone's vendor mode to the platform operating mode. Manual mode
/// heats in winter and cools in summer; party and holiday are folded into
/// AUTO and distinguished by [`preset_for`].
pub fn operating_mode(zone: &Zone, season: SeasonName) -> OperatingMode {
    match zone.mode {
        ZoneMode::Off => OperatingMode::Off,
        ZoneMode::Manual => match season {
            SeasonName::Winter => OperatingMode::Heat,
            SeasonName::Summer => OperatingMode::Cool,
        },
        ZoneMode::Auto | ZoneMode::Party | ZoneMode::Holiday => OperatingMode::Auto,
    }
}

/// Preset label for a zone. An active holiday flag wins over the mode-derived
/// preset: the physical device reports vacation as mode=off with
/// holidayActive=true.
pub fn preset_for(zone: &Zone) -> Option<Preset> {
    if zone.holiday_active {
        return Some(Preset::Away);
    }
    match zone.mode {
        ZoneMode::Auto => Some(Preset::FollowSchedule),
        ZoneMode::Party => Some(Preset::Boost),
        ZoneMode::Holiday => Some(Preset::Away),
        ZoneMode::Off | ZoneMode::Manual => None,
    }
}

/// Operating modes the unit accepts in its current category.
pub fn valid_modes(category: Category) -> &'static [OperatingMode] {
    match category {
        Category::Heating => &[OperatingMode::Off, OperatingMode::Heat, OperatingMode::Auto],
        Category::Cooling => &[OperatingMode::Off, OperatingMode::Cool, OperatingMode::Auto],
        Category::Off => &[OperatingMode::Off],
    }
}

pub fn hvac_action(zone: &Zone, category: Category) -> HvacAction {
    if zone.mode == ZoneMode::Off || !zone.at_home {
        return HvacAction::Idle;
    }
    match category {
        Category::Heating => HvacAction::Heating,
        Category::Cooling => HvacAction::Cooling,
        Category::Off => HvacAction::Idle,
    }
}

/// Target temperature to display. In AUTO (and OFF) this is the backend's
/// read-only effective setpoint; in HEAT/COOL it is the zone's manual
/// setpoint bounded by the present-temperature range, falling back to the
/// minimum bound when the stored value is out of range.
pub fn display_target(zone: &Zone, season: SeasonName, limits: &Limits) -> f64 {
    match operating_mode(zone, season) {
        OperatingMode::Heat | OperatingMode::Cool => {
            let manual = zone.current_manual_temperature;
            if manual < limits.present_min_temp || manual > limits.present_max_temp {
                limits.present_min_temp
            } else {
                manual
            }
        }
        OperatingMode::Off | OperatingMode::Auto => zone.effective_setpoint,
    }
}

/// Which setpoint a user temperature edit targets while the zone is in AUTO:
/// the present (comfort) setpoint when someone is home, the absent (setback)
/// setpoint otherwise.
pub fn auto_setpoint_route(zone: &Zone) -> SetpointType {
    if zone.at_home {
        SetpointType::Present
    } else {
        SetpointType::Absent
    }
}

/// Clamp a requested temperature to the bounds of the setpoint type it is
/// routed to. Effective setpoints are backend-computed and never routed, so
/// they pass through unchanged.
pub fn clamp_setpoint(limits: &Limits, kind: SetpointType, temperature: f64) -> f64 {
    match kind {
        SetpointType::Present => {
            temperature.clamp(limits.present_min_temp, limits.present_max_temp)
        }
        SetpointType::Absent => temperature.clamp(limits.absent_min_temp, limits.absent_max_temp),
        SetpointType::Effective => temperature,
    }
}

/// Two-tier displayed value: the last confirmed snapshot value, optionally
/// shadowed by an optimistic override from a locally-issued command. A new
/// confirmed value always clears the override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Displayed<T> {
    Confirmed(T),
    Override(T),
}

impl<T> Displayed<T> {
    pub fn value(&self) -> &T {
        match self {
            Displayed::Confirmed(v) | Displayed::Override(v) => v,
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, Displayed::Override(_))
    }

    /// Shadow the displayed value until the next confirmed state arrives.
    pub fn set_override(&mut self, value: T) {
        *self = Displayed::Override(value);
    }

    /// Record a freshly fetched value, unconditionally dropping any override.
    pub fn confirm(&mut self, value: T) {
        *self = Displayed::Confirmed(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(mode: ZoneMode) -> Zone {
        Zone {
            id: "1".to_string(),
            mode,
            ..Zone::default()
        }
    }

    #[test]
    fn manual_maps_by_season() {
        let z = zone(ZoneMode::Manual);
        assert_eq!(operating_mode(&z, SeasonName::Winter), OperatingMode::Heat);
        assert_eq!(operating_mode(&z, SeasonName::Summer), OperatingMode::Cool);
    }

    #[test]
    fn off_maps_regardless_of_season() {
        let z = zone(ZoneMode::Off);
        assert_eq!(operating_mode(&z, SeasonName::Winter), OperatingMode::Off);
        assert_eq!(operating_mode(&z, SeasonName::Summer), OperatingMode::Off);
    }

    #[test]
    fn auto_party_holiday_fold_into_auto() {
        for mode in [ZoneMode::Auto, ZoneMode::Party, ZoneMode::Holiday] {
            assert_eq!(operating_mode(&zone(mode), SeasonName::Winter), OperatingMode::Auto);
        }
    }

    #[test]
    fn preset_derivation() {
        assert_eq!(preset_for(&zone(ZoneMode::Auto)), Some(Preset::FollowSchedule));
        assert_eq!(preset_for(&zone(ZoneMode::Party)), Some(Preset::Boost));
        assert_eq!(preset_for(&zone(ZoneMode::Holiday)), Some(Preset::Away));
        assert_eq!(preset_for(&zone(ZoneMode::Off)), None);
        assert_eq!(preset_for(&zone(ZoneMode::Manual)), None);
    }

    #[test]
    fn holiday_flag_beats_mode_preset() {
        let mut z = zone(ZoneMode::Off);
        z.holiday_active = true;
        assert_eq!(preset_for(&z), Some(Preset::Away));
    }

    #[test]
    fn valid_modes_by_category() {
        assert_eq!(
            valid_modes(Category::Heating),
            &[OperatingMode::Off, OperatingMode::Heat, OperatingMode::Auto]
        );
        assert_eq!(
            valid_modes(Category::Cooling),
            &[OperatingMode::Off, OperatingMode::Cool, OperatingMode::Auto]
        );
        assert_eq!(valid_modes(Category::Off), &[OperatingMode::Off]);
    }

    #[test]
    fn display_target_in_auto_is_effective_setpoint() {
        let mut z = zone(ZoneMode::Auto);
        z.effective_setpoint = 21.5;
        z.current_manual_temperature = 25.0;
        assert_eq!(display_target(&z, SeasonName::Winter, &Limits::default()), 21.5);
    }

    #[test]
    fn display_target_in_manual_clamps_to_min_bound() {
        let limits = Limits {
            present_min_temp: 16.0,
            present_max_temp: 24.0,
            ..Limits::default()
        };
        let mut z = zone(ZoneMode::Manual);
        z.current_manual_temperature = 21.0;
        assert_eq!(display_target(&z, SeasonName::Winter, &limits), 21.0);
        z.current_manual_temperature = 30.0;
        assert_eq!(display_target(&z, SeasonName::Winter, &limits), 16.0);
    }

    #[test]
    fn auto_edits_route_by_presence() {
        let mut z = zone(ZoneMode::Auto);
        z.at_home = true;
        assert_eq!(auto_setpoint_route(&z), SetpointType::Present);
        z.at_home = false;
        assert_eq!(auto_setpoint_route(&z), SetpointType::Absent);
    }

    #[test]
    fn setpoint_clamping_uses_per_type_bounds() {
        let limits = Limits {
            present_min_temp: 16.0,
            present_max_temp: 24.0,
            absent_min_temp: 7.0,
            absent_max_temp: 20.0,
            ..Limits::default()
        };
        assert_eq!(clamp_setpoint(&limits, SetpointType::Present, 30.0), 24.0);
        assert_eq!(clamp_setpoint(&limits, SetpointType::Present, 10.0), 16.0);
        assert_eq!(clamp_setpoint(&limits, SetpointType::Absent, 5.0), 7.0);
        assert_eq!(clamp_setpoint(&limits, SetpointType::Absent, 18.0), 18.0);
    }

    #[test]
    fn hvac_action_requires_presence_and_category() {
        let mut z = zone(ZoneMode::Auto);
        z.at_home = true;
        assert_eq!(hvac_action(&z, Category::Heating), HvacAction::Heating);
        assert_eq!(hvac_action(&z, Category::Cooling), HvacAction::Cooling);
        assert_eq!(hvac_action(&z, Category::Off), HvacAction::Idle);
        z.at_home = false;
        assert_eq!(hvac_action(&z, Category::Heating), HvacAction::Idle);
        assert_eq!(hvac_action(&zone(ZoneMode::Off), Category::Heating), HvacAction::Idle);
    }

    #[test]
    fn confirm_clears_optimistic_override() {
        let mut target = Displayed::Confirmed(21.0);
        target.set_override(23.5);
        assert!(target.is_override());
        assert_eq!(*target.value(), 23.5);

        target.confirm(22.0);
        assert!(!target.is_override());
        assert_eq!(*target.value(), 22.0);
    }
}
