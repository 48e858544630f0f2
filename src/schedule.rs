//! Weekly schedule reconciliation: merge a single-day edit into the full
//! 7-day calendar and render the grouped read-only summary.

use crate::model::{Band, Calendar, DaySchedule, ThermostatState, Weekday};

/// Band granularity used when the unit has no calendar to copy a step from.
pub const DEFAULT_STEP_MINUTES: u32 = 30;

/// Canonical schedule source: the first zone carrying a non-empty calendar.
/// Schedules are logically shared across zones in this deployment model even
/// though the protocol stores a copy per zone.
pub fn canonical_calendar(state: &ThermostatState) -> Option<&Calendar> {
    state
        .zones
        .iter()
        .filter_map(|z| z.calendar.as_ref())
        .find(|c| !c.schedule.is_empty())
}

/// Merge one day's bands into the canonical calendar, producing all seven
/// days in MON..SUN order. Days the canonical source does not mention default
/// to empty. Merging the same bands twice yields an identical schedule.
pub fn merge_day(calendar: Option<&Calendar>, day: Weekday, bands: Vec<Band>) -> Vec<DaySchedule> {
    let mut days: Vec<DaySchedule> = Weekday::ALL
        .iter()
        .map(|d| DaySchedule {
            day: *d,
            bands: Vec::new(),
        })
        .collect();

    if let Some(calendar) = calendar {
        for entry in &calendar.schedule {
            if let Some(slot) = days.iter_mut().find(|s| s.day == entry.day) {
                slot.bands = entry.bands.clone();
            }
        }
    }

    if let Some(slot) = days.iter_mut().find(|s| s.day == day) {
        slot.bands = bands;
    }

    days
}

/// Compact signature for one day's bands: intervals sorted by start time,
/// formatted `HH:MM-HH:MM` and joined by commas. Days compare equal for
/// grouping purposes iff their signatures are byte-identical.
pub fn day_signature(bands: &[Band]) -> String {
    let mut sorted: Vec<&Band> = bands.iter().collect();
    sorted.sort_by_key(|b| (b.start.hour, b.start.min));
    sorted
        .iter()
        .map(|b| {
            format!(
                "{:02}:{:02}-{:02}:{:02}",
                b.start.hour, b.start.min, b.end.hour, b.end.min
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Human-readable weekly summary: contiguous weekdays with identical band
/// signatures collapse into a range ("MON-FRI 07:00-22:30"), groups are
/// separated by " | ", and days without bands are skipped.
pub fn weekly_summary(schedule: &[DaySchedule]) -> String {
    let mut groups: Vec<(Weekday, Weekday, String)> = Vec::new();
    let mut previous_grouped = false;

    for entry in schedule {
        if entry.bands.is_empty() {
            previous_grouped = false;
            continue;
        }
        let signature = day_signature(&entry.bands);
        match groups.last_mut() {
            Some((_, end, sig)) if previous_grouped && *sig == signature => *end = entry.day,
            _ => groups.push((entry.day, entry.day, signature)),
        }
        previous_grouped = true;
    }

    groups
        .iter()
        .map(|(start, end, sig)| {
            if start == end {
                format!("{start} {sig}")
            } else {
                format!("{start}-{end} {sig}")
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BandTime, SetpointType};

    fn band(id: u32, start: (u8, u8), end: (u8, u8)) -> Band {
        Band {
            id,
            setpoint_type: SetpointType::Present,
            start: BandTime {
                hour: start.0,
                min: start.1,
            },
            end: BandTime {
                hour: end.0,
                min: end.1,
            },
        }
    }

    fn calendar(entries: Vec<DaySchedule>) -> Calendar {
        Calendar {
            step: 30,
            schedule: entries,
        }
    }

    #[test]
    fn merge_preserves_untouched_days() {
        let cal = calendar(vec![DaySchedule {
            day: Weekday::Mon,
            bands: vec![band(1, (7, 0), (22, 0))],
        }]);

        let merged = merge_day(Some(&cal), Weekday::Tue, vec![band(1, (9, 0), (18, 0))]);

        assert_eq!(merged.len(), 7);
        assert_eq!(merged[0].day, Weekday::Mon);
        assert_eq!(merged[0].bands, vec![band(1, (7, 0), (22, 0))]);
        assert_eq!(merged[1].day, Weekday::Tue);
        assert_eq!(merged[1].bands, vec![band(1, (9, 0), (18, 0))]);
        for entry in &merged[2..] {
            assert!(entry.bands.is_empty());
        }
    }

    #[test]
    fn merge_without_calendar_defaults_to_empty_week() {
        let merged = merge_day(None, Weekday::Fri, vec![band(1, (6, 30), (8, 0))]);
        assert_eq!(merged.len(), 7);
        assert!(merged[0].bands.is_empty());
        assert_eq!(merged[4].day, Weekday::Fri);
        assert_eq!(merged[4].bands.len(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let cal = calendar(vec![DaySchedule {
            day: Weekday::Mon,
            bands: vec![band(1, (7, 0), (22, 0))],
        }]);
        let once = merge_day(Some(&cal), Weekday::Wed, vec![band(2, (10, 0), (12, 0))]);
        let again = merge_day(
            Some(&calendar(once.clone())),
            Weekday::Wed,
            vec![band(2, (10, 0), (12, 0))],
        );
        assert_eq!(once, again);
    }

    #[test]
    fn summary_separates_differing_days() {
        let schedule = merge_day(
            Some(&calendar(vec![DaySchedule {
                day: Weekday::Mon,
                bands: vec![band(1, (7, 0), (22, 0))],
            }])),
            Weekday::Tue,
            vec![band(1, (9, 0), (18, 0))],
        );
        assert_eq!(
            weekly_summary(&schedule),
            "MON 07:00-22:00 | TUE 09:00-18:00"
        );
    }

    #[test]
    fn summary_groups_contiguous_identical_days() {
        let weekday_bands = vec![band(1, (7, 0), (22, 30))];
        let schedule: Vec<DaySchedule> = Weekday::ALL
            .iter()
            .map(|d| DaySchedule {
                day: *d,
                bands: match d {
                    Weekday::Sat | Weekday::Sun => Vec::new(),
                    _ => weekday_bands.clone(),
                },
            })
            .collect();
        assert_eq!(weekly_summary(&schedule), "MON-FRI 07:00-22:30");
    }

    #[test]
    fn empty_day_breaks_grouping() {
        let bands = vec![band(1, (8, 0), (20, 0))];
        let schedule: Vec<DaySchedule> = Weekday::ALL
            .iter()
            .map(|d| DaySchedule {
                day: *d,
                bands: match d {
                    Weekday::Wed | Weekday::Sat | Weekday::Sun => Vec::new(),
                    _ => bands.clone(),
                },
            })
            .collect();
        assert_eq!(
            weekly_summary(&schedule),
            "MON-TUE 08:00-20:00 | THU-FRI 08:00-20:00"
        );
    }

    #[test]
    fn signature_sorts_bands_by_start_time() {
        let bands = vec![band(2, (17, 0), (22, 0)), band(1, (6, 30), (8, 0))];
        assert_eq!(day_signature(&bands), "06:30-08:00,17:00-22:00");
    }

    #[test]
    fn summary_of_empty_week_is_empty() {
        let schedule = merge_day(None, Weekday::Mon, Vec::new());
        assert_eq!(weekly_summary(&schedule), "");
    }
}
