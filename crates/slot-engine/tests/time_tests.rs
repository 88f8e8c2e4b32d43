//! Tests for time utilities: zone conversion, parsing and the slot grid.

mod support;

use chrono_tz::Tz;
use slot_engine::dst::DstPolicy;
use slot_engine::time::{
    day_of_week, format_time_of_day, generate_slot_grid, parse_date, parse_timezone,
    time_of_day_minutes, zoned_slot_grid, SlotGrid,
};
use slot_engine::{parse_time_of_day, DayOfWeek, SlotError};
use support::*;

#[test]
fn time_of_day_in_utc() {
    assert_eq!(time_of_day_minutes(utc(2026, 3, 16, 0, 0), Tz::UTC), 0);
    assert_eq!(time_of_day_minutes(utc(2026, 3, 16, 9, 30), Tz::UTC), 570);
    assert_eq!(time_of_day_minutes(utc(2026, 3, 16, 23, 59), Tz::UTC), 1439);
}

#[test]
fn time_of_day_and_weekday_follow_the_zone() {
    // 03:00 UTC Monday is 20:00 Sunday in Los Angeles (PDT, UTC-7).
    let instant = utc(2026, 3, 16, 3, 0);
    let la = chrono_tz::America::Los_Angeles;
    assert_eq!(time_of_day_minutes(instant, la), 20 * 60);
    assert_eq!(day_of_week(instant, la), DayOfWeek::Sunday);
    assert_eq!(day_of_week(instant, Tz::UTC), DayOfWeek::Monday);
}

#[test]
fn half_hour_offset_zone() {
    // India is UTC+05:30.
    let instant = utc(2026, 3, 16, 4, 0);
    assert_eq!(format_time_of_day(instant, chrono_tz::Asia::Kolkata), "09:30");
}

#[test]
fn day_names_serialize_lowercase() {
    let json = serde_json::to_string(&DayOfWeek::Wednesday).unwrap();
    assert_eq!(json, "\"wednesday\"");
    let parsed: DayOfWeek = serde_json::from_str("\"saturday\"").unwrap();
    assert_eq!(parsed, DayOfWeek::Saturday);
    assert!(serde_json::from_str::<DayOfWeek>("\"overnight\"").is_err());
    assert_eq!("Friday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Friday);
}

#[test]
fn time_of_day_round_trips_through_json() {
    let t = parse_time_of_day("7:05").unwrap();
    assert_eq!(serde_json::to_string(&t).unwrap(), "\"07:05\"");
    assert!(serde_json::from_str::<slot_engine::TimeOfDay>("\"7:5\"").is_err());
}

#[test]
fn parse_date_requires_iso_format() {
    assert_eq!(parse_date("2026-03-16").unwrap(), monday());
    for bad in ["2026-3-16", "16/03/2026", "2026-02-30", ""] {
        assert!(
            matches!(parse_date(bad), Err(SlotError::InvalidFormat(_))),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn unknown_timezone_is_rejected() {
    assert!(parse_timezone("Europe/Berlin").is_ok());
    assert_eq!(
        parse_timezone("Mars/Olympus_Mons"),
        Err(SlotError::InvalidTimezone("Mars/Olympus_Mons".to_string()))
    );
}

#[test]
fn custom_grid_bounds_are_inclusive() {
    let grid = SlotGrid {
        interval_minutes: 30,
        from_hour: 9,
        to_hour: 10,
    };
    let slots: Vec<String> = generate_slot_grid(monday(), &grid)
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect();
    assert_eq!(slots, vec!["09:00", "09:30", "10:00"]);
}

#[test]
fn zoned_grid_converts_wall_clock_to_utc() {
    let grid = zoned_slot_grid(
        monday(),
        chrono_tz::Europe::Berlin,
        &SlotGrid::default(),
        DstPolicy::Skip,
    );
    // Berlin is UTC+1 on 2026-03-16.
    assert_eq!(grid[0], utc(2026, 3, 16, 5, 0));
    assert_eq!(grid.len(), 69);
}

#[test]
fn spring_forward_gap_is_outside_default_grid() {
    // New York jumps 02:00 -> 03:00 on 2026-03-08; the 06:00-23:00 grid is unaffected.
    let grid = zoned_slot_grid(
        date(2026, 3, 8),
        chrono_tz::America::New_York,
        &SlotGrid::default(),
        DstPolicy::Skip,
    );
    assert_eq!(grid.len(), 69);
}

#[test]
fn gap_candidates_follow_policy() {
    let night = SlotGrid {
        interval_minutes: 30,
        from_hour: 1,
        to_hour: 3,
    };
    let ny = chrono_tz::America::New_York;

    // 01:00, 01:30, [02:00, 02:30 missing], 03:00
    let skipped = zoned_slot_grid(date(2026, 3, 8), ny, &night, DstPolicy::Skip);
    assert_eq!(skipped.len(), 3);

    // Shifted candidates collapse onto 03:00 EDT.
    let shifted = zoned_slot_grid(date(2026, 3, 8), ny, &night, DstPolicy::ShiftForward);
    assert_eq!(shifted.len(), 5);
    assert_eq!(shifted[2], utc(2026, 3, 8, 7, 0));
    assert_eq!(shifted[3], utc(2026, 3, 8, 7, 0));
    assert_eq!(shifted[4], utc(2026, 3, 8, 7, 0));
}
