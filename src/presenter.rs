use crate::models::FoodEntry;
use chrono::{DateTime, Local, NaiveDate, TimeZone};

pub const TODAY_STRIP_MAX: usize = 3;

pub const TODAY_LABEL: &str = "Today";
pub const YESTERDAY_LABEL: &str = "Yesterday";
pub const UNKNOWN_DATE_LABEL: &str = "Unknown date";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup<'a> {
    pub label: String,
    pub entries: Vec<&'a FoodEntry>,
}

pub fn today_slice(log: &[FoodEntry], max: usize) -> Vec<&FoodEntry> {
    today_slice_at(&Local::now(), log, max)
}

pub fn today_slice_at<'a, Tz: TimeZone>(
    now: &DateTime<Tz>,
    log: &'a [FoodEntry],
    max: usize,
) -> Vec<&'a FoodEntry> {
    let today = now.date_naive();
    let zone = now.timezone();
    log.iter()
        .filter(|entry| local_date(entry.timestamp, &zone) == Some(today))
        .take(max)
        .collect()
}

pub fn group_by_display_date(log: &[FoodEntry]) -> Vec<DateGroup<'_>> {
    group_by_display_date_at(&Local::now(), log)
}

/// Buckets appear in the order their label is first seen while scanning `log`.
pub fn group_by_display_date_at<'a, Tz: TimeZone>(
    now: &DateTime<Tz>,
    log: &'a [FoodEntry],
) -> Vec<DateGroup<'a>> {
    let today = now.date_naive();
    let zone = now.timezone();
    let mut groups: Vec<DateGroup<'a>> = Vec::new();

    for entry in log {
        let label = display_label(today, local_date(entry.timestamp, &zone));
        match groups.iter_mut().find(|group| group.label == label) {
            Some(group) => group.entries.push(entry),
            None => groups.push(DateGroup {
                label,
                entries: vec![entry],
            }),
        }
    }

    groups
}

pub fn format_clock_time(timestamp: i64) -> String {
    format_clock_time_in(timestamp, &Local)
}

/// `9:05 AM` style, no seconds.
pub fn format_clock_time_in<Tz: TimeZone>(timestamp: i64, zone: &Tz) -> String {
    match zone.timestamp_millis_opt(timestamp).single() {
        Some(at) => at.naive_local().format("%-I:%M %p").to_string(),
        None => "--:--".to_string(),
    }
}

fn local_date<Tz: TimeZone>(timestamp: i64, zone: &Tz) -> Option<NaiveDate> {
    zone.timestamp_millis_opt(timestamp)
        .single()
        .map(|at| at.date_naive())
}

fn display_label(today: NaiveDate, date: Option<NaiveDate>) -> String {
    let Some(date) = date else {
        return UNKNOWN_DATE_LABEL.to_string();
    };
    if date == today {
        TODAY_LABEL.to_string()
    } else if today.pred_opt() == Some(date) {
        YESTERDAY_LABEL.to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}
