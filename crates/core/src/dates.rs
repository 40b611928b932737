use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::normalize::tokenize;

/// Words that announce a departure date, matched against the folded word
/// right before a date expression.
const DATE_MARKERS: &[&str] = &["ngay", "on", "vao", "date", "departing", "depart", "hanh", "luc"];

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("valid iso date regex"));

static DAY_FIRST_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b").expect("valid day-first regex")
});

static YEAR_FIRST_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{4})[/.](\d{1,2})[/.](\d{1,2})\b").expect("valid year-first regex")
});

static DAY_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})\b").expect("valid day/month regex"));

static VI_SPELLED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\s+thang\s+(\d{1,2})(?:[\s,]+(?:nam\s+)?(\d{4}))?\b")
        .expect("valid vietnamese date regex")
});

static EN_DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?(?:,?\s+(\d{4}))?\b",
    )
    .expect("valid english day-month regex")
});

static EN_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?\b",
    )
    .expect("valid english month-day regex")
});

static RELATIVE_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(hom nay|today|ngay mai|tomorrow|ngay kia|ngay mot|day after tomorrow|tuan sau|tuan toi|next week)\b",
    )
    .expect("valid relative day regex")
});

static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(next\s+)?(thu hai|thu ba|thu tu|thu nam|thu sau|thu bay|chu nhat|thu [2-7]|monday|tuesday|wednesday|thursday|friday|saturday|sunday)(\s+(?:tuan sau|tuan toi|next week))?\b",
    )
    .expect("valid weekday regex")
});

type Converter = fn(&Captures<'_>, NaiveDate) -> Option<NaiveDate>;

static PATTERNS: Lazy<Vec<(&'static Lazy<Regex>, Converter)>> = Lazy::new(|| {
    vec![
        (&ISO_DATE, iso_date as Converter),
        (&DAY_FIRST_DATE, day_first_date as Converter),
        (&YEAR_FIRST_DATE, iso_date as Converter),
        (&DAY_MONTH, day_month as Converter),
        (&VI_SPELLED_DATE, vi_spelled_date as Converter),
        (&EN_DAY_MONTH, en_day_month as Converter),
        (&EN_MONTH_DAY, en_month_day as Converter),
        (&RELATIVE_DAY, relative_day as Converter),
        (&WEEKDAY, weekday as Converter),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub start: usize,
    pub end: usize,
}

/// All non-overlapping date expressions in folded text, in reading order.
/// Expressions naming an impossible calendar day are dropped.
pub fn find_dates(folded: &str, today: NaiveDate) -> Vec<DateMatch> {
    let mut candidates = Vec::new();

    for (pattern, convert) in PATTERNS.iter() {
        for caps in pattern.captures_iter(folded) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            // `12/01` out of `2025/12/01` or `13/12` out of `2025/13/12`
            if inside_slashed_number(folded, whole.start(), whole.end()) {
                continue;
            }
            if let Some(date) = convert(&caps, today) {
                candidates.push(DateMatch {
                    date,
                    start: whole.start(),
                    end: whole.end(),
                });
            }
        }
    }

    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut accepted: Vec<DateMatch> = Vec::new();
    for candidate in candidates {
        if accepted
            .last()
            .is_some_and(|last| candidate.start < last.end)
        {
            continue;
        }
        accepted.push(candidate);
    }
    accepted
}

fn inside_slashed_number(text: &str, start: usize, end: usize) -> bool {
    fn slash_then_digit(mut side: impl Iterator<Item = char>) -> bool {
        side.next() == Some('/') && side.next().is_some_and(|ch| ch.is_ascii_digit())
    }

    slash_then_digit(text[..start].chars().rev()) || slash_then_digit(text[end..].chars())
}

/// Picks the departure date: the first expression right after a date marker
/// word, otherwise the first one in reading order.
pub fn extract_date(folded: &str, today: NaiveDate) -> Option<NaiveDate> {
    let matches = find_dates(folded, today);
    if matches.is_empty() {
        return None;
    }

    let tokens = tokenize(folded);
    let marked = matches.iter().find(|found| {
        tokens
            .iter()
            .rev()
            .find(|token| token.end <= found.start)
            .is_some_and(|previous| DATE_MARKERS.contains(&previous.text))
    });

    marked.or_else(|| matches.first()).map(|found| found.date)
}

/// Strict parse for command arguments: ISO or day-first with a full year.
pub fn parse_explicit_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    for (pattern, convert) in [
        (&ISO_DATE, iso_date as Converter),
        (&DAY_FIRST_DATE, day_first_date as Converter),
    ] {
        if let Some(caps) = pattern.captures(value) {
            let whole = caps.get(0)?;
            if whole.start() == 0 && whole.end() == value.len() {
                // Reference day is unused by full-year formats.
                return convert(&caps, NaiveDate::MIN);
            }
        }
    }
    None
}

fn number(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

fn iso_date(caps: &Captures<'_>, _today: NaiveDate) -> Option<NaiveDate> {
    let year = caps.get(1)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, number(caps, 2)?, number(caps, 3)?)
}

fn day_first_date(caps: &Captures<'_>, _today: NaiveDate) -> Option<NaiveDate> {
    let year = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, number(caps, 2)?, number(caps, 1)?)
}

fn day_month(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    upcoming(today, number(caps, 2)?, number(caps, 1)?)
}

fn vi_spelled_date(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let day = number(caps, 1)?;
    let month = number(caps, 2)?;
    match caps.get(3) {
        Some(year) => NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day),
        None => upcoming(today, month, day),
    }
}

fn en_day_month(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let day = number(caps, 1)?;
    let month = month_number(caps.get(2)?.as_str())?;
    match caps.get(3) {
        Some(year) => NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day),
        None => upcoming(today, month, day),
    }
}

fn en_month_day(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let month = month_number(caps.get(1)?.as_str())?;
    let day = number(caps, 2)?;
    match caps.get(3) {
        Some(year) => NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day),
        None => upcoming(today, month, day),
    }
}

fn relative_day(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let offset = match caps.get(1)?.as_str() {
        "hom nay" | "today" => 0,
        "ngay mai" | "tomorrow" => 1,
        "ngay kia" | "ngay mot" | "day after tomorrow" => 2,
        _ => 7,
    };
    today.checked_add_signed(Duration::days(offset))
}

/// A bare weekday (or `next <weekday>`) is its next occurrence after today;
/// `<weekday> tuan sau` / `<weekday> next week` is that day of the following
/// calendar week.
fn weekday(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let target = weekday_from_name(caps.get(2)?.as_str())?;

    if caps.get(3).is_some() {
        let this_monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let next_monday = this_monday + Duration::days(7);
        return next_monday
            .checked_add_signed(Duration::days(i64::from(target.num_days_from_monday())));
    }

    let current = i64::from(today.weekday().num_days_from_monday());
    let wanted = i64::from(target.num_days_from_monday());
    let mut ahead = (wanted - current).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    today.checked_add_signed(Duration::days(ahead))
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    let weekday = match name {
        "thu hai" | "thu 2" | "monday" => Weekday::Mon,
        "thu ba" | "thu 3" | "tuesday" => Weekday::Tue,
        "thu tu" | "thu 4" | "wednesday" => Weekday::Wed,
        "thu nam" | "thu 5" | "thursday" => Weekday::Thu,
        "thu sau" | "thu 6" | "friday" => Weekday::Fri,
        "thu bay" | "thu 7" | "saturday" => Weekday::Sat,
        "chu nhat" | "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

fn month_number(prefix: &str) -> Option<u32> {
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Day/month without a year: this year, or next year once the day has passed.
fn upcoming(today: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    match NaiveDate::from_ymd_opt(today.year(), month, day) {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}
