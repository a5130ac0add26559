//! Date formatting in the admin's `N j, Y` token syntax.
//!
//! Each unescaped letter below is a token; any other character, and any
//! character after a backslash, is copied as is. Tokens that need a part
//! the value lacks (a time token on a plain date) render as nothing.
//!
//! | token | output |
//! |-------|--------|
//! | `d` `j` | day of month, zero-padded / plain |
//! | `D` `l` | weekday, `Sat` / `Saturday` |
//! | `S` | English ordinal suffix of the day (`st`, `nd`, `rd`, `th`) |
//! | `w` | weekday number, Sunday is `0` |
//! | `m` `n` | month number, zero-padded / plain |
//! | `M` `b` `F` | month, `Mar` / `mar` / `March` |
//! | `N` | AP-style month: `Jan.`, `March`, `Sept.` |
//! | `y` `Y` | two- / four-digit year |
//! | `a` `A` | `a.m.` / `AM` |
//! | `g` `G` `h` `H` | hour: 12h plain, 24h plain, 12h padded, 24h padded |
//! | `i` `s` | minutes, seconds |
//! | `f` | 12h hour with minutes left off when zero: `2`, `2:05` |
//! | `P` | `f` plus `a`, or `noon` / `midnight` |

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS_AP: [&str; 12] = [
    "Jan.", "Feb.", "March", "April", "May", "June", "July", "Aug.", "Sept.", "Oct.", "Nov.",
    "Dec.",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Render `date` and/or `time` with `pattern`.
pub fn format(date: Option<NaiveDate>, time: Option<NaiveTime>, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            'd' | 'j' | 'D' | 'l' | 'S' | 'w' | 'm' | 'n' | 'M' | 'b' | 'F' | 'N' | 'y' | 'Y' => {
                if let Some(date) = date {
                    out.push_str(&date_token(ch, date));
                }
            }
            'a' | 'A' | 'g' | 'G' | 'h' | 'H' | 'i' | 's' | 'f' | 'P' => {
                if let Some(time) = time {
                    out.push_str(&time_token(ch, time));
                }
            }
            other => out.push(other),
        }
    }

    out
}

fn date_token(token: char, date: NaiveDate) -> String {
    let month = date.month0() as usize;
    let weekday = date.weekday().num_days_from_monday() as usize;
    match token {
        'd' => format!("{:02}", date.day()),
        'j' => date.day().to_string(),
        'D' => WEEKDAYS[weekday][..3].to_string(),
        'l' => WEEKDAYS[weekday].to_string(),
        'S' => ordinal_suffix(date.day()).to_string(),
        'w' => date.weekday().num_days_from_sunday().to_string(),
        'm' => format!("{:02}", date.month()),
        'n' => date.month().to_string(),
        'M' => MONTHS[month][..3].to_string(),
        'b' => MONTHS[month][..3].to_lowercase(),
        'F' => MONTHS[month].to_string(),
        'N' => MONTHS_AP[month].to_string(),
        'y' => format!("{:02}", date.year().rem_euclid(100)),
        'Y' => date.year().to_string(),
        _ => String::new(),
    }
}

fn time_token(token: char, time: NaiveTime) -> String {
    let (is_pm, hour12) = time.hour12();
    match token {
        'a' => (if is_pm { "p.m." } else { "a.m." }).to_string(),
        'A' => (if is_pm { "PM" } else { "AM" }).to_string(),
        'g' => hour12.to_string(),
        'G' => time.hour().to_string(),
        'h' => format!("{hour12:02}"),
        'H' => format!("{:02}", time.hour()),
        'i' => format!("{:02}", time.minute()),
        's' => format!("{:02}", time.second()),
        'f' => short_hour(time),
        'P' => match (time.hour(), time.minute()) {
            (0, 0) => "midnight".to_string(),
            (12, 0) => "noon".to_string(),
            _ => format!("{} {}", short_hour(time), time_token('a', time)),
        },
        _ => String::new(),
    }
}

fn short_hour(time: NaiveTime) -> String {
    let (_, hour12) = time.hour12();
    if time.minute() == 0 {
        hour12.to_string()
    } else {
        format!("{hour12}:{:02}", time.minute())
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
