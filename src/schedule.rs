//! Ordered set of `(week_time, block_name)` entries (§4.3).

use std::fs;

use camino::Utf8PathBuf;
use color_eyre::Result;
use color_eyre::eyre::Context;
use strum::EnumString;

use crate::parse::tokenize_n;
use crate::time::{self, cyclic_diff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    fn day_offset_ms(self) -> u32 {
        (self as u32) * time::DAY
    }
}

fn parse_time_of_day(s: &str) -> Option<u32> {
    let mut parts = s.splitn(3, ':');
    let h: u32 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let s: u32 = parts.next()?.parse().ok()?;
    if h > 23 || m > 59 || s > 59 {
        return None;
    }
    Some(h * time::HOUR + m * time::MINUTE + s * time::SECOND)
}

#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub time: u32,
    pub block: String,
}

/// Entries in file order; `current_entry`/`next_entry` scan the whole set.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn load(path: &Utf8PathBuf) -> Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("Could not read schedule file: {path}"))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let Some(tokens) = tokenize_n(line, 3) else {
                continue;
            };
            let [day, hms, block] = <[String; 3]>::try_from(tokens).unwrap();
            if block.is_empty() {
                continue;
            }
            let Ok(weekday) = day.parse::<Weekday>() else {
                tracing::warn!(line = lineno + 1, %day, "unknown weekday, dropping line");
                continue;
            };
            let Some(tod) = parse_time_of_day(&hms) else {
                tracing::warn!(line = lineno + 1, time = %hms, "invalid time of day, dropping line");
                continue;
            };
            entries.push(ScheduleEntry {
                time: time::cyclic_add(weekday.day_offset_ms(), tod),
                block,
            });
        }
        Schedule { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry minimizing `cyclic_diff(t, entry.time)` — the most recently
    /// passed entry on the cyclic week.
    pub fn current_entry(&self, t: u32) -> Option<&ScheduleEntry> {
        self.entries
            .iter()
            .min_by_key(|e| cyclic_diff(t, e.time))
    }

    /// The entry minimizing `cyclic_diff(entry.time, t)` subject to that
    /// difference being strictly positive. Falls back to the minimizing
    /// entry overall (even at difference zero) if no entry satisfies the
    /// strict bound — matching the single-entry-equal-to-`t` case in §4.3.
    pub fn next_entry(&self, t: u32) -> Option<&ScheduleEntry> {
        let strictly_future = self
            .entries
            .iter()
            .filter(|e| cyclic_diff(e.time, t) > 0)
            .min_by_key(|e| cyclic_diff(e.time, t));
        strictly_future.or_else(|| self.entries.iter().min_by_key(|e| cyclic_diff(e.time, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loads_day_time_block_triples() {
        let schedule = Schedule::parse("Monday 08:00:00 news\nMonday 09:00:00 music\n");
        assert_eq!(schedule.current_entry(0).unwrap().block, "news".to_string());
    }

    #[test]
    fn invalid_time_of_day_drops_the_line() {
        let schedule = Schedule::parse("Monday 24:00:00 news\nMonday 09:00:00 music\n");
        assert_eq!(schedule.entries.len(), 1);
    }

    #[test]
    fn next_entry_wraps_across_the_week_boundary() {
        // Scenario 5: single entry Sunday 00:00:00, queried at Saturday 23:59:59.000
        let schedule = Schedule::parse("Sunday 00:00:00 daily\n");
        let saturday_2359_59 = 6 * time::DAY + 23 * time::HOUR + 59 * time::MINUTE + 59 * time::SECOND;
        let next = schedule.next_entry(saturday_2359_59).unwrap();
        assert_eq!(next.time, 0);
        assert_eq!(cyclic_diff(next.time, saturday_2359_59), 1_000);
    }

    #[test]
    fn next_entry_is_itself_when_schedule_has_one_entry_equal_to_now() {
        let schedule = Schedule::parse("Sunday 00:00:00 daily\n");
        let next = schedule.next_entry(0).unwrap();
        assert_eq!(next.block, "daily");
    }

    #[test]
    fn empty_schedule_queries_return_none() {
        let schedule = Schedule::default();
        assert!(schedule.current_entry(0).is_none());
        assert!(schedule.next_entry(0).is_none());
    }

    #[test]
    fn current_entry_is_most_recently_passed() {
        let schedule = Schedule::parse("Monday 08:00:00 news\nMonday 09:00:00 music\n");
        let just_before_nine = time::DAY + 8 * time::HOUR + 59 * time::MINUTE;
        assert_eq!(schedule.current_entry(just_before_nine).unwrap().block, "news");
    }
}
