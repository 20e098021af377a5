use chrono::{DateTime, Months, Utc};

const FULL_UNITS: [&str; 6] = ["year", "month", "day", "hour", "minute", "second"];
const SHORT_UNITS: [&str; 6] = ["yr", "mo", "day", "hr", "min", "sec"];

/// Human-readable distance between two instants, e.g.
/// `"2 hours, 5 minutes, and 3 seconds"`. At most three non-zero units are
/// shown, largest first. Order of the arguments does not matter.
pub fn time_difference(a: DateTime<Utc>, b: DateTime<Utc>, abbreviate: bool) -> String {
    let (start, end) = if a <= b { (a, b) } else { (b, a) };

    let mut months = calendar_months_between(start, end);
    let mut anchor = start
        .checked_add_months(Months::new(months))
        .unwrap_or(end);
    if anchor > end {
        months = 0;
        anchor = start;
    }

    let rest = end - anchor;
    let values = [
        i64::from(months / 12),
        i64::from(months % 12),
        rest.num_days(),
        rest.num_hours() % 24,
        rest.num_minutes() % 60,
        rest.num_seconds() % 60,
    ];
    let labels = if abbreviate { SHORT_UNITS } else { FULL_UNITS };

    let parts: Vec<String> = values
        .iter()
        .zip(labels)
        .filter(|(v, _)| **v > 0)
        .take(3)
        .map(|(v, label)| {
            if *v == 1 {
                format!("{} {}", v, label)
            } else {
                format!("{} {}s", v, label)
            }
        })
        .collect();

    match parts.len() {
        0 => format!("0 {}s", labels[5]),
        1 => parts[0].clone(),
        2 => format!("{} and {}", parts[0], parts[1]),
        _ => format!("{}, {}, and {}", parts[0], parts[1], parts[2]),
    }
}

/// Whole calendar months from `start` that still land at or before `end`.
fn calendar_months_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    use chrono::Datelike;

    let rough = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    let mut months = rough.max(0) as u32;
    while months > 0 {
        match start.checked_add_months(Months::new(months)) {
            Some(t) if t <= end => break,
            _ => months -= 1,
        }
    }
    months
}
