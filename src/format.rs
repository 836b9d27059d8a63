//! Display formatting for durations, dates and counts.

use chrono::{DateTime, NaiveDateTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// `h:mm:ss` when the video is at least an hour long, otherwise `m:ss`.
pub fn format_duration(seconds: u64) -> String {
  let h = seconds / 3600;
  let m = (seconds % 3600) / 60;
  let s = seconds % 60;
  if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

/// Parse a backend timestamp. Naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|naive| naive.and_utc())
}

/// Coarse "how long ago" label. Unparsable timestamps render as "".
pub fn format_relative_date(raw: &str, now: DateTime<Utc>) -> String {
  let Some(published) = parse_timestamp(raw) else { return String::new() };
  let days = (now - published).num_seconds().div_euclid(SECONDS_PER_DAY);
  match days {
    ..=0 => "today".to_string(),
    1 => "yesterday".to_string(),
    2..=6 => format!("{} days ago", days),
    7..=29 => plural(days / 7, "week"),
    _ => plural(days / 30, "month"),
  }
}

fn plural(n: i64, unit: &str) -> String {
  if n == 1 { format!("1 {} ago", unit) } else { format!("{} {}s ago", n, unit) }
}

/// Thousands separators below 10,000, compact `K`/`M` from there on.
/// Anything that would round to "1000.0K" is shown in `M`.
pub fn format_count(n: u64) -> String {
  if n >= 999_950 {
    format!("{:.1}M", n as f64 / 1_000_000.0)
  } else if n >= 10_000 {
    format!("{:.1}K", n as f64 / 1_000.0)
  } else {
    group_thousands(n)
  }
}

fn group_thousands(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

/// Channels may hide their subscriber count; the backend then reports 0 or nothing.
pub fn format_subscribers(count: Option<u64>) -> String {
  match count {
    None | Some(0) => "hidden".to_string(),
    Some(n) => format_count(n),
  }
}

/// Two decimals at most, trailing zeros trimmed. Non-finite ratios render as "0".
pub fn format_ratio(ratio: f64) -> String {
  if !ratio.is_finite() {
    return "0".to_string();
  }
  let s = format!("{:.2}", ratio);
  s.trim_end_matches('0').trim_end_matches('.').to_string()
}
