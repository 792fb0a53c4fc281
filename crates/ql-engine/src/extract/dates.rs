//! Date-range extraction (`date_from` / `date_to`).
//!
//! Relative phrases resolve against an explicit reference date so the
//! result depends only on `(text, today)`.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::{Captures, Regex};

static ABSOLUTE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[-/.年]\s*(\d{1,2})\s*[-/.月]\s*(\d{1,2})\s*日?").unwrap()
});

static RECENT_DAYS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:最近|近)\s*(\d+|[一二三四五六七八九十两]+)\s*(天|日|周|个月|月)")
        .unwrap()
});

/// Inclusive date range found in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    fn single(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    fn ordered(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { from: a, to: b }
        } else {
            Self { from: b, to: a }
        }
    }
}

/// Find a date range in `text`. Returns the range and the byte spans it
/// was read from.
pub fn extract_range(text: &str, today: NaiveDate) -> Option<(DateRange, Vec<Range<usize>>)> {
    let absolute: Vec<(NaiveDate, Range<usize>)> = ABSOLUTE_DATE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let y = caps[1].parse().ok()?;
            let m = caps[2].parse().ok()?;
            let d = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(y, m, d).map(|date| (date, whole.range()))
        })
        .collect();

    match absolute.as_slice() {
        [] => {}
        [(day, span)] => return Some((DateRange::single(*day), vec![span.clone()])),
        [(a, sa), (b, sb), ..] => {
            return Some((DateRange::ordered(*a, *b), vec![sa.clone(), sb.clone()]));
        }
    }

    if let Some(found) = RECENT_DAYS.captures(text).and_then(|caps| recent_window(&caps, today)) {
        return Some(found);
    }

    relative_phrase(text, today)
}

/// "最近N天/周/个月" ending today. A zero or oversized count yields `None`
/// so the caller can try the plain relative phrases instead.
fn recent_window(caps: &Captures<'_>, today: NaiveDate) -> Option<(DateRange, Vec<Range<usize>>)> {
    let whole = caps.get(0)?;
    let n = parse_count(&caps[1])?;
    let days = match &caps[2] {
        "天" | "日" => Some(n),
        "周" => n.checked_mul(7),
        _ => n.checked_mul(30),
    }?;
    let from = today.checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))?;
    Some((DateRange { from, to: today }, vec![whole.range()]))
}

fn relative_phrase(text: &str, today: NaiveDate) -> Option<(DateRange, Vec<Range<usize>>)> {
    const PHRASES: &[&str] = &["上个月", "上月", "本月", "这个月", "上周", "本周", "这周", "昨天", "今天"];

    let (phrase, start) = PHRASES
        .iter()
        .find_map(|p| text.find(*p).map(|pos| (*p, pos)))?;
    let span = start..start + phrase.len();

    let month_start = today.with_day(1)?;
    let week_start = today.checked_sub_days(Days::new(today.weekday().num_days_from_monday() as u64))?;

    let range = match phrase {
        "今天" => DateRange::single(today),
        "昨天" => DateRange::single(today.pred_opt()?),
        "本周" | "这周" => DateRange {
            from: week_start,
            to: today,
        },
        "上周" => DateRange {
            from: week_start.checked_sub_days(Days::new(7))?,
            to: week_start.pred_opt()?,
        },
        "本月" | "这个月" => DateRange {
            from: month_start,
            to: today,
        },
        _ => {
            let prev_end = month_start.pred_opt()?;
            DateRange {
                from: prev_end.with_day(1)?,
                to: prev_end,
            }
        }
    };
    Some((range, vec![span]))
}

/// Parse "7", "三", "十五", "两".
fn parse_count(s: &str) -> Option<u32> {
    if let Ok(n) = s.parse::<u32>() {
        return (n > 0).then_some(n);
    }
    let digit = |c: char| match c {
        '一' => Some(1),
        '二' | '两' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    };
    let chars: Vec<char> = s.chars().collect();
    match chars.as_slice() {
        ['十'] => Some(10),
        ['十', b] => Some(10 + digit(*b)?),
        [a, '十'] => Some(digit(*a)? * 10),
        [a, '十', b] => Some(digit(*a)? * 10 + digit(*b)?),
        [a] => digit(*a),
        _ => None,
    }
}
