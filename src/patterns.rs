//! Regular expressions for tick labels: numbers, unit suffixes, axis keywords
//! and the date formats recognized on time axes.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters allowed in a numeric label
static NUMBER_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-+.0-9$%(),]").unwrap());

/// Decorations stripped before parsing a number
pub static NUMBER_AUXILIARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$%()'，,=xT¥€M]").unwrap());

/// Unit suffix (or currency prefix) of a numeric label
pub static NUMBER_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"%$|\$|x|T|€|¥|M").unwrap());

pub static LEFT_AXIS_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(左|\(L\)|lhs|left)").unwrap());

pub static RIGHT_AXIS_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(右|\(R\)|rhs|right)").unwrap());

/// Whether the text consists of number characters only and has a digit
pub fn is_numeric_text(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    NUMBER_CHARS.replace_all(trimmed, "").is_empty()
}

/// A date format: the common pattern (used to pick the time grain) and the
/// chart-library label format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFormat {
    pub common: &'static str,
    pub highchart: &'static str,
}

impl TimeFormat {
    pub fn has_year(&self) -> bool {
        self.common.contains('y')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateKind {
    Year,
    YearEstimate,
    YearMonth,
    MonthYear,
    YearMonthDay,
    DayMonthNameYear,
    MonthNameShortYear,
    MonthNameYear,
    MonthName,
    QuarterLeading,
    QuarterPrefix,
    QuarterSuffix,
    HalfSuffix,
    HalfPrefix,
    HourMinute,
    HourMinuteSecond,
    CjkYear,
    CjkYearMonth,
    CjkYearMonthDay,
}

pub struct DatePattern {
    regex: Regex,
    kind: DateKind,
    pub format: TimeFormat,
}

impl DatePattern {
    fn new(re: &str, kind: DateKind, common: &'static str, highchart: &'static str) -> Self {
        Self {
            regex: Regex::new(re).unwrap(),
            kind,
            format: TimeFormat { common, highchart },
        }
    }

    /// Parse one label with this pattern
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        let caps = self.regex.captures(text.trim())?;
        let num = |i: usize| -> Option<u32> { caps.get(i)?.as_str().parse().ok() };
        let year = |i: usize| -> Option<i32> {
            let s = caps.get(i)?.as_str();
            let y: i32 = s.parse().ok()?;
            Some(if s.len() == 2 { expand_short_year(y) } else { y })
        };

        let date = match self.kind {
            DateKind::Year | DateKind::CjkYear => ymd(year(1)?, 1, 1)?,
            DateKind::YearEstimate => ymd(year(1).or_else(|| year(2))?, 1, 1)?,
            DateKind::YearMonth | DateKind::CjkYearMonth => ymd(year(1)?, num(2)?, 1)?,
            DateKind::MonthYear => ymd(year(2)?, num(1)?, 1)?,
            DateKind::YearMonthDay | DateKind::CjkYearMonthDay => {
                ymd(year(1)?, num(2)?, num(3)?)?
            }
            DateKind::DayMonthNameYear => {
                ymd(year(3)?, month_from_name(caps.get(2)?.as_str())?, num(1)?)?
            }
            DateKind::MonthNameShortYear | DateKind::MonthNameYear => {
                ymd(year(2)?, month_from_name(caps.get(1)?.as_str())?, 1)?
            }
            DateKind::MonthName => ymd(1970, month_from_name(caps.get(1)?.as_str())?, 1)?,
            DateKind::QuarterLeading | DateKind::QuarterPrefix => quarter_end(year(2)?, num(1)?)?,
            DateKind::QuarterSuffix => quarter_end(year(1)?, num(2)?)?,
            DateKind::HalfSuffix => half_end(year(1)?, num(2)?)?,
            DateKind::HalfPrefix => half_end(year(2)?, num(1)?)?,
            DateKind::HourMinute | DateKind::HourMinuteSecond => ymd(1970, 1, 1)?,
        };

        match self.kind {
            DateKind::HourMinute => date.and_hms_opt(num(1)?, num(2)?, 0),
            DateKind::HourMinuteSecond => date.and_hms_opt(num(1)?, num(2)?, num(3)?),
            _ => date.and_hms_opt(0, 0, 0),
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn expand_short_year(y: i32) -> i32 {
    if y < 70 {
        2000 + y
    } else {
        1900 + y
    }
}

fn quarter_end(year: i32, quarter: u32) -> Option<NaiveDate> {
    match quarter {
        1 => ymd(year, 3, 31),
        2 => ymd(year, 6, 30),
        3 => ymd(year, 9, 30),
        4 => ymd(year, 12, 31),
        _ => None,
    }
}

fn half_end(year: i32, half: u32) -> Option<NaiveDate> {
    match half {
        1 => ymd(year, 6, 30),
        2 => ymd(year, 12, 31),
        _ => None,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = name.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    let idx = MONTHS.iter().position(|m| lower.starts_with(m))?;
    Some(idx as u32 + 1)
}

/// Date formats tried on time-axis labels
pub static DATE_PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    use DateKind::*;
    vec![
        DatePattern::new(r"^(\d{4})$", Year, "yyyy", "%Y"),
        DatePattern::new(
            r"^(?:(\d{4})[EeAaFf]|[EeFf](\d{4}))$",
            YearEstimate,
            "yyyy",
            "%Y",
        ),
        DatePattern::new(r"^(\d{4})[-/.](\d{1,2})$", YearMonth, "yyyy-MM", "%Y-%m"),
        DatePattern::new(r"^(\d{1,2})[-/.](\d{4})$", MonthYear, "MM-yyyy", "%m-%Y"),
        DatePattern::new(
            r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})$",
            YearMonthDay,
            "yyyy-MM-dd",
            "%Y-%m-%d",
        ),
        DatePattern::new(
            r"^(\d{1,2})[-/. ]([A-Za-z]{3,9})[-/. ](\d{2})$",
            DayMonthNameYear,
            "dd-MMM-yy",
            "%d-%b-%y",
        ),
        DatePattern::new(
            r"^([A-Za-z]{3,9})[-/. ']+(\d{2})$",
            MonthNameShortYear,
            "MMM-yy",
            "%b-%y",
        ),
        DatePattern::new(
            r"^([A-Za-z]{3,9})[-/. ]+(\d{4})$",
            MonthNameYear,
            "MMM yyyy",
            "%b %Y",
        ),
        DatePattern::new(r"^([A-Za-z]{3,9})$", MonthName, "MMM", "%b"),
        DatePattern::new(
            r"^([1-4])Q(\d{2}|\d{4})$",
            QuarterLeading,
            "yyyy-MM-dd",
            "%Y-%m",
        ),
        DatePattern::new(
            r"^Q([1-4])[ -]?(\d{2}|\d{4})$",
            QuarterPrefix,
            "yyyy-MM-dd",
            "%Y-%m",
        ),
        DatePattern::new(
            r"^(\d{4})[ -]?Q([1-4])$",
            QuarterSuffix,
            "yyyy-MM-dd",
            "%Y-%m",
        ),
        DatePattern::new(r"^(\d{4})[ -]?H([12])$", HalfSuffix, "yyyy-MM-dd", "%Y-%m"),
        DatePattern::new(r"^H([12])[ -]?(\d{4})$", HalfPrefix, "yyyy-MM-dd", "%Y-%m"),
        DatePattern::new(r"^(\d{1,2}):(\d{2})$", HourMinute, "HH:mm", "%H:%M"),
        DatePattern::new(
            r"^(\d{1,2}):(\d{2}):(\d{2})$",
            HourMinuteSecond,
            "HH:mm:ss",
            "%H:%M:%S",
        ),
        DatePattern::new(r"^(\d{4})年$", CjkYear, "yyyy年", "%Y年"),
        DatePattern::new(
            r"^(\d{4})年(\d{1,2})月$",
            CjkYearMonth,
            "yyyy年MM月",
            "%Y年%m月",
        ),
        DatePattern::new(
            r"^(\d{4})年(\d{1,2})月(\d{1,2})日$",
            CjkYearMonthDay,
            "yyyy年MM月dd日",
            "%Y年%m月%d日",
        ),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn parse_any(text: &str) -> Option<(NaiveDateTime, TimeFormat)> {
        DATE_PATTERNS
            .iter()
            .find_map(|p| p.parse(text).map(|d| (d, p.format)))
    }

    #[test]
    fn test_numeric_text() {
        assert!(is_numeric_text("1,234.5"));
        assert!(is_numeric_text(" (12)% "));
        assert!(is_numeric_text("$12.$34.$56"));
        assert!(!is_numeric_text("Q1"));
        assert!(!is_numeric_text("-"));
        assert!(!is_numeric_text(""));
    }

    #[test]
    fn test_axis_keys() {
        assert!(LEFT_AXIS_KEY.is_match("Revenue (LHS)"));
        assert!(RIGHT_AXIS_KEY.is_match("右轴"));
        assert!(!RIGHT_AXIS_KEY.is_match("Revenue"));
    }

    #[test]
    fn test_parse_quarters() {
        let (d, fmt) = parse_any("1Q14").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2014, 3, 31));
        assert!(fmt.has_year());
        let (d, _) = parse_any("2014Q3").unwrap();
        assert_eq!((d.month(), d.day()), (9, 30));
        let (d, _) = parse_any("Q4 2015").unwrap();
        assert_eq!((d.year(), d.month()), (2015, 12));
    }

    #[test]
    fn test_parse_months_and_times() {
        let (d, fmt) = parse_any("Mar-19").unwrap();
        assert_eq!((d.year(), d.month()), (2019, 3));
        assert_eq!(fmt.common, "MMM-yy");
        let (d, fmt) = parse_any("13:45").unwrap();
        assert_eq!((d.hour(), d.minute()), (13, 45));
        assert_eq!(fmt.highchart, "%H:%M");
        let (d, _) = parse_any("2018年6月").unwrap();
        assert_eq!((d.year(), d.month()), (2018, 6));
        assert!(parse_any("Foo").is_none());
    }
}
