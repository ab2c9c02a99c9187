//! Value formatters applied after resolution

use std::fmt::Write;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::EngineConfig;
use crate::report::CellValue;
use crate::template::{FieldDescriptor, FieldType};

/// Numeric date layouts: `2025-01-15`, `2025/1/15`, `2025.01.15`, `20250115`,
/// each optionally followed by a time part
static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})(?:[-/.](\d{1,2})[-/.](\d{1,2})|(\d{2})(\d{2}))(?:[ T].*)?$")
        .expect("Numeric date pattern should compile")
});

/// Standard identifier at the start of a method, e.g. `GB/T 5750.4-2023`
static STANDARD_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]+(?:/[A-Za-z]+)?\s*[0-9][0-9.]*-[0-9]+")
        .expect("Standard identifier pattern should compile")
});

/// Rewrite a numeric date into the long form given by `long_format`.
///
/// Text already in long form, text in an unrecognized layout and impossible
/// dates come back unchanged.
pub fn format_date(text: &str, long_format: &str) -> String {
    let trimmed = text.trim();
    if trimmed.contains('年') && trimmed.contains('月') {
        return text.to_string();
    }

    let Some(caps) = NUMERIC_DATE.captures(trimmed) else {
        return text.to_string();
    };
    let part = |a: usize, b: usize| caps.get(a).or_else(|| caps.get(b)).map(|m| m.as_str());
    let (Some(year), Some(month), Some(day)) = (caps.get(1).map(|m| m.as_str()), part(2, 4), part(3, 5))
    else {
        return text.to_string();
    };

    let date = match (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    };
    let Some(date) = date else {
        return text.to_string();
    };

    // An invalid format string surfaces as a fmt error, not a panic
    let mut out = String::new();
    match write!(out, "{}", date.format(long_format)) {
        Ok(()) => out,
        Err(_) => text.to_string(),
    }
}

/// Split method text into a standard-identifier line and a name line.
///
/// After a recognized identifier the split happens at the first non-ASCII
/// character, or right after the identifier when the rest is ASCII. A bare
/// identifier stays on one line. Unrecognized text splits at the last
/// whitespace. Text with no sensible split point is returned unchanged.
pub fn format_method(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.contains('\n') {
        return text.to_string();
    }

    if let Some(id) = STANDARD_ID.find(trimmed) {
        let split = trimmed[id.end()..]
            .char_indices()
            .find(|(_, c)| !c.is_ascii())
            .map(|(i, _)| id.end() + i);
        let at = split.unwrap_or(id.end());
        return join_lines(&trimmed[..at], &trimmed[at..]).unwrap_or_else(|| text.to_string());
    }

    trimmed
        .rfind(char::is_whitespace)
        .and_then(|at| join_lines(&trimmed[..at], &trimmed[at..]))
        .unwrap_or_else(|| text.to_string())
}

fn join_lines(head: &str, tail: &str) -> Option<String> {
    let (head, tail) = (head.trim_end(), tail.trim_start());
    if head.is_empty() || tail.is_empty() {
        None
    } else {
        Some(format!("{}\n{}", head, tail))
    }
}

/// Apply the configured formatters to a resolved scalar value
pub fn format_resolved(descriptor: &FieldDescriptor, value: CellValue, config: &EngineConfig) -> CellValue {
    if !config.format_dates || descriptor.field_type != FieldType::Date {
        return value;
    }
    match value {
        CellValue::Text(text) => CellValue::Text(format_date(&text, &config.date_format)),
        CellValue::Integer(n) => {
            let raw = n.to_string();
            let formatted = format_date(&raw, &config.date_format);
            if formatted == raw {
                CellValue::Integer(n)
            } else {
                CellValue::Text(formatted)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "%Y年%m月%d日";

    #[test]
    fn test_format_date_layouts() {
        assert_eq!(format_date("2025-01-15", LONG), "2025年01月15日");
        assert_eq!(format_date("2025/1/5", LONG), "2025年01月05日");
        assert_eq!(format_date("2025.01.15", LONG), "2025年01月15日");
        assert_eq!(format_date("20250115", LONG), "2025年01月15日");
        assert_eq!(format_date("2025-01-15 08:30:00", LONG), "2025年01月15日");
        assert_eq!(format_date("2025-01-15T08:30:00", LONG), "2025年01月15日");
    }

    #[test]
    fn test_format_date_passthrough() {
        assert_eq!(format_date("2025年1月15日", LONG), "2025年1月15日");
        assert_eq!(format_date("next Tuesday", LONG), "next Tuesday");
        assert_eq!(format_date("2025-13-45", LONG), "2025-13-45");
        assert_eq!(format_date("", LONG), "");
    }

    #[test]
    fn test_format_date_custom_layout() {
        assert_eq!(format_date("2025-01-15", "%d.%m.%Y"), "15.01.2025");
    }

    #[test]
    fn test_format_method_standard_identifier() {
        assert_eq!(
            format_method("GB/T 5750.4-2023 玻璃电极法"),
            "GB/T 5750.4-2023\n玻璃电极法"
        );
        assert_eq!(
            format_method("HJ 535-2009纳氏试剂分光光度法"),
            "HJ 535-2009\n纳氏试剂分光光度法"
        );
        assert_eq!(
            format_method("GB/T 5750.5-2023 (4.1) 离子色谱法"),
            "GB/T 5750.5-2023 (4.1)\n离子色谱法"
        );
    }

    #[test]
    fn test_format_method_bare_identifier_kept_whole() {
        assert_eq!(format_method("GB/T 5750.4-2023"), "GB/T 5750.4-2023");
        assert_eq!(format_method("GB 5749-2022"), "GB 5749-2022");
        assert_eq!(format_method("HJ 535-2009 Nessler"), "HJ 535-2009\nNessler");
    }

    #[test]
    fn test_format_method_whitespace_fallback() {
        assert_eq!(format_method("Internal method SOP12"), "Internal method\nSOP12");
    }

    #[test]
    fn test_format_method_unchanged() {
        assert_eq!(format_method("玻璃电极法"), "玻璃电极法");
        assert_eq!(format_method(""), "");
        assert_eq!(format_method("a\nb"), "a\nb");
    }
}
