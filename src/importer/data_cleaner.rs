// ==========================================
// 生产计划系统 - 数据清洗器（值/日期规范化）
// ==========================================
// 职责: 金额解析与格式化 / 日期三形态解析 / 整数型文本规范化
// 红线: 解析失败一律返回 None，不抛错、不中断批次
// ==========================================

use crate::domain::sheet::CellValue;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Excel 日期序列号纪元（1899-12-30，序列号 1 = 1899-12-31）
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// 序列号上限（9999-12-31）
const MAX_SERIAL: f64 = 2_958_465.0;

/// 自由文本日期的合理年份区间（用于排除 "%Y" 误吞两位年份）
const MIN_TEXT_YEAR: i32 = 1900;
const MAX_TEXT_YEAR: i32 = 2200;

/// 日期时间格式（日在前）
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// 日期格式（日在前；四位年份优先）
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d/%b/%Y",
    "%d-%B-%Y",
    "%d %B %Y",
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%d-%b-%y",
    "%d %b %y",
];

/// 意大利语月份（全称 / 缩写）→ 英语缩写
const ITALIAN_MONTHS: &[(&str, &str)] = &[
    ("gennaio", "jan"),
    ("gen", "jan"),
    ("febbraio", "feb"),
    ("feb", "feb"),
    ("marzo", "mar"),
    ("mar", "mar"),
    ("aprile", "apr"),
    ("apr", "apr"),
    ("maggio", "may"),
    ("mag", "may"),
    ("giugno", "jun"),
    ("giu", "jun"),
    ("luglio", "jul"),
    ("lug", "jul"),
    ("agosto", "aug"),
    ("ago", "aug"),
    ("settembre", "sep"),
    ("sett", "sep"),
    ("set", "sep"),
    ("ottobre", "oct"),
    ("ott", "oct"),
    ("novembre", "nov"),
    ("nov", "nov"),
    ("dicembre", "dec"),
    ("dic", "dec"),
];

pub struct DataCleaner;

impl DataCleaner {
    // ==========================================
    // 金额
    // ==========================================

    /// 解析金额文本
    ///
    /// # 规则
    /// - 去除 € / EUR / 空白 / 撇号
    /// - 同时出现 '.' 与 ',' → 靠后的为小数点
    /// - 仅出现 ',' → 单个为小数点，多个为千分位
    /// - 仅出现 '.' → 每组恰为三位数字时为千分位（"€ 1.500" → 1500），否则单个为小数点
    ///
    /// # 示例
    /// - "€ 1.234,56" → Some(1234.56)
    /// - "12.5" → Some(12.5)
    /// - "abc" → None
    pub fn parse_currency(&self, raw: &str) -> Option<f64> {
        let stripped: String = raw
            .to_uppercase()
            .replace("EUR", "")
            .chars()
            .filter(|c| *c != '€' && *c != '\'' && !c.is_whitespace())
            .collect();
        if stripped.is_empty() {
            return None;
        }

        let last_dot = stripped.rfind('.');
        let last_comma = stripped.rfind(',');
        let normalized = match (last_dot, last_comma) {
            (Some(dot), Some(comma)) if comma > dot => stripped.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => stripped.replace(',', ""),
            (None, Some(_)) if stripped.matches(',').count() == 1 => stripped.replace(',', "."),
            (None, Some(_)) => stripped.replace(',', ""),
            (Some(_), None) if dots_are_thousands(&stripped) => stripped.replace('.', ""),
            _ => stripped,
        };

        normalized.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// 解析金额/数量单元格（数值直通，文本走 parse_currency）
    pub fn parse_number_cell(&self, cell: &CellValue) -> Option<f64> {
        match cell {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => self.parse_currency(s),
            _ => None,
        }
    }

    /// 金额格式化（意大利格式: "€ 1.234,56"）
    ///
    /// 非有限值 → 空串
    pub fn format_currency(&self, value: f64) -> String {
        if !value.is_finite() {
            return String::new();
        }
        let cents = (value.abs() * 100.0).round() as u64;
        let sign = if value < 0.0 && cents != 0 { "-" } else { "" };
        format!(
            "€ {}{},{:02}",
            sign,
            group_thousands(cents / 100),
            cents % 100
        )
    }

    /// 数量格式化（整数值不带小数，其余以逗号为小数点）
    pub fn format_quantity(&self, value: f64) -> String {
        render_number(value).replace('.', ",")
    }

    // ==========================================
    // 日期
    // ==========================================

    /// 解析日期单元格
    ///
    /// # 优先级
    /// 数值序列号 > 原生日期时间 > 自由文本
    pub fn parse_date(&self, cell: &CellValue) -> Option<NaiveDate> {
        match cell {
            CellValue::Number(serial) => serial_to_datetime(*serial).map(|dt| dt.date()),
            CellValue::DateTime(dt) => Some(dt.date()),
            CellValue::Text(text) => self.parse_date_text(text),
            CellValue::Empty | CellValue::Bool(_) => None,
        }
    }

    /// 解析日期文本
    ///
    /// 纯数字文本按序列号处理；其余先替换意大利月份再按日在前解析
    pub fn parse_date_text(&self, raw: &str) -> Option<NaiveDate> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(serial) = text.parse::<f64>() {
            return serial_to_datetime(serial).map(|dt| dt.date());
        }

        let translated = translate_italian_months(text);

        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(&translated, fmt) {
                if plausible_year(dt.date()) {
                    return Some(dt.date());
                }
            }
        }

        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(&translated, fmt) {
                if plausible_year(date) {
                    return Some(date);
                }
            }
        }

        tracing::trace!(raw = %text, "日期无法解析");
        None
    }

    /// 日期格式化（DD/MM/YYYY）
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format("%d/%m/%Y").to_string()
    }

    /// 可选日期格式化（None → 空串）
    pub fn format_optional_date(&self, date: Option<NaiveDate>) -> String {
        date.map(|d| self.format_date(d)).unwrap_or_default()
    }

    // ==========================================
    // 整数型字段（ODA / 行号）
    // ==========================================

    /// 整数型字段规范化
    ///
    /// # 规则
    /// - 整数值浮点 → 不带 ".0"（4500012345.0 → "4500012345"）
    /// - 文本 "123.0" → "123"（前导零保留）
    /// - 其余 → TRIM 后原文
    pub fn integer_like(&self, cell: &CellValue) -> String {
        match cell {
            CellValue::Number(n) => render_number(*n),
            CellValue::Text(s) => strip_zero_fraction(s.trim()),
            CellValue::DateTime(dt) => self.format_date(dt.date()),
            other => other.as_text(),
        }
    }
}

/// 仅含 '.' 的数字是否为千分位写法（首组 1-3 位，其后每组恰为 3 位）
fn dots_are_thousands(text: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let mut groups = text.split('.');
    let head = groups
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| c == '-' || c == '+');
    all_digits(head) && head.len() <= 3 && groups.all(|g| g.len() == 3 && all_digits(g))
}

// ==========================================
// 序列号换算
// ==========================================

/// Excel 序列号 → 日期时间（小数部分为一天内时间）
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let secs = (serial.fract() * 86_400.0).round() as i64;
    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(secs))
}

/// 日期时间 → Excel 序列号
pub fn datetime_to_serial(dt: &NaiveDateTime) -> Option<f64> {
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;
    let duration = *dt - epoch;
    let days = duration.num_days() as f64;
    let secs = (duration.num_seconds() - duration.num_days() * 86_400) as f64;
    Some(days + secs / 86_400.0)
}

// ==========================================
// 内部工具
// ==========================================

fn plausible_year(date: NaiveDate) -> bool {
    use chrono::Datelike;
    (MIN_TEXT_YEAR..=MAX_TEXT_YEAR).contains(&date.year())
}

/// 字母片段中的意大利月份替换为英语缩写，其余字符原样保留
fn translate_italian_months(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        if word.is_empty() {
            return;
        }
        let lowered = word.to_lowercase();
        match ITALIAN_MONTHS.iter().find(|(it, _)| *it == lowered) {
            Some((_, en)) => out.push_str(en),
            None => out.push_str(word),
        }
        word.clear();
    };

    for ch in text.chars() {
        if ch.is_alphabetic() {
            word.push(ch);
        } else {
            flush(&mut word, &mut out);
            out.push(ch);
        }
    }
    flush(&mut word, &mut out);
    out
}

/// 整数值 → 无小数；其余 → 默认浮点表示
fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// "123.0" / "123.00" → "123"；其他原样
fn strip_zero_fraction(text: &str) -> String {
    if let Some((int_part, frac)) = text.split_once('.') {
        let int_digits = int_part.strip_prefix('-').unwrap_or(int_part);
        if !int_digits.is_empty()
            && int_digits.chars().all(|c| c.is_ascii_digit())
            && !frac.is_empty()
            && frac.chars().all(|c| c == '0')
        {
            return int_part.to_string();
        }
    }
    text.to_string()
}

/// 千分位分组（意大利格式用 '.'）
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_currency_italian() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_currency("€ 1.234,56"), Some(1234.56));
        assert_eq!(cleaner.parse_currency("1.234.567"), Some(1234567.0));
        assert_eq!(cleaner.parse_currency("12,5"), Some(12.5));
        assert_eq!(cleaner.parse_currency("EUR 99"), Some(99.0));
        assert_eq!(cleaner.parse_currency("-€ 3,10"), Some(-3.1));
    }

    #[test]
    fn test_parse_currency_lone_dot() {
        let cleaner = DataCleaner;
        // 三位一组 → 千分位
        assert_eq!(cleaner.parse_currency("€ 1.500"), Some(1500.0));
        assert_eq!(cleaner.parse_currency("1.234"), Some(1234.0));
        assert_eq!(cleaner.parse_currency("-1.500"), Some(-1500.0));
        // 非三位 → 小数点
        assert_eq!(cleaner.parse_currency("12.5"), Some(12.5));
        assert_eq!(cleaner.parse_currency("1234.567"), Some(1234.567));
        assert_eq!(cleaner.parse_currency("1.2.3"), None);

        let parsed = cleaner.parse_currency("€ 1.500").unwrap();
        assert_eq!(cleaner.format_currency(parsed), "€ 1.500,00");
    }

    #[test]
    fn test_parse_currency_english_and_plain() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_currency("1,234.56"), Some(1234.56));
        assert_eq!(cleaner.parse_currency("1234.56"), Some(1234.56));
    }

    #[test]
    fn test_parse_currency_invalid_is_none() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_currency(""), None);
        assert_eq!(cleaner.parse_currency("   "), None);
        assert_eq!(cleaner.parse_currency("n.d."), None);
        assert_eq!(cleaner.parse_currency("€"), None);
        assert_eq!(cleaner.parse_currency("NaN"), None);
    }

    #[test]
    fn test_format_currency() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.format_currency(1234.56), "€ 1.234,56");
        assert_eq!(cleaner.format_currency(0.0), "€ 0,00");
        assert_eq!(cleaner.format_currency(1_000_000.0), "€ 1.000.000,00");
        assert_eq!(cleaner.format_currency(-42.5), "€ -42,50");
        assert_eq!(cleaner.format_currency(999.999), "€ 1.000,00");
    }

    #[test]
    fn test_currency_round_trip() {
        let cleaner = DataCleaner;
        let parsed = cleaner.parse_currency("€ 1.234,56").unwrap();
        assert_eq!(cleaner.format_currency(parsed), "€ 1.234,56");

        // 数量用逗号小数，回读不会被当作千分位
        assert_eq!(cleaner.format_quantity(12.125), "12,125");
        assert_eq!(cleaner.parse_currency(&cleaner.format_quantity(12.125)), Some(12.125));
        assert_eq!(cleaner.format_quantity(1500.0), "1500");
    }

    #[test]
    fn test_date_three_shapes_agree() {
        let cleaner = DataCleaner;
        let expected = Some(ymd(2024, 1, 15));

        let serial = CellValue::Number(45306.0);
        let native = CellValue::DateTime(ymd(2024, 1, 15).and_hms_opt(0, 0, 0).unwrap());
        let text = CellValue::Text("15-gen-2024".to_string());

        assert_eq!(cleaner.parse_date(&serial), expected);
        assert_eq!(cleaner.parse_date(&native), expected);
        assert_eq!(cleaner.parse_date(&text), expected);
    }

    #[test]
    fn test_parse_date_text_variants() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_date_text("15/01/2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(cleaner.parse_date_text("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(cleaner.parse_date_text("2024-01-15 08:30:00"), Some(ymd(2024, 1, 15)));
        assert_eq!(cleaner.parse_date_text("3 MAG 2025"), Some(ymd(2025, 5, 3)));
        assert_eq!(cleaner.parse_date_text("12 dicembre 2024"), Some(ymd(2024, 12, 12)));
        assert_eq!(cleaner.parse_date_text("01-set-24"), Some(ymd(2024, 9, 1)));
        assert_eq!(cleaner.parse_date_text("15/01/24"), Some(ymd(2024, 1, 15)));
        assert_eq!(cleaner.parse_date_text("45306"), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_parse_date_day_first() {
        let cleaner = DataCleaner;
        // 03/04 按日在前 → 4 月 3 日
        assert_eq!(cleaner.parse_date_text("03/04/2024"), Some(ymd(2024, 4, 3)));
    }

    #[test]
    fn test_parse_date_invalid_is_none() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_date_text(""), None);
        assert_eq!(cleaner.parse_date_text("domani"), None);
        assert_eq!(cleaner.parse_date_text("31/02/2024"), None);
        assert_eq!(cleaner.parse_date(&CellValue::Number(-5.0)), None);
        assert_eq!(cleaner.parse_date(&CellValue::Number(f64::NAN)), None);
        assert_eq!(cleaner.parse_date(&CellValue::Empty), None);
    }

    #[test]
    fn test_serial_fraction_is_time_of_day() {
        let dt = serial_to_datetime(45306.5).unwrap();
        assert_eq!(dt.date(), ymd(2024, 1, 15));
        assert_eq!(dt.format("%H:%M").to_string(), "12:00");
        assert_eq!(datetime_to_serial(&dt), Some(45306.5));
    }

    #[test]
    fn test_format_date() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.format_date(ymd(2024, 1, 5)), "05/01/2024");
        assert_eq!(cleaner.format_optional_date(None), "");
    }

    #[test]
    fn test_integer_like() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.integer_like(&CellValue::Number(4500012345.0)), "4500012345");
        assert_eq!(cleaner.integer_like(&CellValue::Number(10.5)), "10.5");
        assert_eq!(cleaner.integer_like(&CellValue::Text(" 10.0 ".to_string())), "10");
        assert_eq!(cleaner.integer_like(&CellValue::Text("00010".to_string())), "00010");
        assert_eq!(cleaner.integer_like(&CellValue::Text("A-10".to_string())), "A-10");
        assert_eq!(cleaner.integer_like(&CellValue::Empty), "");
    }
}
