// ==========================================
// 生产计划系统 - 工作日历
// ==========================================
// 职责: 按自然日 / 工作日推进日期
// 工作日: 周一至周五；周六、周日不计入推进
// ==========================================

use crate::domain::types::CalendarMode;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkCalendar {
    mode: CalendarMode,
}

impl WorkCalendar {
    pub fn new(mode: CalendarMode) -> Self {
        Self { mode }
    }

    /// 是否为工作日（自然日模式下每天都是）
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        match self.mode {
            CalendarMode::Calendar => true,
            CalendarMode::BusinessDays => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        }
    }

    /// 推进 n 天
    ///
    /// # 规则
    /// - 自然日: date + n
    /// - 工作日: 每次 +1 天，落在周末则继续顺延，仅工作日计入进度
    ///   （周五 +1 → 周一，周六 +1 → 周一）
    pub fn advance(&self, from: NaiveDate, days: u32) -> NaiveDate {
        match self.mode {
            CalendarMode::Calendar => from + Duration::days(i64::from(days)),
            CalendarMode::BusinessDays => {
                let mut current = from;
                for _ in 0..days {
                    current += Duration::days(1);
                    while !self.is_working_day(current) {
                        current += Duration::days(1);
                    }
                }
                current
            }
        }
    }

    /// 对齐到工作日（周末顺延到下周一；自然日模式原样返回）
    pub fn align(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while !self.is_working_day(current) {
            current += Duration::days(1);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_advance() {
        let cal = WorkCalendar::new(CalendarMode::Calendar);
        // 2024-01-19 为周五
        assert_eq!(cal.advance(ymd(2024, 1, 19), 3), ymd(2024, 1, 22));
        assert_eq!(cal.advance(ymd(2024, 1, 19), 0), ymd(2024, 1, 19));
    }

    #[test]
    fn test_business_advance_skips_weekend() {
        let cal = WorkCalendar::new(CalendarMode::BusinessDays);
        // 周五 +1 → 周一
        assert_eq!(cal.advance(ymd(2024, 1, 19), 1), ymd(2024, 1, 22));
        // 周六 +1 → 周一
        assert_eq!(cal.advance(ymd(2024, 1, 20), 1), ymd(2024, 1, 22));
        // 周日 +1 → 周一
        assert_eq!(cal.advance(ymd(2024, 1, 21), 1), ymd(2024, 1, 22));
        // 周三 +3 → 下周一
        assert_eq!(cal.advance(ymd(2024, 1, 17), 3), ymd(2024, 1, 22));
        // 周一 +10 → 两周后周一
        assert_eq!(cal.advance(ymd(2024, 1, 22), 10), ymd(2024, 2, 5));
    }

    #[test]
    fn test_align() {
        let business = WorkCalendar::new(CalendarMode::BusinessDays);
        assert_eq!(business.align(ymd(2024, 1, 20)), ymd(2024, 1, 22));
        assert_eq!(business.align(ymd(2024, 1, 22)), ymd(2024, 1, 22));

        let calendar = WorkCalendar::new(CalendarMode::Calendar);
        assert_eq!(calendar.align(ymd(2024, 1, 20)), ymd(2024, 1, 20));
    }
}
