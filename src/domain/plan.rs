// ==========================================
// 生产计划系统 - 计划工序领域模型
// ==========================================
// 职责: 计划工序记录 / 完成度-状态不变式 / 排队请求
// 不变式: completion = 100 ⇔ status = Completed
// ==========================================

use crate::domain::order::OrderLine;
use crate::domain::types::{activity_accepts_supplier, StepStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// PlannedStep - 计划工序
// ==========================================
// 来源: 手工录入 / 机台排队生成 / 已有计划文件
// 编辑: 整行覆盖（最后一次保存生效）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    // ===== 订单元数据（透传）=====
    pub order: OrderLine,

    // ===== 排产信息 =====
    pub machine: String,                 // Macchina
    pub activity: String,                // Attività
    pub start_date: Option<NaiveDate>,   // Data inizio
    pub end_date: Option<NaiveDate>,     // Data fine

    // ===== 进度 =====
    pub status: StepStatus,              // Stato
    pub completion: u8,                  // Completamento（0-100）

    // ===== 外部资源 =====
    pub supplier: Option<String>,        // Fornitore（仅热处理/外协/精整）
    pub operator: Option<String>,        // Operatore
}

impl PlannedStep {
    pub fn new(order: OrderLine, machine: &str, activity: &str) -> Self {
        Self {
            order,
            machine: machine.trim().to_string(),
            activity: activity.trim().to_string(),
            start_date: None,
            end_date: None,
            status: StepStatus::Scheduled,
            completion: 0,
            supplier: None,
            operator: None,
        }
    }

    /// 完成度与状态的统一规范化（幂等）
    ///
    /// # 规则
    /// 1. 状态为 Completed → 完成度置 100
    /// 2. 否则完成度为 100 → 状态置 Completed
    ///
    /// 完成度已在类型层面限制为 u8，这里再截断到 100
    pub fn normalize_progress(&mut self) {
        self.completion = self.completion.min(100);
        if self.status == StepStatus::Completed {
            self.completion = 100;
        } else if self.completion == 100 {
            self.status = StepStatus::Completed;
        }
    }

    /// 记录级规范化: 进度不变式 + 供应商适用性 + 空白清理
    pub fn normalize(&mut self) {
        self.normalize_progress();

        self.supplier = self
            .supplier
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if self.supplier.is_some() && !activity_accepts_supplier(&self.activity) {
            tracing::debug!(
                activity = %self.activity,
                "活动不允许供应商，已清除"
            );
            self.supplier = None;
        }

        self.operator = self
            .operator
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }
}

/// 完成度数值 → 0-100 整数（四舍五入截断），缺失 → 0
pub fn parse_completion(raw: Option<f64>) -> u8 {
    match raw {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

// ==========================================
// ScheduleRequest - 机台排队请求
// ==========================================
// 用途: 一次 "Programmazione" 生成请求（命令行参数或 JSON 批量文件）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub material_code: String,
    #[serde(default)]
    pub purchase_order: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    pub machine: String,
    #[serde(default)]
    pub work_steps: u32,
    #[serde(default)]
    pub treatment_steps: u32,
    #[serde(default)]
    pub external_steps: u32,
    #[serde(default)]
    pub quality_control: bool,
    #[serde(default)]
    pub packaging: bool,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
}

/// 单个请求允许生成的最大工序数
pub const MAX_STEPS_PER_REQUEST: usize = 100;

impl ScheduleRequest {
    /// 请求将生成的工序数（饱和加法，不溢出）
    pub fn step_count(&self) -> usize {
        [self.work_steps, self.treatment_steps, self.external_steps]
            .iter()
            .map(|n| *n as usize)
            .fold(0usize, usize::saturating_add)
            .saturating_add(usize::from(self.quality_control))
            .saturating_add(usize::from(self.packaging))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(status: StepStatus, completion: u8) -> PlannedStep {
        let mut s = PlannedStep::new(OrderLine::bare("MAT-01"), "CNC-1", "Lavorazione 1");
        s.status = status;
        s.completion = completion;
        s
    }

    #[test]
    fn test_completion_100_forces_completed() {
        let mut s = step(StepStatus::InProduction, 100);
        s.normalize_progress();
        assert_eq!(s.status, StepStatus::Completed);
        assert_eq!(s.completion, 100);
    }

    #[test]
    fn test_completed_forces_completion_100() {
        let mut s = step(StepStatus::Completed, 40);
        s.normalize_progress();
        assert_eq!(s.completion, 100);
    }

    #[test]
    fn test_normalize_progress_is_idempotent() {
        for status in [
            StepStatus::Scheduled,
            StepStatus::InProduction,
            StepStatus::Completed,
            StepStatus::Undefined,
        ] {
            for completion in [0u8, 50, 100, 180] {
                let mut once = step(status, completion);
                once.normalize_progress();
                let mut twice = once.clone();
                twice.normalize_progress();
                assert_eq!(once, twice);
                assert_eq!(once.completion == 100, once.status == StepStatus::Completed);
            }
        }
    }

    #[test]
    fn test_supplier_dropped_for_plain_work() {
        let mut s = step(StepStatus::Scheduled, 0);
        s.supplier = Some("Zincatura Srl".to_string());
        s.normalize();
        assert_eq!(s.supplier, None);

        let mut t = PlannedStep::new(OrderLine::bare("MAT-01"), "FORNO", "Trattamento 1");
        t.supplier = Some("  Zincatura Srl ".to_string());
        t.normalize();
        assert_eq!(t.supplier.as_deref(), Some("Zincatura Srl"));
    }

    #[test]
    fn test_parse_completion() {
        assert_eq!(parse_completion(Some(60.4)), 60);
        assert_eq!(parse_completion(Some(-3.0)), 0);
        assert_eq!(parse_completion(Some(250.0)), 100);
        assert_eq!(parse_completion(None), 0);
    }

    #[test]
    fn test_request_step_count_and_json_defaults() {
        let json = r#"{"material_code":"MAT-01","machine":"CNC-1","work_steps":2,"packaging":true}"#;
        let req: ScheduleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.step_count(), 3);
        assert_eq!(req.treatment_steps, 0);
        assert!(!req.quality_control);
    }

    #[test]
    fn test_step_count_does_not_overflow() {
        let json = r#"{"material_code":"MAT-01","machine":"CNC-1",
            "work_steps":4294967295,"treatment_steps":4294967295,"external_steps":4294967295,
            "quality_control":true}"#;
        let req: ScheduleRequest = serde_json::from_str(json).unwrap();
        assert!(req.step_count() > MAX_STEPS_PER_REQUEST);
    }
}
