// ==========================================
// 生产计划系统 - 领域类型定义
// ==========================================
// 职责: 工序状态 / 工序类型 / 日历模式 / 输出模式
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工序状态 (Step Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE
// 显示格式: 意大利语标签（与计划文件一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Scheduled,      // 已计划
    InProduction,   // 生产中
    QualityControl, // 质检
    Undefined,      // 未定义
    Completed,      // 已完成
    InProgress,     // 进行中
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Scheduled => write!(f, "Pianificato"),
            StepStatus::InProduction => write!(f, "In produzione"),
            StepStatus::QualityControl => write!(f, "Controllo qualità"),
            StepStatus::Undefined => write!(f, "Non definito"),
            StepStatus::Completed => write!(f, "Completato"),
            StepStatus::InProgress => write!(f, "In corso"),
        }
    }
}

impl StepStatus {
    /// 从自由文本解析状态（大小写 / 空白 / 重音 / 同义词折叠）
    ///
    /// # 规则
    /// - "in lavorazione" 与 "in produzione" 归为同一桶
    /// - 无法识别（含空串）→ Undefined
    pub fn normalize(raw: &str) -> Self {
        let folded = fold_label(raw);
        match folded.as_str() {
            "pianificato" | "pianificata" | "programmato" | "programmata" | "schedulato"
            | "scheduled" => StepStatus::Scheduled,
            "in produzione" | "in lavorazione" | "produzione" | "lavorazione"
            | "in production" | "in_production" => StepStatus::InProduction,
            "controllo qualita" | "cq" | "qc" | "collaudo" | "quality control"
            | "quality_control" => StepStatus::QualityControl,
            "completato" | "completata" | "concluso" | "conclusa" | "chiuso" | "completed"
            | "done" => StepStatus::Completed,
            "in corso" | "avviato" | "avviata" | "in progress" | "in_progress" => {
                StepStatus::InProgress
            }
            _ => StepStatus::Undefined,
        }
    }

    /// 图表分组标签（状态桶）
    pub fn bucket(&self) -> &'static str {
        match self {
            StepStatus::Scheduled => "Pianificato",
            StepStatus::InProduction => "In Produzione",
            StepStatus::QualityControl => "Controllo Qualità",
            StepStatus::Undefined => "Non Definito",
            StepStatus::Completed => "Completato",
            StepStatus::InProgress => "In Corso",
        }
    }
}

/// 小写 + 去重音 + 压缩空白
fn fold_label(raw: &str) -> String {
    let lowered: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'á' => 'a',
            'è' | 'é' => 'e',
            'ì' | 'í' => 'i',
            'ò' | 'ó' => 'o',
            'ù' | 'ú' => 'u',
            other => other,
        })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ==========================================
// 工序类型 (Step Kind)
// ==========================================
// 发射顺序: 加工 → 热处理 → 外协 → 质检 → 包装
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
    Work,           // 加工
    Treatment,      // 热处理/表面处理
    External,       // 外协加工
    QualityControl, // 质检
    Packaging,      // 包装
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.activity_label())
    }
}

impl StepKind {
    /// 计划文件中的活动名称
    pub fn activity_label(&self) -> &'static str {
        match self {
            StepKind::Work => "Lavorazione",
            StepKind::Treatment => "Trattamento",
            StepKind::External => "Lavorazione esterna",
            StepKind::QualityControl => "Controllo qualità",
            StepKind::Packaging => "Imballaggio",
        }
    }

    /// 是否允许填写供应商
    pub fn accepts_supplier(&self) -> bool {
        matches!(self, StepKind::Treatment | StepKind::External)
    }

    /// 从活动名称推断工序类型（手工录入用）
    pub fn infer_from_activity(activity: &str) -> Option<Self> {
        let folded = fold_label(activity);
        if folded.contains("estern") || folded.contains("outsourc") {
            Some(StepKind::External)
        } else if folded.contains("trattament") {
            Some(StepKind::Treatment)
        } else if folded.contains("controllo") || folded == "cq" || folded == "qc" {
            Some(StepKind::QualityControl)
        } else if folded.contains("imball") {
            Some(StepKind::Packaging)
        } else if folded.contains("lavorazion") {
            Some(StepKind::Work)
        } else {
            None
        }
    }
}

/// 活动是否允许供应商（热处理 / 外协 / 精整）
pub fn activity_accepts_supplier(activity: &str) -> bool {
    if fold_label(activity).contains("finitur") {
        return true;
    }
    StepKind::infer_from_activity(activity)
        .map(|kind| kind.accepts_supplier())
        .unwrap_or(false)
}

// ==========================================
// 日历模式 (Calendar Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalendarMode {
    Calendar,     // 自然日
    BusinessDays, // 工作日（跳过周六周日）
}

impl fmt::Display for CalendarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarMode::Calendar => write!(f, "CALENDAR"),
            CalendarMode::BusinessDays => write!(f, "BUSINESS_DAYS"),
        }
    }
}

impl CalendarMode {
    /// 从字符串解析（未知值 → Calendar）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BUSINESS_DAYS" | "BUSINESS" | "LAVORATIVI" => CalendarMode::BusinessDays,
            _ => CalendarMode::Calendar,
        }
    }
}

// ==========================================
// 输出模式 (Output Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputMode {
    Consolidated, // 每次运行一个文件
    PerMachine,   // 每台机器一个文件
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Consolidated => write!(f, "CONSOLIDATED"),
            OutputMode::PerMachine => write!(f, "PER_MACHINE"),
        }
    }
}

impl OutputMode {
    /// 从字符串解析（未知值 → Consolidated）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PER_MACHINE" | "MACHINE" => OutputMode::PerMachine,
            _ => OutputMode::Consolidated,
        }
    }
}
