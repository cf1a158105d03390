// ==========================================
// 生产计划系统 - 核心库
// ==========================================
// 职责: 订单导入 / 机台排队 / 交期估算 / 订单簿回填
// 技术栈: Rust + calamine + csv + rust_xlsxwriter
// 系统定位: 计划员桌面工具（人工最终控制权）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 外部表格
pub mod importer;

// 引擎层 - 业务规则
pub mod engine;

// 数据仓储层 - 文件读写
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// API 层 - 业务用例
pub mod api;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CalendarMode, OutputMode, StepKind, StepStatus};

// 领域实体
pub use domain::{CellValue, MatchKey, OrderLine, PlannedStep, ScheduleRequest, SheetGrid};

// 引擎
pub use engine::{
    CompileStats, EtaEstimator, OrderbookCompiler, QueueScheduler, StepDurations, Timeline,
    TimelineBuilder, WorkCalendar,
};

// API
pub use api::{ApiError, ApiResult, PlanningApi, ScheduleRunOptions};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产计划系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
