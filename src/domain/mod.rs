// ==========================================
// 生产计划系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、记录级规则
// 红线: 不含文件访问逻辑,不含引擎逻辑
// ==========================================

pub mod order;
pub mod plan;
pub mod sheet;
pub mod types;

// 重导出核心类型
pub use order::{MatchKey, OrderLine};
pub use plan::{parse_completion, PlannedStep, ScheduleRequest, MAX_STEPS_PER_REQUEST};
pub use sheet::{column_index, CellValue, SheetGrid};
pub use types::{activity_accepts_supplier, CalendarMode, OutputMode, StepKind, StepStatus};
