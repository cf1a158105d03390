// ==========================================
// 生产计划系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供命令行入口调用
// ==========================================

pub mod error;
pub mod planning_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ValidationViolation};
pub use planning_api::{
    CompileOrderbookResponse, PlanningApi, ScheduleRunOptions, ScheduleRunResponse,
};
pub use validator::ManualStepValidator;
