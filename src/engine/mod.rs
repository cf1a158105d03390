// ==========================================
// 生产计划系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎（排队 / 交期 / 订单簿回填 / 时间轴）
// 红线: 引擎不做文件读写，输入输出均为内存数据
// ==========================================

pub mod calendar;
pub mod eta;
pub mod orderbook;
pub mod queue_scheduler;
pub mod timeline;

// 重导出核心引擎
pub use calendar::WorkCalendar;
pub use eta::{EtaEstimator, EtaRange};
pub use orderbook::{CompileStats, OrderbookColumns, OrderbookCompiler, PlannerEntry, PlannerMap};
pub use queue_scheduler::{QueueScheduler, StepDurations};
pub use timeline::{Timeline, TimelineBar, TimelineBuilder, TimelineLane};
