// ==========================================
// 生产计划系统 - 数据仓储层
// ==========================================
// 职责: 计划文件与订单簿输出的读写，屏蔽文件格式细节
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod error;
pub mod orderbook_repo;
pub mod plan_file_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use orderbook_repo::OrderbookRepository;
pub use plan_file_repo::{machine_slug, PlanFileRepository, PLAN_COLUMNS};
