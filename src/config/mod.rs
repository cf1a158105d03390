// ==========================================
// 生产计划系统 - 配置层
// ==========================================
// 职责: 系统配置管理，缺省值内置，文件覆写
// 存储: JSON 键值文件
// ==========================================

pub mod config_manager;
pub mod schedule_config_trait;

// 重导出核心配置管理器
pub use config_manager::{
    config_keys, default_config_path, ConfigError, ConfigManager, ConfigResult, CONFIG_ENV_VAR,
};
pub use schedule_config_trait::ScheduleConfigReader;
