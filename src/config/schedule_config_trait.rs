// ==========================================
// 生产计划系统 - 排产配置读取 Trait
// ==========================================
// 职责: 定义排产 / 输出 / 订单簿回填所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{CalendarMode, OutputMode};
use crate::engine::orderbook::OrderbookColumns;
use crate::engine::queue_scheduler::StepDurations;
use std::path::PathBuf;

// ==========================================
// ScheduleConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 JSON 键值文件读取）
// 约定: 缺失或格式错误的值一律回退默认值，不返回错误
pub trait ScheduleConfigReader: Send + Sync {
    // ===== 机台排队 =====

    /// 工序时长表
    ///
    /// # 默认值
    /// - 加工 3 / 热处理 10 / 外协 10 / 质检 2 / 包装 1（天）
    fn get_step_durations(&self) -> StepDurations;

    /// 日历模式
    ///
    /// # 默认值
    /// - CALENDAR
    fn get_calendar_mode(&self) -> CalendarMode;

    // ===== 输出 =====

    /// 计划文件输出模式
    ///
    /// # 默认值
    /// - CONSOLIDATED
    fn get_output_mode(&self) -> OutputMode;

    /// 计划文件分隔符
    ///
    /// # 默认值
    /// - ';'
    fn get_csv_delimiter(&self) -> u8;

    /// 输出目录
    fn get_output_dir(&self) -> PathBuf;

    // ===== 订单簿回填 =====

    /// 订单状态导出的工作表名
    ///
    /// # 默认值
    /// - ORDINI
    fn get_status_sheet_name(&self) -> String;

    /// 订单簿列位置
    ///
    /// # 默认值
    /// - A / E / F 读取，X / AF 写入
    fn get_orderbook_columns(&self) -> OrderbookColumns;
}
