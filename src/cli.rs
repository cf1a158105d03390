// ==========================================
// 生产计划系统 - 命令行参数定义
// ==========================================
// 工具: clap derive
// ==========================================

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use production_planner::domain::types::{CalendarMode, OutputMode};
use production_planner::importer::DataCleaner;
use std::path::PathBuf;

/// 生产计划系统 - 订单导入 / 机台排队 / 交期估算 / 订单簿回填
#[derive(Parser, Debug)]
#[command(name = "production-planner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// 全局参数
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// 输出 debug 级别日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 日志以 JSON 行输出
    #[arg(long, global = true)]
    pub log_json: bool,

    /// 配置文件路径（默认读取 PRODUCTION_PLANNER_CONFIG 或用户配置目录）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 按机台排队生成工序并写出计划文件
    Schedule(ScheduleArgs),

    /// 向计划文件追加一条手工工序
    AddStep(AddStepArgs),

    /// 覆写计划文件中的一行
    EditStep(EditStepArgs),

    /// 用订单状态导出回填订单簿（预计交期 + 状态）
    CompileOrderbook(CompileOrderbookArgs),

    /// 输出计划时间轴数据（JSON）
    Timeline(TimelineArgs),

    /// 估算单条预计交期
    Eta(EtaArgs),

    /// 查看 / 修改 / 恢复配置
    Config(ConfigArgs),
}

/// 日历模式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarArg {
    /// 自然日
    Calendar,
    /// 工作日（跳过周六周日）
    BusinessDays,
}

impl From<CalendarArg> for CalendarMode {
    fn from(arg: CalendarArg) -> Self {
        match arg {
            CalendarArg::Calendar => CalendarMode::Calendar,
            CalendarArg::BusinessDays => CalendarMode::BusinessDays,
        }
    }
}

/// 输出模式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputArg {
    /// 每次运行一个文件
    Consolidated,
    /// 每台机器一个文件
    PerMachine,
}

impl From<OutputArg> for OutputMode {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Consolidated => OutputMode::Consolidated,
            OutputArg::PerMachine => OutputMode::PerMachine,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// 订单导出文件（.xlsx / .xls / .ods / .csv）
    #[arg(long)]
    pub orders: Option<PathBuf>,

    /// 已有计划文件（用于初始化机台游标）
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// 批量请求 JSON 文件（请求数组，按顺序处理）
    #[arg(long, conflicts_with_all = ["material", "machine"])]
    pub requests: Option<PathBuf>,

    /// 物料号（单条请求）
    #[arg(long, requires = "machine")]
    pub material: Option<String>,

    /// 采购单号 ODA
    #[arg(long)]
    pub oda: Option<String>,

    /// 行号
    #[arg(long)]
    pub pos: Option<String>,

    /// 机台
    #[arg(long, requires = "material")]
    pub machine: Option<String>,

    /// 加工工序数
    #[arg(long, default_value_t = 0)]
    pub work: u32,

    /// 热处理工序数
    #[arg(long, default_value_t = 0)]
    pub treatment: u32,

    /// 外协工序数
    #[arg(long, default_value_t = 0)]
    pub external: u32,

    /// 追加质检工序
    #[arg(long)]
    pub qc: bool,

    /// 追加包装工序
    #[arg(long)]
    pub packaging: bool,

    /// 供应商（仅热处理 / 外协工序保留）
    #[arg(long)]
    pub supplier: Option<String>,

    /// 操作员
    #[arg(long)]
    pub operator: Option<String>,

    /// 日历模式（覆盖配置）
    #[arg(long, value_enum)]
    pub calendar: Option<CalendarArg>,

    /// 输出模式（覆盖配置）
    #[arg(long, value_enum)]
    pub output_mode: Option<OutputArg>,

    /// 输出目录（覆盖配置）
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// 排队起点日期（默认今天）
    #[arg(long, value_parser = parse_cli_date)]
    pub today: Option<NaiveDate>,
}

/// 手工工序字段
#[derive(Args, Debug, Clone)]
pub struct StepFields {
    /// 物料号
    #[arg(long)]
    pub material: String,

    /// 采购单号 ODA
    #[arg(long, default_value = "")]
    pub oda: String,

    /// 行号
    #[arg(long, default_value = "")]
    pub pos: String,

    /// 机台
    #[arg(long)]
    pub machine: String,

    /// 活动名称（如 Lavorazione / Trattamento）
    #[arg(long)]
    pub activity: String,

    /// 开始日期（DD/MM/YYYY 或 YYYY-MM-DD）
    #[arg(long, value_parser = parse_cli_date)]
    pub start: Option<NaiveDate>,

    /// 结束日期
    #[arg(long, value_parser = parse_cli_date)]
    pub end: Option<NaiveDate>,

    /// 状态（自由文本，自动归一）
    #[arg(long, default_value = "Pianificato")]
    pub status: String,

    /// 完成度 0-100
    #[arg(long, default_value_t = 0.0)]
    pub completion: f64,

    /// 供应商
    #[arg(long)]
    pub supplier: Option<String>,

    /// 操作员
    #[arg(long)]
    pub operator: Option<String>,

    /// 订单导出文件（用于补全订单元数据）
    #[arg(long)]
    pub orders: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AddStepArgs {
    /// 计划文件（不存在时新建）
    #[arg(long)]
    pub plan: PathBuf,

    #[command(flatten)]
    pub step: StepFields,
}

#[derive(Args, Debug)]
pub struct EditStepArgs {
    /// 计划文件
    #[arg(long)]
    pub plan: PathBuf,

    /// 数据行序号（从 1 开始）
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub row: u32,

    #[command(flatten)]
    pub step: StepFields,
}

#[derive(Args, Debug)]
pub struct CompileOrderbookArgs {
    /// 订单状态导出（工作表 ORDINI，缺失时取第一个）
    #[arg(long)]
    pub status_export: PathBuf,

    /// 客户订单簿
    #[arg(long)]
    pub orderbook: PathBuf,

    /// 输出路径（默认 {output_dir}/orderbook_compilato_YYYYMMDD_HHMM.xlsx）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 基准日期缺失时使用的日期（默认今天）
    #[arg(long, value_parser = parse_cli_date)]
    pub today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// 计划文件
    #[arg(long)]
    pub plan: PathBuf,

    /// 格式化输出
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct EtaArgs {
    /// 匹配键 MATERIALE|ODA|POS
    #[arg(long)]
    pub key: String,

    /// 状态（如 SCAFFALE / OUTSOURCING）
    #[arg(long, default_value = "")]
    pub status: String,

    /// 基准日期
    #[arg(long, value_parser = parse_cli_date)]
    pub base: NaiveDate,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// 输出当前配置快照（JSON）
    Show,

    /// 设置一个配置项并写回配置文件
    Set {
        /// 配置键（如 calendar_mode / duration_work_days）
        key: String,
        value: String,
    },

    /// 从快照文件恢复配置并写回配置文件
    Restore {
        /// `config show` 导出的快照
        snapshot: PathBuf,
    },
}

/// 命令行日期解析（与表格日期同一套规则）
fn parse_cli_date(raw: &str) -> Result<NaiveDate, String> {
    DataCleaner
        .parse_date_text(raw)
        .ok_or_else(|| format!("无法识别的日期: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_schedule_single_request() {
        let cli = Cli::try_parse_from([
            "production-planner",
            "schedule",
            "--material",
            "MAT-01",
            "--machine",
            "TORNIO",
            "--work",
            "2",
            "--calendar",
            "business-days",
            "--today",
            "15/01/2024",
        ])
        .unwrap();

        match cli.command {
            Commands::Schedule(args) => {
                assert_eq!(args.work, 2);
                assert_eq!(args.calendar, Some(CalendarArg::BusinessDays));
                assert_eq!(args.today, NaiveDate::from_ymd_opt(2024, 1, 15));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_edit_step_row_starts_at_one() {
        let result = Cli::try_parse_from([
            "production-planner",
            "edit-step",
            "--plan",
            "plan.csv",
            "--row",
            "0",
            "--material",
            "MAT-01",
            "--machine",
            "TORNIO",
            "--activity",
            "Lavorazione",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from([
            "production-planner",
            "config",
            "set",
            "calendar_mode",
            "business_days",
        ])
        .unwrap();

        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Set { key, value },
            }) => {
                assert_eq!(key, "calendar_mode");
                assert_eq!(value, "business_days");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(parse_cli_date("domani").is_err());
        assert_eq!(parse_cli_date("5 gen 2024"), Ok(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()));
    }
}
