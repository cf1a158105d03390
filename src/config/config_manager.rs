// ==========================================
// 生产计划系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写、快照
// 存储: 扁平 JSON 键值文件（key → value）
// ==========================================
// 路径优先级: --config > 环境变量 PRODUCTION_PLANNER_CONFIG
//            > {config_dir}/production-planner/config.json
// ==========================================

use crate::config::schedule_config_trait::ScheduleConfigReader;
use crate::domain::types::{CalendarMode, OutputMode};
use crate::engine::orderbook::OrderbookColumns;
use crate::engine::queue_scheduler::StepDurations;
use crate::importer::status_mapper::STATUS_SHEET_NAME;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "PRODUCTION_PLANNER_CONFIG";

/// 快照元数据键前缀（只导出，不回写）
const META_PREFIX: &str = "__meta_";
const META_VERSION_KEY: &str = "__meta_version";

// ==========================================
// ConfigError
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读写失败: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件格式错误: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置文件路径未设置")]
    NoPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: HashMap<String, String>,
    path: Option<PathBuf>,
}

impl ConfigManager {
    /// 加载配置
    ///
    /// # 参数
    /// - explicit: 命令行指定的路径（优先）
    ///
    /// # 说明
    /// 文件不存在时使用内置默认值（不报错）；文件存在但不可读或格式错误 → Err
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);

        if !path.exists() {
            tracing::info!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Ok(Self {
                values: HashMap::new(),
                path: Some(path),
            });
        }

        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let values = parse_flat_json(&raw)?;
        tracing::info!(path = %path.display(), keys = values.len(), "配置已加载");

        Ok(Self {
            values,
            path: Some(path),
        })
    }

    /// 纯默认配置（不关联文件）
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// 由内存键值构造（测试与嵌入使用）
    pub fn from_values(values: HashMap<String, String>) -> Self {
        Self { values, path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 读取配置值
    pub fn get_config_value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// 读取配置值，带默认值
    pub fn get_config_or_default(&self, key: &str, default: &str) -> String {
        self.get_config_value(key)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    /// 覆写配置值（仅内存，需 save 落盘）
    pub fn set_config_value(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// 获取所有配置的快照（JSON 格式，键有序）
    ///
    /// # 用途
    /// - 写入运行日志，便于复现一次排产
    /// - `config show` 导出，`config restore` 导入
    ///
    /// 附带 "__meta_version"（程序版本），恢复时不回写
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let mut ordered: BTreeMap<&str, &str> = self
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        ordered.insert(META_VERSION_KEY, crate::VERSION);
        Ok(serde_json::to_string(&ordered)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// 恢复的配置项数量（以 "__meta_" 开头的键不回写）
    pub fn restore_config_from_snapshot(&mut self, snapshot_json: &str) -> ConfigResult<usize> {
        let snapshot = parse_flat_json(snapshot_json)?;

        let mut count = 0;
        for (key, value) in snapshot {
            if key.starts_with(META_PREFIX) {
                continue;
            }
            self.values.insert(key, value);
            count += 1;
        }
        Ok(count)
    }

    /// 保存到加载时的路径（整文件覆盖）
    pub fn save(&self) -> ConfigResult<()> {
        let path = self.path.as_deref().ok_or(ConfigError::NoPath)?;
        self.save_to(path)
    }

    fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let ordered: BTreeMap<&String, &String> = self.values.iter().collect();
        let json = serde_json::to_string_pretty(&ordered)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// 正整数配置，格式错误时告警并回退默认值
    fn get_u32_or_default(&self, key: &str, default: u32) -> u32 {
        let value = self.get_config_or_default(key, &default.to_string());
        value.trim().parse::<u32>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %value, default, "配置值格式错误，使用默认值");
            default
        })
    }
}

// ==========================================
// ScheduleConfigReader 实现
// ==========================================
impl ScheduleConfigReader for ConfigManager {
    fn get_step_durations(&self) -> StepDurations {
        let defaults = StepDurations::default();
        StepDurations {
            work: self.get_u32_or_default(config_keys::DURATION_WORK_DAYS, defaults.work),
            treatment: self
                .get_u32_or_default(config_keys::DURATION_TREATMENT_DAYS, defaults.treatment),
            external: self
                .get_u32_or_default(config_keys::DURATION_EXTERNAL_DAYS, defaults.external),
            quality_control: self.get_u32_or_default(
                config_keys::DURATION_QUALITY_CONTROL_DAYS,
                defaults.quality_control,
            ),
            packaging: self
                .get_u32_or_default(config_keys::DURATION_PACKAGING_DAYS, defaults.packaging),
        }
    }

    fn get_calendar_mode(&self) -> CalendarMode {
        let value = self.get_config_or_default(config_keys::CALENDAR_MODE, "CALENDAR");
        CalendarMode::from_str(&value)
    }

    fn get_output_mode(&self) -> OutputMode {
        let value = self.get_config_or_default(config_keys::OUTPUT_MODE, "CONSOLIDATED");
        OutputMode::from_str(&value)
    }

    fn get_csv_delimiter(&self) -> u8 {
        let value = self.get_config_or_default(config_keys::CSV_DELIMITER, ";");
        match value.as_str() {
            "\\t" | "tab" | "TAB" => b'\t',
            v if v.len() == 1 && v.is_ascii() => v.as_bytes()[0],
            _ => {
                tracing::warn!(
                    config_key = config_keys::CSV_DELIMITER,
                    raw_value = %value,
                    "分隔符必须为单个 ASCII 字符，使用 ';'"
                );
                b';'
            }
        }
    }

    fn get_output_dir(&self) -> PathBuf {
        PathBuf::from(self.get_config_or_default(config_keys::OUTPUT_DIR, "."))
    }

    fn get_status_sheet_name(&self) -> String {
        self.get_config_or_default(config_keys::STATUS_SHEET_NAME, STATUS_SHEET_NAME)
    }

    fn get_orderbook_columns(&self) -> OrderbookColumns {
        let defaults = OrderbookColumns::default();
        OrderbookColumns {
            material: self
                .get_config_or_default(config_keys::ORDERBOOK_MATERIAL_COLUMN, &defaults.material),
            oda: self.get_config_or_default(config_keys::ORDERBOOK_ODA_COLUMN, &defaults.oda),
            position: self
                .get_config_or_default(config_keys::ORDERBOOK_POSITION_COLUMN, &defaults.position),
            eta_out: self
                .get_config_or_default(config_keys::ORDERBOOK_ETA_COLUMN, &defaults.eta_out),
            status_out: self
                .get_config_or_default(config_keys::ORDERBOOK_STATUS_COLUMN, &defaults.status_out),
        }
    }
}

/// 默认配置文件路径
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("production-planner").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("production_planner.json"))
}

/// 扁平 JSON 对象 → 字符串键值（非字符串值取其 JSON 文本）
fn parse_flat_json(raw: &str) -> ConfigResult<HashMap<String, String>> {
    let object: HashMap<String, serde_json::Value> = serde_json::from_str(raw)?;
    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 日历 / 输出
    pub const CALENDAR_MODE: &str = "calendar_mode";
    pub const OUTPUT_MODE: &str = "output_mode";
    pub const OUTPUT_DIR: &str = "output_dir";
    pub const CSV_DELIMITER: &str = "csv_delimiter";

    // 工序时长（天）
    pub const DURATION_WORK_DAYS: &str = "duration_work_days";
    pub const DURATION_TREATMENT_DAYS: &str = "duration_treatment_days";
    pub const DURATION_EXTERNAL_DAYS: &str = "duration_external_days";
    pub const DURATION_QUALITY_CONTROL_DAYS: &str = "duration_quality_control_days";
    pub const DURATION_PACKAGING_DAYS: &str = "duration_packaging_days";

    // 订单簿回填
    pub const STATUS_SHEET_NAME: &str = "status_sheet_name";
    pub const ORDERBOOK_MATERIAL_COLUMN: &str = "orderbook_material_column";
    pub const ORDERBOOK_ODA_COLUMN: &str = "orderbook_oda_column";
    pub const ORDERBOOK_POSITION_COLUMN: &str = "orderbook_position_column";
    pub const ORDERBOOK_ETA_COLUMN: &str = "orderbook_eta_column";
    pub const ORDERBOOK_STATUS_COLUMN: &str = "orderbook_status_column";
}
