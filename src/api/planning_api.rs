// ==========================================
// 生产计划系统 - 计划 API
// ==========================================
// 职责: 封装排产 / 手工编辑 / 订单簿回填 / 时间轴 / 交期估算用例
// 调用方: 命令行入口
// ==========================================
// 红线: "今天" 与运行时间戳由调用方传入，API 内部不读系统时钟
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::ManualStepValidator;
use crate::config::ScheduleConfigReader;
use crate::domain::order::{MatchKey, OrderLine};
use crate::domain::plan::{PlannedStep, ScheduleRequest};
use crate::domain::types::{CalendarMode, OutputMode};
use crate::engine::eta::EtaEstimator;
use crate::engine::orderbook::{CompileStats, OrderbookCompiler};
use crate::engine::queue_scheduler::QueueScheduler;
use crate::engine::timeline::{Timeline, TimelineBuilder};
use crate::importer::field_mapper::{FieldMapper, OrderImport};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::status_mapper::StatusMapper;
use crate::repository::orderbook_repo::OrderbookRepository;
use crate::repository::plan_file_repo::PlanFileRepository;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// 请求 / 响应
// ==========================================

/// 一次排产运行的输入
#[derive(Debug, Clone)]
pub struct ScheduleRunOptions {
    /// 订单导出（可选；缺失时工序只携带物料号）
    pub order_export: Option<PathBuf>,
    /// 已有计划（可选；用于初始化机台游标，并写入本次输出）
    pub existing_plan: Option<PathBuf>,
    /// 按顺序处理的排队请求
    pub requests: Vec<ScheduleRequest>,
    pub today: NaiveDate,
    /// 覆盖配置中的日历模式
    pub calendar_mode: Option<CalendarMode>,
    /// 覆盖配置中的输出模式
    pub output_mode: Option<OutputMode>,
    /// 覆盖配置中的输出目录
    pub output_dir: Option<PathBuf>,
    /// 文件名时间戳（YYYYMMDD_HHMM）
    pub stamp: String,
}

/// 排产运行结果
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRunResponse {
    pub run_id: String,
    /// 本次新生成的工序
    pub generated: Vec<PlannedStep>,
    /// 已有计划中参与游标初始化的工序数
    pub seeded_steps: usize,
    /// 订单导出中找不到、仅以物料号生成的请求数
    pub unmatched_requests: usize,
    pub files: Vec<PathBuf>,
}

/// 订单簿回填结果
#[derive(Debug, Clone, Serialize)]
pub struct CompileOrderbookResponse {
    pub stats: CompileStats,
    pub planner_entries: usize,
    pub missing_base_date: usize,
    pub output_path: PathBuf,
}

// ==========================================
// PlanningApi
// ==========================================
pub struct PlanningApi {
    config: Arc<dyn ScheduleConfigReader>,
    parser: UniversalFileParser,
    field_mapper: FieldMapper,
    status_mapper: StatusMapper,
    validator: ManualStepValidator,
    estimator: EtaEstimator,
}

impl PlanningApi {
    pub fn new(config: Arc<dyn ScheduleConfigReader>) -> Self {
        Self {
            config,
            parser: UniversalFileParser,
            field_mapper: FieldMapper::new(),
            status_mapper: StatusMapper::new(),
            validator: ManualStepValidator::new(),
            estimator: EtaEstimator::new(),
        }
    }

    fn plan_repo(&self) -> PlanFileRepository {
        PlanFileRepository::new(self.config.get_csv_delimiter())
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 读取订单导出（.xlsx / .xls / .ods / .csv）
    pub fn load_order_lines(&self, path: &Path) -> ApiResult<OrderImport> {
        let grid = self.parser.parse(path, None)?;
        Ok(self
            .field_mapper
            .map_order_export(&grid, &path.display().to_string())?)
    }

    /// 读取计划文件
    pub fn load_plan(&self, path: &Path) -> ApiResult<Vec<PlannedStep>> {
        Ok(self.plan_repo().read_plan(path)?)
    }

    /// 读取计划文件；文件不存在视为空计划
    fn load_plan_or_empty(&self, path: &Path) -> ApiResult<Vec<PlannedStep>> {
        if path.exists() {
            self.load_plan(path)
        } else {
            Ok(Vec::new())
        }
    }

    // ==========================================
    // 机台排队
    // ==========================================

    /// 生成排产
    ///
    /// # 流程
    /// 1. 读取已有计划，初始化各机台游标
    /// 2. 按请求顺序逐个排队（同一运行内游标持续推进）
    /// 3. 已有计划 + 新工序按输出模式写出
    pub fn generate_schedule(&self, options: &ScheduleRunOptions) -> ApiResult<ScheduleRunResponse> {
        let run_id = Uuid::new_v4().to_string();
        let calendar_mode = options
            .calendar_mode
            .unwrap_or_else(|| self.config.get_calendar_mode());
        let output_mode = options
            .output_mode
            .unwrap_or_else(|| self.config.get_output_mode());
        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| self.config.get_output_dir());

        tracing::info!(
            run_id = %run_id,
            requests = options.requests.len(),
            calendar = %calendar_mode,
            output = %output_mode,
            today = %options.today,
            "排产运行开始"
        );

        for request in &options.requests {
            self.validator.validate_request(request)?;
        }

        let order_lines = match &options.order_export {
            Some(path) => self.load_order_lines(path)?.lines,
            None => Vec::new(),
        };
        let existing = match &options.existing_plan {
            Some(path) => self.load_plan(path)?,
            None => Vec::new(),
        };

        let mut scheduler =
            QueueScheduler::new(calendar_mode, self.config.get_step_durations(), options.today);
        let seeded_steps = scheduler.seed_from_plan(&existing);

        let lookup = OrderLookup::new(&order_lines);
        let mut generated = Vec::new();
        let mut unmatched_requests = 0;

        for request in &options.requests {
            let order = match lookup.resolve(request) {
                Some(line) => line.clone(),
                None => {
                    tracing::warn!(
                        run_id = %run_id,
                        material = %request.material_code,
                        "订单导出中未找到该物料，仅以物料号排产"
                    );
                    unmatched_requests += 1;
                    OrderLine::bare(&request.material_code)
                }
            };
            generated.extend(scheduler.schedule(&order, request));
        }

        let mut output = existing;
        output.extend(generated.iter().cloned());
        let files = self
            .plan_repo()
            .write_run(&output_dir, &output, output_mode, &options.stamp)?;

        tracing::info!(
            run_id = %run_id,
            generated = generated.len(),
            seeded = seeded_steps,
            unmatched = unmatched_requests,
            files = files.len(),
            "排产运行完成"
        );

        Ok(ScheduleRunResponse {
            run_id,
            generated,
            seeded_steps,
            unmatched_requests,
            files,
        })
    }

    // ==========================================
    // 手工编辑
    // ==========================================

    /// 追加手工工序（校验 + 规范化）
    pub fn add_manual_step(&self, plan: &mut Vec<PlannedStep>, mut step: PlannedStep) -> ApiResult<()> {
        step.normalize();
        self.validator.validate_step(&step)?;
        tracing::info!(
            material = %step.order.material_code,
            machine = %step.machine,
            activity = %step.activity,
            "手工工序已追加"
        );
        plan.push(step);
        Ok(())
    }

    /// 整行覆写（最后一次保存生效）
    pub fn overwrite_step(
        &self,
        plan: &mut [PlannedStep],
        index: usize,
        mut step: PlannedStep,
    ) -> ApiResult<()> {
        let rows = plan.len();
        let slot = plan
            .get_mut(index)
            .ok_or(ApiError::RowOutOfRange { index, rows })?;
        step.normalize();
        self.validator.validate_step(&step)?;
        *slot = step;
        tracing::info!(index, "工序已覆写");
        Ok(())
    }

    /// 追加手工工序并写回计划文件
    pub fn add_step_to_file(&self, plan_path: &Path, step: PlannedStep) -> ApiResult<Vec<PlannedStep>> {
        let mut plan = self.load_plan_or_empty(plan_path)?;
        self.add_manual_step(&mut plan, step)?;
        self.plan_repo().write_plan(plan_path, &plan)?;
        Ok(plan)
    }

    /// 覆写计划文件中的一行并写回
    pub fn overwrite_step_in_file(
        &self,
        plan_path: &Path,
        index: usize,
        step: PlannedStep,
    ) -> ApiResult<Vec<PlannedStep>> {
        let mut plan = self.load_plan(plan_path)?;
        self.overwrite_step(&mut plan, index, step)?;
        self.plan_repo().write_plan(plan_path, &plan)?;
        Ok(plan)
    }

    // ==========================================
    // 订单簿回填
    // ==========================================

    /// 用订单状态导出回填订单簿，写出新的 .xlsx
    ///
    /// # 参数
    /// - output: 输出路径；None → {output_dir}/orderbook_compilato_{now}.xlsx
    pub fn compile_orderbook(
        &self,
        status_export: &Path,
        orderbook: &Path,
        output: Option<&Path>,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> ApiResult<CompileOrderbookResponse> {
        let sheet_name = self.config.get_status_sheet_name();
        let status_grid = self.parser.parse(status_export, Some(&sheet_name))?;
        let status_rows = self
            .status_mapper
            .map_status_export(&status_grid, &status_export.display().to_string())?;

        // 回填第一张工作表，其余工作表原样带到输出
        let mut sheets = self.parser.parse_all(orderbook)?;
        let compiler = OrderbookCompiler::new(self.config.get_orderbook_columns());
        let planner_map = compiler.build_planner_map(&status_rows, today);
        let first = sheets.first_mut().ok_or_else(|| {
            ApiError::InvalidInput(format!("订单簿无工作表: {}", orderbook.display()))
        })?;
        let stats = compiler.compile(first, &planner_map);

        let output_path = match output {
            Some(path) => path.to_path_buf(),
            None => OrderbookRepository::default_output_path(&self.config.get_output_dir(), now),
        };
        OrderbookRepository::new().write_workbook(&output_path, &sheets)?;

        Ok(CompileOrderbookResponse {
            stats,
            planner_entries: planner_map.len(),
            missing_base_date: planner_map.missing_base_date,
            output_path,
        })
    }

    // ==========================================
    // 时间轴 / 交期
    // ==========================================

    pub fn build_timeline(&self, plan_path: &Path) -> ApiResult<Timeline> {
        let plan = self.load_plan(plan_path)?;
        Ok(TimelineBuilder::new().build(&plan))
    }

    /// 单条交期估算（match_key 形如 MATERIALE|ODA|POS）
    pub fn estimate_eta(&self, match_key: &str, status: &str, base_date: NaiveDate) -> NaiveDate {
        let seed_key = EtaEstimator::seed_key(match_key.trim(), status.trim(), base_date);
        self.estimator.estimate(base_date, status, &seed_key)
    }
}

/// 排队请求 → 订单行
///
/// 完整匹配键优先，其次同物料号的第一行
struct OrderLookup<'a> {
    by_key: HashMap<MatchKey, &'a OrderLine>,
    by_material: HashMap<&'a str, &'a OrderLine>,
}

impl<'a> OrderLookup<'a> {
    fn new(lines: &'a [OrderLine]) -> Self {
        let mut by_key = HashMap::new();
        let mut by_material = HashMap::new();
        for line in lines {
            by_key.entry(line.match_key()).or_insert(line);
            by_material.entry(line.material_code.as_str()).or_insert(line);
        }
        Self { by_key, by_material }
    }

    fn resolve(&self, request: &ScheduleRequest) -> Option<&'a OrderLine> {
        let key = MatchKey::new(
            &request.material_code,
            request.purchase_order.as_deref().unwrap_or(""),
            request.position.as_deref().unwrap_or(""),
        );
        if key.is_complete() {
            if let Some(line) = self.by_key.get(&key) {
                return Some(*line);
            }
        }
        self.by_material.get(key.material_code.as_str()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{config_keys, ConfigManager};
    use crate::domain::types::StepStatus;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn api_with(dir: &Path) -> PlanningApi {
        let mut values = HashMap::new();
        values.insert(
            config_keys::OUTPUT_DIR.to_string(),
            dir.display().to_string(),
        );
        PlanningApi::new(Arc::new(ConfigManager::from_values(values)))
    }

    fn request(material: &str, machine: &str, work: u32) -> ScheduleRequest {
        ScheduleRequest {
            material_code: material.to_string(),
            purchase_order: None,
            position: None,
            machine: machine.to_string(),
            work_steps: work,
            treatment_steps: 0,
            external_steps: 0,
            quality_control: false,
            packaging: false,
            supplier: None,
            operator: None,
        }
    }

    #[test]
    fn test_order_lookup_prefers_full_key() {
        let lines = vec![
            OrderLine {
                material_code: "MAT-01".to_string(),
                purchase_order: "4500".to_string(),
                position: "10".to_string(),
                description: "first".to_string(),
                ..Default::default()
            },
            OrderLine {
                material_code: "MAT-01".to_string(),
                purchase_order: "4500".to_string(),
                position: "20".to_string(),
                description: "second".to_string(),
                ..Default::default()
            },
        ];
        let lookup = OrderLookup::new(&lines);

        let mut req = request("MAT-01", "TORNIO", 1);
        req.purchase_order = Some("4500".to_string());
        req.position = Some("20".to_string());
        assert_eq!(lookup.resolve(&req).unwrap().description, "second");

        let fallback = request("MAT-01", "TORNIO", 1);
        assert_eq!(lookup.resolve(&fallback).unwrap().description, "first");
        assert!(lookup.resolve(&request("MAT-99", "TORNIO", 1)).is_none());
    }

    #[test]
    fn test_generate_schedule_without_order_export() {
        let dir = TempDir::new().unwrap();
        let api = api_with(dir.path());
        let options = ScheduleRunOptions {
            order_export: None,
            existing_plan: None,
            requests: vec![request("MAT-01", "TORNIO", 2), request("MAT-02", "TORNIO", 1)],
            today: ymd(2024, 1, 15),
            calendar_mode: None,
            output_mode: None,
            output_dir: None,
            stamp: "20240115_0900".to_string(),
        };

        let response = api.generate_schedule(&options).unwrap();

        assert_eq!(response.generated.len(), 3);
        assert_eq!(response.unmatched_requests, 2);
        // 第二个请求紧接第一个请求之后
        assert_eq!(response.generated[2].start_date, Some(ymd(2024, 1, 23)));
        assert_eq!(response.files.len(), 1);
        assert_eq!(api.load_plan(&response.files[0]).unwrap().len(), 3);
    }

    #[test]
    fn test_manual_add_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let api = api_with(dir.path());
        let path = dir.path().join("plan.csv");

        let mut step = PlannedStep::new(OrderLine::bare("MAT-01"), "TORNIO", "Lavorazione");
        step.start_date = Some(ymd(2024, 1, 15));
        step.end_date = Some(ymd(2024, 1, 18));
        let plan = api.add_step_to_file(&path, step.clone()).unwrap();
        assert_eq!(plan.len(), 1);

        step.completion = 100;
        let plan = api.overwrite_step_in_file(&path, 0, step.clone()).unwrap();
        assert_eq!(plan[0].status, StepStatus::Completed);

        let err = api.overwrite_step_in_file(&path, 5, step).unwrap_err();
        assert!(matches!(err, ApiError::RowOutOfRange { index: 5, rows: 1 }));
    }

    #[test]
    fn test_manual_add_rejects_invalid_step() {
        let api = PlanningApi::new(Arc::new(ConfigManager::with_defaults()));
        let mut plan = Vec::new();
        let step = PlannedStep::new(OrderLine::bare("MAT-01"), "", "Lavorazione");
        assert!(api.add_manual_step(&mut plan, step).is_err());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_estimate_eta_fixed_status() {
        let api = PlanningApi::new(Arc::new(ConfigManager::with_defaults()));
        assert_eq!(
            api.estimate_eta("MAT-01|4500|10", "SALA METROLOGICA", ymd(2024, 1, 15)),
            ymd(2024, 1, 22)
        );
    }
}
