// ==========================================
// 生产计划系统 - 命令行主入口
// ==========================================
// 职责: 解析参数 → 加载配置 → 调用 PlanningApi → 输出结果
// ==========================================

mod cli;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use cli::{Cli, Commands, ConfigAction, StepFields};
use production_planner::api::{PlanningApi, ScheduleRunOptions};
use production_planner::config::ConfigManager;
use production_planner::domain::{
    parse_completion, OrderLine, PlannedStep, ScheduleRequest, StepStatus,
};
use production_planner::logging;
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.global.verbose, cli.global.log_json);

    tracing::debug!(
        app = production_planner::APP_NAME,
        version = production_planner::VERSION,
        "启动"
    );

    let mut config =
        ConfigManager::load(cli.global.config.as_deref()).context("加载配置失败")?;
    let api = PlanningApi::new(Arc::new(config.clone()));

    match cli.command {
        Commands::Schedule(args) => run_schedule(&api, &config, args),
        Commands::AddStep(args) => {
            let step = build_step(&api, &args.step)?;
            let plan = api.add_step_to_file(&args.plan, step)?;
            println!("已追加工序，计划共 {} 行: {}", plan.len(), args.plan.display());
            Ok(())
        }
        Commands::EditStep(args) => {
            let step = build_step(&api, &args.step)?;
            let index = (args.row - 1) as usize;
            api.overwrite_step_in_file(&args.plan, index, step)?;
            println!("已覆写第 {} 行: {}", args.row, args.plan.display());
            Ok(())
        }
        Commands::CompileOrderbook(args) => {
            let now = Local::now().naive_local();
            let today = args.today.unwrap_or_else(|| now.date());
            let response = api.compile_orderbook(
                &args.status_export,
                &args.orderbook,
                args.output.as_deref(),
                today,
                now,
            )?;
            let stats = response.stats;
            println!(
                "订单簿回填完成: 更新 {} / 未匹配 {} / 键不完整 {} / 总行数 {}",
                stats.updated, stats.no_match, stats.skipped, stats.rows
            );
            if response.missing_base_date > 0 {
                println!(
                    "注意: {} 行缺少 DATA_PASSAGGIO_PRD，已按今天计算",
                    response.missing_base_date
                );
            }
            println!("输出文件: {}", response.output_path.display());
            Ok(())
        }
        Commands::Timeline(args) => {
            let timeline = api.build_timeline(&args.plan)?;
            let json = if args.pretty {
                serde_json::to_string_pretty(&timeline)?
            } else {
                serde_json::to_string(&timeline)?
            };
            println!("{}", json);
            Ok(())
        }
        Commands::Eta(args) => {
            let eta = api.estimate_eta(&args.key, &args.status, args.base);
            println!("{}", eta.format("%d/%m/%Y"));
            Ok(())
        }
        Commands::Config(args) => run_config(&mut config, args.action),
    }
}

fn run_config(config: &mut ConfigManager, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config.get_config_snapshot()?);
        }
        ConfigAction::Set { key, value } => {
            config.set_config_value(&key, &value);
            config.save().context("保存配置失败")?;
            let path = config.path().map(|p| p.display().to_string()).unwrap_or_default();
            println!("已设置 {} = {} → {}", key, value, path);
        }
        ConfigAction::Restore { snapshot } => {
            let raw = std::fs::read_to_string(&snapshot)
                .with_context(|| format!("读取快照失败: {}", snapshot.display()))?;
            let restored = config.restore_config_from_snapshot(&raw)?;
            config.save().context("保存配置失败")?;
            println!("已恢复 {} 个配置项", restored);
        }
    }
    Ok(())
}

fn run_schedule(api: &PlanningApi, config: &ConfigManager, args: cli::ScheduleArgs) -> Result<()> {
    let requests = match (&args.requests, &args.material, &args.machine) {
        (Some(path), _, _) => load_requests(path)?,
        (None, Some(material), Some(machine)) => vec![ScheduleRequest {
            material_code: material.clone(),
            purchase_order: args.oda.clone(),
            position: args.pos.clone(),
            machine: machine.clone(),
            work_steps: args.work,
            treatment_steps: args.treatment,
            external_steps: args.external,
            quality_control: args.qc,
            packaging: args.packaging,
            supplier: args.supplier.clone(),
            operator: args.operator.clone(),
        }],
        _ => anyhow::bail!("需要 --requests 或 --material + --machine"),
    };

    let now = Local::now().naive_local();
    let options = ScheduleRunOptions {
        order_export: args.orders,
        existing_plan: args.plan,
        requests,
        today: args.today.unwrap_or_else(|| now.date()),
        calendar_mode: args.calendar.map(Into::into),
        output_mode: args.output_mode.map(Into::into),
        output_dir: args.output_dir,
        stamp: now.format("%Y%m%d_%H%M").to_string(),
    };

    let response = api.generate_schedule(&options)?;
    let snapshot = config.get_config_snapshot()?;
    tracing::info!(run_id = %response.run_id, config = %snapshot, "本次排产使用的配置");
    println!(
        "排产完成 (run_id={}): 新增 {} 道工序，{} 个请求未在订单导出中找到",
        response.run_id,
        response.generated.len(),
        response.unmatched_requests
    );
    for step in &response.generated {
        println!(
            "  {:<12} {:<10} {:<20} {} → {}",
            step.order.material_code,
            step.machine,
            step.activity,
            format_day(step.start_date),
            format_day(step.end_date)
        );
    }
    for file in &response.files {
        println!("输出文件: {}", file.display());
    }
    Ok(())
}

fn load_requests(path: &Path) -> Result<Vec<ScheduleRequest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("读取请求文件失败: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("请求文件格式错误: {}", path.display()))
}

/// 命令行字段 → 计划工序（有订单导出时补全订单元数据）
fn build_step(api: &PlanningApi, fields: &StepFields) -> Result<PlannedStep> {
    let mut order = OrderLine {
        material_code: fields.material.trim().to_string(),
        purchase_order: fields.oda.trim().to_string(),
        position: fields.pos.trim().to_string(),
        ..Default::default()
    };
    if let Some(path) = &fields.orders {
        let import = api.load_order_lines(path)?;
        let key = order.match_key();
        if let Some(line) = import.lines.into_iter().find(|l| l.match_key() == key) {
            order = line;
        }
    }

    let mut step = PlannedStep::new(order, &fields.machine, &fields.activity);
    step.start_date = fields.start;
    step.end_date = fields.end;
    step.status = StepStatus::normalize(&fields.status);
    step.completion = parse_completion(Some(fields.completion));
    step.supplier = fields.supplier.clone();
    step.operator = fields.operator.clone();
    Ok(step)
}

fn format_day(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}
