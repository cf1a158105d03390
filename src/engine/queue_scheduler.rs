// ==========================================
// 生产计划系统 - 机台排队引擎
// ==========================================
// 职责: 将一串类型化工序线性排到单台机器的时间轴上（无重叠）
// 输入: 订单行 + 排队请求 + 已有计划（可选）
// 输出: 计划工序（start = 游标, end = start + 时长, 游标 = end + 1）
// ==========================================
// 红线: 贪心单遍放置，不重排、不插空、不跨机台平衡
// ==========================================

use crate::domain::order::OrderLine;
use crate::domain::plan::{PlannedStep, ScheduleRequest, MAX_STEPS_PER_REQUEST};
use crate::domain::types::{CalendarMode, StepKind, StepStatus};
use crate::engine::calendar::WorkCalendar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

// ==========================================
// StepDurations - 工序时长表（天）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDurations {
    pub work: u32,
    pub treatment: u32,
    pub external: u32,
    pub quality_control: u32,
    pub packaging: u32,
}

impl Default for StepDurations {
    fn default() -> Self {
        Self {
            work: 3,
            treatment: 10,
            external: 10,
            quality_control: 2,
            packaging: 1,
        }
    }
}

impl StepDurations {
    pub fn for_kind(&self, kind: StepKind) -> u32 {
        match kind {
            StepKind::Work => self.work,
            StepKind::Treatment => self.treatment,
            StepKind::External => self.external,
            StepKind::QualityControl => self.quality_control,
            StepKind::Packaging => self.packaging,
        }
    }
}

// ==========================================
// QueueScheduler - 机台排队引擎
// ==========================================
pub struct QueueScheduler {
    calendar: WorkCalendar,
    durations: StepDurations,
    today: NaiveDate,
    // 机台键（TRIM + UPPER）→ 已知最晚结束日期
    latest_end: HashMap<String, NaiveDate>,
}

impl QueueScheduler {
    /// 构造函数
    ///
    /// # 参数
    /// - mode: 日历模式（自然日 / 工作日）
    /// - durations: 工序时长表
    /// - today: 无历史数据时的游标起点
    pub fn new(mode: CalendarMode, durations: StepDurations, today: NaiveDate) -> Self {
        Self {
            calendar: WorkCalendar::new(mode),
            durations,
            today,
            latest_end: HashMap::new(),
        }
    }

    /// 用已有计划初始化各机台游标（取每台机器的最晚结束日期）
    ///
    /// # 返回
    /// 参与初始化的工序数（无机台或无结束日期的行不计）
    pub fn seed_from_plan(&mut self, steps: &[PlannedStep]) -> usize {
        let mut seeded = 0;
        for step in steps {
            if let Some(end) = step.end_date {
                if self.record_end(&step.machine, end) {
                    seeded += 1;
                }
            }
        }
        tracing::debug!(seeded, machines = self.latest_end.len(), "机台游标已由已有计划初始化");
        seeded
    }

    /// 机台当前游标（下一个可用开始日期）
    ///
    /// - 有已知结束日期 → 结束日期 + 1 天（按日历模式）
    /// - 否则 → today（工作日模式下对齐到工作日）
    pub fn cursor_for(&self, machine: &str) -> NaiveDate {
        match self.latest_end.get(&machine_key(machine)) {
            Some(end) => self.calendar.advance(*end, 1),
            None => self.calendar.align(self.today),
        }
    }

    /// 按请求生成计划工序
    ///
    /// # 发射顺序
    /// 加工 ×N → 热处理 ×N → 外协 ×N → 质检（可选）→ 包装（可选）
    ///
    /// # 返回
    /// 新生成的工序（同时推进该机台游标，供同一次运行的后续请求使用）
    #[instrument(skip(self, order, request), fields(
        material = %request.material_code,
        machine = %request.machine,
        steps = request.step_count()
    ))]
    pub fn schedule(&mut self, order: &OrderLine, request: &ScheduleRequest) -> Vec<PlannedStep> {
        let mut steps = Vec::with_capacity(request.step_count().min(MAX_STEPS_PER_REQUEST));
        if request.machine.trim().is_empty() {
            tracing::warn!("机台为空，跳过请求");
            return steps;
        }

        let mut cursor = self.cursor_for(&request.machine);

        for (kind, activity) in emission_sequence(request) {
            let start = self.calendar.align(cursor);
            let end = self.calendar.advance(start, self.durations.for_kind(kind));

            let mut step = PlannedStep::new(order.clone(), &request.machine, &activity);
            step.start_date = Some(start);
            step.end_date = Some(end);
            step.status = StepStatus::Scheduled;
            step.completion = 0;
            if kind.accepts_supplier() {
                step.supplier = request.supplier.clone();
            }
            step.operator = request.operator.clone();
            step.normalize();

            tracing::debug!(activity = %activity, %start, %end, "工序已放置");

            self.record_end(&request.machine, end);
            cursor = self.calendar.advance(end, 1);
            steps.push(step);
        }

        steps
    }

    /// 记录机台结束日期（取最大值）
    fn record_end(&mut self, machine: &str, end: NaiveDate) -> bool {
        let key = machine_key(machine);
        if key.is_empty() {
            return false;
        }
        self.latest_end
            .entry(key)
            .and_modify(|current| {
                if end > *current {
                    *current = end;
                }
            })
            .or_insert(end);
        true
    }
}

/// 机台键（TRIM + UPPER）
fn machine_key(machine: &str) -> String {
    machine.trim().to_uppercase()
}

/// 请求展开为 (工序类型, 活动名称) 序列
fn emission_sequence(request: &ScheduleRequest) -> Vec<(StepKind, String)> {
    let mut sequence = Vec::with_capacity(request.step_count().min(MAX_STEPS_PER_REQUEST));

    let mut push_repeated = |kind: StepKind, count: u32| {
        for i in 1..=count {
            let label = if count > 1 {
                format!("{} {}", kind.activity_label(), i)
            } else {
                kind.activity_label().to_string()
            };
            sequence.push((kind, label));
        }
    };

    push_repeated(StepKind::Work, request.work_steps);
    push_repeated(StepKind::Treatment, request.treatment_steps);
    push_repeated(StepKind::External, request.external_steps);
    if request.quality_control {
        push_repeated(StepKind::QualityControl, 1);
    }
    if request.packaging {
        push_repeated(StepKind::Packaging, 1);
    }

    sequence
}
