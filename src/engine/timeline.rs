// ==========================================
// 生产计划系统 - 时间轴数据
// ==========================================
// 职责: 计划工序 → 按机台分道的甘特条数据 + 状态桶统计
// 红线: 只产出数据，不负责绘制
// ==========================================

use crate::domain::plan::PlannedStep;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// 单条甘特条
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineBar {
    pub label: String,
    pub start: NaiveDate,
    pub end_exclusive: NaiveDate, // 结束日期 + 1（含结束当天）
    pub bucket: String,
    pub completion: u8,
}

/// 单台机器的泳道
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineLane {
    pub machine: String,
    pub bars: Vec<TimelineBar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeline {
    pub lanes: Vec<TimelineLane>,
    pub bucket_counts: BTreeMap<String, usize>,
    pub undated: usize, // 缺开始或结束日期，未上图
}

impl Timeline {
    pub fn bar_count(&self) -> usize {
        self.lanes.iter().map(|lane| lane.bars.len()).sum()
    }
}

pub struct TimelineBuilder;

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 构建时间轴
    ///
    /// 泳道按机台名排序，条按开始日期排序；
    /// 结束早于开始的行按开始日期当天处理
    pub fn build(&self, steps: &[PlannedStep]) -> Timeline {
        let mut timeline = Timeline::default();
        let mut lanes: BTreeMap<String, Vec<TimelineBar>> = BTreeMap::new();

        for step in steps {
            *timeline
                .bucket_counts
                .entry(step.status.bucket().to_string())
                .or_insert(0) += 1;

            let (Some(start), Some(end)) = (step.start_date, step.end_date) else {
                timeline.undated += 1;
                continue;
            };

            let machine = if step.machine.trim().is_empty() {
                "-".to_string()
            } else {
                step.machine.trim().to_string()
            };

            lanes.entry(machine).or_default().push(TimelineBar {
                label: format!("{} – {}", step.order.material_code, step.activity),
                start,
                end_exclusive: end.max(start) + Duration::days(1),
                bucket: step.status.bucket().to_string(),
                completion: step.completion,
            });
        }

        timeline.lanes = lanes
            .into_iter()
            .map(|(machine, mut bars)| {
                bars.sort_by_key(|bar| bar.start);
                TimelineLane { machine, bars }
            })
            .collect();

        tracing::debug!(
            lanes = timeline.lanes.len(),
            bars = timeline.bar_count(),
            undated = timeline.undated,
            "时间轴数据已生成"
        );
        timeline
    }
}
