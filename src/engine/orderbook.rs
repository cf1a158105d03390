// ==========================================
// 生产计划系统 - 订单簿回填引擎
// ==========================================
// 职责: 用订单状态导出回填客户订单簿（预计交期 + 状态）
// 输入: 订单状态行 + 客户订单簿网格（第 1 行表头，第 2 行起为数据）
// 输出: 回填后的网格 + 行级统计（更新 / 未匹配 / 不完整 / 总行数）
// ==========================================
// 红线: 未匹配只计数不报错
// ==========================================

use crate::domain::order::MatchKey;
use crate::domain::sheet::{column_index, CellValue, SheetGrid};
use crate::engine::eta::EtaEstimator;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::status_mapper::OrderStatusRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

// ==========================================
// OrderbookColumns - 订单簿列位置（Excel 列字母）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookColumns {
    pub material: String,    // 物料号
    pub oda: String,         // 采购单号
    pub position: String,    // 行号
    pub eta_out: String,     // 写入: 预计交期
    pub status_out: String,  // 写入: 状态
}

impl Default for OrderbookColumns {
    fn default() -> Self {
        Self {
            material: "A".to_string(),
            oda: "E".to_string(),
            position: "F".to_string(),
            eta_out: "X".to_string(),
            status_out: "AF".to_string(),
        }
    }
}

/// 列字母解析后的位置
#[derive(Debug, Clone, Copy)]
struct ResolvedColumns {
    material: usize,
    oda: usize,
    position: usize,
    eta_out: usize,
    status_out: usize,
}

impl OrderbookColumns {
    fn resolve(&self) -> Option<ResolvedColumns> {
        Some(ResolvedColumns {
            material: column_index(&self.material)?,
            oda: column_index(&self.oda)?,
            position: column_index(&self.position)?,
            eta_out: column_index(&self.eta_out)?,
            status_out: column_index(&self.status_out)?,
        })
    }
}

// ==========================================
// PlannerEntry / PlannerMap - 匹配键 → (状态, 基准日期)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerEntry {
    pub status: String,
    pub base_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct PlannerMap {
    pub entries: HashMap<MatchKey, PlannerEntry>,
    pub incomplete_rows: usize,       // 键不完整被忽略的行
    pub missing_base_date: usize,     // DATA_PASSAGGIO_PRD 为空的行
}

impl PlannerMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// CompileStats - 回填统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileStats {
    pub updated: usize,   // 已更新行
    pub no_match: usize,  // 键完整但未匹配
    pub skipped: usize,   // 键不完整
    pub rows: usize,      // 数据行总数
}

// ==========================================
// OrderbookCompiler - 订单簿回填引擎
// ==========================================
pub struct OrderbookCompiler {
    estimator: EtaEstimator,
    cleaner: DataCleaner,
    columns: OrderbookColumns,
}

impl Default for OrderbookCompiler {
    fn default() -> Self {
        Self::new(OrderbookColumns::default())
    }
}

impl OrderbookCompiler {
    pub fn new(columns: OrderbookColumns) -> Self {
        Self {
            estimator: EtaEstimator::new(),
            cleaner: DataCleaner,
            columns,
        }
    }

    /// 构建匹配表
    ///
    /// # 规则
    /// - 键不完整的行忽略（计入 incomplete_rows）
    /// - 基准日期缺失或无法解析 → today
    /// - 重复键以最后一次出现为准
    pub fn build_planner_map(&self, rows: &[OrderStatusRow], today: NaiveDate) -> PlannerMap {
        let mut map = PlannerMap::default();

        for row in rows {
            if row.base_date_blank {
                map.missing_base_date += 1;
            }
            if !row.key.is_complete() {
                map.incomplete_rows += 1;
                continue;
            }
            let entry = PlannerEntry {
                status: row.status.trim().to_string(),
                base_date: row.base_date.unwrap_or(today),
            };
            if map.entries.insert(row.key.clone(), entry).is_some() {
                tracing::debug!(key = %row.key, row = row.row_number, "重复键，以最后一次为准");
            }
        }

        tracing::info!(
            entries = map.len(),
            incomplete = map.incomplete_rows,
            missing_base_date = map.missing_base_date,
            "匹配表构建完成"
        );
        map
    }

    /// 回填订单簿（原地修改网格）
    ///
    /// # 逐行规则（从第 2 行起）
    /// 1. 物料 / ODA / 行号任一为空 → skipped
    /// 2. 键不在匹配表 → no_match
    /// 3. 否则写入预计交期（DD/MM/YYYY）与状态 → updated
    #[instrument(skip(self, orderbook, planner_map), fields(
        sheet = %orderbook.sheet_name,
        entries = planner_map.len()
    ))]
    pub fn compile(&self, orderbook: &mut SheetGrid, planner_map: &PlannerMap) -> CompileStats {
        let mut stats = CompileStats {
            rows: orderbook.row_count().saturating_sub(1),
            ..Default::default()
        };

        let Some(cols) = self.columns.resolve() else {
            tracing::warn!(columns = ?self.columns, "订单簿列配置无效，未做任何回填");
            return stats;
        };

        for row in 1..orderbook.row_count() {
            let key = MatchKey::new(
                &self.cleaner.integer_like(orderbook.cell(row, cols.material)),
                &self.cleaner.integer_like(orderbook.cell(row, cols.oda)),
                &self.cleaner.integer_like(orderbook.cell(row, cols.position)),
            );

            if !key.is_complete() {
                stats.skipped += 1;
                continue;
            }

            let Some(entry) = planner_map.entries.get(&key) else {
                stats.no_match += 1;
                continue;
            };

            let seed_key =
                EtaEstimator::seed_key(&key.to_string(), &entry.status, entry.base_date);
            let target = self.estimator.estimate(entry.base_date, &entry.status, &seed_key);

            orderbook.set_cell(
                row,
                cols.eta_out,
                CellValue::Text(self.cleaner.format_date(target)),
            );
            orderbook.set_cell(row, cols.status_out, CellValue::from(entry.status.as_str()));
            stats.updated += 1;
        }

        tracing::info!(
            updated = stats.updated,
            no_match = stats.no_match,
            skipped = stats.skipped,
            rows = stats.rows,
            "订单簿回填完成"
        );
        stats
    }
}
