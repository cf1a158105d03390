// ==========================================
// 生产计划系统 - 订单状态导出映射器
// ==========================================
// 职责: ORDINI_export 网格 → 订单状态行（供订单簿回填使用）
// 必需列: CODICE / ODA / POS / STATO / DATA_PASSAGGIO_PRD
// ==========================================

use crate::domain::order::MatchKey;
use crate::domain::sheet::SheetGrid;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::missing_columns;
use chrono::NaiveDate;

/// 订单状态导出的首选工作表
pub const STATUS_SHEET_NAME: &str = "ORDINI";

/// 订单状态导出必需列
pub const STATUS_EXPORT_COLUMNS: [&str; 5] = ["CODICE", "ODA", "POS", "STATO", "DATA_PASSAGGIO_PRD"];

// ==========================================
// OrderStatusRow - 订单状态行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusRow {
    pub row_number: usize,              // 原始文件行号（1 起）
    pub key: MatchKey,
    pub status: String,                 // STATO（TRIM 后原文）
    pub base_date: Option<NaiveDate>,   // DATA_PASSAGGIO_PRD（无法解析 → None）
    pub base_date_blank: bool,          // 原始单元格为空
}

pub struct StatusMapper {
    cleaner: DataCleaner,
}

impl Default for StatusMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 映射订单状态导出（表头在第一个非空行）
    ///
    /// # 返回
    /// - Ok(Vec<OrderStatusRow>): 全部数据行（含键不完整的行，由调用方过滤）
    /// - Err(MissingColumns): 缺少必需列，任何处理之前即失败
    pub fn map_status_export(
        &self,
        grid: &SheetGrid,
        file: &str,
    ) -> ImportResult<Vec<OrderStatusRow>> {
        let header = grid.first_non_empty_row().unwrap_or(0);
        let missing = missing_columns(grid, header, &STATUS_EXPORT_COLUMNS);
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns {
                file: file.to_string(),
                missing,
            });
        }

        let col = |name: &str| grid.find_column(header, name).unwrap_or(usize::MAX);
        let (code_col, oda_col, pos_col, status_col, date_col) = (
            col("CODICE"),
            col("ODA"),
            col("POS"),
            col("STATO"),
            col("DATA_PASSAGGIO_PRD"),
        );

        let rows = (header + 1..grid.row_count())
            .map(|row| {
                let date_cell = grid.cell(row, date_col);
                OrderStatusRow {
                    row_number: row + 1,
                    key: MatchKey::new(
                        &self.cleaner.integer_like(grid.cell(row, code_col)),
                        &self.cleaner.integer_like(grid.cell(row, oda_col)),
                        &self.cleaner.integer_like(grid.cell(row, pos_col)),
                    ),
                    status: grid.cell(row, status_col).as_text(),
                    base_date: self.cleaner.parse_date(date_cell),
                    base_date_blank: date_cell.is_empty(),
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(file = %file, rows = rows.len(), "订单状态导出映射完成");
        Ok(rows)
    }
}
