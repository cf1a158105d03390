// ==========================================
// 生产计划系统 - 订单导出字段映射器
// ==========================================
// 职责: 工作表网格 → OrderLine（列名映射 / 列位置映射 + 类型转换）
// ==========================================

use crate::domain::order::OrderLine;
use crate::domain::sheet::{CellValue, SheetGrid};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use serde::Serialize;

/// 订单导出必需列（按 OrderLine 字段顺序）
pub const ORDER_EXPORT_COLUMNS: [&str; 10] = [
    "MATERIALE",
    "Revisione",
    "Descrizione",
    "ODA",
    "Posizione",
    "Quantità",
    "Valore",
    "Data consegna originale",
    "Data consegna ritrattata",
    "Note",
];

/// 原始表（表头在第二行）的列位置映射，与 ORDER_EXPORT_COLUMNS 一一对应
pub const RAW_EXPORT_POSITIONS: [usize; 10] = [0, 1, 2, 4, 5, 9, 21, 13, 22, 30];

// ==========================================
// ExportLayout - 订单导出布局
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportLayout {
    Named,      // 第一行为标准列名
    Positional, // 原始表：表头在第二行，按列位置取值
}

impl ExportLayout {
    fn header_row(&self) -> usize {
        match self {
            ExportLayout::Named => 0,
            ExportLayout::Positional => 1,
        }
    }
}

// ==========================================
// OrderImport - 订单导入结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct OrderImport {
    pub layout: ExportLayout,
    pub lines: Vec<OrderLine>,
    pub skipped_rows: usize, // 物料号为空被跳过的行
    pub total_rows: usize,   // 数据行总数
}

pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 判断订单导出布局
    ///
    /// # 规则
    /// 1. 第一行包含全部标准列名 → Named
    /// 2. 否则存在第二行且第一行不像标准表头 → Positional
    /// 3. 否则 → MissingColumns（列出第一行缺失的列）
    pub fn detect_layout(&self, grid: &SheetGrid, file: &str) -> ImportResult<ExportLayout> {
        let missing = missing_columns(grid, 0, &ORDER_EXPORT_COLUMNS);
        if missing.is_empty() {
            return Ok(ExportLayout::Named);
        }

        // 第一行至少命中一个标准列名，视为残缺的标准表头
        let partially_named = missing.len() < ORDER_EXPORT_COLUMNS.len();
        if !partially_named && grid.row_count() >= 2 {
            return Ok(ExportLayout::Positional);
        }

        Err(ImportError::MissingColumns {
            file: file.to_string(),
            missing,
        })
    }

    /// 映射订单导出为订单行
    pub fn map_order_export(&self, grid: &SheetGrid, file: &str) -> ImportResult<OrderImport> {
        if grid.row_count() == 0 {
            return Err(ImportError::EmptySheet(file.to_string()));
        }

        let layout = self.detect_layout(grid, file)?;
        let header_row = layout.header_row();

        let positions: Vec<usize> = match layout {
            ExportLayout::Named => ORDER_EXPORT_COLUMNS
                .iter()
                .filter_map(|name| grid.find_column(header_row, name))
                .collect(),
            ExportLayout::Positional => RAW_EXPORT_POSITIONS.to_vec(),
        };

        let mut lines = Vec::new();
        let mut skipped_rows = 0;
        let data_rows = header_row + 1..grid.row_count();
        let total_rows = data_rows.len();

        for row in data_rows {
            let cell = |field: usize| grid.cell(row, positions[field]);

            if (0..positions.len()).all(|field| cell(field).is_empty()) {
                skipped_rows += 1;
                continue;
            }

            let line = self.map_row(&cell);
            if line.material_code.is_empty() {
                tracing::debug!(row = row + 1, "物料号为空，跳过");
                skipped_rows += 1;
                continue;
            }
            lines.push(line);
        }

        tracing::info!(
            file = %file,
            layout = ?layout,
            lines = lines.len(),
            skipped = skipped_rows,
            "订单导出映射完成"
        );

        Ok(OrderImport {
            layout,
            lines,
            skipped_rows,
            total_rows,
        })
    }

    fn map_row<'a, F>(&self, cell: &F) -> OrderLine
    where
        F: Fn(usize) -> &'a CellValue,
    {
        let c = &self.cleaner;
        OrderLine {
            material_code: c.integer_like(cell(0)),
            revision: c.integer_like(cell(1)),
            description: cell(2).as_text(),
            purchase_order: c.integer_like(cell(3)),
            position: c.integer_like(cell(4)),
            quantity: c.parse_number_cell(cell(5)),
            value: c.parse_number_cell(cell(6)),
            original_delivery: c.parse_date(cell(7)),
            renegotiated_delivery: c.parse_date(cell(8)),
            note: cell(9).as_text(),
        }
    }
}

/// 表头行中缺失的列名
pub fn missing_columns(grid: &SheetGrid, header_row: usize, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| grid.find_column(header_row, name).is_none())
        .map(|name| name.to_string())
        .collect()
}
