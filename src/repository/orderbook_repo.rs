// ==========================================
// 生产计划系统 - 订单簿输出仓储
// ==========================================
// 职责: 回填后的订单簿工作簿（全部工作表）→ 新的 .xlsx 文件
// 红线: 不修改输入文件，总是写出新文件
// ==========================================

use crate::domain::sheet::{CellValue, SheetGrid};
use crate::importer::data_cleaner::datetime_to_serial;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs;
use std::path::{Path, PathBuf};

const MAX_SHEET_NAME_LEN: usize = 31;

pub struct OrderbookRepository;

impl Default for OrderbookRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderbookRepository {
    pub fn new() -> Self {
        Self
    }

    /// 默认输出文件名: orderbook_compilato_YYYYMMDD_HHMM.xlsx
    pub fn default_file_name(now: NaiveDateTime) -> String {
        format!("orderbook_compilato_{}.xlsx", now.format("%Y%m%d_%H%M"))
    }

    /// 默认输出路径（目录 + 默认文件名）
    pub fn default_output_path(dir: &Path, now: NaiveDateTime) -> PathBuf {
        dir.join(Self::default_file_name(now))
    }

    /// 写出整本工作簿，工作表顺序与输入一致
    pub fn write_workbook(&self, path: &Path, grids: &[SheetGrid]) -> RepositoryResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RepositoryError::io(parent, e))?;
        }

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        let mut used_names: Vec<String> = Vec::with_capacity(grids.len());

        for (index, grid) in grids.iter().enumerate() {
            let name = unique_sheet_name(&grid.sheet_name, index, &used_names);
            let sheet = workbook.add_worksheet();
            sheet.set_name(&name)?;
            used_names.push(name);

            for (r, row) in grid.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    write_cell(sheet, r, c, cell, &date_format)?;
                }
            }
        }

        workbook.save(path)?;
        tracing::info!(
            path = %path.display(),
            sheets = grids.len(),
            rows = grids.first().map(|g| g.row_count()).unwrap_or(0),
            "订单簿已写出"
        );
        Ok(())
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: usize,
    col: usize,
    cell: &CellValue,
    date_format: &Format,
) -> RepositoryResult<()> {
    let out_of_range = || RepositoryError::GridOutOfRange { row, col };
    let r = u32::try_from(row).map_err(|_| out_of_range())?;
    let c = u16::try_from(col).map_err(|_| out_of_range())?;

    match cell {
        CellValue::Empty => {}
        CellValue::Text(text) => {
            sheet.write_string(r, c, text)?;
        }
        CellValue::Number(n) => {
            sheet.write_number(r, c, *n)?;
        }
        CellValue::Bool(b) => {
            sheet.write_boolean(r, c, *b)?;
        }
        CellValue::DateTime(dt) => match datetime_to_serial(dt) {
            Some(serial) => {
                sheet.write_number_with_format(r, c, serial, date_format)?;
            }
            None => {
                sheet.write_string(r, c, dt.format("%d/%m/%Y").to_string())?;
            }
        },
    }
    Ok(())
}

/// 工作表名: 去掉 Excel 禁用字符，截断到 31 个字符
fn sheet_name(raw: &str, index: usize) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    if cleaned.is_empty() {
        format!("Foglio{}", index + 1)
    } else {
        cleaned
    }
}

/// Excel 工作表名不区分大小写，重名时追加 " (n)"
fn unique_sheet_name(raw: &str, index: usize, used: &[String]) -> String {
    let base = sheet_name(raw, index);
    let taken = |candidate: &str| used.iter().any(|u| u.eq_ignore_ascii_case(candidate));
    if !taken(&base) {
        return base;
    }
    (2..)
        .map(|n| {
            let suffix = format!(" ({n})");
            let head: String = base
                .chars()
                .take(MAX_SHEET_NAME_LEN - suffix.chars().count())
                .collect();
            format!("{head}{suffix}")
        })
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.clone())
}
