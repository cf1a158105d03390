// ==========================================
// 生产计划系统 - 表格值模型
// ==========================================
// 职责: 统一 Excel / CSV 单元格表示（导入层产出，引擎层读写）
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// CellValue - 单元格值
// ==========================================
// 三种来源形态: 数值（含日期序列号）/ 原生日期时间 / 文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// 是否为空（空白文本视为空）
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 原样文本表示（TRIM 后）
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

// ==========================================
// SheetGrid - 工作表网格
// ==========================================
// 行列均从 0 开始；越界读取返回 Empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetGrid {
    pub sheet_name: String,
    pub rows: Vec<Vec<CellValue>>,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl SheetGrid {
    pub fn new(sheet_name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// 写入单元格（按需扩展行/列）
    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let target = &mut self.rows[row];
        if target.len() <= col {
            target.resize(col + 1, CellValue::Empty);
        }
        target[col] = value;
    }

    /// 指定行的文本表头（TRIM 后）
    pub fn header_row(&self, row: usize) -> Vec<String> {
        self.rows
            .get(row)
            .map(|r| r.iter().map(|c| c.as_text()).collect())
            .unwrap_or_default()
    }

    /// 第一个含非空单元格的行（工作表上方可能留有空行）
    pub fn first_non_empty_row(&self) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.iter().any(|cell| !cell.is_empty()))
    }

    /// 在表头行中查找列名位置（大小写不敏感，含重音字母）
    pub fn find_column(&self, header_row: usize, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.header_row(header_row)
            .iter()
            .position(|h| h.to_lowercase() == wanted)
    }
}

/// Excel 列字母 → 列索引（"A" → 0, "AF" → 31）
pub fn column_index(letters: &str) -> Option<usize> {
    let mut index: usize = 0;
    let mut seen = false;
    for ch in letters.trim().chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
        seen = true;
    }
    if seen {
        Some(index - 1)
    } else {
        None
    }
}
