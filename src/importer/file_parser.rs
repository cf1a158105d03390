// ==========================================
// 生产计划系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xls/.ods) / CSV (.csv)
// ==========================================

use crate::domain::sheet::{CellValue, SheetGrid};
use crate::importer::data_cleaner::serial_to_datetime;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use csv::ReaderBuilder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// UTF-8 BOM
const BOM: char = '\u{feff}';

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_grid(
        &self,
        file_path: &Path,
        _preferred_sheet: Option<&str>,
    ) -> ImportResult<SheetGrid> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let content = fs::read_to_string(path)?;
        let content = content.trim_start_matches(BOM);
        let delimiter = detect_delimiter(content);

        // 表头按普通行读入，由字段映射层决定表头位置
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true) // 允许行长度不一致
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<CellValue> = record.iter().map(CellValue::from).collect();
            rows.push(row);
        }

        let sheet_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        tracing::debug!(
            file = %path.display(),
            rows = rows.len(),
            delimiter = %(delimiter as char),
            "CSV 解析完成"
        );

        Ok(SheetGrid::new(sheet_name, rows))
    }
}

/// 根据首行判断分隔符（';' 或 ','）
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_grid(
        &self,
        file_path: &Path,
        preferred_sheet: Option<&str>,
    ) -> ImportResult<SheetGrid> {
        let path = file_path;

        let mut workbook = open_excel(path)?;
        let sheet_names = workbook.sheet_names();

        // 首选工作表，不存在时回退到第一个
        let sheet_name = preferred_sheet
            .and_then(|wanted| {
                sheet_names
                    .iter()
                    .find(|name| name.eq_ignore_ascii_case(wanted))
                    .cloned()
            })
            .unwrap_or_else(|| sheet_names[0].clone());

        read_sheet(&mut workbook, path, sheet_name)
    }
}

impl ExcelParser {
    /// 读出工作簿中的全部工作表（按工作簿顺序）
    pub fn parse_workbook(&self, path: &Path) -> ImportResult<Vec<SheetGrid>> {
        let mut workbook = open_excel(path)?;
        let sheet_names = workbook.sheet_names();

        sheet_names
            .into_iter()
            .map(|name| read_sheet(&mut workbook, path, name))
            .collect()
    }
}

/// 打开工作簿（检查存在性、扩展名、至少一个工作表）
fn open_excel(path: &Path) -> ImportResult<Sheets<BufReader<File>>> {
    // 检查文件存在
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    // 检查扩展名
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !matches!(ext.as_str(), "xlsx" | "xlsm" | "xls" | "ods") {
        return Err(ImportError::UnsupportedFormat(ext));
    }

    let workbook = open_workbook_auto(path)?;
    if workbook.sheet_names().is_empty() {
        return Err(ImportError::ExcelParseError(
            "Excel 文件无工作表".to_string(),
        ));
    }
    Ok(workbook)
}

fn read_sheet(
    workbook: &mut Sheets<BufReader<File>>,
    path: &Path,
    sheet_name: String,
) -> ImportResult<SheetGrid> {
    let range = workbook.worksheet_range(&sheet_name)?;

    // calamine 的区域从首个非空单元格开始，这里补齐偏移以保留绝对行列位置
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
    for data_row in range.rows() {
        let mut row = vec![CellValue::Empty; col_offset];
        row.extend(data_row.iter().map(convert_cell));
        rows.push(row);
    }

    tracing::debug!(
        file = %path.display(),
        sheet = %sheet_name,
        rows = rows.len(),
        "Excel 解析完成"
    );

    Ok(SheetGrid::new(sheet_name, rows))
}

/// calamine 单元格 → CellValue
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => serial_to_datetime(dt.as_f64())
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Error(_) => CellValue::Empty,
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(
        &self,
        file_path: P,
        preferred_sheet: Option<&str>,
    ) -> ImportResult<SheetGrid> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_grid(path, preferred_sheet),
            "xlsx" | "xlsm" | "xls" | "ods" => ExcelParser.parse_to_grid(path, preferred_sheet),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    /// 全部工作表；CSV 只有一张
    pub fn parse_all<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<SheetGrid>> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(vec![CsvParser.parse_to_grid(path, None)?]),
            "xlsx" | "xlsm" | "xls" | "ods" => ExcelParser.parse_workbook(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
