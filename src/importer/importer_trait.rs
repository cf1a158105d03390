// ==========================================
// 生产计划系统 - 导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::domain::sheet::SheetGrid;
use crate::importer::error::ImportResult;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0: 文件 → 工作表网格）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为工作表网格
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - preferred_sheet: 首选工作表名（不存在时回退到第一个工作表；CSV 忽略）
    ///
    /// # 返回
    /// - Ok(SheetGrid): 网格（行列位置与源文件一致）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_grid(
        &self,
        file_path: &Path,
        preferred_sheet: Option<&str>,
    ) -> ImportResult<SheetGrid>;
}
