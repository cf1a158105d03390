// ==========================================
// 生产计划系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 文件错误 =====
    #[error("文件读写失败: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV 读写失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel 写入失败: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    // ===== 数据质量错误 =====
    #[error("计划文件缺少列: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("网格超出 Excel 范围: row={row}, col={col}")]
    GridOutOfRange { row: usize, col: usize },
}

impl RepositoryError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        RepositoryError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
