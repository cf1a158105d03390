// ==========================================
// 生产计划系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将导入 / 仓储 / 配置错误转换为用户可读的消息
// ==========================================

use crate::config::ConfigError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 覆写的行号超出计划范围
    #[error("行号越界: index={index}, rows={rows}")]
    RowOutOfRange { index: usize, rows: usize },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(#[from] ImportError),

    #[error("文件写入失败: {0}")]
    StorageError(String),

    #[error("配置错误: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 人工操作校验失败（带详细原因）
    #[error("操作校验失败: {reason}")]
    ManualOperationValidationError {
        reason: String,
        violations: Vec<ValidationViolation>,
    },
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::MissingColumns { missing } => {
                ApiError::ValidationError(format!("计划文件缺少列: {}", missing.join(", ")))
            }
            other => ApiError::StorageError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 校验违规详情
// ==========================================

/// 校验违规详情
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationViolation {
    /// 违规类型（MISSING_FIELD / DATE_ORDER）
    pub violation_type: String,
    /// 字段名
    pub field: String,
    /// 违规原因
    pub reason: String,
    /// 额外信息（可选）
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_plan_columns_become_validation_error() {
        let err: ApiError = RepositoryError::MissingColumns {
            missing: vec!["Macchina".to_string()],
        }
        .into();
        assert!(matches!(err, ApiError::ValidationError(ref msg) if msg.contains("Macchina")));
    }

    #[test]
    fn test_import_error_keeps_message() {
        let err: ApiError = ImportError::FileNotFound("ordini.xlsx".to_string()).into();
        assert!(err.to_string().contains("ordini.xlsx"));
    }
}
