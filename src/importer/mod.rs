// ==========================================
// 生产计划系统 - 导入层
// ==========================================
// 职责: 外部表格导入,生成内部数据
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod status_mapper;

// 重导出核心类型
pub use data_cleaner::{datetime_to_serial, serial_to_datetime, DataCleaner};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ExportLayout, FieldMapper, OrderImport, ORDER_EXPORT_COLUMNS};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use status_mapper::{OrderStatusRow, StatusMapper, STATUS_EXPORT_COLUMNS, STATUS_SHEET_NAME};

// 重导出 Trait 接口
pub use importer_trait::FileParser;
