// ==========================================
// 生产计划系统 - 计划文件仓储
// ==========================================
// 职责: 计划工序 ⇄ CSV 文件（UTF-8 BOM，分隔符可配）
// 红线: Repository 不含业务逻辑，仅做字段编解码与记录级规范化
// ==========================================
// 写入策略: 整文件覆盖（无锁，最后一次保存生效）
// ==========================================

use crate::domain::order::OrderLine;
use crate::domain::plan::{parse_completion, PlannedStep};
use crate::domain::types::{OutputMode, StepStatus};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::file_parser::detect_delimiter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const UTF8_BOM: &str = "\u{feff}";

/// 计划文件列（顺序即写入顺序）
pub const PLAN_COLUMNS: [&str; 18] = [
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
    "Macchina",
    "Attività",
    "Data inizio",
    "Data fine",
    "Stato",
    "Completamento",
    "Fornitore",
    "Operatore",
];

/// 读取时必须存在的列
const REQUIRED_PLAN_COLUMNS: [&str; 3] = ["MATERIALE", "Macchina", "Attività"];

// ==========================================
// PlanFileRepository
// ==========================================
pub struct PlanFileRepository {
    delimiter: u8,
    cleaner: DataCleaner,
}

impl Default for PlanFileRepository {
    fn default() -> Self {
        Self::new(b';')
    }
}

impl PlanFileRepository {
    /// # 参数
    /// - delimiter: 写入分隔符（读取时自动识别）
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            cleaner: DataCleaner,
        }
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 读取计划文件
    ///
    /// 去 BOM、自动识别 ';' / ','，按表头名取列；
    /// 每行读入后执行记录级规范化
    pub fn read_plan(&self, path: &Path) -> RepositoryResult<Vec<PlannedStep>> {
        let raw = fs::read(path).map_err(|e| RepositoryError::io(path, e))?;
        let content = String::from_utf8_lossy(&raw);
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(detect_delimiter(content))
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let index = ColumnIndex::from_headers(&headers);

        let missing: Vec<String> = REQUIRED_PLAN_COLUMNS
            .iter()
            .filter(|name| index.get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RepositoryError::MissingColumns { missing });
        }

        let mut steps = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            steps.push(self.decode_row(&record, &index));
        }

        tracing::debug!(path = %path.display(), rows = steps.len(), "计划文件已读取");
        Ok(steps)
    }

    fn decode_row(&self, record: &csv::StringRecord, index: &ColumnIndex) -> PlannedStep {
        let field = |name: &str| index.field(record, name);

        let order = OrderLine {
            material_code: field("MATERIALE").to_string(),
            revision: field("Revisione").to_string(),
            description: field("Descrizione").to_string(),
            purchase_order: field("ODA").to_string(),
            position: field("Posizione").to_string(),
            quantity: self.cleaner.parse_currency(field("Quantità")),
            value: self.cleaner.parse_currency(field("Valore")),
            original_delivery: self.cleaner.parse_date_text(field("Data consegna originale")),
            renegotiated_delivery: self
                .cleaner
                .parse_date_text(field("Data consegna ritrattata")),
            note: field("Note").to_string(),
        };

        let mut step = PlannedStep::new(order, field("Macchina"), field("Attività"));
        step.start_date = self.cleaner.parse_date_text(field("Data inizio"));
        step.end_date = self.cleaner.parse_date_text(field("Data fine"));
        step.status = StepStatus::normalize(field("Stato"));
        step.completion =
            parse_completion(self.cleaner.parse_currency(field("Completamento").trim_end_matches('%')));
        step.supplier = Some(field("Fornitore").to_string());
        step.operator = Some(field("Operatore").to_string());
        step.normalize();
        step
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 写入计划文件（BOM + 表头 + 数据，整文件覆盖）
    pub fn write_plan(&self, path: &Path, steps: &[PlannedStep]) -> RepositoryResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RepositoryError::io(parent, e))?;
        }

        let mut file = fs::File::create(path).map_err(|e| RepositoryError::io(path, e))?;
        file.write_all(UTF8_BOM.as_bytes())
            .map_err(|e| RepositoryError::io(path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(file);
        writer.write_record(PLAN_COLUMNS)?;
        for step in steps {
            writer.write_record(self.encode_row(step))?;
        }
        writer.flush().map_err(|e| RepositoryError::io(path, e))?;

        tracing::info!(path = %path.display(), rows = steps.len(), "计划文件已写入");
        Ok(())
    }

    fn encode_row(&self, step: &PlannedStep) -> Vec<String> {
        let order = &step.order;
        vec![
            order.material_code.clone(),
            order.revision.clone(),
            order.description.clone(),
            order.purchase_order.clone(),
            order.position.clone(),
            order
                .quantity
                .map(|q| self.cleaner.format_quantity(q))
                .unwrap_or_default(),
            order
                .value
                .map(|v| self.cleaner.format_currency(v))
                .unwrap_or_default(),
            self.cleaner.format_optional_date(order.original_delivery),
            self.cleaner.format_optional_date(order.renegotiated_delivery),
            order.note.clone(),
            step.machine.clone(),
            step.activity.clone(),
            self.cleaner.format_optional_date(step.start_date),
            self.cleaner.format_optional_date(step.end_date),
            step.status.to_string(),
            step.completion.to_string(),
            step.supplier.clone().unwrap_or_default(),
            step.operator.clone().unwrap_or_default(),
        ]
    }

    /// 按输出模式写入一次运行的结果
    ///
    /// # 文件名
    /// - Consolidated: programmazione_{stamp}.csv
    /// - PerMachine:   programmazione_{机台}_{stamp}.csv
    ///
    /// # 返回
    /// 实际写入的文件路径（按机台名排序）
    pub fn write_run(
        &self,
        dir: &Path,
        steps: &[PlannedStep],
        mode: OutputMode,
        stamp: &str,
    ) -> RepositoryResult<Vec<PathBuf>> {
        match mode {
            OutputMode::Consolidated => {
                let path = dir.join(format!("programmazione_{}.csv", stamp));
                self.write_plan(&path, steps)?;
                Ok(vec![path])
            }
            OutputMode::PerMachine => {
                let mut by_machine: BTreeMap<String, Vec<PlannedStep>> = BTreeMap::new();
                for step in steps {
                    by_machine
                        .entry(machine_slug(&step.machine))
                        .or_default()
                        .push(step.clone());
                }

                let mut written = Vec::with_capacity(by_machine.len());
                for (slug, machine_steps) in by_machine {
                    let path = dir.join(format!("programmazione_{}_{}.csv", slug, stamp));
                    self.write_plan(&path, &machine_steps)?;
                    written.push(path);
                }
                Ok(written)
            }
        }
    }
}

/// 表头名 → 列位置（大小写不敏感）
struct ColumnIndex {
    positions: Vec<(String, usize)>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        Self {
            positions: headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.trim().to_lowercase(), i))
                .collect(),
        }
    }

    fn field<'r>(&self, record: &'r csv::StringRecord, name: &str) -> &'r str {
        self.get(name)
            .and_then(|i| record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    fn get(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.positions
            .iter()
            .find(|(header, _)| *header == wanted)
            .map(|(_, i)| *i)
    }
}

/// 机台名 → 文件名片段（字母数字保留并大写，其余折叠为 '_'）
pub fn machine_slug(machine: &str) -> String {
    let mut slug = String::new();
    for c in machine.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_uppercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() {
        "SENZA_MACCHINA".to_string()
    } else {
        slug
    }
}
