// ==========================================
// 生产计划系统 - 订单领域模型
// ==========================================
// 职责: 订单行（只读，每次会话从导出文件重载）+ 匹配键
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// OrderLine - 订单行
// ==========================================
// 用途: 导入层写入，计划工序携带其元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub material_code: String,                      // MATERIALE
    pub revision: String,                           // Revisione
    pub description: String,                        // Descrizione
    pub purchase_order: String,                     // ODA
    pub position: String,                           // Posizione
    pub quantity: Option<f64>,                      // Quantità
    pub value: Option<f64>,                         // Valore（欧元）
    pub original_delivery: Option<NaiveDate>,       // Data consegna originale
    pub renegotiated_delivery: Option<NaiveDate>,   // Data consegna ritrattata
    pub note: String,                               // Note
}

impl OrderLine {
    /// 仅含物料号的订单行（订单导出中找不到时使用）
    pub fn bare(material_code: &str) -> Self {
        Self {
            material_code: material_code.trim().to_string(),
            ..Default::default()
        }
    }

    pub fn match_key(&self) -> MatchKey {
        MatchKey::new(&self.material_code, &self.purchase_order, &self.position)
    }
}

// ==========================================
// MatchKey - 匹配键
// ==========================================
// 组成: (物料号, 采购单号, 行号)；仅物料号不唯一
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub material_code: String,
    pub purchase_order: String,
    pub position: String,
}

impl MatchKey {
    pub fn new(material_code: &str, purchase_order: &str, position: &str) -> Self {
        Self {
            material_code: material_code.trim().to_string(),
            purchase_order: purchase_order.trim().to_string(),
            position: position.trim().to_string(),
        }
    }

    /// 三段均非空
    pub fn is_complete(&self) -> bool {
        !self.material_code.is_empty()
            && !self.purchase_order.is_empty()
            && !self.position.is_empty()
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.material_code, self.purchase_order, self.position
        )
    }
}
