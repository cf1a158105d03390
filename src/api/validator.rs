// ==========================================
// 生产计划系统 - 人工操作校验器
// ==========================================
// 职责: 手工新增 / 覆写工序前的字段校验；排队请求的工序数上限
// 规则: 物料号、机台、活动不能为空；结束日期不得早于开始日期
// ==========================================

use crate::api::error::{ApiError, ApiResult, ValidationViolation};
use crate::domain::plan::{PlannedStep, ScheduleRequest, MAX_STEPS_PER_REQUEST};

// ==========================================
// ManualStepValidator - 人工操作校验器
// ==========================================
pub struct ManualStepValidator;

impl Default for ManualStepValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualStepValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验单条工序
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(ApiError::ManualOperationValidationError): 带全部违规明细
    pub fn validate_step(&self, step: &PlannedStep) -> ApiResult<()> {
        let mut violations = Vec::new();

        let required = [
            ("MATERIALE", step.order.material_code.as_str()),
            ("Macchina", step.machine.as_str()),
            ("Attività", step.activity.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                violations.push(ValidationViolation {
                    violation_type: "MISSING_FIELD".to_string(),
                    field: field.to_string(),
                    reason: format!("{}不能为空", field),
                    details: None,
                });
            }
        }

        if let (Some(start), Some(end)) = (step.start_date, step.end_date) {
            if end < start {
                violations.push(ValidationViolation {
                    violation_type: "DATE_ORDER".to_string(),
                    field: "Data fine".to_string(),
                    reason: format!("结束日期{}早于开始日期{}", end, start),
                    details: Some(serde_json::json!({
                        "start_date": start,
                        "end_date": end,
                    })),
                });
            }
        }

        if violations.is_empty() {
            return Ok(());
        }

        tracing::warn!(
            material = %step.order.material_code,
            violations = violations.len(),
            "人工工序校验失败"
        );
        Err(ApiError::ManualOperationValidationError {
            reason: format!("{}项校验未通过", violations.len()),
            violations,
        })
    }

    /// 校验排队请求（工序数不超过上限）
    pub fn validate_request(&self, request: &ScheduleRequest) -> ApiResult<()> {
        let count = request.step_count();
        if count > MAX_STEPS_PER_REQUEST {
            return Err(ApiError::InvalidInput(format!(
                "物料 {} 的请求包含 {} 道工序，超过上限 {}",
                request.material_code, count, MAX_STEPS_PER_REQUEST
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderLine;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_step_passes() {
        let mut step = PlannedStep::new(OrderLine::bare("MAT-01"), "TORNIO", "Lavorazione");
        step.start_date = Some(ymd(2024, 1, 15));
        step.end_date = Some(ymd(2024, 1, 15));
        assert!(ManualStepValidator::new().validate_step(&step).is_ok());
    }

    #[test]
    fn test_collects_all_violations() {
        let mut step = PlannedStep::new(OrderLine::bare(""), " ", "Lavorazione");
        step.start_date = Some(ymd(2024, 1, 15));
        step.end_date = Some(ymd(2024, 1, 10));

        let err = ManualStepValidator::new().validate_step(&step).unwrap_err();
        match err {
            ApiError::ManualOperationValidationError { violations, .. } => {
                let kinds: Vec<&str> = violations
                    .iter()
                    .map(|v| v.violation_type.as_str())
                    .collect();
                assert_eq!(kinds, vec!["MISSING_FIELD", "MISSING_FIELD", "DATE_ORDER"]);
                assert_eq!(violations[1].field, "Macchina");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_request_step_limit() {
        let mut request = ScheduleRequest {
            material_code: "MAT-01".to_string(),
            purchase_order: None,
            position: None,
            machine: "TORNIO".to_string(),
            work_steps: MAX_STEPS_PER_REQUEST as u32,
            treatment_steps: 0,
            external_steps: 0,
            quality_control: false,
            packaging: false,
            supplier: None,
            operator: None,
        };
        let validator = ManualStepValidator::new();
        assert!(validator.validate_request(&request).is_ok());

        request.packaging = true;
        assert!(matches!(
            validator.validate_request(&request),
            Err(ApiError::InvalidInput(_))
        ));

        request.work_steps = u32::MAX;
        request.treatment_steps = u32::MAX;
        assert!(validator.validate_request(&request).is_err());
    }
}
