// ==========================================
// 生产计划系统 - 交期估算引擎
// ==========================================
// 职责: 基准日期 + 状态 → 可复现的预计完成日期
// 红线: 同一键在任何机器、任何进程上结果一致
// ==========================================
// 算法: SHA-256(键) 前 4 字节 → ChaCha8 种子 → 在状态区间内抽一个整数天数
// ==========================================

use chrono::{Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

// ==========================================
// EtaRange - 天数区间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtaRange {
    Fixed(i64),           // 固定天数（无随机）
    Uniform(i64, i64),    // 闭区间均匀整数
}

impl EtaRange {
    /// 按状态（TRIM + UPPER）选区间
    ///
    /// | 状态              | 天数      |
    /// |-------------------|-----------|
    /// | SALA METROLOGICA  | 7（固定） |
    /// | OUTSOURCING       | [10, 14]  |
    /// | SCAFFALE          | [7, 15]   |
    /// | 其他（含空）      | [18, 30]  |
    pub fn for_status(status: &str) -> Self {
        match status.trim().to_uppercase().as_str() {
            "SALA METROLOGICA" => EtaRange::Fixed(7),
            "OUTSOURCING" => EtaRange::Uniform(10, 14),
            "SCAFFALE" => EtaRange::Uniform(7, 15),
            _ => EtaRange::Uniform(18, 30),
        }
    }
}

// ==========================================
// EtaEstimator - 交期估算引擎
// ==========================================
pub struct EtaEstimator {
    // 无状态引擎
}

impl Default for EtaEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl EtaEstimator {
    pub fn new() -> Self {
        Self {}
    }

    /// 组合随机种子键: "{匹配键}|{状态}|{YYYY-MM-DD}"
    pub fn seed_key(match_key: &str, status: &str, base_date: NaiveDate) -> String {
        format!("{}|{}|{}", match_key, status, base_date.format("%Y-%m-%d"))
    }

    /// 估算预计完成日期
    ///
    /// # 参数
    /// - base_date: 基准日期（投产日期）
    /// - status: 状态标签
    /// - key: 随机种子键（见 seed_key）
    pub fn estimate(&self, base_date: NaiveDate, status: &str, key: &str) -> NaiveDate {
        base_date + Duration::days(self.offset_days(status, key))
    }

    /// 状态对应的天数偏移
    pub fn offset_days(&self, status: &str, key: &str) -> i64 {
        match EtaRange::for_status(status) {
            EtaRange::Fixed(days) => days,
            EtaRange::Uniform(lo, hi) => stable_randint(key, lo, hi),
        }
    }
}

/// 可复现随机整数（闭区间）
///
/// SHA-256 摘要前 8 个十六进制位（4 字节，大端）作为种子；
/// 算法固定为 ChaCha8，跨版本、跨平台结果一致
fn stable_randint(seed_key: &str, lo: i64, hi: i64) -> i64 {
    let digest = Sha256::digest(seed_key.as_bytes());
    let seed = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
    rng.gen_range(lo..=hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let estimator = EtaEstimator::new();
        let base = ymd(2024, 1, 15);
        let a = estimator.estimate(base, "OUTSOURCING", "K");
        let b = estimator.estimate(base, "OUTSOURCING", "K");
        assert_eq!(a, b);
    }

    #[test]
    fn test_known_keys_give_pinned_offsets() {
        let estimator = EtaEstimator::new();
        assert_eq!(
            estimator.offset_days("SCAFFALE", "MAT-01|4500|10|SCAFFALE|2024-01-15"),
            7
        );
        assert_eq!(
            estimator.offset_days("OUTSOURCING", "MAT-01|4500012345|10|OUTSOURCING|2024-01-15"),
            11
        );
        assert_eq!(estimator.offset_days("", "K"), 21);
    }

    #[test]
    fn test_sala_metrologica_is_fixed_seven_days() {
        let estimator = EtaEstimator::new();
        let base = ymd(2024, 1, 15);
        for key in ["a", "b", "MAT|1|10|SALA METROLOGICA|2024-01-15", ""] {
            assert_eq!(estimator.estimate(base, "SALA METROLOGICA", key), ymd(2024, 1, 22));
        }
        assert_eq!(estimator.estimate(base, " sala metrologica ", "x"), ymd(2024, 1, 22));
    }

    #[test]
    fn test_scaffale_offset_within_range() {
        let estimator = EtaEstimator::new();
        for i in 0..500 {
            let key = format!("MAT-{}|4500|10|SCAFFALE|2024-01-15", i);
            let days = estimator.offset_days("SCAFFALE", &key);
            assert!((7..=15).contains(&days), "key={} days={}", key, days);
        }
    }

    #[test]
    fn test_outsourcing_and_default_ranges() {
        let estimator = EtaEstimator::new();
        for i in 0..300 {
            let key = format!("K{}", i);
            let out = estimator.offset_days("outsourcing", &key);
            assert!((10..=14).contains(&out));
            let default = estimator.offset_days("IN LAVORAZIONE", &key);
            assert!((18..=30).contains(&default));
        }
    }

    #[test]
    fn test_blank_status_uses_default_bucket() {
        assert_eq!(EtaRange::for_status("   "), EtaRange::Uniform(18, 30));
        assert_eq!(EtaRange::for_status(""), EtaRange::Uniform(18, 30));
    }

    #[test]
    fn test_seed_key_format() {
        assert_eq!(
            EtaEstimator::seed_key("MAT-01|4500|10", "SCAFFALE", ymd(2024, 1, 5)),
            "MAT-01|4500|10|SCAFFALE|2024-01-05"
        );
    }

    #[test]
    fn test_different_keys_spread_over_range() {
        let estimator = EtaEstimator::new();
        let distinct: std::collections::HashSet<i64> = (0..200)
            .map(|i| estimator.offset_days("SCAFFALE", &format!("key-{}", i)))
            .collect();
        assert!(distinct.len() > 1);
    }
}
