//! 库存服务业务指标

use metrics::{counter, histogram};
use std::time::Duration;

/// 记录一次库存校验
pub fn record_validation(valid: bool) {
    let labels = [("valid", valid.to_string())];
    counter!("sc_im_stock_validations_total", &labels).increment(1);
}

/// 记录一次出货扣减
pub fn record_deduction(line_count: usize) {
    counter!("sc_im_deductions_total").increment(1);
    counter!("sc_im_deducted_lines_total").increment(line_count as u64);
}

/// 记录一次截断扣减（可用量不足，余量被丢弃）
pub fn record_clamped_deduction(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!("sc_im_clamped_deductions_total", &labels).increment(1);
}

/// 记录一次库存重算
pub fn record_recalculation(duration: Duration, updated_records: u64) {
    counter!("sc_im_recalculations_total").increment(1);
    counter!("sc_im_recalculated_records_total").increment(updated_records);
    histogram!("sc_im_recalculation_duration_seconds").record(duration.as_secs_f64());
}
