//! 配置合法化规则（fix）
//!
//! 暂存配置写入 EEPROM 之前先过一遍 clamp/调整：
//! 非法值被就地修正，每处修正产生一条人类可读的警告，永不失败。
//! 规则内容随 schema 版本走，和字段定义放在同一个 crate。

use crate::settings::SettingsRecord;

/// fix 过程中的一条非致命警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixWarning {
    /// 被调整的字段
    pub field: &'static str,
    /// 调整说明
    pub message: String,
}

impl std::fmt::Display for FixWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl FixWarning {
    fn clamped<T: std::fmt::Display>(field: &'static str, from: T, to: T) -> Self {
        Self {
            field,
            message: format!("value {from} out of range, changed to {to}"),
        }
    }

    fn raised<T: std::fmt::Display>(field: &'static str, from: T, to: T, reason: &str) -> Self {
        Self {
            field,
            message: format!("value {from} below {reason}, raised to {to}"),
        }
    }
}

/// PID 周期的合法区间（ms）
const PID_PERIOD_MIN: u16 = 1;
const PID_PERIOD_MAX: u16 = 8191;
/// PID 系数上限
const PID_MULTIPLIER_MAX: u16 = 1023;
const PID_EXPONENT_MAX: u8 = 15;
/// 模拟采样指数上限
const ANALOG_SAMPLES_EXPONENT_MAX: u8 = 10;
/// 占空比满刻度
const DUTY_CYCLE_MAX: u16 = 600;
/// 14-bit 串口设备号上限
const SERIAL_DEVICE_NUMBER_MAX: u16 = 16383;
/// 串口波特率合法区间
const SERIAL_BAUD_RATE_MIN: u32 = 2400;
const SERIAL_BAUD_RATE_MAX: u32 = 115_200;

fn clamp_u16(
    warnings: &mut Vec<FixWarning>,
    field: &'static str,
    value: &mut u16,
    min: u16,
    max: u16,
) {
    if *value < min || *value > max {
        let fixed = (*value).clamp(min, max);
        warnings.push(FixWarning::clamped(field, *value, fixed));
        *value = fixed;
    }
}

fn clamp_u8(warnings: &mut Vec<FixWarning>, field: &'static str, value: &mut u8, max: u8) {
    if *value > max {
        warnings.push(FixWarning::clamped(field, *value, max));
        *value = max;
    }
}

fn clamp_u32(
    warnings: &mut Vec<FixWarning>,
    field: &'static str,
    value: &mut u32,
    min: u32,
    max: u32,
) {
    if *value < min || *value > max {
        let fixed = (*value).clamp(min, max);
        warnings.push(FixWarning::clamped(field, *value, fixed));
        *value = fixed;
    }
}

/// 区间字段的顺序约束：`high` 不得小于 `low`，违反时抬高 `high`
fn enforce_order(
    warnings: &mut Vec<FixWarning>,
    low_name: &'static str,
    low: u16,
    high_name: &'static str,
    high: &mut u16,
) {
    if *high < low {
        warnings.push(FixWarning::raised(high_name, *high, low, low_name));
        *high = low;
    }
}

/// 合法化一份暂存配置
///
/// 修正后的值留在传入的记录里；返回的警告仅供记录，均非致命。
pub fn fix(settings: &mut SettingsRecord) -> Vec<FixWarning> {
    let mut warnings = Vec::new();
    let w = &mut warnings;

    // 输入区间顺序：error_min <= min <= neutral_min <= neutral_max <= max <= error_max
    enforce_order(
        w,
        "input_error_minimum",
        settings.input_error_minimum,
        "input_minimum",
        &mut settings.input_minimum,
    );
    enforce_order(
        w,
        "input_minimum",
        settings.input_minimum,
        "input_neutral_minimum",
        &mut settings.input_neutral_minimum,
    );
    enforce_order(
        w,
        "input_neutral_minimum",
        settings.input_neutral_minimum,
        "input_neutral_maximum",
        &mut settings.input_neutral_maximum,
    );
    enforce_order(
        w,
        "input_neutral_maximum",
        settings.input_neutral_maximum,
        "input_maximum",
        &mut settings.input_maximum,
    );
    enforce_order(
        w,
        "input_maximum",
        settings.input_maximum,
        "input_error_maximum",
        &mut settings.input_error_maximum,
    );

    // 反馈区间顺序
    enforce_order(
        w,
        "feedback_error_minimum",
        settings.feedback_error_minimum,
        "feedback_minimum",
        &mut settings.feedback_minimum,
    );
    enforce_order(
        w,
        "feedback_minimum",
        settings.feedback_minimum,
        "feedback_maximum",
        &mut settings.feedback_maximum,
    );
    enforce_order(
        w,
        "feedback_maximum",
        settings.feedback_maximum,
        "feedback_error_maximum",
        &mut settings.feedback_error_maximum,
    );

    // 输出区间
    enforce_order(
        w,
        "output_minimum",
        settings.output_minimum,
        "output_neutral",
        &mut settings.output_neutral,
    );
    enforce_order(
        w,
        "output_neutral",
        settings.output_neutral,
        "output_maximum",
        &mut settings.output_maximum,
    );

    // 采样指数
    clamp_u8(
        w,
        "input_analog_samples_exponent",
        &mut settings.input_analog_samples_exponent,
        ANALOG_SAMPLES_EXPONENT_MAX,
    );
    clamp_u8(
        w,
        "feedback_analog_samples_exponent",
        &mut settings.feedback_analog_samples_exponent,
        ANALOG_SAMPLES_EXPONENT_MAX,
    );

    // 串口
    clamp_u32(
        w,
        "serial_baud_rate",
        &mut settings.serial_baud_rate,
        SERIAL_BAUD_RATE_MIN,
        SERIAL_BAUD_RATE_MAX,
    );
    clamp_u16(
        w,
        "serial_device_number",
        &mut settings.serial_device_number,
        0,
        SERIAL_DEVICE_NUMBER_MAX,
    );

    // PID
    clamp_u16(
        w,
        "pid_period",
        &mut settings.pid_period,
        PID_PERIOD_MIN,
        PID_PERIOD_MAX,
    );
    clamp_u16(
        w,
        "proportional_multiplier",
        &mut settings.proportional_multiplier,
        0,
        PID_MULTIPLIER_MAX,
    );
    clamp_u16(
        w,
        "integral_multiplier",
        &mut settings.integral_multiplier,
        0,
        PID_MULTIPLIER_MAX,
    );
    clamp_u16(
        w,
        "derivative_multiplier",
        &mut settings.derivative_multiplier,
        0,
        PID_MULTIPLIER_MAX,
    );
    clamp_u8(
        w,
        "proportional_exponent",
        &mut settings.proportional_exponent,
        PID_EXPONENT_MAX,
    );
    clamp_u8(
        w,
        "integral_exponent",
        &mut settings.integral_exponent,
        PID_EXPONENT_MAX,
    );
    clamp_u8(
        w,
        "derivative_exponent",
        &mut settings.derivative_exponent,
        PID_EXPONENT_MAX,
    );

    // 占空比上限
    clamp_u16(
        w,
        "max_duty_cycle_forward",
        &mut settings.max_duty_cycle_forward,
        0,
        DUTY_CYCLE_MAX,
    );
    clamp_u16(
        w,
        "max_duty_cycle_reverse",
        &mut settings.max_duty_cycle_reverse,
        0,
        DUTY_CYCLE_MAX,
    );
    clamp_u16(
        w,
        "max_duty_cycle_while_feedback_out_of_range",
        &mut settings.max_duty_cycle_while_feedback_out_of_range,
        1,
        DUTY_CYCLE_MAX,
    );

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults_need_no_fix() {
        let mut settings = SettingsRecord::factory_defaults();
        let warnings = fix(&mut settings);
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(settings, SettingsRecord::factory_defaults());
    }

    #[test]
    fn test_pid_period_clamped() {
        let mut settings = SettingsRecord::factory_defaults();
        settings.pid_period = 0;
        let warnings = fix(&mut settings);
        assert_eq!(settings.pid_period, 1);
        assert!(warnings.iter().any(|w| w.field == "pid_period"));

        settings.pid_period = 60000;
        let warnings = fix(&mut settings);
        assert_eq!(settings.pid_period, 8191);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_inverted_input_range_raised() {
        let mut settings = SettingsRecord::factory_defaults();
        settings.input_minimum = 3000;
        settings.input_neutral_minimum = 100;
        let warnings = fix(&mut settings);
        // neutral_min 被抬到 min，neutral_max 再被抬到 neutral_min
        assert_eq!(settings.input_neutral_minimum, 3000);
        assert_eq!(settings.input_neutral_maximum, 3000);
        assert!(warnings.len() >= 2);
    }

    #[test]
    fn test_duty_cycle_cap() {
        let mut settings = SettingsRecord::factory_defaults();
        settings.max_duty_cycle_forward = 1000;
        let warnings = fix(&mut settings);
        assert_eq!(settings.max_duty_cycle_forward, 600);
        assert_eq!(warnings.len(), 1);
        // 警告是自由文本，一条一个事件
        assert!(warnings[0].to_string().contains("max_duty_cycle_forward"));
    }

    #[test]
    fn test_baud_rate_clamped_low() {
        let mut settings = SettingsRecord::factory_defaults();
        settings.serial_baud_rate = 300;
        fix(&mut settings);
        assert_eq!(settings.serial_baud_rate, 2400);
    }

    #[test]
    fn test_fix_is_idempotent() {
        let mut settings = SettingsRecord::factory_defaults();
        settings.pid_period = 0;
        settings.input_minimum = 4000;
        settings.serial_device_number = u16::MAX;
        fix(&mut settings);
        let second = fix(&mut settings);
        assert!(second.is_empty(), "second pass warned: {second:?}");
    }
}
