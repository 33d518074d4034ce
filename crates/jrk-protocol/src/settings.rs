//! EEPROM 配置记录 schema
//!
//! 字段集合是外部定义的设备 schema 在本 SDK 中的唯一落点：
//! 新字段只在这里引入，上层的 get/set、配置加载、fix 全部由表驱动。

use crate::jrk_record;

jrk_record! {
    /// 设备 EEPROM 中持久化的完整配置记录
    ///
    /// 一份实例作为 "local"（已暂存、未确认写入设备），另一份作为
    /// "device"（最近一次从 EEPROM 拉取的快照），见 `jrk-client`。
    pub struct SettingsRecord {
        // 输入缩放
        input_mode: U8,
        input_error_minimum: U16,
        input_error_maximum: U16,
        input_minimum: U16,
        input_maximum: U16,
        input_neutral_minimum: U16,
        input_neutral_maximum: U16,
        output_minimum: U16,
        output_neutral: U16,
        output_maximum: U16,
        input_invert: Bool,
        input_scaling_degree: U8,
        input_detect_disconnect: Bool,
        input_analog_samples_exponent: U8,
        // 反馈
        feedback_mode: U8,
        feedback_error_minimum: U16,
        feedback_error_maximum: U16,
        feedback_minimum: U16,
        feedback_maximum: U16,
        feedback_invert: Bool,
        feedback_detect_disconnect: Bool,
        feedback_dead_zone: U8,
        feedback_analog_samples_exponent: U8,
        feedback_wraparound: Bool,
        // 串口
        serial_mode: U8,
        serial_baud_rate: U32,
        serial_timeout: U32,
        serial_device_number: U16,
        never_sleep: Bool,
        serial_enable_crc: Bool,
        // PID
        proportional_multiplier: U16,
        proportional_exponent: U8,
        integral_multiplier: U16,
        integral_exponent: U8,
        derivative_multiplier: U16,
        derivative_exponent: U8,
        pid_period: U16,
        integral_limit: U16,
        reset_integral: Bool,
        // 电机驱动
        pwm_frequency: U8,
        current_samples_exponent: U8,
        hard_overcurrent_threshold: U8,
        current_offset_calibration: I16,
        current_scale_calibration: I16,
        motor_invert: Bool,
        max_duty_cycle_while_feedback_out_of_range: U16,
        max_acceleration_forward: U16,
        max_acceleration_reverse: U16,
        max_deceleration_forward: U16,
        max_deceleration_reverse: U16,
        max_duty_cycle_forward: U16,
        max_duty_cycle_reverse: U16,
        brake_duration_forward: U32,
        brake_duration_reverse: U32,
        soft_current_limit_forward: U16,
        soft_current_limit_reverse: U16,
        // 故障响应
        error_enable: U16,
        error_latch: U16,
        error_hard: U16,
        vin_calibration: I16,
    }
}

impl SettingsRecord {
    /// 出厂默认配置
    ///
    /// mock 后端用它作为 restore-defaults 之后的 EEPROM 镜像；
    /// 真实设备的默认值由设备自身提供，这里的副本只需自洽。
    pub fn factory_defaults() -> Self {
        Self {
            input_mode: 0, // JRK_INPUT_MODE_SERIAL
            input_error_minimum: 0,
            input_error_maximum: 4095,
            input_minimum: 0,
            input_maximum: 4095,
            input_neutral_minimum: 2048,
            input_neutral_maximum: 2048,
            output_minimum: 0,
            output_neutral: 2048,
            output_maximum: 4095,
            input_invert: false,
            input_scaling_degree: 1, // JRK_SCALING_DEGREE_LINEAR
            input_detect_disconnect: false,
            input_analog_samples_exponent: 5,
            feedback_mode: 0, // JRK_FEEDBACK_MODE_NONE
            feedback_error_minimum: 0,
            feedback_error_maximum: 4095,
            feedback_minimum: 0,
            feedback_maximum: 4095,
            feedback_invert: false,
            feedback_detect_disconnect: false,
            feedback_dead_zone: 0,
            feedback_analog_samples_exponent: 5,
            feedback_wraparound: false,
            serial_mode: 0, // JRK_SERIAL_MODE_USB_DUAL_PORT
            serial_baud_rate: 9600,
            serial_timeout: 0,
            serial_device_number: 11,
            never_sleep: false,
            serial_enable_crc: false,
            proportional_multiplier: 0,
            proportional_exponent: 0,
            integral_multiplier: 0,
            integral_exponent: 0,
            derivative_multiplier: 0,
            derivative_exponent: 0,
            pid_period: 10,
            integral_limit: 1000,
            reset_integral: false,
            pwm_frequency: 0, // JRK_PWM_FREQUENCY_20
            current_samples_exponent: 7,
            hard_overcurrent_threshold: 1,
            current_offset_calibration: 0,
            current_scale_calibration: 0,
            motor_invert: false,
            max_duty_cycle_while_feedback_out_of_range: 600,
            max_acceleration_forward: 600,
            max_acceleration_reverse: 600,
            max_deceleration_forward: 600,
            max_deceleration_reverse: 600,
            max_duty_cycle_forward: 600,
            max_duty_cycle_reverse: 600,
            brake_duration_forward: 0,
            brake_duration_reverse: 0,
            soft_current_limit_forward: 0,
            soft_current_limit_reverse: 0,
            error_enable: 0,
            error_latch: 0,
            error_hard: 0,
            vin_calibration: 0,
        }
    }

    /// 渲染为 `name: value` 行（设备配置打印）
    pub fn to_display_string(&self) -> String {
        let mut out = String::new();
        for spec in Self::FIELDS {
            out.push_str(spec.name);
            out.push_str(": ");
            out.push_str(&spec.read(self).to_string());
            out.push('\n');
        }
        out
    }
}
