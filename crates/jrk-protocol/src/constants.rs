//! `JRK_*` 符号常量表
//!
//! 配置文件和命令参数都可以用符号名代替整数值（以 `JRK_` 前缀识别），
//! 两条路径共用这一张表解析。

/// 控制引脚数量（逐引脚遥测子记录的固定长度）
pub const CONTROL_PIN_COUNT: usize = 5;

/// 符号常量表，按名称排列
///
/// 故障位名的值即 bit 位置，与 [`crate::ErrorCode`] 保持一致。
pub const SYMBOLS: &[(&str, i64)] = &[
    ("JRK_CONTROL_PIN_COUNT", CONTROL_PIN_COUNT as i64),
    // 故障位
    ("JRK_ERROR_AWAITING_COMMAND", 0),
    ("JRK_ERROR_NO_POWER", 1),
    ("JRK_ERROR_MOTOR_DRIVER", 2),
    ("JRK_ERROR_INPUT_INVALID", 3),
    ("JRK_ERROR_INPUT_DISCONNECT", 4),
    ("JRK_ERROR_FEEDBACK_DISCONNECT", 5),
    ("JRK_ERROR_SOFT_OVERCURRENT", 6),
    ("JRK_ERROR_SERIAL_SIGNAL", 7),
    ("JRK_ERROR_SERIAL_OVERRUN", 8),
    ("JRK_ERROR_SERIAL_BUFFER_FULL", 9),
    ("JRK_ERROR_SERIAL_CRC", 10),
    ("JRK_ERROR_SERIAL_PROTOCOL", 11),
    ("JRK_ERROR_SERIAL_TIMEOUT", 12),
    ("JRK_ERROR_HARD_OVERCURRENT", 13),
    // 输入模式
    ("JRK_INPUT_MODE_SERIAL", 0),
    ("JRK_INPUT_MODE_ANALOG", 1),
    ("JRK_INPUT_MODE_RC", 2),
    // 反馈模式
    ("JRK_FEEDBACK_MODE_NONE", 0),
    ("JRK_FEEDBACK_MODE_ANALOG", 1),
    ("JRK_FEEDBACK_MODE_FREQUENCY", 2),
    // 串口模式
    ("JRK_SERIAL_MODE_USB_DUAL_PORT", 0),
    ("JRK_SERIAL_MODE_USB_CHAINED", 1),
    ("JRK_SERIAL_MODE_UART", 2),
    // 输入缩放曲线
    ("JRK_SCALING_DEGREE_LINEAR", 1),
    ("JRK_SCALING_DEGREE_QUADRATIC", 2),
    ("JRK_SCALING_DEGREE_CUBIC", 3),
    // PWM 频率
    ("JRK_PWM_FREQUENCY_20", 0),
    ("JRK_PWM_FREQUENCY_5", 1),
    // 引脚序号
    ("JRK_PIN_NUM_SCL", 0),
    ("JRK_PIN_NUM_SDA", 1),
    ("JRK_PIN_NUM_TX", 2),
    ("JRK_PIN_NUM_RX", 3),
    ("JRK_PIN_NUM_RC", 4),
    // 引脚状态
    ("JRK_PIN_STATE_HIGH_IMPEDANCE", 0),
    ("JRK_PIN_STATE_PULLED_UP", 1),
    ("JRK_PIN_STATE_OUTPUT_LOW", 2),
    ("JRK_PIN_STATE_OUTPUT_HIGH", 3),
];

/// 名称是否形如符号常量（`JRK_` 前缀约定）
pub fn is_symbol(name: &str) -> bool {
    name.starts_with("JRK_")
}

/// 解析符号常量名
pub fn lookup(name: &str) -> Option<i64> {
    SYMBOLS
        .iter()
        .find(|(sym, _)| *sym == name)
        .map(|(_, value)| *value)
}
