//! 故障位表
//!
//! 设备以位掩码报告故障：每个置位的 bit 独立表示一种激活/锁存的故障。
//! 这里定义 bit 位置到符号名的静态映射和纯函数解码。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 设备故障码（值即位掩码中的 bit 位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ErrorCode {
    AwaitingCommand = 0,
    NoPower = 1,
    MotorDriver = 2,
    InputInvalid = 3,
    InputDisconnect = 4,
    FeedbackDisconnect = 5,
    SoftOvercurrent = 6,
    SerialSignal = 7,
    SerialOverrun = 8,
    SerialBufferFull = 9,
    SerialCrc = 10,
    SerialProtocol = 11,
    SerialTimeout = 12,
    HardOvercurrent = 13,
}

impl ErrorCode {
    /// 全部故障码，按 bit 位置排序
    pub const ALL: [ErrorCode; 14] = [
        ErrorCode::AwaitingCommand,
        ErrorCode::NoPower,
        ErrorCode::MotorDriver,
        ErrorCode::InputInvalid,
        ErrorCode::InputDisconnect,
        ErrorCode::FeedbackDisconnect,
        ErrorCode::SoftOvercurrent,
        ErrorCode::SerialSignal,
        ErrorCode::SerialOverrun,
        ErrorCode::SerialBufferFull,
        ErrorCode::SerialCrc,
        ErrorCode::SerialProtocol,
        ErrorCode::SerialTimeout,
        ErrorCode::HardOvercurrent,
    ];

    /// 位掩码中的 bit 位置
    pub fn bit(self) -> u8 {
        self.into()
    }

    /// `JRK_ERROR_*` 符号名
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::AwaitingCommand => "JRK_ERROR_AWAITING_COMMAND",
            ErrorCode::NoPower => "JRK_ERROR_NO_POWER",
            ErrorCode::MotorDriver => "JRK_ERROR_MOTOR_DRIVER",
            ErrorCode::InputInvalid => "JRK_ERROR_INPUT_INVALID",
            ErrorCode::InputDisconnect => "JRK_ERROR_INPUT_DISCONNECT",
            ErrorCode::FeedbackDisconnect => "JRK_ERROR_FEEDBACK_DISCONNECT",
            ErrorCode::SoftOvercurrent => "JRK_ERROR_SOFT_OVERCURRENT",
            ErrorCode::SerialSignal => "JRK_ERROR_SERIAL_SIGNAL",
            ErrorCode::SerialOverrun => "JRK_ERROR_SERIAL_OVERRUN",
            ErrorCode::SerialBufferFull => "JRK_ERROR_SERIAL_BUFFER_FULL",
            ErrorCode::SerialCrc => "JRK_ERROR_SERIAL_CRC",
            ErrorCode::SerialProtocol => "JRK_ERROR_SERIAL_PROTOCOL",
            ErrorCode::SerialTimeout => "JRK_ERROR_SERIAL_TIMEOUT",
            ErrorCode::HardOvercurrent => "JRK_ERROR_HARD_OVERCURRENT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 解码故障位掩码为激活的故障码集合（按 bit 位置排序）
///
/// 纯函数：掩码是派生数据，每次遥测读取重新解码，从不被存储。
pub fn decode_error_mask(mask: u16) -> Vec<ErrorCode> {
    ErrorCode::ALL
        .into_iter()
        .filter(|code| (mask >> code.bit()) & 1 == 1)
        .collect()
}
