//! 会话层错误类型定义

use jrk_protocol::{FieldKind, ProtocolError};
use jrk_usb::TransportError;
use thiserror::Error;

/// 会话层错误类型
///
/// `Device` 和 `NotFound` 是运行环境问题，调用方可以跳过字段、
/// 换台设备重试；`Usage` 是调用方的编程错误，对触发它的那次调用
/// 是终止性的。两类刻意分开，测试可以独立于硬件状态断言调用错误。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 设备调用报告了一个故障
    #[error("Device fault: {message}")]
    Device { message: String },

    /// 请求的序列号不在枚举列表中
    #[error("No jrk with serial number {serial} connected")]
    NotFound { serial: String },

    /// 调用方用法错误
    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    /// 记录编解码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 读取配置文件失败
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for DriverError {
    fn from(e: TransportError) -> Self {
        DriverError::Device {
            message: e.to_string(),
        }
    }
}

/// 调用方编程错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError {
    /// 字段名不在 schema 中
    #[error("Unknown field name: {0}")]
    UnknownField(String),

    /// 命令名不在命令表中
    #[error("Unknown command name: {0}")]
    UnknownCommand(String),

    /// 引脚序号越界
    #[error("Pin index {pin} out of range (pin count: {count})")]
    PinOutOfRange { pin: usize, count: usize },

    /// 有参命令缺少参数
    #[error("Command {0} requires a value")]
    MissingValue(String),

    /// 无参命令带了参数
    #[error("Command {0} does not take a value")]
    UnexpectedValue(String),

    /// 符号常量名无法解析
    #[error("Unknown symbolic constant: {0}")]
    UnknownSymbol(String),

    /// 参数值超出字段类型范围
    #[error("Value {value} out of range for {kind:?}")]
    ValueOutOfRange { kind: FieldKind, value: i64 },

    /// 配置值既不是数字/布尔也不是符号常量
    #[error("Malformed value for {0}")]
    MalformedValue(String),

    /// 配置文档不符合约定的结构
    #[error("Invalid settings document: {0}")]
    InvalidDocument(String),
}
