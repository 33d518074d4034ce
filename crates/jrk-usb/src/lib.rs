//! # Jrk USB Transport Layer
//!
//! 传输硬件抽象层：枚举/打开设备（[`JrkBus`]）和单句柄设备原语
//! （[`JrkTransport`]）的统一接口。
//!
//! 所有原语都是阻塞调用，一次设备往返内返回；本层之上没有超时和重试。
//! 原语以原始字节缓冲区交互，记录的 encode/decode 发生在会话层
//! （`jrk-driver`），本层不理解寄存器语义。

use jrk_protocol::CommandId;
use thiserror::Error;

#[cfg(feature = "usb")]
pub mod usb;

#[cfg(feature = "usb")]
pub use usb::UsbBus;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockBus, MockDevice, MockOp};

/// 传输层错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Unknown,
    /// 请求的设备不在枚举列表中
    NotFound,
    /// 设备已断开
    NoDevice,
    AccessDenied,
    Busy,
    /// 设备应答长度/内容不合预期
    InvalidResponse,
    /// 后端库报告的其他错误
    Backend,
    Io,
}

/// 结构化传输错误（kind + 人类可读消息）
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 句柄级不可恢复（需要重新枚举/重新打开）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::NoDevice
                | TransportErrorKind::AccessDenied
                | TransportErrorKind::NotFound
        )
    }
}

impl From<String> for TransportError {
    fn from(message: String) -> Self {
        Self::new(TransportErrorKind::Unknown, message)
    }
}

impl From<&str> for TransportError {
    fn from(message: &str) -> Self {
        Self::new(TransportErrorKind::Unknown, message)
    }
}

/// 枚举结果中的一台设备
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub serial_number: String,
    /// 产品型号（USB product id）
    pub product: u32,
}

/// 设备枚举与打开
pub trait JrkBus {
    /// 枚举当前连接的设备
    fn list_devices(&self) -> Result<Vec<DeviceSummary>, TransportError>;

    /// 按序列号打开一个句柄
    ///
    /// 序列号不在枚举列表中时返回 `NotFound`，不产生任何副作用。
    fn open(&self, serial_number: &str) -> Result<Box<dyn JrkTransport>, TransportError>;
}

/// 单个已打开句柄上的设备原语
///
/// 每个方法对应一次设备往返，要么完整成功要么报告恰好一个故障。
/// 接收者是 `&self`：后端自行处理内部可变性，单线程阻塞使用。
pub trait JrkTransport {
    /// 读取完整遥测记录（原始字节）
    ///
    /// `clear_errors` 为 true 时同时清除已出现故障的锁存位。
    fn get_variables(&self, clear_errors: bool) -> Result<Vec<u8>, TransportError>;

    /// 读取 EEPROM 配置记录（原始字节）
    fn get_eeprom_settings(&self) -> Result<Vec<u8>, TransportError>;

    /// 写入 EEPROM 配置记录（原始字节）
    fn set_eeprom_settings(&self, raw: &[u8]) -> Result<(), TransportError>;

    /// 恢复出厂默认配置
    fn restore_defaults(&self) -> Result<(), TransportError>;

    /// 让设备从 EEPROM 重新加载运行配置
    fn reinitialize(&self) -> Result<(), TransportError>;

    /// 发出一条命令（有参命令带恰好一个原语参数）
    fn command(&self, id: CommandId, value: Option<u16>) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let e = TransportError::new(TransportErrorKind::NotFound, "serial 00123 not connected");
        let msg = format!("{e}");
        assert!(msg.contains("NotFound"));
        assert!(msg.contains("00123"));
    }

    #[test]
    fn test_is_fatal_classification() {
        assert!(TransportError::new(TransportErrorKind::NoDevice, "gone").is_fatal());
        assert!(TransportError::new(TransportErrorKind::AccessDenied, "perm").is_fatal());
        assert!(!TransportError::new(TransportErrorKind::Busy, "later").is_fatal());
        assert!(!TransportError::new(TransportErrorKind::InvalidResponse, "short").is_fatal());
    }

    #[test]
    fn test_from_str() {
        let e: TransportError = "something odd".into();
        assert_eq!(e.kind, TransportErrorKind::Unknown);
    }
}
