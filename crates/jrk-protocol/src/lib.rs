//! # Jrk Protocol
//!
//! jrk 系列电机控制器的寄存器 schema 定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `fields`: 字段类型系统（`FieldKind` / `FieldValue` / `FieldSpec`）
//! - `settings`: EEPROM 配置记录 schema
//! - `variables`: 遥测记录 schema（含逐引脚子记录）
//! - `error_code`: 故障位表
//! - `constants`: `JRK_*` 符号常量表
//! - `command`: 设备命令表
//! - `fix`: 配置合法化（clamp）规则
//!
//! ## 字节布局
//!
//! 设备侧的原始结构布局对上层不可见。本 crate 把记录定义为普通值类型，
//! 并按 schema 顺序以 little-endian 紧凑编码进行 encode/decode，
//! 编解码只发生在会话边界（`jrk-driver`）。

pub mod command;
pub mod constants;
pub mod error_code;
pub mod fields;
pub mod fix;
pub mod settings;
pub mod variables;

// 重新导出常用类型
pub use command::{COMMANDS, CommandId, CommandSpec};
pub use constants::CONTROL_PIN_COUNT;
pub use error_code::{ErrorCode, decode_error_mask};
pub use fields::{FieldKind, FieldSpec, FieldValue};
pub use fix::{FixWarning, fix};
pub use settings::SettingsRecord;
pub use variables::{PinInfo, VariablesRecord, VariablesSnapshot};

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid record length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Value {value} out of range for {kind:?} field")]
    OutOfRange { kind: FieldKind, value: i64 },

    #[error("Expected a {expected:?} value, got {actual:?}")]
    KindMismatch { expected: FieldKind, actual: FieldKind },
}
