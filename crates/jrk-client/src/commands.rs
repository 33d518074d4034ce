//! 表驱动的命令分发器
//!
//! 所有运行时命令走同一条按名分发路径：查命令表、核对参数个数、
//! 解析符号常量、做范围检查，再交给会话发出。每个命令另有一个
//! 等价的类型化包装，参数形状在编译期固定。

use jrk_driver::{DriverError, JrkSession, UsageError};
use jrk_protocol::{CommandSpec, FieldValue};
use tracing::debug;

use crate::resolve_symbol;

/// 命令参数：字面数字或 `JRK_` 符号常量名
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandValue {
    Number(i64),
    Symbol(String),
}

impl From<i64> for CommandValue {
    fn from(v: i64) -> Self {
        CommandValue::Number(v)
    }
}

impl From<&str> for CommandValue {
    fn from(s: &str) -> Self {
        CommandValue::Symbol(s.to_string())
    }
}

/// 命令分发器，借用会话
pub struct Commands<'a> {
    session: &'a JrkSession,
}

impl<'a> Commands<'a> {
    pub fn new(session: &'a JrkSession) -> Self {
        Self { session }
    }

    /// 按名发出一个命令
    ///
    /// 参数个数必须与命令表一致：无参命令带参数、有参命令缺参数
    /// 都是用法错误，在触达设备之前返回。
    pub fn call(&self, name: &str, value: Option<CommandValue>) -> Result<(), DriverError> {
        let spec = CommandSpec::by_name(name)
            .ok_or_else(|| UsageError::UnknownCommand(name.to_string()))?;
        let payload = match (spec.value, value) {
            (None, None) => None,
            (None, Some(_)) => {
                return Err(UsageError::UnexpectedValue(name.to_string()).into());
            }
            (Some(_), None) => {
                return Err(UsageError::MissingValue(name.to_string()).into());
            }
            (Some(kind), Some(value)) => {
                let raw = match value {
                    CommandValue::Number(n) => n,
                    CommandValue::Symbol(sym) => resolve_symbol(&sym)?,
                };
                let checked = FieldValue::from_i64(kind, raw)
                    .map_err(|_| UsageError::ValueOutOfRange { kind, value: raw })?;
                Some(checked.as_i64() as u16)
            }
        };
        debug!("Issuing command {name}");
        self.session.issue(spec.id, payload)
    }

    /// 设置目标值（闭环目标或开环占空比目标，0..=4095）
    pub fn set_target(&self, target: u16) -> Result<(), DriverError> {
        self.call("set_target", Some(CommandValue::Number(i64::from(target))))
    }

    /// 停机并进入 awaiting-command 状态
    pub fn stop_motor(&self) -> Result<(), DriverError> {
        self.call("stop_motor", None)
    }

    /// 强制占空比目标（绕过输入与反馈环节）
    pub fn force_duty_cycle_target(&self) -> Result<(), DriverError> {
        self.call("force_duty_cycle_target", None)
    }

    /// 强制占空比（绕过整个控制环）
    pub fn force_duty_cycle(&self) -> Result<(), DriverError> {
        self.call("force_duty_cycle", None)
    }

    /// 重新从 EEPROM 加载运行配置
    pub fn reinitialize(&self, preserve_errors: u8) -> Result<(), DriverError> {
        self.call(
            "reinitialize",
            Some(CommandValue::Number(i64::from(preserve_errors))),
        )
    }
}
