//! 设备命令表
//!
//! 运行时动作（设目标值、停机等）由一张声明式命令表描述：
//! 无参命令不带载荷，有参命令要求恰好一个原语参数。
//! 上层的命令分发器按名查表构建统一入口，不为单个命令写专属代码。

use crate::fields::FieldKind;

/// 设备命令标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// 设置目标值（闭环目标或开环占空比目标）
    SetTarget,
    /// 停机并进入 awaiting-command 状态
    StopMotor,
    /// 强制占空比目标
    ForceDutyCycleTarget,
    /// 强制占空比
    ForceDutyCycle,
    /// 重新从 EEPROM 加载运行配置
    Reinitialize,
}

impl CommandId {
    /// 命令名（与命令表一致）
    pub fn name(self) -> &'static str {
        match self {
            CommandId::SetTarget => "set_target",
            CommandId::StopMotor => "stop_motor",
            CommandId::ForceDutyCycleTarget => "force_duty_cycle_target",
            CommandId::ForceDutyCycle => "force_duty_cycle",
            CommandId::Reinitialize => "reinitialize",
        }
    }
}

/// 单个命令的形状描述
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    /// `None` 表示无参命令
    pub value: Option<FieldKind>,
}

/// 命令表
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        id: CommandId::SetTarget,
        name: "set_target",
        value: Some(FieldKind::U16),
    },
    CommandSpec {
        id: CommandId::StopMotor,
        name: "stop_motor",
        value: None,
    },
    CommandSpec {
        id: CommandId::ForceDutyCycleTarget,
        name: "force_duty_cycle_target",
        value: None,
    },
    CommandSpec {
        id: CommandId::ForceDutyCycle,
        name: "force_duty_cycle",
        value: None,
    },
    CommandSpec {
        id: CommandId::Reinitialize,
        name: "reinitialize",
        value: Some(FieldKind::U8),
    },
];

impl CommandSpec {
    /// 按名称查找命令
    pub fn by_name(name: &str) -> Option<&'static CommandSpec> {
        COMMANDS.iter().find(|spec| spec.name == name)
    }
}
