//! 遥测记录 schema
//!
//! 遥测是设备运行态的非持久快照：主记录（[`VariablesRecord`]）加上
//! 固定数量的逐引脚子记录（[`PinInfo`]）。快照每次整体读取、整体替换，
//! 从不做部分更新。

use crate::constants::CONTROL_PIN_COUNT;
use crate::{ProtocolError, jrk_record};

jrk_record! {
    /// 遥测主记录
    pub struct VariablesRecord {
        input: U16,
        target: U16,
        feedback: U16,
        scaled_feedback: U16,
        integral: I16,
        duty_cycle_target: I16,
        duty_cycle: I16,
        current_low_res: U8,
        pid_period_exceeded: Bool,
        pid_period_count: U16,
        /// 当前使电机停转的故障位掩码
        error_flags_halting: U16,
        /// 自上次清除以来出现过的故障位掩码
        error_flags_occurred: U16,
        vin_voltage: U16,
        current: U16,
        device_reset: U8,
        up_time: U32,
        rc_pulse_width: U16,
        fbt_reading: U16,
        raw_current: U16,
        encoded_hard_current_limit: U16,
        last_duty_cycle: I16,
        current_chopping_consecutive_count: U8,
        current_chopping_occurrence_count: U8,
    }
}

jrk_record! {
    /// 单个控制引脚的遥测子记录
    pub struct PinInfo {
        analog_reading: U16,
        digital_reading: Bool,
        pin_state: U8,
    }
}

/// 一次遥测读取的完整快照
///
/// 主记录后面紧跟 [`CONTROL_PIN_COUNT`] 个引脚子记录，按引脚序号排列。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariablesSnapshot {
    pub vars: VariablesRecord,
    pub pins: [PinInfo; CONTROL_PIN_COUNT],
}

impl VariablesSnapshot {
    /// 编码后的总字节数
    pub const ENCODED_LEN: usize =
        VariablesRecord::ENCODED_LEN + CONTROL_PIN_COUNT * PinInfo::ENCODED_LEN;

    /// 从紧凑布局解码完整快照
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < Self::ENCODED_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: Self::ENCODED_LEN,
                actual: buf.len(),
            });
        }
        let vars = VariablesRecord::decode(buf)?;
        let mut pins: [PinInfo; CONTROL_PIN_COUNT] = Default::default();
        let mut offset = VariablesRecord::ENCODED_LEN;
        for pin in pins.iter_mut() {
            *pin = PinInfo::decode(&buf[offset..offset + PinInfo::ENCODED_LEN])?;
            offset += PinInfo::ENCODED_LEN;
        }
        Ok(Self { vars, pins })
    }

    /// 编码为紧凑布局
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.vars.encode();
        buf.reserve(CONTROL_PIN_COUNT * PinInfo::ENCODED_LEN);
        for pin in &self.pins {
            buf.extend_from_slice(&pin.encode());
        }
        buf
    }
}
