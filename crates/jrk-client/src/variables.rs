//! 遥测镜像
//!
//! 按字段的只读访问：每次调用都对设备做一次完整的遥测拉取，
//! 再从新鲜快照里取出请求的字段。没有缓存——连续读 N 个字段就是
//! N 次设备往返，用效率换"永远不陈旧"。需要批量读取时用
//! [`Variables::snapshot`] 一次拉取后自行索引，按字段 getter 的
//! 语义不受影响。
//!
//! 每次拉取都带清除标志：`error_flags_occurred` 的锁存位在读取的
//! 同时被清除，读到的掩码是"自上次读取以来出现过的故障"。

use jrk_driver::{DriverError, JrkSession, UsageError};
use jrk_protocol::{
    CONTROL_PIN_COUNT, FieldValue, PinInfo, VariablesRecord, VariablesSnapshot, decode_error_mask,
};
use tracing::error;

/// 故障位掩码字段：读到它们时解码并逐条上报激活的故障
const ERROR_MASK_FIELDS: [&str; 2] = ["error_flags_halting", "error_flags_occurred"];

/// 遥测的只读视图，借用会话
pub struct Variables<'a> {
    session: &'a JrkSession,
}

impl<'a> Variables<'a> {
    pub fn new(session: &'a JrkSession) -> Self {
        Self { session }
    }

    /// 读取主记录的一个字段（总是先拉取新鲜快照）
    ///
    /// 访问的是故障位掩码字段时，掩码同时被解码，每个激活的故障
    /// 单独记一条 error 日志；返回值不受影响。
    pub fn get(&self, name: &str) -> Result<FieldValue, DriverError> {
        let spec = VariablesRecord::field(name)
            .ok_or_else(|| UsageError::UnknownField(name.to_string()))?;
        let snapshot = self.session.pull_variables(true)?;
        let value = spec.read(&snapshot.vars);
        if ERROR_MASK_FIELDS.contains(&name) {
            if let FieldValue::U16(mask) = value {
                report_active_errors(mask);
            }
        }
        Ok(value)
    }

    /// 读取某个控制引脚子记录的一个字段（总是先拉取新鲜快照）
    ///
    /// 引脚序号越界是调用方错误，不是设备故障。
    pub fn get_pin(&self, pin: usize, name: &str) -> Result<FieldValue, DriverError> {
        if pin >= CONTROL_PIN_COUNT {
            return Err(UsageError::PinOutOfRange {
                pin,
                count: CONTROL_PIN_COUNT,
            }
            .into());
        }
        let spec =
            PinInfo::field(name).ok_or_else(|| UsageError::UnknownField(name.to_string()))?;
        let snapshot = self.session.pull_variables(true)?;
        Ok(spec.read(&snapshot.pins[pin]))
    }

    /// 一次拉取的完整快照（批量读取的便捷入口）
    pub fn snapshot(&self) -> Result<VariablesSnapshot, DriverError> {
        self.session.pull_variables(true)
    }
}

/// 解码故障位掩码，逐条上报
fn report_active_errors(mask: u16) {
    for code in decode_error_mask(mask) {
        error!("{code}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jrk_usb::mock::{MockBus, MockDevice, MockOp};

    fn connected() -> (MockBus, &'static str) {
        let mut bus = MockBus::new();
        bus.add_device(MockDevice::new("00123", 0x00C0));
        (bus, "00123")
    }

    #[test]
    fn test_every_get_pulls_fresh() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let variables = Variables::new(&session);

        variables.get("input").unwrap();
        variables.get("target").unwrap();
        variables.get("feedback").unwrap();

        let device = bus.device(serial).unwrap();
        assert_eq!(device.op_count(MockOp::GetVariables), 3);
    }

    #[test]
    fn test_get_returns_injected_value() {
        let (bus, serial) = connected();
        let device = bus.device(serial).unwrap().clone();
        let mut snap = VariablesSnapshot::default();
        snap.vars.vin_voltage = 12150;
        device.set_variables(snap);

        let session = JrkSession::connect(&bus, serial).unwrap();
        let variables = Variables::new(&session);
        assert_eq!(
            variables.get("vin_voltage").unwrap(),
            FieldValue::U16(12150)
        );
    }

    #[test]
    fn test_unknown_field_is_usage_fault() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let variables = Variables::new(&session);

        let err = variables.get("no_such_field").unwrap_err();
        assert!(matches!(
            err,
            DriverError::Usage(UsageError::UnknownField(_))
        ));
        // 用法错误不产生设备往返
        assert_eq!(bus.device(serial).unwrap().op_count(MockOp::GetVariables), 0);
    }

    #[test]
    fn test_pin_out_of_range_is_usage_fault() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let variables = Variables::new(&session);

        let err = variables.get_pin(5, "analog_reading").unwrap_err();
        assert!(matches!(
            err,
            DriverError::Usage(UsageError::PinOutOfRange { pin: 5, count: 5 })
        ));
    }

    #[test]
    fn test_pin_field_read() {
        let (bus, serial) = connected();
        let device = bus.device(serial).unwrap().clone();
        let mut snap = VariablesSnapshot::default();
        snap.pins[4].analog_reading = 1023;
        device.set_variables(snap);

        let session = JrkSession::connect(&bus, serial).unwrap();
        let variables = Variables::new(&session);
        assert_eq!(
            variables.get_pin(4, "analog_reading").unwrap(),
            FieldValue::U16(1023)
        );
    }

    #[test]
    fn test_error_mask_field_still_returns_value() {
        let (bus, serial) = connected();
        let device = bus.device(serial).unwrap().clone();
        let mut snap = VariablesSnapshot::default();
        snap.vars.error_flags_halting = 0b101;
        device.set_variables(snap);

        let session = JrkSession::connect(&bus, serial).unwrap();
        let variables = Variables::new(&session);
        // 解码走日志侧信道，返回值仍是原始掩码
        assert_eq!(
            variables.get("error_flags_halting").unwrap(),
            FieldValue::U16(0b101)
        );
    }

    #[test]
    fn test_occurred_errors_clear_on_read() {
        let (bus, serial) = connected();
        let device = bus.device(serial).unwrap().clone();
        let mut snap = VariablesSnapshot::default();
        snap.vars.error_flags_occurred = 0b101;
        device.set_variables(snap);

        let session = JrkSession::connect(&bus, serial).unwrap();
        let variables = Variables::new(&session);
        // 第一次读返回锁存的掩码并清除；第二次读已无故障
        assert_eq!(
            variables.get("error_flags_occurred").unwrap(),
            FieldValue::U16(0b101)
        );
        assert_eq!(
            variables.get("error_flags_occurred").unwrap(),
            FieldValue::U16(0)
        );
    }

    #[test]
    fn test_snapshot_is_single_pull() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let variables = Variables::new(&session);

        let snap = variables.snapshot().unwrap();
        assert_eq!(snap.pins.len(), CONTROL_PIN_COUNT);
        assert_eq!(bus.device(serial).unwrap().op_count(MockOp::GetVariables), 1);
    }
}
