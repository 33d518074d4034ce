//! Mock 后端（无硬件）
//!
//! 内存中的假设备：EEPROM 镜像从出厂默认值播种，遥测镜像可由测试
//! 注入。每次成功的原语调用都写入操作日志，测试可以精确断言
//! "写了几次、按什么顺序"；`fail_next` 注入一次性故障。

use std::sync::Arc;

use jrk_protocol::{CommandId, SettingsRecord, VariablesSnapshot};
use parking_lot::Mutex;

use crate::{
    DeviceSummary, JrkBus, JrkTransport, TransportError, TransportErrorKind,
};

/// 操作日志中的一条记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    GetVariables,
    GetEepromSettings,
    SetEepromSettings,
    RestoreDefaults,
    Reinitialize,
    Command(CommandId),
}

#[derive(Debug)]
struct MockDeviceInner {
    serial_number: String,
    product: u32,
    eeprom: SettingsRecord,
    variables: VariablesSnapshot,
    journal: Vec<MockOp>,
    failures: Vec<(MockOp, String)>,
}

/// 一台假设备的共享句柄
///
/// `Clone` 共享同一内部状态：总线、传输和测试代码各持一份即可。
#[derive(Debug, Clone)]
pub struct MockDevice {
    inner: Arc<Mutex<MockDeviceInner>>,
}

impl MockDevice {
    pub fn new(serial_number: impl Into<String>, product: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockDeviceInner {
                serial_number: serial_number.into(),
                product,
                eeprom: SettingsRecord::factory_defaults(),
                variables: VariablesSnapshot::default(),
                journal: Vec::new(),
                failures: Vec::new(),
            })),
        }
    }

    pub fn serial_number(&self) -> String {
        self.inner.lock().serial_number.clone()
    }

    pub fn product(&self) -> u32 {
        self.inner.lock().product
    }

    /// 当前 EEPROM 镜像
    pub fn settings(&self) -> SettingsRecord {
        self.inner.lock().eeprom.clone()
    }

    /// 当前遥测镜像
    pub fn variables(&self) -> VariablesSnapshot {
        self.inner.lock().variables.clone()
    }

    /// 注入遥测镜像（下次 get_variables 返回它）
    pub fn set_variables(&self, snapshot: VariablesSnapshot) {
        self.inner.lock().variables = snapshot;
    }

    /// 让下一次匹配的原语调用失败一次
    pub fn fail_next(&self, op: MockOp, message: impl Into<String>) {
        self.inner.lock().failures.push((op, message.into()));
    }

    /// 操作日志副本
    pub fn journal(&self) -> Vec<MockOp> {
        self.inner.lock().journal.clone()
    }

    /// 某种操作的成功次数
    pub fn op_count(&self, op: MockOp) -> usize {
        self.inner.lock().journal.iter().filter(|o| **o == op).count()
    }

    /// 清空操作日志（测试分段计数用）
    pub fn clear_journal(&self) {
        self.inner.lock().journal.clear();
    }

    fn summary(&self) -> DeviceSummary {
        let inner = self.inner.lock();
        DeviceSummary {
            serial_number: inner.serial_number.clone(),
            product: inner.product,
        }
    }
}

/// 假总线：固定的设备列表
#[derive(Debug, Default)]
pub struct MockBus {
    devices: Vec<MockDevice>,
}

impl MockBus {
    /// 空总线（没有设备连接）
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&mut self, device: MockDevice) {
        self.devices.push(device);
    }

    /// 按序列号取设备句柄（测试断言用）
    pub fn device(&self, serial_number: &str) -> Option<&MockDevice> {
        self.devices
            .iter()
            .find(|d| d.serial_number() == serial_number)
    }
}

impl JrkBus for MockBus {
    fn list_devices(&self) -> Result<Vec<DeviceSummary>, TransportError> {
        Ok(self.devices.iter().map(MockDevice::summary).collect())
    }

    fn open(&self, serial_number: &str) -> Result<Box<dyn JrkTransport>, TransportError> {
        match self.device(serial_number) {
            Some(device) => Ok(Box::new(MockTransport {
                device: device.clone(),
            })),
            None => Err(TransportError::new(
                TransportErrorKind::NotFound,
                format!("no jrk with serial number {serial_number}"),
            )),
        }
    }
}

struct MockTransport {
    device: MockDevice,
}

impl MockTransport {
    /// 故障注入检查；通过则记入日志
    fn begin(&self, op: MockOp) -> Result<parking_lot::MutexGuard<'_, MockDeviceInner>, TransportError> {
        let mut inner = self.device.inner.lock();
        if let Some(pos) = inner.failures.iter().position(|(f, _)| *f == op) {
            let (_, message) = inner.failures.remove(pos);
            return Err(TransportError::new(TransportErrorKind::Backend, message));
        }
        inner.journal.push(op);
        Ok(inner)
    }
}

impl JrkTransport for MockTransport {
    fn get_variables(&self, clear_errors: bool) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.begin(MockOp::GetVariables)?;
        let raw = inner.variables.encode();
        if clear_errors {
            inner.variables.vars.error_flags_occurred = 0;
        }
        Ok(raw)
    }

    fn get_eeprom_settings(&self) -> Result<Vec<u8>, TransportError> {
        let inner = self.begin(MockOp::GetEepromSettings)?;
        Ok(inner.eeprom.encode())
    }

    fn set_eeprom_settings(&self, raw: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.begin(MockOp::SetEepromSettings)?;
        inner.eeprom = SettingsRecord::decode(raw).map_err(|e| {
            TransportError::new(
                TransportErrorKind::InvalidResponse,
                format!("malformed settings record: {e}"),
            )
        })?;
        Ok(())
    }

    fn restore_defaults(&self) -> Result<(), TransportError> {
        let mut inner = self.begin(MockOp::RestoreDefaults)?;
        inner.eeprom = SettingsRecord::factory_defaults();
        Ok(())
    }

    fn reinitialize(&self) -> Result<(), TransportError> {
        let _inner = self.begin(MockOp::Reinitialize)?;
        Ok(())
    }

    fn command(&self, id: CommandId, value: Option<u16>) -> Result<(), TransportError> {
        let mut inner = self.begin(MockOp::Command(id))?;
        // 最小的行为模拟，足够让客户端测试看到效果
        match id {
            CommandId::SetTarget => {
                inner.variables.vars.target = value.unwrap_or(0);
            },
            CommandId::StopMotor => {
                inner.variables.vars.duty_cycle = 0;
                inner.variables.vars.error_flags_halting |= 1; // awaiting command
            },
            CommandId::ForceDutyCycleTarget
            | CommandId::ForceDutyCycle
            | CommandId::Reinitialize => {},
        }
        Ok(())
    }
}
