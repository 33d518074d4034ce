//! rusb 后端
//!
//! 通过 vendor 控制传输实现设备原语。请求码集中在下面的常量块里；
//! 线格式本身属于设备固件的契约，上层不再各自定义。

use std::time::Duration;

use jrk_protocol::{CommandId, SettingsRecord, VariablesSnapshot};
use rusb::{DeviceHandle, GlobalContext};
use tracing::debug;

use crate::{DeviceSummary, JrkBus, JrkTransport, TransportError, TransportErrorKind};

// ============================================================================
// USB IDs
// ============================================================================

/// Pololu vendor id
pub const VENDOR_ID: u16 = 0x1FFB;

/// jrk G2 系列 product id
pub const PRODUCT_IDS: &[u16] = &[0x00C0, 0x00C2, 0x00C4, 0x00C6, 0x00C8];

// ============================================================================
// Control Request Codes（native USB interface）
// ============================================================================

/// USB Control Transfer: Device to Host | Vendor | Device
const REQ_TYPE_IN: u8 = 0xC0;
/// USB Control Transfer: Host to Device | Vendor | Device
const REQ_TYPE_OUT: u8 = 0x40;

/// 读取遥测记录（wValue bit0 = clear occurred errors）
const REQ_GET_VARIABLES: u8 = 0xE5;
/// 读取 EEPROM 配置
const REQ_GET_EEPROM_SETTINGS: u8 = 0xE3;
/// 写入 EEPROM 配置
const REQ_SET_EEPROM_SETTINGS: u8 = 0xE1;
/// 恢复出厂默认
const REQ_RESTORE_DEFAULTS: u8 = 0xE7;
/// 从 EEPROM 重新加载运行配置
const REQ_REINITIALIZE: u8 = 0x10;
/// 设置目标值（wValue = target）
const REQ_SET_TARGET: u8 = 0x84;
/// 停机
const REQ_STOP_MOTOR: u8 = 0xFF;
/// 强制占空比目标（wValue = 有符号占空比的原始编码）
const REQ_FORCE_DUTY_CYCLE_TARGET: u8 = 0xF2;
/// 强制占空比
const REQ_FORCE_DUTY_CYCLE: u8 = 0xF4;

/// 单次控制传输超时
const CONTROL_TIMEOUT: Duration = Duration::from_millis(300);

fn backend_error(context: &str, e: rusb::Error) -> TransportError {
    let kind = match e {
        rusb::Error::NoDevice => TransportErrorKind::NoDevice,
        rusb::Error::NotFound => TransportErrorKind::NotFound,
        rusb::Error::Access => TransportErrorKind::AccessDenied,
        rusb::Error::Busy => TransportErrorKind::Busy,
        rusb::Error::Io => TransportErrorKind::Io,
        _ => TransportErrorKind::Backend,
    };
    TransportError::new(kind, format!("{context}: {e}"))
}

/// 基于 rusb 的设备枚举
#[derive(Debug, Default)]
pub struct UsbBus;

impl UsbBus {
    pub fn new() -> Self {
        Self
    }

    /// 遍历总线上的 jrk 设备，对每台调用 `f`
    ///
    /// 读不出描述符/序列号的设备跳过并记 debug 日志，不让一台坏设备
    /// 阻断整个枚举。
    fn for_each_device<T>(
        &self,
        mut f: impl FnMut(&rusb::Device<GlobalContext>, &DeviceSummary) -> Option<T>,
    ) -> Result<Option<T>, TransportError> {
        let devices = rusb::devices().map_err(|e| backend_error("enumerate devices", e))?;
        for device in devices.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(d) => d,
                Err(e) => {
                    debug!("skipping device without descriptor: {e}");
                    continue;
                },
            };
            if descriptor.vendor_id() != VENDOR_ID
                || !PRODUCT_IDS.contains(&descriptor.product_id())
            {
                continue;
            }
            let serial_number = match device
                .open()
                .and_then(|h| h.read_serial_number_string_ascii(&descriptor))
            {
                Ok(s) => s,
                Err(e) => {
                    debug!("skipping jrk without readable serial number: {e}");
                    continue;
                },
            };
            let summary = DeviceSummary {
                serial_number,
                product: descriptor.product_id() as u32,
            };
            if let Some(out) = f(&device, &summary) {
                return Ok(Some(out));
            }
        }
        Ok(None)
    }
}

impl JrkBus for UsbBus {
    fn list_devices(&self) -> Result<Vec<DeviceSummary>, TransportError> {
        let mut found = Vec::new();
        self.for_each_device::<()>(|_, summary| {
            found.push(summary.clone());
            None
        })?;
        Ok(found)
    }

    fn open(&self, serial_number: &str) -> Result<Box<dyn JrkTransport>, TransportError> {
        let opened = self.for_each_device(|device, summary| {
            if summary.serial_number != serial_number {
                return None;
            }
            Some(device.open().map(|handle| UsbTransport { handle }))
        })?;
        match opened {
            Some(Ok(transport)) => Ok(Box::new(transport)),
            Some(Err(e)) => Err(backend_error("open handle", e)),
            None => Err(TransportError::new(
                TransportErrorKind::NotFound,
                format!("no jrk with serial number {serial_number}"),
            )),
        }
    }
}

/// 一个已打开的 USB 句柄
pub struct UsbTransport {
    handle: DeviceHandle<GlobalContext>,
}

impl UsbTransport {
    fn read_exact(&self, request: u8, value: u16, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; len];
        let n = self
            .handle
            .read_control(REQ_TYPE_IN, request, value, 0, &mut buf, CONTROL_TIMEOUT)
            .map_err(|e| backend_error("control read", e))?;
        if n != len {
            return Err(TransportError::new(
                TransportErrorKind::InvalidResponse,
                format!("short control read: expected {len} bytes, got {n}"),
            ));
        }
        Ok(buf)
    }

    fn write(&self, request: u8, value: u16, data: &[u8]) -> Result<(), TransportError> {
        self.handle
            .write_control(REQ_TYPE_OUT, request, value, 0, data, CONTROL_TIMEOUT)
            .map_err(|e| backend_error("control write", e))?;
        Ok(())
    }
}

impl JrkTransport for UsbTransport {
    fn get_variables(&self, clear_errors: bool) -> Result<Vec<u8>, TransportError> {
        self.read_exact(
            REQ_GET_VARIABLES,
            clear_errors as u16,
            VariablesSnapshot::ENCODED_LEN,
        )
    }

    fn get_eeprom_settings(&self) -> Result<Vec<u8>, TransportError> {
        self.read_exact(REQ_GET_EEPROM_SETTINGS, 0, SettingsRecord::ENCODED_LEN)
    }

    fn set_eeprom_settings(&self, raw: &[u8]) -> Result<(), TransportError> {
        self.write(REQ_SET_EEPROM_SETTINGS, 0, raw)
    }

    fn restore_defaults(&self) -> Result<(), TransportError> {
        self.write(REQ_RESTORE_DEFAULTS, 0, &[])
    }

    fn reinitialize(&self) -> Result<(), TransportError> {
        self.write(REQ_REINITIALIZE, 0, &[])
    }

    fn command(&self, id: CommandId, value: Option<u16>) -> Result<(), TransportError> {
        let (request, w_value) = match id {
            CommandId::SetTarget => (REQ_SET_TARGET, value.unwrap_or(0)),
            CommandId::StopMotor => (REQ_STOP_MOTOR, 0),
            CommandId::ForceDutyCycleTarget => (REQ_FORCE_DUTY_CYCLE_TARGET, value.unwrap_or(0)),
            CommandId::ForceDutyCycle => (REQ_FORCE_DUTY_CYCLE, value.unwrap_or(0)),
            CommandId::Reinitialize => (REQ_REINITIALIZE, value.unwrap_or(0)),
        };
        self.write(request, w_value, &[])
    }
}
