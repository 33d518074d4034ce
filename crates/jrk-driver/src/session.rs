//! 设备会话
//!
//! 一个 [`JrkSession`] 持有恰好一个已打开的传输句柄，是所有设备
//! 读写的必经单位。记录的 encode/decode 只发生在这里：会话之上的
//! 代码只见值类型，之下只见原始字节。
//!
//! 每个设备操作要么完整成功，要么记一条 error 日志并把故障作为
//! `Err` 传出去；会话从不重试，重试策略留给调用方。

use jrk_protocol::{CommandId, SettingsRecord, VariablesSnapshot};
use jrk_usb::{JrkBus, JrkTransport};
use tracing::{error, info, warn};

use crate::error::DriverError;

/// 枚举当前连接的设备序列号
///
/// 空列表不是故障：记一条 warning，返回空序列。
pub fn list_connected_device_serial_numbers(
    bus: &dyn JrkBus,
) -> Result<Vec<String>, DriverError> {
    let devices = bus.list_devices().map_err(|e| {
        error!("device enumeration failed: {e}");
        DriverError::from(e)
    })?;
    if devices.is_empty() {
        warn!("No jrk devices connected.");
    }
    Ok(devices.into_iter().map(|d| d.serial_number).collect())
}

/// 到一台物理设备的已打开会话
///
/// 独占句柄所有权；遥测镜像和配置双副本（`jrk-client`）只借用会话，
/// 生命周期不超过它。单线程阻塞使用，没有内部锁。
pub struct JrkSession {
    transport: Box<dyn JrkTransport>,
    serial_number: String,
    product: u32,
}

impl std::fmt::Debug for JrkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JrkSession")
            .field("serial_number", &self.serial_number)
            .field("product", &self.product)
            .finish_non_exhaustive()
    }
}

impl JrkSession {
    /// 按序列号连接
    ///
    /// 序列号不在枚举列表中时返回 `NotFound`，不打开任何句柄，
    /// 也不留下半初始化状态。
    pub fn connect(bus: &dyn JrkBus, serial_number: &str) -> Result<Self, DriverError> {
        let devices = bus.list_devices().map_err(|e| {
            error!("device enumeration failed: {e}");
            DriverError::from(e)
        })?;
        let Some(summary) = devices.iter().find(|d| d.serial_number == serial_number) else {
            error!("Serial number device not found.");
            return Err(DriverError::NotFound {
                serial: serial_number.to_string(),
            });
        };
        let transport = bus.open(serial_number).map_err(|e| {
            error!("failed to open jrk {serial_number}: {e}");
            DriverError::from(e)
        })?;
        info!("connected to jrk {serial_number} (product {:#06x})", summary.product);
        Ok(Self {
            transport,
            serial_number: serial_number.to_string(),
            product: summary.product,
        })
    }

    /// 已连接设备的序列号
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// 已连接设备的产品型号
    pub fn product(&self) -> u32 {
        self.product
    }

    /// 拉取一份新鲜的遥测快照
    ///
    /// 快照整体读取、整体替换，从不部分更新。
    pub fn pull_variables(&self, clear_errors: bool) -> Result<VariablesSnapshot, DriverError> {
        let raw = self
            .transport
            .get_variables(clear_errors)
            .map_err(|e| self.device_fault("get variables", e))?;
        Ok(VariablesSnapshot::decode(&raw)?)
    }

    /// 拉取设备 EEPROM 中的配置记录
    pub fn pull_settings(&self) -> Result<SettingsRecord, DriverError> {
        let raw = self
            .transport
            .get_eeprom_settings()
            .map_err(|e| self.device_fault("get eeprom settings", e))?;
        Ok(SettingsRecord::decode(&raw)?)
    }

    /// 把一份配置记录写入设备 EEPROM
    pub fn push_settings(&self, settings: &SettingsRecord) -> Result<(), DriverError> {
        self.transport
            .set_eeprom_settings(&settings.encode())
            .map_err(|e| self.device_fault("set eeprom settings", e))
    }

    /// 恢复出厂默认配置
    pub fn restore_factory_defaults(&self) -> Result<(), DriverError> {
        self.transport
            .restore_defaults()
            .map_err(|e| self.device_fault("restore defaults", e))
    }

    /// 让设备从 EEPROM 重新加载运行配置
    pub fn reinitialize(&self) -> Result<(), DriverError> {
        self.transport
            .reinitialize()
            .map_err(|e| self.device_fault("reinitialize", e))
    }

    /// 发出一条设备命令（一次往返）
    pub fn issue(&self, id: CommandId, value: Option<u16>) -> Result<(), DriverError> {
        self.transport
            .command(id, value)
            .map_err(|e| self.device_fault(id.name(), e))
    }

    fn device_fault(&self, op: &str, e: jrk_usb::TransportError) -> DriverError {
        error!("jrk {}: {op} failed: {e}", self.serial_number);
        DriverError::from(e)
    }
}
