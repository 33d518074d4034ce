//! # Jrk Client
//!
//! 面向用户的主机侧接口：
//! - [`Variables`]：遥测镜像（每次按字段访问都拉取全新快照）
//! - [`Settings`]：配置双副本（local/device）与 fix → write →
//!   reinitialize 应用流水线，外加 YAML 配置加载
//! - [`Commands`]：表驱动的命令分发器
//!
//! 三者都只借用 [`JrkSession`]，不拥有句柄、不关闭句柄，
//! 生命周期不超过会话。
//!
//! # 使用场景
//!
//! ```no_run
//! use jrk_client::{Commands, JrkSession, Settings, Variables};
//! use jrk_usb::UsbBus;
//!
//! # fn main() -> Result<(), jrk_client::DriverError> {
//! let bus = UsbBus::new();
//! let serials = jrk_client::list_connected_device_serial_numbers(&bus)?;
//! let session = JrkSession::connect(&bus, &serials[0])?;
//!
//! let mut settings = Settings::new(&session)?;
//! settings.load_config("config/config.yml")?;
//! settings.apply()?;
//!
//! let commands = Commands::new(&session);
//! commands.set_target(2080)?;
//! commands.stop_motor()?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod settings;
pub mod variables;

// 重新导出常用类型
pub use commands::{CommandValue, Commands};
pub use settings::Settings;
pub use variables::Variables;

pub use jrk_driver::{
    DriverError, JrkSession, UsageError, list_connected_device_serial_numbers,
};
pub use jrk_protocol::{FieldValue, decode_error_mask};

use jrk_driver::UsageError as Usage;
use jrk_protocol::constants;

/// 解析一个 `JRK_` 前缀的符号常量名
///
/// 配置加载和命令参数共用这一条路径。
pub(crate) fn resolve_symbol(name: &str) -> Result<i64, Usage> {
    constants::lookup(name).ok_or_else(|| Usage::UnknownSymbol(name.to_string()))
}
