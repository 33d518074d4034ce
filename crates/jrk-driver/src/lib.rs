//! # Jrk Driver
//!
//! 设备会话层：枚举、按序列号连接、以及单句柄上的全部设备操作。
//!
//! ## 分层
//!
//! ```text
//! jrk-client（遥测镜像 / 配置双副本 / 命令分发）
//!     ↓ 借用
//! JrkSession（本 crate：句柄所有权 + 记录编解码边界）
//!     ↓ 原始字节
//! jrk-usb（JrkBus / JrkTransport）
//! ```

pub mod error;
pub mod session;

// 重新导出常用类型
pub use error::{DriverError, UsageError};
pub use session::{JrkSession, list_connected_device_serial_numbers};
