//! YAML 配置文档加载
//!
//! 文档结构固定为顶层一个 `jrk_settings` 映射：
//!
//! ```yaml
//! jrk_settings:
//!   input_mode: JRK_INPUT_MODE_ANALOG
//!   feedback_mode: JRK_FEEDBACK_MODE_ANALOG
//!   pid_period: 10
//!   motor_invert: true
//! ```
//!
//! 值可以是整数、布尔或 `JRK_` 前缀的符号常量名。schema 之外的键
//! 记 debug 日志后跳过，不中断其余键的加载。所有键都只暂存进
//! `local` 副本，加载结束后在 `auto_apply` 打开时执行一次（且仅
//! 一次）应用流水线。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use jrk_driver::{DriverError, UsageError};
use jrk_protocol::{FieldValue, SettingsRecord, constants};
use serde::Deserialize;
use tracing::{debug, info};

use crate::resolve_symbol;
use crate::settings::Settings;

/// 配置文档的固定外壳
#[derive(Debug, Deserialize)]
struct ConfigDoc {
    jrk_settings: BTreeMap<String, serde_yaml::Value>,
}

impl Settings<'_> {
    /// 从 YAML 文件加载配置到 `local` 副本
    pub fn load_config<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DriverError> {
        let text = fs::read_to_string(path.as_ref())?;
        info!("Loading settings from {}", path.as_ref().display());
        self.load_config_str(&text)
    }

    /// 从 YAML 文本加载配置到 `local` 副本
    ///
    /// 已知键全部暂存完成后，`auto_apply` 打开时只触发一次
    /// [`Settings::apply`]，不是每键一次。
    pub fn load_config_str(&mut self, text: &str) -> Result<(), DriverError> {
        let doc: ConfigDoc = serde_yaml::from_str(text)
            .map_err(|e| UsageError::InvalidDocument(e.to_string()))?;

        for (key, raw) in &doc.jrk_settings {
            let Some(spec) = SettingsRecord::field(key) else {
                debug!("Skipping unknown settings key: {key}");
                continue;
            };
            let value = coerce_value(key, raw)?;
            let value = FieldValue::from_i64(spec.kind, value).map_err(|_| {
                UsageError::ValueOutOfRange {
                    kind: spec.kind,
                    value,
                }
            })?;
            spec.write(self.local_mut(), value)?;
        }

        if self.auto_apply() {
            self.apply()?;
        }
        Ok(())
    }
}

/// 把一个 YAML 标量归一成整数：数字原样、布尔取 0/1、
/// `JRK_` 前缀字符串查符号表
fn coerce_value(key: &str, raw: &serde_yaml::Value) -> Result<i64, DriverError> {
    match raw {
        serde_yaml::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| UsageError::MalformedValue(key.to_string()).into()),
        serde_yaml::Value::Bool(b) => Ok(i64::from(*b)),
        serde_yaml::Value::String(s) if constants::is_symbol(s) => {
            resolve_symbol(s).map_err(DriverError::from)
        }
        _ => Err(UsageError::MalformedValue(key.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jrk_driver::JrkSession;
    use jrk_usb::mock::{MockBus, MockDevice, MockOp};

    fn connected() -> (MockBus, &'static str) {
        let mut bus = MockBus::new();
        bus.add_device(MockDevice::new("00123", 0x00C0));
        (bus, "00123")
    }

    const DOC: &str = "\
jrk_settings:
  input_mode: JRK_INPUT_MODE_ANALOG
  feedback_mode: JRK_FEEDBACK_MODE_ANALOG
  pid_period: 25
  proportional_multiplier: 44
  proportional_exponent: 3
  motor_invert: true
  not_a_real_key: 17
  another_bogus_key: JRK_INPUT_MODE_RC
";

    #[test]
    fn test_known_keys_staged_unknown_skipped() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();
        bus.device(serial).unwrap().clear_journal();

        settings.load_config_str(DOC).unwrap();

        // 全部只暂存，不产生设备写入
        assert!(bus.device(serial).unwrap().journal().is_empty());
        let local = settings.local();
        assert_eq!(local.input_mode, 1);
        assert_eq!(local.feedback_mode, 1);
        assert_eq!(local.pid_period, 25);
        assert_eq!(local.proportional_multiplier, 44);
        assert_eq!(local.proportional_exponent, 3);
        assert!(local.motor_invert);
    }

    #[test]
    fn test_auto_apply_fires_exactly_once() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();
        settings.set_auto_apply(true);
        bus.device(serial).unwrap().clear_journal();

        settings.load_config_str(DOC).unwrap();

        let device = bus.device(serial).unwrap();
        assert_eq!(device.op_count(MockOp::SetEepromSettings), 1);
        assert_eq!(device.op_count(MockOp::Reinitialize), 1);
        assert_eq!(device.settings().pid_period, 25);
    }

    #[test]
    fn test_unknown_symbol_is_usage_fault() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();

        let doc = "jrk_settings:\n  input_mode: JRK_INPUT_MODE_TELEPATHY\n";
        let err = settings.load_config_str(doc).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Usage(UsageError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_non_symbol_string_is_malformed() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();

        let doc = "jrk_settings:\n  pid_period: fast\n";
        let err = settings.load_config_str(doc).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Usage(UsageError::MalformedValue(_))
        ));
    }

    #[test]
    fn test_out_of_range_value_is_usage_fault() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();

        let doc = "jrk_settings:\n  input_mode: 300\n";
        let err = settings.load_config_str(doc).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Usage(UsageError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_missing_top_level_key_is_invalid_document() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();

        let err = settings.load_config_str("pid_period: 25\n").unwrap_err();
        assert!(matches!(
            err,
            DriverError::Usage(UsageError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();

        let err = settings.load_config("/no/such/config.yml").unwrap_err();
        assert!(matches!(err, DriverError::Io(_)));
    }
}
