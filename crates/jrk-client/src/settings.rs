//! 配置双副本与应用流水线
//!
//! 每个 [`Settings`] 实例维护两份配置记录：
//! - `local`：已暂存、尚未确认写入设备的副本。只有显式的
//!   字段 set 或配置加载会改它。
//! - `device`：最近一次从 EEPROM 拉取的快照。只有显式拉取会改它。
//!
//! 公开 getter 永远反映 `device`（取前先拉新），写入永远先落在
//! `local`。"设备上实际生效的是什么"以 `device` 为准。
//!
//! 应用流水线按 fix → write → reinitialize 顺序执行，第一个失败的
//! 步骤短路其余步骤；部分失败（fix 成功、write 失败）会留下已变异
//! 的 `local`，`device` 保持不变直到下一次成功拉取。

use jrk_driver::{DriverError, JrkSession, UsageError};
use jrk_protocol::{FieldValue, SettingsRecord, fix};
use tracing::{debug, info, warn};

/// 配置双副本，借用会话
pub struct Settings<'a> {
    session: &'a JrkSession,
    local: SettingsRecord,
    device: SettingsRecord,
    auto_apply: bool,
}

impl<'a> Settings<'a> {
    /// 构造并初始化
    ///
    /// 先恢复出厂默认、再拉取一次，把结果同时作为 `local` 和
    /// `device` 的种子。完成后即进入就绪状态，之后的每个操作都
    /// 保持就绪，直到会话被其所有者关闭。
    ///
    /// `auto_apply` 默认关闭：多个字段可以先暂存进 `local`，
    /// 再用一次 [`Settings::apply`] 写入。
    pub fn new(session: &'a JrkSession) -> Result<Self, DriverError> {
        session.restore_factory_defaults()?;
        let device = session.pull_settings()?;
        debug!("Settings restored to factory defaults");
        Ok(Self {
            session,
            local: device.clone(),
            device,
            auto_apply: false,
        })
    }

    /// 当前的 auto-apply 开关
    pub fn auto_apply(&self) -> bool {
        self.auto_apply
    }

    /// 打开后每次 `set` / `load_config` 都立即隐式 `apply()`
    pub fn set_auto_apply(&mut self, on: bool) {
        self.auto_apply = on;
    }

    /// 读取一个配置字段
    ///
    /// 总是先把 EEPROM 拉进 `device` 再返回，陈旧程度不超过
    /// "截至本次访问"。
    pub fn get(&mut self, name: &str) -> Result<FieldValue, DriverError> {
        let spec = SettingsRecord::field(name)
            .ok_or_else(|| UsageError::UnknownField(name.to_string()))?;
        self.device = self.session.pull_settings()?;
        Ok(spec.read(&self.device))
    }

    /// 暂存一个配置字段到 `local`
    ///
    /// 未知字段名是用法错误，不是静默忽略。`auto_apply` 打开时
    /// 随后立即执行一次完整流水线。
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), DriverError> {
        let spec = SettingsRecord::field(name)
            .ok_or_else(|| UsageError::UnknownField(name.to_string()))?;
        spec.write(&mut self.local, value)?;
        if self.auto_apply {
            self.apply()?;
        }
        Ok(())
    }

    /// 应用流水线：fix → write → reinitialize
    ///
    /// fix 的警告逐条记日志、均非致命，修正后的值留在 `local`。
    /// 三步全部成功才算成功；`device` 不在这里更新，只能由
    /// 之后的拉取确认。
    pub fn apply(&mut self) -> Result<(), DriverError> {
        for warning in fix(&mut self.local) {
            warn!("settings fix: {warning}");
        }
        self.session.push_settings(&self.local)?;
        self.session.reinitialize()?;
        info!("settings applied and device reinitialized");
        Ok(())
    }

    /// 暂存副本（尚未确认写入设备）
    pub fn local(&self) -> &SettingsRecord {
        &self.local
    }

    /// 最近一次拉取的设备副本
    pub fn device(&self) -> &SettingsRecord {
        &self.device
    }

    /// 拉取并渲染设备配置为 `name: value` 文本
    pub fn to_display_string(&mut self) -> Result<String, DriverError> {
        self.device = self.session.pull_settings()?;
        Ok(self.device.to_display_string())
    }

    pub(crate) fn local_mut(&mut self) -> &mut SettingsRecord {
        &mut self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jrk_protocol::CommandId;
    use jrk_usb::mock::{MockBus, MockDevice, MockOp};

    fn connected() -> (MockBus, &'static str) {
        let mut bus = MockBus::new();
        bus.add_device(MockDevice::new("00123", 0x00C0));
        (bus, "00123")
    }

    #[test]
    fn test_new_seeds_both_copies_from_defaults() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let settings = Settings::new(&session).unwrap();

        assert_eq!(settings.local(), &SettingsRecord::factory_defaults());
        assert_eq!(settings.device(), &SettingsRecord::factory_defaults());

        let device = bus.device(serial).unwrap();
        assert_eq!(device.op_count(MockOp::RestoreDefaults), 1);
        assert_eq!(device.op_count(MockOp::GetEepromSettings), 1);
    }

    #[test]
    fn test_staged_set_does_not_touch_device() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();
        bus.device(serial).unwrap().clear_journal();

        settings.set("pid_period", FieldValue::U16(25)).unwrap();
        settings
            .set("proportional_multiplier", FieldValue::U16(44))
            .unwrap();
        settings
            .set("motor_invert", FieldValue::Bool(true))
            .unwrap();

        let device = bus.device(serial).unwrap();
        assert!(device.journal().is_empty(), "staging must not write");
        assert_eq!(settings.local().pid_period, 25);
        // device 副本不受影响
        assert_eq!(settings.device().pid_period, 10);
    }

    #[test]
    fn test_manual_apply_is_one_write_one_reinitialize() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();
        bus.device(serial).unwrap().clear_journal();

        settings.set("pid_period", FieldValue::U16(25)).unwrap();
        settings.set("integral_limit", FieldValue::U16(500)).unwrap();
        settings.apply().unwrap();

        let device = bus.device(serial).unwrap();
        assert_eq!(device.op_count(MockOp::SetEepromSettings), 1);
        assert_eq!(device.op_count(MockOp::Reinitialize), 1);
        assert_eq!(device.settings().pid_period, 25);
        assert_eq!(device.settings().integral_limit, 500);
    }

    #[test]
    fn test_auto_apply_runs_pipeline_per_set() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();
        settings.set_auto_apply(true);
        bus.device(serial).unwrap().clear_journal();

        settings.set("pid_period", FieldValue::U16(20)).unwrap();
        settings.set("pid_period", FieldValue::U16(30)).unwrap();

        let device = bus.device(serial).unwrap();
        assert_eq!(device.op_count(MockOp::SetEepromSettings), 2);
        assert_eq!(device.op_count(MockOp::Reinitialize), 2);
    }

    #[test]
    fn test_set_then_apply_then_get_round_trip() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();

        // 用一个不会被 fix 调整的值
        settings
            .set("serial_device_number", FieldValue::U16(42))
            .unwrap();
        settings.apply().unwrap();

        assert_eq!(
            settings.get("serial_device_number").unwrap(),
            FieldValue::U16(42)
        );
    }

    #[test]
    fn test_get_always_pulls_fresh_into_device_copy() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();
        bus.device(serial).unwrap().clear_journal();

        settings.get("pid_period").unwrap();
        settings.get("pid_period").unwrap();

        let device = bus.device(serial).unwrap();
        assert_eq!(device.op_count(MockOp::GetEepromSettings), 2);
    }

    #[test]
    fn test_unknown_setting_is_usage_fault() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();

        let err = settings.set("warp_factor", FieldValue::U16(9)).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Usage(UsageError::UnknownField(_))
        ));
    }

    #[test]
    fn test_fix_clamps_and_apply_still_succeeds() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();

        settings.set("pid_period", FieldValue::U16(0)).unwrap();
        settings.apply().unwrap();

        // 修正后的值留在 local 并被写入设备
        assert_eq!(settings.local().pid_period, 1);
        assert_eq!(bus.device(serial).unwrap().settings().pid_period, 1);
    }

    #[test]
    fn test_failed_write_short_circuits_reinitialize() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();
        let device = bus.device(serial).unwrap().clone();
        device.clear_journal();

        settings.set("pid_period", FieldValue::U16(25)).unwrap();
        device.fail_next(MockOp::SetEepromSettings, "eeprom write failed");

        let err = settings.apply().unwrap_err();
        assert!(matches!(err, DriverError::Device { .. }));
        assert_eq!(device.op_count(MockOp::Reinitialize), 0);

        // local 保持已变异，device 副本与设备一致（未变）
        assert_eq!(settings.local().pid_period, 25);
        assert_eq!(settings.get("pid_period").unwrap(), FieldValue::U16(10));
    }

    #[test]
    fn test_display_string_reflects_device_copy() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();

        let text = settings.to_display_string().unwrap();
        assert!(text.contains("pid_period: 10"));
    }

    #[test]
    fn test_apply_issues_no_extra_commands() {
        let (bus, serial) = connected();
        let session = JrkSession::connect(&bus, serial).unwrap();
        let mut settings = Settings::new(&session).unwrap();
        bus.device(serial).unwrap().clear_journal();

        settings.apply().unwrap();
        let journal = bus.device(serial).unwrap().journal();
        assert_eq!(
            journal,
            vec![MockOp::SetEepromSettings, MockOp::Reinitialize]
        );
        assert!(!journal.contains(&MockOp::Command(CommandId::SetTarget)));
    }
}
