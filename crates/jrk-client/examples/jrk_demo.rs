//! Jrk 客户端演示 - 从枚举到命令的完整流程
//!
//! 这个示例在模拟总线上展示典型用法，包括：
//! - 枚举序列号并建立会话
//! - 加载 YAML 配置并应用
//! - 读取遥测字段
//! - 发出运行时命令
//!
//! # 运行
//!
//! ```bash
//! cargo run --example jrk_demo --features mock
//! ```

use jrk_client::{Commands, FieldValue, JrkSession, Settings, Variables};
use jrk_usb::mock::{MockBus, MockDevice};

const CONFIG: &str = "\
jrk_settings:
  input_mode: JRK_INPUT_MODE_SERIAL
  feedback_mode: JRK_FEEDBACK_MODE_ANALOG
  pid_period: 10
  proportional_multiplier: 44
  proportional_exponent: 3
  max_duty_cycle_forward: 600
  max_duty_cycle_reverse: 600
";

fn main() -> Result<(), jrk_client::DriverError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut bus = MockBus::new();
    bus.add_device(MockDevice::new("00293041", 0x00C0));

    // 1. 枚举并连接
    let serials = jrk_client::list_connected_device_serial_numbers(&bus)?;
    println!("发现 {} 台设备: {:?}", serials.len(), serials);
    let session = JrkSession::connect(&bus, &serials[0])?;

    // 2. 加载配置并应用
    let mut settings = Settings::new(&session)?;
    settings.load_config_str(CONFIG)?;
    settings.apply()?;
    println!("设备配置:\n{}", settings.to_display_string()?);

    // 3. 读取遥测
    let variables = Variables::new(&session);
    println!("input        = {}", variables.get("input")?);
    println!("vin_voltage  = {}", variables.get("vin_voltage")?);
    println!("pin[3].state = {}", variables.get_pin(3, "pin_state")?);

    // 4. 运行时命令
    let commands = Commands::new(&session);
    commands.set_target(2080)?;
    if let FieldValue::U16(target) = variables.get("target")? {
        println!("目标值 = {target}");
    }
    commands.stop_motor()?;
    println!("已停机");

    Ok(())
}
