//! Integration tests for ArduinoBridge
//!
//! These tests drive the bridge through a mock serial device: port
//! discovery, writing back the detected port, and every path that moves the
//! bridge to the simulator.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use bingo_core::{
    JsonSettingsStore, MemorySettingsStore, SerialSettings, Settings, SettingsStore,
};
use bingo_hardware::mock::{MockDeviceHandle, MockPortOpener};
use bingo_hardware::{
    ArduinoBridge, ConnectionState, FallbackSimulator, HostPlatform, PortDiscovery,
};
use bingo_protocol::{Command, DeviceEvent};
use tempfile::TempDir;

/// Device directory holding empty files named after `ports`.
fn device_dir(ports: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for port in ports {
        File::create(dir.path().join(port)).unwrap();
    }
    dir
}

fn device_path(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

fn auto_detect() -> SerialSettings {
    SerialSettings {
        auto_detect: true,
        ..SerialSettings::default()
    }
}

fn bridge_on(dir: &Path) -> (ArduinoBridge, MockDeviceHandle) {
    let (opener, handle) = MockPortOpener::new();
    let discovery = PortDiscovery::new()
        .with_platform(HostPlatform::Linux)
        .with_device_dir(dir);
    let bridge = ArduinoBridge::new(Box::new(opener))
        .with_discovery(discovery)
        .with_simulator(FallbackSimulator::with_seed(7));
    (bridge, handle)
}

#[test]
fn test_auto_detect_without_ports_falls_back() {
    let dir = device_dir(&[]);
    let (mut bridge, _handle) = bridge_on(dir.path());
    let mut store = MemorySettingsStore::new(Settings::default());

    bridge.connect(&auto_detect(), &mut store);

    assert_eq!(bridge.state(), &ConnectionState::Fallback);
    assert!(!bridge.is_connected());
    assert!(bridge.fallback_active());
    assert_eq!(store.persisted_port(), None);
}

#[test]
fn test_auto_detect_connects_first_openable_port() {
    let dir = device_dir(&["ttyACM0", "ttyACM1", "ttyUSB0"]);
    let acm0 = device_path(dir.path(), "ttyACM0");
    let acm1 = device_path(dir.path(), "ttyACM1");
    let usb0 = device_path(dir.path(), "ttyUSB0");

    let (mut bridge, handle) = bridge_on(dir.path());
    handle.add_locked_port(&acm0);
    handle.add_port(&acm1);
    handle.add_port(&usb0);
    let mut store = MemorySettingsStore::new(Settings::default());

    bridge.connect(&auto_detect(), &mut store);

    assert_eq!(bridge.port(), Some(acm1.as_str()));
    assert_eq!(store.persisted_port(), Some(acm1.as_str()));
    assert_eq!(
        bridge.status().state,
        ConnectionState::Connected { port: acm1 }
    );
}

#[test]
fn test_auto_detect_skips_persist_for_configured_port() {
    let dir = device_dir(&["ttyACM0"]);
    let acm0 = device_path(dir.path(), "ttyACM0");
    let (mut bridge, handle) = bridge_on(dir.path());
    handle.add_port(&acm0);
    let mut store = MemorySettingsStore::new(Settings::default());

    let serial = SerialSettings {
        port: acm0.clone(),
        auto_detect: true,
        ..SerialSettings::default()
    };
    bridge.connect(&serial, &mut store);

    assert!(bridge.is_connected());
    assert_eq!(store.persisted_port(), None);
}

#[test]
fn test_persist_failure_keeps_connection() {
    let dir = device_dir(&["ttyUSB3"]);
    let usb3 = device_path(dir.path(), "ttyUSB3");
    let (mut bridge, handle) = bridge_on(dir.path());
    handle.add_port(&usb3);
    let mut store = MemorySettingsStore::new(Settings::default()).failing();

    bridge.connect(&auto_detect(), &mut store);

    assert_eq!(bridge.port(), Some(usb3.as_str()));
    assert_eq!(store.persisted_port(), None);
}

#[test]
fn test_detected_port_written_to_settings_file() {
    let dir = device_dir(&["ttyACM2"]);
    let acm2 = device_path(dir.path(), "ttyACM2");
    let settings_path = dir.path().join("settings.json");
    std::fs::write(
        &settings_path,
        r#"{"serial": {"port": "COM9", "auto_detect": true}, "audio": {"volume": 0.5}}"#,
    )
    .unwrap();

    let mut store = JsonSettingsStore::new(&settings_path);
    let settings = store.load().unwrap();
    let (mut bridge, handle) = bridge_on(dir.path());
    handle.add_port(&acm2);

    bridge.connect(&settings.serial, &mut store);

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(saved["serial"]["port"], acm2.as_str());
    assert_eq!(saved["serial"]["auto_detect"], true);
    assert_eq!(saved["audio"]["volume"], 0.5);
}

#[test]
fn test_write_failure_falls_back_without_retry() {
    let dir = device_dir(&[]);
    let port = device_path(dir.path(), "ttyACM0");
    let (mut bridge, handle) = bridge_on(dir.path());
    handle.add_port(&port);
    let mut store = MemorySettingsStore::new(Settings::default());
    bridge.connect(
        &SerialSettings {
            port: port.clone(),
            ..SerialSettings::default()
        },
        &mut store,
    );
    assert!(bridge.send_command(Command::NewGame).is_empty());

    handle.unplug(&port);
    let events = bridge.send_command(Command::DrawBall);

    assert!(events.is_empty());
    assert!(bridge.fallback_active());
    assert!(bridge.simulator().drawn().is_empty());
    assert_eq!(handle.written_commands(&port), vec![Command::NewGame]);

    // The next draw is served by the simulator.
    let events = bridge.send_command(Command::DrawBall);
    assert_eq!(events.len(), 1);
}

#[test]
fn test_read_failure_falls_back() {
    let dir = device_dir(&[]);
    let port = device_path(dir.path(), "ttyACM0");
    let (mut bridge, handle) = bridge_on(dir.path());
    handle.add_port(&port);
    let mut store = MemorySettingsStore::new(Settings::default());
    bridge.connect(
        &SerialSettings {
            port: port.clone(),
            ..SerialSettings::default()
        },
        &mut store,
    );

    handle.fail_reads(&port);

    assert_eq!(bridge.read_message(), "");
    assert!(bridge.fallback_active());
}

#[test]
fn test_invalid_utf8_falls_back() {
    let dir = device_dir(&[]);
    let port = device_path(dir.path(), "ttyACM0");
    let (mut bridge, handle) = bridge_on(dir.path());
    handle.add_port(&port);
    let mut store = MemorySettingsStore::new(Settings::default());
    bridge.connect(
        &SerialSettings {
            port: port.clone(),
            ..SerialSettings::default()
        },
        &mut store,
    );

    handle.push_raw(&port, &[0xff, 0xfe, b'\n']);

    assert!(bridge.poll_events().is_empty());
    assert!(bridge.fallback_active());
}

#[test]
fn test_failover_mid_game_does_not_repeat_balls() {
    let dir = device_dir(&[]);
    let port = device_path(dir.path(), "ttyACM0");
    let (mut bridge, handle) = bridge_on(dir.path());
    handle.add_emulated_device(&port);
    let mut store = MemorySettingsStore::new(Settings::default());
    bridge.connect(
        &SerialSettings {
            port: port.clone(),
            ..SerialSettings::default()
        },
        &mut store,
    );

    bridge.send_command(Command::NewGame);
    for _ in 0..10 {
        bridge.send_command(Command::DrawBall);
    }
    let device_events = bridge.poll_events();
    let device_balls: Vec<u8> = device_events
        .iter()
        .filter_map(|event| match event {
            DeviceEvent::BallDrawn { number } => Some(*number),
            _ => None,
        })
        .collect();
    assert_eq!(device_balls, (1..=10).collect::<Vec<u8>>());
    assert_eq!(device_events[0], DeviceEvent::GameStarted);

    handle.unplug(&port);
    bridge.send_command(Command::DrawBall);
    assert!(bridge.fallback_active());

    let mut seen: HashSet<u8> = device_balls.into_iter().collect();
    for _ in 0..65 {
        let events = bridge.send_command(Command::DrawBall);
        let [DeviceEvent::BallDrawn { number }] = events.as_slice() else {
            panic!("expected one ball, got {events:?}");
        };
        assert!(seen.insert(*number), "ball {number} drawn twice");
    }

    assert_eq!(seen.len(), 75);
    assert!(bridge.send_command(Command::DrawBall).is_empty());
}

#[test]
fn test_reconnect_leaves_fallback() {
    let dir = device_dir(&[]);
    let port = device_path(dir.path(), "ttyACM0");
    let (mut bridge, handle) = bridge_on(dir.path());
    handle.add_port(&port);
    let serial = SerialSettings {
        port: port.clone(),
        ..SerialSettings::default()
    };
    let mut store = MemorySettingsStore::new(Settings::default());
    bridge.connect(&serial, &mut store);

    handle.unplug(&port);
    bridge.send_command(Command::NewGame);
    assert!(bridge.fallback_active());

    bridge.reconnect(&serial, &mut store);
    assert!(bridge.fallback_active());

    handle.replug(&port);
    bridge.reconnect(&serial, &mut store);
    assert!(bridge.is_connected());
    assert_eq!(handle.open_count(&port), 2);
}

#[test]
fn test_status_serializes_for_display() {
    let bridge = ArduinoBridge::simulated();
    let json = serde_json::to_value(bridge.status()).unwrap();

    assert_eq!(json["state"]["state"], "fallback");
    assert_eq!(json["simulated"], true);
    assert!(json["port"].is_null());
}
