//! Sinric wire protocol: JSON frame types and the keep-alive literal.
//!
//! Two frame shapes cross the wire. Inbound:
//!
//! ```json
//! {"deviceId": "...", "action": "action.devices.commands.OnOff", "value": {"on": true}}
//! ```
//!
//! Outbound:
//!
//! ```json
//! {"deviceId": "...", "action": "setPowerState", "value": "ON"}
//! ```
//!
//! Anything that does not parse, or carries an action we do not
//! recognize, is dropped without comment. There is no error channel back
//! to the cloud.

use alloc::string::String;
use serde::{Deserialize, Serialize};

/// The only inbound action this firmware handles.
pub const ACTION_ON_OFF: &str = "action.devices.commands.OnOff";

/// Action field on outbound state reports.
pub const ACTION_SET_POWER_STATE: &str = "setPowerState";

/// Single-character idle keep-alive frame.
pub const HEARTBEAT_FRAME: &str = "H";

/// Logical power state of one relay channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn from_on(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }

    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// Wire spelling used in state reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

#[derive(Debug, Deserialize)]
struct InboundFrame {
    #[serde(rename = "deviceId")]
    device_id: String,
    action: String,
    #[serde(default)]
    value: CommandValue,
}

#[derive(Debug, Default, Deserialize)]
struct CommandValue {
    #[serde(default)]
    on: bool,
}

/// A recognized OnOff command, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnOffCommand {
    pub device_id: String,
    pub on: bool,
}

/// Parse a raw text frame into an OnOff command.
///
/// Returns `None` for malformed JSON and for any action other than
/// [`ACTION_ON_OFF`]; unknown fields are ignored.
pub fn parse_command(raw: &str) -> Option<OnOffCommand> {
    let frame: InboundFrame = serde_json::from_str(raw).ok()?;
    if frame.action != ACTION_ON_OFF {
        return None;
    }
    Some(OnOffCommand {
        device_id: frame.device_id,
        on: frame.value.on,
    })
}

#[derive(Debug, Serialize)]
struct StateReport<'a> {
    #[serde(rename = "deviceId")]
    device_id: &'a str,
    action: &'a str,
    value: &'a str,
}

/// Serialize a power-state report for one device.
pub fn power_report(device_id: &str, state: PowerState) -> String {
    let report = StateReport {
        device_id,
        action: ACTION_SET_POWER_STATE,
        value: state.as_str(),
    };
    // Serialization of a flat borrowed struct cannot fail.
    serde_json::to_string(&report).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn parses_on_command() {
        let raw = r#"{"deviceId": "DeviceID2", "action": "action.devices.commands.OnOff", "value": {"on": true}}"#;
        let cmd = parse_command(raw).unwrap();
        assert_eq!(cmd.device_id, "DeviceID2");
        assert!(cmd.on);
    }

    #[test]
    fn parses_off_command() {
        let raw = r#"{"deviceId": "DeviceID1", "action": "action.devices.commands.OnOff", "value": {"on": false}}"#;
        let cmd = parse_command(raw).unwrap();
        assert!(!cmd.on);
    }

    #[test]
    fn ignores_unknown_fields() {
        let raw = r#"{"deviceId": "DeviceID1", "action": "action.devices.commands.OnOff", "value": {"on": true}, "ts": 12345, "extra": null}"#;
        assert!(parse_command(raw).is_some());
    }

    #[test]
    fn rejects_other_actions() {
        let raw = r#"{"deviceId": "DeviceID1", "action": "action.devices.commands.Brightness", "value": {"on": true}}"#;
        assert_eq!(parse_command(raw), None);
    }

    #[test]
    fn rejects_malformed_json() {
        assert_eq!(parse_command("not json"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command(r#"{"action": "action.devices.commands.OnOff"}"#), None);
    }

    #[test]
    fn report_matches_wire_format() {
        let json = power_report("DeviceID3", PowerState::On);
        assert_eq!(
            json,
            r#"{"deviceId":"DeviceID3","action":"setPowerState","value":"ON"}"#
        );
        let json = power_report("DeviceID3", PowerState::Off);
        assert_eq!(
            json,
            r#"{"deviceId":"DeviceID3","action":"setPowerState","value":"OFF"}"#
        );
    }

    #[test]
    fn power_state_maps_bool_to_wire_spelling() {
        assert_eq!(PowerState::from_on(true).as_str(), "ON");
        assert_eq!(PowerState::from_on(false).as_str(), "OFF");
        assert!(PowerState::from_on(true).is_on());
        assert!(!PowerState::from_on(false).is_on());
    }

    #[test]
    fn heartbeat_is_a_single_character() {
        assert_eq!(HEARTBEAT_FRAME.len(), 1);
        assert_eq!(HEARTBEAT_FRAME.to_string(), "H");
    }
}
