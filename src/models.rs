use serde::{Deserialize, Serialize};

/// A registered remote endpoint that plays videos from its playlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackClient {
    pub id: String,
    pub name: String,
}

/// One queued video as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub start_seconds: u32,
}

// Wake-on-LAN settings for a playback client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WolConfig {
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub alias: String,
    pub iface: String,
    pub mac: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl WolConfig {
    pub fn new(alias: &str, iface: &str, mac: &str, port: u16) -> Self {
        Self {
            client_id: None,
            alias: alias.to_string(),
            iface: iface.to_string(),
            mac: mac.to_string(),
            port,
            enabled: None,
        }
    }

    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("alias", self.alias.clone()),
            ("iface", self.iface.clone()),
            ("mac", self.mac.clone()),
            ("port", self.port.to_string()),
        ]
    }
}

// HDMI-CEC settings for a playback client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CecConfig {
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub alias: String,
    pub device: String,
    pub logical_addr: u8,
    pub physical_addr: String,
}

impl CecConfig {
    pub fn new(alias: &str, device: &str, logical_addr: u8, physical_addr: &str) -> Self {
        Self {
            client_id: None,
            alias: alias.to_string(),
            device: device.to_string(),
            logical_addr,
            physical_addr: physical_addr.to_string(),
        }
    }

    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("alias", self.alias.clone()),
            ("device", self.device.clone()),
            ("logical_addr", self.logical_addr.to_string()),
            ("physical_addr", self.physical_addr.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CecPowerStatus {
    pub power: String,
}

/// Optional `{"message": ...}` body the backend attaches to responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Where a new video goes in the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPosition {
    Back,
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CecCommand {
    On,
    Off,
}

impl CecCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            CecCommand::On => "on",
            CecCommand::Off => "off",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CecCommand::On => "CEC Power On",
            CecCommand::Off => "CEC Power Off",
        }
    }
}

/// Which kind of power configuration an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerKind {
    Wol,
    Cec,
}

impl PowerKind {
    pub fn label(self) -> &'static str {
        match self {
            PowerKind::Wol => "Wake On LAN",
            PowerKind::Cec => "CEC",
        }
    }
}
