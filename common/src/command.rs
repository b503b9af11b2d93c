use alloc::string::String;
use core::fmt;

use serde::{Deserialize, Serialize};

/// The monitored network hops, each bound to one or more strip pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// Ping to a host on the local network
    Local,
    /// The first hop after the router
    Gateway,
    /// A target on the internet
    Internet,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Local, Segment::Gateway, Segment::Internet];
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Local => write!(f, "local"),
            Segment::Gateway => write!(f, "gateway"),
            Segment::Internet => write!(f, "internet"),
        }
    }
}

/// Health of a segment, from fully healthy (0) to no service at all (4).
///
/// On the wire a severity is a bare integer. Anything outside 0-4 is
/// rejected while deserializing, so the rest of the system never sees an
/// unmapped level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Severity {
    Healthy = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Outage = 4,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Healthy,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Outage,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn is_outage(self) -> bool {
        self == Severity::Outage
    }
}

/// A severity level outside of 0-4
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidSeverity(pub u8);

impl fmt::Display for InvalidSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "severity {} is out of range 0-4", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidSeverity {}

impl TryFrom<u8> for Severity {
    type Error = InvalidSeverity;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Severity::Healthy),
            1 => Ok(Severity::Low),
            2 => Ok(Severity::Medium),
            3 => Ok(Severity::High),
            4 => Ok(Severity::Outage),
            other => Err(InvalidSeverity(other)),
        }
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> u8 {
        severity.level()
    }
}

/// Severity of every segment, as reported by a `set_led` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentStates {
    pub local: Severity,
    pub gateway: Severity,
    pub internet: Severity,
}

impl SegmentStates {
    pub fn new(local: Severity, gateway: Severity, internet: Severity) -> Self {
        Self {
            local,
            gateway,
            internet,
        }
    }

    pub fn get(&self, segment: Segment) -> Severity {
        match segment {
            Segment::Local => self.local,
            Segment::Gateway => self.gateway,
            Segment::Internet => self.internet,
        }
    }
}

/// Commands sent by the monitoring agent, one JSON object per line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// New steady severities for every segment
    #[serde(rename = "set_led")]
    SetLed { state: SegmentStates },
    /// A single ping towards `target` timed out
    #[serde(rename = "ping_fail")]
    PingFail { target: Segment },
    /// The last ping was noticeably slower than the baseline
    #[serde(rename = "spike")]
    Spike { percent_diff: f64 },
    /// Heartbeat from the agent
    #[serde(rename = "keep-alive")]
    KeepAlive { keep_alive_type: String },
    /// Any command type this controller does not know about
    #[serde(other)]
    Unknown,
}
