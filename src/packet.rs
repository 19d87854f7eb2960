//! Packet records and the two ways they arrive.
//!
//! A packet source either hands over a whole JSON array once (batch file) or
//! pushes one JSON object per message (stream). Both decode into the same
//! [`Packet`] and feed the same session entry points.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::Result;

/// Transport protocol tag of a captured packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Igmp,
    #[default]
    Other,
}

impl Protocol {
    pub const ALL: [Protocol; 5] = [
        Protocol::Tcp,
        Protocol::Udp,
        Protocol::Icmp,
        Protocol::Igmp,
        Protocol::Other,
    ];

    /// IANA protocol number.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Protocol::Icmp,
            2 => Protocol::Igmp,
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            _ => Protocol::Other,
        }
    }

    /// Case-insensitive symbolic name; numeric strings are treated as codes.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if let Ok(code) = name.parse::<i64>() {
            return Self::from_code(code);
        }
        match name.to_ascii_uppercase().as_str() {
            "TCP" => Protocol::Tcp,
            "UDP" => Protocol::Udp,
            "ICMP" => Protocol::Icmp,
            "IGMP" => Protocol::Igmp,
            _ => Protocol::Other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
            Protocol::Igmp => "IGMP",
            Protocol::Other => "Unknown",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(i64),
            Name(String),
        }

        Ok(match Option::<Repr>::deserialize(deserializer)? {
            Some(Repr::Code(code)) => Protocol::from_code(code),
            Some(Repr::Name(name)) => Protocol::from_name(&name),
            None => Protocol::Other,
        })
    }
}

/// One captured packet, already reduced to the fields that get sonified.
///
/// Every field is optional on the wire. A packet without `size` cannot be
/// sonified; a packet without both hosts does not touch the graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Packet {
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(
        rename = "sourceIP",
        alias = "src_ip",
        alias = "src",
        default,
        deserialize_with = "host",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_ip: Option<String>,
    #[serde(
        rename = "destinationIP",
        alias = "dst_ip",
        alias = "dst",
        default,
        deserialize_with = "host",
        skip_serializing_if = "Option::is_none"
    )]
    pub destination_ip: Option<String>,
}

impl Packet {
    pub fn new(size: u32, protocol: Protocol) -> Self {
        Self {
            size: Some(size),
            protocol,
            ..Self::default()
        }
    }

    pub fn with_hosts(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source_ip = Some(source.into());
        self.destination_ip = Some(destination.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Both endpoints, when the packet carries them.
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        match (&self.source_ip, &self.destination_ip) {
            (Some(src), Some(dst)) => Some((src.as_str(), dst.as_str())),
            _ => None,
        }
    }
}

/// Host identifiers: empty strings and extraction placeholders count as absent.
fn host<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && !v.eq_ignore_ascii_case("N/A")
    }))
}

/// Decode one stream message (a single JSON object).
pub fn decode_message(text: &str) -> Result<Packet> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a batch file body (a JSON array of packet objects).
///
/// Entries that fail to decode are skipped with a warning; only a body that
/// is not a JSON array at all is an error.
pub fn decode_batch(text: &str) -> Result<Vec<Packet>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    let mut packets = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(packet) => packets.push(packet),
            Err(err) => warn!(index, %err, "skipping malformed packet record"),
        }
    }
    Ok(packets)
}

/// Read and decode a batch file from disk.
pub fn load_batch(path: impl AsRef<Path>) -> Result<Vec<Packet>> {
    let text = std::fs::read_to_string(path)?;
    decode_batch(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_symbolic_stream_message() {
        let packet = decode_message(
            r#"{"timestamp": 1.5, "size": 21, "protocol": "UDP",
                "sourceIP": "10.0.0.1", "destinationIP": "10.0.0.2"}"#,
        )
        .unwrap();

        assert_eq!(packet.size, Some(21));
        assert_eq!(packet.protocol, Protocol::Udp);
        assert_eq!(packet.endpoints(), Some(("10.0.0.1", "10.0.0.2")));
    }

    #[test]
    fn numeric_and_symbolic_protocols_agree() {
        for (code, name) in [(6, "tcp"), (17, "UDP"), (1, "Icmp"), (2, "IGMP")] {
            let by_code = decode_message(&format!(r#"{{"size": 1, "protocol": {code}}}"#)).unwrap();
            let by_name =
                decode_message(&format!(r#"{{"size": 1, "protocol": "{name}"}}"#)).unwrap();
            assert_eq!(by_code.protocol, by_name.protocol);
            assert_ne!(by_code.protocol, Protocol::Other);
        }
    }

    #[test]
    fn unknown_and_missing_protocol_are_other() {
        let unknown = decode_message(r#"{"size": 60, "protocol": "Unknown"}"#).unwrap();
        let numeric = decode_message(r#"{"size": 60, "protocol": 89}"#).unwrap();
        let missing = decode_message(r#"{"size": 60}"#).unwrap();
        let null = decode_message(r#"{"size": 60, "protocol": null}"#).unwrap();

        for packet in [unknown, numeric, missing, null] {
            assert_eq!(packet.protocol, Protocol::Other);
        }
    }

    #[test]
    fn extraction_field_names_and_placeholders() {
        let packet = decode_message(
            r#"{"timestamp": 3.0, "size": 90, "protocol": "TCP",
                "src_ip": "N/A", "dst_ip": "192.168.1.4"}"#,
        )
        .unwrap();

        assert_eq!(packet.source_ip, None);
        assert_eq!(packet.destination_ip.as_deref(), Some("192.168.1.4"));
        assert_eq!(packet.endpoints(), None);
    }

    #[test]
    fn batch_skips_malformed_records() {
        let packets = decode_batch(
            r#"[{"size": 10, "protocol": "TCP"},
                {"size": "huge"},
                {"size": 30, "protocol": 17}]"#,
        )
        .unwrap();

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[1].protocol, Protocol::Udp);
    }

    #[test]
    fn batch_body_must_be_an_array() {
        assert!(decode_batch(r#"{"size": 10}"#).is_err());
    }

    #[test]
    fn serializes_with_wire_names() {
        let packet = Packet::new(5, Protocol::Tcp).with_hosts("a", "b");
        let json = serde_json::to_value(&packet).unwrap();
        assert_eq!(json["sourceIP"], "a");
        assert_eq!(json["protocol"], "TCP");
    }
}
