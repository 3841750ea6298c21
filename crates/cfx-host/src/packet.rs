//! Request and response packets.
//!
//! A packet carries one image and the filters to run over it. The same
//! shape goes in and comes back: on the way out `image.data` holds the
//! result and every filter's `actions` list is filled, so the caller can
//! resend the filters next frame without paying for preprocessing again.
//!
//! ```rust
//! use cfx_host::Packet;
//!
//! let json = r#"{
//!     "name": "sprite-7",
//!     "image": {"width": 1, "height": 1, "data": [10, 20, 30, 255]},
//!     "filters": [{"method": "invert", "opacity": "100%"}]
//! }"#;
//! let packet = Packet::from_json(json).unwrap();
//! assert_eq!(packet.name.as_deref(), Some("sprite-7"));
//! assert!(packet.is_complete());
//! ```

use cfx_core::ImageBuffer;
use cfx_ops::FilterDescriptor;
use serde::{Deserialize, Serialize};

use crate::HostResult;

/// One filter request or its response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Caller-chosen label, echoed back in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Pixels to filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageBuffer>,
    /// Filters to apply, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<FilterDescriptor>>,
}

impl Packet {
    /// A packet with an image and filters.
    pub fn new(image: ImageBuffer, filters: Vec<FilterDescriptor>) -> Self {
        Self { name: None, image: Some(image), filters: Some(filters) }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// True if both image and filters are present.
    pub fn is_complete(&self) -> bool {
        self.image.is_some() && self.filters.is_some()
    }

    /// Parses a packet from JSON.
    pub fn from_json(json: &str) -> HostResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the packet as pretty JSON.
    pub fn to_json(&self) -> HostResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A pool response, tagged for correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Id assigned when the packet was submitted.
    pub id: u64,
    /// The request packet's name.
    pub name: Option<String>,
    /// The processed packet.
    pub packet: Packet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parts_parse() {
        let p = Packet::from_json(r#"{"name":"x"}"#).unwrap();
        assert!(!p.is_complete());
        assert!(p.image.is_none());
    }

    #[test]
    fn test_roundtrip_skips_absent_fields() {
        let p = Packet::new(ImageBuffer::filled(1, 1, [1, 2, 3, 4]).unwrap(), vec![]);
        let json = p.to_json().unwrap();
        assert!(!json.contains("\"name\""));
        assert_eq!(Packet::from_json(&json).unwrap(), p);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(Packet::from_json("{").is_err());
    }
}
