//! Session bridge wire format.
//!
//! The bridge speaks JSON text frames tagged by `type`. The client sends a
//! `hello` once per connection, then `request` frames correlated by `id`.
//! The bridge pushes lifecycle, group and credential frames, and answers each
//! request with a `response` carrying the same `id`.
//!
//! Example frames:
//! ```json
//! {"type":"connection","state":"close","reason":"logged out","status_code":401}
//! {"type":"groups_update","updates":[{"id":"123@g.us","announce":false}]}
//! {"type":"response","id":7,"ok":true,"result":{"id":"123@g.us","subject":"Drops","announce":true,"size":42}}
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{GroupId, ResourceSnapshot, ResourceUpdate};
use crate::port::SessionEvent;

/// Close status the bridge reports when the session was logged out.
pub const LOGGED_OUT_STATUS: u16 = 401;

pub const METHOD_GROUP_METADATA: &str = "group_metadata";
pub const METHOD_SEND_MESSAGE: &str = "send_message";
pub const METHOD_SEND_PRESENCE: &str = "send_presence_update";
pub const METHOD_LIST_GROUPS: &str = "group_fetch_all_participating";
pub const METHOD_END: &str = "end";

/// Frames sent to the bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame<'a> {
    Hello {
        browser: &'a [String],
        #[serde(skip_serializing_if = "Option::is_none")]
        creds: Option<&'a Value>,
    },
    Request {
        id: u64,
        method: &'a str,
        params: Value,
    },
}

/// Frames received from the bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeFrame {
    Connection(ConnectionFrame),
    GroupsUpdate {
        updates: Vec<GroupUpdateDto>,
    },
    CredsUpdate {
        creds: Value,
    },
    Qr {
        code: String,
    },
    Response(ResponseFrame),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStateDto {
    Connecting,
    Open,
    Close,
}

#[derive(Debug, Deserialize)]
pub struct ConnectionFrame {
    pub state: ConnectionStateDto,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
}

impl ConnectionFrame {
    pub fn into_event(self) -> SessionEvent {
        match self.state {
            ConnectionStateDto::Connecting => SessionEvent::Connecting,
            ConnectionStateDto::Open => SessionEvent::Open,
            ConnectionStateDto::Close => SessionEvent::Closed {
                reason: self.reason.unwrap_or_else(|| match self.status_code {
                    Some(code) => format!("closed with status {code}"),
                    None => "closed".to_string(),
                }),
                logged_out: self.status_code == Some(LOGGED_OUT_STATUS),
            },
        }
    }
}

/// Partial group change. `announce` is the restricted flag.
#[derive(Debug, Deserialize)]
pub struct GroupUpdateDto {
    pub id: String,
    #[serde(default)]
    pub announce: Option<bool>,
    #[serde(default)]
    pub subject: Option<String>,
}

impl From<GroupUpdateDto> for ResourceUpdate {
    fn from(dto: GroupUpdateDto) -> Self {
        Self {
            id: GroupId::from(dto.id),
            restricted: dto.announce,
            display_name: dto.subject,
        }
    }
}

/// Full group metadata as returned by `group_metadata`.
#[derive(Debug, Deserialize)]
pub struct GroupMetadataDto {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub announce: bool,
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub participants: Vec<Value>,
}

impl From<GroupMetadataDto> for ResourceSnapshot {
    fn from(dto: GroupMetadataDto) -> Self {
        let member_count = dto.size.unwrap_or(dto.participants.len());
        Self {
            id: GroupId::from(dto.id),
            display_name: dto.subject,
            restricted: dto.announce,
            member_count,
        }
    }
}

/// Parse a `group_fetch_all_participating` result (a map keyed by group id),
/// sorted by display name.
pub fn parse_group_listing(result: Value) -> serde_json::Result<Vec<ResourceSnapshot>> {
    let groups: HashMap<String, GroupMetadataDto> = serde_json::from_value(result)?;
    let mut snapshots: Vec<ResourceSnapshot> = groups.into_values().map(Into::into).collect();
    snapshots.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(snapshots)
}

#[derive(Debug, Deserialize)]
pub struct ResponseFrame {
    pub id: u64,
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn hello_serializes_with_tag() {
        let browser = vec!["Floodgate".to_string(), "Chrome".to_string(), "1.0.0".to_string()];
        let creds = json!({"me": {"id": "1@s.whatsapp.net"}});
        let frame = ClientFrame::Hello {
            browser: &browser,
            creds: Some(&creds),
        };

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "hello");
        assert_eq!(value["browser"][0], "Floodgate");
        assert_eq!(value["creds"]["me"]["id"], "1@s.whatsapp.net");
    }

    #[test]
    fn hello_without_creds_omits_field() {
        let frame = ClientFrame::Hello {
            browser: &[],
            creds: None,
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert!(value.get("creds").is_none());
    }

    #[test]
    fn request_serializes_method_and_params() {
        let frame = ClientFrame::Request {
            id: 9,
            method: METHOD_SEND_MESSAGE,
            params: json!({"jid": "1@g.us", "content": {"text": "🔥"}}),
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "request");
        assert_eq!(value["id"], 9);
        assert_eq!(value["method"], "send_message");
        assert_eq!(value["params"]["content"]["text"], "🔥");
    }

    #[test]
    fn logged_out_close_is_terminal() {
        let frame: BridgeFrame = serde_json::from_str(
            r#"{"type":"connection","state":"close","reason":"logged out","status_code":401}"#,
        )
        .unwrap();

        let BridgeFrame::Connection(connection) = frame else {
            panic!("expected connection frame");
        };
        assert_eq!(
            connection.into_event(),
            SessionEvent::Closed {
                reason: "logged out".into(),
                logged_out: true,
            }
        );
    }

    #[test]
    fn other_close_codes_are_retryable() {
        let frame: BridgeFrame =
            serde_json::from_str(r#"{"type":"connection","state":"close","status_code":428}"#).unwrap();

        let BridgeFrame::Connection(connection) = frame else {
            panic!("expected connection frame");
        };
        assert_eq!(
            connection.into_event(),
            SessionEvent::Closed {
                reason: "closed with status 428".into(),
                logged_out: false,
            }
        );
    }

    #[test]
    fn open_frame_maps_to_open() {
        let frame: BridgeFrame =
            serde_json::from_str(r#"{"type":"connection","state":"open"}"#).unwrap();
        let BridgeFrame::Connection(connection) = frame else {
            panic!("expected connection frame");
        };
        assert_eq!(connection.into_event(), SessionEvent::Open);
    }

    #[test]
    fn group_updates_keep_order_and_partial_fields() {
        let frame: BridgeFrame = serde_json::from_str(
            r#"{"type":"groups_update","updates":[
                {"id":"1@g.us","announce":false},
                {"id":"1@g.us","subject":"Renamed"}
            ]}"#,
        )
        .unwrap();

        let BridgeFrame::GroupsUpdate { updates } = frame else {
            panic!("expected groups_update frame");
        };
        let updates: Vec<ResourceUpdate> = updates.into_iter().map(Into::into).collect();
        assert_eq!(updates[0], ResourceUpdate::restricted("1@g.us", false));
        assert_eq!(updates[1].restricted, None);
        assert_eq!(updates[1].display_name.as_deref(), Some("Renamed"));
    }

    #[test]
    fn metadata_counts_participants_without_size() {
        let dto: GroupMetadataDto = serde_json::from_value(json!({
            "id": "1@g.us",
            "subject": "Drops",
            "announce": true,
            "participants": [{"id": "a"}, {"id": "b"}, {"id": "c"}]
        }))
        .unwrap();

        let snapshot = ResourceSnapshot::from(dto);
        assert_eq!(snapshot.member_count, 3);
        assert!(snapshot.restricted);
        assert_eq!(snapshot.display_name, "Drops");
    }

    #[test]
    fn group_listing_is_sorted_by_name() {
        let listing = parse_group_listing(json!({
            "2@g.us": {"id": "2@g.us", "subject": "Zeta", "announce": false, "size": 5},
            "1@g.us": {"id": "1@g.us", "subject": "Alpha", "announce": true, "size": 9}
        }))
        .unwrap();

        let names: Vec<_> = listing.iter().map(|g| g.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn unknown_frames_are_tolerated() {
        let frame: BridgeFrame =
            serde_json::from_str(r#"{"type":"messages_upsert","messages":[]}"#).unwrap();
        assert!(matches!(frame, BridgeFrame::Unknown));
    }

    #[test]
    fn failed_response_carries_error() {
        let frame: BridgeFrame = serde_json::from_str(
            r#"{"type":"response","id":3,"ok":false,"error":"item-not-found"}"#,
        )
        .unwrap();
        let BridgeFrame::Response(response) = frame else {
            panic!("expected response frame");
        };
        assert_eq!(response.id, 3);
        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("item-not-found"));
    }
}
