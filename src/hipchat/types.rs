use serde::{Deserialize, Serialize};

pub type RoomId = u64;

/// Room visibility. Only private rooms are ever archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Private,
}

/// Which rooms the list call should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomListFilter {
    pub include_private: bool,
    pub include_archived: bool,
}

impl RoomListFilter {
    /// Every room that is not already archived, private ones included.
    pub const UNARCHIVED: Self = Self {
        include_private: true,
        include_archived: false,
    };

    pub fn query(&self) -> [(&'static str, &'static str); 2] {
        [
            ("include-private", bool_param(self.include_private)),
            ("include-archived", bool_param(self.include_archived)),
        ]
    }
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// An entry of the room listing
#[derive(Debug, Clone, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
}

/// Response body of `GET /room`
#[derive(Debug, Deserialize)]
pub struct RoomList {
    pub items: Vec<RoomSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomOwner {
    pub id: u64,
}

/// Response body of `GET /room/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct RoomDetail {
    pub id: RoomId,
    pub name: String,
    pub privacy: Privacy,
    #[serde(default)]
    pub is_guest_accessible: bool,
    pub owner: RoomOwner,
    #[serde(default)]
    pub topic: Option<String>,
}

/// Response body of `GET /room/{id}/statistics`
#[derive(Debug, Clone, Deserialize)]
pub struct RoomStatistics {
    /// RFC 3339 timestamp; absent or null when the service has none to report.
    #[serde(default)]
    pub last_active: Option<String>,
    #[serde(default)]
    pub messages_sent: u64,
}

/// Owner reference as the update endpoint expects it: the id as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRef {
    pub id: String,
}

/// Payload for `PUT /room/{id}`. The endpoint replaces the whole record, so
/// every field has to be sent even when only one changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRoomRequest {
    pub name: String,
    pub is_archived: bool,
    pub is_guest_accessible: bool,
    pub owner: OwnerRef,
    pub privacy: Privacy,
    pub topic: String,
}

impl UpdateRoomRequest {
    /// Echo a room back unchanged except for the archived flag
    pub fn archive(room: &RoomDetail) -> Self {
        Self {
            name: room.name.clone(),
            is_archived: true,
            is_guest_accessible: room.is_guest_accessible,
            owner: OwnerRef {
                id: room.owner.id.to_string(),
            },
            privacy: room.privacy,
            topic: room.topic.clone().unwrap_or_default(),
        }
    }
}

/// HipChat error envelope: `{"error": {"code": 404, "message": "...", "type": "Not Found"}}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_room_detail_with_null_topic() {
        let room: RoomDetail = serde_json::from_value(json!({
            "id": 42,
            "name": "ops-war-room",
            "privacy": "private",
            "is_guest_accessible": false,
            "is_archived": false,
            "owner": { "id": 7, "name": "Dana", "mention_name": "dana" },
            "topic": null,
            "xmpp_jid": "1_ops@conf.hipchat.example.com"
        }))
        .unwrap();

        assert_eq!(room.id, 42);
        assert_eq!(room.privacy, Privacy::Private);
        assert_eq!(room.owner.id, 7);
        assert!(room.topic.is_none());
    }

    #[test]
    fn test_archive_request_echoes_room() {
        let room = RoomDetail {
            id: 9,
            name: "design".to_string(),
            privacy: Privacy::Private,
            is_guest_accessible: true,
            owner: RoomOwner { id: 1234 },
            topic: Some("mockups".to_string()),
        };

        let request = UpdateRoomRequest::archive(&room);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "design",
                "is_archived": true,
                "is_guest_accessible": true,
                "owner": { "id": "1234" },
                "privacy": "private",
                "topic": "mockups"
            })
        );
    }

    #[test]
    fn test_statistics_with_null_last_active() {
        let stats: RoomStatistics = serde_json::from_value(json!({
            "messages_sent": 0,
            "last_active": null
        }))
        .unwrap();
        assert!(stats.last_active.is_none());

        let stats: RoomStatistics = serde_json::from_value(json!({ "messages_sent": 4 })).unwrap();
        assert!(stats.last_active.is_none());
    }

    #[test]
    fn test_unarchived_filter_query() {
        assert_eq!(
            RoomListFilter::UNARCHIVED.query(),
            [("include-private", "true"), ("include-archived", "false")]
        );
    }
}
