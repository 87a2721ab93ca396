//! Inbound game envelopes.
//!
//! The `type` tag becomes the `event_type` column in the `game_events` table.
//! Everything mode-specific rides in `content` as `TypedPayload`s.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fields shared by every game envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonGameData {
    /// Unvalidated. The tracker rejects anything that is not 24 hex chars.
    pub game_id: String,
    pub game_mode_id: String,
    pub server_id: String,
    #[serde(default)]
    pub players: Vec<PlayerData>,
}

/// A player as reported by the game server. `id` is expected to be a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    pub id: String,
    pub username: String,
}

/// One self-describing unit of envelope content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedPayload {
    pub type_url: String,
    #[serde(serialize_with = "serialize_bytes", deserialize_with = "deserialize_bytes")]
    pub value: Vec<u8>,
}

impl TypedPayload {
    pub fn new(type_url: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            type_url: type_url.into(),
            value: value.into(),
        }
    }

    /// Encode a message body as JSON bytes under the given type url.
    pub fn json<T: Serialize>(type_url: impl Into<String>, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(type_url, serde_json::to_vec(body)?))
    }

    /// Canonical type identifier: the type url with any `host/` prefix
    /// dropped, so `type.googleapis.com/gametracker.Foo` and
    /// `gametracker.Foo` resolve to the same handler.
    pub fn type_id(&self) -> &str {
        match self.type_url.rfind('/') {
            Some(slash) => &self.type_url[slash + 1..],
            None => &self.type_url,
        }
    }
}

fn serialize_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn deserialize_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartMessage {
    pub common_data: CommonGameData,
    pub start_time: DateTime<Utc>,
    pub map_id: String,
    #[serde(default)]
    pub content: Vec<TypedPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdateMessage {
    pub common_data: CommonGameData,
    #[serde(default)]
    pub content: Vec<TypedPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFinishMessage {
    pub common_data: CommonGameData,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub content: Vec<TypedPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    GameStart(GameStartMessage),
    GameUpdate(GameUpdateMessage),
    GameFinish(GameFinishMessage),
}

impl GameEvent {
    pub const START: &'static str = "game_start";
    pub const UPDATE: &'static str = "game_update";
    pub const FINISH: &'static str = "game_finish";

    /// The event type string. Always matches the serde tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::GameStart(_) => Self::START,
            GameEvent::GameUpdate(_) => Self::UPDATE,
            GameEvent::GameFinish(_) => Self::FINISH,
        }
    }

    pub fn common_data(&self) -> &CommonGameData {
        match self {
            GameEvent::GameStart(m) => &m.common_data,
            GameEvent::GameUpdate(m) => &m.common_data,
            GameEvent::GameFinish(m) => &m.common_data,
        }
    }

    pub fn content(&self) -> &[TypedPayload] {
        match self {
            GameEvent::GameStart(m) => &m.content,
            GameEvent::GameUpdate(m) => &m.content,
            GameEvent::GameFinish(m) => &m.content,
        }
    }

    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn common() -> CommonGameData {
        CommonGameData {
            game_id: "65a1b2c3d4e5f60718293a4b".into(),
            game_mode_id: "tower-defence".into(),
            server_id: "tower-defence-test-3wd6ws34-wc3463".into(),
            players: vec![PlayerData {
                id: "8d36737e-1c0a-4a71-87de-9906f577845e".into(),
                username: "Expectational".into(),
            }],
        }
    }

    #[test]
    fn event_type_matches_serde_tag() {
        let event = GameEvent::GameUpdate(GameUpdateMessage { common_data: common(), content: vec![] });
        let payload = event.to_payload().unwrap();
        assert_eq!(payload["type"].as_str().unwrap(), event.event_type());
        assert_eq!(payload["commonData"]["gameModeId"], "tower-defence");
    }

    #[test]
    fn type_id_strips_url_prefix() {
        let with_prefix = TypedPayload::new("type.googleapis.com/gametracker.TowerDefenceUpdateData", b"{}".to_vec());
        let bare = TypedPayload::new("gametracker.TowerDefenceUpdateData", b"{}".to_vec());
        assert_eq!(with_prefix.type_id(), "gametracker.TowerDefenceUpdateData");
        assert_eq!(bare.type_id(), "gametracker.TowerDefenceUpdateData");
    }

    #[test]
    fn payload_bytes_travel_as_base64() {
        let payload = TypedPayload::json("gametracker.Foo", &json!({"a": 1})).unwrap();
        let encoded = serde_json::to_value(&payload).unwrap();
        assert_eq!(encoded["typeUrl"], "gametracker.Foo");
        assert_eq!(encoded["value"], STANDARD.encode(br#"{"a":1}"#));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let raw = json!({"typeUrl": "gametracker.Foo", "value": "not base64!!"});
        assert!(serde_json::from_value::<TypedPayload>(raw).is_err());
    }

    #[test]
    fn start_message_without_content_defaults_to_empty() {
        let raw = json!({
            "type": "game_start",
            "commonData": {
                "gameId": "65a1b2c3d4e5f60718293a4b",
                "gameModeId": "block-sumo",
                "serverId": "srv-1"
            },
            "startTime": "2024-01-12T10:00:00Z",
            "mapId": "test-map"
        });
        let event = GameEvent::from_payload(&raw).unwrap();
        assert_eq!(event.event_type(), GameEvent::START);
        assert!(event.content().is_empty());
        assert!(event.common_data().players.is_empty());
    }
}
