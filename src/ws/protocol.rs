//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::game::{Bullet, Obstacle, Player, SessionId};

/// Facing directions a tank can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    /// Heading in degrees, 0 = up, increasing clockwise
    pub fn angle_degrees(self) -> f64 {
        match self {
            Direction::Up => 0.0,
            Direction::Right => 90.0,
            Direction::Down => 180.0,
            Direction::Left => -90.0,
            Direction::UpRight => 45.0,
            Direction::DownRight => 135.0,
            Direction::DownLeft => -135.0,
            Direction::UpLeft => -45.0,
        }
    }

    pub fn angle_radians(self) -> f64 {
        self.angle_degrees().to_radians()
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Movement, facing and fire state for this frame
    Input(InputPayload),
}

/// Input flags from a client.
///
/// Missing or oddly typed fields never reject the frame: flags follow
/// JavaScript truthiness and unknown directions are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPayload {
    #[serde(deserialize_with = "truthy")]
    pub up: bool,
    #[serde(deserialize_with = "truthy")]
    pub down: bool,
    #[serde(deserialize_with = "truthy")]
    pub left: bool,
    #[serde(deserialize_with = "truthy")]
    pub right: bool,
    #[serde(deserialize_with = "lenient_direction", skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(deserialize_with = "truthy")]
    pub fire: bool,
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn lenient_direction<'de, D>(deserializer: D) -> Result<Option<Direction>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Full state for a freshly connected client
    Init(InitPayload),

    /// Another player connected
    PlayerJoined(Player),

    /// A bullet was fired (sent outside the tick broadcast)
    BulletCreated(Bullet),

    /// A player disconnected
    PlayerLeft(SessionId),

    /// Per-tick state broadcast
    Update(UpdatePayload),
}

/// Payload of the `init` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitPayload {
    pub players: HashMap<SessionId, Player>,
    pub bullets: Vec<Bullet>,
    pub obstacles: Vec<Obstacle>,
}

/// Payload of the `update` event (obstacles are only sent on init)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub players: HashMap<SessionId, Player>,
    pub bullets: Vec<Bullet>,
}

impl ServerMsg {
    /// Wire event name
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMsg::Init(_) => "init",
            ServerMsg::PlayerJoined(_) => "playerJoined",
            ServerMsg::BulletCreated(_) => "bulletCreated",
            ServerMsg::PlayerLeft(_) => "playerLeft",
            ServerMsg::Update(_) => "update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn parse_input(data: Value) -> InputPayload {
        let frame = json!({ "event": "input", "data": data }).to_string();
        match serde_json::from_str::<ClientMsg>(&frame).unwrap() {
            ClientMsg::Input(input) => input,
        }
    }

    #[test]
    fn parses_full_input() {
        let input = parse_input(json!({
            "up": true, "down": false, "left": false, "right": true,
            "direction": "upRight", "fire": true
        }));
        assert!(input.up && input.right && input.fire);
        assert!(!input.down && !input.left);
        assert_eq!(input.direction, Some(Direction::UpRight));
    }

    #[test]
    fn missing_fields_are_falsy() {
        let input = parse_input(json!({}));
        assert_eq!(input, InputPayload::default());
    }

    #[test]
    fn flags_follow_truthiness() {
        let input = parse_input(json!({
            "up": 1, "down": 0, "left": "", "right": "yes", "fire": null
        }));
        assert!(input.up);
        assert!(!input.down);
        assert!(!input.left);
        assert!(input.right);
        assert!(!input.fire);
    }

    #[test]
    fn unknown_direction_is_absent() {
        let input = parse_input(json!({ "direction": "sideways", "fire": true }));
        assert_eq!(input.direction, None);
        assert!(input.fire);
    }

    #[test]
    fn unknown_event_is_rejected() {
        let frame = json!({ "event": "chat", "data": "hi" }).to_string();
        assert!(serde_json::from_str::<ClientMsg>(&frame).is_err());
    }

    #[test]
    fn server_events_use_wire_names() {
        let id = Uuid::new_v4();
        let msg = ServerMsg::PlayerLeft(id);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], "playerLeft");
        assert_eq!(value["data"], id.to_string());
        assert_eq!(msg.event_name(), "playerLeft");

        let update = ServerMsg::Update(UpdatePayload {
            players: HashMap::new(),
            bullets: Vec::new(),
        });
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["event"], "update");
        assert!(value["data"].get("obstacles").is_none());
    }

    #[test]
    fn direction_table_matches_compass() {
        assert_eq!(Direction::Up.angle_degrees(), 0.0);
        assert_eq!(Direction::Right.angle_degrees(), 90.0);
        assert_eq!(Direction::Down.angle_degrees(), 180.0);
        assert_eq!(Direction::Left.angle_degrees(), -90.0);
        assert_eq!(Direction::UpLeft.angle_degrees(), -45.0);
        assert_eq!(Direction::DownLeft.angle_degrees(), -135.0);
        assert_eq!(
            serde_json::to_value(Direction::DownRight).unwrap(),
            json!("downRight")
        );
    }
}
