//! Protocol messages exchanged between server and client.
//!
//! Every message is a JSON record whose first field, `cmd`, names the
//! variant. Decoding reads `cmd` on its own before decoding the payload so
//! that an unknown tag and a broken payload are reported differently.

use crate::error::ProtocolError;
use crate::PlayerState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the discriminant field.
pub const DISCRIMINANT_FIELD: &str = "cmd";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "cmd", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Server to client, once per connection: assigns identity.
    Handshake { player: PlayerState },
    /// Client to server: periodic self-report.
    PlayerUpdate { player: PlayerState },
    /// Server to client: full snapshot of every known player.
    ServerUpdate { players: Vec<PlayerState> },
    /// Server to client: a peer disconnected.
    PlayerDelete { player: PlayerState },
    /// Reserved. Neither side produces or acts on it.
    PlayerInput,
}

/// The discriminant of a [`Message`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Handshake,
    PlayerUpdate,
    ServerUpdate,
    PlayerDelete,
    PlayerInput,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Handshake,
        Command::PlayerUpdate,
        Command::ServerUpdate,
        Command::PlayerDelete,
        Command::PlayerInput,
    ];

    /// Wire name of the discriminant.
    pub fn tag(self) -> &'static str {
        match self {
            Command::Handshake => "HANDSHAKE",
            Command::PlayerUpdate => "PLAYER_UPDATE",
            Command::ServerUpdate => "SERVER_UPDATE",
            Command::PlayerDelete => "PLAYER_DELETE",
            Command::PlayerInput => "PLAYER_INPUT",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.tag() == tag)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl Message {
    pub fn command(&self) -> Command {
        match self {
            Message::Handshake { .. } => Command::Handshake,
            Message::PlayerUpdate { .. } => Command::PlayerUpdate,
            Message::ServerUpdate { .. } => Command::ServerUpdate,
            Message::PlayerDelete { .. } => Command::PlayerDelete,
            Message::PlayerInput => Command::PlayerInput,
        }
    }

    /// Serializes the message to one ASCII JSON record.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decodes one record: discriminant first, then the full payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ProtocolError::MalformedMessage(format!("not valid text: {e}")))?;
        let record: Value = serde_json::from_str(text)
            .map_err(|e| ProtocolError::MalformedMessage(e.to_string()))?;

        let command = match record.get(DISCRIMINANT_FIELD) {
            Some(Value::String(tag)) => Command::from_tag(tag)
                .ok_or_else(|| ProtocolError::UnrecognizedDiscriminant(tag.clone()))?,
            Some(other) => {
                return Err(ProtocolError::MalformedMessage(format!(
                    "`{DISCRIMINANT_FIELD}` must be text, got {other}"
                )))
            }
            None => {
                return Err(ProtocolError::MalformedMessage(format!(
                    "missing `{DISCRIMINANT_FIELD}`"
                )))
            }
        };

        let message: Message = serde_json::from_value(record)
            .map_err(|e| ProtocolError::MalformedMessage(format!("bad {command} payload: {e}")))?;

        // Out-of-range numbers parse as infinity.
        if let Some(player) = message.players().find(|p| !p.is_finite()) {
            return Err(ProtocolError::MalformedMessage(format!(
                "bad {command} payload: non-finite value for player {}",
                player.id
            )));
        }
        Ok(message)
    }

    /// Every player state the message carries.
    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        let players: &[PlayerState] = match self {
            Message::Handshake { player }
            | Message::PlayerUpdate { player }
            | Message::PlayerDelete { player } => std::slice::from_ref(player),
            Message::ServerUpdate { players } => players,
            Message::PlayerInput => &[],
        };
        players.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rgb, Vec3};

    fn player(id: &str) -> PlayerState {
        PlayerState::new(id, Rgb::new(0.25, 0.5, 0.75), Vec3::new(1.0, -2.0, 3.5))
    }

    #[test]
    fn test_discriminant_is_first_field() {
        let encoded = Message::Handshake { player: player("0") }.encode().unwrap();
        let text = String::from_utf8(encoded).unwrap();

        assert!(text.starts_with(r#"{"cmd":"HANDSHAKE""#), "got {text}");
        assert!(text.is_ascii());
    }

    #[test]
    fn test_command_tags_are_unique() {
        for command in Command::ALL {
            assert_eq!(Command::from_tag(command.tag()), Some(command));
        }
        assert_eq!(Command::from_tag("handshake"), None);
    }

    #[test]
    fn test_server_update_roundtrip() {
        let message = Message::ServerUpdate {
            players: vec![player("0"), player("1")],
        };

        let decoded = Message::decode(&message.encode().unwrap()).unwrap();
        assert_eq!(decoded, message);
        assert_eq!(decoded.command(), Command::ServerUpdate);
    }

    #[test]
    fn test_player_input_has_no_payload() {
        let encoded = Message::PlayerInput.encode().unwrap();
        assert_eq!(encoded, br#"{"cmd":"PLAYER_INPUT"}"#.to_vec());
        assert_eq!(Message::decode(&encoded).unwrap(), Message::PlayerInput);
    }

    #[test]
    fn test_decode_handwritten_record() {
        let raw = br#"{"cmd":"PLAYER_UPDATE","player":{"id":"4","color":{"r":0.0,"g":0.1,"b":0.2},"position":{"x":5.0,"y":5.0,"z":5.0}}}"#;

        match Message::decode(raw).unwrap() {
            Message::PlayerUpdate { player } => {
                assert_eq!(player.id, "4");
                assert_eq!(player.position, Vec3::splat(5.0));
            }
            other => panic!("Unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_missing_discriminant() {
        let err = Message::decode(br#"{"player":{"id":"1"}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedMessage(_)));
    }

    #[test]
    fn test_non_text_discriminant() {
        let err = Message::decode(br#"{"cmd":2}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedMessage(_)));
    }

    #[test]
    fn test_unknown_discriminant() {
        let err = Message::decode(br#"{"cmd":"TELEPORT"}"#).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnrecognizedDiscriminant("TELEPORT".to_string())
        );
    }

    #[test]
    fn test_payload_shape_mismatch() {
        let err = Message::decode(br#"{"cmd":"SERVER_UPDATE","players":{"id":"1"}}"#).unwrap_err();
        match err {
            ProtocolError::MalformedMessage(reason) => assert!(reason.contains("SERVER_UPDATE")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_coordinate_is_rejected() {
        let raw = br#"{"cmd":"PLAYER_UPDATE","player":{"id":"1","color":{"r":0.0,"g":0.1,"b":0.2},"position":{"x":1e39,"y":0.0,"z":0.0}}}"#;

        match Message::decode(raw).unwrap_err() {
            ProtocolError::MalformedMessage(reason) => assert!(reason.contains("PLAYER_UPDATE")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_color_in_snapshot_is_rejected() {
        let raw = br#"{"cmd":"SERVER_UPDATE","players":[{"id":"0","color":{"r":0.0,"g":0.0,"b":0.0},"position":{"x":0.0,"y":0.0,"z":0.0}},{"id":"1","color":{"r":-1e40,"g":0.0,"b":0.0},"position":{"x":0.0,"y":0.0,"z":0.0}}]}"#;

        assert!(matches!(
            Message::decode(raw),
            Err(ProtocolError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_players_lists_every_payload_state() {
        let update = Message::ServerUpdate {
            players: vec![player("0"), player("1")],
        };
        let ids: Vec<_> = update.players().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1"]);

        assert_eq!(Message::PlayerDelete { player: player("3") }.players().count(), 1);
        assert_eq!(Message::PlayerInput.players().count(), 0);
    }

    #[test]
    fn test_garbage_bytes() {
        assert!(matches!(
            Message::decode(&[0xff, 0xfe, 0x00]),
            Err(ProtocolError::MalformedMessage(_))
        ));
        assert!(matches!(
            Message::decode(b"not json"),
            Err(ProtocolError::MalformedMessage(_))
        ));
        assert!(matches!(
            Message::decode(b"[1,2,3]"),
            Err(ProtocolError::MalformedMessage(_))
        ));
    }
}
