use serde::Serialize;
use uuid::Uuid;

use crate::common::{ChatMessage, ContentType, Identity, RoomRef};
use crate::error::ClientError;

/// The room the client is in, stamped with the generation it was joined under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRoom {
    pub room: RoomRef,
    pub identity: Identity,
    pub generation: u64,
}

/// Payload of `join_room` and `leave_room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipPayload {
    pub room: String,
    pub user: String,
}

/// Payload of `send_message`. The service relays it verbatim as `receive_message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendPayload {
    pub room: String,
    pub room_id: i64,
    pub sender: String,
    pub content: String,
    pub content_type: ContentType,
    pub client_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    /// Set when a previous room had to be left first.
    pub left: Option<MembershipPayload>,
    pub joined: MembershipPayload,
    pub active: ActiveRoom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub payload: SendPayload,
    /// The optimistic local copy.
    pub echo: ChatMessage,
}

/// Which room the client is in. Sole writer of the active room.
#[derive(Debug, Default)]
pub struct RoomSession {
    identity: Option<Identity>,
    active: Option<ActiveRoom>,
    generation: u64,
}

impl RoomSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, user: &str, room_name: &str, room_id: i64) -> Result<JoinPlan, ClientError> {
        let user = user.trim();
        let room_name = room_name.trim();
        if user.is_empty() || room_name.is_empty() || room_id == 0 {
            return Err(ClientError::validation(
                "Enter username, room name, and room ID",
            ));
        }

        let left = self.leave();
        self.generation += 1;

        let identity = Identity::new(user);
        let active = ActiveRoom {
            room: RoomRef {
                name: room_name.to_string(),
                id: room_id,
            },
            identity: identity.clone(),
            generation: self.generation,
        };
        self.identity = Some(identity);
        self.active = Some(active.clone());

        Ok(JoinPlan {
            left,
            joined: MembershipPayload {
                room: active.room.name.clone(),
                user: user.to_string(),
            },
            active,
        })
    }

    /// Clears the active room, returning the `leave_room` payload if there was one.
    pub fn leave(&mut self) -> Option<MembershipPayload> {
        let active = self.active.take()?;
        self.generation += 1;
        Some(MembershipPayload {
            room: active.room.name,
            user: active.identity.to_string(),
        })
    }

    /// Builds an outgoing message bound to the current room.
    ///
    /// Returns `None`, without error, when there is no room or the content is blank.
    pub fn send(&self, content: &str, content_type: ContentType) -> Option<Outgoing> {
        let active = self.active.as_ref()?;
        let content = content.trim();
        if content.is_empty() {
            return None;
        }

        let client_id = Uuid::new_v4();
        let mut echo = ChatMessage::new(active.identity.as_str(), content, content_type);
        echo.client_id = Some(client_id);

        Some(Outgoing {
            payload: SendPayload {
                room: active.room.name.clone(),
                room_id: active.room.id,
                sender: active.identity.to_string(),
                content: content.to_string(),
                content_type,
                client_id,
            },
            echo,
        })
    }

    pub fn current(&self) -> Option<&ActiveRoom> {
        self.active.as_ref()
    }

    /// The last identity joined with. Survives `leave`.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Whether a response tagged with `generation` still belongs to the active room.
    pub fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }
}
