use std::collections::VecDeque;
use std::path::PathBuf;

use crate::common::{ClientCommand, ClientEvent, ConnectionState, RoomRef, TimelineEntry, TimelineUpdate};

/// Local mirror of what the terminal shows.
pub struct AppState {
    pub entries: VecDeque<TimelineEntry>,
    pub connection: ConnectionState,
    pub room: Option<RoomRef>,
    /// Target of a bare `/join`.
    pub last_created: Option<RoomRef>,
    pub username: Option<String>,
    pub selected_file: Option<PathBuf>,
}

impl AppState {
    pub fn new(username: Option<String>) -> Self {
        Self {
            entries: VecDeque::new(),
            connection: ConnectionState::Disconnected,
            room: None,
            last_created: None,
            username,
            selected_file: None,
        }
    }

    /// Tracks what the user asked for before the dispatch loop answers.
    pub fn note_command(&mut self, command: &ClientCommand) {
        match command {
            ClientCommand::JoinRoom { user, .. } if !user.trim().is_empty() => {
                self.username = Some(user.trim().to_string());
            }
            ClientCommand::SelectFile(path) => self.selected_file = path.clone(),
            _ => {}
        }
    }

    pub fn apply(&mut self, event: &ClientEvent) {
        match event {
            ClientEvent::Timeline(update) => self.apply_timeline(update),
            ClientEvent::Alert(_) => {}
            ClientEvent::ConnectionChanged(state) => self.connection = *state,
            ClientEvent::RoomChanged(room) => self.room = room.clone(),
            ClientEvent::RoomCreated(room) => self.last_created = Some(room.clone()),
            ClientEvent::UploadCompleted { .. } => self.selected_file = None,
        }
    }

    fn apply_timeline(&mut self, update: &TimelineUpdate) {
        match update {
            TimelineUpdate::Cleared => self.entries.clear(),
            TimelineUpdate::Appended(entry) => self.entries.push_back(entry.clone()),
            TimelineUpdate::Prepended(block) => {
                for entry in block.iter().rev() {
                    self.entries.push_front(entry.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::common::{ChatMessage, ContentType, Origin};

    use super::*;

    fn entry(content: &str) -> TimelineEntry {
        TimelineEntry {
            message: ChatMessage::new("bob", content, ContentType::Text),
            origin: Origin::Peer,
        }
    }

    fn contents(state: &AppState) -> Vec<&str> {
        state
            .entries
            .iter()
            .map(|entry| entry.message.content.as_str())
            .collect()
    }

    #[test]
    fn mirrors_timeline_updates() {
        let mut state = AppState::new(None);
        state.apply(&ClientEvent::Timeline(TimelineUpdate::Appended(entry("live"))));
        state.apply(&ClientEvent::Timeline(TimelineUpdate::Prepended(vec![
            entry("m1"),
            entry("m2"),
        ])));
        assert_eq!(contents(&state), ["m1", "m2", "live"]);

        state.apply(&ClientEvent::Timeline(TimelineUpdate::Cleared));
        assert!(state.entries.is_empty());
    }

    #[test]
    fn upload_completion_clears_attachment() {
        let mut state = AppState::new(None);
        state.note_command(&ClientCommand::SelectFile(Some(PathBuf::from("cat.png"))));
        assert!(state.selected_file.is_some());

        state.apply(&ClientEvent::Alert("Upload failed".to_string()));
        assert!(state.selected_file.is_some());

        state.apply(&ClientEvent::UploadCompleted {
            filename: "cat.png".to_string(),
        });
        assert!(state.selected_file.is_none());
    }

    #[test]
    fn remembers_join_user_and_created_room() {
        let mut state = AppState::new(None);
        state.note_command(&ClientCommand::JoinRoom {
            user: "alice".to_string(),
            room: "lobby".to_string(),
            room_id: 7,
        });
        assert_eq!(state.username.as_deref(), Some("alice"));

        let room = RoomRef {
            name: "games".to_string(),
            id: 8,
        };
        state.apply(&ClientEvent::RoomCreated(room.clone()));
        assert_eq!(state.last_created, Some(room));
    }
}
