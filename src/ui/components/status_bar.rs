use crate::common::ConnectionState;

use crate::ui::state::AppState;

pub fn render(state: &AppState) -> String {
    let connection = match state.connection {
        ConnectionState::Connected => "Connected",
        ConnectionState::Disconnected => "Disconnected",
    };
    let room = state
        .room
        .as_ref()
        .map(|room| room.to_string())
        .unwrap_or_else(|| "—".to_string());
    let mut line = format!("[{connection}] room: {room} | {} messages", state.entries.len());
    if let Some(path) = &state.selected_file {
        line.push_str(&format!(" | attached: {}", path.display()));
    }
    line
}
