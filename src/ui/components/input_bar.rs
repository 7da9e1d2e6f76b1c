use std::path::PathBuf;

use crate::common::ClientCommand;
use crate::ui::state::AppState;

pub const HELP: &str = "\
commands:
  /create <name>            create a room
  /join [room id [user]]    join a room (defaults to the last created room)
  /leave                    leave the current room
  /more, /history           load older messages
  /attach <path>            pick an image to upload (no path clears it)
  /upload                   upload the picked image and send it
  /help                     show this text
  /quit, /exit              exit
anything else is sent as a text message";

#[derive(Debug, Clone)]
pub enum InputAction {
    Command(ClientCommand),
    /// A local problem with the typed line; nothing is sent.
    Invalid(String),
    Help,
    Quit,
    Nothing,
}

pub fn parse_line(line: &str, state: &AppState) -> InputAction {
    let line = line.trim();
    if line.is_empty() {
        return InputAction::Nothing;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return InputAction::Command(ClientCommand::SendText(line.to_string()));
    };

    let (verb, args) = match rest.split_once(char::is_whitespace) {
        Some((verb, args)) => (verb, args.trim()),
        None => (rest, ""),
    };

    match verb {
        "create" => InputAction::Command(ClientCommand::CreateRoom {
            name: args.to_string(),
        }),
        "join" => parse_join(args, state),
        "leave" => InputAction::Command(ClientCommand::LeaveRoom),
        "more" | "history" => InputAction::Command(ClientCommand::LoadMoreHistory),
        "attach" if args.is_empty() => InputAction::Command(ClientCommand::SelectFile(None)),
        "attach" => InputAction::Command(ClientCommand::SelectFile(Some(PathBuf::from(args)))),
        "upload" => InputAction::Command(ClientCommand::UploadSelected),
        "help" => InputAction::Help,
        "quit" | "exit" => InputAction::Quit,
        other => InputAction::Invalid(format!("Unknown command /{other}")),
    }
}

fn parse_join(args: &str, state: &AppState) -> InputAction {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let user = parts
        .get(2)
        .map(|user| user.to_string())
        .or_else(|| state.username.clone())
        .unwrap_or_default();

    let (room, room_id) = match parts.as_slice() {
        [] => match &state.last_created {
            Some(room) => (room.name.clone(), room.id),
            None => return InputAction::Invalid("Usage: /join <room> <id> [user]".to_string()),
        },
        [_] => return InputAction::Invalid("Usage: /join <room> <id> [user]".to_string()),
        [room, id, ..] => match id.parse::<i64>() {
            Ok(id) => (room.to_string(), id),
            Err(_) => return InputAction::Invalid(format!("Room ID must be a number, got `{id}`")),
        },
    };

    // Empty fields are passed through; the room session rejects them.
    InputAction::Command(ClientCommand::JoinRoom {
        user,
        room,
        room_id,
    })
}
