use std::collections::VecDeque;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::common::{ClientCommand, ClientEvent};
use crate::network::HttpApi;

use super::components::input_bar::{self, HELP, InputAction};
use super::components::{chat_area, status_bar};
use super::state::AppState;

/// Line-oriented terminal front end.
pub struct TerminalApp {
    state: AppState,
    media: HttpApi,
    command_sender: mpsc::Sender<ClientCommand>,
    event_receiver: mpsc::Receiver<ClientEvent>,
}

impl TerminalApp {
    pub fn new(
        username: Option<String>,
        media: HttpApi,
        command_sender: mpsc::Sender<ClientCommand>,
        event_receiver: mpsc::Receiver<ClientEvent>,
    ) -> Self {
        Self {
            state: AppState::new(username),
            media,
            command_sender,
            event_receiver,
        }
    }

    /// Runs until stdin closes, `/quit` is typed or the dispatch loop goes away.
    pub async fn run(self) -> io::Result<()> {
        self.run_with(BufReader::new(tokio::io::stdin())).await
    }

    async fn run_with<R>(mut self, input: R) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        // Typed commands wait here for channel space so events keep draining.
        let mut outbox: VecDeque<ClientCommand> = VecDeque::new();
        let mut reading = true;
        let command_sender = self.command_sender.clone();
        println!("{HELP}");
        println!("{}", status_bar::render(&self.state));

        while reading || !outbox.is_empty() {
            tokio::select! {
                line = lines.next_line(), if reading => {
                    match line? {
                        Some(line) => reading = self.handle_line(&line, &mut outbox),
                        None => reading = false,
                    }
                }
                permit = command_sender.reserve(), if !outbox.is_empty() => {
                    let Ok(permit) = permit else {
                        log::warn!("Dispatch loop is gone; dropping {} queued commands", outbox.len());
                        break;
                    };
                    if let Some(command) = outbox.pop_front() {
                        permit.send(command);
                    }
                }
                event = self.event_receiver.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }

    /// Queues what the line asks for. Returns `false` once input should stop.
    fn handle_line(&mut self, line: &str, outbox: &mut VecDeque<ClientCommand>) -> bool {
        match input_bar::parse_line(line, &self.state) {
            InputAction::Command(command) => {
                self.state.note_command(&command);
                outbox.push_back(command);
            }
            InputAction::Invalid(message) => println!("! {message}"),
            InputAction::Help => println!("{HELP}"),
            InputAction::Quit => return false,
            InputAction::Nothing => {}
        }
        true
    }

    fn handle_event(&mut self, event: ClientEvent) {
        match &event {
            ClientEvent::Timeline(update) => {
                for line in chat_area::render(update, |url| self.media.resolve_media_url(url)) {
                    println!("{line}");
                }
            }
            ClientEvent::Alert(message) => println!("! {message}"),
            ClientEvent::UploadCompleted { filename } => println!("! Uploaded: {filename}"),
            ClientEvent::ConnectionChanged(_) | ClientEvent::RoomChanged(_) | ClientEvent::RoomCreated(_) => {}
        }

        self.state.apply(&event);
        if matches!(
            event,
            ClientEvent::ConnectionChanged(_) | ClientEvent::RoomChanged(_)
        ) {
            println!("{}", status_bar::render(&self.state));
        }
    }
}
