use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;

use crate::common::{
    ChatMessage, ClientCommand, ClientEvent, ContentType, RoomRef, TransportEvent,
};
use crate::error::ClientError;
use crate::sync::paginator::DEFAULT_PAGE_SIZE;
use crate::sync::upload::read_upload;
use crate::sync::{
    EchoPolicy, HistoryPaginator, PageOutcome, PageRequest, RoomSession, Timeline, UploadRelay,
    UploadRequest,
};

use super::api::{ChatApi, UploadedFile};
use super::transport::{Connector, TransportSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub page_size: usize,
    pub echo_policy: EchoPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            echo_policy: EchoPolicy::default(),
        }
    }
}

/// A finished request/response call, fed back into the loop.
enum Completion {
    RoomCreated(Result<RoomRef, ClientError>),
    HistoryPage {
        request: PageRequest,
        result: Result<Vec<ChatMessage>, ClientError>,
    },
    Upload {
        request: UploadRequest,
        result: Result<UploadedFile, ClientError>,
    },
}

/// The dispatch loop. Owns every piece of session state and is its only writer.
pub struct ChatClient<A, C> {
    api: A,
    transport: TransportSession<C>,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    room: RoomSession,
    paginator: HistoryPaginator,
    timeline: Timeline,
    uploads: UploadRelay,
    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
    event_sender: mpsc::Sender<ClientEvent>,
    command_receiver: mpsc::Receiver<ClientCommand>,
}

impl<A: ChatApi, C: Connector> ChatClient<A, C> {
    pub fn new(
        api: A,
        connector: C,
        options: ClientOptions,
        event_sender: mpsc::Sender<ClientEvent>,
        command_receiver: mpsc::Receiver<ClientCommand>,
    ) -> Self {
        let (transport, transport_events) = TransportSession::new(connector);
        Self {
            api,
            transport,
            transport_events,
            room: RoomSession::new(),
            paginator: HistoryPaginator::new(options.page_size),
            timeline: Timeline::new(options.echo_policy),
            uploads: UploadRelay::new(),
            pending: FuturesUnordered::new(),
            event_sender,
            command_receiver,
        }
    }

    /// Runs until the UI drops its command sender.
    pub async fn run(mut self) {
        log::info!("Chat dispatch loop started");

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
                Some(event) = self.transport_events.recv() => {
                    self.handle_transport_event(event).await;
                }
                Some(completion) = self.pending.next(), if !self.pending.is_empty() => {
                    self.handle_completion(completion).await;
                }
            }
        }

        if let Some(payload) = self.room.leave() {
            self.transport.emit("leave_room", &payload);
        }
        log::info!("Chat dispatch loop stopped");
    }

    async fn handle_command(&mut self, command: ClientCommand) {
        match command {
            ClientCommand::CreateRoom { name } => self.create_room(name).await,
            ClientCommand::JoinRoom {
                user,
                room,
                room_id,
            } => self.join(&user, &room, room_id).await,
            ClientCommand::LeaveRoom => self.leave().await,
            ClientCommand::SendText(content) => self.send(&content, ContentType::Text).await,
            ClientCommand::LoadMoreHistory => self.load_history(),
            ClientCommand::SelectFile(path) => self.uploads.select(path),
            ClientCommand::UploadSelected => self.upload().await,
        }
    }

    async fn create_room(&mut self, name: String) {
        let name = name.trim().to_string();
        if name.is_empty() {
            self.alert("Enter room name").await;
            return;
        }

        let api = self.api.clone();
        self.pending
            .push(async move { Completion::RoomCreated(api.create_room(name).await) }.boxed());
    }

    async fn join(&mut self, user: &str, room: &str, room_id: i64) {
        let plan = match self.room.join(user, room, room_id) {
            Ok(plan) => plan,
            Err(err) => {
                self.alert(err.to_string()).await;
                return;
            }
        };

        self.transport.connect();
        if let Some(left) = &plan.left {
            self.transport.emit("leave_room", left);
        }
        self.transport.emit("join_room", &plan.joined);
        log::info!("Joined {} as {}", plan.active.room, plan.active.identity);

        self.paginator.reset();
        let cleared = self.timeline.reset();
        self.publish(ClientEvent::Timeline(cleared)).await;
        self.publish(ClientEvent::RoomChanged(Some(plan.active.room)))
            .await;
        self.load_history();
    }

    async fn leave(&mut self) {
        let Some(payload) = self.room.leave() else {
            return;
        };
        self.transport.emit("leave_room", &payload);
        self.alert(format!("Left {}", payload.room)).await;
        self.publish(ClientEvent::RoomChanged(None)).await;
    }

    async fn send(&mut self, content: &str, content_type: ContentType) {
        let Some(outgoing) = self.room.send(content, content_type) else {
            log::debug!("Ignoring send without a room or content");
            return;
        };
        if !self.transport.is_open() {
            log::warn!("Not sending to {}: connection closed", outgoing.payload.room);
            self.alert("Not connected; rejoin the room to reconnect").await;
            return;
        }
        self.transport.emit("send_message", &outgoing.payload);
        let update = self.timeline.append_local(outgoing.echo);
        self.publish(ClientEvent::Timeline(update)).await;
    }

    fn load_history(&mut self) {
        let Some(active) = self.room.current() else {
            log::debug!("No active room; not loading history");
            return;
        };
        let Some(request) = self.paginator.begin(active) else {
            log::debug!("History page already in flight for room {}", active.room.id);
            return;
        };

        let api = self.api.clone();
        self.pending.push(
            async move {
                let result = api
                    .list_messages(request.room_id, request.cursor, request.limit)
                    .await;
                Completion::HistoryPage { request, result }
            }
            .boxed(),
        );
    }

    async fn upload(&mut self) {
        let request = match self.uploads.begin(self.room.current()) {
            Ok(request) => request,
            Err(err) => {
                self.alert(err.to_string()).await;
                return;
            }
        };

        let api = self.api.clone();
        self.pending.push(
            async move {
                let result = match read_upload(&request.path).await {
                    Ok(file) => api.upload(file).await,
                    Err(err) => Err(err),
                };
                Completion::Upload { request, result }
            }
            .boxed(),
        );
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        if let Some(state) = self.transport.observe(&event) {
            self.publish(ClientEvent::ConnectionChanged(state)).await;
            return;
        }

        match event {
            TransportEvent::Notification { msg, .. } => self.alert(msg).await,
            TransportEvent::MessageReceived { message, .. } => {
                let local = self.room.identity();
                if let Some(update) = self.timeline.append_live(message, local) {
                    self.publish(ClientEvent::Timeline(update)).await;
                }
            }
            TransportEvent::Connected { .. } | TransportEvent::Disconnected { .. } => {}
        }
    }

    async fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::RoomCreated(Ok(room)) => {
                self.alert(format!("Room created: id={}, name={}", room.id, room.name))
                    .await;
                self.publish(ClientEvent::RoomCreated(room)).await;
            }
            Completion::RoomCreated(Err(err)) => {
                log::warn!("Create room failed: {err}");
                self.alert("Failed to create room").await;
            }
            Completion::HistoryPage { request, result } => {
                if let Err(err) = self.ensure_current(request.generation) {
                    log::debug!("Discarding history page for room {}: {err}", request.room_id);
                    return;
                }
                self.apply_page(&request, result).await;
            }
            Completion::Upload { request, result } => {
                if let Err(err) = self.ensure_current(request.generation) {
                    log::debug!("Discarding upload of {}: {err}", request.path.display());
                    return;
                }
                match result {
                    Ok(uploaded) => {
                        self.uploads.complete(&request);
                        self.publish(ClientEvent::UploadCompleted {
                            filename: uploaded.filename,
                        })
                        .await;
                        self.send(&uploaded.url, ContentType::Image).await;
                    }
                    Err(err) => {
                        log::warn!("Upload of {} failed: {err}", request.path.display());
                        self.alert("Upload failed").await;
                    }
                }
            }
        }
    }

    async fn apply_page(&mut self, request: &PageRequest, result: Result<Vec<ChatMessage>, ClientError>) {
        match self.paginator.complete(request, result) {
            Ok(PageOutcome::Page(page)) => {
                let update = self.timeline.prepend_page(page, self.room.identity());
                self.publish(ClientEvent::Timeline(update)).await;
            }
            Ok(PageOutcome::Empty { placeholder: true }) => {
                let update = self.timeline.append_placeholder();
                self.publish(ClientEvent::Timeline(update)).await;
            }
            Ok(PageOutcome::Empty { placeholder: false }) => {
                log::debug!("No older history for room {}", request.room_id);
            }
            Err(err) => {
                log::warn!("History fetch for room {} failed: {err}", request.room_id);
                self.alert("Failed to load history").await;
            }
        }
    }

    fn ensure_current(&self, generation: u64) -> Result<(), ClientError> {
        if self.room.is_current(generation) {
            Ok(())
        } else {
            Err(ClientError::Stale)
        }
    }

    async fn alert(&mut self, message: impl Into<String>) {
        self.publish(ClientEvent::Alert(message.into())).await;
    }

    // Takes `&mut self` so the returned future stays `Send`: the pending set is not `Sync`.
    async fn publish(&mut self, event: ClientEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to deliver event to UI: {err}");
        }
    }
}
