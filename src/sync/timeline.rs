use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{ChatMessage, ContentType, Identity, Origin, TimelineEntry, TimelineUpdate};

pub const PLACEHOLDER_SENDER: &str = "System";
pub const PLACEHOLDER_TEXT: &str = "No previous messages";

/// What to do with the service's echo of a message this client sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EchoPolicy {
    /// Drop the echo whose `client_id` matches a local send.
    #[default]
    Correlate,
    /// Render both the local copy and the echo.
    Duplicate,
}

/// The single ordered timeline handed to the presentation layer.
#[derive(Debug, Default)]
pub struct Timeline {
    entries: VecDeque<TimelineEntry>,
    pending_echoes: HashSet<Uuid>,
    policy: EchoPolicy,
}

impl Timeline {
    pub fn new(policy: EchoPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn reset(&mut self) -> TimelineUpdate {
        self.entries.clear();
        self.pending_echoes.clear();
        TimelineUpdate::Cleared
    }

    /// Appends the optimistic copy of a message this client just sent.
    pub fn append_local(&mut self, message: ChatMessage) -> TimelineUpdate {
        if self.policy == EchoPolicy::Correlate {
            if let Some(client_id) = message.client_id {
                self.pending_echoes.insert(client_id);
            }
        }
        self.push_back(message, Origin::Own)
    }

    /// Appends a message delivered by the service, unless it is the echo of a local send.
    pub fn append_live(
        &mut self,
        message: ChatMessage,
        local: Option<&Identity>,
    ) -> Option<TimelineUpdate> {
        if let Some(client_id) = message.client_id {
            if self.pending_echoes.remove(&client_id) {
                log::debug!("Suppressing echo of local message {client_id}");
                return None;
            }
        }
        let origin = origin_of(&message, local);
        Some(self.push_back(message, origin))
    }

    pub fn append_placeholder(&mut self) -> TimelineUpdate {
        let message = ChatMessage::new(PLACEHOLDER_SENDER, PLACEHOLDER_TEXT, ContentType::Text);
        self.push_back(message, Origin::System)
    }

    /// Inserts a history page before everything shown.
    ///
    /// `page` comes newest first; it is reversed so the timeline reads oldest
    /// to newest.
    pub fn prepend_page(&mut self, page: Vec<ChatMessage>, local: Option<&Identity>) -> TimelineUpdate {
        let block: Vec<TimelineEntry> = page
            .into_iter()
            .rev()
            .map(|message| {
                let origin = origin_of(&message, local);
                TimelineEntry { message, origin }
            })
            .collect();

        for entry in block.iter().rev() {
            self.entries.push_front(entry.clone());
        }
        TimelineUpdate::Prepended(block)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_back(&mut self, message: ChatMessage, origin: Origin) -> TimelineUpdate {
        let entry = TimelineEntry { message, origin };
        self.entries.push_back(entry.clone());
        TimelineUpdate::Appended(entry)
    }
}

fn origin_of(message: &ChatMessage, local: Option<&Identity>) -> Origin {
    match local {
        Some(identity) if identity.matches(&message.sender) => Origin::Own,
        _ => Origin::Peer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(sender: &str, content: &str) -> ChatMessage {
        ChatMessage::new(sender, content, ContentType::Text)
    }

    fn contents(timeline: &Timeline) -> Vec<String> {
        timeline
            .entries()
            .map(|entry| entry.message.content.clone())
            .collect()
    }

    #[test]
    fn pages_are_reversed_and_stacked_oldest_first() {
        let mut timeline = Timeline::default();
        timeline.append_live(text("bob", "live"), None);

        let update = timeline.prepend_page(vec![text("bob", "m3"), text("bob", "m2"), text("bob", "m1")], None);
        match update {
            TimelineUpdate::Prepended(block) => {
                let order: Vec<_> = block.iter().map(|e| e.message.content.as_str()).collect();
                assert_eq!(order, ["m1", "m2", "m3"]);
            }
            other => panic!("unexpected update {other:?}"),
        }

        timeline.prepend_page(vec![text("bob", "m0"), text("bob", "m-1")], None);
        assert_eq!(contents(&timeline), ["m-1", "m0", "m1", "m2", "m3", "live"]);
    }

    #[test]
    fn history_from_local_identity_is_own() {
        let mut timeline = Timeline::default();
        let alice = Identity::new("alice");
        timeline.prepend_page(vec![text("alice", "mine"), text("bob", "theirs")], Some(&alice));

        let origins: Vec<_> = timeline.entries().map(|e| e.origin).collect();
        assert_eq!(origins, [Origin::Peer, Origin::Own]);
    }

    #[test]
    fn correlated_echo_is_dropped_once() {
        let mut timeline = Timeline::new(EchoPolicy::Correlate);
        let alice = Identity::new("alice");
        let mut local = text("alice", "hi");
        local.client_id = Some(Uuid::new_v4());

        timeline.append_local(local.clone());
        assert!(timeline.append_live(local.clone(), Some(&alice)).is_none());
        assert_eq!(timeline.len(), 1);

        // A second delivery with the same id is no longer pending.
        let again = timeline.append_live(local, Some(&alice)).unwrap();
        assert!(matches!(again, TimelineUpdate::Appended(ref e) if e.origin == Origin::Own));
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn duplicate_policy_renders_both_copies() {
        let mut timeline = Timeline::new(EchoPolicy::Duplicate);
        let alice = Identity::new("alice");
        let mut local = text("alice", "hi");
        local.client_id = Some(Uuid::new_v4());

        timeline.append_local(local.clone());
        let echo = timeline.append_live(local, Some(&alice)).unwrap();

        assert!(matches!(echo, TimelineUpdate::Appended(ref e) if e.origin == Origin::Own));
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn echo_without_client_id_is_kept() {
        let mut timeline = Timeline::new(EchoPolicy::Correlate);
        let mut local = text("alice", "hi");
        local.client_id = Some(Uuid::new_v4());
        timeline.append_local(local);

        assert!(timeline.append_live(text("alice", "hi"), None).is_some());
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn reset_forgets_entries_and_pending_echoes() {
        let mut timeline = Timeline::new(EchoPolicy::Correlate);
        let mut local = text("alice", "hi");
        local.client_id = Some(Uuid::new_v4());
        timeline.append_local(local.clone());

        assert_eq!(timeline.reset(), TimelineUpdate::Cleared);
        assert!(timeline.is_empty());
        assert!(timeline.append_live(local, None).is_some());
    }

    #[test]
    fn placeholder_is_a_system_entry() {
        let mut timeline = Timeline::default();
        match timeline.append_placeholder() {
            TimelineUpdate::Appended(entry) => {
                assert_eq!(entry.origin, Origin::System);
                assert_eq!(entry.message.sender, PLACEHOLDER_SENDER);
                assert_eq!(entry.message.content, PLACEHOLDER_TEXT);
            }
            other => panic!("unexpected update {other:?}"),
        }
    }
}
