use crate::common::ChatMessage;
use crate::error::ClientError;

use super::room::ActiveRoom;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A page fetch, tagged with the room generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub room_id: i64,
    pub cursor: usize,
    pub limit: usize,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Records in service order, newest first.
    Page(Vec<ChatMessage>),
    /// Nothing returned. `placeholder` is set only when the first fetch after a
    /// join found the room without history.
    Empty { placeholder: bool },
}

/// Offset-based history cursor for the active room.
#[derive(Debug)]
pub struct HistoryPaginator {
    cursor: usize,
    page_size: usize,
    in_flight: bool,
    /// A fetch has succeeded since the last join.
    fetched: bool,
}

impl HistoryPaginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            cursor: 0,
            page_size: page_size.max(1),
            in_flight: false,
            fetched: false,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Called on every join.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.in_flight = false;
        self.fetched = false;
    }

    /// Starts a fetch from the current cursor. `None` while one is already pending.
    pub fn begin(&mut self, active: &ActiveRoom) -> Option<PageRequest> {
        if self.in_flight {
            return None;
        }
        self.in_flight = true;
        Some(PageRequest {
            room_id: active.room.id,
            cursor: self.cursor,
            limit: self.page_size,
            generation: active.generation,
        })
    }

    /// Applies the response to `request`, which must belong to the active room.
    ///
    /// The cursor advances by the number of records returned; a failure leaves
    /// it where it was so the fetch can be retried.
    pub fn complete(
        &mut self,
        request: &PageRequest,
        result: Result<Vec<ChatMessage>, ClientError>,
    ) -> Result<PageOutcome, ClientError> {
        self.in_flight = false;
        let page = result?;
        let first = !self.fetched;
        self.fetched = true;
        if page.is_empty() {
            return Ok(PageOutcome::Empty {
                placeholder: first && request.cursor == 0,
            });
        }
        self.cursor += page.len();
        Ok(PageOutcome::Page(page))
    }
}

impl Default for HistoryPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use crate::common::{ContentType, Identity, RoomRef};

    use super::*;

    fn lobby() -> ActiveRoom {
        ActiveRoom {
            room: RoomRef {
                name: "lobby".to_string(),
                id: 7,
            },
            identity: Identity::new("alice"),
            generation: 1,
        }
    }

    fn records(count: usize) -> Vec<ChatMessage> {
        (0..count)
            .map(|i| ChatMessage::new("bob", format!("m{i}"), ContentType::Text))
            .collect()
    }

    #[test]
    fn first_request_starts_at_zero() {
        let mut paginator = HistoryPaginator::default();
        let request = paginator.begin(&lobby()).unwrap();
        assert_eq!(
            request,
            PageRequest {
                room_id: 7,
                cursor: 0,
                limit: 20,
                generation: 1
            }
        );
    }

    #[test]
    fn cursor_advances_by_records_returned() {
        let mut paginator = HistoryPaginator::default();

        let request = paginator.begin(&lobby()).unwrap();
        let outcome = paginator.complete(&request, Ok(records(5))).unwrap();
        assert!(matches!(outcome, PageOutcome::Page(ref page) if page.len() == 5));
        assert_eq!(paginator.cursor(), 5);

        let request = paginator.begin(&lobby()).unwrap();
        assert_eq!(request.cursor, 5);
        let outcome = paginator.complete(&request, Ok(Vec::new())).unwrap();
        assert_eq!(outcome, PageOutcome::Empty { placeholder: false });
        assert_eq!(paginator.cursor(), 5);
    }

    #[test]
    fn empty_first_page_asks_for_placeholder() {
        let mut paginator = HistoryPaginator::default();
        let request = paginator.begin(&lobby()).unwrap();
        let outcome = paginator.complete(&request, Ok(Vec::new())).unwrap();
        assert_eq!(outcome, PageOutcome::Empty { placeholder: true });
        assert_eq!(paginator.cursor(), 0);
    }

    #[test]
    fn only_first_empty_fetch_asks_for_placeholder() {
        let mut paginator = HistoryPaginator::default();
        let request = paginator.begin(&lobby()).unwrap();
        let outcome = paginator.complete(&request, Ok(Vec::new())).unwrap();
        assert_eq!(outcome, PageOutcome::Empty { placeholder: true });

        let request = paginator.begin(&lobby()).unwrap();
        assert_eq!(request.cursor, 0);
        let outcome = paginator.complete(&request, Ok(Vec::new())).unwrap();
        assert_eq!(outcome, PageOutcome::Empty { placeholder: false });

        paginator.reset();
        let request = paginator.begin(&lobby()).unwrap();
        let outcome = paginator.complete(&request, Ok(Vec::new())).unwrap();
        assert_eq!(outcome, PageOutcome::Empty { placeholder: true });
    }

    #[test]
    fn failed_first_fetch_still_allows_placeholder_on_retry() {
        let mut paginator = HistoryPaginator::default();
        let request = paginator.begin(&lobby()).unwrap();
        assert!(paginator
            .complete(&request, Err(ClientError::TransportUnavailable))
            .is_err());

        let request = paginator.begin(&lobby()).unwrap();
        let outcome = paginator.complete(&request, Ok(Vec::new())).unwrap();
        assert_eq!(outcome, PageOutcome::Empty { placeholder: true });
    }

    #[test]
    fn failure_keeps_cursor_and_allows_retry() {
        let mut paginator = HistoryPaginator::new(3);
        let request = paginator.begin(&lobby()).unwrap();
        paginator.complete(&request, Ok(records(3))).unwrap();

        let request = paginator.begin(&lobby()).unwrap();
        let result = paginator.complete(&request, Err(ClientError::TransportUnavailable));
        assert!(result.is_err());
        assert_eq!(paginator.cursor(), 3);

        let retry = paginator.begin(&lobby()).unwrap();
        assert_eq!(retry.cursor, 3);
    }

    #[test]
    fn one_request_in_flight_at_a_time() {
        let mut paginator = HistoryPaginator::default();
        assert!(paginator.begin(&lobby()).is_some());
        assert!(paginator.begin(&lobby()).is_none());

        paginator.reset();
        assert!(paginator.begin(&lobby()).is_some());
    }
}
