//! Calendar event use-cases.
//!
//! # Invariants
//! - Listing never fails; offline callers get the cached snapshot.
//! - A created event is visible in the cache before any network call.
//! - Events are never edited; delete is the only mutation.

use crate::cache::CacheStore;
use crate::model::calendar_event::{CalendarEvent, EventId, EventValidationError, NewCalendarEvent};
use crate::remote::{RemoteResult, RemoteStore};
use crate::sync::{SyncRead, Synchronizer, WriteOutcome};

pub struct CalendarService<C, R> {
    sync: Synchronizer<C, R>,
}

impl<C: CacheStore, R: RemoteStore> CalendarService<C, R> {
    pub fn new(cache: C, remote: R) -> Self {
        Self {
            sync: Synchronizer::new(cache, remote),
        }
    }

    pub fn synchronizer(&self) -> &Synchronizer<C, R> {
        &self.sync
    }

    /// Syncs with the remote store and returns events ordered by start date.
    pub fn list_events(&self) -> SyncRead<CalendarEvent> {
        let mut read = self.sync.read::<CalendarEvent>();
        sort_by_start(&mut read.items);
        read
    }

    /// Returns cached events ordered by start date, without network access.
    pub fn cached_events(&self) -> Vec<CalendarEvent> {
        let mut events = self.sync.cached::<CalendarEvent>();
        sort_by_start(&mut events);
        events
    }

    /// Validates `draft`, assigns identity and writes it through.
    ///
    /// # Errors
    /// Only validation failures; storage and network failures are reported
    /// inside the returned [`WriteOutcome`].
    pub fn create_event(
        &self,
        draft: NewCalendarEvent,
    ) -> Result<WriteOutcome<CalendarEvent>, EventValidationError> {
        let event = CalendarEvent::create(draft)?;
        Ok(self.sync.create(event))
    }

    pub fn delete_event(&self, id: EventId) -> WriteOutcome<bool> {
        self.sync.delete::<CalendarEvent>(&id)
    }

    /// Re-sends every cached event to the remote store.
    pub fn push_local_events(&self) -> RemoteResult<usize> {
        self.sync.push_local::<CalendarEvent>()
    }
}

fn sort_by_start(events: &mut [CalendarEvent]) {
    events.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
}
