//! Explicit application state: an owned collection of events plus the
//! current selection, passed by reference to whatever surface embeds it.
//! Mutations validate drafts before touching the aggregate; the settlement
//! engine itself only ever sees immutable snapshots.

use std::collections::BTreeMap;

use fairsplit_domain::{
    Balance, Event, EventId, InvoiceId, PersonId, SettlementTransfer, suggest_transfers,
};

use crate::{
    error::AppError,
    validation::{InvoiceDraft, PersonDraft, validate_invoice, validate_person},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementSummary {
    pub balances: Vec<Balance>,
    pub transfers: Vec<SettlementTransfer>,
}

/// Runs the two-stage pipeline over one event snapshot.
pub fn summarize(event: &Event) -> SettlementSummary {
    let balances = event.balances();
    let transfers = suggest_transfers(&balances);
    SettlementSummary {
        balances,
        transfers,
    }
}

#[derive(Debug)]
pub struct AppState {
    events: BTreeMap<EventId, Event>,
    selected: Option<EventId>,
    next_event_id: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            selected: None,
            next_event_id: 1,
        }
    }

    pub fn create_event(&mut self, name: &str) -> EventId {
        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        self.events.insert(id, Event::new(id, name));
        if self.selected.is_none() {
            self.selected = Some(id);
        }
        id
    }

    pub fn select_event(&mut self, id: EventId) -> Result<(), AppError> {
        if !self.events.contains_key(&id) {
            return Err(AppError::EventNotFound(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    pub fn delete_event(&mut self, id: EventId) -> Result<(), AppError> {
        self.events
            .remove(&id)
            .ok_or(AppError::EventNotFound(id))?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn event_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.events.get_mut(&id)
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.selected.and_then(|id| self.events.get(&id))
    }

    pub fn add_person(
        &mut self,
        event_id: EventId,
        draft: &PersonDraft,
    ) -> Result<PersonId, AppError> {
        validate_person(draft)?;
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(AppError::EventNotFound(event_id))?;
        Ok(event.add_person(draft.name.trim()))
    }

    pub fn remove_person(
        &mut self,
        event_id: EventId,
        person_id: PersonId,
    ) -> Result<(), AppError> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(AppError::EventNotFound(event_id))?;
        event.remove_person(person_id)?;
        Ok(())
    }

    pub fn add_invoice(
        &mut self,
        event_id: EventId,
        draft: InvoiceDraft,
    ) -> Result<InvoiceId, AppError> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(AppError::EventNotFound(event_id))?;
        validate_invoice(&draft, event)?;
        Ok(event.add_invoice(draft.into_invoice()))
    }

    pub fn update_invoice(
        &mut self,
        event_id: EventId,
        invoice_id: InvoiceId,
        draft: InvoiceDraft,
    ) -> Result<(), AppError> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(AppError::EventNotFound(event_id))?;
        validate_invoice(&draft, event)?;
        event.update_invoice(invoice_id, draft.into_invoice())?;
        Ok(())
    }

    pub fn remove_invoice(
        &mut self,
        event_id: EventId,
        invoice_id: InvoiceId,
    ) -> Result<(), AppError> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(AppError::EventNotFound(event_id))?;
        event.remove_invoice(invoice_id)?;
        Ok(())
    }

    pub fn settlement_summary(&self, event_id: EventId) -> Result<SettlementSummary, AppError> {
        let event = self
            .event(event_id)
            .ok_or(AppError::EventNotFound(event_id))?;
        Ok(summarize(event))
    }
}
