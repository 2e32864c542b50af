//! Pre-checks on untrusted input before invoices touch the aggregate.
//!
//! The settlement engine is deliberately permissive (it absorbs divergent
//! consumption maps and unknown ids); this layer is where such input is
//! rejected. A birthday person outside the participant list is permitted —
//! the engine treats it as a no-op.

use std::collections::BTreeMap;

use fairsplit_domain::{
    DivisionMethod, Event, Invoice, InvoiceItem, ItemId, Money, PersonId,
};
use fxhash::FxHashSet;
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Person name must not be empty")]
    EmptyPersonName,
    #[error("Invoice amount must be positive (got {0})")]
    NonPositiveAmount(Money),
    #[error("Tip must not be negative (got {0})")]
    NegativeTip(Money),
    #[error("Person #{0} is not defined in the event")]
    UnknownPerson(PersonId),
    #[error("Consumption entry for person #{0} names a non-participant")]
    ConsumptionOutsideParticipants(PersonId),
    #[error("Declared consumptions total {declared}, invoice amount is {amount}")]
    ConsumptionMismatch { declared: Money, amount: Money },
    #[error("Item '{0}' must have a quantity of at least 1")]
    ZeroItemQuantity(SmolStr),
    #[error("Item '{0}' must not have a negative unit price")]
    NegativeUnitPrice(SmolStr),
    #[error("Item '{item}' lists person #{person} who is not an invoice participant")]
    ItemParticipantOutsideInvoice { item: SmolStr, person: PersonId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonDraft {
    pub name: SmolStr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: SmolStr,
    pub unit_price: Money,
    pub quantity: u32,
    pub participant_ids: Vec<PersonId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub description: SmolStr,
    pub amount: Money,
    pub payer_id: PersonId,
    pub participant_ids: Vec<PersonId>,
    pub division: DivisionMethod,
    pub tip_amount: Money,
    pub birthday_person_id: Option<PersonId>,
    pub items: Vec<ItemDraft>,
}

impl InvoiceDraft {
    pub fn new(
        description: impl Into<SmolStr>,
        amount: Money,
        payer_id: PersonId,
        participant_ids: Vec<PersonId>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            payer_id,
            participant_ids,
            division: DivisionMethod::Equal,
            tip_amount: Money::ZERO,
            birthday_person_id: None,
            items: Vec::new(),
        }
    }

    /// The participant list the constructed invoice will carry: the payer
    /// followed by the supplied participants, first occurrence wins.
    fn effective_participants(&self) -> Vec<PersonId> {
        let mut participants = Vec::with_capacity(self.participant_ids.len() + 1);
        for person in std::iter::once(self.payer_id).chain(self.participant_ids.iter().copied()) {
            if !participants.contains(&person) {
                participants.push(person);
            }
        }
        participants
    }

    pub fn into_invoice(self) -> Invoice {
        let items: Vec<InvoiceItem> = self
            .items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| InvoiceItem {
                id: ItemId(idx as u64 + 1),
                name: item.name,
                unit_price: item.unit_price,
                quantity: item.quantity,
                participant_ids: item.participant_ids,
            })
            .collect();

        let mut invoice = Invoice::new(
            self.description,
            self.amount,
            self.payer_id,
            self.participant_ids,
        )
        .with_division(self.division)
        .with_tip(self.tip_amount)
        .with_items(items);
        if let Some(birthday) = self.birthday_person_id {
            invoice = invoice.with_birthday_person(birthday);
        }
        invoice
    }
}

pub fn validate_person(draft: &PersonDraft) -> Result<(), ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::EmptyPersonName);
    }
    Ok(())
}

pub fn validate_invoice(draft: &InvoiceDraft, event: &Event) -> Result<(), ValidationError> {
    if !draft.amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount(draft.amount));
    }
    if draft.tip_amount.is_negative() {
        return Err(ValidationError::NegativeTip(draft.tip_amount));
    }

    let defined: FxHashSet<PersonId> = event.people().iter().map(|person| person.id()).collect();
    let require_defined = |person: PersonId| {
        if defined.contains(&person) {
            Ok(())
        } else {
            Err(ValidationError::UnknownPerson(person))
        }
    };

    require_defined(draft.payer_id)?;
    for person in &draft.participant_ids {
        require_defined(*person)?;
    }

    let participants: FxHashSet<PersonId> = draft.effective_participants().into_iter().collect();

    if let DivisionMethod::Consumption(consumptions) = &draft.division {
        validate_consumptions(consumptions, &participants, draft.amount)?;
        for person in consumptions.keys() {
            require_defined(*person)?;
        }
    }

    for item in &draft.items {
        if item.quantity == 0 {
            return Err(ValidationError::ZeroItemQuantity(item.name.clone()));
        }
        if item.unit_price.is_negative() {
            return Err(ValidationError::NegativeUnitPrice(item.name.clone()));
        }
        for person in &item.participant_ids {
            require_defined(*person)?;
            if !participants.contains(person) {
                return Err(ValidationError::ItemParticipantOutsideInvoice {
                    item: item.name.clone(),
                    person: *person,
                });
            }
        }
    }

    Ok(())
}

fn validate_consumptions(
    consumptions: &BTreeMap<PersonId, Money>,
    participants: &FxHashSet<PersonId>,
    amount: Money,
) -> Result<(), ValidationError> {
    for person in consumptions.keys() {
        if !participants.contains(person) {
            return Err(ValidationError::ConsumptionOutsideParticipants(*person));
        }
    }

    let declared: Money = consumptions.values().copied().sum();
    if declared != amount {
        return Err(ValidationError::ConsumptionMismatch { declared, amount });
    }
    Ok(())
}
