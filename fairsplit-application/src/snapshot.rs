//! JSON event snapshots: the host binary's input and the save format.
//!
//! The wire shape mirrors the upstream API contract, with optional fields
//! and string-tagged division methods. Loading re-mints person ids in
//! declaration order and remaps every reference through the old-to-new
//! table, then validates each invoice draft before it reaches the
//! aggregate. Saving emits the aggregate's real ids.

use std::{collections::BTreeMap, fs, path::Path};

use fairsplit_domain::{DivisionMethod, Event, EventId, Money, PersonId};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

use crate::validation::{InvoiceDraft, ItemDraft, validate_invoice};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] crate::validation::ValidationError),
    #[error("Snapshot references unknown person #{0}")]
    UnknownPerson(u64),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventSnapshot {
    pub name: SmolStr,
    #[serde(default)]
    pub people: Vec<PersonSnapshot>,
    #[serde(default)]
    pub invoices: Vec<InvoiceSnapshot>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PersonSnapshot {
    pub id: u64,
    pub name: SmolStr,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DivisionTag {
    #[default]
    Equal,
    Consumption,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InvoiceSnapshot {
    pub description: SmolStr,
    pub amount: Money,
    pub payer: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<u64>,
    #[serde(default)]
    pub division_method: DivisionTag,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub consumptions: BTreeMap<u64, Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday_person: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemSnapshot>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ItemSnapshot {
    pub name: SmolStr,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<u64>,
}

pub fn load_event(path: impl AsRef<Path>) -> Result<Event, SnapshotError> {
    let source = fs::read_to_string(path)?;
    decode_event(&source)
}

pub fn save_event(event: &Event, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
    let encoded = serde_json::to_string_pretty(&encode_event(event))?;
    fs::write(path, encoded)?;
    Ok(())
}

pub fn decode_event(source: &str) -> Result<Event, SnapshotError> {
    let snapshot: EventSnapshot = serde_json::from_str(source)?;
    let mut event = Event::new(EventId(1), snapshot.name.clone());

    let mut id_table: FxHashMap<u64, PersonId> = FxHashMap::default();
    for person in &snapshot.people {
        let minted = event.add_person(person.name.clone());
        id_table.insert(person.id, minted);
    }
    tracing::debug!(
        people = snapshot.people.len(),
        invoices = snapshot.invoices.len(),
        "Decoded event snapshot"
    );

    for invoice in snapshot.invoices {
        let draft = decode_invoice(invoice, &id_table)?;
        validate_invoice(&draft, &event)?;
        event.add_invoice(draft.into_invoice());
    }

    Ok(event)
}

fn decode_invoice(
    snapshot: InvoiceSnapshot,
    id_table: &FxHashMap<u64, PersonId>,
) -> Result<InvoiceDraft, SnapshotError> {
    let remap = |old: u64| -> Result<PersonId, SnapshotError> {
        id_table
            .get(&old)
            .copied()
            .ok_or(SnapshotError::UnknownPerson(old))
    };

    let participants = snapshot
        .participants
        .iter()
        .map(|old| remap(*old))
        .collect::<Result<Vec<_>, _>>()?;

    let division = match snapshot.division_method {
        DivisionTag::Equal => DivisionMethod::Equal,
        DivisionTag::Consumption => {
            let consumptions = snapshot
                .consumptions
                .iter()
                .map(|(old, amount)| Ok((remap(*old)?, *amount)))
                .collect::<Result<BTreeMap<_, _>, SnapshotError>>()?;
            DivisionMethod::Consumption(consumptions)
        }
    };

    let items = snapshot
        .items
        .into_iter()
        .map(|item| {
            Ok(ItemDraft {
                name: item.name,
                unit_price: item.unit_price,
                quantity: item.quantity,
                participant_ids: item
                    .participants
                    .iter()
                    .map(|old| remap(*old))
                    .collect::<Result<Vec<_>, SnapshotError>>()?,
            })
        })
        .collect::<Result<Vec<_>, SnapshotError>>()?;

    let mut draft = InvoiceDraft::new(
        snapshot.description,
        snapshot.amount,
        remap(snapshot.payer)?,
        participants,
    );
    draft.division = division;
    draft.tip_amount = snapshot.tip.unwrap_or(Money::ZERO);
    draft.birthday_person_id = snapshot.birthday_person.map(remap).transpose()?;
    draft.items = items;
    Ok(draft)
}

pub fn encode_event(event: &Event) -> EventSnapshot {
    let people = event
        .people()
        .iter()
        .map(|person| PersonSnapshot {
            id: person.id().0,
            name: person.name().into(),
        })
        .collect();

    let invoices = event
        .invoices()
        .iter()
        .map(|invoice| {
            let (division_method, consumptions) = match invoice.division() {
                DivisionMethod::Equal => (DivisionTag::Equal, BTreeMap::new()),
                DivisionMethod::Consumption(map) => (
                    DivisionTag::Consumption,
                    map.iter().map(|(person, amount)| (person.0, *amount)).collect(),
                ),
            };

            InvoiceSnapshot {
                description: invoice.description().into(),
                amount: invoice.amount(),
                payer: invoice.payer_id().0,
                participants: invoice.participant_ids().iter().map(|p| p.0).collect(),
                division_method,
                consumptions,
                tip: (!invoice.tip_amount().is_zero()).then(|| invoice.tip_amount()),
                birthday_person: invoice.birthday_person_id().map(|p| p.0),
                items: invoice
                    .items()
                    .iter()
                    .map(|item| ItemSnapshot {
                        name: item.name.clone(),
                        unit_price: item.unit_price,
                        quantity: item.quantity,
                        participants: item.participant_ids.iter().map(|p| p.0).collect(),
                    })
                    .collect(),
            }
        })
        .collect();

    EventSnapshot {
        name: event.name().into(),
        people,
        invoices,
    }
}
