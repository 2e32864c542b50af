//! Balance calculation over an event snapshot.
//!
//! For every invoice the payer is credited with the full charge (amount plus
//! tip) and each participant is debited their share. Shares come from the
//! division method, then two adjustments run in order: the birthday person's
//! base share is redistributed to the other participants, and the tip is
//! distributed to everyone but the birthday person. Every split assigns its
//! rounding remainder to the last beneficiary in participant-list order, so
//! per-invoice totals are exact to the cent.
//!
//! The function is total over well-formed input: invoices referencing people
//! missing from the snapshot are absorbed by skipping the unknown id, and a
//! consumption map that does not sum to the invoice amount has the
//! difference charged to the last participant. Rejecting such input is the
//! validation layer's job, not this one's.

use crate::model::{Balance, DivisionMethod, Invoice, Money, Person, PersonId};
use fxhash::FxHashMap;

/// Computes one [`Balance`] per person, in `people` order.
pub fn calculate_balances(people: &[Person], invoices: &[Invoice]) -> Vec<Balance> {
    let mut accounts: FxHashMap<PersonId, (Money, Money)> = people
        .iter()
        .map(|person| (person.id(), (Money::ZERO, Money::ZERO)))
        .collect();

    for invoice in invoices {
        apply_invoice(&mut accounts, invoice);
    }

    people
        .iter()
        .map(|person| {
            let (total_paid, total_owed) = accounts
                .get(&person.id())
                .copied()
                .unwrap_or((Money::ZERO, Money::ZERO));
            Balance {
                person_id: person.id(),
                total_paid,
                total_owed,
                net: total_paid - total_owed,
            }
        })
        .collect()
}

fn apply_invoice(accounts: &mut FxHashMap<PersonId, (Money, Money)>, invoice: &Invoice) {
    let participants = invoice.participant_ids();
    debug_assert!(!participants.is_empty());

    let charged = invoice.amount() + invoice.tip_amount();
    match accounts.get_mut(&invoice.payer_id()) {
        Some((paid, _)) => *paid += charged,
        None => tracing::warn!(
            invoice = %invoice.id(),
            payer = %invoice.payer_id(),
            "Unknown payer, dropping payment credit"
        ),
    }

    let mut shares = base_shares(invoice, participants);
    redistribute_birthday_share(&mut shares, invoice.birthday_person_id());
    add_tip_shares(&mut shares, invoice.tip_amount(), invoice.birthday_person_id());

    for (person, share) in shares {
        match accounts.get_mut(&person) {
            Some((_, owed)) => *owed += share,
            None => tracing::debug!(
                invoice = %invoice.id(),
                participant = %person,
                "Unknown participant, dropping owed share"
            ),
        }
    }
}

fn base_shares(invoice: &Invoice, participants: &[PersonId]) -> Vec<(PersonId, Money)> {
    match invoice.division() {
        DivisionMethod::Equal => participants
            .iter()
            .copied()
            .zip(invoice.amount().split_even(participants.len()))
            .collect(),
        DivisionMethod::Consumption(consumptions) => {
            let mut shares: Vec<(PersonId, Money)> = participants
                .iter()
                .map(|person| {
                    (
                        *person,
                        consumptions.get(person).copied().unwrap_or(Money::ZERO),
                    )
                })
                .collect();

            let declared: Money = shares.iter().map(|(_, share)| *share).sum();
            let diff = invoice.amount() - declared;
            if !diff.is_zero() {
                tracing::debug!(
                    invoice = %invoice.id(),
                    diff = %diff,
                    "Declared consumptions diverge from the invoice amount, charging the difference to the last participant"
                );
                if let Some((_, last)) = shares.last_mut() {
                    *last += diff;
                }
            }
            shares
        }
    }
}

fn redistribute_birthday_share(shares: &mut [(PersonId, Money)], birthday: Option<PersonId>) {
    let Some(birthday) = birthday else { return };
    if shares.len() < 2 {
        return;
    }
    let Some(pos) = shares.iter().position(|(person, _)| *person == birthday) else {
        return;
    };

    let base = std::mem::replace(&mut shares[pos].1, Money::ZERO);
    let mut pieces = base.split_even(shares.len() - 1).into_iter();
    for (idx, (_, share)) in shares.iter_mut().enumerate() {
        if idx == pos {
            continue;
        }
        if let Some(piece) = pieces.next() {
            *share += piece;
        }
    }
}

fn add_tip_shares(shares: &mut [(PersonId, Money)], tip: Money, birthday: Option<PersonId>) {
    if tip.is_zero() {
        return;
    }
    let receiver_count = shares
        .iter()
        .filter(|(person, _)| Some(*person) != birthday)
        .count();
    if receiver_count == 0 {
        // Sole participant is the birthday person; the tip stays with the payer.
        tracing::debug!(tip = %tip, "No tip receivers, leaving the tip unallocated");
        return;
    }

    let mut pieces = tip.split_even(receiver_count).into_iter();
    for (person, share) in shares.iter_mut() {
        if Some(*person) == birthday {
            continue;
        }
        if let Some(piece) = pieces.next() {
            *share += piece;
        }
    }
}
