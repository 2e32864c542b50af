//! Greedy settlement planning: largest creditor is paired with largest
//! debtor until one side runs out. A heuristic, not guaranteed to minimize
//! the transfer count, but always correct in the total amount settled.

use crate::model::{Balance, Money, PersonId, SettlementTransfer};

/// Suggests transfers that settle the given balances.
///
/// Creditors and debtors are each sorted descending by magnitude (ties keep
/// input order), then matched with two cursors: every step emits one
/// transfer of `min(debtor remaining, creditor remaining)` and advances
/// whichever side reaches zero. Output order is emission order. Imbalanced
/// input leaves the residual unsettled rather than forcing it to zero.
pub fn suggest_transfers(balances: &[Balance]) -> Vec<SettlementTransfer> {
    let mut creditors: Vec<(PersonId, Money)> = balances
        .iter()
        .filter(|balance| balance.net.is_positive())
        .map(|balance| (balance.person_id, balance.net))
        .collect();
    let mut debtors: Vec<(PersonId, Money)> = balances
        .iter()
        .filter(|balance| balance.net.is_negative())
        .map(|balance| (balance.person_id, -balance.net))
        .collect();

    creditors.sort_by(|a, b| b.1.cmp(&a.1));
    debtors.sort_by(|a, b| b.1.cmp(&a.1));

    let mut transfers = Vec::new();
    let mut creditor_idx = 0;
    let mut debtor_idx = 0;

    while debtor_idx < debtors.len() && creditor_idx < creditors.len() {
        let debtor = &mut debtors[debtor_idx];
        let creditor = &mut creditors[creditor_idx];
        let amount = debtor.1.min(creditor.1);

        transfers.push(SettlementTransfer {
            from: debtor.0,
            to: creditor.0,
            amount,
        });
        debtor.1 -= amount;
        creditor.1 -= amount;

        if debtors[debtor_idx].1.is_zero() {
            debtor_idx += 1;
        }
        if creditors[creditor_idx].1.is_zero() {
            creditor_idx += 1;
        }
    }

    tracing::debug!(
        transfer_count = transfers.len(),
        settled = %transfers.iter().map(|t| t.amount).sum::<Money>(),
        "Planned settlement transfers"
    );
    transfers
}
