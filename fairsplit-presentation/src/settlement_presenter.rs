use std::borrow::Cow;

use fairsplit_application::{PersonDirectory, SettlementSummary};
use fairsplit_domain::{Balance, PersonId, SettlementTransfer};

use crate::text_table::{Alignment, TextTableBuilder};

pub struct SettlementPresenter;

pub struct SettlementView {
    pub balance_table: String,
    /// None when there is nothing to settle.
    pub transfer_table: Option<String>,
}

impl SettlementPresenter {
    pub fn render(summary: &SettlementSummary, directory: &dyn PersonDirectory) -> SettlementView {
        let balance_table = Self::build_balance_table(&summary.balances, directory);
        let transfer_table = if summary.transfers.is_empty() {
            None
        } else {
            Some(Self::build_transfer_table(&summary.transfers, directory))
        };

        SettlementView {
            balance_table,
            transfer_table,
        }
    }

    pub fn build_balance_table(balances: &[Balance], directory: &dyn PersonDirectory) -> String {
        let headers = [
            Cow::Borrowed("Person"),
            Cow::Borrowed("Paid"),
            Cow::Borrowed("Owed"),
            Cow::Borrowed("Net"),
        ];
        let mut builder = TextTableBuilder::new()
            .alignments(&[
                Alignment::Left,
                Alignment::Right,
                Alignment::Right,
                Alignment::Right,
            ])
            .headers(&headers);

        for balance in balances {
            let sign = if balance.net.is_negative() { "" } else { "+" };
            builder = builder.row([
                format_person_label(balance.person_id, directory),
                Cow::Owned(balance.total_paid.to_string()),
                Cow::Owned(balance.total_owed.to_string()),
                Cow::Owned(format!("{sign}{}", balance.net)),
            ]);
        }

        builder.build()
    }

    pub fn build_transfer_table(
        transfers: &[SettlementTransfer],
        directory: &dyn PersonDirectory,
    ) -> String {
        let headers = [
            Cow::Borrowed("From"),
            Cow::Borrowed("To"),
            Cow::Borrowed("Amount"),
        ];
        let mut builder = TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Left, Alignment::Right])
            .headers(&headers);

        for transfer in transfers {
            builder = builder.row([
                format_person_label(transfer.from, directory),
                format_person_label(transfer.to, directory),
                Cow::Owned(transfer.amount.to_string()),
            ]);
        }

        builder.build()
    }
}

fn format_person_label<'a>(
    person_id: PersonId,
    directory: &'a dyn PersonDirectory,
) -> Cow<'a, str> {
    match directory.display_name(person_id) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("person #{person_id}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairsplit_domain::Money;
    use std::collections::HashMap;

    fn cents(value: i64) -> Money {
        Money::from_cents(value)
    }

    fn sample_summary() -> SettlementSummary {
        SettlementSummary {
            balances: vec![
                Balance {
                    person_id: PersonId(1),
                    total_paid: cents(6000),
                    total_owed: cents(2000),
                    net: cents(4000),
                },
                Balance {
                    person_id: PersonId(2),
                    total_paid: Money::ZERO,
                    total_owed: cents(2000),
                    net: cents(-2000),
                },
            ],
            transfers: vec![SettlementTransfer {
                from: PersonId(2),
                to: PersonId(1),
                amount: cents(2000),
            }],
        }
    }

    #[test]
    fn render_uses_display_names_when_available() {
        let mut directory = HashMap::new();
        directory.insert(PersonId(1), "Alice".to_string());
        directory.insert(PersonId(2), "Bob".to_string());

        let view = SettlementPresenter::render(&sample_summary(), &directory);

        assert!(view.balance_table.contains("Alice"));
        assert!(view.balance_table.contains("+40.00"));
        assert!(view.balance_table.contains("-20.00"));
        let transfers = view.transfer_table.expect("transfer table");
        assert!(transfers.contains("Bob"));
        assert!(transfers.contains("20.00"));
    }

    #[test]
    fn render_falls_back_to_numbered_labels() {
        let directory: HashMap<PersonId, String> = HashMap::new();

        let view = SettlementPresenter::render(&sample_summary(), &directory);

        assert!(view.balance_table.contains("person #1"));
        assert!(view.balance_table.contains("person #2"));
    }

    #[test]
    fn settled_summaries_have_no_transfer_table() {
        let directory: HashMap<PersonId, String> = HashMap::new();
        let summary = SettlementSummary {
            balances: vec![Balance {
                person_id: PersonId(1),
                total_paid: cents(1000),
                total_owed: cents(1000),
                net: Money::ZERO,
            }],
            transfers: Vec::new(),
        };

        let view = SettlementPresenter::render(&summary, &directory);
        assert!(view.transfer_table.is_none());
        assert!(view.balance_table.contains("+0.00"));
    }
}
