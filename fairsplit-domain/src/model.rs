use std::{
    collections::BTreeMap,
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;
use thiserror::Error;

use crate::services::calculate_balances;

macro_rules! id_newtype {
    ($($name:ident),+ $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(pub u64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

id_newtype!(PersonId, InvoiceId, ItemId, EventId);

/// A monetary amount in integer cents.
///
/// All arithmetic on cent values is exact; the only place a fraction of a
/// cent can appear is division, which [`Money::div_round_half_up`] resolves
/// by rounding halves toward positive infinity. Parsing and display use the
/// canonical two-fraction-digit decimal form ("12.34").
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseMoneyError {
    #[error("Invalid money amount '{0}'")]
    Invalid(String),
    #[error("Money amount '{0}' has sub-cent precision")]
    SubCent(String),
    #[error("Money amount '{0}' is out of range")]
    OutOfRange(String),
}

impl Money {
    pub const ZERO: Self = Self(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn signum(self) -> i64 {
        self.0.signum()
    }

    /// Divides by `divisor`, rounding halves toward positive infinity.
    pub fn div_round_half_up(self, divisor: i64) -> Self {
        debug_assert!(divisor > 0);
        Self((2 * self.0 + divisor).div_euclid(2 * divisor))
    }

    /// Splits the amount into `n` shares: `n - 1` rounded shares followed by
    /// a final share that absorbs the entire rounding remainder, so the
    /// shares always sum back to the amount exactly.
    pub fn split_even(self, n: usize) -> Vec<Self> {
        if n == 0 {
            return Vec::new();
        }
        let share = self.div_round_half_up(n as i64);
        let mut shares = vec![share; n];
        shares[n - 1] = self - share * (n as i64 - 1);
        shares
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal: Decimal = s
            .trim()
            .parse()
            .map_err(|_| ParseMoneyError::Invalid(s.to_owned()))?;
        let cents = decimal
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| ParseMoneyError::OutOfRange(s.to_owned()))?;
        if cents.fract() != Decimal::ZERO {
            return Err(ParseMoneyError::SubCent(s.to_owned()));
        }
        cents
            .to_i64()
            .map(Self)
            .ok_or_else(|| ParseMoneyError::OutOfRange(s.to_owned()))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Person {
    id: PersonId,
    name: SmolStr,
}

impl Person {
    pub fn new(id: PersonId, name: impl Into<SmolStr>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How an invoice amount is divided among its participants.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DivisionMethod {
    #[default]
    Equal,
    /// Declared per-person consumption amounts. Participants absent from the
    /// map consume 0; the difference between the declared total and the
    /// invoice amount is charged to the last participant in list order.
    Consumption(BTreeMap<PersonId, Money>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceItem {
    pub id: ItemId,
    pub name: SmolStr,
    pub unit_price: Money,
    pub quantity: u32,
    pub participant_ids: Vec<PersonId>,
}

/// One recorded expense: a payer, a participant list, an amount, and the
/// division method deciding how the amount is shared.
///
/// The participant list is normalized at construction: the payer is always
/// included, and duplicates collapse into their first occurrence, so the
/// list is never empty and the payer leads it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    description: SmolStr,
    amount: Money,
    payer_id: PersonId,
    participant_ids: Vec<PersonId>,
    division: DivisionMethod,
    items: Vec<InvoiceItem>,
    tip_amount: Money,
    birthday_person_id: Option<PersonId>,
}

impl Invoice {
    pub fn new(
        description: impl Into<SmolStr>,
        amount: Money,
        payer_id: PersonId,
        participants: impl IntoIterator<Item = PersonId>,
    ) -> Self {
        let mut participant_ids = Vec::new();
        for person in std::iter::once(payer_id).chain(participants) {
            if !participant_ids.contains(&person) {
                participant_ids.push(person);
            }
        }

        Self {
            id: InvoiceId::default(),
            description: description.into(),
            amount,
            payer_id,
            participant_ids,
            division: DivisionMethod::Equal,
            items: Vec::new(),
            tip_amount: Money::ZERO,
            birthday_person_id: None,
        }
    }

    pub fn with_division(mut self, division: DivisionMethod) -> Self {
        self.division = division;
        self
    }

    pub fn with_tip(mut self, tip_amount: Money) -> Self {
        self.tip_amount = tip_amount;
        self
    }

    pub fn with_birthday_person(mut self, person_id: PersonId) -> Self {
        self.birthday_person_id = Some(person_id);
        self
    }

    pub fn with_items(mut self, items: Vec<InvoiceItem>) -> Self {
        self.items = items;
        self
    }

    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn payer_id(&self) -> PersonId {
        self.payer_id
    }

    pub fn participant_ids(&self) -> &[PersonId] {
        &self.participant_ids
    }

    pub fn division(&self) -> &DivisionMethod {
        &self.division
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn tip_amount(&self) -> Money {
        self.tip_amount
    }

    pub fn birthday_person_id(&self) -> Option<PersonId> {
        self.birthday_person_id
    }

    /// Derives a consumption map from the line items by splitting each
    /// item's total evenly among the item's participants (remainder on the
    /// item's last participant). Items without participants contribute
    /// nothing. The allocator never reads items; this helper exists so a
    /// caller can express consumption shares item by item.
    pub fn consumptions_from_items(&self) -> BTreeMap<PersonId, Money> {
        let mut consumptions = BTreeMap::new();
        for item in &self.items {
            if item.participant_ids.is_empty() {
                continue;
            }
            let total = item.unit_price * i64::from(item.quantity);
            let shares = total.split_even(item.participant_ids.len());
            for (person, share) in item.participant_ids.iter().zip(shares) {
                *consumptions.entry(*person).or_insert(Money::ZERO) += share;
            }
        }
        consumptions
    }
}

/// Per-person net position, recomputed on demand and never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Balance {
    pub person_id: PersonId,
    pub total_paid: Money,
    pub total_owed: Money,
    pub net: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementTransfer {
    pub from: PersonId,
    pub to: PersonId,
    pub amount: Money,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("Person #{0} is not part of this event")]
    PersonNotFound(PersonId),
    #[error("Invoice #{0} is not part of this event")]
    InvoiceNotFound(InvoiceId),
}

/// The aggregate owning the people and invoices of one expense-splitting
/// session. Ids are minted sequentially from 1 within the event.
#[derive(Clone, Debug)]
pub struct Event {
    id: EventId,
    name: SmolStr,
    people: Vec<Person>,
    invoices: Vec<Invoice>,
    next_person_id: u64,
    next_invoice_id: u64,
}

impl Event {
    pub fn new(id: EventId, name: impl Into<SmolStr>) -> Self {
        Self {
            id,
            name: name.into(),
            people: Vec::new(),
            invoices: Vec::new(),
            next_person_id: 1,
            next_invoice_id: 1,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.invoices.iter().find(|invoice| invoice.id == id)
    }

    pub fn add_person(&mut self, name: impl Into<SmolStr>) -> PersonId {
        let id = PersonId(self.next_person_id);
        self.next_person_id += 1;
        self.people.push(Person::new(id, name));
        id
    }

    /// Removes a person and cascades: invoices they paid are dropped
    /// entirely; elsewhere they are stripped from participant lists, item
    /// participant lists, and consumption maps.
    pub fn remove_person(&mut self, id: PersonId) -> Result<(), EventError> {
        let Some(pos) = self.people.iter().position(|person| person.id == id) else {
            return Err(EventError::PersonNotFound(id));
        };
        self.people.remove(pos);

        self.invoices.retain(|invoice| invoice.payer_id != id);
        for invoice in &mut self.invoices {
            invoice.participant_ids.retain(|person| *person != id);
            if let DivisionMethod::Consumption(map) = &mut invoice.division {
                map.remove(&id);
            }
            for item in &mut invoice.items {
                item.participant_ids.retain(|person| *person != id);
            }
        }
        Ok(())
    }

    pub fn add_invoice(&mut self, mut invoice: Invoice) -> InvoiceId {
        let id = InvoiceId(self.next_invoice_id);
        self.next_invoice_id += 1;
        invoice.id = id;
        self.invoices.push(invoice);
        id
    }

    pub fn update_invoice(&mut self, id: InvoiceId, mut invoice: Invoice) -> Result<(), EventError> {
        let Some(slot) = self.invoices.iter_mut().find(|existing| existing.id == id) else {
            return Err(EventError::InvoiceNotFound(id));
        };
        invoice.id = id;
        *slot = invoice;
        Ok(())
    }

    pub fn remove_invoice(&mut self, id: InvoiceId) -> Result<(), EventError> {
        let Some(pos) = self.invoices.iter().position(|invoice| invoice.id == id) else {
            return Err(EventError::InvoiceNotFound(id));
        };
        self.invoices.remove(pos);
        Ok(())
    }

    pub fn balances(&self) -> Vec<Balance> {
        calculate_balances(&self.people, &self.invoices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cents(value: i64) -> Money {
        Money::from_cents(value)
    }

    #[rstest]
    #[case::exact(cents(9000), 3, cents(3000))]
    #[case::round_down(cents(10000), 3, cents(3333))]
    #[case::half_up(cents(5), 2, cents(3))]
    #[case::negative_half_up(cents(-5), 2, cents(-2))]
    #[case::negative(cents(-10000), 3, cents(-3333))]
    fn division_rounds_half_toward_positive_infinity(
        #[case] amount: Money,
        #[case] divisor: i64,
        #[case] expected: Money,
    ) {
        assert_eq!(amount.div_round_half_up(divisor), expected);
    }

    #[rstest]
    #[case::exact(cents(6000), 3, vec![2000, 2000, 2000])]
    #[case::remainder_on_last(cents(10000), 3, vec![3333, 3333, 3334])]
    #[case::remainder_can_shrink_last(cents(10), 4, vec![3, 3, 3, 1])]
    #[case::single_share(cents(4217), 1, vec![4217])]
    #[case::zero_amount(cents(0), 2, vec![0, 0])]
    fn split_even_assigns_remainder_to_last_share(
        #[case] amount: Money,
        #[case] n: usize,
        #[case] expected: Vec<i64>,
    ) {
        let shares = amount.split_even(n);
        assert_eq!(shares, expected.into_iter().map(cents).collect::<Vec<_>>());
        assert_eq!(shares.into_iter().sum::<Money>(), amount);
    }

    #[rstest]
    #[case::plain("12.34", Ok(1234))]
    #[case::whole("12", Ok(1200))]
    #[case::one_fraction_digit("0.5", Ok(50))]
    #[case::negative("-3.07", Ok(-307))]
    #[case::zero("0", Ok(0))]
    #[case::sub_cent("1.005", Err(ParseMoneyError::SubCent("1.005".into())))]
    #[case::garbage("12,34", Err(ParseMoneyError::Invalid("12,34".into())))]
    fn money_parses_two_digit_decimals(
        #[case] input: &str,
        #[case] expected: Result<i64, ParseMoneyError>,
    ) {
        assert_eq!(input.parse::<Money>(), expected.map(cents));
    }

    #[rstest]
    #[case(1234, "12.34")]
    #[case(-307, "-3.07")]
    #[case(5, "0.05")]
    #[case(0, "0.00")]
    fn money_displays_canonical_form(#[case] value: i64, #[case] expected: &str) {
        assert_eq!(cents(value).to_string(), expected);
    }

    #[test]
    fn invoice_normalization_puts_payer_first_and_deduplicates() {
        let invoice = Invoice::new(
            "dinner",
            cents(6000),
            PersonId(2),
            vec![PersonId(1), PersonId(2), PersonId(3), PersonId(1)],
        );

        assert_eq!(
            invoice.participant_ids(),
            &[PersonId(2), PersonId(1), PersonId(3)]
        );
    }

    #[test]
    fn invoice_includes_omitted_payer() {
        let invoice = Invoice::new("taxi", cents(1500), PersonId(4), vec![PersonId(1)]);
        assert_eq!(invoice.participant_ids(), &[PersonId(4), PersonId(1)]);
    }

    #[test]
    fn items_derive_consumptions_with_remainder_on_last_item_participant() {
        let invoice = Invoice::new("groceries", cents(3500), PersonId(1), vec![PersonId(2)])
            .with_items(vec![
                InvoiceItem {
                    id: ItemId(1),
                    name: "wine".into(),
                    unit_price: cents(1250),
                    quantity: 2,
                    participant_ids: vec![PersonId(1), PersonId(2)],
                },
                InvoiceItem {
                    id: ItemId(2),
                    name: "cake".into(),
                    unit_price: cents(1000),
                    quantity: 1,
                    participant_ids: vec![PersonId(2)],
                },
                InvoiceItem {
                    id: ItemId(3),
                    name: "unclaimed".into(),
                    unit_price: cents(500),
                    quantity: 1,
                    participant_ids: vec![],
                },
            ]);

        let consumptions = invoice.consumptions_from_items();
        assert_eq!(consumptions.get(&PersonId(1)), Some(&cents(1250)));
        assert_eq!(consumptions.get(&PersonId(2)), Some(&cents(2250)));
    }

    #[test]
    fn event_mints_sequential_ids() {
        let mut event = Event::new(EventId(1), "trip");
        assert_eq!(event.add_person("alice"), PersonId(1));
        assert_eq!(event.add_person("bob"), PersonId(2));

        let first = event.add_invoice(Invoice::new(
            "fuel",
            cents(4000),
            PersonId(1),
            vec![PersonId(2)],
        ));
        assert_eq!(first, InvoiceId(1));
        assert_eq!(event.invoice(first).map(Invoice::id), Some(InvoiceId(1)));
    }

    #[test]
    fn removing_a_payer_drops_their_invoices() {
        let mut event = Event::new(EventId(1), "trip");
        let alice = event.add_person("alice");
        let bob = event.add_person("bob");
        event.add_invoice(Invoice::new("fuel", cents(4000), alice, vec![bob]));
        event.add_invoice(Invoice::new("food", cents(2000), bob, vec![alice]));

        event.remove_person(bob).expect("bob exists");

        assert_eq!(event.invoices().len(), 1);
        assert_eq!(event.invoices()[0].description(), "fuel");
        assert_eq!(event.invoices()[0].participant_ids(), &[alice]);
    }

    #[test]
    fn removing_a_participant_strips_them_everywhere() {
        let mut event = Event::new(EventId(1), "trip");
        let alice = event.add_person("alice");
        let bob = event.add_person("bob");
        let carol = event.add_person("carol");

        let consumptions = BTreeMap::from([(bob, cents(1000)), (carol, cents(2000))]);
        event.add_invoice(
            Invoice::new("dinner", cents(3000), alice, vec![bob, carol])
                .with_division(DivisionMethod::Consumption(consumptions))
                .with_items(vec![InvoiceItem {
                    id: ItemId(1),
                    name: "starter".into(),
                    unit_price: cents(1000),
                    quantity: 1,
                    participant_ids: vec![bob, carol],
                }]),
        );

        event.remove_person(bob).expect("bob exists");

        let invoice = &event.invoices()[0];
        assert_eq!(invoice.participant_ids(), &[alice, carol]);
        assert_eq!(invoice.items()[0].participant_ids, vec![carol]);
        match invoice.division() {
            DivisionMethod::Consumption(map) => {
                assert!(!map.contains_key(&bob));
                assert_eq!(map.get(&carol), Some(&cents(2000)));
            }
            DivisionMethod::Equal => panic!("division method should survive the cascade"),
        }
    }

    #[test]
    fn removing_an_unknown_person_is_an_error() {
        let mut event = Event::new(EventId(1), "trip");
        assert_eq!(
            event.remove_person(PersonId(9)),
            Err(EventError::PersonNotFound(PersonId(9)))
        );
    }

    #[test]
    fn updating_an_invoice_keeps_its_id() {
        let mut event = Event::new(EventId(1), "trip");
        let alice = event.add_person("alice");
        let id = event.add_invoice(Invoice::new("fuel", cents(4000), alice, vec![]));

        event
            .update_invoice(id, Invoice::new("fuel + tolls", cents(5500), alice, vec![]))
            .expect("invoice exists");

        let invoice = event.invoice(id).expect("invoice exists");
        assert_eq!(invoice.id(), id);
        assert_eq!(invoice.amount(), cents(5500));

        assert_eq!(
            event.update_invoice(
                InvoiceId(9),
                Invoice::new("ghost", cents(100), alice, vec![])
            ),
            Err(EventError::InvoiceNotFound(InvoiceId(9)))
        );
    }
}
