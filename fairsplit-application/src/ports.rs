use std::collections::HashMap;

use fairsplit_domain::{Event, Person, PersonId};

/// Resolves a person id to a display name for presentation.
pub trait PersonDirectory: Send + Sync {
    fn display_name(&self, person_id: PersonId) -> Option<&str>;
}

impl PersonDirectory for HashMap<PersonId, String> {
    fn display_name(&self, person_id: PersonId) -> Option<&str> {
        self.get(&person_id).map(String::as_str)
    }
}

impl PersonDirectory for Event {
    fn display_name(&self, person_id: PersonId) -> Option<&str> {
        self.person(person_id).map(Person::name)
    }
}
