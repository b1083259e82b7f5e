use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A person in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A named role people can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub description: String,
}

/// Data for a new person; id and timestamps are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewPerson {
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PersonChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

/// Search criteria nested inside [`SearchPeopleQuery`](crate::people::SearchPeopleQuery).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFilter {
    /// Match any of these roles; empty matches every role.
    pub roles: Vec<String>,
    pub active: Option<bool>,
}

impl PersonFilter {
    pub fn matches(&self, person: &Person) -> bool {
        (self.roles.is_empty() || self.roles.iter().any(|r| *r == person.role))
            && self.active.is_none_or(|active| active == person.active)
    }
}
