use serde::Serialize;

use crate::mediator::Request;
use crate::people::model::{Person, PersonFilter, Role};

/// Every person in the directory.
#[derive(Debug, Clone, Serialize, Request)]
#[request(response = Vec<Person>)]
#[cacheable(duration = 300)]
pub struct ListPeopleQuery;

/// One person by id; `None` results are not cached.
#[derive(Debug, Clone, Serialize, Request)]
#[request(response = Option<Person>)]
#[cacheable(duration = 120)]
pub struct GetPersonQuery {
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Request)]
#[request(response = Vec<Person>)]
#[cacheable(duration = 60)]
pub struct SearchPeopleQuery {
    pub term: String,
    pub filter: PersonFilter,
    pub page: u32,
}

/// The person whose email matches the calling principal.
#[derive(Debug, Clone, Serialize, Request)]
#[request(response = Option<Person>)]
#[cacheable(duration = 300, vary_by_user)]
pub struct GetCurrentPersonQuery;

/// All roles, cached in the `roles` key group.
#[derive(Debug, Clone, Serialize, Request)]
#[request(response = Vec<Role>)]
#[cacheable(duration = 600, prefix = "roles")]
pub struct ListRolesQuery;
