use serde::Serialize;
use validator::Validate;

use crate::mediator::Request;
use crate::people::model::{Person, Role};
use crate::people::queries::{
    GetCurrentPersonQuery, GetPersonQuery, ListPeopleQuery, SearchPeopleQuery,
};

#[derive(Debug, Clone, Serialize, Validate, Request)]
#[request(response = Person)]
#[invalidates(queries(ListPeopleQuery, SearchPeopleQuery))]
pub struct CreatePersonCommand {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Validate, Request)]
#[request(response = Person)]
#[invalidates(queries(
    ListPeopleQuery,
    GetPersonQuery,
    SearchPeopleQuery,
    GetCurrentPersonQuery
))]
pub struct UpdatePersonCommand {
    pub id: u64,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

/// Responds `false` if the person did not exist.
#[derive(Debug, Clone, Serialize, Request)]
#[request(response = bool)]
#[invalidates(queries(
    ListPeopleQuery,
    GetPersonQuery,
    SearchPeopleQuery,
    GetCurrentPersonQuery
))]
pub struct DeletePersonCommand {
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Validate, Request)]
#[request(response = Role)]
#[invalidates(pattern = "roles:*")]
pub struct CreateRoleCommand {
    #[validate(length(min = 1, max = 32, message = "Role name must be between 1 and 32 characters"))]
    pub name: String,
    pub description: String,
}

/// Empties the directory and the whole cache.
#[derive(Debug, Clone, Serialize, Request)]
#[request(response = ())]
#[invalidates(all)]
pub struct ResetDirectoryCommand;
