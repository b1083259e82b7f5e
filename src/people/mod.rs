//! A small people and roles directory served through the mediator.
//!
//! Queries are cacheable and commands declare which cached results they make
//! stale, so the whole caching pipeline can be exercised end to end.

mod commands;
mod handlers;
mod model;
mod queries;
mod repository;

pub use commands::{
    CreatePersonCommand, CreateRoleCommand, DeletePersonCommand, ResetDirectoryCommand,
    UpdatePersonCommand,
};
pub use handlers::PeopleHandler;
pub use model::{NewPerson, Person, PersonChanges, PersonFilter, Role};
pub use queries::{
    GetCurrentPersonQuery, GetPersonQuery, ListPeopleQuery, ListRolesQuery, SearchPeopleQuery,
};
pub use repository::{PAGE_SIZE, PeopleRepository};

use crate::mediator::MediatorBuilder;

/// Register every people request on `builder`.
pub fn register(builder: MediatorBuilder, repo: PeopleRepository) -> MediatorBuilder {
    let handler = PeopleHandler::new(repo);
    builder
        .register::<ListPeopleQuery, _>(handler.clone())
        .register::<GetPersonQuery, _>(handler.clone())
        .register::<SearchPeopleQuery, _>(handler.clone())
        .register::<GetCurrentPersonQuery, _>(handler.clone())
        .register::<ListRolesQuery, _>(handler.clone())
        .register::<CreatePersonCommand, _>(handler.clone())
        .register::<UpdatePersonCommand, _>(handler.clone())
        .register::<DeletePersonCommand, _>(handler.clone())
        .register::<CreateRoleCommand, _>(handler.clone())
        .register::<ResetDirectoryCommand, _>(handler)
}
