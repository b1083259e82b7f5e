//! Handlers for the people queries and commands.
//!
//! Each handler is a thin adapter over [`PeopleRepository`]; commands are
//! validated before they reach the store.

use async_trait::async_trait;
use validator::Validate;

use crate::error::AppResult;
use crate::mediator::{RequestContext, RequestHandler};
use crate::people::commands::{
    CreatePersonCommand, CreateRoleCommand, DeletePersonCommand, ResetDirectoryCommand,
    UpdatePersonCommand,
};
use crate::people::model::{NewPerson, Person, PersonChanges, Role};
use crate::people::queries::{
    GetCurrentPersonQuery, GetPersonQuery, ListPeopleQuery, ListRolesQuery, SearchPeopleQuery,
};
use crate::people::repository::PeopleRepository;

/// Handles every people request over one shared repository.
#[derive(Debug, Clone)]
pub struct PeopleHandler {
    repo: PeopleRepository,
}

impl PeopleHandler {
    pub fn new(repo: PeopleRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RequestHandler<ListPeopleQuery> for PeopleHandler {
    async fn handle(&self, _: &ListPeopleQuery, _: &RequestContext) -> AppResult<Vec<Person>> {
        Ok(self.repo.list_people().await)
    }
}

#[async_trait]
impl RequestHandler<GetPersonQuery> for PeopleHandler {
    async fn handle(&self, query: &GetPersonQuery, _: &RequestContext) -> AppResult<Option<Person>> {
        Ok(self.repo.find_person(query.id).await)
    }
}

#[async_trait]
impl RequestHandler<SearchPeopleQuery> for PeopleHandler {
    async fn handle(&self, query: &SearchPeopleQuery, _: &RequestContext) -> AppResult<Vec<Person>> {
        Ok(self.repo.search(&query.term, &query.filter, query.page).await)
    }
}

#[async_trait]
impl RequestHandler<GetCurrentPersonQuery> for PeopleHandler {
    async fn handle(
        &self,
        _: &GetCurrentPersonQuery,
        context: &RequestContext,
    ) -> AppResult<Option<Person>> {
        match context.principal() {
            Some(email) => Ok(self.repo.find_by_email(email).await),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RequestHandler<ListRolesQuery> for PeopleHandler {
    async fn handle(&self, _: &ListRolesQuery, _: &RequestContext) -> AppResult<Vec<Role>> {
        Ok(self.repo.list_roles().await)
    }
}

#[async_trait]
impl RequestHandler<CreatePersonCommand> for PeopleHandler {
    async fn handle(&self, command: &CreatePersonCommand, _: &RequestContext) -> AppResult<Person> {
        command.validate()?;
        self.repo
            .create_person(NewPerson {
                name: command.name.clone(),
                email: command.email.clone(),
                role: command.role.clone(),
            })
            .await
    }
}

#[async_trait]
impl RequestHandler<UpdatePersonCommand> for PeopleHandler {
    async fn handle(&self, command: &UpdatePersonCommand, _: &RequestContext) -> AppResult<Person> {
        command.validate()?;
        let changes = PersonChanges {
            name: command.name.clone(),
            email: command.email.clone(),
            role: command.role.clone(),
            active: command.active,
        };
        self.repo.update_person(command.id, changes).await
    }
}

#[async_trait]
impl RequestHandler<DeletePersonCommand> for PeopleHandler {
    async fn handle(&self, command: &DeletePersonCommand, _: &RequestContext) -> AppResult<bool> {
        Ok(self.repo.delete_person(command.id).await)
    }
}

#[async_trait]
impl RequestHandler<CreateRoleCommand> for PeopleHandler {
    async fn handle(&self, command: &CreateRoleCommand, _: &RequestContext) -> AppResult<Role> {
        command.validate()?;
        self.repo
            .create_role(Role {
                name: command.name.clone(),
                description: command.description.clone(),
            })
            .await
    }
}

#[async_trait]
impl RequestHandler<ResetDirectoryCommand> for PeopleHandler {
    async fn handle(&self, _: &ResetDirectoryCommand, _: &RequestContext) -> AppResult<()> {
        self.repo.reset().await;
        Ok(())
    }
}
