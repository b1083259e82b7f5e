use anyhow::Context;
use query_cache::config::ConfigLoader;
use query_cache::logger::init_logger;
use query_cache::people::{
    self, CreatePersonCommand, GetPersonQuery, ListPeopleQuery, PeopleRepository,
};
use query_cache::{CacheManager, Mediator, RequestContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loader = ConfigLoader::new()?;
    let settings = loader.load().with_context(|| {
        format!(
            "loading configuration from {}",
            loader.config_dir().display()
        )
    })?;

    init_logger(settings.logger.clone().into_logger_config()?)?;
    tracing::info!(
        app = %settings.application.name,
        version = %settings.application.version,
        environment = %loader.environment(),
        "starting"
    );

    let cache = CacheManager::new(settings.cache.clone(), "queries").await?;
    let repo = PeopleRepository::with_sample_data().await?;
    let mediator = people::register(
        Mediator::builder()
            .cache(cache)
            .pipeline(&settings.pipeline),
        repo.clone(),
    )
    .build();

    let ctx = RequestContext::anonymous();

    let people = mediator.send(ListPeopleQuery, &ctx).await?;
    tracing::info!(count = people.len(), reads = repo.read_count(), "listed people");

    // Served from the cache: the repository is not read again.
    let people = mediator.send(ListPeopleQuery, &ctx).await?;
    tracing::info!(count = people.len(), reads = repo.read_count(), "listed people again");

    let created = mediator
        .send(
            CreatePersonCommand {
                name: "Grace Hopper".to_string(),
                email: "grace@example.com".to_string(),
                role: "member".to_string(),
            },
            &ctx,
        )
        .await?;
    tracing::info!(id = created.id, "created person");

    let people = mediator.send(ListPeopleQuery, &ctx).await?;
    tracing::info!(count = people.len(), reads = repo.read_count(), "listed people after create");

    let person = mediator.send(GetPersonQuery { id: created.id }, &ctx).await?;
    tracing::info!(found = person.is_some(), "fetched person");

    Ok(())
}
