use std::sync::Arc;

use anyhow::Context;
use blog_server::data::Repositories;
use blog_server::data::group_repository::GroupRepository;
use blog_server::data::memory::InMemoryStore;
use blog_server::domain::error::DomainError;
use blog_server::domain::group::Group;
use blog_server::infrastructure::config::AppConfig;
use blog_server::infrastructure::database::{create_pool, run_migrations};
use blog_server::infrastructure::logging::init_logging;
use blog_server::infrastructure::page_cache::InMemoryPageCache;
use blog_server::infrastructure::security::JwtKeys;
use blog_server::server::{AppServices, start_rest_server};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[clap(name = "blog-server", version, about = "Community blog server")]
struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (the default).
    Serve {
        /// Keep everything in process memory instead of PostgreSQL.
        #[clap(long)]
        in_memory: bool,
        /// Group to create at startup, as `slug=Title`. Repeatable. The only
        /// way to get groups into an in-memory store.
        #[clap(long = "group", value_name = "SLUG=TITLE", value_parser = parse_group_seed)]
        groups: Vec<GroupSeed>,
    },
    /// Create a group in PostgreSQL. For `serve --in-memory`, use `--group`.
    CreateGroup {
        #[clap(long)]
        title: String,
        #[clap(long)]
        slug: String,
        #[clap(long, default_value = "")]
        description: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupSeed {
    slug: String,
    title: String,
}

fn parse_group_seed(raw: &str) -> Result<GroupSeed, String> {
    let (slug, title) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SLUG=TITLE, got `{raw}`"))?;
    let (slug, title) = (slug.trim(), title.trim());
    if slug.is_empty() || title.is_empty() {
        return Err(format!("expected SLUG=TITLE, got `{raw}`"));
    }
    Ok(GroupSeed {
        slug: slug.to_string(),
        title: title.to_string(),
    })
}

/// Creates the seeded groups, skipping slugs that already exist.
async fn seed_groups(repos: &Repositories, seeds: Vec<GroupSeed>) -> anyhow::Result<()> {
    for seed in seeds {
        let group = Group::new(seed.title, seed.slug, String::new())?;
        match repos.groups.create(group).await {
            Ok(group) => info!(group_id = %group.id, slug = %group.slug, "group seeded"),
            Err(DomainError::GroupAlreadyExists(slug)) => {
                info!(slug = %slug, "group already present, not seeding")
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

async fn postgres_repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
    let pool = create_pool(config.require_database_url()?, config.db_max_connections)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    Ok(Repositories::postgres(pool))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;
    init_logging(config.log_format);

    let command = cli.command.unwrap_or(Command::Serve {
        in_memory: false,
        groups: Vec::new(),
    });
    match command {
        Command::Serve { in_memory, groups } => {
            let repos = if in_memory {
                warn!("running on the in-memory store, data is lost on exit");
                Repositories::in_memory(Arc::new(InMemoryStore::new()))
            } else {
                postgres_repositories(&config).await?
            };
            seed_groups(&repos, groups).await?;

            let services = AppServices::new(
                &repos,
                JwtKeys::new(config.jwt_secret.clone()),
                Arc::new(InMemoryPageCache::new()),
                config.page_cache_ttl,
            );
            start_rest_server(&config, services).await
        }
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            let repos = postgres_repositories(&config).await?;
            let group = repos
                .groups
                .create(Group::new(title, slug, description)?)
                .await?;
            info!(group_id = %group.id, slug = %group.slug, "group created");
            Ok(())
        }
    }
}
