//! Subcommand implementations.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde_json::json;
use tracing::debug;

use clearway::roles::{rules, LabelKey};
use clearway::{
    load_config, synchronize_labels, ClearsPipeline, ClearwayConfig, Identity, InMemoryStore,
    Lodestone, MemberRef, RankingProvider, RankingRequest, StaticRankings,
};

use crate::CharacterArgs;

/// Member id used for the in-memory store.
const CLI_USER: &str = "cli";

/// Flags shared by every subcommand.
pub struct Context {
    pub config_path: Option<String>,
    pub json: bool,
}

impl Context {
    fn config(&self) -> Result<ClearwayConfig> {
        debug!(path = ?self.config_path, "loading config");
        load_config(self.config_path.as_deref()).context("failed to load config")
    }

    fn print(&self, value: serde_json::Value, text: impl FnOnce() -> String) {
        if self.json {
            println!("{value}");
        } else {
            println!("{}", text());
        }
    }
}

fn identity(args: &CharacterArgs) -> Result<Identity> {
    let mut identity = Identity::new(&args.world, &args.first_name, &args.last_name)?;
    identity.lodestone_id = args.lodestone_id;
    Ok(identity)
}

async fn resolved(lodestone: &Lodestone, args: &CharacterArgs) -> Result<Identity> {
    let mut identity = identity(args)?;
    lodestone.resolve_identity(&mut identity).await?;
    Ok(identity)
}

async fn seeded_store(config: &ClearwayConfig, held: &[String]) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store
        .seed(&config.guild_id, CLI_USER, held.iter().cloned())
        .await;
    store
}

pub async fn resolve(ctx: &Context, args: &CharacterArgs) -> Result<()> {
    let config = ctx.config()?;
    let identity = resolved(&Lodestone::new(&config), args).await?;
    ctx.print(json!(identity), || {
        format!(
            "{identity}: Lodestone ID {}",
            identity.lodestone_id.unwrap_or_default()
        )
    });
    Ok(())
}

pub async fn verify(ctx: &Context, args: &CharacterArgs, token: &str) -> Result<()> {
    let config = ctx.config()?;
    let lodestone = Lodestone::new(&config);
    let identity = resolved(&lodestone, args).await?;
    let owned = lodestone.verify_ownership(&identity, token).await?;
    ctx.print(json!({ "character": identity, "owned": owned }), || {
        if owned {
            format!("Ownership of `{identity}` verified.")
        } else {
            format!("Token `{token}` not found in the self introduction of `{identity}`.")
        }
    });
    Ok(())
}

pub async fn achievements(ctx: &Context, args: &CharacterArgs) -> Result<()> {
    let config = ctx.config()?;
    let lodestone = Lodestone::new(&config);
    let identity = resolved(&lodestone, args).await?;
    let crawl = lodestone.crawl_achievements(&identity).await?;
    let names: Vec<&str> = crawl.achievements.iter().map(|a| a.name.as_str()).collect();
    ctx.print(
        json!({ "character": identity, "achievements": names, "pages": crawl.visited }),
        || names.join("\n"),
    );
    Ok(())
}

pub async fn sync(
    ctx: &Context,
    args: &CharacterArgs,
    rankings_path: &str,
    held: &[String],
) -> Result<()> {
    let config = ctx.config()?;
    let mut identity = identity(args)?;
    let provider = StaticRankings::load(Path::new(rankings_path))
        .with_context(|| format!("failed to read rankings from {rankings_path}"))?;
    let requests: Vec<RankingRequest> = config.encounters.iter().map(RankingRequest::from).collect();
    let rankings = provider.rankings(&requests, &identity).await?;

    let store = seeded_store(&config, held).await;
    let held: HashSet<LabelKey> = held.iter().cloned().collect();
    let member = MemberRef::new(config.guild_id.clone(), CLI_USER);
    let report = synchronize_labels(
        &mut identity,
        &rankings,
        &held,
        &rules::from_config(&config),
        store.as_ref(),
        &member,
    )
    .await?;

    ctx.print(
        json!({
            "to_add": report.diff.add_names(),
            "to_remove": report.diff.remove_names(),
        }),
        || {
            if report.actions.is_empty() {
                "No role changes.".to_string()
            } else {
                report.narration().trim_end().to_string()
            }
        },
    );
    Ok(())
}

pub async fn clears(
    ctx: &Context,
    args: &CharacterArgs,
    token: &str,
    rankings_path: &str,
    held: &[String],
) -> Result<()> {
    let config = ctx.config()?;
    let provider = StaticRankings::load(Path::new(rankings_path))
        .with_context(|| format!("failed to read rankings from {rankings_path}"))?;
    let store = seeded_store(&config, held).await;
    let book = rules::from_config(&config);
    let pipeline = ClearsPipeline::new(
        config.clone(),
        Lodestone::new(&config),
        Arc::new(provider),
        store,
        book,
    );

    let mut identity = identity(args)?;
    let report = pipeline.run(&mut identity, CLI_USER, token).await?;
    let message = report.message(&identity);
    ctx.print(
        json!({ "character": identity, "status": report.status, "message": message }),
        || {
            let mut lines = report.status.clone();
            lines.push(message.clone());
            lines.join("\n")
        },
    );
    Ok(())
}
