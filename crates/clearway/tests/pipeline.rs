//! End-to-end `/clears` flow against a mock Lodestone, static rankings and
//! an in-memory role store.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use clearway::roles::rules;
use clearway::store::StoreCall;
use clearway::types::RankingRequest;
use clearway::{
    ClearsOutcome, ClearsPipeline, ClearwayConfig, ClearwayError, Encounter, Identity,
    InMemoryStore, MembershipStore, Ranking, RankingProvider, Rankings, RoleRule, RuleBook,
    RulePass, StaticRankings, Tier,
};
use common::{lodestone, profile_page, search_page};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GUILD: &str = "guild-1";
const USER: &str = "42";
const TOKEN: &str = "DISCORD-42";

fn encounter(name: &str, id: u32, tier: Tier) -> Encounter {
    Encounter {
        name: name.into(),
        ids: vec![id],
        difficulty: 101,
        tier,
    }
}

fn config(refresh_window_secs: u64) -> ClearwayConfig {
    ClearwayConfig {
        guild_id: GUILD.into(),
        crawl_delay_ms: 0,
        refresh_window_secs,
        encounters: vec![
            encounter("E1", 1, Tier::Standard),
            encounter("E2", 2, Tier::Standard),
        ],
        ..Default::default()
    }
}

fn rankings() -> Rankings {
    let mut r = Rankings::new();
    r.insert(
        "E1".into(),
        Ranking {
            total_kills: 1,
            best_percent: Some(75.0),
        },
    );
    r
}

fn book() -> RuleBook {
    RuleBook {
        standard: RulePass::new(
            vec![rules::cleared("E1-clear", "E1"), rules::cleared("E2-clear", "E2")],
            ["E1".to_string(), "E2".to_string()].into(),
        ),
        top_tier: RulePass::default(),
    }
}

async fn mock_lodestone(bio: &str, times: u64) -> MockServer {
    mock_lodestone_counts(bio, times, times).await
}

async fn mock_lodestone_counts(bio: &str, searches: u64, profiles: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lodestone/character/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(search_page(&[("Jane Doe", 500)], Some("Page 1 of 1"))),
        )
        .expect(searches)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lodestone/character/500/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(profile_page(bio)))
        .expect(profiles)
        .mount(&server)
        .await;
    server
}

fn pipeline(
    server: &MockServer,
    refresh_window_secs: u64,
    store: Arc<InMemoryStore>,
    provider: Arc<dyn RankingProvider>,
) -> ClearsPipeline {
    ClearsPipeline::new(
        config(refresh_window_secs),
        lodestone(server),
        provider,
        store,
        book(),
    )
}

#[tokio::test]
async fn test_jane_doe_end_to_end() {
    let server = mock_lodestone("Verification: DISCORD-42", 1).await;
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(
        &server,
        300,
        Arc::clone(&store),
        Arc::new(StaticRankings::new(rankings())),
    );

    let mut identity = Identity::new("gaia", "jane", "doe").unwrap();
    let report = pipeline.run(&mut identity, USER, TOKEN).await.unwrap();

    assert_eq!(identity.lodestone_id, Some(500));
    assert!(identity.last_verified_at.is_some());
    assert_eq!(report.status.len(), 3);
    match &report.outcome {
        ClearsOutcome::Synchronized(sync) => {
            assert_eq!(sync.diff.add_names(), vec!["E1-clear"]);
            assert!(sync.diff.to_remove.is_empty());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        report.message(&identity),
        "Finished analysis for `Jane Doe (Gaia)`.\nAdding role: `E1-clear`\n"
    );
    assert_eq!(store.history().await, vec![StoreCall::Add("E1-clear".into())]);
}

#[tokio::test]
async fn test_recent_sync_is_skipped() {
    let server = mock_lodestone_counts("DISCORD-42", 1, 2).await;
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(
        &server,
        300,
        Arc::clone(&store),
        Arc::new(StaticRankings::new(rankings())),
    );

    let mut identity = Identity::new("Gaia", "Jane", "Doe").unwrap();
    pipeline.run(&mut identity, USER, TOKEN).await.unwrap();
    // The id is kept on the identity; ownership is checked again.
    let again = pipeline.run(&mut identity, USER, TOKEN).await.unwrap();
    assert_eq!(again.outcome, ClearsOutcome::UpToDate);
    assert_eq!(store.history().await.len(), 1);
}

#[tokio::test]
async fn test_rerun_converges_to_empty_diff() {
    let server = mock_lodestone("DISCORD-42", 1).await;
    let store = Arc::new(InMemoryStore::new());
    store.seed(GUILD, USER, ["E2-clear"]).await;
    let pipeline = pipeline(
        &server,
        0,
        Arc::clone(&store),
        Arc::new(StaticRankings::new(rankings())),
    );

    let mut identity = Identity::new("Gaia", "Jane", "Doe").unwrap();
    let first = pipeline.run(&mut identity, USER, TOKEN).await.unwrap();
    let ClearsOutcome::Synchronized(first) = first.outcome else {
        panic!("expected a sync");
    };
    assert_eq!(first.diff.add_names(), vec!["E1-clear"]);
    assert_eq!(first.diff.remove_names(), vec!["E2-clear"]);

    let second = pipeline.sync(&mut identity, USER).await.unwrap();
    assert!(second.diff.is_empty());
    assert!(second.actions.is_empty());

    let held = store.current_labels(GUILD, USER).await.unwrap();
    assert_eq!(held, HashSet::from(["E1-clear".to_string()]));
}

#[tokio::test]
async fn test_missing_token_reports_not_owner() {
    let server = mock_lodestone("I like chocobos", 1).await;
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(
        &server,
        300,
        Arc::clone(&store),
        Arc::new(StaticRankings::new(rankings())),
    );

    let mut identity = Identity::new("Gaia", "Jane", "Doe").unwrap();
    let report = pipeline.run(&mut identity, USER, TOKEN).await.unwrap();
    assert_eq!(
        report.outcome,
        ClearsOutcome::NotOwner {
            token: TOKEN.into()
        }
    );
    assert!(report.message(&identity).contains("**DISCORD-42**"));
    assert!(identity.last_verified_at.is_none());
    assert!(store.history().await.is_empty());
}

struct BrokenProvider;

#[async_trait]
impl RankingProvider for BrokenProvider {
    async fn rankings(
        &self,
        _requests: &[RankingRequest],
        _identity: &Identity,
    ) -> anyhow::Result<Rankings> {
        Err(anyhow::anyhow!("fflogs is down"))
    }
}

#[tokio::test]
async fn test_provider_error_is_surfaced() {
    let server = mock_lodestone("DISCORD-42", 1).await;
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(&server, 300, Arc::clone(&store), Arc::new(BrokenProvider));

    let mut identity = Identity::new("Gaia", "Jane", "Doe").unwrap();
    let err = pipeline.run(&mut identity, USER, TOKEN).await.unwrap_err();
    match err {
        ClearwayError::Provider(msg) => assert_eq!(msg, "fflogs is down"),
        other => panic!("expected Provider, got {other}"),
    }
    assert!(identity.last_verified_at.is_none());
    assert_eq!(pipeline.active_identities(), 0);
}

#[tokio::test]
async fn test_same_character_runs_are_serialized() {
    let server = mock_lodestone("DISCORD-42", 2).await;
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Arc::new(pipeline(
        &server,
        300,
        Arc::clone(&store),
        Arc::new(StaticRankings::new(rankings())),
    ));

    let run = |pipeline: Arc<ClearsPipeline>| async move {
        let mut identity = Identity::new("Gaia", "Jane", "Doe").unwrap();
        pipeline.run(&mut identity, USER, TOKEN).await
    };
    let (a, b) = tokio::join!(run(Arc::clone(&pipeline)), run(Arc::clone(&pipeline)));
    a.unwrap();
    b.unwrap();

    // The second run sees the role the first one granted.
    assert_eq!(store.history().await, vec![StoreCall::Add("E1-clear".into())]);
    assert_eq!(pipeline.active_identities(), 0);
}

#[tokio::test]
async fn test_unmanaged_rules_survive_sync() {
    let server = mock_lodestone("DISCORD-42", 1).await;
    let store = Arc::new(InMemoryStore::new());
    store.seed(GUILD, USER, ["Mentor"]).await;
    let mut book = book();
    book.standard.rules.push(RoleRule::unmanaged("Mentor", "Mentor"));
    let pipeline = ClearsPipeline::new(
        config(300),
        lodestone(&server),
        Arc::new(StaticRankings::new(rankings())),
        Arc::clone(&store) as Arc<dyn MembershipStore>,
        book,
    );

    let mut identity = Identity::new("Gaia", "Jane", "Doe").unwrap();
    pipeline.run(&mut identity, USER, TOKEN).await.unwrap();
    let held = store.current_labels(GUILD, USER).await.unwrap();
    assert!(held.contains("Mentor"));
    assert!(held.contains("E1-clear"));
}
