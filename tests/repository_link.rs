use chrono::Utc;
use link_resolver::domain::entities::{LinkPatch, NewClick, NewLink};
use link_resolver::domain::repositories::LinkRepository;
use link_resolver::error::RepositoryError;
use link_resolver::infrastructure::persistence::PgLinkRepository;
use sqlx::PgPool;
use std::sync::Arc;

fn new_link(code: &str, long_url: &str) -> NewLink {
    NewLink {
        code: code.to_string(),
        long_url: long_url.to_string(),
        permanent: true,
    }
}

fn click(code: &str) -> NewClick {
    NewClick {
        code: code.to_string(),
        clicked_at: Utc::now(),
        user_agent: Some("curl/8.0".to_string()),
        referer: None,
        ip: Some("203.0.113.7".to_string()),
    }
}

async fn click_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM link_clicks")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
async fn test_create_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo
        .create(new_link("abc123X", "https://example.com"))
        .await
        .unwrap();

    assert_eq!(link.code, "abc123X");
    assert_eq!(link.long_url, "https://example.com");
    assert!(link.permanent);
    assert!(!link.is_deleted());
}

#[sqlx::test]
async fn test_create_duplicate_code_is_conflict(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("taken1", "https://a.example"))
        .await
        .unwrap();

    let result = repo.create(new_link("taken1", "https://b.example")).await;

    assert!(matches!(result, Err(RepositoryError::Conflict(code)) if code == "taken1"));
}

#[sqlx::test]
async fn test_lookup_returns_target(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(NewLink {
        permanent: false,
        ..new_link("temp42", "https://example.com/temp")
    })
    .await
    .unwrap();

    let target = repo.lookup("temp42").await.unwrap().unwrap();

    assert_eq!(target.url, "https://example.com/temp");
    assert!(!target.permanent);
}

#[sqlx::test]
async fn test_lookup_not_found(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.lookup("missing").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_deleted_link_is_hidden_but_still_exists(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("gone01", "https://example.com"))
        .await
        .unwrap();

    assert!(repo.soft_delete("gone01").await.unwrap());

    assert!(repo.lookup("gone01").await.unwrap().is_none());
    // Deleted codes stay reserved so they are never reissued.
    assert!(repo.exists("gone01").await.unwrap());
    assert!(!repo.exists("never1").await.unwrap());
}

#[sqlx::test]
async fn test_soft_delete_twice(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("twice1", "https://example.com"))
        .await
        .unwrap();

    assert!(repo.soft_delete("twice1").await.unwrap());
    assert!(!repo.soft_delete("twice1").await.unwrap());
    assert!(!repo.soft_delete("unknown").await.unwrap());
}

#[sqlx::test]
async fn test_deleted_code_cannot_be_recreated(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("reused", "https://a.example"))
        .await
        .unwrap();
    repo.soft_delete("reused").await.unwrap();

    let result = repo.create(new_link("reused", "https://b.example")).await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
}

#[sqlx::test]
async fn test_update_keeps_unset_fields(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("patch1", "https://old.example"))
        .await
        .unwrap();

    let updated = repo
        .update(
            "patch1",
            LinkPatch {
                permanent: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.long_url, "https://old.example");
    assert!(!updated.permanent);

    let updated = repo
        .update(
            "patch1",
            LinkPatch {
                url: Some("https://new.example".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.long_url, "https://new.example");
    assert!(!updated.permanent);
}

#[sqlx::test]
async fn test_update_deleted_link_is_none(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("patch2", "https://example.com"))
        .await
        .unwrap();
    repo.soft_delete("patch2").await.unwrap();

    let result = repo
        .update(
            "patch2",
            LinkPatch {
                url: Some("https://new.example".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(result.is_none());
}

#[sqlx::test]
async fn test_record_click(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));
    repo.create(new_link("click1", "https://example.com"))
        .await
        .unwrap();

    repo.record_click(click("click1")).await.unwrap();
    repo.record_click(click("click1")).await.unwrap();

    assert_eq!(click_count(&pool).await, 2);
}

#[sqlx::test]
async fn test_record_click_for_unknown_code_is_dropped(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    let result = repo.record_click(click("nobody")).await;

    assert!(result.is_ok());
    assert_eq!(click_count(&pool).await, 0);
}

#[sqlx::test]
async fn test_ping(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.ping().await.is_ok());
}
