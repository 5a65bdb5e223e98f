//! Integration tests for paginated event listing with metadata enrichment.

mod common;

use sqlx::PgPool;

use common::{build_ledger, in_phase, new_block, new_user};
use lode_core::category::EventCategory;
use lode_ledger::ledger::{EventMetadata, ExternalRef, ListEvents, NewEvent};

async fn seed_contributions(pool: &PgPool, user_id: i64, count: usize) {
    let ledger = build_ledger(pool);
    for i in 0..count {
        ledger
            .create(NewEvent {
                category: EventCategory::CommunityContribution,
                user_id,
                points: None,
                occurred_at: Some(in_phase(2, 1 + i as u32)),
                external: Some(ExternalRef::Url(format!("https://forum/post/{i}"))),
            })
            .await
            .unwrap();
    }
}

// ---------------------------------------------------------------------------
// Test: first page is newest-first with correct boundary flags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_first_page_flags(pool: PgPool) {
    let ledger = build_ledger(&pool);
    let user_id = new_user(&pool, "lister").await;
    seed_contributions(&pool, user_id, 3).await;

    let page = ledger
        .list(user_id, &ListEvents { limit: Some(2), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    assert!(page.data[0].event.occurred_at > page.data[1].event.occurred_at);
    assert!(page.has_next, "a third event exists past the page");
    assert!(!page.has_previous, "nothing precedes the newest event");
}

// ---------------------------------------------------------------------------
// Test: after-cursor continues the walk, before-cursor reverses it
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cursors_walk_both_directions(pool: PgPool) {
    let ledger = build_ledger(&pool);
    let user_id = new_user(&pool, "walker").await;
    seed_contributions(&pool, user_id, 3).await;

    let first_page = ledger
        .list(user_id, &ListEvents { limit: Some(2), ..Default::default() })
        .await
        .unwrap();
    let cursor = first_page.data[1].event.id;

    let second_page = ledger
        .list(
            user_id,
            &ListEvents { after: Some(cursor), limit: Some(2), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(second_page.data.len(), 1);
    assert!(!second_page.has_next);
    assert!(second_page.has_previous);

    let oldest = second_page.data[0].event.id;
    let back = ledger
        .list(
            user_id,
            &ListEvents { before: Some(oldest), limit: Some(2), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(back.data.len(), 2);
    assert_eq!(back.data[1].event.id, cursor, "walking back lands on the cursor row");
    assert!(back.has_next, "the oldest row lies past this page");
}

// ---------------------------------------------------------------------------
// Test: retracted events vanish from listings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_retracted_events_are_hidden(pool: PgPool) {
    let ledger = build_ledger(&pool);
    let user_id = new_user(&pool, "pruned").await;
    seed_contributions(&pool, user_id, 2).await;

    let page = ledger.list(user_id, &ListEvents::default()).await.unwrap();
    ledger.retract(page.data[0].event.id).await.unwrap();

    let after = ledger.list(user_id, &ListEvents::default()).await.unwrap();
    assert_eq!(after.data.len(), 1);
    assert!(!after.has_next);
    assert!(!after.has_previous);
}

// ---------------------------------------------------------------------------
// Test: the limit is clamped to the maximum page size
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_limit_is_clamped(pool: PgPool) {
    let ledger = build_ledger(&pool);
    let user_id = new_user(&pool, "greedy").await;
    seed_contributions(&pool, user_id, 3).await;

    // An absurd limit is accepted but bounded.
    let page = ledger
        .list(user_id, &ListEvents { limit: Some(10_000), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(page.data.len(), 3);
}

// ---------------------------------------------------------------------------
// Test: each record carries exactly its identity's metadata shape
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_listing_enriches_metadata_per_identity(pool: PgPool) {
    let ledger = build_ledger(&pool);
    let user_id = new_user(&pool, "varied").await;

    let block = new_block(&pool, "0xlist", 400).await;
    ledger.upsert_block_mined(&block, user_id).await.unwrap();
    ledger
        .create(NewEvent {
            category: EventCategory::SocialMediaPromotion,
            user_id,
            points: None,
            occurred_at: Some(in_phase(9, 9)),
            external: Some(ExternalRef::Url("https://social/share/1".to_string())),
        })
        .await
        .unwrap();
    ledger.create_node_uptime(user_id, in_phase(9, 10)).await.unwrap();

    let page = ledger.list(user_id, &ListEvents::default()).await.unwrap();
    assert_eq!(page.data.len(), 3);

    for item in &page.data {
        match item.event.category {
            EventCategory::BlockMined => {
                assert!(matches!(item.metadata, Some(EventMetadata::Block(_))));
            }
            EventCategory::SocialMediaPromotion => {
                assert!(matches!(item.metadata, Some(EventMetadata::Url { .. })));
            }
            EventCategory::NodeUptime => {
                assert!(item.metadata.is_none(), "uptime has no external identity");
            }
            other => panic!("unexpected category {other}"),
        }
    }
}
