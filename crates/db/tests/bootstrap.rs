use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    // Health check
    lode_db::health_check(&pool).await.unwrap();

    // Every core table exists and is queryable.
    let tables = ["users", "blocks", "deposits", "events", "user_points", "tasks"];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert!(count.0 >= 0, "{table} should be queryable");
    }
}

/// Verify the event_category enum round-trips through the driver.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_event_category_enum_round_trip(pool: PgPool) {
    use lode_core::category::EventCategory;

    let value: EventCategory =
        sqlx::query_scalar("SELECT 'BLOCK_MINED'::event_category")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(value, EventCategory::BlockMined);
}
