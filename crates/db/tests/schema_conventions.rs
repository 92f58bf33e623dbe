use sqlx::PgPool;

/// All `id` columns must be bigint.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_pks_are_bigint(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        assert_eq!(data_type, "bigint", "Table {table}.id should be bigint");
    }
}

/// Every tenant-owned table carries an indexed `school_id`.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tenant_tables_index_school_id(pool: PgPool) {
    let tables = [
        "users",
        "classes",
        "students",
        "subjects",
        "grades",
        "attendance_records",
        "fees",
        "transactions",
        "analytics_events",
    ];

    for table in tables {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM pg_indexes
             WHERE schemaname = 'public'
               AND tablename = $1
               AND indexdef LIKE '%(school_id)%'",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(count > 0, "{table}.school_id should be indexed");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_check(pool: PgPool) {
    eduscope_db::health_check(&pool).await.unwrap();
}
