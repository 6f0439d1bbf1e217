//! Schema creation for the snapshot store.
//!
//! One table per entity kind plus `archive_info` for the manifest row.
//! All statements are idempotent; `init` can be re-run safely. Re-running
//! *ingestion* against a populated store is not deduplicated: tables with
//! source-carried or composite keys reject the duplicates with constraint
//! errors, while `subject_relation`, whose id is store-assigned, simply
//! grows.

use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS archive_info (
            id INTEGER PRIMARY KEY,
            browser_download_url TEXT NOT NULL,
            content_type TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            label TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL,
            node_id TEXT NOT NULL DEFAULT '',
            size INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            url TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subject (
            id INTEGER PRIMARY KEY,
            type INTEGER NOT NULL,
            name TEXT NOT NULL,
            name_cn TEXT NOT NULL DEFAULT '',
            infobox TEXT NOT NULL DEFAULT '',
            platform INTEGER NOT NULL DEFAULT 0,
            summary TEXT NOT NULL DEFAULT '',
            nsfw INTEGER NOT NULL DEFAULT 0,
            tags_json TEXT NOT NULL DEFAULT '[]',
            score REAL NOT NULL DEFAULT 0,
            score_details_json TEXT NOT NULL DEFAULT '{}',
            rank INTEGER NOT NULL DEFAULT 0,
            date TEXT,
            favorite_json TEXT NOT NULL DEFAULT '{}',
            series INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS episode (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            name_cn TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            airdate TEXT NOT NULL DEFAULT '',
            disc INTEGER NOT NULL DEFAULT 0,
            duration TEXT NOT NULL DEFAULT '',
            subject_id INTEGER NOT NULL,
            sort REAL NOT NULL DEFAULT 0,
            type INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS character (
            id INTEGER PRIMARY KEY,
            role INTEGER NOT NULL DEFAULT 0,
            name TEXT NOT NULL DEFAULT '',
            infobox TEXT NOT NULL DEFAULT '',
            summary TEXT NOT NULL DEFAULT '',
            comments INTEGER NOT NULL DEFAULT 0,
            collects INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS person (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            type INTEGER NOT NULL DEFAULT 0,
            career_json TEXT,
            infobox TEXT NOT NULL DEFAULT '',
            summary TEXT NOT NULL DEFAULT '',
            comments INTEGER NOT NULL DEFAULT 0,
            collects INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS person_character (
            person_id INTEGER NOT NULL,
            subject_id INTEGER NOT NULL,
            character_id INTEGER NOT NULL,
            summary TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (person_id, subject_id, character_id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subject_character (
            character_id INTEGER NOT NULL,
            subject_id INTEGER NOT NULL,
            type INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (character_id, subject_id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subject_person (
            person_id INTEGER NOT NULL,
            subject_id INTEGER NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (subject_id, person_id, position)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subject_relation (
            relation_id INTEGER PRIMARY KEY,
            subject_id INTEGER NOT NULL,
            relation_type INTEGER NOT NULL DEFAULT 0,
            related_subject_id INTEGER NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_episode_subject_id ON episode(subject_id)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_subject_relation_subject_id ON subject_relation(subject_id)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
