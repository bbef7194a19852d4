use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::cache::{KeyValueStore, ReadCache};

/// 列表查询形状，构成缓存键的一部分
pub const LIST_SHAPE: &str = "list";

/// 列表查询的条数上限
const LIST_LIMIT: i64 = 10;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteInfo {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub text: String,
}

impl NoteInfo {
    pub async fn create<S: KeyValueStore>(
        pool: &PgPool,
        cache: &ReadCache<S>,
        owner_id: i64,
        req: CreateNoteRequest,
    ) -> Result<Self, sqlx::Error> {
        let note = sqlx::query_as::<_, NoteInfo>(
            r#"
            INSERT INTO notes (owner_id, text, created_at)
            VALUES ($1, $2, NOW())
            RETURNING id, text, created_at
            "#,
        )
        .bind(owner_id)
        .bind(&req.text)
        .fetch_one(pool)
        .await?;

        // 提交成功后、返回响应前失效该属主的缓存
        cache.invalidate(owner_id).await;

        Ok(note)
    }

    pub async fn list<S: KeyValueStore>(
        pool: &PgPool,
        cache: &ReadCache<S>,
        owner_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        cache
            .read_through(owner_id, LIST_SHAPE, || async {
                sqlx::query_as::<_, NoteInfo>(
                    r#"
                    SELECT id, text, created_at FROM notes
                    WHERE owner_id = $1
                    ORDER BY created_at DESC
                    LIMIT $2
                    "#,
                )
                .bind(owner_id)
                .bind(LIST_LIMIT)
                .fetch_all(pool)
                .await
            })
            .await
    }

    pub async fn find(
        pool: &PgPool,
        owner_id: i64,
        note_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, NoteInfo>(
            "SELECT id, text, created_at FROM notes WHERE id = $1 AND owner_id = $2",
        )
        .bind(note_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update<S: KeyValueStore>(
        pool: &PgPool,
        cache: &ReadCache<S>,
        owner_id: i64,
        note_id: i64,
        req: UpdateNoteRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let note = sqlx::query_as::<_, NoteInfo>(
            r#"
            UPDATE notes SET text = $1
            WHERE id = $2 AND owner_id = $3
            RETURNING id, text, created_at
            "#,
        )
        .bind(&req.text)
        .bind(note_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        if note.is_some() {
            cache.invalidate(owner_id).await;
        }

        Ok(note)
    }

    pub async fn delete<S: KeyValueStore>(
        pool: &PgPool,
        cache: &ReadCache<S>,
        owner_id: i64,
        note_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner_id = $2")
            .bind(note_id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            cache.invalidate(owner_id).await;
        }

        Ok(deleted)
    }
}
