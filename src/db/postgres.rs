use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    Follow, MediaType, NewReview, NewUser, NewWatchlistItem, Review, Store, StoreError,
    StoreResult, UniqueField, User, WatchlistItem,
};

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, is_email_verified, pending_email,
    email_verification_token, email_verification_expires,
    password_reset_token, password_reset_expires, created_at, last_login
"#;

const REVIEW_COLUMNS: &str = r#"
    id, user_id, media_id, media_type, media_title, media_poster, rating, content, created_at
"#;

/// Postgres-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique-violation errors (SQLSTATE 23505) onto the constraint they hit.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            let field = match db.constraint() {
                Some("users_username_key") => Some(UniqueField::Username),
                Some("users_email_key") => Some(UniqueField::Email),
                Some("watchlist_items_user_media_key") => Some(UniqueField::WatchlistEntry),
                Some("follows_pair_key") => Some(UniqueField::Follow),
                Some("reviews_user_media_key") => Some(UniqueField::Review),
                _ => None,
            };
            if let Some(field) = field {
                return StoreError::Duplicate(field);
            }
        }
    }
    StoreError::Database(e)
}

/// Escapes LIKE metacharacters so the fragment is matched literally.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, new: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, username, email, password_hash,
                               email_verification_token, email_verification_expires, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.email_verification_token)
            .bind(new.email_verification_expires)
            .bind(new.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET username = $2,
                   email = $3,
                   password_hash = $4,
                   is_email_verified = $5,
                   pending_email = $6,
                   email_verification_token = $7,
                   email_verification_expires = $8,
                   password_reset_token = $9,
                   password_reset_expires = $10,
                   last_login = $11
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_email_verified)
        .bind(&user.pending_email)
        .bind(&user.email_verification_token)
        .bind(user.email_verification_expires)
        .bind(&user.password_reset_token)
        .bind(user.password_reset_expires)
        .bind(user.last_login)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_verification_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
             WHERE email_verification_token = $1
               AND email_verification_expires > $2
            "#
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
             WHERE password_reset_token = $1
               AND password_reset_expires > $2
            "#
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn search_users(
        &self,
        fragment: &str,
        exclude: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
             WHERE username ILIKE $1
               AND id <> $2
             ORDER BY username ASC
             LIMIT $3
            "#
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(like_pattern(fragment))
            .bind(exclude)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn watchlist(&self, user_id: Uuid) -> StoreResult<Vec<WatchlistItem>> {
        Ok(sqlx::query_as::<_, WatchlistItem>(
            r#"
            SELECT id, user_id, media_type, media_id, title, poster_path, added_at
              FROM watchlist_items
             WHERE user_id = $1
             ORDER BY added_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_watchlist_item(
        &self,
        user_id: Uuid,
        item: NewWatchlistItem,
    ) -> StoreResult<WatchlistItem> {
        sqlx::query_as::<_, WatchlistItem>(
            r#"
            INSERT INTO watchlist_items (id, user_id, media_type, media_id, title, poster_path, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, media_type, media_id, title, poster_path, added_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(item.media_type.as_str())
        .bind(item.media_id)
        .bind(&item.title)
        .bind(&item.poster_path)
        .bind(item.added_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete_watchlist_items(
        &self,
        user_id: Uuid,
        media_id: i64,
        media_type: Option<MediaType>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM watchlist_items
             WHERE user_id = $1
               AND media_id = $2
               AND ($3::text IS NULL OR media_type = $3)
            "#,
        )
        .bind(user_id)
        .bind(media_id)
        .bind(media_type.map(MediaType::as_str))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        username: &str,
    ) -> StoreResult<Follow> {
        sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (follower_id, followee_id, username, followed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING follower_id, followee_id, username, followed_at
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(username)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
                .bind(follower_id)
                .bind(followee_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn following(&self, follower_id: Uuid) -> StoreResult<Vec<Follow>> {
        Ok(sqlx::query_as::<_, Follow>(
            r#"
            SELECT follower_id, followee_id, username, followed_at
              FROM follows
             WHERE follower_id = $1
             ORDER BY seq ASC
            "#,
        )
        .bind(follower_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn follow_entry(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> StoreResult<Option<Follow>> {
        Ok(sqlx::query_as::<_, Follow>(
            r#"
            SELECT follower_id, followee_id, username, followed_at
              FROM follows
             WHERE follower_id = $1 AND followee_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_review(&self, new: NewReview) -> StoreResult<Review> {
        let sql = format!(
            r#"
            INSERT INTO reviews (id, user_id, media_id, media_type, media_title, media_poster,
                                 rating, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Review>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.user_id)
            .bind(new.media_id)
            .bind(new.media_type.as_str())
            .bind(&new.media_title)
            .bind(&new.media_poster)
            .bind(new.rating)
            .bind(&new.content)
            .bind(new.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn review_by_id(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn review_for_media(
        &self,
        user_id: Uuid,
        media_id: i64,
        media_type: MediaType,
    ) -> StoreResult<Option<Review>> {
        let sql = format!(
            r#"
            SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE user_id = $1 AND media_id = $2 AND media_type = $3
            "#
        );
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(user_id)
            .bind(media_id)
            .bind(media_type.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn reviews_by_users(&self, user_ids: &[Uuid], limit: i64) -> StoreResult<Vec<Review>> {
        let sql = format!(
            r#"
            SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE user_id = ANY($1)
             ORDER BY created_at DESC
             LIMIT $2
            "#
        );
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(user_ids.to_vec())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
