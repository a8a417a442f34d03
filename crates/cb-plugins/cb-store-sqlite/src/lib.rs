//! # cb-store-sqlite
//!
//! SQLite implementation of the storage ports, mapping the relational
//! model back to the `cb-core` domain models. Every multi-row atomic
//! unit (reaction record + counters, result + credit, debit + purchase
//! record) runs inside a transaction so the ledger invariants survive
//! a crash between statements.

use async_trait::async_trait;
use cb_core::error::{CoreError, Result};
use cb_core::models::{
    Account, AccountRole, Comment, GameKind, GameOutcome, GameStats, MediaRef, MinigameResult,
    MinigameSpec, Post, PostKind, PurchaseReceipt, ReactionKind, ReactionReceipt, ReactionRecord,
    ShopItem,
};
use cb_core::rules;
use cb_core::traits::{CommunityStore, LedgerStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

pub struct SqliteStore {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn internal(err: impl std::fmt::Display) -> CoreError {
    CoreError::internal(err)
}

fn post_kind_str(kind: PostKind) -> &'static str {
    match kind {
        PostKind::Announcement => "announcement",
        PostKind::Forum => "forum",
    }
}

fn parse_post_kind(s: &str) -> Result<PostKind> {
    match s {
        "announcement" => Ok(PostKind::Announcement),
        "forum" => Ok(PostKind::Forum),
        other => Err(internal(format!("unknown post kind in row: {other}"))),
    }
}

fn game_kind_str(kind: GameKind) -> &'static str {
    match kind {
        GameKind::WordGuess => "word_guess",
        GameKind::ObstacleRun => "obstacle_run",
    }
}

fn parse_game_kind(s: &str) -> Result<GameKind> {
    match s {
        "word_guess" => Ok(GameKind::WordGuess),
        "obstacle_run" => Ok(GameKind::ObstacleRun),
        other => Err(internal(format!("unknown game kind in row: {other}"))),
    }
}

fn parse_reaction_kind(s: &str) -> Result<ReactionKind> {
    ReactionKind::from_str(s)
        .map_err(|()| internal(format!("unknown reaction kind in row: {s}")))
}

impl SqliteStore {
    /// Opens (and creates, if missing) the database at `url` and makes
    /// sure the schema exists.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // An in-memory database lives and dies with its connection, so
        // the pool must hold exactly one and never recycle it.
        let memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> anyhow::Result<()> {
        // raw_sql: the schema is a multi-statement batch.
        sqlx::raw_sql(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id          BLOB PRIMARY KEY,
                kind        TEXT NOT NULL,
                author_id   BLOB NOT NULL,
                body        TEXT NOT NULL,
                media_id    TEXT,
                media_type  TEXT,
                created_at  TEXT NOT NULL,
                likes       INTEGER NOT NULL DEFAULT 0,
                dislikes    INTEGER NOT NULL DEFAULT 0,
                game_kind   TEXT,
                secret_word TEXT
            );
            CREATE TABLE IF NOT EXISTS reactions (
                user_id    BLOB NOT NULL,
                post_id    BLOB NOT NULL,
                kind       TEXT NOT NULL,
                reacted_at TEXT NOT NULL,
                PRIMARY KEY (user_id, post_id)
            );
            CREATE TABLE IF NOT EXISTS comments (
                id         BLOB PRIMARY KEY,
                post_id    BLOB NOT NULL,
                post_kind  TEXT NOT NULL,
                author_id  BLOB NOT NULL,
                body       TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS accounts (
                id         BLOB PRIMARY KEY,
                username   TEXT NOT NULL,
                role       TEXT NOT NULL,
                claw_marks INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS shop_items (
                id       BLOB PRIMARY KEY,
                name     TEXT NOT NULL,
                price    INTEGER NOT NULL,
                media_id TEXT
            );
            CREATE TABLE IF NOT EXISTS purchases (
                account_id   BLOB NOT NULL,
                item_id      BLOB NOT NULL,
                purchased_at TEXT NOT NULL,
                PRIMARY KEY (account_id, item_id)
            );
            CREATE TABLE IF NOT EXISTS minigame_results (
                id        BLOB PRIMARY KEY,
                player_id BLOB NOT NULL,
                post_id   BLOB NOT NULL,
                outcome   TEXT NOT NULL,
                points    INTEGER NOT NULL,
                stats     TEXT NOT NULL,
                played_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Seeding helper; content authoring is out of scope for the core.
    pub async fn insert_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, kind, author_id, body, media_id, media_type, created_at, \
             likes, dislikes, game_kind, secret_word) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(post.id))
        .bind(post_kind_str(post.kind))
        .bind(uuid_to_blob(post.author_id))
        .bind(&post.body)
        .bind(post.media.as_ref().map(|m| m.media_id.clone()))
        .bind(post.media.as_ref().map(|m| m.content_type.clone()))
        .bind(post.created_at)
        .bind(post.likes)
        .bind(post.dislikes)
        .bind(post.minigame.as_ref().map(|g| game_kind_str(g.kind)))
        .bind(post.minigame.as_ref().and_then(|g| g.secret_word.clone()))
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(())
    }

    pub async fn insert_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            "INSERT INTO accounts (id, username, role, claw_marks, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(account.id))
        .bind(&account.username)
        .bind(match account.role {
            AccountRole::Staff => "staff",
            AccountRole::Member => "member",
        })
        .bind(account.claw_marks)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(())
    }

    pub async fn insert_item(&self, item: &ShopItem) -> Result<()> {
        sqlx::query("INSERT INTO shop_items (id, name, price, media_id) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(item.id))
            .bind(&item.name)
            .bind(item.price)
            .bind(item.media_id.clone())
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(())
    }
}

fn post_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let media = match (
        row.get::<Option<String>, _>("media_id"),
        row.get::<Option<String>, _>("media_type"),
    ) {
        (Some(media_id), Some(content_type)) => Some(MediaRef {
            media_id,
            content_type,
        }),
        _ => None,
    };
    let minigame = match row.get::<Option<String>, _>("game_kind") {
        Some(kind) => Some(MinigameSpec {
            kind: parse_game_kind(&kind)?,
            secret_word: row.get("secret_word"),
        }),
        None => None,
    };
    Ok(Post {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        kind: parse_post_kind(&row.get::<String, _>("kind"))?,
        author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
        body: row.get("body"),
        media,
        created_at: row.get("created_at"),
        likes: row.get("likes"),
        dislikes: row.get("dislikes"),
        minigame,
    })
}

fn item_from_row(row: &sqlx::sqlite::SqliteRow) -> ShopItem {
    ShopItem {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        name: row.get("name"),
        price: row.get("price"),
        media_id: row.get("media_id"),
    }
}

#[async_trait]
impl CommunityStore for SqliteStore {
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(post_from_row).transpose()
    }

    async fn get_reaction(
        &self,
        user_id: Uuid,
        post_id: Uuid,
    ) -> Result<Option<ReactionRecord>> {
        let row = sqlx::query(
            "SELECT kind, reacted_at FROM reactions WHERE user_id = ? AND post_id = ?",
        )
        .bind(uuid_to_blob(user_id))
        .bind(uuid_to_blob(post_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        row.map(|row| {
            Ok(ReactionRecord {
                user_id,
                post_id,
                kind: parse_reaction_kind(&row.get::<String, _>("kind"))?,
                reacted_at: row.get("reacted_at"),
            })
        })
        .transpose()
    }

    /// The read of the existing record and the write of record +
    /// counters form one transaction, which serializes with any other
    /// writer on the same post.
    async fn apply_reaction(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: ReactionKind,
    ) -> Result<ReactionReceipt> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(uuid_to_blob(post_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?
            .ok_or(CoreError::PostNotFound(post_id))?;

        let existing = sqlx::query("SELECT kind FROM reactions WHERE user_id = ? AND post_id = ?")
            .bind(uuid_to_blob(user_id))
            .bind(uuid_to_blob(post_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?
            .map(|row| parse_reaction_kind(&row.get::<String, _>("kind")))
            .transpose()?;

        let transition = rules::reaction_transition(existing, kind);
        match transition.surviving(kind) {
            None => {
                sqlx::query("DELETE FROM reactions WHERE user_id = ? AND post_id = ?")
                    .bind(uuid_to_blob(user_id))
                    .bind(uuid_to_blob(post_id))
                    .execute(&mut *tx)
                    .await
                    .map_err(internal)?;
            }
            Some(surviving) => {
                sqlx::query(
                    "INSERT INTO reactions (user_id, post_id, kind, reacted_at) \
                     VALUES (?, ?, ?, ?) \
                     ON CONFLICT (user_id, post_id) \
                     DO UPDATE SET kind = excluded.kind, reacted_at = excluded.reacted_at",
                )
                .bind(uuid_to_blob(user_id))
                .bind(uuid_to_blob(post_id))
                .bind(surviving.as_str())
                .bind(chrono::Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(internal)?;
            }
        }

        let (like_delta, dislike_delta) = transition.counter_deltas(kind);
        let row = sqlx::query(
            "UPDATE posts SET likes = likes + ?, dislikes = dislikes + ? WHERE id = ? \
             RETURNING likes, dislikes",
        )
        .bind(like_delta)
        .bind(dislike_delta)
        .bind(uuid_to_blob(post_id))
        .fetch_one(&mut *tx)
        .await
        .map_err(internal)?;

        tx.commit().await.map_err(internal)?;

        Ok(ReactionReceipt {
            post_id,
            likes: row.get("likes"),
            dislikes: row.get("dislikes"),
            current: transition.surviving(kind),
        })
    }

    async fn add_comment(&self, comment: Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, post_kind, author_id, body, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(comment.id))
        .bind(uuid_to_blob(comment.post_id))
        .bind(post_kind_str(comment.post_kind))
        .bind(uuid_to_blob(comment.author_id))
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(())
    }

    async fn comments_for_post(
        &self,
        post_id: Uuid,
        post_kind: PostKind,
    ) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, author_id, body, created_at FROM comments \
             WHERE post_id = ? AND post_kind = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(uuid_to_blob(post_id))
        .bind(post_kind_str(post_kind))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        Ok(rows
            .into_iter()
            .map(|row| Comment {
                id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
                post_id,
                post_kind,
                author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
                text: row.get("body"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;

        row.map(|row| {
            Ok(Account {
                id,
                username: row.get("username"),
                role: match row.get::<String, _>("role").as_str() {
                    "staff" => AccountRole::Staff,
                    _ => AccountRole::Member,
                },
                claw_marks: row.get("claw_marks"),
                created_at: row.get("created_at"),
            })
        })
        .transpose()
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<ShopItem>> {
        let row = sqlx::query("SELECT * FROM shop_items WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        Ok(row.as_ref().map(item_from_row))
    }

    async fn list_items(&self) -> Result<Vec<ShopItem>> {
        let rows = sqlx::query("SELECT * FROM shop_items ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn owned_items(&self, account_id: Uuid) -> Result<Vec<ShopItem>> {
        sqlx::query("SELECT 1 FROM accounts WHERE id = ?")
            .bind(uuid_to_blob(account_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or(CoreError::AccountNotFound(account_id))?;

        let rows = sqlx::query(
            "SELECT s.* FROM shop_items s \
             JOIN purchases p ON p.item_id = s.id \
             WHERE p.account_id = ? ORDER BY p.purchased_at",
        )
        .bind(uuid_to_blob(account_id))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn has_result(&self, player_id: Uuid, post_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM minigame_results WHERE player_id = ? AND post_id = ? LIMIT 1",
        )
        .bind(uuid_to_blob(player_id))
        .bind(uuid_to_blob(post_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        Ok(row.is_some())
    }

    /// Result insert and balance credit commit together: a crash
    /// between them must never leave a result without its points.
    async fn record_result(&self, result: MinigameResult) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        sqlx::query("SELECT 1 FROM accounts WHERE id = ?")
            .bind(uuid_to_blob(result.player_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?
            .ok_or(CoreError::AccountNotFound(result.player_id))?;

        let stats = serde_json::to_string(&result.stats).map_err(internal)?;
        sqlx::query(
            "INSERT INTO minigame_results (id, player_id, post_id, outcome, points, stats, played_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(result.id))
        .bind(uuid_to_blob(result.player_id))
        .bind(uuid_to_blob(result.post_id))
        .bind(match result.outcome {
            GameOutcome::Won => "won",
            GameOutcome::Lost => "lost",
        })
        .bind(result.points)
        .bind(stats)
        .bind(result.played_at)
        .execute(&mut *tx)
        .await
        .map_err(internal)?;

        let row = sqlx::query(
            "UPDATE accounts SET claw_marks = claw_marks + ? WHERE id = ? RETURNING claw_marks",
        )
        .bind(result.points)
        .bind(uuid_to_blob(result.player_id))
        .fetch_one(&mut *tx)
        .await
        .map_err(internal)?;

        tx.commit().await.map_err(internal)?;
        Ok(row.get("claw_marks"))
    }

    /// Ownership check, funds check, debit, and purchase-record insert
    /// run in one transaction; any failure rolls the whole unit back.
    async fn purchase(&self, account_id: Uuid, item_id: Uuid) -> Result<PurchaseReceipt> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        let price: i64 = sqlx::query("SELECT price FROM shop_items WHERE id = ?")
            .bind(uuid_to_blob(item_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?
            .map(|row| row.get("price"))
            .ok_or(CoreError::ItemNotFound(item_id))?;

        let balance: i64 = sqlx::query("SELECT claw_marks FROM accounts WHERE id = ?")
            .bind(uuid_to_blob(account_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?
            .map(|row| row.get("claw_marks"))
            .ok_or(CoreError::AccountNotFound(account_id))?;

        let already_owned = sqlx::query(
            "SELECT 1 FROM purchases WHERE account_id = ? AND item_id = ? LIMIT 1",
        )
        .bind(uuid_to_blob(account_id))
        .bind(uuid_to_blob(item_id))
        .fetch_optional(&mut *tx)
        .await
        .map_err(internal)?
        .is_some();

        let new_balance = rules::check_purchase(item_id, balance, price, already_owned)?;

        sqlx::query("UPDATE accounts SET claw_marks = ? WHERE id = ?")
            .bind(new_balance)
            .bind(uuid_to_blob(account_id))
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        sqlx::query(
            "INSERT INTO purchases (account_id, item_id, purchased_at) VALUES (?, ?, ?)",
        )
        .bind(uuid_to_blob(account_id))
        .bind(uuid_to_blob(item_id))
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(internal)?;

        tx.commit().await.map_err(internal)?;

        Ok(PurchaseReceipt {
            account_id,
            item_id,
            balance: new_balance,
        })
    }
}
