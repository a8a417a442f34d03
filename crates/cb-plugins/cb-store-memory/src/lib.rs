//! # cb-store-memory
//!
//! DashMap-backed implementation of the storage ports. Each post entry
//! holds its own reactions and comments, and each account entry its own
//! purchases and results, so the map entry's lock is the per-post /
//! per-account critical section the ledger invariants require. The
//! default store for tests and single-node deployments.

use async_trait::async_trait;
use cb_core::error::{CoreError, Result};
use cb_core::models::{
    Account, Comment, MinigameResult, Post, PostKind, PurchaseReceipt, PurchaseRecord,
    ReactionKind, ReactionReceipt, ReactionRecord, ShopItem,
};
use cb_core::rules;
use cb_core::traits::{CommunityStore, LedgerStore};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use uuid::Uuid;

struct PostEntry {
    post: Post,
    reactions: HashMap<Uuid, ReactionRecord>,
    comments: Vec<Comment>,
}

struct AccountEntry {
    account: Account,
    purchases: Vec<PurchaseRecord>,
    results: Vec<MinigameResult>,
}

#[derive(Default)]
pub struct MemoryStore {
    posts: DashMap<Uuid, PostEntry>,
    accounts: DashMap<Uuid, AccountEntry>,
    items: DashMap<Uuid, ShopItem>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a post; content authoring is out of scope for the core.
    pub fn insert_post(&self, post: Post) {
        self.posts.insert(
            post.id,
            PostEntry {
                post,
                reactions: HashMap::new(),
                comments: Vec::new(),
            },
        );
    }

    pub fn insert_account(&self, account: Account) {
        self.accounts.insert(
            account.id,
            AccountEntry {
                account,
                purchases: Vec::new(),
                results: Vec::new(),
            },
        );
    }

    pub fn insert_item(&self, item: ShopItem) {
        self.items.insert(item.id, item);
    }
}

#[async_trait]
impl CommunityStore for MemoryStore {
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|entry| entry.post.clone()))
    }

    async fn get_reaction(
        &self,
        user_id: Uuid,
        post_id: Uuid,
    ) -> Result<Option<ReactionRecord>> {
        Ok(self
            .posts
            .get(&post_id)
            .and_then(|entry| entry.reactions.get(&user_id).cloned()))
    }

    async fn apply_reaction(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: ReactionKind,
    ) -> Result<ReactionReceipt> {
        // get_mut holds the entry's shard lock: the read-modify-write of
        // record plus counters is one critical section per post.
        let mut entry = self
            .posts
            .get_mut(&post_id)
            .ok_or(CoreError::PostNotFound(post_id))?;

        let existing = entry.reactions.get(&user_id).map(|record| record.kind);
        let transition = rules::reaction_transition(existing, kind);
        let (like_delta, dislike_delta) = transition.counter_deltas(kind);

        match transition.surviving(kind) {
            None => {
                entry.reactions.remove(&user_id);
            }
            Some(surviving) => {
                entry.reactions.insert(
                    user_id,
                    ReactionRecord {
                        user_id,
                        post_id,
                        kind: surviving,
                        reacted_at: Utc::now(),
                    },
                );
            }
        }
        entry.post.likes += like_delta;
        entry.post.dislikes += dislike_delta;

        Ok(ReactionReceipt {
            post_id,
            likes: entry.post.likes,
            dislikes: entry.post.dislikes,
            current: transition.surviving(kind),
        })
    }

    async fn add_comment(&self, comment: Comment) -> Result<()> {
        let mut entry = self
            .posts
            .get_mut(&comment.post_id)
            .ok_or(CoreError::PostNotFound(comment.post_id))?;
        entry.comments.push(comment);
        Ok(())
    }

    async fn comments_for_post(
        &self,
        post_id: Uuid,
        post_kind: PostKind,
    ) -> Result<Vec<Comment>> {
        let entry = self
            .posts
            .get(&post_id)
            .ok_or(CoreError::PostNotFound(post_id))?;
        let mut comments: Vec<Comment> = entry
            .comments
            .iter()
            .filter(|comment| comment.post_kind == post_kind)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|entry| entry.account.clone()))
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<ShopItem>> {
        Ok(self.items.get(&id).map(|item| item.value().clone()))
    }

    async fn list_items(&self) -> Result<Vec<ShopItem>> {
        let mut items: Vec<ShopItem> =
            self.items.iter().map(|entry| entry.value().clone()).collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn owned_items(&self, account_id: Uuid) -> Result<Vec<ShopItem>> {
        let entry = self
            .accounts
            .get(&account_id)
            .ok_or(CoreError::AccountNotFound(account_id))?;
        Ok(entry
            .purchases
            .iter()
            .filter_map(|record| self.items.get(&record.item_id).map(|item| item.value().clone()))
            .collect())
    }

    async fn has_result(&self, player_id: Uuid, post_id: Uuid) -> Result<bool> {
        Ok(self
            .accounts
            .get(&player_id)
            .map(|entry| entry.results.iter().any(|result| result.post_id == post_id))
            .unwrap_or(false))
    }

    async fn record_result(&self, result: MinigameResult) -> Result<i64> {
        let mut entry = self
            .accounts
            .get_mut(&result.player_id)
            .ok_or(CoreError::AccountNotFound(result.player_id))?;
        entry.account.claw_marks += result.points;
        let balance = entry.account.claw_marks;
        entry.results.push(result);
        Ok(balance)
    }

    async fn purchase(&self, account_id: Uuid, item_id: Uuid) -> Result<PurchaseReceipt> {
        // Catalog entries are immutable, so the price read can happen
        // outside the account's critical section.
        let price = self
            .items
            .get(&item_id)
            .map(|item| item.price)
            .ok_or(CoreError::ItemNotFound(item_id))?;

        let mut entry = self
            .accounts
            .get_mut(&account_id)
            .ok_or(CoreError::AccountNotFound(account_id))?;

        let already_owned = entry
            .purchases
            .iter()
            .any(|record| record.item_id == item_id);
        let new_balance =
            rules::check_purchase(item_id, entry.account.claw_marks, price, already_owned)?;

        entry.account.claw_marks = new_balance;
        entry.purchases.push(PurchaseRecord {
            account_id,
            item_id,
            purchased_at: Utc::now(),
        });

        Ok(PurchaseReceipt {
            account_id,
            item_id,
            balance: new_balance,
        })
    }
}
