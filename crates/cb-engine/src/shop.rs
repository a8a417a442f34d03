//! # Shop Service
//!
//! Claw-marks balance reads and the idempotent purchase flow. The
//! atomic debit-plus-ownership write lives behind the ledger port;
//! this layer adds catalog filtering and the broadcast event.

use cb_core::error::{CoreError, Result};
use cb_core::events::CommunityEvent;
use cb_core::models::{Account, PurchaseReceipt, ShopItem};
use cb_core::traits::{EventSink, LedgerStore};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ShopService {
    ledger: Arc<dyn LedgerStore>,
    events: Arc<dyn EventSink>,
}

impl ShopService {
    pub fn new(ledger: Arc<dyn LedgerStore>, events: Arc<dyn EventSink>) -> Self {
        Self { ledger, events }
    }

    pub async fn account(&self, account_id: Uuid) -> Result<Account> {
        self.ledger
            .get_account(account_id)
            .await?
            .ok_or(CoreError::AccountNotFound(account_id))
    }

    /// The catalog, optionally without the items the account already owns.
    pub async fn catalog(&self, account_id: Uuid, exclude_owned: bool) -> Result<Vec<ShopItem>> {
        let items = self.ledger.list_items().await?;
        if !exclude_owned {
            return Ok(items);
        }
        let owned: Vec<Uuid> = self
            .ledger
            .owned_items(account_id)
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect();
        Ok(items
            .into_iter()
            .filter(|item| !owned.contains(&item.id))
            .collect())
    }

    pub async fn owned(&self, account_id: Uuid) -> Result<Vec<ShopItem>> {
        self.ledger.owned_items(account_id).await
    }

    /// Buys `item_id` for `account_id`. Fails with `AlreadyOwned` or
    /// `InsufficientFunds` without any balance change; on success the
    /// debit and the ownership record land together.
    pub async fn purchase(&self, account_id: Uuid, item_id: Uuid) -> Result<PurchaseReceipt> {
        let receipt = self.ledger.purchase(account_id, item_id).await?;

        tracing::info!(
            %account_id,
            %item_id,
            balance = receipt.balance,
            "shop item purchased"
        );
        self.events.emit(CommunityEvent::ItemPurchased {
            account_id,
            item_id,
            balance: receipt.balance,
        });
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_core::traits::{MockEventSink, MockLedgerStore};

    fn item(name: &str, price: i64) -> ShopItem {
        ShopItem {
            id: Uuid::now_v7(),
            name: name.to_string(),
            price,
            media_id: None,
        }
    }

    #[tokio::test]
    async fn catalog_can_exclude_owned_items() {
        let frame = item("golden frame", 100);
        let badge = item("paw badge", 40);
        let owned = frame.clone();
        let all = vec![frame.clone(), badge.clone()];

        let mut ledger = MockLedgerStore::new();
        ledger
            .expect_list_items()
            .returning(move || Ok(all.clone()));
        ledger
            .expect_owned_items()
            .returning(move |_| Ok(vec![owned.clone()]));
        let shop = ShopService::new(Arc::new(ledger), Arc::new(MockEventSink::new()));

        let visible = shop.catalog(Uuid::now_v7(), true).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, badge.id);
    }

    #[tokio::test]
    async fn purchase_failure_emits_nothing() {
        let mut ledger = MockLedgerStore::new();
        ledger.expect_purchase().returning(|_, _| {
            Err(CoreError::InsufficientFunds {
                price: 100,
                balance: 20,
            })
        });
        let mut events = MockEventSink::new();
        events.expect_emit().never();
        let shop = ShopService::new(Arc::new(ledger), Arc::new(events));

        let err = shop
            .purchase(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientFunds { .. }));
    }

    #[tokio::test]
    async fn successful_purchase_emits_the_event() {
        let account = Uuid::now_v7();
        let wanted = Uuid::now_v7();
        let mut ledger = MockLedgerStore::new();
        ledger.expect_purchase().returning(|account_id, item_id| {
            Ok(PurchaseReceipt {
                account_id,
                item_id,
                balance: 50,
            })
        });
        let mut events = MockEventSink::new();
        events
            .expect_emit()
            .times(1)
            .withf(move |event| {
                matches!(
                    event,
                    CommunityEvent::ItemPurchased { account_id, item_id, balance: 50 }
                        if *account_id == account && *item_id == wanted
                )
            })
            .return_const(());
        let shop = ShopService::new(Arc::new(ledger), Arc::new(events));

        let receipt = shop.purchase(account, wanted).await.unwrap();
        assert_eq!(receipt.balance, 50);
    }
}
