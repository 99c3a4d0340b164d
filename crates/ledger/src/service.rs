//! Financial ledger service: append entries, derive the balance.

use chrono::Utc;

use dukkan_core::{DomainError, DomainResult, EntityId, OwnerId, Tombstone};
use dukkan_store::{RecordStore, UpdateOutcome};

use crate::transaction::{Transaction, TransactionId, TransactionKind};

/// Aggregated view over non-deleted transactions.
///
/// Recomputed on every call rather than cached: transaction volume is small
/// and a derived value cannot drift from the rows it summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceSummary {
    pub total_income: i64,
    pub total_expense: i64,
    /// `total_income - total_expense`; negative when expenses dominate.
    pub net: i64,
}

/// Ledger service over a transaction record store.
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
}

impl<S> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> Ledger<S>
where
    S: RecordStore<TransactionId, Transaction>,
{
    pub fn record(
        &self,
        owner: OwnerId,
        kind: TransactionKind,
        amount: i64,
        description: impl Into<String>,
    ) -> DomainResult<Transaction> {
        let now = Utc::now();
        let id = TransactionId::new(EntityId::new());
        let transaction = Transaction::new(id, owner, kind, amount, description, now)?;

        self.store
            .insert(owner, id, transaction.clone())
            .map_err(DomainError::from)?;

        tracing::info!(transaction_id = %id, owner = %owner, ?kind, amount, "transaction recorded");
        Ok(transaction)
    }

    /// Active transactions, newest first, optionally filtered by kind.
    pub fn list(
        &self,
        owner: OwnerId,
        kind: Option<TransactionKind>,
    ) -> DomainResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .store
            .list(owner)
            .map_err(DomainError::from)?
            .into_iter()
            .filter(|t| !t.is_deleted())
            .filter(|t| kind.is_none_or(|k| t.kind() == k))
            .collect();

        transactions.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(transactions)
    }

    /// Balance over all non-deleted transactions.
    pub fn balance(&self, owner: OwnerId) -> DomainResult<BalanceSummary> {
        let mut income: i128 = 0;
        let mut expense: i128 = 0;

        for transaction in self.store.list(owner).map_err(DomainError::from)? {
            if transaction.is_deleted() {
                continue;
            }
            match transaction.kind() {
                TransactionKind::Income => income += transaction.amount() as i128,
                TransactionKind::Expense => expense += transaction.amount() as i128,
            }
        }

        Ok(BalanceSummary {
            total_income: clamp_to_i64(income),
            total_expense: clamp_to_i64(expense),
            net: clamp_to_i64(income - expense),
        })
    }

    /// Tombstone a transaction; it stops counting toward the balance.
    pub fn soft_delete(&self, owner: OwnerId, id: TransactionId) -> DomainResult<()> {
        match self.store.update_with(owner, &id, |t| {
            if t.is_deleted() {
                return Err(DomainError::not_found());
            }
            t.set_deleted(true);
            Ok(())
        })? {
            UpdateOutcome::Updated(_) => Ok(()),
            UpdateOutcome::Missing => Err(DomainError::not_found()),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    /// Clear a tombstone; the entry counts toward the balance again.
    pub fn restore(&self, owner: OwnerId, id: TransactionId) -> DomainResult<()> {
        match self.store.update_with(owner, &id, |t| {
            if !t.is_deleted() {
                return Err(DomainError::not_found());
            }
            t.set_deleted(false);
            Ok(())
        })? {
            UpdateOutcome::Updated(_) => Ok(()),
            UpdateOutcome::Missing => Err(DomainError::not_found()),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    /// Irreversibly remove an already-tombstoned transaction.
    pub fn purge(&self, owner: OwnerId, id: TransactionId) -> DomainResult<()> {
        let existing = self
            .store
            .get(owner, &id)
            .map_err(DomainError::from)?
            .ok_or_else(DomainError::not_found)?;

        if !existing.is_deleted() {
            return Err(DomainError::conflict(
                "cannot purge an active transaction; delete it first",
            ));
        }

        if self.store.remove(owner, &id).map_err(DomainError::from)? {
            Ok(())
        } else {
            Err(DomainError::not_found())
        }
    }

    /// Tombstoned transactions, newest first.
    pub fn list_trashed(&self, owner: OwnerId) -> DomainResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .store
            .list(owner)
            .map_err(DomainError::from)?
            .into_iter()
            .filter(Tombstone::is_deleted)
            .collect();

        transactions.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(transactions)
    }
}

fn clamp_to_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use dukkan_store::InMemoryRecordStore;
    use proptest::prelude::*;

    fn service() -> Ledger<InMemoryRecordStore<TransactionId, Transaction>> {
        Ledger::new(InMemoryRecordStore::new())
    }

    fn test_owner() -> OwnerId {
        OwnerId::new()
    }

    #[test]
    fn record_rejects_invalid_entries_without_writing() {
        let ledger = service();
        let owner = test_owner();

        assert!(ledger
            .record(owner, TransactionKind::Income, 0, "nothing")
            .is_err());
        assert!(ledger
            .record(owner, TransactionKind::Expense, 500, "  ")
            .is_err());

        assert!(ledger.list(owner, None).unwrap().is_empty());
        assert_eq!(ledger.balance(owner).unwrap(), BalanceSummary::default());
    }

    #[test]
    fn balance_tracks_deletes_and_restores() {
        let ledger = service();
        let owner = test_owner();

        ledger
            .record(owner, TransactionKind::Income, 100_000, "Sold dresses")
            .unwrap();
        let expense = ledger
            .record(owner, TransactionKind::Expense, 40_000, "Raw materials")
            .unwrap();

        assert_eq!(ledger.balance(owner).unwrap().net, 60_000);

        ledger.soft_delete(owner, expense.id_typed()).unwrap();
        let summary = ledger.balance(owner).unwrap();
        assert_eq!(summary.net, 100_000);
        assert_eq!(summary.total_expense, 0);

        ledger.restore(owner, expense.id_typed()).unwrap();
        assert_eq!(ledger.balance(owner).unwrap().net, 60_000);
    }

    #[test]
    fn balance_can_go_negative() {
        let ledger = service();
        let owner = test_owner();

        ledger
            .record(owner, TransactionKind::Expense, 500_000, "Machinery")
            .unwrap();

        let summary = ledger.balance(owner).unwrap();
        assert_eq!(summary.net, -500_000);
        assert_eq!(summary.total_income, 0);
        assert_eq!(summary.total_expense, 500_000);
    }

    #[test]
    fn list_is_newest_first_and_filterable() {
        let ledger = service();
        let owner = test_owner();

        ledger
            .record(owner, TransactionKind::Income, 1_000, "first")
            .unwrap();
        ledger
            .record(owner, TransactionKind::Expense, 2_000, "second")
            .unwrap();
        ledger
            .record(owner, TransactionKind::Income, 3_000, "third")
            .unwrap();

        let all = ledger.list(owner, None).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].created_at() >= w[1].created_at()));

        let income = ledger.list(owner, Some(TransactionKind::Income)).unwrap();
        assert_eq!(income.len(), 2);
        assert!(income.iter().all(|t| t.kind() == TransactionKind::Income));
    }

    #[test]
    fn deleted_entries_surface_only_in_trash() {
        let ledger = service();
        let owner = test_owner();

        let entry = ledger
            .record(owner, TransactionKind::Income, 1_000, "Sold a handbag")
            .unwrap();
        ledger.soft_delete(owner, entry.id_typed()).unwrap();

        assert!(ledger.list(owner, None).unwrap().is_empty());
        let trashed = ledger.list_trashed(owner).unwrap();
        assert_eq!(trashed.len(), 1);
        assert_eq!(trashed[0].id_typed(), entry.id_typed());
    }

    #[test]
    fn purge_is_terminal_and_guarded() {
        let ledger = service();
        let owner = test_owner();

        let entry = ledger
            .record(owner, TransactionKind::Income, 1_000, "Sold a handbag")
            .unwrap();

        assert!(matches!(
            ledger.purge(owner, entry.id_typed()).unwrap_err(),
            DomainError::Conflict(_)
        ));

        ledger.soft_delete(owner, entry.id_typed()).unwrap();
        ledger.purge(owner, entry.id_typed()).unwrap();
        assert_eq!(
            ledger.purge(owner, entry.id_typed()).unwrap_err(),
            DomainError::NotFound
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any interleaving of inserts and soft-deletes, the
        /// balance equals the straightforward fold over surviving entries.
        #[test]
        fn balance_matches_reference_fold(
            entries in prop::collection::vec((prop::bool::ANY, 1i64..1_000_000, prop::bool::ANY), 1..20)
        ) {
            let ledger = service();
            let owner = test_owner();

            let mut expected_income: i64 = 0;
            let mut expected_expense: i64 = 0;

            for (is_income, amount, delete_it) in entries {
                let kind = if is_income {
                    TransactionKind::Income
                } else {
                    TransactionKind::Expense
                };
                let entry = ledger.record(owner, kind, amount, "entry").unwrap();

                if delete_it {
                    ledger.soft_delete(owner, entry.id_typed()).unwrap();
                } else if is_income {
                    expected_income += amount;
                } else {
                    expected_expense += amount;
                }
            }

            let summary = ledger.balance(owner).unwrap();
            prop_assert_eq!(summary.total_income, expected_income);
            prop_assert_eq!(summary.total_expense, expected_expense);
            prop_assert_eq!(summary.net, expected_income - expected_expense);
        }
    }
}
