use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dukkan_core::{DomainError, DomainResult, Entity, EntityId, OwnerId, Tombstone};

/// Transaction identifier (owner-scoped via the store).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub EntityId);

impl TransactionId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Sign of this entry's contribution to the balance.
    pub fn sign(self) -> i64 {
        match self {
            TransactionKind::Income => 1,
            TransactionKind::Expense => -1,
        }
    }
}

/// One immutable ledger entry.
///
/// Transactions never change after creation except for the tombstone flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    owner: OwnerId,
    kind: TransactionKind,
    /// Positive amount in smallest currency unit.
    amount: i64,
    description: String,
    created_at: DateTime<Utc>,
    deleted: bool,
}

impl Transaction {
    /// Validate and build a new entry.
    pub fn new(
        id: TransactionId,
        owner: OwnerId,
        kind: TransactionKind,
        amount: i64,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if amount <= 0 {
            return Err(DomainError::validation("amount must be positive"));
        }
        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::validation("description cannot be empty"));
        }

        Ok(Self {
            id,
            owner,
            kind,
            amount,
            description,
            created_at: now,
            deleted: false,
        })
    }

    pub fn id_typed(&self) -> TransactionId {
        self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// `+amount` for income, `-amount` for expense.
    pub fn signed_amount(&self) -> i64 {
        self.kind.sign() * self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn owner(&self) -> OwnerId {
        self.owner
    }
}

impl Tombstone for Transaction {
    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}
