use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, Statement,
    TransactionTrait, Value,
};

use crate::config::AdvisoryLockStrategy;
use crate::error::TreeEditorError;

/// A transaction that, on PostgreSQL, also holds the table's advisory lock
/// so two concurrent tree saves cannot interleave their row updates.
///
/// The lock is transaction-scoped: PostgreSQL drops it on commit and on
/// rollback, including when the transaction was aborted by a failed
/// statement.
pub struct LockedTransaction {
    txn: DatabaseTransaction,
}

impl LockedTransaction {
    pub async fn acquire(
        strategy: &AdvisoryLockStrategy,
        db: &DatabaseConnection,
    ) -> Result<Self, TreeEditorError> {
        let key = match strategy {
            AdvisoryLockStrategy::Namespaced(key)
                if db.get_database_backend() == DbBackend::Postgres =>
            {
                Some(key.as_str())
            }
            _ => None,
        };

        let txn = db.begin().await?;

        if let Some(key) = key {
            if let Err(err) = acquire_lock(&txn, key).await {
                let _ = txn.rollback().await;
                return Err(err);
            }
        }

        Ok(Self { txn })
    }

    pub fn connection(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub async fn commit(self) -> Result<(), TreeEditorError> {
        self.txn.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), TreeEditorError> {
        self.txn.rollback().await?;
        Ok(())
    }
}

async fn acquire_lock(txn: &DatabaseTransaction, key: &str) -> Result<(), TreeEditorError> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtext($1), 0)",
        vec![Value::from(key)],
    ))
    .await?;
    Ok(())
}
