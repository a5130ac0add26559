use std::marker::PhantomData;

use sea_orm::sea_query::Expr;
use sea_orm::{
    entity::prelude::*, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder,
};
use tracing::{info, warn};

use crate::config::TreeEditorConfig;
use crate::error::TreeEditorError;
use crate::lock::LockedTransaction;
use crate::quote::unquote;
use crate::traits::TreeEditorModel;
use crate::tree::TreeNodeUpdate;

/// Result of persisting a reordered tree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SaveTreeOutcome {
    /// Rows the client submitted.
    pub submitted: usize,
    /// Rows the database reported as changed.
    pub updated: u64,
}

/// Repository exposing the database side of the tree editor for a given model.
#[derive(Debug, Default)]
pub struct TreeEditorRepository<M>
where
    M: TreeEditorModel,
{
    _marker: PhantomData<M>,
}

impl<M> TreeEditorRepository<M>
where
    M: TreeEditorModel,
{
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn config(&self) -> &'static TreeEditorConfig {
        M::tree_editor_config()
    }

    /// Every node in tree order: by tree, then by left bound.
    pub async fn nodes(&self, conn: &DatabaseConnection) -> Result<Vec<M>, TreeEditorError> {
        let rows = M::Entity::find()
            .order_by_asc(M::tree_id_column())
            .order_by_asc(M::left_column())
            .all(conn)
            .await?;
        Ok(rows)
    }

    /// Write the client-computed positions back in one transaction.
    ///
    /// Rows are applied in the order given. A row whose item no longer exists
    /// is logged and skipped; any database error rolls the whole save back.
    pub async fn save_tree(
        &self,
        conn: &DatabaseConnection,
        updates: &[TreeNodeUpdate<M::Id>],
    ) -> Result<SaveTreeOutcome, TreeEditorError> {
        if updates.is_empty() {
            return Ok(SaveTreeOutcome::default());
        }

        let strategy = self.config().advisory_lock_strategy().clone();
        let guard = LockedTransaction::acquire(&strategy, conn).await?;

        match self.apply_updates(guard.connection(), updates).await {
            Ok(outcome) => {
                guard.commit().await?;
                info!(
                    table = self.config().table_name(),
                    submitted = outcome.submitted,
                    updated = outcome.updated,
                    "saved tree"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(table = self.config().table_name(), error = %err, "rolling back tree save");
                let _ = guard.rollback().await;
                Err(err)
            }
        }
    }

    /// Delete one node, addressed by its admin-quoted primary key.
    ///
    /// The delete goes through the active model so `ActiveModelBehavior`
    /// hooks (where tree rebalancing lives) run inside the same transaction.
    pub async fn delete_item(
        &self,
        conn: &DatabaseConnection,
        quoted_pk: &str,
    ) -> Result<M, TreeEditorError> {
        let raw = unquote(quoted_pk);
        let id: M::Id = raw
            .parse()
            .map_err(|_| TreeEditorError::InvalidPrimaryKey(raw.clone()))?;

        let strategy = self.config().advisory_lock_strategy().clone();
        let guard = LockedTransaction::acquire(&strategy, conn).await?;

        match self.delete_on(guard.connection(), &id).await {
            Ok(model) => {
                guard.commit().await?;
                info!(table = self.config().table_name(), id = %id, "deleted tree node");
                Ok(model)
            }
            Err(err) => {
                let _ = guard.rollback().await;
                Err(err)
            }
        }
    }

    async fn apply_updates<C: ConnectionTrait>(
        &self,
        conn: &C,
        updates: &[TreeNodeUpdate<M::Id>],
    ) -> Result<SaveTreeOutcome, TreeEditorError> {
        let mut outcome = SaveTreeOutcome {
            submitted: updates.len(),
            updated: 0,
        };

        for update in updates {
            let result = M::Entity::update_many()
                .col_expr(M::tree_id_column(), Expr::value(update.tree_id))
                .col_expr(
                    M::parent_column(),
                    Expr::value(M::parent_to_value(update.parent_id.as_ref())),
                )
                .col_expr(M::left_column(), Expr::value(update.left))
                .col_expr(M::right_column(), Expr::value(update.right))
                .col_expr(M::level_column(), Expr::value(update.level))
                .filter(M::id_column().eq(M::id_to_value(&update.item_id)))
                .exec(conn)
                .await?;

            if result.rows_affected == 0 {
                warn!(
                    table = self.config().table_name(),
                    item = %update.item_id,
                    "tree row matched no record"
                );
            }
            outcome.updated += result.rows_affected;
        }

        Ok(outcome)
    }

    async fn delete_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &M::Id,
    ) -> Result<M, TreeEditorError> {
        let model = M::Entity::find()
            .filter(M::id_column().eq(M::id_to_value(id)))
            .one(conn)
            .await?
            .ok_or_else(|| TreeEditorError::ObjectNotFound(id.to_string()))?;

        let result = model.clone().into_active_model().delete(conn).await?;
        if result.rows_affected == 0 {
            return Err(TreeEditorError::ObjectNotFound(id.to_string()));
        }

        Ok(model)
    }
}
