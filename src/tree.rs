//! The flattened tree posted back by the drag-and-drop client.
//!
//! The client reorders nodes in the browser, recomputes every nested-set
//! position and posts the whole tree as a JSON array of positional tuples:
//! `[tree_id, parent_id, left, right, level, item_id]`.

use std::collections::HashSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::TreeEditorError;

/// New nested-set position for one row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "(i32, Option<Id>, i32, i32, i32, Id)",
    into = "(i32, Option<Id>, i32, i32, i32, Id)",
    bound(
        serialize = "Id: Serialize + Clone",
        deserialize = "Id: Deserialize<'de>"
    )
)]
pub struct TreeNodeUpdate<Id: Clone> {
    pub tree_id: i32,
    pub parent_id: Option<Id>,
    pub left: i32,
    pub right: i32,
    pub level: i32,
    pub item_id: Id,
}

impl<Id: Clone> From<(i32, Option<Id>, i32, i32, i32, Id)> for TreeNodeUpdate<Id> {
    fn from(
        (tree_id, parent_id, left, right, level, item_id): (i32, Option<Id>, i32, i32, i32, Id),
    ) -> Self {
        Self {
            tree_id,
            parent_id,
            left,
            right,
            level,
            item_id,
        }
    }
}

impl<Id: Clone> From<TreeNodeUpdate<Id>> for (i32, Option<Id>, i32, i32, i32, Id) {
    fn from(update: TreeNodeUpdate<Id>) -> Self {
        (
            update.tree_id,
            update.parent_id,
            update.left,
            update.right,
            update.level,
            update.item_id,
        )
    }
}

/// Decode and sanity-check the `tree` parameter.
pub fn parse_tree<Id>(raw: &str) -> Result<Vec<TreeNodeUpdate<Id>>, TreeEditorError>
where
    Id: Clone + Display + for<'de> Deserialize<'de>,
{
    let updates: Vec<TreeNodeUpdate<Id>> = serde_json::from_str(raw)?;
    validate(&updates)?;
    Ok(updates)
}

/// Check each row against the nested-set invariants.
pub fn validate<Id>(updates: &[TreeNodeUpdate<Id>]) -> Result<(), TreeEditorError>
where
    Id: Clone + Display,
{
    let mut seen = HashSet::with_capacity(updates.len());

    for (index, update) in updates.iter().enumerate() {
        if update.left < 1 {
            return Err(TreeEditorError::inconsistent(index, "left bound must be at least 1"));
        }
        if update.left >= update.right {
            return Err(TreeEditorError::inconsistent(
                index,
                format!(
                    "left bound {} is not below right bound {}",
                    update.left, update.right
                ),
            ));
        }
        if (update.right - update.left) % 2 == 0 {
            return Err(TreeEditorError::inconsistent(
                index,
                "bounds must enclose an even number of descendant slots",
            ));
        }
        if update.level < 0 {
            return Err(TreeEditorError::inconsistent(index, "level is negative"));
        }
        if (update.level == 0) != update.parent_id.is_none() {
            return Err(TreeEditorError::inconsistent(
                index,
                "only root nodes may sit at level 0 without a parent",
            ));
        }
        if !seen.insert(update.item_id.to_string()) {
            return Err(TreeEditorError::inconsistent(
                index,
                format!("item {} appears more than once", update.item_id),
            ));
        }
    }

    Ok(())
}
