//! Drag-and-drop tree editing for nested-set (MPTT) tables behind an admin
//! changelist.
//!
//! The browser reorders the tree and recomputes every node's nested-set
//! position; this crate renders the tree, replays the posted positions into
//! the database as one transactional bulk update, and deletes single nodes
//! through SeaORM so the model's own hooks keep the tree consistent.

pub mod changelist;
pub mod config;
pub mod dateformat;
pub mod display;
pub mod editor;
pub mod error;
pub mod lock;
pub mod quote;
pub mod repository;
pub mod traits;
pub mod tree;

pub mod prelude {
    //! Convenient re-exports for consumers.
    pub use crate::changelist::ListColumn;
    pub use crate::config::{TreeEditorConfig, TreeEditorOptions, TreeEditorSettings};
    pub use crate::display::{ColumnKind, FieldValue};
    pub use crate::editor::{AdminRequest, AdminSite, TreeEditor, TreeEditorResponse};
    pub use crate::traits::TreeEditorModel;
}

#[doc(hidden)]
pub mod __private {
    pub use once_cell;
}

pub use changelist::{ChangeList, ListColumn, ResultHeader};
pub use config::{
    AdvisoryLockKey, AdvisoryLockStrategy, TreeEditorConfig, TreeEditorOptions,
    TreeEditorSettings,
};
pub use display::{ColumnKind, FieldValue, Markup, EMPTY_CHANGELIST_VALUE};
pub use editor::{
    AdminRequest, AdminSite, OpenAdminSite, TreeEditor, TreeEditorResponse, TreeRow,
    X_REQUESTED_WITH,
};
pub use error::TreeEditorError;
pub use repository::{SaveTreeOutcome, TreeEditorRepository};
pub use traits::TreeEditorModel;
pub use tree::{parse_tree, TreeNodeUpdate};
pub use tree_editor_macros::TreeEditorModel as TreeEditorModelDerive;
