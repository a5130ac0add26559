use std::fmt::{Debug, Display};
use std::str::FromStr;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, EntityTrait, FromQueryResult, IntoActiveModel, Value,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::TreeEditorConfig;
use crate::display::FieldValue;

/// Trait implemented by SeaORM `Model` types stored as a nested set and
/// editable through the tree editor.
///
/// Implementations are normally provided by the `#[derive(TreeEditorModel)]` macro.
pub trait TreeEditorModel:
    Clone + Send + Sync + 'static + IntoActiveModel<Self::ActiveModel> + FromQueryResult
{
    type Entity: EntityTrait<Model = Self>;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;
    type Id: Clone
        + Debug
        + Display
        + FromStr
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    fn tree_editor_config() -> &'static TreeEditorConfig;

    fn id(&self) -> Self::Id;
    fn parent_id(&self) -> Option<Self::Id>;
    fn tree_id(&self) -> i32;
    fn left(&self) -> i32;
    fn right(&self) -> i32;
    fn level(&self) -> i32;

    /// Text shown for the node in the tree.
    fn label(&self) -> String;

    /// Read a model field by column name for list rendering.
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    fn id_to_value(id: &Self::Id) -> Value;
    fn parent_to_value(parent: Option<&Self::Id>) -> Value;

    fn id_column() -> <Self::Entity as EntityTrait>::Column;
    fn parent_column() -> <Self::Entity as EntityTrait>::Column;
    fn tree_id_column() -> <Self::Entity as EntityTrait>::Column;
    fn left_column() -> <Self::Entity as EntityTrait>::Column;
    fn right_column() -> <Self::Entity as EntityTrait>::Column;
    fn level_column() -> <Self::Entity as EntityTrait>::Column;
}
