#![allow(dead_code)]

use sea_orm::prelude::{Date, Decimal};
use sea_orm::MockExecResult;

pub mod category {
    use sea_orm::entity::prelude::*;
    use tree_editor::TreeEditorModelDerive as TreeEditorModel;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, TreeEditorModel)]
    #[sea_orm(table_name = "categories")]
    #[tree_editor(app_label = "catalog", object_name = "category", verbose_name = "category")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub parent_id: Option<i32>,
        pub tree_id: i32,
        pub lft: i32,
        pub rght: i32,
        pub level: i32,
        pub name: String,
        pub active: bool,
        pub status: String,
        pub published_on: Option<Date>,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub price: Decimal,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub fn node(
    id: i32,
    parent_id: Option<i32>,
    lft: i32,
    rght: i32,
    level: i32,
    name: &str,
) -> category::Model {
    category::Model {
        id,
        parent_id,
        tree_id: 1,
        lft,
        rght,
        level,
        name: name.to_string(),
        active: true,
        status: "p".to_string(),
        published_on: Date::from_ymd_opt(2009, 3, 7),
        price: Decimal::new(1999, 2),
    }
}

/// Root "Books" with children "Fiction" and "Poetry".
pub fn sample_tree() -> Vec<category::Model> {
    vec![
        node(1, None, 1, 6, 0, "Books"),
        node(2, Some(1), 2, 3, 1, "Fiction"),
        node(3, Some(1), 4, 5, 1, "Poetry"),
    ]
}

pub fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}
