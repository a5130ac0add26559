//! The changelist view replacement: tree rendering plus the two AJAX
//! commands the drag-and-drop client sends back.

use std::collections::BTreeMap;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::changelist::{ChangeList, ListColumn, ResultHeader};
use crate::config::TreeEditorSettings;
use crate::error::TreeEditorError;
use crate::repository::TreeEditorRepository;
use crate::traits::TreeEditorModel;
use crate::tree::parse_tree;

/// Query parameter flagging a redirect caused by bad lookup parameters.
pub const ERROR_FLAG: &str = "e";
/// Query parameter marking a related-object lookup popup.
pub const IS_POPUP_VAR: &str = "pop";
/// Query parameter naming the field a popup returns instead of the pk.
pub const TO_FIELD_VAR: &str = "t";

/// POST field carrying the AJAX command.
pub const COMMAND_PARAM: &str = "__cmd";

/// Header the editor's script sets on its AJAX calls.
pub const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Incoming admin request, reduced to what the tree editor reads.
#[derive(Clone, Debug, Default)]
pub struct AdminRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub get: BTreeMap<String, String>,
    pub post: BTreeMap<String, String>,
}

impl AdminRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.get.insert(key.into(), value.into());
        self
    }

    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.post.insert(key.into(), value.into());
        self
    }

    /// Mark the request as sent by the editor's script.
    pub fn ajax(self) -> Self {
        self.header(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"))
    }

    pub fn is_ajax(&self) -> bool {
        self.headers
            .get(&X_REQUESTED_WITH)
            .is_some_and(|value| value == "XMLHttpRequest")
    }
}

/// The admin site the editor is mounted in: permission policy and query
/// validation stay with it.
#[async_trait]
pub trait AdminSite: Send + Sync {
    /// Prefix every admin URL hangs off.
    fn root_path(&self) -> &str {
        "/admin/"
    }

    async fn has_change_permission(&self, _request: &AdminRequest) -> bool {
        true
    }

    async fn has_add_permission(&self, _request: &AdminRequest) -> bool {
        true
    }

    async fn has_delete_permission(&self, _request: &AdminRequest) -> bool {
        true
    }

    /// Reject filter/search parameters the site cannot apply.
    fn check_lookup_parameters(
        &self,
        _params: &BTreeMap<String, String>,
    ) -> Result<(), TreeEditorError> {
        Ok(())
    }
}

/// Site with every default: all permissions granted, any lookup accepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenAdminSite;

#[async_trait]
impl AdminSite for OpenAdminSite {}

/// What the embedding web layer should send back.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeEditorResponse {
    Text {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },
    Redirect {
        location: String,
    },
    /// Render the first template that exists with the given context.
    Render {
        templates: Vec<String>,
        context: Map<String, JsonValue>,
    },
}

impl TreeEditorResponse {
    fn ok() -> Self {
        Self::text("OK")
    }

    fn text(body: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        TreeEditorResponse::Text {
            status: StatusCode::OK,
            headers,
            body: body.into(),
        }
    }
}

/// One node of the rendered tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeRow<Id> {
    pub id: Id,
    pub label: String,
    pub url: String,
    pub tree_id: i32,
    pub parent_id: Option<Id>,
    pub left: i32,
    pub right: i32,
    pub level: i32,
    pub cells: Vec<String>,
}

#[derive(Serialize)]
struct ChangelistContext<'a, Id> {
    #[serde(rename = "EDITOR_ADMIN_MEDIA")]
    editor_media: &'a str,
    title: &'a str,
    is_popup: bool,
    has_add_permission: bool,
    root_path: &'a str,
    app_label: &'a str,
    result_headers: Vec<ResultHeader>,
    object_list: Vec<TreeRow<Id>>,
}

/// Tree-aware changelist for one model.
pub struct TreeEditor<M>
where
    M: TreeEditorModel,
{
    repository: TreeEditorRepository<M>,
    list_display: Vec<ListColumn<M>>,
    list_display_links: Vec<String>,
    settings: TreeEditorSettings,
}

impl<M> Default for TreeEditor<M>
where
    M: TreeEditorModel,
{
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<M> TreeEditor<M>
where
    M: TreeEditorModel,
{
    /// Build an editor showing `list_display`. The first column becomes the
    /// node label in the tree; an empty list shows just the label.
    ///
    /// Settings are read from the process environment; see
    /// [`TreeEditorSettings::from_env`].
    pub fn new(list_display: Vec<ListColumn<M>>) -> Self {
        let list_display = if list_display.is_empty() {
            vec![ListColumn::label()]
        } else {
            list_display
        };

        Self {
            repository: TreeEditorRepository::new(),
            list_display,
            list_display_links: Vec::new(),
            settings: TreeEditorSettings::from_env(),
        }
    }

    pub fn with_list_display_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list_display_links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_settings(mut self, settings: TreeEditorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &TreeEditorSettings {
        &self.settings
    }

    /// Changelist state for this request.
    pub fn changelist(&self, request: &AdminRequest) -> ChangeList<M> {
        ChangeList::new(
            self.list_display.clone(),
            self.list_display_links.clone(),
            self.settings.clone(),
            request.get.contains_key(IS_POPUP_VAR),
            request.get.get(TO_FIELD_VAR).cloned(),
        )
    }

    /// Entry point replacing the stock changelist view.
    pub async fn changelist_view<S>(
        &self,
        conn: &DatabaseConnection,
        site: &S,
        request: &AdminRequest,
        extra_context: Option<Map<String, JsonValue>>,
    ) -> Result<TreeEditorResponse, TreeEditorError>
    where
        S: AdminSite + ?Sized,
    {
        if request.is_ajax() {
            return self.handle_ajax(conn, site, request).await;
        }

        if !site.has_change_permission(request).await {
            return Err(TreeEditorError::PermissionDenied);
        }

        let lookups: BTreeMap<String, String> = request
            .get
            .iter()
            .filter(|(key, _)| {
                !matches!(key.as_str(), ERROR_FLAG | IS_POPUP_VAR | TO_FIELD_VAR)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if let Err(err) = site.check_lookup_parameters(&lookups) {
            debug!(path = %request.path, error = %err, "rejected changelist lookup");
            if request.get.contains_key(ERROR_FLAG) {
                let mut context = Map::new();
                context.insert("title".into(), JsonValue::from("Database error"));
                return Ok(TreeEditorResponse::Render {
                    templates: vec!["admin/invalid_setup.html".to_string()],
                    context,
                });
            }
            return Ok(TreeEditorResponse::Redirect {
                location: format!("{}?{}=1", request.path, ERROR_FLAG),
            });
        }

        let changelist = self.changelist(request);
        let config = M::tree_editor_config();
        let object_list = self.object_list(conn, &changelist).await?;

        let context = ChangelistContext {
            editor_media: &self.settings.editor_media,
            title: changelist.title(),
            is_popup: changelist.is_popup(),
            has_add_permission: site.has_add_permission(request).await,
            root_path: site.root_path(),
            app_label: config.app_label(),
            result_headers: changelist.result_headers(),
            object_list,
        };

        let mut context = match serde_json::to_value(context)? {
            JsonValue::Object(map) => map,
            _ => return Err(TreeEditorError::invariant("changelist context is not a map")),
        };
        if let Some(extra) = extra_context {
            context.extend(extra);
        }

        Ok(TreeEditorResponse::Render {
            templates: template_names(config.app_label(), config.object_name()),
            context,
        })
    }

    /// Every node in tree order with its label and rendered cells.
    pub async fn object_list(
        &self,
        conn: &DatabaseConnection,
        changelist: &ChangeList<M>,
    ) -> Result<Vec<TreeRow<M::Id>>, TreeEditorError> {
        let nodes = self.repository.nodes(conn).await?;
        Ok(nodes
            .iter()
            .map(|node| TreeRow {
                id: node.id(),
                label: node.label(),
                url: changelist.url_for_result(node),
                tree_id: node.tree_id(),
                parent_id: node.parent_id(),
                left: node.left(),
                right: node.right(),
                level: node.level(),
                cells: changelist.properties(node),
            })
            .collect())
    }

    async fn handle_ajax<S>(
        &self,
        conn: &DatabaseConnection,
        site: &S,
        request: &AdminRequest,
    ) -> Result<TreeEditorResponse, TreeEditorError>
    where
        S: AdminSite + ?Sized,
    {
        match request.post.get(COMMAND_PARAM).map(String::as_str) {
            Some("save_tree") => self.save_tree(conn, site, request).await,
            Some("delete_item") => self.delete_item(conn, site, request).await,
            other => {
                debug!(command = ?other, "unrecognised tree editor command");
                Ok(TreeEditorResponse::text("Oops. AJAX request not understood."))
            }
        }
    }

    async fn save_tree<S>(
        &self,
        conn: &DatabaseConnection,
        site: &S,
        request: &AdminRequest,
    ) -> Result<TreeEditorResponse, TreeEditorError>
    where
        S: AdminSite + ?Sized,
    {
        if !site.has_change_permission(request).await {
            return Err(TreeEditorError::PermissionDenied);
        }

        let raw = request
            .post
            .get("tree")
            .ok_or(TreeEditorError::MissingParameter("tree"))?;
        let updates = parse_tree::<M::Id>(raw)?;
        self.repository.save_tree(conn, &updates).await?;

        Ok(TreeEditorResponse::ok())
    }

    async fn delete_item<S>(
        &self,
        conn: &DatabaseConnection,
        site: &S,
        request: &AdminRequest,
    ) -> Result<TreeEditorResponse, TreeEditorError>
    where
        S: AdminSite + ?Sized,
    {
        if !site.has_delete_permission(request).await {
            return Err(TreeEditorError::PermissionDenied);
        }

        let item_id = request
            .post
            .get("item_id")
            .ok_or(TreeEditorError::MissingParameter("item_id"))?;
        self.repository.delete_item(conn, item_id).await?;

        Ok(TreeEditorResponse::ok())
    }
}

/// Most specific first: per-model, per-app, then the editor's default.
pub fn template_names(app_label: &str, object_name: &str) -> Vec<String> {
    let object_name = object_name.to_lowercase();
    vec![
        format!("admin/{app_label}/{object_name}/tree_editor.html"),
        format!("admin/{app_label}/tree_editor.html"),
        "admin/editor/tree_editor.html".to_string(),
    ]
}
