use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::TreeEditorSettings;
use crate::display::{
    boolean_icon, capfirst, conditional_escape, escape, ColumnKind, FieldValue, Markup,
    EMPTY_CHANGELIST_VALUE,
};
use crate::quote::quote;
use crate::traits::TreeEditorModel;

/// Closure backing a computed list column.
pub type ComputeFn<M> = Arc<dyn Fn(&M) -> Option<FieldValue> + Send + Sync>;

enum ColumnSource<M> {
    Field(ColumnKind),
    Computed {
        compute: ComputeFn<M>,
        allow_tags: bool,
        boolean: bool,
    },
}

impl<M> Clone for ColumnSource<M> {
    fn clone(&self) -> Self {
        match self {
            ColumnSource::Field(kind) => ColumnSource::Field(kind.clone()),
            ColumnSource::Computed {
                compute,
                allow_tags,
                boolean,
            } => ColumnSource::Computed {
                compute: Arc::clone(compute),
                allow_tags: *allow_tags,
                boolean: *boolean,
            },
        }
    }
}

/// One entry of the changelist's `list_display`.
pub struct ListColumn<M> {
    name: String,
    header: Option<String>,
    source: ColumnSource<M>,
}

impl<M> Clone for ListColumn<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            header: self.header.clone(),
            source: self.source.clone(),
        }
    }
}

impl<M> fmt::Debug for ListColumn<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.source {
            ColumnSource::Field(kind) => format!("{kind:?}"),
            ColumnSource::Computed { .. } => "Computed".to_string(),
        };
        f.debug_struct("ListColumn")
            .field("name", &self.name)
            .field("header", &self.header)
            .field("source", &kind)
            .finish()
    }
}

impl<M: TreeEditorModel> ListColumn<M> {
    /// A model field rendered as escaped text.
    pub fn field(name: impl Into<String>) -> Self {
        Self::field_with_kind(name, ColumnKind::Plain)
    }

    /// A model field rendered according to `kind`.
    pub fn field_with_kind(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            header: None,
            source: ColumnSource::Field(kind),
        }
    }

    /// A column computed from the model. Returning `None` renders the
    /// empty-value placeholder.
    pub fn computed<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&M) -> Option<FieldValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            header: None,
            source: ColumnSource::Computed {
                compute: Arc::new(compute),
                allow_tags: false,
                boolean: false,
            },
        }
    }

    /// The node's label, used as the default first column.
    pub fn label() -> Self {
        Self::computed("__str__", |model: &M| Some(FieldValue::Text(model.label())))
            .with_header(capfirst(M::tree_editor_config().verbose_name()))
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Trust computed output as HTML.
    pub fn allow_tags(mut self) -> Self {
        if let ColumnSource::Computed { allow_tags, .. } = &mut self.source {
            *allow_tags = true;
        }
        self
    }

    /// Render computed output as the yes/no/unknown icon.
    pub fn boolean(mut self) -> Self {
        if let ColumnSource::Computed { boolean, .. } = &mut self.source {
            *boolean = true;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> String {
        self.header
            .clone()
            .unwrap_or_else(|| capfirst(&self.name.replace('_', " ")))
    }

    fn render(&self, model: &M, settings: &TreeEditorSettings) -> Markup {
        match &self.source {
            ColumnSource::Field(kind) => match model.field_value(&self.name) {
                Some(value) => kind.render(&value, settings),
                None => Markup::plain(EMPTY_CHANGELIST_VALUE),
            },
            ColumnSource::Computed {
                compute,
                allow_tags,
                boolean,
            } => match compute(model) {
                None => Markup::plain(EMPTY_CHANGELIST_VALUE),
                Some(value) if *boolean => {
                    boolean_icon(&settings.admin_media_prefix, value.as_bool())
                }
                Some(value) if *allow_tags => Markup::safe(value.to_string()),
                Some(value) => escape(&value.to_string()),
            },
        }
    }
}

/// Header cell of the changelist table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResultHeader {
    pub name: String,
    pub text: String,
}

/// Per-request view of the list configuration.
#[derive(Clone, Debug)]
pub struct ChangeList<M> {
    title: String,
    is_popup: bool,
    to_field: Option<String>,
    list_display: Vec<ListColumn<M>>,
    list_display_links: Vec<String>,
    settings: TreeEditorSettings,
}

impl<M: TreeEditorModel> ChangeList<M> {
    pub fn new(
        list_display: Vec<ListColumn<M>>,
        list_display_links: Vec<String>,
        settings: TreeEditorSettings,
        is_popup: bool,
        to_field: Option<String>,
    ) -> Self {
        let verbose_name = M::tree_editor_config().verbose_name();
        let title = if is_popup {
            format!("Select {verbose_name}")
        } else {
            format!("Select {verbose_name} to change")
        };

        Self {
            title,
            is_popup,
            to_field,
            list_display,
            list_display_links,
            settings,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_popup(&self) -> bool {
        self.is_popup
    }

    pub fn result_headers(&self) -> Vec<ResultHeader> {
        self.list_display
            .iter()
            .map(|column| ResultHeader {
                name: column.name().to_string(),
                text: column.header(),
            })
            .collect()
    }

    /// Change-form URL, relative to the changelist.
    pub fn url_for_result(&self, model: &M) -> String {
        format!("{}/", quote(&model.id().to_string()))
    }

    fn result_id(&self, model: &M) -> String {
        self.to_field
            .as_deref()
            .and_then(|field| model.field_value(field))
            .map_or_else(|| model.id().to_string(), |value| value.to_string())
    }

    /// Rendered cells for every list column after the first; the tree
    /// itself shows the first column as the node label.
    pub fn properties(&self, model: &M) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.list_display.len().saturating_sub(1));
        let mut first = true;

        for column in self.list_display.iter().skip(1) {
            let mut repr = column.render(model, &self.settings);
            if repr.is_empty() {
                repr = Markup::safe("&nbsp;");
            }

            let is_link = (first && self.list_display_links.is_empty())
                || self.list_display_links.iter().any(|link| link == column.name());

            if is_link {
                let tag = if first { "th" } else { "td" };
                let url = self.url_for_result(model);
                let onclick = if self.is_popup {
                    format!(
                        r#" onclick="opener.dismissRelatedLookupPopup(window, {}); return false;""#,
                        attribute_safe(&js_string(&self.result_id(model)))
                    )
                } else {
                    String::new()
                };
                cells.push(format!(
                    r#"<{tag}><a href="{url}"{onclick}>{}</a></{tag}>"#,
                    conditional_escape(&repr)
                ));
            } else {
                cells.push(format!("<td>{}</td>", conditional_escape(&repr)));
            }

            first = false;
        }

        cells
    }
}

fn js_string(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => literal.push_str("\\\\"),
            '\'' => literal.push_str("\\'"),
            '\n' => literal.push_str("\\n"),
            other => literal.push(other),
        }
    }
    literal.push('\'');
    literal
}

fn attribute_safe(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
