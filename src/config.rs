use crc32fast::Hasher;

/// Default URL prefix for the editor's static assets (scripts, icons).
pub const DEFAULT_EDITOR_MEDIA: &str = "/media/editor/";

/// Default URL prefix for the stock admin media.
pub const DEFAULT_ADMIN_MEDIA_PREFIX: &str = "/media/";

pub const DEFAULT_DATE_FORMAT: &str = "N j, Y";
pub const DEFAULT_DATETIME_FORMAT: &str = "N j, Y, P";
pub const DEFAULT_TIME_FORMAT: &str = "P";

/// Static configuration naming a tree model for templates, titles and
/// the advisory lock. Column handles come from the model itself.
#[derive(Clone, Debug)]
pub struct TreeEditorConfig {
    table_name: String,
    app_label: String,
    object_name: String,
    verbose_name: String,
    advisory_lock_strategy: AdvisoryLockStrategy,
}

impl TreeEditorConfig {
    /// Create a configuration for the given table. Names default to the
    /// table name; the advisory lock is on.
    pub fn new(app_label: impl Into<String>, table_name: impl Into<String>) -> Self {
        let app_label = app_label.into();
        let table_name = table_name.into();

        let default_lock = AdvisoryLockStrategy::Namespaced(AdvisoryLockKey::derived_from(
            &app_label,
            &table_name,
        ));

        Self {
            object_name: table_name.clone(),
            verbose_name: table_name.replace('_', " "),
            table_name,
            app_label,
            advisory_lock_strategy: default_lock,
        }
    }

    /// Merge options produced by [`TreeEditorOptions`].
    pub(crate) fn apply_options(mut self, options: TreeEditorOptions) -> Self {
        if let Some(object_name) = options.object_name {
            self.object_name = object_name;
        }
        if let Some(verbose_name) = options.verbose_name {
            self.verbose_name = verbose_name;
        }
        if let Some(strategy) = options.advisory_lock_strategy {
            self.advisory_lock_strategy = strategy;
        }
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Application label used for template lookup.
    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    /// Lower-case model name used for template lookup.
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Human-readable singular name shown in the changelist title.
    pub fn verbose_name(&self) -> &str {
        &self.verbose_name
    }

    /// Advisory lock strategy (PostgreSQL only).
    pub fn advisory_lock_strategy(&self) -> &AdvisoryLockStrategy {
        &self.advisory_lock_strategy
    }
}

/// Builder-style options consumed by the derive macro.
#[derive(Clone, Debug, Default)]
pub struct TreeEditorOptions {
    object_name: Option<String>,
    verbose_name: Option<String>,
    advisory_lock_strategy: Option<AdvisoryLockStrategy>,
}

impl TreeEditorOptions {
    pub fn object_name(mut self, value: impl Into<String>) -> Self {
        self.object_name = Some(value.into());
        self
    }

    pub fn verbose_name(mut self, value: impl Into<String>) -> Self {
        self.verbose_name = Some(value.into());
        self
    }

    pub fn advisory_lock_strategy(mut self, strategy: AdvisoryLockStrategy) -> Self {
        self.advisory_lock_strategy = Some(strategy);
        self
    }

    pub fn apply(self, base: TreeEditorConfig) -> TreeEditorConfig {
        base.apply_options(self)
    }
}

/// Key used for PostgreSQL advisory locks.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AdvisoryLockKey(String);

impl AdvisoryLockKey {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn derived_from(app_label: &str, table: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(app_label.as_bytes());
        hasher.update(b".");
        hasher.update(table.as_bytes());
        let crc = hasher.finalize();
        Self(format!("tree-editor::{app_label}::{table}::{crc:x}"))
    }
}

/// Configuration describing how tree saves are serialized.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AdvisoryLockStrategy {
    Disabled,
    Namespaced(AdvisoryLockKey),
}

impl AdvisoryLockStrategy {
    pub fn key(&self) -> Option<&AdvisoryLockKey> {
        match self {
            AdvisoryLockStrategy::Disabled => None,
            AdvisoryLockStrategy::Namespaced(key) => Some(key),
        }
    }
}

/// Process-wide presentation settings shared by every tree editor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeEditorSettings {
    /// Prefix for the editor's own scripts and stylesheets.
    pub editor_media: String,
    /// Prefix for stock admin media; boolean icons live under it.
    pub admin_media_prefix: String,
    /// Date-format string for date columns, in the `N j, Y` token syntax
    /// of [`crate::dateformat`].
    pub date_format: String,
    pub datetime_format: String,
    pub time_format: String,
}

impl Default for TreeEditorSettings {
    fn default() -> Self {
        Self {
            editor_media: DEFAULT_EDITOR_MEDIA.to_string(),
            admin_media_prefix: DEFAULT_ADMIN_MEDIA_PREFIX.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl TreeEditorSettings {
    /// Defaults overridden by `EDITOR_ADMIN_MEDIA` and `ADMIN_MEDIA_PREFIX`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(value) = lookup("EDITOR_ADMIN_MEDIA").filter(|v| !v.is_empty()) {
            settings.editor_media = value;
        }
        if let Some(value) = lookup("ADMIN_MEDIA_PREFIX").filter(|v| !v.is_empty()) {
            settings.admin_media_prefix = value;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_default_to_the_table() {
        let config = TreeEditorConfig::new("pages", "page_nodes");
        assert_eq!(config.table_name(), "page_nodes");
        assert_eq!(config.object_name(), "page_nodes");
        assert_eq!(config.verbose_name(), "page nodes");
        let key = config.advisory_lock_strategy().key().expect("lock enabled");
        assert!(key.as_str().starts_with("tree-editor::pages::page_nodes::"));
    }

    #[test]
    fn options_override_defaults() {
        let config = TreeEditorOptions::default()
            .object_name("page")
            .verbose_name("web page")
            .advisory_lock_strategy(AdvisoryLockStrategy::Disabled)
            .apply(TreeEditorConfig::new("pages", "page_nodes"));
        assert_eq!(config.object_name(), "page");
        assert_eq!(config.verbose_name(), "web page");
        assert_eq!(config.advisory_lock_strategy().key(), None);
    }

    #[test]
    fn settings_read_media_overrides() {
        let settings = TreeEditorSettings::from_lookup(|key| match key {
            "EDITOR_ADMIN_MEDIA" => Some("/static/editor/".to_string()),
            "ADMIN_MEDIA_PREFIX" => Some(String::new()),
            _ => None,
        });
        assert_eq!(settings.editor_media, "/static/editor/");
        assert_eq!(settings.admin_media_prefix, DEFAULT_ADMIN_MEDIA_PREFIX);
    }
}
