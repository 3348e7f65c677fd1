//! Site context shared by every command.

use std::path::PathBuf;

use crate::db::MetadataStore;

/// Session user the framework's bench commands run as.
pub const DEFAULT_USER: &str = "Administrator";

/// The app whose files the commands read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// Python package name, e.g. `my_awesome_app`.
    pub name: String,
    /// Package directory, `<bench>/apps/<app>/<app>`.
    pub path: PathBuf,
}

impl AppInfo {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Default directory for customization bundles.
    pub fn customizations_dir(&self) -> PathBuf {
        self.path.join("customizations")
    }
}

/// One connected site: its store, the session user and the target app.
pub struct SiteContext<S: MetadataStore> {
    pub store: S,
    pub user: String,
    pub app: AppInfo,
}

impl<S: MetadataStore> SiteContext<S> {
    pub fn new(store: S, app: AppInfo) -> Self {
        Self {
            store,
            user: DEFAULT_USER.to_string(),
            app,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }
}
