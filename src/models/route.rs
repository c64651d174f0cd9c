//! Hash-based routing with restorable browser deep links.

/// Application routes.
///
/// URL format: `#/storage/{id}?path=a/b&versions=true&archives=true`.
/// The query part drives the storage browser and survives a reload.
#[derive(Clone, Debug, PartialEq)]
pub enum AppRoute {
    /// Landing view: #/ or empty hash
    Home,
    /// Storage browser
    Storage(BrowserRoute),
    /// CLI configuration screen: #/cli
    Cli,
    /// Users import/export: #/users
    Users,
}

/// Navigation state of the storage browser.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BrowserRoute {
    pub storage_id: u64,
    /// Folder path without leading/trailing slashes, `None` for the root.
    pub path: Option<String>,
    pub versions: bool,
    pub archives: bool,
}

impl BrowserRoute {
    pub fn new(storage_id: u64) -> Self {
        Self {
            storage_id,
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: Option<String>) -> Self {
        self.path = path.and_then(|p| normalize_folder_path(&p));
        self
    }

    /// Query string (without `?`), omitting defaults.
    pub fn to_query(&self) -> String {
        let mut params = Vec::new();
        if let Some(path) = &self.path {
            params.push(format!("path={}", urlencoding::encode(path)));
        }
        if self.versions {
            params.push("versions=true".to_string());
        }
        if self.archives {
            params.push("archives=true".to_string());
        }
        params.join("&")
    }

    fn from_parts(storage_id: u64, query: &str) -> Self {
        let mut route = Self::new(storage_id);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            match key {
                "path" => route.path = normalize_folder_path(&value),
                "versions" => route.versions = value == "true",
                "archives" => route.archives = value == "true",
                _ => {}
            }
        }
        route
    }
}

/// Strip surrounding slashes; an empty result means the storage root.
pub fn normalize_folder_path(path: &str) -> Option<String> {
    let trimmed = path.trim().trim_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl AppRoute {
    /// Parse URL hash into Route
    pub fn from_hash(hash: &str) -> Self {
        let rest = hash.trim_start_matches('#').trim_start_matches('/');
        let (location, query) = rest.split_once('?').unwrap_or((rest, ""));
        let segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["storage", id] => id
                .parse()
                .map(|id| Self::Storage(BrowserRoute::from_parts(id, query)))
                .unwrap_or(Self::Home),
            ["cli"] => Self::Cli,
            ["users"] => Self::Users,
            _ => Self::Home,
        }
    }

    /// Convert Route to URL hash
    pub fn to_hash(&self) -> String {
        match self {
            Self::Home => "#/".to_string(),
            Self::Cli => "#/cli".to_string(),
            Self::Users => "#/users".to_string(),
            Self::Storage(route) => {
                let query = route.to_query();
                if query.is_empty() {
                    format!("#/storage/{}", route.storage_id)
                } else {
                    format!("#/storage/{}?{}", route.storage_id, query)
                }
            }
        }
    }

    /// Get current route from browser URL
    pub fn current() -> Self {
        let hash = web_sys::window()
            .and_then(|w| w.location().hash().ok())
            .unwrap_or_default();
        Self::from_hash(&hash)
    }

    /// Navigate to this route (adds a history entry and fires `hashchange`).
    pub fn push(&self) {
        crate::utils::dom::set_hash(&self.to_hash());
    }
}
