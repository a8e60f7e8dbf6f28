/// Operations exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Search,
    Update,
    Total,
    Browse,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Search, Route::Update, Route::Total, Route::Browse];

    /// Resolves a request path by its last segment.
    pub fn from_path(path: &str) -> Option<Self> {
        let last = path.rsplit('/').next().unwrap_or(path);
        Self::ALL.into_iter().find(|route| route.segment() == last)
    }

    pub fn segment(self) -> &'static str {
        match self {
            Route::Search => "search",
            Route::Update => "update",
            Route::Total => "total",
            Route::Browse => "browse",
        }
    }

    /// Volatile routes must not be cached by clients or proxies.
    pub fn is_volatile(self) -> bool {
        matches!(self, Route::Update)
    }
}
