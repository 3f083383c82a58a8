//! Client routes: the thread list (`/`) and a single thread (`/thread/{id}`).

use std::fmt;

/// A location in the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Route {
    /// No thread selected
    #[default]
    Home,
    /// Viewing the thread with this id
    Thread(String),
}

impl Route {
    /// Parse a path. Unknown paths yield `None`.
    ///
    /// The id segment is percent-decoded; a trailing `/`, query string or
    /// fragment is ignored.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        if trimmed.is_empty() {
            return Some(Route::Home);
        }

        let id = trimmed.strip_prefix("/thread/")?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        let id = urlencoding::decode(id).ok()?;
        Some(Route::Thread(id.into_owned()))
    }

    /// The path for this route, with the thread id percent-encoded.
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Thread(id) => format!("/thread/{}", urlencoding::encode(id)),
        }
    }

    /// The thread this route points at, if any.
    pub fn thread_id(&self) -> Option<&str> {
        match self {
            Route::Home => None,
            Route::Thread(id) => Some(id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
