use tracing::debug;

use crate::config::Config;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::routing::handlers;
use crate::store::{BlobStore, FsStore};

/// A matched route together with the path remainder it captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    /// Text after `/echo/`, undecoded.
    Echo(String),
    UserAgent,
    /// File name after `/files/`.
    FileGet(String),
    /// File name after `/files/`; content is the request body.
    FilePost(String),
    NotFound,
}

#[derive(Debug, Clone, Copy)]
enum MethodFilter {
    Get,
    Post,
}

impl MethodFilter {
    fn matches(self, method: &Method) -> bool {
        matches!(
            (self, method),
            (MethodFilter::Get, Method::GET) | (MethodFilter::Post, Method::POST)
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum PathMatch {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PathMatch {
    /// Returns the unmatched remainder of `path` on success.
    fn strip<'a>(self, path: &'a str) -> Option<&'a str> {
        match self {
            PathMatch::Exact(p) => (path == p).then_some(""),
            PathMatch::Prefix(p) => path.strip_prefix(p),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Root,
    Echo,
    UserAgent,
    FileGet,
    FilePost,
}

impl Target {
    fn bind(self, rest: &str) -> Route {
        match self {
            Target::Root => Route::Root,
            Target::Echo => Route::Echo(rest.to_string()),
            Target::UserAgent => Route::UserAgent,
            Target::FileGet => Route::FileGet(rest.to_string()),
            Target::FilePost => Route::FilePost(rest.to_string()),
        }
    }
}

struct RouteEntry {
    method: MethodFilter,
    path: PathMatch,
    target: Target,
}

static ROUTES: [RouteEntry; 5] = [
    RouteEntry {
        method: MethodFilter::Get,
        path: PathMatch::Exact("/"),
        target: Target::Root,
    },
    RouteEntry {
        method: MethodFilter::Get,
        path: PathMatch::Prefix("/echo/"),
        target: Target::Echo,
    },
    RouteEntry {
        method: MethodFilter::Get,
        path: PathMatch::Prefix("/user-agent"),
        target: Target::UserAgent,
    },
    RouteEntry {
        method: MethodFilter::Get,
        path: PathMatch::Prefix("/files/"),
        target: Target::FileGet,
    },
    RouteEntry {
        method: MethodFilter::Post,
        path: PathMatch::Prefix("/files/"),
        target: Target::FilePost,
    },
];

/// Selects the route for a method and path. First match wins; anything
/// unmatched is `Route::NotFound`.
pub fn route(method: &Method, path: &str) -> Route {
    ROUTES
        .iter()
        .filter(|entry| entry.method.matches(method))
        .find_map(|entry| entry.path.strip(path).map(|rest| entry.target.bind(rest)))
        .unwrap_or(Route::NotFound)
}

/// Dispatches requests to handlers. Immutable once built, shared by every
/// connection.
#[derive(Debug)]
pub struct Router<S> {
    store: S,
}

impl Router<FsStore> {
    /// Builds a router serving files from the configured directory.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(FsStore::new(cfg.directory.clone()))
    }
}

impl<S: BlobStore> Router<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Selects the route for `request` from the static table.
    pub fn route(&self, request: &Request) -> Route {
        let route = route(&request.method, &request.path);
        debug!(method = %request.method, path = %request.path, ?route, "Routed request");
        route
    }

    pub async fn handle(&self, route: &Route, request: &Request) -> Response {
        match route {
            Route::Root => handlers::root(),
            Route::Echo(text) => handlers::echo(text),
            Route::UserAgent => handlers::user_agent(request),
            Route::FileGet(name) => handlers::file_get(&self.store, name).await,
            Route::FilePost(name) => handlers::file_post(&self.store, name, &request.body).await,
            Route::NotFound => handlers::not_found(),
        }
    }
}
