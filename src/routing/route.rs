//! Compiled routes and the route registry.
//!
//! # Responsibilities
//! - Compile route entries into runtime `Route`s (template, backends,
//!   capability chain) once at startup
//! - Select the route for a request: hostname filter first, then the
//!   first path match in descending template-length order
//!
//! # Design Decisions
//! - The registry is immutable after construction; concurrent reads need
//!   no synchronization
//! - Longer templates sort first, so `/api/v1/<id>` beats `/api/<id>`
//!   for `/api/v1/42`
//! - Entries that cannot compile (no template) are skipped with a
//!   warning rather than failing startup

use std::sync::Arc;
use url::Url;

use crate::auth::Authenticator;
use crate::capability::{AccountAuth, HostFilter, ResponseCache, RouteCapability};
use crate::config::RouteEntry;
use crate::routing::template::PathTemplate;

/// One configured mapping from a path template to its backends, plus the
/// capability chain bound to it.
pub struct Route {
    template: PathTemplate,
    backends: Vec<Url>,
    remove_prefix: bool,
    host_filter: Arc<HostFilter>,
    capabilities: Vec<Arc<dyn RouteCapability>>,
}

impl Route {
    /// Compile a merged route entry. Returns `None` if the entry has no
    /// path template.
    pub fn compile(entry: &RouteEntry, authenticator: Arc<Authenticator>) -> Option<Self> {
        let Some(path) = entry.route_info.path.as_deref() else {
            tracing::warn!("Route entry without a path template; skipped");
            return None;
        };
        let template = PathTemplate::compile(path);

        let mut backends = Vec::new();
        for backend in &entry.route_info.backends {
            match Url::parse(backend) {
                Ok(url) => backends.push(url),
                Err(error) => {
                    tracing::warn!(backend = %backend, %error, "Invalid backend URL; skipped")
                }
            }
        }

        let host_filter = Arc::new(HostFilter::new(&entry.hostname));
        // fixed registration order: host filter, account gate, cache
        let capabilities: Vec<Arc<dyn RouteCapability>> = vec![
            host_filter.clone(),
            Arc::new(AccountAuth::new(&entry.account, authenticator.clone())),
            Arc::new(ResponseCache::new(&entry.cache, authenticator)),
        ];

        Some(Self {
            template,
            backends,
            remove_prefix: entry.route_info.remove_prefix,
            host_filter,
            capabilities,
        })
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn backends(&self) -> &[Url] {
        &self.backends
    }

    pub fn remove_prefix(&self) -> bool {
        self.remove_prefix
    }

    pub fn capabilities(&self) -> &[Arc<dyn RouteCapability>] {
        &self.capabilities
    }

    fn accepts_host(&self, host: Option<&str>) -> bool {
        self.host_filter.accepts(host)
    }
}

/// Immutable, pre-sorted collection of routes.
pub struct RouteRegistry {
    routes: Vec<Arc<Route>>,
}

impl RouteRegistry {
    /// Compile all entries and freeze the registry, most specific
    /// template first.
    pub fn compile(entries: &[RouteEntry], authenticator: Arc<Authenticator>) -> Self {
        let mut routes: Vec<Arc<Route>> = entries
            .iter()
            .filter_map(|entry| Route::compile(entry, authenticator.clone()))
            .map(Arc::new)
            .collect();
        routes.sort_by(|a, b| {
            b.template
                .source()
                .len()
                .cmp(&a.template.source().len())
        });
        tracing::info!(routes = routes.len(), "Route registry compiled");
        Self { routes }
    }

    /// First route whose hostname filter accepts `host` and whose
    /// template matches the cleaned `path`.
    pub fn select(&self, host: Option<&str>, path: &str) -> Option<Arc<Route>> {
        self.routes
            .iter()
            .filter(|route| route.accepts_host(host))
            .find(|route| route.template.matches(path))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
