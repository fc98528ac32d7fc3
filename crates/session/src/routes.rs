//! Site route table
//!
//! Patterns are `/`-separated segments: literals, `:name` parameters that
//! match any one segment, and a trailing `*` that matches the rest of the
//! path (including nothing).

use crate::guard::{GuardDecision, Redirects, RouteGuard};
use crate::state::SessionSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Rest,
}

/// Who may see a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected(RouteGuard),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    access: Access,
}

impl Route {
    pub fn new(pattern: &str, access: Access) -> Self {
        let segments = split(pattern)
            .map(|s| match s {
                "*" => Segment::Rest,
                s => match s.strip_prefix(':') {
                    Some(name) => Segment::Param(name.to_string()),
                    None => Segment::Literal(s.to_string()),
                },
            })
            .collect();
        Self {
            pattern: pattern.to_string(),
            segments,
            access,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub const fn access(&self) -> &Access {
        &self.access
    }

    /// Parameters captured from `path`, or `None` if the route does not match
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let mut parts = split(normalize(path));
        let mut params = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Rest => return Some(params),
                Segment::Literal(lit) => {
                    if parts.next()? != lit.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.push((name.clone(), parts.next()?.to_string()));
                }
            }
        }

        parts.next().is_none().then_some(params)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Drop the query string and fragment
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Result of a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    NotFound,
    Matched {
        pattern: String,
        params: Vec<(String, String)>,
        decision: GuardDecision,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(mut self, pattern: &str) -> Self {
        self.routes.push(Route::new(pattern, Access::Public));
        self
    }

    pub fn protected(mut self, pattern: &str, guard: RouteGuard) -> Self {
        self.routes.push(Route::new(pattern, Access::Protected(guard)));
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The marketing site: public pages plus the admin area
    pub fn default_site(redirects: &Redirects) -> Self {
        let admin = RouteGuard::new(["admin"], redirects.clone());
        Self::new()
            .public("/")
            .public("/login")
            .public("/services/ai-chatbots")
            .public("/services/agentic-ai-workflows")
            .public("/services/smart-process-automation")
            .public("/services/ai-apps-micro-saas")
            .public("/blogs/:id")
            .public("/events/:id")
            .public("/packages/:id")
            .protected("/admin", admin.clone())
            .protected("/admin/blog/*", admin.clone())
            .protected("/admin/events/*", admin.clone())
            .protected("/admin/careers/*", admin.clone())
            .protected("/admin/packages/*", admin.clone())
            .protected("/admin/*", admin)
    }

    /// First matching route wins
    pub fn resolve(&self, path: &str) -> Option<(&Route, Vec<(String, String)>)> {
        self.routes
            .iter()
            .find_map(|route| route.matches(path).map(|params| (route, params)))
    }

    pub fn navigate(&self, path: &str, session: &SessionSnapshot) -> Navigation {
        let Some((route, params)) = self.resolve(path) else {
            return Navigation::NotFound;
        };
        let decision = match route.access() {
            Access::Public => GuardDecision::Render,
            Access::Protected(guard) => guard.evaluate(session),
        };
        Navigation::Matched {
            pattern: route.pattern.clone(),
            params,
            decision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockAuthApi;
    use crate::claims::tests::token_for;
    use crate::manager::SessionManager;
    use crate::state::SessionPolicy;
    use std::sync::Arc;

    fn site() -> RouteTable {
        RouteTable::default_site(&Redirects::default())
    }

    fn decision(nav: Navigation) -> GuardDecision {
        match nav {
            Navigation::Matched { decision, .. } => decision,
            Navigation::NotFound => panic!("expected a matching route"),
        }
    }

    #[test]
    fn test_params_are_captured() {
        let table = site();
        let (route, params) = table.resolve("/blogs/abc123?ref=home").unwrap();
        assert_eq!(route.pattern(), "/blogs/:id");
        assert_eq!(params, vec![("id".to_string(), "abc123".to_string())]);
    }

    #[test]
    fn test_trailing_slash_and_root() {
        let table = site();
        assert_eq!(table.resolve("/").unwrap().0.pattern(), "/");
        assert_eq!(table.resolve("/login/").unwrap().0.pattern(), "/login");
        assert!(table.resolve("/blogs").is_none());
        assert!(table.resolve("/blogs/1/comments").is_none());
    }

    #[test]
    fn test_wildcard_matches_nested_paths() {
        let table = site();
        for path in ["/admin/blog", "/admin/blog/new", "/admin/events/42/edit"] {
            assert!(
                matches!(table.resolve(path), Some((r, _)) if r.pattern().ends_with('*')),
                "{path} should hit a wildcard route"
            );
        }
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        assert_eq!(
            site().navigate("/pricing-old", &SessionSnapshot::unauthenticated()),
            Navigation::NotFound
        );
    }

    #[test]
    fn test_public_pages_render_while_restoring() {
        assert_eq!(
            decision(site().navigate("/services/ai-chatbots", &SessionSnapshot::restoring())),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_admin_area_is_guarded() {
        let table = site();
        let manager =
            SessionManager::new(Arc::new(MockAuthApi::new()), SessionPolicy::default());

        assert_eq!(
            decision(table.navigate("/admin/packages/new", &SessionSnapshot::unauthenticated())),
            GuardDecision::RedirectToLogin("/login".into())
        );
        assert_eq!(
            decision(table.navigate("/admin", &manager.snapshot())),
            GuardDecision::Pending
        );

        manager.login(token_for("u1", "user")).unwrap();
        assert_eq!(
            decision(table.navigate("/admin", &manager.snapshot())),
            GuardDecision::RedirectToHome("/".into())
        );

        manager.login(token_for("a1", "admin")).unwrap();
        assert_eq!(
            decision(table.navigate("/admin/careers", &manager.snapshot())),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_unlisted_admin_pages_fall_under_admin_guard() {
        let table = site();
        let manager =
            SessionManager::new(Arc::new(MockAuthApi::new()), SessionPolicy::default());

        for path in ["/admin/blogs/new", "/admin/blogs", "/admin/settings"] {
            match table.navigate(path, &SessionSnapshot::unauthenticated()) {
                Navigation::Matched {
                    pattern, decision, ..
                } => {
                    assert_eq!(pattern, "/admin/*", "{path}");
                    assert_eq!(decision, GuardDecision::RedirectToLogin("/login".into()));
                }
                Navigation::NotFound => panic!("{path} should be guarded"),
            }
        }

        manager.login(token_for("u1", "user")).unwrap();
        assert_eq!(
            decision(table.navigate("/admin/blogs/new", &manager.snapshot())),
            GuardDecision::RedirectToHome("/".into())
        );
    }
}
