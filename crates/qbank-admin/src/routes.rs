//! Static route table and per-route access requirements.

/// The login route; unauthorized flows land here.
pub const LOGIN: &str = "/login";
/// The registration route.
pub const REGISTER: &str = "/register";
/// Default landing route for authenticated-but-underprivileged redirects.
pub const DEFAULT_LANDING: &str = "/dashboard";

/// Role gate attached to a route, on top of the authentication gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleRequirement {
    None,
    TeacherOrAdmin,
    Admin,
}

/// Static access metadata for one route. Immutable after table
/// construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteRequirement {
    pub requires_auth: bool,
    pub role: RoleRequirement,
}

impl RouteRequirement {
    pub const fn public() -> Self {
        RouteRequirement {
            requires_auth: false,
            role: RoleRequirement::None,
        }
    }

    pub const fn authenticated() -> Self {
        RouteRequirement {
            requires_auth: true,
            role: RoleRequirement::None,
        }
    }

    pub const fn teacher_or_admin() -> Self {
        RouteRequirement {
            requires_auth: true,
            role: RoleRequirement::TeacherOrAdmin,
        }
    }

    pub const fn admin() -> Self {
        RouteRequirement {
            requires_auth: true,
            role: RoleRequirement::Admin,
        }
    }
}

/// One navigable route. `pattern` segments starting with `:` match any
/// single path segment. A route with `redirect` set is an alias: it
/// resolves and is then re-evaluated as its target.
#[derive(Clone, Copy, Debug)]
pub struct Route {
    pub name: &'static str,
    pub pattern: &'static str,
    pub requirement: RouteRequirement,
    pub redirect: Option<&'static str>,
}

impl Route {
    pub const fn new(
        name: &'static str,
        pattern: &'static str,
        requirement: RouteRequirement,
    ) -> Self {
        Route {
            name,
            pattern,
            requirement,
            redirect: None,
        }
    }

    pub const fn redirect_to(name: &'static str, pattern: &'static str, to: &'static str) -> Self {
        Route {
            name,
            pattern,
            requirement: RouteRequirement::public(),
            redirect: Some(to),
        }
    }
}

/// The route table. Resolution walks the table in order; the first
/// matching pattern wins, so literal segments must precede `:param`
/// siblings. Unknown paths resolve to a public not-found route.
pub struct RouteTable {
    routes: Vec<Route>,
    not_found: Route,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        RouteTable {
            routes,
            not_found: Route::new("not-found", "/:pathMatch", RouteRequirement::public()),
        }
    }

    /// The route table of the admin console.
    pub fn admin_console() -> Self {
        Self::new(vec![
            Route::redirect_to("root", "/", DEFAULT_LANDING),
            Route::new("login", LOGIN, RouteRequirement::public()),
            Route::new("register", REGISTER, RouteRequirement::public()),
            Route::new("dashboard", DEFAULT_LANDING, RouteRequirement::authenticated()),
            Route::new("problem-list", "/problems", RouteRequirement::authenticated()),
            Route::new(
                "problem-create",
                "/problems/create",
                RouteRequirement::teacher_or_admin(),
            ),
            Route::new(
                "problem-detail",
                "/problems/:id",
                RouteRequirement::authenticated(),
            ),
            Route::new(
                "problem-edit",
                "/problems/:id/edit",
                RouteRequirement::teacher_or_admin(),
            ),
            Route::new("profile", "/profile", RouteRequirement::authenticated()),
            Route::new("user-admin", "/admin/users", RouteRequirement::admin()),
        ])
    }

    pub fn resolve(&self, path: &str) -> &Route {
        self.routes
            .iter()
            .find(|route| pattern_matches(route.pattern, path))
            .unwrap_or(&self.not_found)
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let normalize = |s: &str| -> Vec<String> {
        s.trim_end_matches('/')
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(String::from)
            .collect()
    };
    let pattern_segs = normalize(pattern);
    let path_segs = normalize(path);
    if pattern_segs.len() != path_segs.len() {
        return false;
    }
    pattern_segs
        .iter()
        .zip(path_segs.iter())
        .all(|(p, s)| p.starts_with(':') || p == s)
}
