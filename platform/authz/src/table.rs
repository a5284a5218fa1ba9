use thiserror::Error;

use crate::guard::{AUTH_FALLBACK_ROUTE, GUEST_REDIRECT_ROUTE};
use crate::{RouteRequirement, Subject};

/// Catch-all path of the not-found route.
pub const NOT_FOUND_PATH: &str = "*";

/// Misconfigured route table. These are programmer errors surfaced at
/// construction, never silently resolved at evaluation time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteConfigError {
    #[error("route {path} declares guest_only together with authenticated requirements")]
    AmbiguousGuard { path: String },
    #[error("route table declares no index route")]
    MissingIndex,
    #[error("route table declares more than one index route ({first} and {second})")]
    DuplicateIndex { first: String, second: String },
    #[error("route table declares more than one catch-all route")]
    DuplicateNotFound,
}

/// A validated route table, partitioned by declared flags.
///
/// Each entry lands in exactly one group: index, guest-only, protected,
/// public, or not-found. Partitioning looks at flags only, never at the path
/// pattern (except for the `*` catch-all).
#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<RouteRequirement>,
    index: RouteRequirement,
    guest_only: Vec<RouteRequirement>,
    protected: Vec<RouteRequirement>,
    public: Vec<RouteRequirement>,
    not_found: Option<RouteRequirement>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteRequirement>) -> Result<Self, RouteConfigError> {
        for route in &routes {
            validate(route)?;
        }

        let mut index: Option<RouteRequirement> = None;
        let mut guest_only = Vec::new();
        let mut protected = Vec::new();
        let mut public = Vec::new();
        let mut not_found: Option<RouteRequirement> = None;

        for route in &routes {
            if route.index {
                if let Some(existing) = &index {
                    return Err(RouteConfigError::DuplicateIndex {
                        first: existing.path.clone(),
                        second: route.path.clone(),
                    });
                }
                index = Some(route.clone());
            } else if route.path == NOT_FOUND_PATH {
                if not_found.is_some() {
                    return Err(RouteConfigError::DuplicateNotFound);
                }
                not_found = Some(route.clone());
            } else if route.guest_only {
                guest_only.push(route.clone());
            } else if route.is_guarded() {
                protected.push(route.clone());
            } else {
                public.push(route.clone());
            }
        }

        let index = index.ok_or(RouteConfigError::MissingIndex)?;

        Ok(Self {
            routes,
            index,
            guest_only,
            protected,
            public,
            not_found,
        })
    }

    /// The full declared list, for the menu filter.
    pub fn routes(&self) -> &[RouteRequirement] {
        &self.routes
    }

    pub fn index(&self) -> &RouteRequirement {
        &self.index
    }

    pub fn guest_only(&self) -> &[RouteRequirement] {
        &self.guest_only
    }

    pub fn protected(&self) -> &[RouteRequirement] {
        &self.protected
    }

    pub fn public(&self) -> &[RouteRequirement] {
        &self.public
    }

    pub fn not_found(&self) -> Option<&RouteRequirement> {
        self.not_found.as_ref()
    }

    /// The index route renders a redirect, never content: home for
    /// authenticated subjects, the login page otherwise.
    pub fn index_redirect(&self, subject: &Subject) -> &'static str {
        if subject.is_authenticated {
            GUEST_REDIRECT_ROUTE
        } else {
            AUTH_FALLBACK_ROUTE
        }
    }
}

fn validate(route: &RouteRequirement) -> Result<(), RouteConfigError> {
    if route.guest_only
        && (route.require_auth || !route.permissions.is_empty() || !route.roles.is_empty())
    {
        return Err(RouteConfigError::AmbiguousGuard {
            path: route.path.clone(),
        });
    }
    for child in &route.children {
        validate(child)?;
    }
    Ok(())
}
