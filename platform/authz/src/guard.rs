use serde::{Deserialize, Serialize};

use crate::{Permission, Role, RouteRequirement, Subject};

/// Where unauthenticated subjects are sent when a route needs authentication.
pub const AUTH_FALLBACK_ROUTE: &str = "/login";
/// Where authenticated subjects are sent away from guest-only routes.
pub const GUEST_REDIRECT_ROUTE: &str = "/dashboard";

/// Structured reason for an authenticated-but-unauthorized denial.
///
/// Denial is an expected outcome, not an error: the presentation collaborator
/// renders these lists in an access-denied panel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDenial {
    pub missing_permissions: Vec<Permission>,
    pub missing_roles: Vec<Role>,
}

/// Outcome of evaluating a subject against a route's requirements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    /// Send the subject elsewhere. `preserve_from` asks the navigation
    /// collaborator to remember the originally requested location so a later
    /// login can return to it.
    Redirect { to: String, preserve_from: bool },
    Denied(AccessDenial),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

/// Full route guard: guest-only branch, implicit authentication, then the
/// role and permission checks in order.
pub fn check_route(subject: &Subject, route: &RouteRequirement) -> AccessDecision {
    // Guest-only routes invert the rule: authenticated subjects are sent
    // away and guests pass unconditionally, with no further checks.
    if route.guest_only {
        if subject.is_authenticated {
            let to = route
                .redirect_to
                .clone()
                .unwrap_or_else(|| GUEST_REDIRECT_ROUTE.to_string());
            return AccessDecision::Redirect {
                to,
                preserve_from: true,
            };
        }
        return AccessDecision::Granted;
    }

    // Declaring permissions or roles implies requiring authentication.
    if route.is_guarded() {
        if !subject.is_authenticated {
            return AccessDecision::Redirect {
                to: AUTH_FALLBACK_ROUTE.to_string(),
                preserve_from: true,
            };
        }

        if !route.roles.is_empty() {
            let role_ok = if route.require_all_roles {
                subject.has_all_roles(&route.roles)
            } else {
                subject.has_any_role(&route.roles)
            };
            if !role_ok {
                // The permission list has not been evaluated yet, so the
                // denial reports it in full alongside the missing roles.
                return AccessDecision::Denied(AccessDenial {
                    missing_permissions: route.permissions.clone(),
                    missing_roles: missing_roles(subject, &route.roles),
                });
            }
        }

        if !route.permissions.is_empty() {
            let permission_ok = if route.require_all_permissions {
                subject.has_all_permissions(&route.permissions)
            } else {
                subject.has_any_permission(&route.permissions)
            };
            if !permission_ok {
                return AccessDecision::Denied(AccessDenial {
                    missing_permissions: missing_permissions(subject, &route.permissions),
                    missing_roles: route.roles.clone(),
                });
            }
        }
    }

    AccessDecision::Granted
}

/// Boolean projection of the role/permission checks, without the
/// authentication and guest-only branches. Used by the menu filter.
pub fn can_access_route(subject: &Subject, route: &RouteRequirement) -> bool {
    check_requirements(
        subject,
        &route.permissions,
        &route.roles,
        route.require_all_permissions,
        route.require_all_roles,
    )
}

/// Stateless gate for UI elements (buttons, menu entries).
///
/// An absent or empty requirement list means "no restriction" here. The
/// any/all helpers are only consulted for non-empty lists, which is what lets
/// their empty-input semantics stay asymmetric.
pub fn check_requirements(
    subject: &Subject,
    permissions: &[Permission],
    roles: &[Role],
    require_all_permissions: bool,
    require_all_roles: bool,
) -> bool {
    if !roles.is_empty() {
        let role_ok = if require_all_roles {
            subject.has_all_roles(roles)
        } else {
            subject.has_any_role(roles)
        };
        if !role_ok {
            return false;
        }
    }

    if !permissions.is_empty() {
        let permission_ok = if require_all_permissions {
            subject.has_all_permissions(permissions)
        } else {
            subject.has_any_permission(permissions)
        };
        if !permission_ok {
            return false;
        }
    }

    true
}

fn missing_permissions(subject: &Subject, wanted: &[Permission]) -> Vec<Permission> {
    wanted
        .iter()
        .copied()
        .filter(|p| !subject.has_permission(*p))
        .collect()
}

fn missing_roles(subject: &Subject, wanted: &[Role]) -> Vec<Role> {
    wanted
        .iter()
        .copied()
        .filter(|r| !subject.has_role(*r))
        .collect()
}
