//! Authorization engine for the admin console: closed permission/role
//! domains, the pure evaluator over a subject's grants, the route access
//! predicate, menu filtering, and route-table classification.
//!
//! Everything here is synchronous and side-effect free; session state lives
//! in `console-authn` and is passed in as an explicit [`Subject`] snapshot.

mod guard;
mod menu;
mod permission;
mod role;
mod route;
mod subject;
mod table;

pub use guard::{
    AUTH_FALLBACK_ROUTE, AccessDecision, AccessDenial, GUEST_REDIRECT_ROUTE, can_access_route,
    check_requirements, check_route,
};
pub use menu::accessible_menu_items;
pub use permission::{Permission, UnknownPermission};
pub use role::{Role, UnknownRole, permissions_for_roles, role_permissions};
pub use route::{DEFAULT_MENU_ORDER, RouteElement, RouteMeta, RouteRequirement};
pub use subject::Subject;
pub use table::{NOT_FOUND_PATH, RouteConfigError, RouteTable};
