use console_authz::{NOT_FOUND_PATH, Permission, Role, RouteRequirement};

/// The declarative route table for the admin console.
///
/// This is the configuration surface: extending the protected area means
/// adding entries here, not touching the engine. Children declare their own
/// requirements; nothing is inherited.
pub fn route_table() -> Vec<RouteRequirement> {
    vec![
        RouteRequirement::new("/").index().meta("Home"),
        RouteRequirement::new("/login")
            .component("LoginPage")
            .guest_only("/dashboard")
            .hide_in_menu()
            .meta("Login"),
        RouteRequirement::new("/dashboard")
            .component("DashboardPage")
            .require_auth()
            .menu("Dashboard", "dashboard", 1)
            .meta("Dashboard"),
        RouteRequirement::new("/users")
            .component("UserListPage")
            .require_auth()
            .permissions([Permission::UserView])
            .menu("User Management", "users", 2)
            .meta("Users"),
        RouteRequirement::new("/roles")
            .component("RoleListPage")
            .require_auth()
            .permissions([Permission::RoleView])
            .roles([Role::Admin, Role::SuperAdmin])
            .menu("Role Management", "shield", 3)
            .meta("Roles"),
        RouteRequirement::new("/system")
            .require_auth()
            .permissions([Permission::SystemConfig, Permission::SystemLogs])
            .roles([Role::SuperAdmin])
            .menu("System", "settings", 4)
            .meta("System")
            .children(vec![
                RouteRequirement::new("/system/config")
                    .component("SystemConfigPage")
                    .require_auth()
                    .permissions([Permission::SystemConfig])
                    .menu_title("Configuration")
                    .meta("System Configuration"),
                RouteRequirement::new("/system/logs")
                    .component("SystemLogsPage")
                    .require_auth()
                    .permissions([Permission::SystemLogs])
                    .menu_title("Logs")
                    .meta("System Logs"),
            ]),
        RouteRequirement::new("/analytics")
            .component("AnalyticsPage")
            .require_auth()
            .permissions([Permission::AnalyticsView])
            .menu("Analytics", "chart", 5)
            .meta("Analytics"),
        RouteRequirement::new(NOT_FOUND_PATH)
            .component("NotFoundPage")
            .hide_in_menu()
            .meta("404 Not Found"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_authz::{RouteTable, Subject, accessible_menu_items};

    #[test]
    fn table_is_well_formed() {
        let table = RouteTable::new(route_table()).expect("valid route table");
        assert_eq!(table.index().path, "/");
        assert_eq!(table.guest_only().len(), 1);
        assert_eq!(table.protected().len(), 5);
        assert!(table.not_found().is_some());
    }

    #[test]
    fn guest_sees_no_menu_entries() {
        let menu = accessible_menu_items(&Subject::guest(), &route_table());
        // Dashboard has no role/permission requirement, so the boolean
        // predicate lets it through even for guests; the route guard itself
        // still redirects unauthenticated visitors. Everything
        // permission-gated is filtered out here.
        let paths: Vec<_> = menu.iter().map(|r| r.path.as_str()).collect();
        assert!(!paths.contains(&"/users"));
        assert!(!paths.contains(&"/system"));
        assert!(!paths.contains(&"/login"));
    }

    #[test]
    fn admin_menu_is_ordered_and_scoped() {
        let subject = Subject::authenticated(
            [Role::Admin],
            console_authz::permissions_for_roles(&[Role::Admin]),
        );
        let menu = accessible_menu_items(&subject, &route_table());
        let paths: Vec<_> = menu.iter().map(|r| r.path.as_str()).collect();
        // Admin lacks the super_admin role, so /system is filtered out. The
        // unordered index entry sorts last.
        assert_eq!(paths, vec!["/dashboard", "/users", "/roles", "/analytics", "/"]);
    }
}
