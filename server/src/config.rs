use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};

use console_authz::Role;

/// One entry of the static user directory.
#[derive(Clone, Debug)]
pub struct UserEntry {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub name: String,
    pub roles: Vec<Role>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub cookie_key: Key,
    pub session_ttl_minutes: i64,
    pub cors_allowed_origins: Vec<String>,
    pub users: Vec<UserEntry>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cookie_secret =
            std::env::var("COOKIE_SECRET_BASE64").context("COOKIE_SECRET_BASE64 missing")?;
        let secret_bytes = STANDARD
            .decode(cookie_secret.trim())
            .context("invalid COOKIE_SECRET_BASE64")?;
        if secret_bytes.len() < 32 {
            return Err(anyhow!(
                "COOKIE_SECRET_BASE64 must decode to at least 32 bytes"
            ));
        }
        let cookie_key = Key::derive_from(&secret_bytes);

        let session_ttl_minutes = std::env::var("SESSION_TTL_MINUTES")
            .ok()
            .map(|val| val.parse::<i64>())
            .transpose()
            .context("invalid SESSION_TTL_MINUTES")?
            .unwrap_or(60);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let users = match std::env::var("CONSOLE_USERS") {
            Ok(raw) => parse_users(&raw)?,
            Err(_) => default_users(),
        };
        if users.is_empty() {
            return Err(anyhow!("CONSOLE_USERS declares no users"));
        }

        Ok(Self {
            cookie_key,
            session_ttl_minutes,
            cors_allowed_origins,
            users,
        })
    }
}

/// Directory format: `username:password:role1|role2` entries separated by
/// commas, e.g. `admin:s3cret:admin|super_admin,viewer:view:user`.
fn parse_users(raw: &str) -> Result<Vec<UserEntry>> {
    let mut users = Vec::new();
    for (idx, entry) in raw
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .enumerate()
    {
        let mut parts = entry.splitn(3, ':');
        let username = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("user entry {entry:?} missing username"))?;
        let password = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("user entry {entry:?} missing password"))?;
        let roles = parts
            .next()
            .ok_or_else(|| anyhow!("user entry {entry:?} missing roles"))?
            .split('|')
            .map(|role| {
                role.trim()
                    .parse::<Role>()
                    .map_err(|err| anyhow!("user entry {entry:?}: {err}"))
            })
            .collect::<Result<Vec<_>>>()?;
        users.push(UserEntry {
            id: idx as u64 + 1,
            username: username.to_string(),
            password: password.to_string(),
            name: username.to_string(),
            roles,
        });
    }
    Ok(users)
}

/// Fixture directory for local development, mirroring the demo accounts the
/// mock API shipped with.
fn default_users() -> Vec<UserEntry> {
    vec![
        UserEntry {
            id: 1,
            username: "admin".into(),
            password: "admin".into(),
            name: "Admin User".into(),
            roles: vec![Role::Admin],
        },
        UserEntry {
            id: 2,
            username: "root".into(),
            password: "root".into(),
            name: "Super Admin".into(),
            roles: vec![Role::SuperAdmin],
        },
        UserEntry {
            id: 3,
            username: "manager".into(),
            password: "manager".into(),
            name: "Manager".into(),
            roles: vec![Role::Manager],
        },
        UserEntry {
            id: 4,
            username: "user".into(),
            password: "user".into(),
            name: "Regular User".into(),
            roles: vec![Role::User],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directory_entries() {
        let users = parse_users("admin:s3cret:admin|super_admin, viewer:view:user").expect("parse");
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "admin");
        assert_eq!(users[0].roles, vec![Role::Admin, Role::SuperAdmin]);
        assert_eq!(users[1].id, 2);
        assert_eq!(users[1].roles, vec![Role::User]);
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(parse_users("admin").is_err());
        assert!(parse_users("admin:pw").is_err());
        assert!(parse_users("admin:pw:astronaut").is_err());
    }
}
