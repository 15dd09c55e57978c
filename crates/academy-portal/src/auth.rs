//! Portal sign-in.
//!
//! Students sign in with their code, faculty with their id, and the admin
//! with the configured credentials. The signed-in principal lives in the
//! tab's session storage, so every tab signs in separately and closing the
//! tab signs out.

use academy_shared::constants::session_keys;
use academy_shared::StudentCode;
use academy_store::Tab;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::config::PortalConfig;
use crate::error::{PortalError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub role: Role,
    pub id: String,
    pub name: String,
}

fn secrets_match(given: &str, expected: &str) -> bool {
    let (a, b) = (given.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.ct_eq(b).unwrap_u8() == 1
}

pub fn sign_in(
    tab: &Tab,
    config: &PortalConfig,
    role: Role,
    id: &str,
    password: &str,
) -> Result<Principal> {
    let id = id.trim();
    let principal = match role {
        Role::Student => {
            let code = StudentCode::parse(&id.to_uppercase())
                .map_err(|_| PortalError::InvalidCredentials)?;
            tab.students()
                .find_by_code(&code)
                .filter(|s| secrets_match(password, &s.password))
                .map(|s| Principal {
                    role,
                    id: s.student_id.to_string(),
                    name: s.name,
                })
        }
        Role::Faculty => tab
            .faculty()
            .list()
            .into_iter()
            .find(|f| f.id.eq_ignore_ascii_case(id))
            .filter(|f| secrets_match(password, &f.password))
            .map(|f| Principal {
                role,
                id: f.id,
                name: f.name,
            }),
        Role::Admin => {
            let Some(expected) = config.admin_password.as_deref() else {
                return Err(PortalError::SignInDisabled("Admin"));
            };
            (id == config.admin_user && secrets_match(password, expected)).then(|| Principal {
                role,
                id: config.admin_user.clone(),
                name: "Administrator".to_string(),
            })
        }
    };

    let Some(principal) = principal else {
        tracing::warn!(?role, id, "sign-in rejected");
        return Err(PortalError::InvalidCredentials);
    };
    tab.session().save_items(session_keys::CURRENT_USER, &principal);
    tracing::info!(?role, id = %principal.id, context = %tab.context().short(), "signed in");
    Ok(principal)
}

pub fn current_user(tab: &Tab) -> Option<Principal> {
    tab.session().get_items(session_keys::CURRENT_USER, None)
}

pub fn sign_out(tab: &Tab) {
    if tab.session().remove_item(session_keys::CURRENT_USER).is_some() {
        tracing::info!(context = %tab.context().short(), "signed out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_store::LocalStore;

    fn admin_config() -> PortalConfig {
        PortalConfig {
            admin_password: Some("s3cret".into()),
            ..PortalConfig::default()
        }
    }

    #[test]
    fn student_signs_in_with_code() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let principal =
            sign_in(&tab, &admin_config(), Role::Student, "s00001", "welcome123").unwrap();
        assert_eq!(principal.id, "S00001");
        assert_eq!(current_user(&tab), Some(principal));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let err = sign_in(&tab, &admin_config(), Role::Faculty, "F001", "faculty12").unwrap_err();
        assert!(matches!(err, PortalError::InvalidCredentials));
        assert_eq!(current_user(&tab), None);
    }

    #[test]
    fn admin_requires_configured_password() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let err = sign_in(&tab, &PortalConfig::default(), Role::Admin, "admin", "").unwrap_err();
        assert!(matches!(err, PortalError::SignInDisabled(_)));

        sign_in(&tab, &admin_config(), Role::Admin, "admin", "s3cret").unwrap();
        assert_eq!(current_user(&tab).map(|p| p.role), Some(Role::Admin));
    }

    #[test]
    fn sessions_are_per_tab() {
        let store = LocalStore::in_memory().unwrap();
        let first = store.open_tab();
        let second = store.open_tab();
        sign_in(&first, &admin_config(), Role::Faculty, "F002", "faculty123").unwrap();

        assert!(current_user(&second).is_none());
        sign_out(&first);
        assert!(current_user(&first).is_none());
    }
}
