//! Portal configuration loaded from environment variables.

/// Portal configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Admin sign-in name.
    /// Env: `ACADEMY_ADMIN_USER`
    /// Default: `admin`
    pub admin_user: String,

    /// Admin sign-in password.
    /// Env: `ACADEMY_ADMIN_PASSWORD`
    /// Default: empty (admin sign-in disabled).
    pub admin_password: Option<String>,

    /// Sender address on outgoing mail.
    /// Env: `ACADEMY_MAIL_FROM`
    pub mail_from: String,

    /// Number of chat turns kept as assistant context.
    /// Env: `ACADEMY_ASSISTANT_HISTORY`
    /// Default: `20`
    pub assistant_history: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            admin_user: "admin".to_string(),
            admin_password: None,
            mail_from: "Academy Admissions <admissions@academy.example.com>".to_string(),
            assistant_history: 20,
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(user) = std::env::var("ACADEMY_ADMIN_USER") {
            if !user.is_empty() {
                config.admin_user = user;
            }
        }

        if let Ok(password) = std::env::var("ACADEMY_ADMIN_PASSWORD") {
            if !password.is_empty() {
                config.admin_password = Some(password);
            }
        }

        if let Ok(from) = std::env::var("ACADEMY_MAIL_FROM") {
            config.mail_from = from;
        }

        if let Ok(val) = std::env::var("ACADEMY_ASSISTANT_HISTORY") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.assistant_history = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid ACADEMY_ASSISTANT_HISTORY, using default")
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();
        assert_eq!(config.admin_user, "admin");
        assert!(config.admin_password.is_none());
        assert_eq!(config.assistant_history, 20);
    }
}
