use crate::guard::GuardConfig;

#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub admin: AdminConfig,
    pub guard: GuardConfig,
}

#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let admin_id = lookup("LOGIN_GUARD_ADMIN_ID").ok_or_else(|| {
            anyhow::anyhow!("LOGIN_GUARD_ADMIN_ID environment variable is required")
        })?;
        let admin_password = lookup("LOGIN_GUARD_ADMIN_PASSWORD").ok_or_else(|| {
            anyhow::anyhow!("LOGIN_GUARD_ADMIN_PASSWORD environment variable is required")
        })?;

        let defaults = GuardConfig::default();
        let guard = GuardConfig {
            max_attempts: positive_or(&lookup, "LOGIN_MAX_ATTEMPTS", defaults.max_attempts)?,
            block_duration_minutes: positive_or(
                &lookup,
                "LOGIN_BLOCK_DURATION",
                defaults.block_duration_minutes,
            )?,
        };

        Ok(Config {
            bind_addr: {
                let port = lookup("LOGIN_GUARD_PORT").unwrap_or_else(|| "8080".to_string());
                lookup("LOGIN_GUARD_BIND_ADDR").unwrap_or_else(|| format!("0.0.0.0:{}", port))
            },
            admin: AdminConfig {
                username: admin_id,
                password: admin_password,
            },
            guard,
        })
    }
}

fn positive_or(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u32,
) -> anyhow::Result<u32> {
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => anyhow::bail!("{} must be a positive integer, got {:?}", name, raw),
    }
}
