use std::time::Duration;

use zeroize::Zeroizing;

use crate::dashboard::notification::DEFAULT_NOTIFICATION_SECS;
use crate::dashboard::DashboardSettings;
use crate::keygen::DEFAULT_KEY_PREFIX;

pub struct Config {
    pub port: u16,
    /// Base URL of the hosted record store, e.g. `https://abc.supabase.co`.
    pub store_url: Option<String>,
    /// Access credential sent as `apikey` and bearer token.
    pub store_key: Option<Zeroizing<String>>,
    /// Collection holding the key records.
    pub table: String,
    pub key_prefix: String,
    /// Lifetime of a notification banner, in seconds.
    pub notification_secs: u64,
    /// Whitespace-separated clipboard command, e.g. `xclip -selection clipboard`.
    pub clipboard_cmd: Option<String>,
    pub plan_name: String,
    pub plan_limit: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("store_url", &self.store_url)
            .field("store_key", &self.store_key.as_ref().map(|_| "<redacted>"))
            .field("table", &self.table)
            .field("key_prefix", &self.key_prefix)
            .field("notification_secs", &self.notification_secs)
            .field("clipboard_cmd", &self.clipboard_cmd)
            .field("plan_name", &self.plan_name)
            .field("plan_limit", &self.plan_limit)
            .finish()
    }
}

impl Config {
    /// Store URL and credential, or an error naming what is missing.
    pub fn store_credentials(&self) -> anyhow::Result<(&str, Zeroizing<String>)> {
        let url = self.store_url.as_deref().ok_or_else(|| {
            anyhow::anyhow!("KEYDASH_STORE_URL is not set (or pass --in-memory)")
        })?;
        let key = self.store_key.clone().ok_or_else(|| {
            anyhow::anyhow!("KEYDASH_STORE_KEY is not set (or pass --in-memory)")
        })?;
        Ok((url, key))
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            key_prefix: self.key_prefix.clone(),
            notification_ttl: Duration::from_secs(self.notification_secs),
            plan_name: self.plan_name.clone(),
            plan_limit: self.plan_limit,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|name| std::env::var(name).ok())
}

/// Build a config from any variable source. `load` uses the process env.
pub fn from_lookup<F>(var: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| var(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let notification_secs = non_empty("KEYDASH_NOTIFY_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_NOTIFICATION_SECS);
    if notification_secs == 0 {
        anyhow::bail!("KEYDASH_NOTIFY_SECS must be at least 1");
    }

    Ok(Config {
        port: non_empty("KEYDASH_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000),
        store_url: non_empty("KEYDASH_STORE_URL").or_else(|| non_empty("SUPABASE_URL")),
        store_key: non_empty("KEYDASH_STORE_KEY")
            .or_else(|| non_empty("SUPABASE_ANON_KEY"))
            .map(Zeroizing::new),
        table: non_empty("KEYDASH_TABLE").unwrap_or_else(|| "api_keys".into()),
        key_prefix: var("KEYDASH_KEY_PREFIX").unwrap_or_else(|| DEFAULT_KEY_PREFIX.into()),
        notification_secs,
        clipboard_cmd: non_empty("KEYDASH_CLIPBOARD_CMD"),
        plan_name: non_empty("KEYDASH_PLAN_NAME").unwrap_or_else(|| "Researcher".into()),
        plan_limit: non_empty("KEYDASH_PLAN_LIMIT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000),
    })
}
