//! Bearer token resolution.
//!
//! Priority:
//! 1. `server.token` from the config file (after interpolation)
//! 2. STOCKPILE_SERVER_TOKEN env var
//! 3. OS keychain entry (service "stockpile-capture", user "server-token")

pub const TOKEN_ENV_VAR: &str = "STOCKPILE_SERVER_TOKEN";
const KEYCHAIN_SERVICE: &str = "stockpile-capture";
const KEYCHAIN_USER: &str = "server-token";

/// Resolve the token, returning `None` when no source provides one.
pub fn resolve_token(configured: Option<&str>) -> Option<String> {
    resolve_with(configured, std::env::var(TOKEN_ENV_VAR).ok(), keychain_token)
}

pub(crate) fn resolve_with<K>(
    configured: Option<&str>,
    from_env: Option<String>,
    keychain: K,
) -> Option<String>
where
    K: FnOnce() -> Option<String>,
{
    if let Some(token) = configured.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    if let Some(token) = from_env.filter(|t| !t.trim().is_empty()) {
        log::info!("[CONFIG] Using server token from {}", TOKEN_ENV_VAR);
        return Some(token.trim().to_string());
    }

    let token = keychain()?;
    log::info!("[CONFIG] Loaded server token from OS keychain");
    Some(token)
}

fn keychain_token() -> Option<String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_USER).ok()?;
    match entry.get_password() {
        Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
        Ok(_) => None,
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            log::warn!("[CONFIG] Keychain lookup failed: {}", e);
            None
        }
    }
}
