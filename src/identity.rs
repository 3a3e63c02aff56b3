//! Who is typing into the console.
//!
//! The technician id is resolved through a chain:
//!
//! 1. `--as <id>`: explicit per-run override
//! 2. `FIELDBOOK_USER` env var
//! 3. `default-user` in `~/.fieldbook/config.toml`

use std::env;

use crate::model::UserId;

/// Error message shown when no technician id can be resolved.
pub const USER_REQUIRED: &str = "technician id required: pass --as <id>, \
    set FIELDBOOK_USER, or add `default-user = <id>` to ~/.fieldbook/config.toml";

/// Resolve the acting technician from the chain.
pub fn resolve_user(explicit: Option<i64>, default_user: Option<i64>) -> Result<UserId, String> {
    resolve_with(explicit, env::var("FIELDBOOK_USER").ok(), default_user)
}

fn resolve_with(
    explicit: Option<i64>,
    from_env: Option<String>,
    default_user: Option<i64>,
) -> Result<UserId, String> {
    if let Some(id) = explicit {
        return Ok(UserId(id));
    }

    if let Some(raw) = from_env
        && !raw.is_empty()
    {
        return raw
            .trim()
            .parse()
            .map(UserId)
            .map_err(|_| format!("FIELDBOOK_USER is not a numeric id: {raw:?}"));
    }

    default_user.map(UserId).ok_or_else(|| USER_REQUIRED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_wins() {
        assert_eq!(
            resolve_with(Some(7), Some("8".into()), Some(9)).unwrap(),
            UserId(7)
        );
    }

    #[test]
    fn env_beats_config() {
        assert_eq!(resolve_with(None, Some("8".into()), Some(9)).unwrap(), UserId(8));
        assert_eq!(resolve_with(None, Some(String::new()), Some(9)).unwrap(), UserId(9));
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let err = resolve_with(None, Some("ana".into()), Some(9)).unwrap_err();
        assert!(err.contains("FIELDBOOK_USER"));
    }

    #[test]
    fn nothing_resolves_to_an_error() {
        assert_eq!(resolve_with(None, None, None).unwrap_err(), USER_REQUIRED);
    }
}
