//! Credential loading for the inference endpoint.
//!
//! The credential file is the standard `~/.oci/config` INI layout. Only the
//! keys needed to authenticate are read; everything else in the file is
//! treated as opaque. All failure modes here are fatal at client
//! construction time.

use crate::config::expand_home;
use crate::error::InferenceError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const SESSION_TOKEN_KEY: &str = "security_token_file";

/// Opaque auth material for the inference client: a session token sent as a
/// bearer credential on every request.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    token: String,
}

impl SessionAuth {
    pub fn bearer_token(&self) -> &str {
        &self.token
    }
}

/// Reads the given profile from the credential file and loads the session
/// token the profile points at.
pub fn load_session_auth(
    config_location: &Path,
    profile: &str,
) -> Result<SessionAuth, InferenceError> {
    let raw = fs::read_to_string(config_location).map_err(|error| {
        InferenceError::Credentials(format!(
            "cannot read credential file {}: {error}",
            config_location.display()
        ))
    })?;

    let section = parse_profile(&raw, profile).ok_or_else(|| {
        InferenceError::Credentials(format!(
            "profile [{profile}] not found in {}",
            config_location.display()
        ))
    })?;

    let token_path = section.get(SESSION_TOKEN_KEY).ok_or_else(|| {
        InferenceError::Credentials(format!(
            "profile [{profile}] has no {SESSION_TOKEN_KEY} entry"
        ))
    })?;

    let token_path = expand_home(token_path);
    let token = fs::read_to_string(&token_path).map_err(|error| {
        InferenceError::Credentials(format!(
            "cannot read session token {}: {error}",
            token_path.display()
        ))
    })?;

    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(InferenceError::Credentials(format!(
            "session token {} is empty",
            token_path.display()
        )));
    }

    Ok(SessionAuth { token })
}

/// Returns the key/value pairs of one `[profile]` section, or `None` if the
/// section does not exist.
fn parse_profile(raw: &str, profile: &str) -> Option<HashMap<String, String>> {
    let mut current: Option<String> = None;
    let mut section = HashMap::new();
    let mut found = false;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            current = Some(name.trim().to_string());
            if current.as_deref() == Some(profile) {
                found = true;
            }
            continue;
        }

        if current.as_deref() != Some(profile) {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            section.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    if found {
        Some(section)
    } else {
        None
    }
}
