//! Session cookie settings read from the process environment.
//!
//! | Variable                  | Debug default      | Release            |
//! |---------------------------|--------------------|--------------------|
//! | `SESSION_KEY_FILE`        | generated key      | key file >= 64 B   |
//! | `SESSION_COOKIE_SECURE`   | `true`             | required           |
//! | `SESSION_SAMESITE`        | `Lax`              | required           |
//! | `SESSION_ALLOW_EPHEMERAL` | `false`            | must be `0`        |
//!
//! Debug builds log a warning and fall back; release builds refuse to start.

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::warn;
use zeroize::Zeroize;

/// Path read when `SESSION_KEY_FILE` is unset.
pub const DEFAULT_KEY_PATH: &str = "/var/run/secrets/session_key";
/// Minimum key file length accepted in release builds.
pub const MIN_KEY_LEN: usize = 64;

const KEY_FILE: &str = "SESSION_KEY_FILE";
const COOKIE_SECURE: &str = "SESSION_COOKIE_SECURE";
const SAME_SITE: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL: &str = "SESSION_ALLOW_EPHEMERAL";
const BOOL_VALUES: &str = "1|0|true|false|yes|no";
const SAME_SITE_VALUES: &str = "Strict|Lax|None";
const FINGERPRINT_BYTES: usize = 8;

/// Whether missing or malformed toggles are tolerated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// The mode matching `cfg!(debug_assertions)`.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    /// Use `fallback` in debug builds and fail with `error` otherwise.
    fn tolerate<T>(
        self,
        fallback: T,
        error: SessionConfigError,
    ) -> Result<T, SessionConfigError> {
        match self {
            Self::Debug => {
                warn!(%error, "session setting falls back to its debug default");
                Ok(fallback)
            }
            Self::Release => Err(error),
        }
    }
}

/// Validated cookie session settings.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

impl SessionSettings {
    /// Hex prefix of the signing key's SHA-256, safe to log.
    #[must_use]
    pub fn key_fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key.signing());
        hex::encode(digest.iter().take(FINGERPRINT_BYTES).copied().collect::<Vec<u8>>())
    }
}

/// Reasons the session settings were rejected.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("{name} is not set")]
    Missing { name: &'static str },
    #[error("{name}='{value}' is invalid; expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("cannot read session key {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key {path} holds {length} bytes; at least {MIN_KEY_LEN} are required")]
    KeyTooShort { path: PathBuf, length: usize },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL=1 is not accepted in release builds")]
    EphemeralInRelease,
}

/// Read and validate the session settings.
///
/// # Errors
///
/// Returns [`SessionConfigError`] when a release build is missing a toggle,
/// a toggle does not parse, or the key file is unreadable or too short.
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = flag(env, mode, COOKIE_SECURE, true)?;
    let same_site = same_site(env, mode, cookie_secure)?;
    let allow_ephemeral = flag(env, mode, ALLOW_EPHEMERAL, false)?;
    if allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralInRelease);
    }
    let key = signing_key(env, mode, allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn flag<E: Env>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    fallback: bool,
) -> Result<bool, SessionConfigError> {
    let Some(value) = env.string(name) else {
        return mode.tolerate(fallback, SessionConfigError::Missing { name });
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => mode.tolerate(
            fallback,
            SessionConfigError::Invalid {
                name,
                value,
                expected: BOOL_VALUES,
            },
        ),
    }
}

fn same_site<E: Env>(
    env: &E,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let fallback = match mode {
        BuildMode::Debug => SameSite::Lax,
        BuildMode::Release => SameSite::Strict,
    };
    let Some(value) = env.string(SAME_SITE) else {
        return mode.tolerate(fallback, SessionConfigError::Missing { name: SAME_SITE });
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" => mode.tolerate(SameSite::None, SessionConfigError::InsecureSameSiteNone),
        _ => mode.tolerate(
            fallback,
            SessionConfigError::Invalid {
                name: SAME_SITE,
                value,
                expected: SAME_SITE_VALUES,
            },
        ),
    }
}

fn signing_key<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE)
            .unwrap_or_else(|| DEFAULT_KEY_PATH.to_owned()),
    );
    let mut bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(source) if mode == BuildMode::Debug || allow_ephemeral => {
            warn!(path = %path.display(), error = %source, "generating an ephemeral session key");
            return Ok(Key::generate());
        }
        Err(source) => return Err(SessionConfigError::KeyRead { path, source }),
    };
    let length = bytes.len();
    let outcome = if mode == BuildMode::Release && length < MIN_KEY_LEN {
        Err(SessionConfigError::KeyTooShort { path, length })
    } else {
        Ok(Key::derive_from(&bytes))
    };
    bytes.zeroize();
    outcome
}
