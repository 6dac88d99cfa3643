//! Magic links and share helpers.
//!
//! A magic link is the page URL with a `setup` query parameter carrying the
//! base64 remote config. Opening it on a new device persists the config so the
//! next start joins cloud mode.

use async_trait::async_trait;

use crate::config::RemoteConfig;
use crate::errors::{Notice, RosterError};
use crate::store::{save_remote_config, LocalStore};

/// Query parameter carrying the setup code.
pub const SETUP_PARAM: &str = "setup";

const QR_CODE_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/?size=300x300&data=";

/// `url` without its query string or fragment.
pub fn base_url(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Percent-encode everything except the characters `encodeURIComponent` leaves alone.
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Query-value decoding: `+` becomes a space and `%XX` escapes are resolved.
/// Malformed escapes are kept literally.
fn decode_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(decoded) => {
                        out.push(decoded);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Value of the `setup` parameter in `url`, decoded.
pub fn setup_code_from_url(url: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SETUP_PARAM)
        .map(|(_, value)| decode_component(value))
        .filter(|code| !code.trim().is_empty())
}

/// Magic link for `config` rooted at the page `page_url`.
pub fn magic_link(page_url: &str, config: &RemoteConfig) -> Result<String, RosterError> {
    let code = config.to_setup_code()?;
    Ok(format!(
        "{}?{}={}",
        base_url(page_url),
        SETUP_PARAM,
        encode_component(&code)
    ))
}

/// Image URL of a QR code for `page_url`.
pub fn qr_code_url(page_url: &str) -> String {
    format!("{}{}", QR_CODE_ENDPOINT, encode_component(page_url))
}

/// A config imported from a magic link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkImport {
    pub config: RemoteConfig,
    /// The page URL with the setup parameter stripped
    pub clean_url: String,
}

impl MagicLinkImport {
    pub fn notice(&self) -> Notice {
        Notice::success(
            "Cloud setup received",
            format!(
                "Connected to project {}. Restart to start syncing.",
                self.config.project_id()
            ),
        )
    }
}

/// Persist the config carried by `url`, if there is one.
///
/// Returns `Ok(None)` when the URL has no setup code or the code is malformed
/// (logged). Only a local storage failure is an error.
pub async fn ingest_magic_link(
    local: &dyn LocalStore,
    url: &str,
) -> Result<Option<MagicLinkImport>, RosterError> {
    let Some(code) = setup_code_from_url(url) else {
        return Ok(None);
    };
    let config = match RemoteConfig::from_setup_code(&code) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Ignoring malformed magic link: {}", err);
            return Ok(None);
        }
    };

    save_remote_config(local, &config).await?;
    tracing::info!("Imported cloud configuration for {}", config.project_id());
    Ok(Some(MagicLinkImport {
        config,
        clean_url: base_url(url).to_string(),
    }))
}

/// System clipboard, when the host has one.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Where a share link ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Copied(String),
    /// Clipboard missing or refused; the user has to copy the URL by hand.
    ManualCopy(String),
}

impl ShareOutcome {
    pub fn url(&self) -> &str {
        match self {
            ShareOutcome::Copied(url) | ShareOutcome::ManualCopy(url) => url,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            ShareOutcome::Copied(_) => Notice::success(
                "Link copied",
                "Send it to the other devices to join the cloud roster.",
            ),
            ShareOutcome::ManualCopy(url) => {
                Notice::info("Copy this link", format!("Copy it manually: {url}"))
            }
        }
    }
}

/// Build the magic link for the saved config and try to copy it.
pub async fn share_magic_link(
    config: Option<&RemoteConfig>,
    current_url: &str,
    clipboard: Option<&dyn Clipboard>,
) -> Result<ShareOutcome, RosterError> {
    let Some(config) = config else {
        return Err(RosterError::ConfigInvalid(
            "Enable the cloud database before sharing a setup link".to_string(),
        ));
    };
    let url = magic_link(current_url, config)?;

    let Some(clipboard) = clipboard else {
        return Ok(ShareOutcome::ManualCopy(url));
    };
    match clipboard.write_text(&url).await {
        Ok(()) => Ok(ShareOutcome::Copied(url)),
        Err(e) => {
            tracing::warn!("Clipboard write failed: {}", e);
            Ok(ShareOutcome::ManualCopy(url))
        }
    }
}
