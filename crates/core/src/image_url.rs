//! Resolution of stored image references into client-facing URLs.
//!
//! Stored references are either absolute URLs (remote blob storage) or
//! relative media paths (local blob storage). Clients always receive an
//! absolute HTTPS URL where one can be built:
//!
//! | Stored reference | Request origin known          | Result                                  |
//! |------------------|-------------------------------|-----------------------------------------|
//! | `http://...`     | any                           | scheme rewritten to `https://`          |
//! | `https://...`    | any                           | unchanged                               |
//! | relative path    | yes, non-local host           | `https://{host}{path}`                  |
//! | relative path    | yes, local host               | `{scheme}://{host}{path}`               |
//! | relative path    | no, production                | `{public_base_url}{path}`               |
//! | relative path    | no, development               | unchanged                               |

use std::net::{Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

/// Deployment mode, selected by the `APP_ENV` environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Production,
}

impl DeploymentMode {
    /// Parse `APP_ENV`-style values. Anything unrecognised is production.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => DeploymentMode::Development,
            _ => DeploymentMode::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == DeploymentMode::Development
    }
}

/// Scheme and host of the request being answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }
}

/// Deployment-wide inputs to URL resolution.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    pub mode: DeploymentMode,
    /// Base URL used when no request origin is available in production.
    pub public_base_url: String,
}

fn is_local(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(name)) => name.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr == Ipv4Addr::LOCALHOST,
        Some(Host::Ipv6(addr)) => addr == Ipv6Addr::LOCALHOST,
        None => false,
    }
}

/// Whether `host` (optionally with a port) is a local development host.
pub fn is_local_host(host: &str) -> bool {
    Url::parse(&format!("http://{host}/")).is_ok_and(|url| is_local(&url))
}

fn upgrade(mut url: Url) -> Url {
    if url.scheme() == "http" {
        // http -> https is always an allowed scheme change.
        let _ = url.set_scheme("https");
    }
    url
}

/// Rewrite an `http` URL (scheme in any case) to `https`.
///
/// Input that does not parse as an absolute URL is returned unchanged.
pub fn force_https(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => upgrade(parsed).into(),
        Err(_) => url.to_string(),
    }
}

/// Parse `stored` as an absolute `http`/`https` URL.
fn parse_absolute(stored: &str) -> Option<Url> {
    Url::parse(stored)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Parse `raw` as a base URL whose path ends in `/`, so joins append to it.
fn base_url(raw: &str) -> Option<Url> {
    let mut url = Url::parse(raw).ok()?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Some(url)
}

fn join_path(base: &str, path: &str) -> Option<Url> {
    base_url(base)?.join(path.trim_start_matches('/')).ok()
}

/// Resolve a stored image reference for output.
pub fn resolve_image_url(
    stored: &str,
    origin: Option<&RequestOrigin>,
    policy: &UrlPolicy,
) -> String {
    if let Some(url) = parse_absolute(stored) {
        return upgrade(url).into();
    }

    match origin {
        Some(origin) => {
            match join_path(&format!("{}://{}", origin.scheme, origin.host), stored) {
                Some(url) if is_local(&url) => url.into(),
                Some(url) => upgrade(url).into(),
                None => stored.to_string(),
            }
        }
        None if policy.mode.is_development() => stored.to_string(),
        None => join_path(&policy.public_base_url, stored)
            .map(String::from)
            .unwrap_or_else(|| stored.to_string()),
    }
}
