use thiserror::Error;
use url::Url;

/// Errors from validating a configured API base URL.
#[derive(Error, Debug)]
pub enum BaseUrlError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// Query strings and fragments would be dropped when paths are appended.
    #[error("Base URL must not contain a query or fragment")]
    HasQueryOrFragment,
}

/// Validate the base URL of the publishing API.
///
/// Accepts `http` and `https` URLs with a host and no query or fragment.
/// Plain `http` to a non-loopback host is allowed but logged, since bearer
/// tokens would travel unencrypted.
///
/// ```
/// use newsdesk::util::validate_base_url;
///
/// assert!(validate_base_url("https://news.example.com/api").is_ok());
/// assert!(validate_base_url("ftp://news.example.com").is_err());
/// assert!(validate_base_url("https://news.example.com/api?x=1").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, BaseUrlError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(BaseUrlError::UnsupportedScheme(scheme.to_owned())),
    }

    let host = url.host_str().ok_or(BaseUrlError::MissingHost)?;

    if url.query().is_some() || url.fragment().is_some() {
        return Err(BaseUrlError::HasQueryOrFragment);
    }

    if url.scheme() == "http" && !is_loopback_host(host) {
        tracing::warn!(base_url = %url, "Using non-HTTPS API base URL");
    }

    Ok(url)
}

fn is_loopback_host(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host.parse::<std::net::IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}
