use crate::UrlError;
use url::Url;

/// Parses a listing URL, accepting only HTTP and HTTPS
///
/// # Examples
///
/// ```
/// use listing_sweep::url::parse_listing_url;
///
/// assert!(parse_listing_url("https://shop.example/list").is_ok());
/// assert!(parse_listing_url("ftp://shop.example/list").is_err());
/// ```
pub fn parse_listing_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    Ok(url)
}

/// Returns the origin (scheme, host and port) of a URL as a URL with an empty path
pub fn site_origin(url: &Url) -> Result<Url, UrlError> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(UrlError::OpaqueOrigin(url.to_string()));
    }
    Url::parse(&origin.ascii_serialization()).map_err(|e| UrlError::Parse(e.to_string()))
}

/// Resolves a possibly relative href against the site origin
///
/// Absolute hrefs are returned as-is; protocol-relative and path hrefs take the
/// origin's scheme and host.
pub fn absolutize(href: &str, origin: &Url) -> Result<Url, UrlError> {
    origin
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))
}

/// Keeps only scheme, host and path of an absolute URL
///
/// Query string and fragment are dropped. Input that does not parse as an
/// absolute URL, or that has no host-based origin, comes back unchanged.
///
/// # Examples
///
/// ```
/// use listing_sweep::url::strip_query;
///
/// assert_eq!(
///     strip_query("https://img.example/image/312/312/x.jpeg?q=70"),
///     "https://img.example/image/312/312/x.jpeg"
/// );
/// assert_eq!(strip_query("/relative.png?x=1"), "/relative.png?x=1");
/// ```
pub fn strip_query(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) if url.origin().is_tuple() => {
            format!("{}{}", url.origin().ascii_serialization(), url.path())
        }
        _ => raw.to_string(),
    }
}
