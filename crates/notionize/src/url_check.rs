use url::Url;

/// Whether `value` is an absolute `http(s)` URL with a host, or a `mailto:` URL.
pub fn is_valid_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => match url.scheme() {
            "http" | "https" => url.host_str().is_some_and(|host| !host.is_empty()),
            "mailto" => !url.path().is_empty(),
            _ => false,
        },
        Err(_) => false,
    }
}
