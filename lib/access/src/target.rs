//! Post-login redirect targets.
//!
//! A target is accepted only if it stays on this site: a local absolute
//! path, or an `https` URL whose host is the request host or falls within
//! the session cookie's domain.

use url::Url;

/// Returns `target` if it is safe to redirect to after login.
#[must_use]
pub fn sanitize_target(target: &str, request_host: Option<&str>, cookie_domain: &str) -> Option<String> {
    let target = target.trim();
    // Browsers drop tabs and newlines while parsing, so `/\t/host` would
    // turn into a protocol-relative URL.
    if target.is_empty()
        || target
            .chars()
            .any(|c| c == '\\' || c.is_control() || c.is_whitespace())
    {
        return None;
    }

    if target.starts_with('/') {
        return (!target.starts_with("//")).then(|| target.to_string());
    }

    let url = Url::parse(target).ok()?;
    if url.scheme() != "https" || !url.username().is_empty() || url.password().is_some() {
        return None;
    }
    let host = url.host_str()?;

    let same_host = request_host.is_some_and(|request_host| {
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        authority.eq_ignore_ascii_case(request_host)
    });

    (same_host || within_domain(host, cookie_domain)).then(|| url.to_string())
}

fn within_domain(host: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.');
    if domain.is_empty() {
        return false;
    }
    let host = host.to_ascii_lowercase();
    let domain = domain.to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}
