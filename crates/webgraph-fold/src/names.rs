//! Helpers for host and domain names in reverse domain name notation
//! (`www.example.com` is written as `com.example.www`).

use crate::suffix::DomainResolver;

/// Reverse a host name, e.g. `www.example.com` becomes `com.example.www`.
/// Applied to a reversed name it restores the original.
pub fn reverse_host(host: &str) -> String {
    let mut labels: Vec<&str> = host.split('.').collect();
    labels.reverse();
    labels.join(".")
}

/// First label of a reversed name, e.g. `com` for `com.example.www`.
pub fn top_level_domain(reversed_name: &str) -> &str {
    match reversed_name.find('.') {
        Some(dot) => &reversed_name[..dot],
        None => reversed_name,
    }
}

/// Registered domain of a reversed host name, also reversed:
/// `uk.org.example.www` gives `uk.org.example`.
///
/// With `strict` set, `None` is returned if no public suffix matches.
pub fn registered_domain_reversed<R: DomainResolver + ?Sized>(
    resolver: &R,
    reversed_host: &str,
    strict: bool,
    include_private: bool,
) -> Option<String> {
    let host = reverse_host(reversed_host);
    let domain = resolver.resolve(&host, strict, include_private)?;
    if domain == host {
        return Some(reversed_host.to_string());
    }
    Some(reverse_host(&domain))
}
