//! Routing host resolution

/// Host names a container should be reachable under.
///
/// Normally this is `<hostname>.<root_domain>`. A container whose
/// `<hostname>.<domainname>` is exactly the root domain is the apex: it is
/// served under the root domain itself and, when an alias is configured,
/// under `<root_subdomain>.<root_domain>` as well.
pub fn resolve_hosts(
    hostname: &str,
    domainname: &str,
    root_domain: &str,
    root_subdomain: Option<&str>,
) -> Vec<String> {
    let container_host = format!("{}.{}", hostname, domainname);

    if container_host != root_domain {
        return vec![format!("{}.{}", hostname, root_domain)];
    }

    let mut hosts = vec![container_host];
    if let Some(sub) = root_subdomain.filter(|s| !s.is_empty()) {
        let alias = format!("{}.{}", sub, root_domain);
        if !hosts.contains(&alias) {
            hosts.push(alias);
        }
    }
    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_case() {
        assert_eq!(resolve_hosts("web1", "", "local", None), vec!["web1.local"]);
        assert_eq!(
            resolve_hosts("api", "internal", "example.com", Some("www")),
            vec!["api.example.com"]
        );
    }

    #[test]
    fn test_apex_with_alias() {
        assert_eq!(
            resolve_hosts("example", "com", "example.com", Some("www")),
            vec!["example.com", "www.example.com"]
        );
    }

    #[test]
    fn test_apex_without_alias() {
        assert_eq!(
            resolve_hosts("example", "com", "example.com", None),
            vec!["example.com"]
        );
        assert_eq!(
            resolve_hosts("example", "com", "example.com", Some("")),
            vec!["example.com"]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(resolve_hosts("", "", "", None), vec!["."]);
        assert_eq!(resolve_hosts("", "", "local", Some("www")), vec![".local"]);
        // "." == "." makes this the apex
        assert_eq!(resolve_hosts("", "", ".", Some("www")), vec![".", "www.."]);
    }

    #[test]
    fn test_domain_alone_is_not_apex() {
        assert_eq!(
            resolve_hosts("web", "example.com", "example.com", Some("www")),
            vec!["web.example.com"]
        );
    }
}
