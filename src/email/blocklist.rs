//! Recipient domains the dispatcher never delivers to.

const BLOCKED_DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "test.com", "localhost"];

const BLOCKED_TLDS: &[&str] = &["test", "invalid", "localhost", "example"];

pub fn is_blocked(recipient: &str) -> bool {
    let Some((_, domain)) = recipient.trim().rsplit_once('@') else {
        return true;
    };
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();

    if BLOCKED_DOMAINS
        .iter()
        .any(|blocked| domain == *blocked || domain.ends_with(&format!(".{blocked}")))
    {
        return true;
    }

    domain
        .rsplit('.')
        .next()
        .is_some_and(|tld| BLOCKED_TLDS.contains(&tld))
}
