// Identity resolution: access token -> stable subject id and display name.

use std::collections::HashMap;
use std::future::Future;

/// A resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable subject id; keys presence rows and nicknames.
    pub subject_id: String,
    pub display_name: String,
}

impl Identity {
    /// Build an identity, deriving the display name from the subject when the
    /// profile has none.
    pub fn new(subject_id: impl Into<String>, display_name: Option<&str>) -> Self {
        let subject_id = subject_id.into();
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| presentable_subject(&subject_id).to_string());
        Self { subject_id, display_name }
    }
}

/// Resolves access tokens to identities. Trait-based so the presence store can
/// run against a real profile service or a fixed table in tests.
pub trait IdentityResolver: Send + Sync + 'static {
    fn resolve(&self, token: &str) -> impl Future<Output = Option<Identity>> + Send;
}

/// Resolver backed by a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: &str, identity: Identity) -> Self {
        self.tokens.insert(token.to_string(), identity);
        self
    }
}

impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).cloned()
    }
}

/// E-mail-like subjects show their local part.
pub fn presentable_subject(subject: &str) -> &str {
    match subject.split_once('@') {
        Some((local, _)) if local.chars().count() > 1 => local,
        _ => subject,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_local_part_is_presentable() {
        assert_eq!(presentable_subject("jane.doe@example.com"), "jane.doe");
        assert_eq!(presentable_subject("j@example.com"), "j@example.com");
        assert_eq!(presentable_subject("ABC123@AdobeID"), "ABC123");
        assert_eq!(presentable_subject("opaque-sub"), "opaque-sub");
    }

    #[test]
    fn display_name_falls_back_to_subject() {
        assert_eq!(Identity::new("kim@example.com", None).display_name, "kim");
        assert_eq!(Identity::new("kim@example.com", Some("  ")).display_name, "kim");
        assert_eq!(Identity::new("kim@example.com", Some("Kim")).display_name, "Kim");
    }

    #[tokio::test]
    async fn static_resolver_looks_up_tokens() {
        let resolver =
            StaticIdentityResolver::new().with("tok-1", Identity::new("sub-1", Some("Ana")));

        assert_eq!(resolver.resolve("tok-1").await.unwrap().subject_id, "sub-1");
        assert!(resolver.resolve("nope").await.is_none());
    }
}
