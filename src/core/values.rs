// URL property snapshot shared by the reference engine and the system under
// test, plus the field-wise diff used for mismatch classification.

use serde::{Deserialize, Serialize};

/// Identifier for one observable URL property.
///
/// The set is closed; `ALL` fixes the comparison and display order.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UrlProperty {
    Href,
    Origin,
    Protocol,
    Username,
    Password,
    Host,
    Hostname,
    Port,
    Pathname,
    Search,
    Hash,
}

impl UrlProperty {
    pub const ALL: [UrlProperty; 11] = [
        UrlProperty::Href,
        UrlProperty::Origin,
        UrlProperty::Protocol,
        UrlProperty::Username,
        UrlProperty::Password,
        UrlProperty::Host,
        UrlProperty::Hostname,
        UrlProperty::Port,
        UrlProperty::Pathname,
        UrlProperty::Search,
        UrlProperty::Hash,
    ];

    /// The JS-model property name, as serialized by the reference engine.
    pub fn name(self) -> &'static str {
        match self {
            UrlProperty::Href => "href",
            UrlProperty::Origin => "origin",
            UrlProperty::Protocol => "protocol",
            UrlProperty::Username => "username",
            UrlProperty::Password => "password",
            UrlProperty::Host => "host",
            UrlProperty::Hostname => "hostname",
            UrlProperty::Port => "port",
            UrlProperty::Pathname => "pathname",
            UrlProperty::Search => "search",
            UrlProperty::Hash => "hash",
        }
    }
}

/// A parsed URL's public surface in the WHATWG JS model.
///
/// Constructed once per parse and never mutated. Empty strings are real
/// values (an empty search, say); `origin` and `host` are `None` when the
/// producing side cannot report them at all.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct UrlValues {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub protocol: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub hostname: String,
    pub port: String,
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

impl UrlValues {
    /// Reads one property; `None` for optional properties the producer
    /// could not report.
    pub fn get(&self, property: UrlProperty) -> Option<&str> {
        match property {
            UrlProperty::Href => Some(&self.href),
            UrlProperty::Origin => self.origin.as_deref(),
            UrlProperty::Protocol => Some(&self.protocol),
            UrlProperty::Username => Some(&self.username),
            UrlProperty::Password => Some(&self.password),
            UrlProperty::Host => self.host.as_deref(),
            UrlProperty::Hostname => Some(&self.hostname),
            UrlProperty::Port => Some(&self.port),
            UrlProperty::Pathname => Some(&self.pathname),
            UrlProperty::Search => Some(&self.search),
            UrlProperty::Hash => Some(&self.hash),
        }
    }
}

/// Returns the properties on which `a` and `b` disagree.
///
/// Both sides absent means agreement (both consider the input invalid);
/// exactly one side absent flags every property, since there is nothing to
/// compare field-by-field. Values compare by plain string equality, absent
/// optional fields only equal to absent.
pub fn diff(a: Option<&UrlValues>, b: Option<&UrlValues>) -> Vec<UrlProperty> {
    match (a, b) {
        (None, None) => Vec::new(),
        (Some(_), None) | (None, Some(_)) => UrlProperty::ALL.to_vec(),
        (Some(a), Some(b)) => UrlProperty::ALL
            .into_iter()
            .filter(|property| a.get(*property) != b.get(*property))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{diff, UrlProperty, UrlValues};

    fn sample() -> UrlValues {
        UrlValues {
            href: "http://user:pw@example.com:8080/p?q#f".to_string(),
            origin: Some("http://example.com:8080".to_string()),
            protocol: "http:".to_string(),
            username: "user".to_string(),
            password: "pw".to_string(),
            host: Some("example.com:8080".to_string()),
            hostname: "example.com".to_string(),
            port: "8080".to_string(),
            pathname: "/p".to_string(),
            search: "?q".to_string(),
            hash: "#f".to_string(),
        }
    }

    #[test]
    fn diff_of_equal_values_is_empty() {
        let values = sample();
        assert!(diff(Some(&values), Some(&values)).is_empty());
        assert!(diff(None, None).is_empty());
    }

    #[test]
    fn one_sided_absence_flags_every_property() {
        let values = sample();
        assert_eq!(diff(Some(&values), None), UrlProperty::ALL.to_vec());
        assert_eq!(diff(None, Some(&values)), UrlProperty::ALL.to_vec());
    }

    #[test]
    fn diff_is_symmetric_and_field_precise() {
        let a = sample();
        let mut b = sample();
        b.pathname = "/other".to_string();
        b.origin = None;

        let forward = diff(Some(&a), Some(&b));
        let backward = diff(Some(&b), Some(&a));
        assert_eq!(forward, backward);
        assert_eq!(forward, vec![UrlProperty::Origin, UrlProperty::Pathname]);
    }

    #[test]
    fn absent_optional_fields_compare_equal() {
        let mut a = sample();
        let mut b = sample();
        a.host = None;
        b.host = None;
        assert!(diff(Some(&a), Some(&b)).is_empty());
    }

    #[test]
    fn empty_string_differs_from_absent() {
        let mut a = sample();
        let mut b = sample();
        a.origin = Some(String::new());
        b.origin = None;
        assert_eq!(diff(Some(&a), Some(&b)), vec![UrlProperty::Origin]);
    }
}
