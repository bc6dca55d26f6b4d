// System-under-test boundary: a synchronous URL parser surfacing the JS
// model, plus the bundled adapter over the `url` crate.

use url::Url;

use crate::core::values::UrlValues;

/// The implementation being validated.
///
/// Callable without suspension; the harness treats it as a pure function of
/// (input, base). `None` means the implementation rejects the input.
pub trait SystemUnderTest: Send + Sync {
    fn parse(&self, input: &str, base: Option<&str>) -> Option<UrlValues>;
}

impl<F> SystemUnderTest for F
where
    F: Fn(&str, Option<&str>) -> Option<UrlValues> + Send + Sync,
{
    fn parse(&self, input: &str, base: Option<&str>) -> Option<UrlValues> {
        self(input, base)
    }
}

/// The `url` crate rendered through the JS model's conventions: trailing
/// `:` on protocol, leading `?`/`#` on non-empty search/hash, host with the
/// explicit port only, `"null"` origins serialized as such.
pub struct RustUrl;

impl SystemUnderTest for RustUrl {
    fn parse(&self, input: &str, base: Option<&str>) -> Option<UrlValues> {
        let base_url = match base {
            Some(base) if !base.is_empty() => Some(Url::parse(base).ok()?),
            _ => None,
        };
        let url = Url::options().base_url(base_url.as_ref()).parse(input).ok()?;

        let hostname = url.host_str().unwrap_or("").to_string();
        let port = url.port().map(|port| port.to_string()).unwrap_or_default();
        let host = if hostname.is_empty() {
            String::new()
        } else if port.is_empty() {
            hostname.clone()
        } else {
            format!("{hostname}:{port}")
        };
        Some(UrlValues {
            href: url.as_str().to_string(),
            origin: Some(url.origin().ascii_serialization()),
            protocol: format!("{}:", url.scheme()),
            username: url.username().to_string(),
            password: url.password().unwrap_or("").to_string(),
            host: Some(host),
            hostname,
            port,
            pathname: url.path().to_string(),
            search: prefixed('?', url.query()),
            hash: prefixed('#', url.fragment()),
        })
    }
}

fn prefixed(prefix: char, part: Option<&str>) -> String {
    match part {
        Some(part) if !part.is_empty() => format!("{prefix}{part}"),
        _ => String::new(),
    }
}
