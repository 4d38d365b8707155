//! Parsed URL components.

use std::fmt::{Display, Formatter};

use crate::utils::escape::escape;

/// Characters escaped in user names and passwords when printing a URL.
const USERINFO_ESCAPE_SET: &[u8] = b"%:@/ ";

/// Components of a network URL.
///
/// `port` is 0 when the URL does not name one. `path` always starts with
/// `/` and defaults to `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    pub proto: String,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub path: String,
}

impl ParsedUrl {
    pub fn is_ipv6(&self) -> bool {
        self.host.contains(':')
    }

    /// Host and optional port as written in a request, brackets included
    /// for IPv6 literals.
    pub fn authority(&self) -> String {
        let host = if self.is_ipv6() {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        match self.port {
            0 => host,
            port => format!("{host}:{port}"),
        }
    }

    /// Port to connect to, falling back to `default` when unspecified.
    pub fn port_or(&self, default: u16) -> u16 {
        match self.port {
            0 => default,
            port => port,
        }
    }
}

impl Display for ParsedUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://", self.proto)?;

        if let Some(user) = &self.user {
            write!(f, "{}", escape(user, USERINFO_ESCAPE_SET))?;
            if let Some(password) = &self.password {
                write!(f, ":{}", escape(password, USERINFO_ESCAPE_SET))?;
            }
            write!(f, "@")?;
        }

        write!(f, "{}{}", self.authority(), self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reassembles_url() {
        let url = ParsedUrl {
            proto: "http".into(),
            host: "::1".into(),
            port: 8080,
            user: Some("a b".into()),
            password: Some("p@ss".into()),
            path: "/x".into(),
        };
        assert_eq!(url.authority(), "[::1]:8080");
        assert_eq!(url.to_string(), "http://a%20b:p%40ss@[::1]:8080/x");

        let url = ParsedUrl {
            proto: "mms".into(),
            host: "example.org".into(),
            path: "/".into(),
            ..Default::default()
        };
        assert_eq!(url.to_string(), "mms://example.org/");
        assert_eq!(url.port_or(1755), 1755);
    }
}
