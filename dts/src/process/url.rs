use std::str::FromStr;

use log::trace;

use crate::structs::url::ParsedUrl;
use crate::utils::errors::UrlError;
use crate::utils::escape::{escape_path, unescape};

pub const SCHEME_SEPARATOR: &str = "://";

/// Start of the path within the text after the scheme separator.
///
/// Paths begin at the first `/`, or at the first `;` when it comes
/// earlier. The `;` form is used by legacy streaming servers.
fn find_path_start(rest: &str) -> Option<usize> {
    let slash = rest.find('/');
    match (rest.find(';'), slash) {
        (Some(semicolon), Some(slash)) if semicolon < slash => Some(semicolon),
        (Some(semicolon), None) => Some(semicolon),
        (_, slash) => slash,
    }
}

fn parse_port(text: &str) -> Result<u16, UrlError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UrlError::InvalidPort(text.to_string()));
    }

    text.parse().map_err(|_| UrlError::InvalidPort(text.to_string()))
}

fn non_empty(text: &str, err: UrlError) -> Result<String, UrlError> {
    if text.is_empty() {
        Err(err)
    } else {
        Ok(text.to_string())
    }
}

/// Splits `user[:password]`, unescaping both parts.
fn parse_userinfo(userinfo: &str) -> Result<(String, Option<String>), UrlError> {
    match userinfo.split_once(':') {
        Some((user, password)) => {
            let user = non_empty(user, UrlError::EmptyUser)?;
            let password = non_empty(password, UrlError::EmptyPassword)?;
            Ok((
                unescape(&user).into_owned(),
                Some(unescape(&password).into_owned()),
            ))
        }
        None => {
            let user = non_empty(userinfo, UrlError::EmptyUser)?;
            Ok((unescape(&user).into_owned(), None))
        }
    }
}

/// Parses `[host]` or `[host]:port`. A `/` may follow the port.
fn parse_ipv6_host(text: &str) -> Result<(String, u16), UrlError> {
    let close = text.find(']').ok_or(UrlError::UnterminatedIpv6)?;
    let host = non_empty(&text[1..close], UrlError::EmptyHost)?;

    let mut port = 0;
    if let Some(port_text) = text[close + 1..].strip_prefix(':') {
        let digits = port_text.split('/').next().unwrap_or_default();
        port = parse_port(digits)?;
    }

    Ok((host, port))
}

/// Parses `host`, `host:port` up to the path boundary `end`.
fn parse_host(text: &str, end: Option<usize>) -> Result<(String, u16), UrlError> {
    let authority = match end {
        Some(end) => &text[..end],
        None => text,
    };

    match authority.split_once(':') {
        Some((host, port)) => Ok((non_empty(host, UrlError::EmptyHost)?, parse_port(port)?)),
        None => Ok((non_empty(authority, UrlError::EmptyHost)?, 0)),
    }
}

/// Parses a URL into its components.
///
/// An `@` is only taken as the end of the user information when it comes
/// before the path boundary; later ones belong to the path. Paths starting
/// with `;` are prefixed with `/` and left unescaped, other paths get their
/// spaces and `#` characters percent escaped.
pub fn parse(url: &str) -> Result<ParsedUrl, UrlError> {
    let scheme_end = url
        .find(SCHEME_SEPARATOR)
        .ok_or(UrlError::MissingSchemeSeparator)?;
    if scheme_end == 0 {
        return Err(UrlError::EmptyScheme);
    }

    let proto = url[..scheme_end].to_string();
    let rest = &url[scheme_end + SCHEME_SEPARATOR.len()..];

    let path_start = find_path_start(rest);
    let at = rest
        .find('@')
        .filter(|&at| path_start.is_none_or(|p| at < p));

    let (user, password, host_start) = match at {
        Some(at) => {
            let (user, password) = parse_userinfo(&rest[..at])?;
            (Some(user), password, at + 1)
        }
        None => (None, None, 0),
    };

    let host_text = &rest[host_start..];
    let (host, port) = if host_text.starts_with('[') {
        parse_ipv6_host(host_text)?
    } else {
        parse_host(host_text, path_start.map(|p| p - host_start))?
    };

    let path = match path_start.map(|p| &rest[p..]) {
        None => "/".to_string(),
        Some(path) if path.starts_with(';') => format!("/{path}"),
        Some(path) => escape_path(path).into_owned(),
    };

    let parsed = ParsedUrl {
        proto,
        host,
        port,
        user,
        password,
        path,
    };
    trace!("{url} => {parsed:?}");

    Ok(parsed)
}

impl FromStr for ParsedUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}
