//! Minimal `http://` URL splitting.

use crate::error::Error;

const DEFAULT_PORT: u16 = 80;

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub(crate) host: String,
    pub(crate) port: u16,
    /// Path and query, always starting with `/`.
    pub(crate) path: String,
}

impl Target {
    pub(crate) fn parse(url: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidUrl(url.to_owned());
        let (scheme, rest) = url.split_once("://").ok_or_else(invalid)?;
        if !scheme.eq_ignore_ascii_case("http") {
            return Err(Error::UnsupportedScheme(scheme.to_owned()));
        }
        let rest = rest.split('#').next().unwrap_or_default();
        let (authority, path) = match rest.find(['/', '?']) {
            Some(at) => rest.split_at(at),
            None => (rest, ""),
        };
        if authority.is_empty() || authority.contains('@') {
            return Err(invalid());
        }
        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, after) = bracketed.split_once(']').ok_or_else(invalid)?;
            match after.strip_prefix(':') {
                Some(port) => (host, port.parse().map_err(|_| invalid())?),
                None if after.is_empty() => (host, DEFAULT_PORT),
                None => return Err(invalid()),
            }
        } else {
            match authority.split_once(':') {
                Some((host, port)) => (host, port.parse().map_err(|_| invalid())?),
                None => (authority, DEFAULT_PORT),
            }
        };
        if host.is_empty() {
            return Err(invalid());
        }
        let path = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        };
        Ok(Self {
            host: host.to_owned(),
            port,
            path,
        })
    }

    /// Value of the `Host` header.
    pub(crate) fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == DEFAULT_PORT {
            host
        } else {
            format!("{host}:{}", self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port_and_path() {
        let target = Target::parse("http://localhost:8182/xhr/ascii?x=1").expect("valid");
        assert_eq!(target.host, "localhost");
        assert_eq!(target.port, 8182);
        assert_eq!(target.path, "/xhr/ascii?x=1");
        assert_eq!(target.host_header(), "localhost:8182");
    }

    #[test]
    fn defaults_port_and_path() {
        let target = Target::parse("http://example.com").expect("valid");
        assert_eq!(target.port, 80);
        assert_eq!(target.path, "/");
        assert_eq!(target.host_header(), "example.com");
        let target = Target::parse("http://example.com?q").expect("valid");
        assert_eq!(target.path, "/?q");
    }

    #[test]
    fn accepts_bracketed_ipv6() {
        let target = Target::parse("http://[::1]:9000/").expect("valid");
        assert_eq!(target.host, "::1");
        assert_eq!(target.port, 9000);
        assert_eq!(target.host_header(), "[::1]:9000");
        let target = Target::parse("http://[::1]/").expect("valid");
        assert_eq!(target.port, 80);
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(Target::parse("localhost/x"), Err(Error::InvalidUrl(_))));
        assert!(matches!(Target::parse("http:///x"), Err(Error::InvalidUrl(_))));
        assert!(matches!(Target::parse("http://h:port/"), Err(Error::InvalidUrl(_))));
        assert!(matches!(
            Target::parse("https://example.com/"),
            Err(Error::UnsupportedScheme(scheme)) if scheme == "https"
        ));
    }
}
