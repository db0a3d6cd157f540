use super::ArtworkError;
use std::net::IpAddr;
use std::path::PathBuf;
use url::{Host, Url};

/// Where a piece of artwork lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkSource {
    Remote(Url),
    Local(PathBuf),
}

impl ArtworkSource {
    /// Classify an artwork reference.
    ///
    /// `http`/`https` URLs are fetched, `file:` URLs and bare paths are read
    /// from disk. Any other scheme is rejected, as are loopback and private
    /// hosts unless `allow_private` is set.
    pub fn parse(raw: &str, allow_private: bool) -> Result<Self, ArtworkError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ArtworkError::Missing);
        }

        let url = match Url::parse(raw) {
            Ok(url) => url,
            // Relative and absolute paths have no scheme.
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(Self::Local(PathBuf::from(raw)));
            }
            Err(e) => return Err(ArtworkError::InvalidSource(e.to_string())),
        };

        match url.scheme() {
            "http" | "https" => {
                if !allow_private {
                    reject_private_host(&url)?;
                }
                Ok(Self::Remote(url))
            }
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|()| ArtworkError::InvalidSource(raw.to_owned())),
            // `C:\covers\a.png` parses with a one-letter scheme.
            scheme if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(raw))),
            scheme => Err(ArtworkError::InvalidSource(format!(
                "unsupported scheme '{scheme}'"
            ))),
        }
    }
}

/// Refuse loopback, private and link-local hosts.
pub(crate) fn reject_private_host(url: &Url) -> Result<(), ArtworkError> {
    let host = url
        .host()
        .ok_or_else(|| ArtworkError::InvalidSource(url.to_string()))?;

    let ip = match host {
        Host::Domain(name) if name.eq_ignore_ascii_case("localhost") => {
            return Err(ArtworkError::PrivateHost(name.to_owned()));
        }
        Host::Domain(_) => return Ok(()),
        Host::Ipv4(v4) => IpAddr::V4(v4),
        Host::Ipv6(v6) => IpAddr::V6(v6),
    };

    if is_private_ip(&ip) {
        return Err(ArtworkError::PrivateHost(ip.to_string()));
    }
    Ok(())
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local, fe80::/10 link local
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}
