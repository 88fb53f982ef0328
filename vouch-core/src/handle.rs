//! Identity handles - `platform:username` descriptors
//!
//! A handle names an identity on some platform ("github:mitchellh") or on no
//! platform in particular ("mitchellh"). Comparison is case-insensitive on
//! both components; the original casing is always retained for display and
//! storage.

/// A parsed `[platform:]username` identity descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    /// Platform qualifier, absent when the handle names a bare username
    pub platform: Option<String>,
    pub username: String,
}

impl Handle {
    /// Parse a raw handle string, splitting on the first `:`
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((platform, username)) => Handle {
                platform: Some(platform.to_string()),
                username: username.to_string(),
            },
            None => Handle {
                platform: None,
                username: raw.to_string(),
            },
        }
    }

    /// The raw `[platform:]username` text of this handle
    pub fn raw(&self) -> String {
        match &self.platform {
            Some(platform) => format!("{}:{}", platform, self.username),
            None => self.username.clone(),
        }
    }

    /// Whether two handles name the same identity.
    ///
    /// Usernames must match case-insensitively. Platforms are compatible when
    /// neither side names one, when either side's resolved platform (explicit,
    /// falling back to `default_platform`) is still absent, or when both
    /// resolved platforms are equal case-insensitively. An entry without a
    /// platform therefore acts as a wildcard when no default is configured.
    pub fn matches(&self, other: &Handle, default_platform: Option<&str>) -> bool {
        if !self.username.eq_ignore_ascii_case(&other.username) {
            return false;
        }

        match (&self.platform, &other.platform) {
            (None, None) => true,
            _ => {
                let a = self.platform.as_deref().or(default_platform);
                let b = other.platform.as_deref().or(default_platform);
                match (a, b) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    _ => true,
                }
            }
        }
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.platform {
            Some(platform) => write!(f, "{}:{}", platform, self.username),
            None => write!(f, "{}", self.username),
        }
    }
}
