//! Signed cookies.
//!
//! Every cookie the engine sets is accompanied by a `<name>.sig` cookie
//! holding an HMAC-SHA256 of `name=value`. The key ring signs with its first
//! key and verifies against every key, so keys can be rotated by prepending a
//! new one.

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use cookie::{Cookie, SameSite};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::config::CookieConfig;

type HmacSha256 = Hmac<Sha256>;

/// Cookie signing errors.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The key ring is empty.
    #[error("cookie key ring is empty")]
    EmptyKeyRing,

    /// A key could not be used for HMAC.
    #[error("invalid cookie signing key: {0}")]
    InvalidKey(String),
}

/// HMAC key ring.
#[derive(Clone)]
pub struct KeyGrip {
    keys: Vec<Vec<u8>>,
}

impl KeyGrip {
    /// Creates a key ring. Empty keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CookieError::EmptyKeyRing` if no usable key is given.
    pub fn new<I, K>(keys: I) -> Result<Self, CookieError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let keys: Vec<Vec<u8>> = keys
            .into_iter()
            .map(|k| k.as_ref().to_vec())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(CookieError::EmptyKeyRing);
        }
        Ok(Self { keys })
    }

    /// Signs `data` with the newest key.
    ///
    /// # Errors
    ///
    /// Returns `CookieError::InvalidKey` if the HMAC cannot be keyed.
    pub fn sign(&self, data: &str) -> Result<String, CookieError> {
        let key = self.keys.first().ok_or(CookieError::EmptyKeyRing)?;
        Ok(URL_SAFE_NO_PAD.encode(digest(key, data)?))
    }

    /// Returns the index of the key that produced `signature`, if any.
    #[must_use]
    pub fn index(&self, data: &str, signature: &str) -> Option<usize> {
        let presented = URL_SAFE_NO_PAD.decode(signature).ok()?;
        self.keys.iter().position(|key| {
            HmacSha256::new_from_slice(key)
                .map(|mut mac| {
                    mac.update(data.as_bytes());
                    mac.verify_slice(&presented).is_ok()
                })
                .unwrap_or(false)
        })
    }

    #[must_use]
    pub fn verify(&self, data: &str, signature: &str) -> bool {
        self.index(data, signature).is_some()
    }
}

impl std::fmt::Debug for KeyGrip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGrip")
            .field("keys", &self.keys.len())
            .finish()
    }
}

fn digest(key: &[u8], data: &str) -> Result<Vec<u8>, CookieError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| CookieError::InvalidKey(e.to_string()))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Cookies presented with a request, by name.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies(HashMap<String, String>);

impl RequestCookies {
    /// Parses a `Cookie` request header value.
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        Cookie::split_parse_encoded(header)
            .filter_map(Result::ok)
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for RequestCookies {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Attributes of a cookie the engine sets.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub path: String,
    /// `None` makes a transient (browser session) cookie.
    pub expires: Option<OffsetDateTime>,
    pub http_only: bool,
}

impl CookieOptions {
    #[must_use]
    pub fn transient(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expires: None,
            http_only: true,
        }
    }

    #[must_use]
    pub fn persistent(path: impl Into<String>, expires: OffsetDateTime) -> Self {
        Self {
            path: path.into(),
            expires: Some(expires),
            http_only: true,
        }
    }
}

/// Reads and writes signed cookies.
#[derive(Debug, Clone)]
pub struct SignedCookies {
    grip: KeyGrip,
    secure: bool,
}

impl SignedCookies {
    /// # Errors
    ///
    /// Returns `CookieError::EmptyKeyRing` if the configuration has no keys.
    pub fn from_config(config: &CookieConfig) -> Result<Self, CookieError> {
        Ok(Self {
            grip: KeyGrip::new(&config.keys)?,
            secure: config.secure,
        })
    }

    /// Returns the value of `name` if its signature verifies.
    #[must_use]
    pub fn read<'a>(&self, cookies: &'a RequestCookies, name: &str) -> Option<&'a str> {
        let value = cookies.get(name)?;
        let signature = cookies.get(&format!("{name}.sig"))?;
        if self.grip.verify(&format!("{name}={value}"), signature) {
            Some(value)
        } else {
            tracing::warn!(cookie = name, "cookie signature mismatch");
            None
        }
    }

    /// Builds the value cookie and its signature cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be signed.
    pub fn write(
        &self,
        name: &str,
        value: &str,
        options: &CookieOptions,
    ) -> Result<Vec<Cookie<'static>>, CookieError> {
        let signature = self.grip.sign(&format!("{name}={value}"))?;
        Ok(vec![
            self.build(name.to_string(), value.to_string(), options),
            self.build(format!("{name}.sig"), signature, options),
        ])
    }

    /// Builds cookies that remove `name` and its signature.
    #[must_use]
    pub fn clear(&self, name: &str, path: &str) -> Vec<Cookie<'static>> {
        let options = CookieOptions::persistent(path, OffsetDateTime::UNIX_EPOCH);
        vec![
            self.build(name.to_string(), String::new(), &options),
            self.build(format!("{name}.sig"), String::new(), &options),
        ]
    }

    fn build(&self, name: String, value: String, options: &CookieOptions) -> Cookie<'static> {
        let mut cookie = Cookie::build((name, value))
            .path(options.path.clone())
            .http_only(options.http_only)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build();
        if let Some(expires) = options.expires {
            cookie.set_expires(expires);
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(keys: &[&str]) -> SignedCookies {
        let config = CookieConfig {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        };
        SignedCookies::from_config(&config).unwrap()
    }

    fn presented(cookies: &[Cookie<'static>]) -> RequestCookies {
        cookies
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect()
    }

    #[test]
    fn test_empty_key_ring_rejected() {
        assert!(matches!(
            KeyGrip::new(Vec::<String>::new()),
            Err(CookieError::EmptyKeyRing)
        ));
        assert!(matches!(KeyGrip::new([""]), Err(CookieError::EmptyKeyRing)));
    }

    #[test]
    fn test_sign_and_verify() {
        let grip = KeyGrip::new(["key-a"]).unwrap();
        let sig = grip.sign("_grant=abc").unwrap();
        assert!(grip.verify("_grant=abc", &sig));
        assert!(!grip.verify("_grant=abd", &sig));
        assert!(!grip.verify("_grant=abc", "not-a-signature"));
    }

    #[test]
    fn test_rotation_verifies_older_keys() {
        let old = KeyGrip::new(["old"]).unwrap();
        let rotated = KeyGrip::new(["new", "old"]).unwrap();
        let sig = old.sign("_session=s1").unwrap();
        assert_eq!(rotated.index("_session=s1", &sig), Some(1));

        let fresh = rotated.sign("_session=s1").unwrap();
        assert_eq!(rotated.index("_session=s1", &fresh), Some(0));
        assert!(!old.verify("_session=s1", &fresh));
    }

    #[test]
    fn test_write_then_read() {
        let cookies = signer(&["k1"]);
        let written = cookies
            .write("_grant", "uid-1", &CookieOptions::transient("/auth/resume"))
            .unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[1].name(), "_grant.sig");
        assert_eq!(written[0].path(), Some("/auth/resume"));
        assert!(written[0].expires().is_none());

        let jar = presented(&written);
        assert_eq!(cookies.read(&jar, "_grant"), Some("uid-1"));
    }

    #[test]
    fn test_tampered_value_rejected() {
        let cookies = signer(&["k1"]);
        let written = cookies
            .write("_grant", "uid-1", &CookieOptions::transient("/"))
            .unwrap();
        let mut jar: HashMap<String, String> = written
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        jar.insert("_grant".to_string(), "uid-2".to_string());
        let jar: RequestCookies = jar.into_iter().collect();
        assert_eq!(cookies.read(&jar, "_grant"), None);

        let unsigned: RequestCookies = [("_grant".to_string(), "uid-1".to_string())]
            .into_iter()
            .collect();
        assert_eq!(cookies.read(&unsigned, "_grant"), None);
    }

    #[test]
    fn test_persistent_cookie_has_expiry() {
        let cookies = signer(&["k1"]);
        let expires = OffsetDateTime::now_utc() + time::Duration::days(1);
        let written = cookies
            .write("_session", "s", &CookieOptions::persistent("/", expires))
            .unwrap();
        assert!(written[0].expires_datetime().is_some());
        assert_eq!(written[0].http_only(), Some(true));
        assert_eq!(written[0].same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_from_header() {
        let jar = RequestCookies::from_header("_grant=abc; _grant.sig=xyz; other=1");
        assert_eq!(jar.get("_grant"), Some("abc"));
        assert_eq!(jar.get("_grant.sig"), Some("xyz"));
        assert_eq!(jar.get("missing"), None);
    }
}
