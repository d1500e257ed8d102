use serde_json::Value;
use url::Url;

use super::Result;
use crate::ErrorKind;

/// A single outbound request: a target address plus an optional JSON
/// payload. Immutable once constructed; consumed by exactly one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Target endpoint
    pub url: Url,
    /// JSON body; `None` dispatches as GET, `Some` as POST
    pub payload: Option<Value>,
}

impl RequestDescriptor {
    /// Descriptor for a GET request
    #[must_use]
    pub const fn get(url: Url) -> Self {
        Self { url, payload: None }
    }

    /// Descriptor for a POST request carrying `payload`
    #[must_use]
    pub const fn post(url: Url, payload: Value) -> Self {
        Self {
            url,
            payload: Some(payload),
        }
    }
}

/// One target address or many.
///
/// The batched post operation accepts either form. A single address (or
/// a one-element list) is broadcast over every payload of the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Addresses {
    /// A single address, repeated for every payload
    One(Url),
    /// One address per payload
    Many(Vec<Url>),
}

impl From<Url> for Addresses {
    fn from(url: Url) -> Self {
        Self::One(url)
    }
}

impl From<Vec<Url>> for Addresses {
    fn from(urls: Vec<Url>) -> Self {
        Self::Many(urls)
    }
}

impl Addresses {
    /// Expand into exactly one address per payload, applying the
    /// broadcast rule for a single address.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::PayloadMismatch`] when a many-address list
    /// cannot be paired one-to-one with the payloads.
    pub(crate) fn pair_with(self, payload_count: usize) -> Result<Vec<Url>> {
        match self {
            Self::One(url) => Ok(vec![url; payload_count]),
            Self::Many(urls) if urls.len() == 1 => {
                // one-element lists broadcast just like a bare address
                Ok(vec![urls[0].clone(); payload_count])
            }
            Self::Many(urls) if urls.len() == payload_count => Ok(urls),
            Self::Many(urls) => Err(ErrorKind::PayloadMismatch {
                addresses: urls.len(),
                payloads: payload_count,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::website;

    #[test]
    fn test_single_address_broadcasts() {
        let urls = Addresses::from(website("https://example.com/x"))
            .pair_with(3)
            .unwrap();
        assert_eq!(urls.len(), 3);
        assert!(urls.iter().all(|u| u.path() == "/x"));
    }

    #[test]
    fn test_one_element_list_broadcasts() {
        let urls = Addresses::from(vec![website("https://example.com/x")])
            .pair_with(2)
            .unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_matching_lengths_pair_up() {
        let a = website("https://example.com/a");
        let b = website("https://example.com/b");
        let urls = Addresses::from(vec![a.clone(), b.clone()])
            .pair_with(2)
            .unwrap();
        assert_eq!(urls, vec![a, b]);
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let result = Addresses::from(vec![
            website("https://example.com/a"),
            website("https://example.com/b"),
        ])
        .pair_with(3);
        assert_eq!(
            result.unwrap_err(),
            ErrorKind::PayloadMismatch {
                addresses: 2,
                payloads: 3
            }
        );
    }
}
