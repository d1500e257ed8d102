use http::StatusCode;
use thiserror::Error;

/// Possible errors when interacting with `spillway`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The server-declared call quota is spent. Raised before any
    /// transport I/O is attempted.
    #[error("No remaining calls for API (remaining: {remaining})")]
    QuotaExceeded {
        /// Last remaining-calls count learned from the server
        remaining: i64,
    },

    /// Network error while talking to an endpoint
    #[error("Network error while trying to connect to an endpoint")]
    NetworkRequest(#[source] reqwest::Error),

    /// The endpoint answered with an unexpected status code
    #[error("Rejected status code: {0}")]
    RejectedStatusCode(StatusCode),

    /// Error while reading the response body
    #[error("Error reading response body")]
    ReadResponseBody(#[source] reqwest::Error),

    /// The response body is not valid JSON
    #[error("Cannot decode response body: {0}")]
    DecodeResponseBody(#[from] serde_json::Error),

    /// The request client cannot be created
    #[error("Error creating request client")]
    BuildRequestClient(#[source] reqwest::Error),

    /// The given header could not be parsed.
    /// A possible error when converting a `HeaderValue` from a string or
    /// byte slice.
    #[error("Header could not be parsed.")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// A multi-address post batch whose addresses and payloads disagree
    /// in length
    #[error("Cannot pair {addresses} addresses with {payloads} payloads")]
    PayloadMismatch {
        /// Number of addresses given
        addresses: usize,
        /// Number of payloads given
        payloads: usize,
    },
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::QuotaExceeded { remaining: r1 }, Self::QuotaExceeded { remaining: r2 }) => {
                r1 == r2
            }
            (Self::NetworkRequest(e1), Self::NetworkRequest(e2))
            | (Self::ReadResponseBody(e1), Self::ReadResponseBody(e2))
            | (Self::BuildRequestClient(e1), Self::BuildRequestClient(e2)) => {
                e1.to_string() == e2.to_string()
            }
            (Self::RejectedStatusCode(c1), Self::RejectedStatusCode(c2)) => c1 == c2,
            (Self::DecodeResponseBody(e1), Self::DecodeResponseBody(e2)) => {
                e1.to_string() == e2.to_string()
            }
            (Self::InvalidHeader(_), Self::InvalidHeader(_)) => true,
            (
                Self::PayloadMismatch {
                    addresses: a1,
                    payloads: p1,
                },
                Self::PayloadMismatch {
                    addresses: a2,
                    payloads: p2,
                },
            ) => a1 == a2 && p1 == p2,
            _ => false,
        }
    }
}

impl Eq for ErrorKind {}
