use std::fmt;

/// Errors surfaced by the nozzle registry and by individual `Nozzle`
/// implementations.
#[derive(Debug)]
pub enum NozzleError {
    /// `open` was called with a name that was never `register`ed.
    UnknownDriver(String),
    /// A factory rejected its `opts` (missing or malformed configuration).
    BadConfig(String),
    /// The underlying HTTP call failed (network error, timeout, TLS, ...).
    Http(reqwest::Error),
    /// The provider returned a 200 whose body didn't decode as expected.
    Decode(reqwest::Error),
    /// The provider returned a status code the nozzle has no mapping for.
    ///
    /// A nozzle that cannot disambiguate a response must return this
    /// instead of guessing at `valid`.
    UnhandledStatus(u16),
}

impl fmt::Display for NozzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NozzleError::UnknownDriver(name) => {
                write!(f, "nozzle: unknown driver {name:?} (forgotten registration?)")
            }
            NozzleError::BadConfig(msg) => write!(f, "nozzle: bad configuration: {msg}"),
            NozzleError::Http(e) => write!(f, "nozzle: http request failed: {e}"),
            NozzleError::Decode(e) => write!(f, "nozzle: response decode failed: {e}"),
            NozzleError::UnhandledStatus(code) => {
                write!(f, "nozzle: unhandled status code from provider: {code}")
            }
        }
    }
}

impl std::error::Error for NozzleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NozzleError::Http(e) | NozzleError::Decode(e) => Some(e),
            _ => None,
        }
    }
}
