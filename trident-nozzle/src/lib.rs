//! Nozzle registry: a process-global name→factory table of
//! authentication-provider probes.
//!
//! Each registered driver is opened by name with string options and
//! produces a [`Nozzle`] — a rate-limited, single-attempt client with a
//! uniform `login(user, pass) -> NozzleResult` contract. Registration
//! happens once at process startup via [`register`]; after that the
//! registry is read-only.

mod error;
mod nozzle;
mod okta;
mod registry;

pub use error::NozzleError;
pub use nozzle::{Nozzle, NozzleFactory, NozzleResult, DEFAULT_HTTP_TIMEOUT, USER_AGENT};
pub use okta::{OktaFactory, OktaNozzle};
pub use registry::{open, register};

/// Registers the nozzles this crate ships out of the box.
///
/// Call once from process startup (an orchestrator or dispatcher binary),
/// before any `open` call. Not called automatically on crate load, since
/// the registry's duplicate-registration check would otherwise panic the
/// first time a second caller (e.g. a test) tried to register its own
/// stub driver under the same name.
pub fn register_builtin_nozzles() {
    register("okta", OktaFactory);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    #[test]
    #[serial(nozzle_registry)]
    fn builtin_okta_nozzle_opens() {
        register_builtin_nozzles();
        let mut opts = HashMap::new();
        opts.insert("domain".to_string(), "acme".to_string());
        assert!(open("okta", &opts).is_ok());
    }

    #[test]
    #[serial(nozzle_registry)]
    fn unregistered_driver_is_unknown() {
        assert!(matches!(open("not-a-real-driver", &HashMap::new()), Err(NozzleError::UnknownDriver(_))));
    }
}
