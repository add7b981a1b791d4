use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::error::NozzleError;
use crate::nozzle::{Nozzle, NozzleFactory};

fn drivers() -> &'static RwLock<HashMap<String, Box<dyn NozzleFactory>>> {
    static DRIVERS: OnceLock<RwLock<HashMap<String, Box<dyn NozzleFactory>>>> = OnceLock::new();
    DRIVERS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Makes a nozzle driver available under `name`.
///
/// The registry is write-once at startup, then read-only: calling this
/// twice for the same name panics, since a silently-overwritten driver
/// would mask a configuration mistake rather than surface it.
///
/// # Panics
///
/// Panics if `name` is already registered.
pub fn register(name: &str, factory: impl NozzleFactory + 'static) {
    let mut drivers = drivers().write().expect("nozzle registry lock poisoned");
    if drivers.contains_key(name) {
        panic!("nozzle: register called twice for driver {name:?}");
    }
    drivers.insert(name.to_string(), Box::new(factory));
}

/// Opens a nozzle by its registered driver name, configuring it with `opts`.
///
/// Fails with [`NozzleError::UnknownDriver`] if `name` was never
/// registered; otherwise delegates to the driver's factory, which
/// validates `opts` itself.
pub fn open(name: &str, opts: &HashMap<String, String>) -> Result<Box<dyn Nozzle>, NozzleError> {
    let drivers = drivers().read().expect("nozzle registry lock poisoned");
    let factory = drivers
        .get(name)
        .ok_or_else(|| NozzleError::UnknownDriver(name.to_string()))?;
    factory.new(opts)
}
