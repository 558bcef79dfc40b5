//! ulj JNI layer
//!
//! Native library loaded by the Java side of the Ultralight bindings.
//!
//! Features:
//! - Native methods registered in `JNI_OnLoad`
//! - Java exceptions for every bridge error, panics included
//! - Engine log messages delivered to an `UltralightLogger`
//! - `tracing` output configured through `ULJ_LOG`

pub mod bridges;
pub mod env;
pub mod exception;
pub mod java_enum;
pub mod reference;
pub mod runtime;

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};

use jni::JavaVM;
use jni::sys::{JNI_ERR, JNI_VERSION_1_8, jint};
use tracing_subscriber::EnvFilter;
use ulj_core::error::panic_message;
use ulj_core::{BridgeConfig, BridgeError};

/// Library load error
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("JNI error: {0}")]
    Jni(#[from] jni::errors::Error),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Called by the JVM when the library is loaded
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "system" fn JNI_OnLoad(vm: JavaVM, _reserved: *mut c_void) -> jint {
    let config = BridgeConfig::from_env();
    init_tracing(&config);

    match panic::catch_unwind(AssertUnwindSafe(|| load(&vm, config))) {
        Ok(Ok(())) => JNI_VERSION_1_8,
        Ok(Err(err)) => {
            tracing::error!("Failed to load native library: {}", err);
            JNI_ERR
        }
        Err(payload) => {
            tracing::error!("Panic while loading native library: {}", panic_message(&*payload));
            JNI_ERR
        }
    }
}

/// Called by the JVM when the class loader holding the library is collected
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "system" fn JNI_OnUnload(vm: JavaVM, _reserved: *mut c_void) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| match vm.get_env() {
        Ok(mut env) => runtime::teardown(&mut env),
        Err(err) => tracing::error!("Failed to unload native library: {}", err),
    }));

    if let Err(payload) = result {
        tracing::error!("Panic while unloading native library: {}", panic_message(&*payload));
    }
}

fn load(vm: &JavaVM, config: BridgeConfig) -> Result<(), SetupError> {
    let mut env = vm.get_env()?;
    runtime::setup(&mut env, config)?;
    Ok(())
}

/// Install a `fmt` subscriber unless the embedding application has one
fn init_tracing(config: &BridgeConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|err| {
        eprintln!("Invalid {} filter {:?}: {}", BridgeConfig::LOG_VAR, config.log_filter, err);
        EnvFilter::new("info")
    });

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
