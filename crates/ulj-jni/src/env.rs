//! Thread Attachment
//!
//! Engine callbacks arrive on threads the JVM may never have seen. Attaching
//! is idempotent: a thread that is already attached keeps its attachment and
//! is not detached afterwards.

use jni::{JNIEnv, JavaVM};
use ulj_core::{AttachMode, BridgeError};

/// Run `f` with a `JNIEnv` valid on the current thread
pub fn with_attached_env<T>(
    vm: &JavaVM,
    mode: AttachMode,
    f: impl FnOnce(&mut JNIEnv) -> Result<T, BridgeError>,
) -> Result<T, BridgeError> {
    match mode {
        AttachMode::Scoped => {
            // Nested guard when already attached; detaches on drop otherwise
            let mut guard = vm
                .attach_current_thread()
                .map_err(|err| BridgeError::Attach(err.to_string()))?;
            f(&mut guard)
        }
        AttachMode::Permanent => {
            let mut env = vm
                .attach_current_thread_permanently()
                .map_err(|err| BridgeError::Attach(err.to_string()))?;
            f(&mut env)
        }
    }
}
