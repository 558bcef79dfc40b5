//! Exception Translation
//!
//! Errors leave Rust as thrown Java exceptions and Java exceptions enter Rust
//! as [`BridgeError::ManagedCall`]. Nothing unwinds across the boundary.

use std::panic::{self, AssertUnwindSafe};

use jni::JNIEnv;
use jni::objects::{JObject, JString};
use ulj_core::BridgeError;
use ulj_core::error::panic_message;

pub const NULL_POINTER_EXCEPTION: &str = "java/lang/NullPointerException";
pub const ILLEGAL_ARGUMENT_EXCEPTION: &str = "java/lang/IllegalArgumentException";
pub const ILLEGAL_STATE_EXCEPTION: &str = "java/lang/IllegalStateException";
pub const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";

/// Java exception class thrown for an error
pub fn exception_class(err: &BridgeError) -> &'static str {
    if err.is_null() {
        return NULL_POINTER_EXCEPTION;
    }
    match err {
        BridgeError::InvalidHandle { .. } => ILLEGAL_ARGUMENT_EXCEPTION,
        BridgeError::ReferencePromotion(_) | BridgeError::ThreadSpawn(_) => ILLEGAL_STATE_EXCEPTION,
        BridgeError::NullReference(_) => NULL_POINTER_EXCEPTION,
        BridgeError::ManagedCall(_) | BridgeError::Attach(_) => RUNTIME_EXCEPTION,
    }
}

/// Throw `err` into the calling Java frame
pub fn throw(env: &mut JNIEnv, err: &BridgeError) {
    throw_class(env, exception_class(err), &err.to_string());
}

fn throw_class(env: &mut JNIEnv, class: &str, message: &str) {
    // A pending exception would make ThrowNew undefined
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_clear();
    }
    if let Err(err) = env.throw_new(class, message) {
        tracing::error!("Failed to throw {}({}): {}", class, message, err);
    }
}

/// Run the body of a native method.
///
/// Errors are thrown as Java exceptions and panics as
/// `IllegalStateException`; `fallback` is returned to Java in both cases.
pub fn entry<'local, T>(
    env: &mut JNIEnv<'local>,
    name: &str,
    fallback: T,
    body: impl FnOnce(&mut JNIEnv<'local>) -> Result<T, BridgeError>,
) -> T {
    match panic::catch_unwind(AssertUnwindSafe(|| body(env))) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            tracing::debug!("{} failed: {}", name, err);
            throw(env, &err);
            fallback
        }
        Err(payload) => {
            let message = format!("{} panicked: {}", name, panic_message(&*payload));
            tracing::error!("{}", message);
            throw_class(env, ILLEGAL_STATE_EXCEPTION, &message);
            fallback
        }
    }
}

/// Clear the pending Java exception, if any, and describe it
pub fn take_pending(env: &mut JNIEnv) -> Option<String> {
    if !env.exception_check().unwrap_or(false) {
        return None;
    }

    let throwable = env.exception_occurred().ok();
    let _ = env.exception_clear();

    let description = throwable
        .and_then(|throwable| describe(env, &throwable))
        .unwrap_or_else(|| "unknown Java exception".to_string());
    Some(description)
}

fn describe(env: &mut JNIEnv, throwable: &JObject) -> Option<String> {
    if throwable.is_null() {
        return None;
    }

    let text = env
        .call_method(throwable, "toString", "()Ljava/lang/String;", &[])
        .and_then(|value| value.l());
    let text = match text {
        Ok(text) => JString::from(text),
        Err(_) => {
            let _ = env.exception_clear();
            return None;
        }
    };

    let description = env.get_string(&text).ok().map(String::from);
    let _ = env.delete_local_ref(text);
    description
}

/// Conversion of JNI results into bridge errors
pub trait JniResultExt<T> {
    /// Map a failed JNI call, capturing and clearing any Java exception
    fn managed(self, env: &mut JNIEnv) -> Result<T, BridgeError>;
}

impl<T> JniResultExt<T> for jni::errors::Result<T> {
    fn managed(self, env: &mut JNIEnv) -> Result<T, BridgeError> {
        self.map_err(|err| match take_pending(env) {
            Some(exception) => BridgeError::ManagedCall(exception),
            None => BridgeError::ManagedCall(err.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use ulj_core::{Handle, HandleKind};

    #[test]
    fn test_exception_classes() {
        let null = BridgeError::invalid_handle(Handle::NULL, HandleKind::Surface, "null handle");
        assert_eq!(exception_class(&null), NULL_POINTER_EXCEPTION);

        let stale_key = Handle::from_raw(0x1_0000_0001);
        let stale = BridgeError::invalid_handle(stale_key, HandleKind::Surface, "stale");
        assert_eq!(exception_class(&stale), ILLEGAL_ARGUMENT_EXCEPTION);

        assert_eq!(exception_class(&BridgeError::NullReference("logger")), NULL_POINTER_EXCEPTION);
        assert_eq!(
            exception_class(&BridgeError::ReferencePromotion("out of memory".into())),
            ILLEGAL_STATE_EXCEPTION
        );
        assert_eq!(
            exception_class(&BridgeError::ThreadSpawn(io::Error::other("no threads"))),
            ILLEGAL_STATE_EXCEPTION
        );
        assert_eq!(exception_class(&BridgeError::Attach("detached".into())), RUNTIME_EXCEPTION);
    }
}
