//! Managed logger sink
//!
//! Delivers engine log messages to a Java `UltralightLogger`. Called from
//! engine threads, which are attached on entry according to the configured
//! attach mode.

use std::sync::Arc;

use jni::JNIEnv;
use jni::objects::{JString, JValue};
use jni::signature::{Primitive, ReturnType};
use jni::sys::jsize;
use ulj_core::{BridgeError, LogSink, ManagedLogLevel};

use crate::env::with_attached_env;
use crate::exception::{JniResultExt, take_pending};
use crate::reference::JniReferenceWrapper;
use crate::runtime::JavaRuntime;

/// Sink calling `UltralightLogger.logMessage(UltralightLogLevel, String)`
pub struct JavaLogSink {
    runtime: Arc<JavaRuntime>,
    logger: JniReferenceWrapper,
}

impl JavaLogSink {
    pub fn new(runtime: Arc<JavaRuntime>, logger: JniReferenceWrapper) -> Self {
        Self { runtime, logger }
    }
}

impl LogSink for JavaLogSink {
    fn deliver(&self, level: ManagedLogLevel, message: &[u16]) -> Result<(), BridgeError> {
        let runtime = &self.runtime;
        with_attached_env(runtime.vm(), runtime.config().attach_mode, |env| {
            let level = runtime.log_levels().to_java(level)?;
            let text = new_string_utf16(env, message)?;

            // SAFETY: `logMessage` was resolved as `(UltralightLogLevel, String)V`
            let result = unsafe {
                env.call_method_unchecked(
                    self.logger.as_obj(),
                    runtime.log_message_method(),
                    ReturnType::Primitive(Primitive::Void),
                    &[JValue::Object(level.as_obj()).as_jni(), JValue::Object(&text).as_jni()],
                )
            };
            let _ = env.delete_local_ref(text);
            result.managed(env)?;

            match take_pending(env) {
                Some(exception) => Err(BridgeError::ManagedCall(exception)),
                None => Ok(()),
            }
        })
    }
}

/// Create a Java string from UTF-16 code units, unpaired surrogates included
fn new_string_utf16<'local>(
    env: &mut JNIEnv<'local>,
    text: &[u16],
) -> Result<JString<'local>, BridgeError> {
    let len = jsize::try_from(text.len()).map_err(|_| {
        BridgeError::ManagedCall(format!("string of {} code units is too long", text.len()))
    })?;

    let raw_env = env.get_raw();
    // SAFETY: `raw_env` is the env of the current thread; NewString copies
    // `len` code units out of `text`
    let raw = unsafe {
        match (**raw_env).NewString {
            Some(new_string) => new_string(raw_env, text.as_ptr(), len),
            None => std::ptr::null_mut(),
        }
    };

    if raw.is_null() {
        let detail = take_pending(env).unwrap_or_else(|| "NewString returned null".to_string());
        return Err(BridgeError::ManagedCall(detail));
    }

    // SAFETY: `raw` is a fresh local reference to a java.lang.String
    Ok(unsafe { JString::from_raw(raw) })
}
