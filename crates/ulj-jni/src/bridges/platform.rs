//! `UltralightPlatform` natives

use std::sync::Arc;

use jni::objects::{JClass, JObject};
use jni::sys::jobject;
use jni::{JNIEnv, NativeMethod};
use ulj_core::{BridgedLogger, BridgeError};

use super::logger::JavaLogSink;
use super::native_method;
use crate::exception::entry;
use crate::reference::JniReferenceWrapper;
use crate::runtime::{self, ULTRALIGHT_LOGGER, ULTRALIGHT_PLATFORM};

pub fn native_methods() -> Vec<NativeMethod> {
    vec![
        native_method(
            "instance",
            &format!("()L{};", ULTRALIGHT_PLATFORM),
            instance as *mut std::ffi::c_void,
        ),
        native_method(
            "setLogger",
            &format!("(L{};)V", ULTRALIGHT_LOGGER),
            set_logger as *mut std::ffi::c_void,
        ),
    ]
}

/// `static UltralightPlatform instance()`
extern "system" fn instance<'local>(mut env: JNIEnv<'local>, _class: JClass<'local>) -> jobject {
    entry(&mut env, "UltralightPlatform.instance", std::ptr::null_mut(), |env| {
        let runtime = runtime::runtime()?;
        runtime.platform_object(env).map(JObject::into_raw)
    })
}

/// `void setLogger(UltralightLogger logger)`
extern "system" fn set_logger<'local>(
    mut env: JNIEnv<'local>,
    this: JObject<'local>,
    logger: JObject<'local>,
) {
    entry(&mut env, "UltralightPlatform.setLogger", (), |env| {
        set_logger_impl(env, &this, &logger)
    })
}

fn set_logger_impl(env: &mut JNIEnv, this: &JObject, logger: &JObject) -> Result<(), BridgeError> {
    let runtime = runtime::runtime()?;
    let platform = runtime.table().platform(runtime.handle_of(env, this)?)?;

    if logger.is_null() {
        platform.set_logger(None);
        return Ok(());
    }

    let policy = runtime.config().promotion_failure;
    let reference = JniReferenceWrapper::new(env, logger, "logger", policy)?;
    let sink = JavaLogSink::new(runtime.clone(), reference);
    platform.set_logger(Some(Arc::new(BridgedLogger::new(sink))));
    Ok(())
}
