//! `UltralightBitmapSurface` natives

use jni::objects::JObject;
use jni::sys::jobject;
use jni::{JNIEnv, NativeMethod};
use ulj_core::{BridgeError, bitmap_of};

use super::native_method;
use crate::exception::entry;
use crate::runtime::{self, ULTRALIGHT_BITMAP};

pub fn native_methods() -> Vec<NativeMethod> {
    vec![native_method(
        "bitmap",
        &format!("()L{};", ULTRALIGHT_BITMAP),
        bitmap as *mut std::ffi::c_void,
    )]
}

/// `UltralightBitmap bitmap()`
extern "system" fn bitmap<'local>(mut env: JNIEnv<'local>, this: JObject<'local>) -> jobject {
    entry(&mut env, "UltralightBitmapSurface.bitmap", std::ptr::null_mut(), |env| {
        bitmap_impl(env, &this).map(JObject::into_raw)
    })
}

fn bitmap_impl<'local>(
    env: &mut JNIEnv<'local>,
    this: &JObject,
) -> Result<JObject<'local>, BridgeError> {
    let runtime = runtime::runtime()?;
    let surface = runtime.handle_of(env, this)?;
    let key = bitmap_of(runtime.table(), surface)?;

    runtime.new_bitmap(env, key).inspect_err(|_| {
        // The Java object owning the key was never created
        let _ = ulj_core::release_bitmap(runtime.table(), key);
    })
}
