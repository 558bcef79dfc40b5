//! `RefPtr` natives

use jni::objects::JClass;
use jni::sys::jlong;
use jni::{JNIEnv, NativeMethod};
use ulj_core::{Handle, release_bitmap};

use super::native_method;
use crate::exception::entry;
use crate::runtime;

pub fn native_methods() -> Vec<NativeMethod> {
    vec![native_method("delete", "(J)V", delete as *mut std::ffi::c_void)]
}

/// `static void delete(long handle)`
extern "system" fn delete<'local>(mut env: JNIEnv<'local>, _class: JClass<'local>, handle: jlong) {
    entry(&mut env, "RefPtr.delete", (), |_env| {
        let runtime = runtime::runtime()?;
        release_bitmap(runtime.table(), Handle::from_raw(handle))
    })
}
