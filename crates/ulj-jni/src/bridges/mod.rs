//! Native method implementations, one module per Java class

pub mod bitmap_surface;
pub mod logger;
pub mod platform;
pub mod ref_ptr;

use jni::NativeMethod;

pub(crate) fn native_method(name: &str, sig: &str, fn_ptr: *mut std::ffi::c_void) -> NativeMethod {
    NativeMethod {
        name: name.into(),
        sig: sig.into(),
        fn_ptr,
    }
}
