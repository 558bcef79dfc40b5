//! Reference Wrapper
//!
//! Persistent reference to a managed object held by a native callback
//! implementation. The global reference is released when the wrapper is
//! dropped, from whatever thread drops it.

use jni::JNIEnv;
use jni::objects::{GlobalRef, JObject};
use ulj_core::{BridgeError, PromotionPolicy};

/// Global reference to the managed object behind a native bridge object
pub struct JniReferenceWrapper {
    reference: GlobalRef,
}

impl JniReferenceWrapper {
    /// Promote `object` to a global reference.
    ///
    /// `what` names the object in the error raised for `null`.
    pub fn new(
        env: &mut JNIEnv,
        object: &JObject,
        what: &'static str,
        policy: PromotionPolicy,
    ) -> Result<Self, BridgeError> {
        if object.is_null() {
            return Err(BridgeError::NullReference(what));
        }

        match env.new_global_ref(object) {
            Ok(reference) if !reference.as_obj().is_null() => Ok(Self { reference }),
            Ok(_) => Err(policy.on_failure(format!("global reference to {} is null", what))),
            Err(err) => {
                let _ = env.exception_clear();
                Err(policy.on_failure(format!("{}: {}", what, err)))
            }
        }
    }

    /// The wrapped managed object
    pub fn as_obj(&self) -> &JObject<'static> {
        self.reference.as_obj()
    }
}

impl std::fmt::Debug for JniReferenceWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JniReferenceWrapper")
            .field("reference", &self.reference.as_obj().as_raw())
            .finish()
    }
}
