//! Cached Java enum constants

use std::fmt;

use jni::JNIEnv;
use jni::objects::{GlobalRef, JClass};
use ulj_core::BridgeError;

use crate::exception::JniResultExt;

/// Rust values paired with global references to their Java enum constants
pub struct JavaEnum<T> {
    constants: Vec<(T, GlobalRef)>,
}

impl<T: Copy + PartialEq + fmt::Debug> JavaEnum<T> {
    /// Resolve every `(value, constant name)` pair on `class`
    pub fn load(
        env: &mut JNIEnv,
        class: &JClass,
        signature: &str,
        values: impl IntoIterator<Item = (T, &'static str)>,
    ) -> Result<Self, BridgeError> {
        let mut constants = Vec::new();
        for (value, name) in values {
            let constant = env
                .get_static_field(class, name, signature)
                .and_then(|v| v.l())
                .managed(env)?;
            if constant.is_null() {
                return Err(BridgeError::ManagedCall(format!("enum constant {} is null", name)));
            }
            let global = env.new_global_ref(&constant).managed(env)?;
            let _ = env.delete_local_ref(constant);
            constants.push((value, global));
        }
        Ok(Self { constants })
    }

    /// The Java constant for `value`
    pub fn to_java(&self, value: T) -> Result<&GlobalRef, BridgeError> {
        self.constants
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, constant)| constant)
            .ok_or_else(|| BridgeError::ManagedCall(format!("no Java constant for {:?}", value)))
    }
}
