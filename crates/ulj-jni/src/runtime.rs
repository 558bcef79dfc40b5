//! Java Runtime Cache
//!
//! Classes, method IDs and enum constants resolved once in `JNI_OnLoad`,
//! together with the handle table shared by every native method.

use std::sync::{Arc, OnceLock, RwLock};

use jni::objects::{GlobalRef, JClass, JMethodID, JObject, JValue};
use jni::signature::{Primitive, ReturnType};
use jni::{JNIEnv, JavaVM, NativeMethod};
use ulj_core::{
    BridgeConfig, BridgeError, Handle, HandleKind, HandleTable, ManagedLogLevel, NativeObject,
    Platform,
};

use crate::bridges;
use crate::exception::JniResultExt;
use crate::java_enum::JavaEnum;

pub const OBJECT_WITH_HANDLE: &str = "com/labymedia/ultralight/ffi/ObjectWithHandle";
pub const REF_PTR: &str = "com/labymedia/ultralight/ffi/RefPtr";
pub const ULTRALIGHT_BITMAP: &str = "com/labymedia/ultralight/bitmap/UltralightBitmap";
pub const ULTRALIGHT_BITMAP_SURFACE: &str =
    "com/labymedia/ultralight/bitmap/UltralightBitmapSurface";
pub const ULTRALIGHT_PLATFORM: &str = "com/labymedia/ultralight/UltralightPlatform";
pub const ULTRALIGHT_LOGGER: &str = "com/labymedia/ultralight/plugin/logging/UltralightLogger";
pub const ULTRALIGHT_LOG_LEVEL: &str = "com/labymedia/ultralight/plugin/logging/UltralightLogLevel";

static RUNTIME: RwLock<Option<Arc<JavaRuntime>>> = RwLock::new(None);

/// The loaded runtime
pub fn runtime() -> Result<Arc<JavaRuntime>, BridgeError> {
    RUNTIME
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
        .ok_or_else(|| BridgeError::ManagedCall("native library is not loaded".to_string()))
}

/// Resolve everything and register the native methods
pub fn setup(env: &mut JNIEnv, config: BridgeConfig) -> Result<(), BridgeError> {
    let runtime = Arc::new(JavaRuntime::load(env, config)?);
    runtime.register_natives(env)?;

    let previous = RUNTIME.write().unwrap_or_else(|e| e.into_inner()).replace(runtime);
    if previous.is_some() {
        tracing::warn!("Native library loaded twice, replacing runtime");
    }
    tracing::info!("ulj {} loaded", ulj_core::VERSION);
    Ok(())
}

/// Drop the logger, every handle and the cached runtime
pub fn teardown(env: &mut JNIEnv) {
    let Some(runtime) = RUNTIME.write().unwrap_or_else(|e| e.into_inner()).take() else {
        return;
    };

    Platform::instance().set_logger(None);
    runtime.table.clear();
    runtime.unregister_natives(env);
    tracing::info!("ulj unloaded");
}

/// Cached Java-side metadata
pub struct JavaRuntime {
    vm: JavaVM,
    config: BridgeConfig,
    table: HandleTable,

    get_handle: JMethodID,
    ref_ptr: GlobalRef,
    ref_ptr_init: JMethodID,
    bitmap: GlobalRef,
    bitmap_init: JMethodID,
    bitmap_surface: GlobalRef,
    platform: GlobalRef,
    platform_init: JMethodID,
    log_message: JMethodID,
    log_levels: JavaEnum<ManagedLogLevel>,

    platform_instance: OnceLock<GlobalRef>,
}

impl JavaRuntime {
    fn load(env: &mut JNIEnv, config: BridgeConfig) -> Result<Self, BridgeError> {
        let vm = env.get_java_vm().managed(env)?;

        let object_with_handle = class(env, OBJECT_WITH_HANDLE)?;
        let get_handle = method(env, &object_with_handle, "getHandle", "()J")?;

        let ref_ptr = class(env, REF_PTR)?;
        let ref_ptr_init = method(env, &ref_ptr, "<init>", "(J)V")?;

        let bitmap = class(env, ULTRALIGHT_BITMAP)?;
        let bitmap_init = method(env, &bitmap, "<init>", &format!("(L{};)V", REF_PTR))?;

        let bitmap_surface = class(env, ULTRALIGHT_BITMAP_SURFACE)?;

        let platform = class(env, ULTRALIGHT_PLATFORM)?;
        let platform_init = method(env, &platform, "<init>", "(J)V")?;

        let logger = class(env, ULTRALIGHT_LOGGER)?;
        let log_message = method(
            env,
            &logger,
            "logMessage",
            &format!("(L{};Ljava/lang/String;)V", ULTRALIGHT_LOG_LEVEL),
        )?;

        let log_level = class(env, ULTRALIGHT_LOG_LEVEL)?;
        let log_levels = JavaEnum::load(
            env,
            as_class(&log_level),
            &format!("L{};", ULTRALIGHT_LOG_LEVEL),
            ManagedLogLevel::ALL.map(|level| (level, level.constant_name())),
        )?;

        tracing::debug!("Resolved Java classes, attach mode {}", config.attach_mode);

        Ok(Self {
            vm,
            config,
            table: HandleTable::new(),
            get_handle,
            ref_ptr,
            ref_ptr_init,
            bitmap,
            bitmap_init,
            bitmap_surface,
            platform,
            platform_init,
            log_message,
            log_levels,
            platform_instance: OnceLock::new(),
        })
    }

    fn register_natives(&self, env: &mut JNIEnv) -> Result<(), BridgeError> {
        let natives: [(&GlobalRef, Vec<NativeMethod>); 3] = [
            (&self.bitmap_surface, bridges::bitmap_surface::native_methods()),
            (&self.platform, bridges::platform::native_methods()),
            (&self.ref_ptr, bridges::ref_ptr::native_methods()),
        ];

        for (class, methods) in natives {
            env.register_native_methods(as_class(class), &methods).managed(env)?;
        }
        Ok(())
    }

    fn unregister_natives(&self, env: &mut JNIEnv) {
        for class in [&self.bitmap_surface, &self.platform, &self.ref_ptr] {
            if let Err(err) = env.unregister_native_methods(as_class(class)) {
                tracing::warn!("Failed to unregister natives: {}", err);
            }
        }
    }

    pub fn vm(&self) -> &JavaVM {
        &self.vm
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn table(&self) -> &HandleTable {
        &self.table
    }

    pub fn log_message_method(&self) -> JMethodID {
        self.log_message
    }

    pub fn log_levels(&self) -> &JavaEnum<ManagedLogLevel> {
        &self.log_levels
    }

    /// Read the key embedded in an `ObjectWithHandle`
    pub fn handle_of(&self, env: &mut JNIEnv, object: &JObject) -> Result<Handle, BridgeError> {
        if object.is_null() {
            return Err(BridgeError::NullReference("object with handle"));
        }

        // SAFETY: `get_handle` was resolved on ObjectWithHandle as `()J`
        let raw = unsafe {
            env.call_method_unchecked(
                object,
                self.get_handle,
                ReturnType::Primitive(Primitive::Long),
                &[],
            )
        }
        .and_then(|value| value.j())
        .managed(env)?;

        Ok(Handle::from_raw(raw))
    }

    /// `new UltralightBitmap(new RefPtr(key))`
    pub fn new_bitmap<'local>(
        &self,
        env: &mut JNIEnv<'local>,
        key: Handle,
    ) -> Result<JObject<'local>, BridgeError> {
        let key = JValue::Long(key.to_raw()).as_jni();
        let (ref_ptr_class, bitmap_class) = (as_class(&self.ref_ptr), as_class(&self.bitmap));
        // SAFETY: constructor IDs were resolved with matching signatures
        let ref_ptr = unsafe { env.new_object_unchecked(ref_ptr_class, self.ref_ptr_init, &[key]) }
            .managed(env)?;

        let arg = JValue::Object(&ref_ptr).as_jni();
        let bitmap = unsafe { env.new_object_unchecked(bitmap_class, self.bitmap_init, &[arg]) }
            .managed(env);

        let _ = env.delete_local_ref(ref_ptr);
        bitmap
    }

    /// The Java `UltralightPlatform` singleton, created on first use
    pub fn platform_object<'local>(
        &self,
        env: &mut JNIEnv<'local>,
    ) -> Result<JObject<'local>, BridgeError> {
        let global = match self.platform_instance.get() {
            Some(global) => global,
            None => {
                let key = self.table.insert(NativeObject::Platform(Platform::instance().clone()));
                let created = self.new_platform(env, key);
                let global = match created {
                    Ok(global) => global,
                    Err(err) => {
                        let _ = self.table.release(key, HandleKind::Platform);
                        return Err(err);
                    }
                };

                if let Err(lost) = self.platform_instance.set(global) {
                    // Another thread won; its object is the singleton
                    drop(lost);
                    let _ = self.table.release(key, HandleKind::Platform);
                }
                self.platform_instance.get().ok_or_else(|| {
                    BridgeError::ManagedCall("platform instance vanished".to_string())
                })?
            }
        };

        env.new_local_ref(global).managed(env)
    }

    fn new_platform(&self, env: &mut JNIEnv, key: Handle) -> Result<GlobalRef, BridgeError> {
        // SAFETY: constructor ID was resolved as `(J)V`
        let key = JValue::Long(key.to_raw()).as_jni();
        let class = as_class(&self.platform);
        let local = unsafe { env.new_object_unchecked(class, self.platform_init, &[key]) }
            .managed(env)?;

        let global = env.new_global_ref(&local);
        let _ = env.delete_local_ref(local);
        global.map_err(|err| {
            let detail = format!("platform instance: {}", err);
            self.config.promotion_failure.on_failure(detail)
        })
    }
}

fn class(env: &mut JNIEnv, name: &str) -> Result<GlobalRef, BridgeError> {
    let local = env.find_class(name).managed(env)?;
    let global = env.new_global_ref(&local).managed(env)?;
    let _ = env.delete_local_ref(local);
    Ok(global)
}

fn method(
    env: &mut JNIEnv,
    class: &GlobalRef,
    name: &str,
    signature: &str,
) -> Result<JMethodID, BridgeError> {
    env.get_method_id(as_class(class), name, signature).managed(env)
}

fn as_class(global: &GlobalRef) -> &JClass<'static> {
    <&JClass>::from(global.as_obj())
}
