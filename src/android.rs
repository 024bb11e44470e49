//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge.

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;

use crate::resolve_layout_json;

/// Resolve a tone-field layout and return the render model as JSON.
///
/// Called from Kotlin as:
///   external fun resolveLayout(storeDir: String, templateKey: String, scaleJson: String?): String?
#[no_mangle]
pub extern "system" fn Java_com_digipan_app_ToneFieldLib_resolveLayout(
    mut env: JNIEnv,
    _class: JClass,
    store_dir: JString,
    template_key: JString,
    scale_json: JString,
) -> jstring {
    let dir: String = match env.get_string(&store_dir) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };
    let key: String = match env.get_string(&template_key) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };
    let scale: Option<String> = if scale_json.is_null() {
        None
    } else {
        env.get_string(&scale_json).ok().map(|s| s.into())
    };

    match resolve_layout_json(&dir, &key, scale.as_deref()) {
        Ok(json) => match env.new_string(&json) {
            Ok(js) => js.into_raw(),
            Err(_) => std::ptr::null_mut(),
        },
        Err(_) => std::ptr::null_mut(),
    }
}
