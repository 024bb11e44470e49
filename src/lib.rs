//! tonefield — tone-field layout and calibration engine for Digipan instrument faces.
//!
//! Lays out the elliptical tone fields of a handpan-style instrument for a
//! fixed set of note-count templates, lets them be calibrated by hand, and
//! binds each field to a scale's pitch and rank label.
//!
//! # Example
//! ```no_run
//! use tonefield::{CalibrationSession, DirStore, NoteField, Override, Scale, TemplateKey};
//!
//! let scale = Scale::new(
//!     "d_kurd_9",
//!     "D3",
//!     &["A3", "Bb3", "C4", "D4", "E4", "F4", "G4", "A4"],
//!     &[],
//! );
//! let template = TemplateKey::natural_for(&scale);
//! let mut session = CalibrationSession::new(DirStore::new("calibration"), template, Some(scale));
//! session.update_note(3, NoteField::Rotate, Override::Value(130.0)).unwrap();
//! println!("{}", serde_json::to_string_pretty(&session.render_model()).unwrap());
//! ```

pub mod anchors;
pub mod config;
pub mod error;
pub mod exceptions;
pub mod geometry;
pub mod labels;
pub mod model;
pub mod pitch;
pub mod remote;
pub mod resolver;
pub mod session;
pub mod store;
pub mod templates;

#[cfg(target_os = "android")]
pub mod android;

use std::path::Path;

pub use anchors::{render_layout, RenderModel, RenderedNote};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use exceptions::ExceptionTable;
pub use geometry::{ellipse_bottom_point, radii_from_scale, FieldTransform, Point};
pub use labels::LabelMapper;
pub use model::*;
pub use pitch::{compare_pitch, is_compatible, PitchAssignment, PitchResolver};
pub use remote::{DirLayoutService, LayoutService};
pub use resolver::{LayoutResolver, LayoutSource, ResolvedLayout};
pub use session::{CalibrationSession, FetchOutcome, FetchTicket, NoteField};
pub use store::{CalibrationStore, DirStore, MemoryStore, StorageKey};
pub use templates::TemplateRegistry;

/// Resolve the layout for a template (and optional scale, as JSON) against a
/// calibration directory and return the render model as JSON.
///
/// Useful for passing data across FFI boundaries.
pub fn resolve_layout_json<P: AsRef<Path>>(
    store_dir: P,
    template_key: &str,
    scale_json: Option<&str>,
) -> Result<String> {
    let template: TemplateKey = template_key.parse()?;
    let scale: Option<Scale> = scale_json
        .filter(|s| !s.trim().is_empty())
        .map(serde_json::from_str)
        .transpose()?;

    let store = DirStore::new(store_dir);
    let registry = TemplateRegistry::new();
    let exceptions = ExceptionTable::builtin();
    let config = EngineConfig::default();
    let resolved = LayoutResolver::new(&registry, &exceptions, &store, &config).resolve(template, scale.as_ref());
    let model = render_layout(&resolved.notes, template, scale.as_ref(), &exceptions, &config);
    Ok(serde_json::to_string_pretty(&model)?)
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI — for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

unsafe fn c_str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_str().ok()
    }
}

/// Resolve a layout and return its render model as a JSON C string.
/// The caller must free the returned string with `tonefield_free_string`.
///
/// `scale_json` may be null for a template preview. Returns null on error.
///
/// # Safety
/// `store_dir` and `template_key` must be valid null-terminated UTF-8 C
/// strings. `scale_json` must be null or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn tonefield_resolve_layout(
    store_dir: *const c_char,
    template_key: *const c_char,
    scale_json: *const c_char,
) -> *mut c_char {
    let (Some(dir), Some(key)) = (unsafe { c_str_arg(store_dir) }, unsafe { c_str_arg(template_key) }) else {
        return std::ptr::null_mut();
    };
    let scale = unsafe { c_str_arg(scale_json) };

    match resolve_layout_json(dir, key, scale) {
        Ok(json) => CString::new(json).unwrap_or_default().into_raw(),
        Err(e) => {
            tracing::warn!(error = %e, "tonefield_resolve_layout failed");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by tonefield functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a tonefield function, or null.
#[no_mangle]
pub unsafe extern "C" fn tonefield_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
