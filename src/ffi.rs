//! C ABI for the app shell
//!
//! Inputs and outputs are JSON strings. A null return means the input was
//! null, not UTF-8, or not the expected JSON. Returned strings must be
//! released with [`crate::famfeed_free_string`].

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde::Serialize;

use crate::calendar::{assemble_event, EventSelection};
use crate::mentions::extract_usernames;
use crate::model::Comment;
use crate::tags::resolve_tags;
use crate::thread::CommentThread;

/// Borrow a C string argument as `&str`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives the call.
unsafe fn arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

fn to_c_json<T: Serialize>(value: &T) -> *mut c_char {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("failed to serialize ffi result: {}", e);
            return std::ptr::null_mut();
        }
    };
    match CString::new(json) {
        Ok(s) => s.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// `text` -> `["username", ...]`
///
/// # Safety
/// See [`arg`].
#[no_mangle]
pub unsafe extern "C" fn famfeed_extract_usernames(text: *const c_char) -> *mut c_char {
    match arg(text) {
        Some(text) => to_c_json(&extract_usernames(text)),
        None => std::ptr::null_mut(),
    }
}

/// `[Comment, ...]` -> `{"topLevel": [...], "repliesByParentId": {...}}`
///
/// # Safety
/// See [`arg`].
#[no_mangle]
pub unsafe extern "C" fn famfeed_build_thread(comments_json: *const c_char) -> *mut c_char {
    let Some(json) = arg(comments_json) else {
        return std::ptr::null_mut();
    };
    match serde_json::from_str::<Vec<Comment>>(json) {
        Ok(comments) => to_c_json(&CommentThread::build(&comments)),
        Err(e) => {
            tracing::debug!("invalid comments json: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// `["username", ...]` and `{"username": "user_id"}` -> `["user_id", ...]`
///
/// # Safety
/// See [`arg`].
#[no_mangle]
pub unsafe extern "C" fn famfeed_resolve_tags(
    usernames_json: *const c_char,
    directory_json: *const c_char,
) -> *mut c_char {
    let (Some(usernames), Some(directory)) = (arg(usernames_json), arg(directory_json)) else {
        return std::ptr::null_mut();
    };
    let usernames: Vec<String> = match serde_json::from_str(usernames) {
        Ok(v) => v,
        Err(_) => return std::ptr::null_mut(),
    };
    let directory: HashMap<String, String> = match serde_json::from_str(directory) {
        Ok(v) => v,
        Err(_) => return std::ptr::null_mut(),
    };
    to_c_json(&resolve_tags(&usernames, &directory))
}

/// Event form selections -> `{"date", "time", "endTime"}`, or JSON `null`
/// when no date can be formed.
///
/// # Safety
/// See [`arg`].
#[no_mangle]
pub unsafe extern "C" fn famfeed_assemble_event(selection_json: *const c_char) -> *mut c_char {
    let Some(json) = arg(selection_json) else {
        return std::ptr::null_mut();
    };
    match serde_json::from_str::<EventSelection>(json) {
        Ok(selection) => to_c_json(&assemble_event(&selection)),
        Err(_) => std::ptr::null_mut(),
    }
}
