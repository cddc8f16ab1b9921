//! Family Feed Core Library
//!
//! The core Rust library behind the family feed app:
//! - Mentions and tag resolution (`@username`)
//! - Comment threading
//! - Calendar date and time assembly
//! - Storage (SQLite) and the feed service built on it
//! - C ABI for the app shell

use std::ffi::CString;
use std::os::raw::c_char;

pub mod calendar;
pub mod config;
pub mod display;
pub mod error;
pub mod feed;
pub mod ffi;
pub mod ids;
pub mod mentions;
pub mod model;
pub mod storage;
pub mod tags;
pub mod thread;

pub use config::Config;
pub use error::{Error, Result};
pub use feed::FamilyFeed;
pub use storage::{FamilyStore, SqliteStore};

/// Library version, as a C string.
///
/// Lets the app shell check it loaded a compatible core.
#[no_mangle]
pub extern "C" fn famfeed_version() -> *mut c_char {
    match CString::new(env!("CARGO_PKG_VERSION")) {
        Ok(s) => s.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a CString allocated by Rust
///
/// Call this from the shell after reading any string returned by this library.
#[no_mangle]
pub extern "C" fn famfeed_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
