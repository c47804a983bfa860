//! Small crate-wide convenience macros.

/// Log a debug message to the browser console (stderr on native builds,
/// which keeps the lifecycle core runnable under plain `cargo test`).
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        ::web_sys::console::log_1(&format!($($arg)*).into());
        #[cfg(not(target_arch = "wasm32"))]
        eprintln!("[debug] {}", format!($($arg)*));
    }};
}

/// Log a warning.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        ::web_sys::console::warn_1(&format!($($arg)*).into());
        #[cfg(not(target_arch = "wasm32"))]
        eprintln!("[warn] {}", format!($($arg)*));
    }};
}

/// Log an error.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        ::web_sys::console::error_1(&format!($($arg)*).into());
        #[cfg(not(target_arch = "wasm32"))]
        eprintln!("[error] {}", format!($($arg)*));
    }};
}
