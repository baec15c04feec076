const fn unwrap_or_cargo_version(opt: Option<&'static str>) -> &'static str {
    match opt {
        Some(val) => val,
        None => env!("CARGO_PKG_VERSION"),
    }
}

/// Build-time override via `BIZHUB_VERSION`, otherwise the crate version.
pub const VERSION: &str = unwrap_or_cargo_version(option_env!("BIZHUB_VERSION"));
