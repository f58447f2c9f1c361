//! Shared utilities for integration tests.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;

use service_log::config::LogConfig;
use service_log::logging::capture::SharedBuffer;
use service_log::LoggerRegistry;

#[allow(dead_code)]
/// Config rooted in a temporary directory instead of `./log`.
pub fn config_in(mode: &str, root: &Path) -> LogConfig {
    LogConfig {
        directory: root.join("log"),
        ..LogConfig::for_mode(mode)
    }
}

#[allow(dead_code)]
/// Registry whose console output lands in the returned buffer.
pub fn capturing_registry(mode: &str, root: &Path) -> (Arc<LoggerRegistry>, SharedBuffer) {
    let console = SharedBuffer::default();
    let registry = LoggerRegistry::builder(config_in(mode, root))
        .console_writer(console.clone())
        .build();
    (registry, console)
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header("user-agent", "probe/1.0")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::empty())
        .unwrap()
}

/// Concatenated period files of one stream in `dir`, oldest first. Stable
/// links are skipped so no record is read twice.
fn read_stream(dir: &Path, errors: bool) -> String {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().unwrap().is_file())
        .map(|entry| entry.file_name().into_string().unwrap())
        .filter(|name| name.ends_with("-error.log") == errors)
        .collect();
    names.sort();
    names
        .iter()
        .map(|name| fs::read_to_string(dir.join(name)).unwrap())
        .collect()
}

#[allow(dead_code)]
pub fn read_general(dir: &Path) -> String {
    read_stream(dir, false)
}

#[allow(dead_code)]
pub fn read_errors(dir: &Path) -> String {
    read_stream(dir, true)
}

/// Value of `key=` in an encoded line, up to the next space.
#[allow(dead_code)]
pub fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!(" {key}=");
    let start = line.find(&needle)? + needle.len();
    let rest = &line[start..];
    Some(rest.split(' ').next().unwrap_or(rest))
}

/// Parse the `Debug` rendering of a `Duration` (`1.5s`, `30.2ms`, `12µs`, `80ns`).
#[allow(dead_code)]
pub fn parse_debug_duration(text: &str) -> Duration {
    let units = [("ms", 1e-3), ("µs", 1e-6), ("ns", 1e-9), ("s", 1.0)];
    for (suffix, scale) in units {
        if let Some(number) = text.strip_suffix(suffix) {
            let value: f64 = number.parse().unwrap();
            return Duration::from_secs_f64(value * scale);
        }
    }
    panic!("unrecognised duration {text:?}");
}
