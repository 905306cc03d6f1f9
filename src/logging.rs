// Global logger for the binary: `log` macros in the library end up here.
use chrono::Local;
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::OnceLock;

static INSTALLED: OnceLock<Result<(), String>> = OnceLock::new();

/// Install the global logger. Level comes from `CONTRATOS_LOG_LEVEL`, then
/// `RUST_LOG`, defaulting to `info`. Log lines go to stderr so report output
/// on stdout stays clean; `CONTRATOS_LOG_DIR` adds a daily file.
///
/// Only the first call does any work. Later calls return the outcome of that
/// first attempt, including its error.
pub fn init_logging(app_name: &str) -> Result<(), String> {
    INSTALLED.get_or_init(|| install(app_name)).clone()
}

fn install(app_name: &str) -> Result<(), String> {
    let level = level_from(
        std::env::var("CONTRATOS_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .as_deref(),
    );
    let log_dir = log_dir_from(std::env::var("CONTRATOS_LOG_DIR").ok().as_deref());

    let mut dispatch = fern::Dispatch::new()
        .level(level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} | {:<5} | {} | {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(&dir).map_err(|err| format!("{}: {err}", dir.display()))?;
        let file_path = dir.join(format!("{app_name}-{}.log", Local::now().format("%Y_%m_%d")));
        let file = fern::log_file(&file_path).map_err(|err| format!("{}: {err}", file_path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().map_err(|err| err.to_string())
}

/// Unknown or missing level names fall back to `info`.
fn level_from(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(LevelFilter::Info)
}

fn log_dir_from(raw: Option<&str>) -> Option<PathBuf> {
    match raw.map(str::trim) {
        None | Some("") | Some("off") | Some("none") => None,
        Some(path) => Some(PathBuf::from(path)),
    }
}
