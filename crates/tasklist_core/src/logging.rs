//! Process-wide logger shared by the server and CLI binaries.
//!
//! Log lines are key/value events (`event=… module=… status=…`) carrying ids,
//! owners and error codes. Task text is never logged.
//!
//! # Invariants
//! - The logger starts at most once per process; repeating the same settings is a no-op.
//! - Asking for a different level or target after start fails with [`LoggingError::Conflict`].

use flexi_logger::{
    Cleanup, Criterion, DeferredNow, FileSpec, FlexiLoggerError, LogSpecification, Logger,
    LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter, Record};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "tasklist";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 7;
const PANIC_SUMMARY_CHARS: usize = 200;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Rotating `tasklist*.log` files under an absolute directory.
    Dir(PathBuf),
    Stderr,
}

impl LogTarget {
    /// File target for an absolute, non-blank directory.
    pub fn dir(dir: &str) -> Result<Self, LoggingError> {
        let dir = dir.trim();
        let path = PathBuf::from(dir);
        if dir.is_empty() || !path.is_absolute() {
            return Err(LoggingError::InvalidDir(dir.to_string()));
        }
        Ok(Self::Dir(path))
    }
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dir(dir) => write!(f, "{}", dir.display()),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

#[derive(Debug)]
pub enum LoggingError {
    InvalidLevel(String),
    /// Log directories must be absolute.
    InvalidDir(String),
    Conflict { active: String, requested: String },
    Backend(FlexiLoggerError),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLevel(level) => write!(
                f,
                "unsupported log level `{level}` (expected trace, debug, info, warn or error)"
            ),
            Self::InvalidDir(dir) => write!(f, "log directory must be an absolute path, got `{dir}`"),
            Self::Conflict { active, requested } => write!(
                f,
                "logger already running as {active}; refusing to switch to {requested}"
            ),
            Self::Backend(err) => write!(f, "logger backend: {err}"),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

struct ActiveLogger {
    level: LevelFilter,
    target: LogTarget,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn describe(level: LevelFilter, target: &LogTarget) -> String {
        format!("level={level} target={target}")
    }
}

/// Starts the logger, or checks that the running one matches.
pub fn init_logging(level: &str, target: LogTarget) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let active = ACTIVE.get_or_try_init(|| start(level, &target))?;

    if active.level != level || active.target != target {
        return Err(LoggingError::Conflict {
            active: ActiveLogger::describe(active.level, &active.target),
            requested: ActiveLogger::describe(level, &target),
        });
    }
    Ok(())
}

/// Level and target of the running logger.
pub fn logging_status() -> Option<(LevelFilter, LogTarget)> {
    ACTIVE.get().map(|active| (active.level, active.target.clone()))
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    let normalized = level.trim().to_ascii_lowercase();
    let normalized = if normalized == "warning" { "warn" } else { normalized.as_str() };
    match normalized.parse::<LevelFilter>() {
        Ok(LevelFilter::Off) | Err(_) => Err(LoggingError::InvalidLevel(level.trim().to_string())),
        Ok(filter) => Ok(filter),
    }
}

fn start(level: LevelFilter, target: &LogTarget) -> Result<ActiveLogger, LoggingError> {
    let log_spec = LogSpecification::builder().default(level).build();
    let logger = Logger::with(log_spec).format(event_line);
    let logger = match target {
        LogTarget::Stderr => logger.log_to_stderr(),
        LogTarget::Dir(dir) => logger
            .log_to_file(FileSpec::default().directory(dir.clone()).basename(LOG_FILE_BASENAME))
            .rotate(
                Criterion::Size(ROTATE_AT_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(KEEP_LOG_FILES),
            )
            .append()
            .write_mode(WriteMode::BufferAndFlush),
    };
    let handle = logger.start()?;

    install_panic_hook();
    info!(
        "event=logger_start module=logging status=ok level={level} target={target} os={} version={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        target: target.clone(),
        _handle: handle,
    })
}

fn event_line(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record<'_>,
) -> std::io::Result<()> {
    write!(
        w,
        "{} {:<5} [{}] {}",
        now.format(flexi_logger::TS_DASHES_BLANK_COLONS_DOT_BLANK),
        record.level(),
        record.module_path().unwrap_or("<unknown>"),
        record.args()
    )
}

/// Runs once, from the first successful `start`.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string payload".to_string());
        error!(
            "event=panic module=logging status=error location={location} payload={}",
            one_line(&payload, PANIC_SUMMARY_CHARS)
        );
        previous(info);
    }));
}

/// Collapses line breaks and caps the length so one event stays one line.
fn one_line(value: &str, max_chars: usize) -> String {
    let mut line: String = value
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(max_chars)
        .collect();
    if value.chars().count() > max_chars {
        line.push_str("...");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, one_line, parse_level, LogTarget, LoggingError};
    use log::LevelFilter;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level(" INFO ").unwrap(), LevelFilter::Info);
        assert_eq!(parse_level("warning").unwrap(), LevelFilter::Warn);
        assert!(matches!(parse_level("off"), Err(LoggingError::InvalidLevel(_))));
        assert!(matches!(parse_level("verbose"), Err(LoggingError::InvalidLevel(_))));
    }

    #[test]
    fn log_dir_must_be_absolute() {
        assert!(matches!(LogTarget::dir("logs/dev"), Err(LoggingError::InvalidDir(_))));
        assert!(LogTarget::dir("   ").is_err());
        assert!(LogTarget::dir(&std::env::temp_dir().to_string_lossy()).is_ok());
    }

    #[test]
    fn one_line_flattens_and_caps() {
        assert_eq!(one_line("a\nb\rc", 10), "a b c");
        assert_eq!(one_line("abcdef", 3), "abc...");
    }

    // The logger is process-wide, so every init assertion lives in this one test.
    #[test]
    fn init_is_idempotent_and_rejects_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let target = LogTarget::dir(&dir.path().to_string_lossy()).unwrap();

        init_logging("info", target.clone()).unwrap();
        init_logging("INFO", target.clone()).unwrap();

        let err = init_logging("debug", target.clone()).unwrap_err();
        assert!(err.to_string().contains("refusing to switch"));
        assert!(matches!(
            init_logging("info", LogTarget::Stderr),
            Err(LoggingError::Conflict { .. })
        ));

        assert_eq!(logging_status(), Some((LevelFilter::Info, target)));
        log::info!("event=logging_test module=logging status=ok");
    }
}
