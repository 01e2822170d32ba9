use chrono::Local;
use log::LevelFilter;
use std::io::Write;

/// Install the process-wide logger.
///
/// `level` wins over `RUST_LOG`; without either, `info` is used. Calling this
/// twice is harmless, the second call is ignored.
pub fn init_logging(level: Option<&str>) {
    let log_level = level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(LevelFilter::Info);

    let installed = env_logger::Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .try_init()
        .is_ok();

    if installed {
        log::debug!("Logger initialized (level: {log_level})");
    }
}
