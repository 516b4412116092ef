use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initializes the global logger. Every line is prefixed with `c ` so that log output
/// interleaved with a solution on stdout is read as a comment.
pub fn build_logger_for_level(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "c {:<5} {}", record.level(), record.args()));

    // a second initialization (e.g. from several tests) is harmless
    let _ = builder.try_init();
}

/// Like [`build_logger_for_level`], where each occurrence of `-v` raises `default` by one level
pub fn build_logger_for_verbosity(default: LevelFilter, verbosity: usize) {
    let level = LevelFilter::iter()
        .skip_while(|&l| l != default)
        .nth(verbosity)
        .unwrap_or(LevelFilter::Trace);

    build_logger_for_level(level);
}
