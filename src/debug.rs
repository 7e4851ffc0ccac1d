use std::sync::atomic::{AtomicU8, Ordering};

static DEBUG_LEVEL: AtomicU8 = AtomicU8::new(0);

/// Stores the `-v` count and initialises the logger for it.
/// 0 = warn, 1 = info, 2 = debug, 3 = trace. `RUST_LOG` still wins.
pub fn set_verbosity(level: u8) {
    let level = level.min(3);
    DEBUG_LEVEL.store(level, Ordering::SeqCst);

    let filter = match level {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .format_target(false)
        .try_init();
}

pub fn get_debug_level() -> u8 {
    DEBUG_LEVEL.load(Ordering::SeqCst)
}

pub fn debug_log(level: u8, msg: impl AsRef<str>) {
    if get_debug_level() >= level {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        println!("[{}] [DEBUG:{}] {}", timestamp, level, msg.as_ref());
    }
}
