use std::time::Duration;

pub const APP_NAME: &str = "CUECLOCK";

pub const CONFIG_FILE: &str = "cueclock.config";
pub const STORE_FILE: &str = "matches.json";
pub const DATA_DIR_NAME: &str = "cueclock";
pub const ERROR_LOG_FILE: &str = "error.log";
pub const DEBUG_LOG_FILE: &str = "debug.log";

/// Full match length restored by a reset (30 minutes).
pub const DEFAULT_MATCH_DURATION_SECS: u32 = 1800;
pub const DEFAULT_SHOT_CLOCK_SECS: u32 = 30;
pub const SHOT_CLOCK_WARNING_SECS: u32 = 10;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);
pub const INPUT_POLL_CAP: Duration = Duration::from_millis(250);

pub const MENU_LOGO: &[&str] = &[
    "   ____            ____ _            _    ",
    "  / ___|   _  ___ / ___| | ___   ___| | __",
    " | |  | | | |/ _ \\ |   | |/ _ \\ / __| |/ /",
    " | |__| |_| |  __/ |___| | (_) | (__|   < ",
    "  \\____\\__,_|\\___|\\____|_|\\___/ \\___|_|\\_\\",
];

pub const MENU_MODE_LABELS: &[&str] = &["Control (pause / resume / reset)", "Read-only scoreboard"];
pub const MENU_SHOT_CLOCK_LABELS: &[&str] = &["Show shot clock", "Match clock only"];
