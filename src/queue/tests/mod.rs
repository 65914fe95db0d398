//! Test module organization for the bounded queue

pub mod scenarios;

use std::time::Duration;

/// Time given to a spawned thread to reach its wait loop
pub(crate) const SETTLE: Duration = Duration::from_millis(50);

/// Route `log` output through the test harness
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
