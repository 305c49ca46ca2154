pub mod fixtures;
pub mod screen;

pub use fixtures::TestFixtures;
pub use screen::{ScreenCapture, ScreenComparator};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("ansipage=debug,ansipage_tool=debug,ansipage_test_utils=debug")),
            )
            .with_test_writer()
            .init();
    });
}
