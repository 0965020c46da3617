//! Helpers shared by the integration tests

use ksbuilder_core::scaffold::{create, ScaffoldConfig};
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Scaffold extension `name` below `root` and return its directory
pub fn create_extension(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    let config = ScaffoldConfig {
        name: name.to_string(),
        category: "monitoring-logging".to_string(),
        author: "Test Author".to_string(),
        email: "author@example.com".to_string(),
        url: "https://example.com".to_string(),
    };
    create(&dir, &config).unwrap();
    dir
}
