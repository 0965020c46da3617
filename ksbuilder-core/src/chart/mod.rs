//! Helm chart handling
//!
//! Chart.yaml model, `.helmignore` rules, the packager and in-memory
//! inspection of packaged archives.

mod archive;
mod ignore;
mod metadata;
mod package;

pub use archive::{parse_archive, read_archive, validate_archive, ParsedExtension};
pub use ignore::{IgnoreRules, HELMIGNORE_FILENAME};
pub use metadata::{ChartMetadata, Dependency, Maintainer, CHART_API_VERSION, CHART_FILENAME};
pub use package::{package, stage, write_archive};
