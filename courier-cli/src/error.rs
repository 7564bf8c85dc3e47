//! Error types emitted by the Courier CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use courier_routing::ProviderBuildError;
use courier_session::SessionError;
use thiserror::Error;

/// Errors emitted by the Courier CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name of the offending input.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name of the offending input.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name of the offending input.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name of the offending input.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Opening an input file failed.
    #[error("failed to open {field} file at {path:?}: {source}")]
    OpenInput {
        /// Flag name of the offending input.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// An input file did not contain the expected JSON.
    #[error("failed to parse {field} JSON at {path:?}: {source}")]
    ParseInput {
        /// Flag name of the offending input.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// The replay interval must be positive.
    #[error("interval-ms must be greater than zero")]
    ZeroInterval,
    /// Constructing the routing provider failed.
    #[error("failed to build routing provider for {base_url:?}: {source}")]
    BuildRouteProvider {
        /// Base URL that was rejected.
        base_url: String,
        /// Underlying build failure.
        #[source]
        source: ProviderBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The navigation session refused to start.
    #[error("navigation failed: {0}")]
    Navigation(#[from] SessionError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
