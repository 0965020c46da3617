//! ksbuilder - build, package and publish KubeSphere extensions

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cloud_cli;
mod extension_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "ksbuilder",
    about = "Build, package and publish KubeSphere extensions",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,
}

#[derive(Parser, Debug)]
enum Command {
    /// Display version
    Version,

    /// List supported extension categories, use the normalized name in extension.yaml
    Category,

    /// Create a new extension from the built-in template
    Create {
        /// Extension name, also the directory created in the current directory
        name: String,

        /// Marketplace category (normalized name)
        #[clap(long)]
        category: Option<String>,

        #[clap(long)]
        author: Option<String>,

        #[clap(long)]
        email: Option<String>,

        /// Home page of the extension
        #[clap(long, default_value = "")]
        url: String,
    },

    /// Package an extension into a chart archive
    Package {
        /// Extension directory
        dir: PathBuf,

        /// Directory to write the archive to
        #[clap(long, default_value = ".")]
        output: PathBuf,
    },

    /// Validate an extension
    Validate {
        /// Extension directory
        dir: PathBuf,
    },

    /// Check an extension for common problems
    Lint {
        /// Extension directory
        dir: PathBuf,

        /// Fail when warnings are found
        #[clap(long)]
        strict: bool,
    },

    /// Print the cluster resources of an extension as YAML
    Template {
        /// Extension directory
        dir: PathBuf,

        /// Reference the chart by URL instead of embedding it
        #[clap(long)]
        chart_url: Option<String>,
    },

    /// Publish an extension into the market of a cluster
    Publish {
        /// Extension directory
        dir: PathBuf,

        /// kubeconfig file path of the target cluster
        #[clap(long)]
        kubeconfig: Option<PathBuf>,

        /// Write the resources to local files instead of applying them
        #[clap(long)]
        to_local_template: bool,

        /// Output directory of --to-local-template
        #[clap(long, default_value = ".")]
        output: PathBuf,

        /// Reference the chart by URL instead of embedding it
        #[clap(long)]
        chart_url: Option<String>,
    },

    /// Remove an extension and all of its versions from a cluster
    Unpublish {
        /// Extension name
        name: String,

        /// kubeconfig file path of the target cluster
        #[clap(long)]
        kubeconfig: Option<PathBuf>,
    },

    /// Login to KubeSphere Cloud
    Login {
        /// API access token
        #[clap(long, short = 't')]
        token: Option<String>,

        /// API server address
        #[clap(long, default_value = ksbuilder_core::cloud::DEFAULT_SERVER)]
        server: String,
    },

    /// Logout from KubeSphere Cloud
    Logout,

    /// Push and submit an extension to KubeSphere Cloud for review
    ///
    /// Icons and screenshots are uploaded separately and the static file
    /// directory is dropped from the uploaded chart.
    Push {
        /// Extension directory
        dir: PathBuf,
    },

    /// Unpush a snapshot of an extension
    Unpush {
        /// Snapshot id, or an extension directory to look the snapshot up
        target: String,
    },

    /// List all extensions of the current user on KubeSphere Cloud
    List,

    /// Get the summary and snapshots of an extension on KubeSphere Cloud
    Get {
        /// Extension name
        name: String,
    },
}

/// Logs go to stderr so command output on stdout stays clean
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::try_from_env("KSBUILDER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level);

    match cli.command {
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Category => {
            extension_cli::category();
            Ok(())
        }
        Command::Create {
            name,
            category,
            author,
            email,
            url,
        } => extension_cli::create(name, category, author, email, url),
        Command::Package { dir, output } => extension_cli::package(&dir, &output),
        Command::Validate { dir } => extension_cli::validate(&dir),
        Command::Lint { dir, strict } => extension_cli::lint(&dir, strict),
        Command::Template { dir, chart_url } => extension_cli::template(&dir, chart_url),
        Command::Publish {
            dir,
            kubeconfig,
            to_local_template,
            output,
            chart_url,
        } => {
            let target = if to_local_template {
                extension_cli::PublishTarget::Directory(output)
            } else {
                extension_cli::PublishTarget::Cluster(kubeconfig)
            };
            extension_cli::publish(&dir, target, chart_url).await
        }
        Command::Unpublish { name, kubeconfig } => {
            extension_cli::unpublish(&name, kubeconfig).await
        }
        Command::Login { token, server } => cloud_cli::login(token, server).await,
        Command::Logout => cloud_cli::logout(),
        Command::Push { dir } => cloud_cli::push(&dir).await,
        Command::Unpush { target } => cloud_cli::unpush(&target).await,
        Command::List => cloud_cli::list().await,
        Command::Get { name } => cloud_cli::get(&name).await,
    }
}
