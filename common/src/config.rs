use std::{env, net::SocketAddr, path::PathBuf};

use clap::{Parser, ValueEnum};

/// How a finished ImageMagick run is judged.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToolFailurePolicy {
    /// Anything written to stderr is a failure, whatever the exit code says.
    #[default]
    Stderr,
    /// A non-zero exit code is a failure, stderr is only used as the message.
    ExitStatus,
}

#[derive(Debug, Clone, Parser)]
#[command(about = "Fetches remote images and serves them back as cached base64 data URIs")]
pub struct ServiceConfig {
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    #[arg(long, env = "ROUTE_PREFIX", default_value = "/api/v2/images")]
    pub route_prefix: String,

    #[arg(long, env = "CACHE_ROOT", default_value = "/data")]
    pub cache_root: PathBuf,

    #[arg(long, env = "CACHE_EXTENSION", default_value = "base64")]
    pub cache_extension: String,

    /// Defaults to the system temp dir
    #[arg(long, env = "SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    #[arg(long, env = "IDENTIFY_COMMAND", default_value = "/usr/bin/identify")]
    pub identify_command: PathBuf,

    #[arg(long, env = "CONVERT_COMMAND", default_value = "/usr/bin/convert")]
    pub convert_command: PathBuf,

    #[arg(long, env = "MAX_CONCURRENT_TOOLS", default_value_t = 4)]
    pub max_concurrent_tools: usize,

    #[arg(long, env = "TOOL_FAILURE_POLICY", value_enum, default_value_t = ToolFailurePolicy::Stderr)]
    pub tool_failure_policy: ToolFailurePolicy,

    /// Push counters to the OTLP endpoint
    #[arg(long, env = "METRICS_ENABLED", default_value_t = false)]
    pub metrics: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            route_prefix: "/api/v2/images".into(),
            cache_root: PathBuf::from("/data"),
            cache_extension: "base64".into(),
            scratch_dir: None,
            identify_command: PathBuf::from("/usr/bin/identify"),
            convert_command: PathBuf::from("/usr/bin/convert"),
            max_concurrent_tools: 4,
            tool_failure_policy: ToolFailurePolicy::Stderr,
            metrics: false,
        }
    }
}

impl ServiceConfig {
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(env::temp_dir)
    }
}
