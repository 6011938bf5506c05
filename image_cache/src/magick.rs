use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Output, Stdio},
    sync::Arc,
};

use async_trait::async_trait;
use common::{
    config::{ServiceConfig, ToolFailurePolicy},
    mime::MimeType,
};
use metrics::{Metrics, put_metric};
use tokio::{process::Command, sync::Semaphore};
use tracing::debug;

use crate::errors::ImageCacheError;

/// Format detection and resizing, kept narrow so a native codec can stand in
/// for the external executables later.
#[async_trait]
pub trait ImageTool: Send + Sync {
    async fn identify(&self, path: &Path) -> Result<MimeType, ImageCacheError>;
    /// Scales the image at `path` in place to `width`, height follows the
    /// aspect ratio.
    async fn resize(&self, path: &Path, width: u16) -> Result<(), ImageCacheError>;
}

/// ImageMagick's `identify` and `convert`, run as subprocesses.
pub struct MagickTool {
    identify_command: PathBuf,
    convert_command: PathBuf,
    failure_policy: ToolFailurePolicy,
    permits: Arc<Semaphore>,
}

impl MagickTool {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            identify_command: config.identify_command.clone(),
            convert_command: config.convert_command.clone(),
            failure_policy: config.tool_failure_policy,
            permits: Arc::new(Semaphore::new(config.max_concurrent_tools.max(1))),
        }
    }

    async fn run(&self, command: &Path, args: &[&OsStr]) -> Result<String, ImageCacheError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|err| ImageCacheError::ExternalTool(err.to_string()))?;

        debug!("Running {} {:?}", command.display(), args);

        put_metric!(Metrics::ToolInvocation, 1, "command" => command.display().to_string());

        // a dropped request must not leave the child writing into its scratch path
        let output = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ImageCacheError::ToolLaunch {
                command: command.to_path_buf(),
                source,
            })?;

        self.judge(output)
    }

    fn judge(&self, output: Output) -> Result<String, ImageCacheError> {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        match self.failure_policy {
            ToolFailurePolicy::Stderr if !stderr.is_empty() => {
                Err(ImageCacheError::ExternalTool(stderr))
            }
            ToolFailurePolicy::ExitStatus if !output.status.success() => {
                if stderr.is_empty() {
                    Err(ImageCacheError::ExternalTool(output.status.to_string()))
                } else {
                    Err(ImageCacheError::ExternalTool(stderr))
                }
            }
            _ => Ok(stdout),
        }
    }
}

#[async_trait]
impl ImageTool for MagickTool {
    async fn identify(&self, path: &Path) -> Result<MimeType, ImageCacheError> {
        let format_code = self
            .run(
                &self.identify_command,
                &[OsStr::new("-format"), OsStr::new("%m"), path.as_os_str()],
            )
            .await?;

        MimeType::from_format_code(&format_code).ok_or(ImageCacheError::UnsupportedImageType)
    }

    async fn resize(&self, path: &Path, width: u16) -> Result<(), ImageCacheError> {
        let geometry = format!("{width}x");

        self.run(
            &self.convert_command,
            &[
                OsStr::new("-resize"),
                OsStr::new(&geometry),
                path.as_os_str(),
                path.as_os_str(),
            ],
        )
        .await?;

        Ok(())
    }
}
