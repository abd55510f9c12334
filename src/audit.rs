//! Lighthouse audits via the external `lighthouse` CLI.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::storage::{artifact_path, ArtifactKind};
use crate::utils::domain_of;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("lighthouse not found in PATH; install it with `npm install -g lighthouse`")]
    NotInstalled,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("failed to run lighthouse: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("lighthouse exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Reports written by one audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub json: PathBuf,
    pub html: PathBuf,
}

/// Arguments passed to lighthouse for `url`, writing under `output_prefix`.
pub fn lighthouse_args(url: &str, output_prefix: &Path) -> Vec<String> {
    vec![
        url.to_string(),
        "--output=json".to_string(),
        "--output=html".to_string(),
        format!("--output-path={}", output_prefix.display()),
        "--quiet".to_string(),
        "--chrome-flags=--headless".to_string(),
    ]
}

/// Run lighthouse against `url`, writing reports under
/// `{base_dir}/Light_House/`.
pub async fn audit(url: &str, base_dir: &Path) -> Result<AuditReport, AuditError> {
    let domain = domain_of(url).ok_or_else(|| AuditError::InvalidUrl(url.to_string()))?;
    let binary = which::which("lighthouse").map_err(|_| AuditError::NotInstalled)?;
    debug!("Using lighthouse at {}", binary.display());

    let prefix = artifact_path(
        base_dir,
        ArtifactKind::LighthouseReport,
        &domain,
        chrono::Local::now().date_naive(),
        "",
    );
    if let Some(parent) = prefix.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!("Running lighthouse for {}", url);
    let output = Command::new(&binary)
        .args(lighthouse_args(url, &prefix))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!("lighthouse stderr: {}", stderr);
        return Err(AuditError::Failed {
            status: output.status.to_string(),
            stderr,
        });
    }

    // With several --output formats lighthouse appends `.report.{ext}`.
    let report = AuditReport {
        json: report_path(&prefix, "json"),
        html: report_path(&prefix, "html"),
    };
    info!("Lighthouse reports written to {}", report.html.display());
    Ok(report)
}

fn report_path(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!(".report.{}", ext));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_and_report_paths() {
        let prefix = Path::new("/data/Light_House/shop.com");
        let args = lighthouse_args("https://shop.com/", prefix);
        assert_eq!(args[0], "https://shop.com/");
        assert!(args.contains(&"--output-path=/data/Light_House/shop.com".to_string()));
        assert!(args.contains(&"--chrome-flags=--headless".to_string()));
        assert_eq!(
            report_path(prefix, "json"),
            PathBuf::from("/data/Light_House/shop.com.report.json")
        );
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = audit("not a url", Path::new("/tmp")).await.unwrap_err();
        assert!(matches!(err, AuditError::InvalidUrl(_)));
    }
}
