mod models;
mod server;

pub use models::*;
pub use server::MockServerConfig;

use anyhow::{Context, Result};
use std::path::Path;

/// Load a partial traffic configuration from a file (YAML or JSON).
///
/// The returned [`ConfigFile`] only seeds a [`TrafficConfigBuilder`];
/// validation happens when the builder is built.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let file: ConfigFile = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&contents).context("Failed to parse YAML config")?
        }
        _ => serde_json::from_str(&contents).context("Failed to parse JSON config")?,
    };

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), name))
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let path = scratch_path("traffic.yaml");
        tokio::fs::write(
            &path,
            "url: http://127.0.0.1:6999/api/data\n\
             num_requests: 25\n\
             concurrent_workers: 4\n\
             headers:\n  X-Test: sample\n",
        )
        .await
        .unwrap();

        let file = load_config(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(file.url.as_deref(), Some("http://127.0.0.1:6999/api/data"));
        assert_eq!(file.num_requests, Some(25));
        assert_eq!(file.concurrent_workers, Some(4));
        assert_eq!(file.headers.unwrap().get("X-Test").map(String::as_str), Some("sample"));
        assert_eq!(file.min_delay, None);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let path = scratch_path("traffic.json");
        tokio::fs::write(&path, r#"{"min_delay": 0.0, "max_delay": 0.25, "verbose": true}"#)
            .await
            .unwrap();

        let file = load_config(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(file.min_delay, Some(0.0));
        assert_eq!(file.max_delay, Some(0.25));
        assert_eq!(file.verbose, Some(true));
    }

    #[tokio::test]
    async fn test_negative_count_in_file_is_rejected() {
        let path = scratch_path("negative.json");
        tokio::fs::write(&path, r#"{"num_requests": -3}"#).await.unwrap();

        let result = load_config(&path).await;
        let _ = tokio::fs::remove_file(&path).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = load_config(scratch_path("absent.yaml")).await;
        assert!(result.is_err());
    }
}
