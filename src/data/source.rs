//! One-shot dataset fetch. No retry, no timeout: a failed load is fatal and
//! surfaces to the caller as [`ChartError::Load`].

use async_trait::async_trait;
use std::path::PathBuf;

use super::{Dataset, ParseOptions};
use crate::error::{ChartError, Result};
use crate::logging::{log_load, log_load_failed, ProfileScope};

#[async_trait]
pub trait DataSource {
    async fn fetch(&self) -> Result<String>;
    fn describe(&self) -> String;
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for FileSource {
    async fn fetch(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ChartError::load(self.describe(), e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self) -> Result<String> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ChartError::load(&self.url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ChartError::load(&self.url, format!("http status {}", status)));
        }
        resp.text().await.map_err(|e| ChartError::load(&self.url, e))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// `http://` / `https://` locations are fetched over the network, anything
/// else is read from disk.
pub fn source_for(location: &str) -> Box<dyn DataSource + Send + Sync> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(location))
    } else {
        Box::new(FileSource::new(location))
    }
}

/// Fetch and build the dataset. Any failure, fetch or parse, ends the load.
pub async fn load_dataset(
    source: &(dyn DataSource + Send + Sync),
    options: &ParseOptions,
) -> Result<Dataset> {
    let name = source.describe();
    let scope = ProfileScope::new("load_dataset");
    let result = match source.fetch().await {
        Ok(text) => Dataset::from_csv_str(&text, options),
        Err(err) => Err(err),
    };
    match &result {
        Ok(ds) => log_load(&name, ds.series.len(), ds.dates.len(), scope.elapsed_ms()),
        Err(err) => log_load_failed(&name, &err.to_string()),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inline(&'static str);

    #[async_trait]
    impl DataSource for Inline {
        async fn fetch(&self) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn describe(&self) -> String {
            "inline".to_string()
        }
    }

    #[test]
    fn picks_source_by_scheme() {
        assert_eq!(source_for("https://x.test/u.csv").describe(), "https://x.test/u.csv");
        assert_eq!(source_for("data/u.csv").describe(), "data/u.csv");
    }

    #[tokio::test]
    async fn missing_file_is_load_error() {
        let src = FileSource::new("/nonexistent/ratechart/unemployment.csv");
        let err = load_dataset(&src, &ParseOptions::default()).await.unwrap_err();
        assert!(matches!(err, ChartError::Load { .. }));
    }

    #[tokio::test]
    async fn inline_source_loads() {
        let src = Inline(",age,gender,race,Jan-20\n0,All ages,All genders,All races,3.6\n");
        let ds = load_dataset(&src, &ParseOptions::default()).await.unwrap();
        assert_eq!(ds.series.len(), 1);
        assert_eq!(ds.series[0].values, vec![3.6]);
    }
}
