//! Boundary to the external comic download library. Every call is blocking.

pub mod command;

use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use command::CommandSource;

pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to load option file: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("invalid album detail: {0}")]
    InvalidDetail(#[from] serde_json::Error),

    #[error("worker thread failed: {0}")]
    Worker(String),
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Episode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub page_count: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Album {
    pub album_id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Total reported by the source. Some albums only report per-episode counts.
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl Album {
    pub fn chapter_count(&self) -> usize {
        self.episodes.len()
    }

    pub fn total_pages(&self) -> u32 {
        match self.page_count {
            Some(count) if count > 0 => count,
            _ => self.episodes.iter().map(|ep| ep.page_count).sum(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ClientOption {
    pub program: String,
    #[serde(default)]
    pub detail_args: Vec<String>,
    #[serde(default)]
    pub download_args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

// Keys outside `client` belong to the download library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOption {
    pub path: PathBuf,
    pub pdf_dir: PathBuf,
    pub client: ClientOption,
}

#[derive(Deserialize)]
struct RawOption {
    client: ClientOption,
}

impl DownloadOption {
    pub fn from_file(path: &Path, pdf_dir: &Path) -> Result<Self> {
        let raw: RawOption = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(true))
            .build()?
            .try_deserialize()?;

        Ok(Self {
            path: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
            pdf_dir: std::path::absolute(pdf_dir).unwrap_or_else(|_| pdf_dir.to_path_buf()),
            client: raw.client,
        })
    }

    pub fn expand(&self, template: &str, album_id: &str) -> String {
        template
            .replace("{id}", album_id)
            .replace("{option}", &self.path.to_string_lossy())
            .replace("{pdf_dir}", &self.pdf_dir.to_string_lossy())
    }
}

/// Synchronous API of the download library.
pub trait ComicSource: Send + Sync {
    fn load_option(&self, path: &Path, pdf_dir: &Path) -> Result<DownloadOption> {
        DownloadOption::from_file(path, pdf_dir)
    }

    fn album_detail(&self, option: &DownloadOption, album_id: &str) -> Result<Album>;

    /// Downloads every episode and assembles the PDF into `option.pdf_dir`.
    fn download_album(&self, option: &DownloadOption, album_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_option_from_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("option.yml");
        std::fs::write(
            &path,
            "dir_rule:\n  base_dir: ./download\nclient:\n  program: jmcomic\n  download_args: [\"{id}\", \"--option={option}\"]\n  env:\n    JM_COOKIES: \"AVS=abc\"\n",
        )
        .unwrap();

        let option = DownloadOption::from_file(&path, &tmp.path().join("pdf")).unwrap();
        assert_eq!(option.client.program, "jmcomic");
        assert_eq!(option.client.download_args.len(), 2);
        assert!(option.client.detail_args.is_empty());
        assert_eq!(
            option.client.env.values().collect::<Vec<_>>(),
            vec!["AVS=abc"]
        );
        assert_eq!(option.pdf_dir, tmp.path().join("pdf"));
    }

    #[test]
    fn test_option_missing_file() {
        let tmp = tempdir().unwrap();
        let result = DownloadOption::from_file(&tmp.path().join("option.yml"), tmp.path());
        assert!(matches!(result, Err(SourceError::Config(_))));
    }

    #[test]
    fn test_option_without_client() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("option.yml");
        std::fs::write(&path, "dir_rule:\n  base_dir: ./download\n").unwrap();
        assert!(DownloadOption::from_file(&path, tmp.path()).is_err());
    }

    #[test]
    fn test_expand_placeholders() {
        let option = DownloadOption {
            path: PathBuf::from("/srv/jm/option.yml"),
            pdf_dir: PathBuf::from("/srv/jm/pdf"),
            client: ClientOption {
                program: "jmcomic".to_string(),
                detail_args: vec![],
                download_args: vec![],
                env: HashMap::new(),
            },
        };
        assert_eq!(option.expand("{id}", "422866"), "422866");
        assert_eq!(
            option.expand("--option={option}", "1"),
            "--option=/srv/jm/option.yml"
        );
        assert_eq!(option.expand("{pdf_dir}/{id}.pdf", "7"), "/srv/jm/pdf/7.pdf");
    }

    #[test]
    fn test_album_detail_json() {
        let album: Album = serde_json::from_str(
            r#"{"album_id":"123","title":"T","author":"A","episodes":[{"id":"123","page_count":3}]}"#,
        )
        .unwrap();
        assert!(album.tags.is_empty());
        assert_eq!(album.page_count, None);
        assert_eq!(album.chapter_count(), 1);
        assert_eq!(album.total_pages(), 3);
    }
}
