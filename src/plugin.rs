use crate::blocking::run_blocking;
use crate::commands::{AlbumArg, Command, CommandNames, album_arg};
use crate::config::Settings;
use crate::downloads::{DownloadError, DownloadRegistry};
use crate::format::format_info;
use crate::handlers::files::encode_path;
use crate::source::{Album, ComicSource, DownloadOption};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub const NAME: &str = "JMdownloader";
pub const AUTHOR: &str = "FateTrial";
pub const DESCRIPTION: &str =
    "Download JM albums as PDF; configure cookies to reach login-only albums";

const INFO_PROMPT: &str = "Please provide an album ID";
const DOWNLOAD_PROMPT: &str =
    "Please provide the album ID to download. For multi-part albums, use the ID of the first part";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Plain { text: String },
    File { name: String, path: PathBuf, url: String },
}

pub type ReplyTx = mpsc::UnboundedSender<Reply>;

fn plain(out: &ReplyTx, text: impl Into<String>) {
    let _ = out.send(Reply::Plain { text: text.into() });
}

fn file(out: &ReplyTx, album_id: &str, path: &Path) {
    let name = format!("{}.pdf", album_id);
    let _ = out.send(Reply::File {
        url: format!("/files/{}", encode_path(&name)),
        name,
        path: path.to_path_buf(),
    });
}

pub struct JmPlugin {
    option_path: PathBuf,
    pdf_dir: PathBuf,
    names: CommandNames,
    source: Arc<dyn ComicSource>,
    downloading: DownloadRegistry,
}

impl JmPlugin {
    pub fn new(settings: &Settings, source: Arc<dyn ComicSource>) -> Self {
        Self {
            option_path: settings.option_path(),
            pdf_dir: settings.pdf_dir(),
            names: CommandNames::from(settings),
            source,
            downloading: DownloadRegistry::new(),
        }
    }

    pub fn names(&self) -> &CommandNames {
        &self.names
    }

    pub fn downloading(&self) -> &DownloadRegistry {
        &self.downloading
    }

    pub fn option_path(&self) -> &Path {
        &self.option_path
    }

    pub fn pdf_dir(&self) -> &Path {
        &self.pdf_dir
    }

    pub fn pdf_path(&self, album_id: &str) -> PathBuf {
        self.pdf_dir.join(format!("{}.pdf", album_id))
    }

    pub async fn handle(&self, text: &str, out: &ReplyTx) -> bool {
        let Some(command) = self.names.parse(text) else {
            return false;
        };
        info!("Handling {:?}: {}", command, text.trim());

        match command {
            Command::Info => self.info(text, out).await,
            Command::Download => self.download(text, out).await,
            Command::Help => self.help(out),
        }
        true
    }

    fn load_option(&self) -> crate::source::Result<DownloadOption> {
        self.source.load_option(&self.option_path, &self.pdf_dir)
    }

    async fn album_detail(
        &self,
        option: &DownloadOption,
        album_id: &str,
    ) -> crate::source::Result<Album> {
        let source = self.source.clone();
        let option = option.clone();
        let album_id = album_id.to_string();
        run_blocking(move || source.album_detail(&option, &album_id)).await
    }

    pub async fn download_comic(
        &self,
        album_id: &str,
        option: &DownloadOption,
    ) -> Result<(), DownloadError> {
        let guard = self.downloading.acquire(album_id)?;
        info!(
            "Downloading album {} ({} in flight)",
            guard.album_id(),
            self.downloading.len()
        );

        let source = self.source.clone();
        let option = option.clone();
        // The worker owns the guard: the id stays registered until the library
        // call returns, even if this future is dropped first.
        run_blocking(move || source.download_album(&option, guard.album_id())).await?;

        info!("Album {} downloaded", album_id);
        Ok(())
    }

    pub async fn info(&self, text: &str, out: &ReplyTx) {
        let album_id = match album_arg(text) {
            AlbumArg::Id(id) => id,
            AlbumArg::Missing => return plain(out, INFO_PROMPT),
            AlbumArg::Invalid(id) => return plain(out, format!("Invalid album ID: {}", id)),
        };

        plain(out, format!("Looking up album {}...", album_id));

        let result = match self.load_option() {
            Ok(option) => self.album_detail(&option, album_id).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(album) => plain(out, format_info(&album)),
            Err(e) => {
                warn!("Failed to fetch album {}: {}", album_id, e);
                plain(
                    out,
                    format!(
                        "Failed to fetch album info: {}\nCheck that the ID is correct and that your cookies have not expired.",
                        e
                    ),
                );
            }
        }
    }

    pub async fn download(&self, text: &str, out: &ReplyTx) {
        let album_id = match album_arg(text) {
            AlbumArg::Id(id) => id,
            AlbumArg::Missing => return plain(out, DOWNLOAD_PROMPT),
            AlbumArg::Invalid(id) => return plain(out, format!("Invalid album ID: {}", id)),
        };
        let pdf_path = self.pdf_path(album_id);

        if tokio::fs::try_exists(&pdf_path).await.unwrap_or(false) {
            info!("Album {} already on disk, sending {:?}", album_id, pdf_path);
            plain(out, format!("Album {} already exists, sending it directly", album_id));
            return file(out, album_id, &pdf_path);
        }

        // Metadata is informational only; a failure here still attempts the download.
        let mut option = None;
        let detail = match self.load_option() {
            Ok(loaded) => {
                let detail = self.album_detail(&loaded, album_id).await;
                option = Some(loaded);
                detail
            }
            Err(e) => Err(e),
        };
        match detail {
            Ok(album) => plain(
                out,
                format!("{}\n\n⬇️ Starting download, please wait...", format_info(&album)),
            ),
            Err(e) => {
                warn!("Failed to fetch album {} before download: {}", album_id, e);
                plain(
                    out,
                    format!("Failed to fetch album info ({}), trying to download anyway...", e),
                );
            }
        }

        let option = match option {
            Some(option) => option,
            None => match self.load_option() {
                Ok(option) => option,
                Err(e) => {
                    error!("Failed to load {:?}: {}", self.option_path, e);
                    return plain(out, format!("Failed to load configuration: {}", e));
                }
            },
        };

        if let Err(e) = self.download_comic(album_id, &option).await {
            match &e {
                DownloadError::InProgress(_) => warn!("{}", e),
                DownloadError::Source(_) => error!("Album {}: {}", album_id, e),
            }
            return plain(out, e.to_string());
        }

        if tokio::fs::try_exists(&pdf_path).await.unwrap_or(false) {
            plain(out, format!("✅ Album {} downloaded", album_id));
            file(out, album_id, &pdf_path);
        } else {
            warn!("Album {} reported success but {:?} is missing", album_id, pdf_path);
            plain(
                out,
                "⚠️ Download finished, but the generated PDF was not found. Please check the download path",
            );
        }
    }

    pub fn help(&self, out: &ReplyTx) {
        plain(out, self.names.help_text());
    }
}
