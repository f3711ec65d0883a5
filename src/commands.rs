use crate::config::Settings;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Info,
    Download,
    Help,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandNames {
    pub info: String,
    pub download: String,
    pub help: String,
}

impl Default for CommandNames {
    fn default() -> Self {
        Self {
            info: "jm".to_string(),
            download: "jm_download".to_string(),
            help: "jm_help".to_string(),
        }
    }
}

impl From<&Settings> for CommandNames {
    fn from(settings: &Settings) -> Self {
        Self {
            info: settings.info_command.clone(),
            download: settings.download_command.clone(),
            help: settings.help_command.clone(),
        }
    }
}

impl CommandNames {
    pub fn parse(&self, text: &str) -> Option<Command> {
        let first = text.split_whitespace().next()?;
        let word = first.strip_prefix('/').unwrap_or(first);
        if word == self.info {
            Some(Command::Info)
        } else if word == self.download {
            Some(Command::Download)
        } else if word == self.help {
            Some(Command::Help)
        } else {
            None
        }
    }

    pub fn help_text(&self) -> String {
        format!(
            "JM downloader commands:\n\n\
             /{} [ID] - show album details\n\
             /{} [ID] - download an album as PDF (for multi-part albums, use the ID of the first part)\n\
             /{} - show this help\n",
            self.info, self.download, self.help
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AlbumArg<'a> {
    Missing,
    Invalid(&'a str),
    Id(&'a str),
}

/// The album id is the second whitespace-separated token of the payload.
pub fn album_arg(text: &str) -> AlbumArg<'_> {
    match text.split_whitespace().nth(1) {
        None => AlbumArg::Missing,
        Some(id) if id == "." || id == ".." || id.contains(['/', '\\']) => AlbumArg::Invalid(id),
        Some(id) => AlbumArg::Id(id),
    }
}
