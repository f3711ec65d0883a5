use super::{Album, ComicSource, DownloadOption, Result, SourceError};
use std::process::{Command, Output};
use tracing::debug;

/// Drives the download library through its command-line entry point.
#[derive(Debug, Clone, Default)]
pub struct CommandSource;

impl CommandSource {
    fn run(&self, option: &DownloadOption, args: &[String], album_id: &str) -> Result<Output> {
        let client = &option.client;
        let args: Vec<String> = args.iter().map(|a| option.expand(a, album_id)).collect();
        debug!("Running {} {:?}", client.program, args);

        let mut command = Command::new(&client.program);
        command.args(&args);
        for (key, value) in &client.env {
            command.env(key, option.expand(value, album_id));
        }
        if let Some(dir) = option.path.parent() {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| SourceError::Spawn {
            program: client.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(SourceError::CommandFailed {
                program: client.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl ComicSource for CommandSource {
    fn album_detail(&self, option: &DownloadOption, album_id: &str) -> Result<Album> {
        let output = self.run(option, &option.client.detail_args, album_id)?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn download_album(&self, option: &DownloadOption, album_id: &str) -> Result<()> {
        self.run(option, &option.client.download_args, album_id)?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::source::ClientOption;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn option(dir: &std::path::Path, program: &str, detail: &[&str], download: &[&str]) -> DownloadOption {
        DownloadOption {
            path: dir.join("option.yml"),
            pdf_dir: dir.join("pdf"),
            client: ClientOption {
                program: program.to_string(),
                detail_args: detail.iter().map(|s| s.to_string()).collect(),
                download_args: download.iter().map(|s| s.to_string()).collect(),
                env: HashMap::new(),
            },
        }
    }

    #[test]
    fn test_album_detail_parses_stdout() {
        let tmp = tempdir().unwrap();
        let option = option(
            tmp.path(),
            "sh",
            &[
                "-c",
                r#"printf '{"album_id":"%s","title":"Sample","author":"Someone","tags":["a","b"],"episodes":[]}' "$0""#,
                "{id}",
            ],
            &[],
        );

        let album = CommandSource.album_detail(&option, "350234").unwrap();
        assert_eq!(album.album_id, "350234");
        assert_eq!(album.title, "Sample");
        assert_eq!(album.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_download_writes_into_pdf_dir() {
        let tmp = tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pdf")).unwrap();
        let option = option(tmp.path(), "sh", &[], &["-c", "touch \"$0\"", "{pdf_dir}/{id}.pdf"]);

        CommandSource.download_album(&option, "42").unwrap();
        assert!(tmp.path().join("pdf").join("42.pdf").exists());
    }

    #[test]
    fn test_env_is_expanded() {
        let tmp = tempdir().unwrap();
        let mut option = option(tmp.path(), "sh", &["-c", "printf '%s' \"$ALBUM\""], &[]);
        option.client.env.insert("ALBUM".to_string(), "{id}".to_string());

        let output = CommandSource
            .run(&option, &option.client.detail_args, "77")
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "77");
    }

    #[test]
    fn test_non_zero_exit_is_an_error() {
        let tmp = tempdir().unwrap();
        let option = option(tmp.path(), "sh", &[], &["-c", "echo 'cookie expired' >&2; exit 3"]);

        let err = CommandSource.download_album(&option, "1").unwrap_err();
        match err {
            SourceError::CommandFailed { stderr, .. } => assert_eq!(stderr, "cookie expired"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program() {
        let tmp = tempdir().unwrap();
        let option = option(tmp.path(), "definitely-not-a-real-program", &[], &[]);
        assert!(matches!(
            CommandSource.download_album(&option, "1"),
            Err(SourceError::Spawn { .. })
        ));
    }

    #[test]
    fn test_invalid_detail_json() {
        let tmp = tempdir().unwrap();
        let option = option(tmp.path(), "sh", &["-c", "echo not-json"], &[]);
        assert!(matches!(
            CommandSource.album_detail(&option, "1"),
            Err(SourceError::InvalidDetail(_))
        ));
    }
}
