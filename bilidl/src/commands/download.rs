use crate::{
    commands::login::ensure_login,
    downloader::{self, DownloadRequest},
    selector::TtySelector,
};
use anyhow::{Context, Result};
use bilibili::{Client, ids::ContentId, session::SessionStore};
use clap::Args;
use std::{fs, path::PathBuf};

/// Download a video, season or episode through url / BV id / av id.
#[derive(Debug, Clone, Args)]
pub struct Download {
    /// Video or season url, BV id, or numeric av id.
    #[arg(required = true)]
    pub input: String,

    /// The output file name. Defaults to `{title}_{cid}.mp4`.
    #[arg(short = 'o', long)]
    pub filename: Option<String>,

    /// The output directory.
    #[arg(short, long, default_value = ".")]
    pub directory: PathBuf,

    /// Select multiple pages or episodes in one run.
    #[arg(short, long, conflicts_with = "filename")]
    pub multiple: bool,
}

impl Download {
    pub fn execute(self) -> Result<()> {
        let id = ContentId::parse(&self.input)?;

        fs::metadata(&self.directory).with_context(|| {
            format!("output directory {} is not usable", self.directory.display())
        })?;

        let mut client = Client::new()?;
        let store = SessionStore::new()?;
        ensure_login(&mut client, &store)?;

        let request = DownloadRequest {
            id,
            directory: self.directory,
            filename: self.filename,
            multiple: self.multiple,
        };

        downloader::run(&client, &mut TtySelector, &request)?;
        Ok(())
    }
}
