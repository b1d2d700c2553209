use crate::{
    commands::login::ensure_login,
    output::{self, OutputFormat},
};
use anyhow::Result;
use bilibili::{
    Client,
    ids::ContentId,
    resolve::{SeasonMetadata, VideoMetadata},
    season::SeasonQuery,
    session::SessionStore,
};
use clap::Args;
use std::io::{Write, stdout};

/// Show base info of a video, season or episode.
#[derive(Debug, Clone, Args)]
pub struct Info {
    /// Video or season url, BV id, or numeric av id.
    #[arg(required = true)]
    pub input: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,
}

impl Info {
    pub fn execute(self) -> Result<()> {
        let id = ContentId::parse(&self.input)?;

        let mut client = Client::new()?;
        let store = SessionStore::new()?;
        ensure_login(&mut client, &store)?;

        let mut out = stdout();

        match &id {
            ContentId::Video(bvid) => {
                let metadata = client.video_metadata(bvid)?;
                output::write_output(&mut out, self.format, &metadata, |w| {
                    render_video(w, &metadata)
                })?;
            }
            ContentId::Season(id) => {
                let metadata = client.season_metadata(&SeasonQuery::SeasonId(id.clone()))?;
                output::write_output(&mut out, self.format, &metadata, |w| {
                    render_season(w, &metadata)
                })?;
            }
            ContentId::Episode(id) => {
                let metadata = client.season_metadata(&SeasonQuery::EpisodeId(id.clone()))?;
                output::write_output(&mut out, self.format, &metadata, |w| {
                    render_season(w, &metadata)
                })?;
            }
        }

        Ok(())
    }
}

fn render_video(out: &mut impl Write, info: &VideoMetadata) -> Result<()> {
    writeln!(out, "Title:       {}", info.title)?;
    writeln!(out, "Author:      {}", info.author)?;
    writeln!(out, "Duration:    {}", info.duration)?;
    writeln!(out, "BvID:        {}", info.bvid)?;
    writeln!(out, "AID:         {}", info.aid)?;
    writeln!(out, "Description: {}", info.description)?;
    writeln!(out)?;

    let rows = info
        .pages
        .iter()
        .map(|page| {
            vec![
                page.title.clone(),
                page.ordinal.to_string(),
                page.cid.to_string(),
                page.duration.to_string(),
                format!("{}*{}", page.dimension.height, page.dimension.width),
            ]
        })
        .collect::<Vec<_>>();

    output::render_table(out, &["part", "page", "cid", "duration", "dimension"], &rows)
}

fn render_season(out: &mut impl Write, info: &SeasonMetadata) -> Result<()> {
    writeln!(out, "Title:       {}", info.title)?;
    writeln!(out, "Duration:    {}", info.duration)?;
    writeln!(out, "SeasonID:    {}", info.season_id)?;
    writeln!(out, "Description: {}", info.description)?;
    writeln!(out)?;

    let rows = info
        .episodes
        .iter()
        .map(|episode| {
            vec![
                episode.title.clone(),
                episode.bvid.clone(),
                episode.cid.to_string(),
                episode.aid.to_string(),
                episode.duration.to_string(),
                format!("{}*{}", episode.dimension.height, episode.dimension.width),
            ]
        })
        .collect::<Vec<_>>();

    output::render_table(
        out,
        &["title", "bvid", "cid", "aid", "duration", "dimension"],
        &rows,
    )
}
