mod fetch;
mod mux;

use crate::selector::Selector;
use anyhow::{Result, anyhow, bail};
use bilibili::{
    Client, MediaStream,
    ids::ContentId,
    resolve::{
        Format, MediaRendition, QN_DEFAULT, RenditionSet, SeasonMetadata, StreamTarget,
        VideoMetadata, choose_rendition,
    },
    season::SeasonQuery,
    video::Qn,
};
use log::info;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

/// Everything the download flow needs from the platform, so the flow can
/// also run against canned sources.
pub trait MediaSource {
    fn video_metadata(&self, bvid: &str) -> bilibili::Result<VideoMetadata>;
    fn season_metadata(&self, query: &SeasonQuery) -> bilibili::Result<SeasonMetadata>;
    fn renditions(
        &self,
        target: &StreamTarget,
        qn: Qn,
        format: Format,
    ) -> bilibili::Result<RenditionSet>;
    fn open_media(&self, url: &str) -> bilibili::Result<MediaStream>;
}

impl MediaSource for Client {
    fn video_metadata(&self, bvid: &str) -> bilibili::Result<VideoMetadata> {
        Client::video_metadata(self, bvid)
    }

    fn season_metadata(&self, query: &SeasonQuery) -> bilibili::Result<SeasonMetadata> {
        Client::season_metadata(self, query)
    }

    fn renditions(
        &self,
        target: &StreamTarget,
        qn: Qn,
        format: Format,
    ) -> bilibili::Result<RenditionSet> {
        Client::renditions(self, target, qn, format)
    }

    fn open_media(&self, url: &str) -> bilibili::Result<MediaStream> {
        Client::open_media(self, url)
    }
}

/// One download request as the command line describes it.
pub struct DownloadRequest {
    pub id: ContentId,
    pub directory: PathBuf,
    pub filename: Option<String>,
    pub multiple: bool,
}

struct Item {
    target: StreamTarget,
    title: String,
    cid: i64,
}

/// Drives one request end to end: selection prompts, stream resolution,
/// transfer, and the merge step for split downloads. Returns the finished
/// output paths; outputs finished before a later item fails stay in place.
pub fn run(
    source: &impl MediaSource,
    selector: &mut impl Selector,
    request: &DownloadRequest,
) -> Result<Vec<PathBuf>> {
    let items = select_items(source, selector, request)?;
    let mut outputs = Vec::with_capacity(items.len());

    for item in items {
        let format = select_format(selector)?;
        let filename = output_filename(request.filename.as_deref(), &item);

        info!("Downloading {}", filename);

        let output = match format {
            Format::Mp4 => save_progressive(source, &item, &request.directory, &filename)?,
            Format::Dash => save_split(source, selector, &item, &request.directory, &filename)?,
        };
        outputs.push(output);
    }

    Ok(outputs)
}

fn select_items(
    source: &impl MediaSource,
    selector: &mut impl Selector,
    request: &DownloadRequest,
) -> Result<Vec<Item>> {
    match &request.id {
        ContentId::Video(bvid) => {
            let metadata = source.video_metadata(bvid)?;
            let rows = metadata
                .pages
                .iter()
                .map(|page| page.title.clone())
                .collect::<Vec<_>>();
            let picks = pick(selector, "Please select page", &rows, request.multiple)?;

            Ok(picks
                .into_iter()
                .map(|i| {
                    let page = &metadata.pages[i];
                    Item {
                        target: StreamTarget::Page {
                            bvid: metadata.bvid.clone(),
                            cid: page.cid,
                        },
                        title: metadata.title.clone(),
                        cid: page.cid,
                    }
                })
                .collect())
        }
        ContentId::Season(id) | ContentId::Episode(id) => {
            let query = match &request.id {
                ContentId::Season(_) => SeasonQuery::SeasonId(id.clone()),
                _ => SeasonQuery::EpisodeId(id.clone()),
            };
            let metadata = source.season_metadata(&query)?;
            let rows = metadata
                .episodes
                .iter()
                .map(|episode| episode.title.clone())
                .collect::<Vec<_>>();
            let picks = pick(selector, "Please select episode", &rows, request.multiple)?;

            Ok(picks
                .into_iter()
                .map(|i| {
                    let episode = &metadata.episodes[i];
                    Item {
                        target: StreamTarget::Episode {
                            ep_id: episode.ep_id.to_string(),
                        },
                        title: format!("{} {}", metadata.title, episode.title),
                        cid: episode.cid,
                    }
                })
                .collect())
        }
    }
}

fn pick(
    selector: &mut impl Selector,
    message: &str,
    rows: &[String],
    multiple: bool,
) -> Result<Vec<usize>> {
    if rows.is_empty() {
        bail!("nothing to select from");
    }

    if multiple {
        let picks = selector.select_many(message, rows)?;
        if picks.is_empty() {
            bail!("nothing selected");
        }
        Ok(picks)
    } else {
        Ok(vec![selector.select_one(message, rows)?])
    }
}

fn select_format(selector: &mut impl Selector) -> Result<Format> {
    let formats = [Format::Mp4, Format::Dash];
    let rows = formats
        .iter()
        .map(|format| format.label().to_owned())
        .collect::<Vec<_>>();

    let chosen = selector.select_one("Please select video format", &rows)?;
    Ok(formats[chosen])
}

/// Explicit names are used as given; derived ones follow `{title}_{cid}.mp4`
/// with characters a filesystem may reject replaced.
fn output_filename(explicit: Option<&str>, item: &Item) -> String {
    match explicit {
        Some(name) => name.to_owned(),
        None => format!("{}_{}.mp4", sanitize(&item.title), item.cid),
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|x| match x {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' | '.' | ';' | '=' | ' ' => {
                '_'
            }
            _ => x,
        })
        .collect()
}

fn save_progressive(
    source: &impl MediaSource,
    item: &Item,
    directory: &Path,
    filename: &str,
) -> Result<PathBuf> {
    let set = source.renditions(&item.target, QN_DEFAULT, Format::Mp4)?;
    let rendition = match &set {
        RenditionSet::Progressive(list) => {
            list.first().ok_or_else(|| anyhow!("no streams offered"))?
        }
        RenditionSet::Split { .. } => bail!("split listing answered a progressive request"),
    };

    let media = source.open_media(&rendition.url)?;
    let output = directory.join(filename);
    let mut dest = File::create(&output)?;

    if let Err(e) = fetch::stream_to("Video", media, &mut dest) {
        // A truncated file is worse than none.
        drop(dest);
        let _ = fs::remove_file(&output);
        return Err(e);
    }

    Ok(output)
}

fn save_split(
    source: &impl MediaSource,
    selector: &mut impl Selector,
    item: &Item,
    directory: &Path,
    filename: &str,
) -> Result<PathBuf> {
    let ffmpeg = mux::ensure_ffmpeg()?;

    let set = source.renditions(&item.target, Qn::ANY, Format::Dash)?;
    let (video, audio) = match &set {
        RenditionSet::Split { video, audio } => (video, audio),
        RenditionSet::Progressive(_) => bail!("progressive listing answered a split request"),
    };

    let video_qn = select_quality(selector, "Please select video quality", video)?;
    let audio_qn = select_quality(selector, "Please select audio quality", audio)?;

    let video_rendition =
        choose_rendition(&set, video_qn).ok_or_else(|| anyhow!("no video streams offered"))?;
    let audio_rendition =
        choose_rendition(&set, audio_qn).ok_or_else(|| anyhow!("no audio streams offered"))?;

    let mut video_tmp = tempfile::Builder::new()
        .prefix("bilibili_video_")
        .suffix(".m4s")
        .tempfile_in(directory)?;
    let mut audio_tmp = tempfile::Builder::new()
        .prefix("bilibili_audio_")
        .suffix(".m4s")
        .tempfile_in(directory)?;

    fetch::stream_to(
        "Video",
        source.open_media(&video_rendition.url)?,
        video_tmp.as_file_mut(),
    )?;
    fetch::stream_to(
        "Audio",
        source.open_media(&audio_rendition.url)?,
        audio_tmp.as_file_mut(),
    )?;

    let output = directory.join(filename);
    mux::merge(&ffmpeg, video_tmp.path(), audio_tmp.path(), &output)?;

    Ok(output)
}

fn select_quality(
    selector: &mut impl Selector,
    message: &str,
    renditions: &[MediaRendition],
) -> Result<Qn> {
    let tiers = quality_tiers(renditions);
    if tiers.is_empty() {
        bail!("no streams offered");
    }

    let rows = tiers.iter().map(|qn| qn.label()).collect::<Vec<_>>();
    let chosen = selector.select_one(message, &rows)?;
    Ok(tiers[chosen])
}

/// Distinct advertised tiers in ascending order; listings repeat a tier
/// once per codec.
fn quality_tiers(renditions: &[MediaRendition]) -> Vec<Qn> {
    let mut tiers = renditions
        .iter()
        .map(|rendition| rendition.quality)
        .collect::<Vec<_>>();
    tiers.sort_unstable();
    tiers.dedup();
    tiers
}
