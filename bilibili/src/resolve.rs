use crate::{
    client::Client,
    error::Result,
    season::{SeasonInfo, SeasonQuery},
    video::{self, DashStream, Fnval, PlayInfo, Qn, VideoInfo},
};
use chrono::DateTime;
use log::warn;
use serde::Serialize;

/// Default tier for progressive downloads; the listing endpoint answers a
/// single file per request, so no tier menu is offered.
pub const QN_DEFAULT: Qn = Qn::P1080;

/// Delivery format of a rendition set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    /// One self contained file.
    Mp4,
    /// Separate video and audio tracks, remuxed after download.
    Dash,
}

impl Format {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mp4 => "MP4",
            Self::Dash => "DASH",
        }
    }

    fn fnval(self) -> Fnval {
        match self {
            Self::Mp4 => Fnval::MP4,
            Self::Dash => Fnval::DASH,
        }
    }
}

/// What to resolve streams for: a page of a standalone video, or a season
/// episode (served by a different endpoint).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamTarget {
    Page { bvid: String, cid: i64 },
    Episode { ep_id: String },
}

/// Display oriented frame size, already corrected for rotated sources.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Dimension {
    pub height: i64,
    pub width: i64,
}

/// One selectable part of a standalone video.
#[derive(Clone, Debug, Serialize)]
pub struct PageDescriptor {
    pub cid: i64,
    pub ordinal: i32,
    pub title: String,
    pub duration: i64,
    pub dimension: Dimension,
}

/// One selectable episode of a season.
#[derive(Clone, Debug, Serialize)]
pub struct EpisodeDescriptor {
    pub bvid: String,
    pub aid: i64,
    pub cid: i64,
    pub ep_id: i64,
    pub title: String,
    pub duration: i64,
    pub dimension: Dimension,
}

/// Everything the cli needs to describe a standalone video.
#[derive(Clone, Debug, Serialize)]
pub struct VideoMetadata {
    pub bvid: String,
    pub aid: i64,
    pub title: String,
    pub author: String,
    pub duration: i64,
    pub publish_time: String,
    pub create_time: String,
    pub description: String,
    pub pages: Vec<PageDescriptor>,
}

/// Everything the cli needs to describe a season.
#[derive(Clone, Debug, Serialize)]
pub struct SeasonMetadata {
    pub season_id: i64,
    pub title: String,
    pub duration: i64,
    pub description: String,
    pub episodes: Vec<EpisodeDescriptor>,
}

/// Kind of a concrete rendition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenditionKind {
    Progressive,
    DashVideo,
    DashAudio,
}

/// One concrete stream offered by the platform.
#[derive(Clone, Debug)]
pub struct MediaRendition {
    pub quality: Qn,
    pub kind: RenditionKind,
    pub url: String,
    pub backup_urls: Vec<String>,
}

/// Candidate streams for one target in one format.
#[derive(Clone, Debug)]
pub enum RenditionSet {
    /// Single file delivery; the first entry is primary, the rest are
    /// fallbacks the platform offered. Nothing here retries them.
    Progressive(Vec<MediaRendition>),
    /// Split delivery; both lists carry every advertised tier.
    Split {
        video: Vec<MediaRendition>,
        audio: Vec<MediaRendition>,
    },
}

impl Client {
    /// Full metadata for a standalone video.
    pub fn video_metadata(&self, bvid: &str) -> Result<VideoMetadata> {
        Ok(self.video_info(bvid)?.into())
    }

    /// Full metadata for a season, addressed by season or episode id.
    pub fn season_metadata(&self, query: &SeasonQuery) -> Result<SeasonMetadata> {
        Ok(self.season_info(query)?.into())
    }

    /// Candidate streams for `target`. Progressive listings honor `qn` and
    /// answer a single tier; split listings ignore it and advertise every
    /// tier, so pass [`Qn::ANY`] there.
    pub fn renditions(
        &self,
        target: &StreamTarget,
        qn: Qn,
        format: Format,
    ) -> Result<RenditionSet> {
        let play = match target {
            StreamTarget::Page { bvid, cid } => self.play_url(bvid, *cid, qn, format.fnval())?,
            StreamTarget::Episode { ep_id } => self.play_url_episode(ep_id, qn, format.fnval())?,
        };

        Ok(match format {
            Format::Mp4 => RenditionSet::Progressive(progressive_renditions(play)),
            Format::Dash => {
                let dash = play.dash.unwrap_or_default();
                RenditionSet::Split {
                    video: dash_renditions(dash.video, RenditionKind::DashVideo),
                    audio: dash_renditions(dash.audio, RenditionKind::DashAudio),
                }
            }
        })
    }
}

/// Picks the rendition matching `qn`, routing to the audio or video list
/// by the quality boundary. A missing tier falls back to the first offered
/// entry with a warning; the platform does not guarantee every advertised
/// tier in every region.
pub fn choose_rendition(set: &RenditionSet, qn: Qn) -> Option<&MediaRendition> {
    let list = match set {
        RenditionSet::Progressive(list) => list,
        RenditionSet::Split { video, audio } => {
            if qn.is_audio() {
                audio
            } else {
                video
            }
        }
    };

    if let Some(found) = list.iter().find(|r| r.quality == qn) {
        return Some(found);
    }

    let first = list.first();
    if let Some(fallback) = first {
        warn!("no {qn} rendition offered, falling back to {}", fallback.quality);
    }
    first
}

fn progressive_renditions(play: PlayInfo) -> Vec<MediaRendition> {
    let quality = Qn(play.quality);
    play.durl
        .unwrap_or_default()
        .into_iter()
        .map(|durl| MediaRendition {
            quality,
            kind: RenditionKind::Progressive,
            url: durl.url,
            backup_urls: durl.backup_url.unwrap_or_default(),
        })
        .collect()
}

fn dash_renditions(streams: Vec<DashStream>, kind: RenditionKind) -> Vec<MediaRendition> {
    streams
        .into_iter()
        .map(|stream| MediaRendition {
            quality: Qn(stream.id),
            kind,
            url: stream.base_url,
            backup_urls: stream.backup_url.unwrap_or_default(),
        })
        .collect()
}

/// Swaps width and height when the source was recorded rotated, so the
/// displayed dimension matches what the player renders.
fn corrected(dimension: video::Dimension) -> Dimension {
    if dimension.rotate != 0 {
        Dimension {
            height: dimension.width,
            width: dimension.height,
        }
    } else {
        Dimension {
            height: dimension.height,
            width: dimension.width,
        }
    }
}

fn rfc3339(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|time| time.to_rfc3339())
        .unwrap_or_default()
}

impl From<VideoInfo> for VideoMetadata {
    fn from(info: VideoInfo) -> Self {
        let mut duration = 0;
        let pages = info
            .pages
            .into_iter()
            .map(|page| {
                duration += page.duration;
                PageDescriptor {
                    cid: page.cid,
                    ordinal: page.page,
                    title: page.part,
                    duration: page.duration,
                    dimension: corrected(page.dimension),
                }
            })
            .collect();

        Self {
            bvid: info.bvid,
            aid: info.aid,
            title: info.title,
            author: format!("{}({})", info.owner.name, info.owner.mid),
            duration,
            publish_time: rfc3339(info.pubdate),
            create_time: rfc3339(info.ctime),
            description: info.desc,
            pages,
        }
    }
}

impl From<SeasonInfo> for SeasonMetadata {
    fn from(info: SeasonInfo) -> Self {
        let mut duration = 0;
        let episodes = info
            .episodes
            .into_iter()
            .map(|episode| {
                duration += episode.duration;
                EpisodeDescriptor {
                    bvid: episode.bvid,
                    aid: episode.aid,
                    cid: episode.cid,
                    ep_id: episode.id,
                    title: if episode.long_title.is_empty() {
                        episode.title
                    } else {
                        episode.long_title
                    },
                    duration: episode.duration,
                    dimension: corrected(episode.dimension),
                }
            })
            .collect();

        Self {
            season_id: info.season_id,
            title: format!("{}({})", info.title, info.subtitle),
            duration,
            description: info.evaluate,
            episodes,
        }
    }
}
