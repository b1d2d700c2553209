use anyhow::{Context, Result, bail};
use colored::Colorize;
use log::info;
use std::{
    env,
    path::Path,
    process::{Command, Stdio},
};

fn find_ffmpeg() -> Option<String> {
    let bin = if cfg!(target_os = "windows") {
        "ffmpeg.exe"
    } else {
        "ffmpeg"
    };

    if Path::new(bin).exists() {
        return Some(bin.to_owned());
    }

    env::var("PATH")
        .ok()?
        .split(if cfg!(target_os = "windows") { ';' } else { ':' })
        .find_map(|dir| {
            let path = Path::new(dir).join(bin);
            path.exists().then(|| path.to_string_lossy().into_owned())
        })
}

/// Locates ffmpeg and checks that it actually runs, before any bytes are
/// transferred for a split download.
pub(super) fn ensure_ffmpeg() -> Result<String> {
    let bin =
        find_ffmpeg().context("ffmpeg not found in PATH, split downloads need it for merging")?;

    let status = Command::new(&bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("ffmpeg could not be executed")?;

    if !status.success() {
        bail!("ffmpeg exited with code {}", status.code().unwrap_or(1));
    }

    Ok(bin)
}

/// Copy merges one video and one audio track into `output`, trimmed to
/// the shorter stream. Overwrites an existing output.
pub(super) fn merge(ffmpeg: &str, video: &Path, audio: &Path, output: &Path) -> Result<()> {
    let args = vec![
        "-y".to_owned(),
        "-i".to_owned(),
        video.to_string_lossy().into_owned(),
        "-i".to_owned(),
        audio.to_string_lossy().into_owned(),
        "-c".to_owned(),
        "copy".to_owned(),
        "-shortest".to_owned(),
        output.to_string_lossy().into_owned(),
        "-loglevel".to_owned(),
        "warning".to_owned(),
    ];

    info!(
        "Executing {} {}",
        "ffmpeg".bold(),
        args.iter()
            .map(|x| if x.contains(' ') {
                format!("\"{x}\"")
            } else {
                x.to_owned()
            })
            .collect::<Vec<_>>()
            .join(" ")
            .bold()
    );

    let code = Command::new(ffmpeg).args(args).spawn()?.wait()?;

    if !code.success() {
        bail!("ffmpeg exited with code {}", code.code().unwrap_or(1));
    }

    Ok(())
}
