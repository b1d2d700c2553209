use anyhow::Result;
use bilibili::MediaStream;
use kdam::{BarExt, tqdm};
use std::io::{Read, Write};

/// Streams `media` to `dest` with a byte progress bar labelled `label`.
/// Returns the transferred byte count.
pub(super) fn stream_to(label: &str, mut media: MediaStream, dest: &mut impl Write) -> Result<u64> {
    let mut pb = tqdm!(
        total = media.content_length.unwrap_or(0) as usize,
        desc = label.to_owned(),
        unit = "B",
        unit_scale = true,
        unit_divisor = 1024
    );

    let mut buffer = vec![0u8; 64 * 1024];
    let mut transferred = 0u64;

    loop {
        let read = media.read(&mut buffer)?;

        if read == 0 {
            break;
        }

        dest.write_all(&buffer[..read])?;
        transferred += read as u64;
        pb.update(read)?;
    }

    dest.flush()?;
    pb.refresh()?;
    eprintln!();

    Ok(transferred)
}
