use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

/// Encoding of the `info` output.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
    Xml,
    Yaml,
}

/// Writes `value` in the requested encoding. `plain` output is produced by
/// the caller supplied renderer, everything else by serde.
pub fn write_output<W, T, F>(out: &mut W, format: OutputFormat, value: &T, plain: F) -> Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&mut W) -> Result<()>,
{
    match format {
        OutputFormat::Plain => plain(out)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(value)?)?,
        OutputFormat::Xml => writeln!(out, "{}", quick_xml::se::to_string(value)?)?,
        OutputFormat::Yaml => write!(out, "{}", serde_yaml::to_string(value)?)?,
    }

    Ok(())
}

/// Bordered table with upper cased headers, columns sized to content.
pub fn render_table(out: &mut impl Write, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let rule = widths
        .iter()
        .map(|width| "-".repeat(width + 2))
        .collect::<Vec<_>>()
        .join("+");

    writeln!(out, "+{rule}+")?;
    write_row(
        out,
        &widths,
        &headers
            .iter()
            .map(|header| header.to_uppercase())
            .collect::<Vec<_>>(),
    )?;
    writeln!(out, "+{rule}+")?;

    for row in rows {
        write_row(out, &widths, row)?;
    }

    writeln!(out, "+{rule}+")?;
    Ok(())
}

fn write_row(out: &mut impl Write, widths: &[usize], cells: &[String]) -> Result<()> {
    for (width, cell) in widths.iter().zip(cells) {
        let pad = width - cell.chars().count();
        write!(out, "| {}{} ", cell, " ".repeat(pad))?;
    }
    writeln!(out, "|")?;
    Ok(())
}
