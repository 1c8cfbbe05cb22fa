//! Clipboard access by piping into the platform's clipboard tool.

use anyhow::{anyhow, Context, Result};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use tracing::{debug, trace};

#[cfg(target_os = "windows")]
const TOOLS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(target_os = "macos")]
const TOOLS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Copy `text` to the system clipboard using the first tool that exists.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    for (program, args) in TOOLS {
        match pipe_into(program, args, text) {
            Ok(()) => return Ok(()),
            Err(err) if is_missing(&err) => debug!("{program} not available"),
            Err(err) => return Err(err).with_context(|| format!("copying with {program}")),
        }
    }
    let names: Vec<&str> = TOOLS.iter().map(|(p, _)| *p).collect();
    Err(anyhow!("no clipboard tool found (tried {})", names.join(", ")))
}

fn is_missing(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|e| e.kind() == ErrorKind::NotFound)
        .unwrap_or(false)
}

/// Bytes `program` expects on stdin for `text`.
/// `clip` reads the console code page unless given UTF-16LE with a BOM.
fn encode_for(program: &str, text: &str) -> Vec<u8> {
    if program.eq_ignore_ascii_case("clip") {
        std::iter::once('\u{feff}')
            .chain(text.chars())
            .collect::<String>()
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect()
    } else {
        text.as_bytes().to_vec()
    }
}

/// Run `program` and write `text` to its stdin.
fn pipe_into(program: &str, args: &[&str], text: &str) -> Result<()> {
    trace!("pipe_into program={program} bytes={}", text.len());
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()?;
    // Dropping stdin closes the pipe so the tool sees EOF before we wait.
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(&encode_for(program, text)),
        None => Ok(()),
    };
    let status = child.wait()?;
    written.with_context(|| format!("writing to {program}"))?;
    if !status.success() {
        return Err(anyhow!("{program} exited with {status}"));
    }
    Ok(())
}
