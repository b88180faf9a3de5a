//! Run `git fast-export | transcoder | git fast-import` as one operation

use std::{
    io::{BufReader, BufWriter, Read, Write},
    path::PathBuf,
    process::{Child, ChildStderr, Stdio},
    thread::JoinHandle,
    time::Duration,
};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config::SigstashConfig,
    error::Error,
    git,
    stream::{self, Mode, TranscodeStats},
};

/// What to rewrite and how to report it
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub mode: Mode,
    /// Ref selectors; empty means the configured defaults
    pub refs: Vec<String>,
    /// Repository to rewrite; the current directory when unset
    pub repo: Option<PathBuf>,
    pub show_progress: bool,
}

/// Rewrite the repository's history in place, relocating commit signatures.
pub fn run(config: &SigstashConfig, options: &PipelineOptions) -> Result<TranscodeStats> {
    let mode = options.mode;
    let repo = options.repo.as_deref();

    let mut export_cmd = git::export_command(config, mode, &options.refs, repo);
    tracing::info!("Running {:?}", export_cmd);
    let mut export = export_cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to spawn git fast-export")?;

    let mut import_cmd = git::import_command(config, mode, repo);
    tracing::info!("Running {:?}", import_cmd);
    let mut import = match import_cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            terminate(&mut export, "git fast-export");
            return Err(e).context("Failed to spawn git fast-import");
        }
    };

    let export_stderr = drain_stderr(export.stderr.take());
    let import_stderr = drain_stderr(import.stderr.take());

    let (Some(export_out), Some(import_in)) = (export.stdout.take(), import.stdin.take()) else {
        terminate(&mut export, "git fast-export");
        terminate(&mut import, "git fast-import");
        anyhow::bail!("git child processes were spawned without pipes");
    };

    let progress = options.show_progress.then(spinner);
    let mut writer = BufWriter::new(import_in);
    let result = stream::transcode_with_progress(
        mode,
        BufReader::new(export_out),
        &mut writer,
        |stats| {
            if let Some(bar) = &progress {
                bar.set_message(format!(
                    "{} commits, {} signatures",
                    stats.commits, stats.signatures
                ));
            }
        },
    );
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    let stats = match result {
        Ok(stats) => stats,
        Err(err) => {
            // fast-import must not see a clean end of stream: it would commit
            // whatever was written so far.
            terminate(&mut import, "git fast-import");
            terminate(&mut export, "git fast-export");
            drop(writer);
            let import_stderr = join_stderr(import_stderr)?;
            let export_stderr = join_stderr(export_stderr)?;
            let mut err = anyhow::Error::new(err).context(format!("Failed to {} signatures", mode));
            if !import_stderr.is_empty() {
                err = err.context(format!("git fast-import: {}", import_stderr));
            }
            if !export_stderr.is_empty() {
                err = err.context(format!("git fast-export: {}", export_stderr));
            }
            return Err(err);
        }
    };

    // fast-export has closed its stdout; only a clean exit may reach
    // fast-import as end of stream.
    let export_status = export.wait().context("Failed to wait for git fast-export")?;
    if !export_status.success() {
        terminate(&mut import, "git fast-import");
        drop(writer);
        let export_stderr = join_stderr(export_stderr)?;
        join_stderr(import_stderr)?;
        return Err(Error::Git(format!(
            "git fast-export failed with {}: {}",
            export_status, export_stderr
        ))
        .into());
    }

    // Closing stdin lets fast-import finish.
    drop(writer);

    let import_status = import.wait().context("Failed to wait for git fast-import")?;
    join_stderr(export_stderr)?;
    let import_stderr = join_stderr(import_stderr)?;

    if !import_status.success() {
        return Err(Error::Git(format!(
            "git fast-import failed with {}: {}",
            import_status, import_stderr
        ))
        .into());
    }

    tracing::info!("Processed {} commits", stats.commits);
    Ok(stats)
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message("Waiting for git fast-export");
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Kill and reap a child, logging rather than failing: this only runs on
/// paths that already carry an error.
fn terminate(child: &mut Child, name: &str) {
    if let Err(e) = child.kill() {
        tracing::debug!("Failed to kill {}: {}", name, e);
    }
    if let Err(e) = child.wait() {
        tracing::debug!("Failed to wait for {}: {}", name, e);
    }
}

/// Read a child's stderr on a helper thread so the child never blocks on it.
fn drain_stderr(stderr: Option<ChildStderr>) -> Option<JoinHandle<Vec<u8>>> {
    stderr.map(|mut stderr| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = stderr.read_to_end(&mut buf) {
                tracing::debug!("Failed to read child stderr: {}", e);
            }
            buf
        })
    })
}

fn join_stderr(handle: Option<JoinHandle<Vec<u8>>>) -> Result<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| anyhow::anyhow!("stderr reader thread panicked"))?;
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

/// Filter a stream from `input` to `output` without spawning git.
pub fn run_stdio<R: Read, W: Write>(mode: Mode, input: R, output: W) -> Result<TranscodeStats> {
    let stats = stream::transcode(mode, BufReader::new(input), BufWriter::new(output))
        .with_context(|| format!("Failed to {} signatures", mode))?;
    Ok(stats)
}
