use std::{path::Path, process::Command};

use crate::{config::SigstashConfig, stream::Mode};

/// Build the `git fast-import` command consuming the transcoder's output.
pub fn import_command(config: &SigstashConfig, mode: Mode, repo: Option<&Path>) -> Command {
    let mut cmd = Command::new(&config.git_binary);
    if let Some(repo) = repo {
        cmd.arg("-C").arg(repo);
    }
    if mode == Mode::Store {
        // Same setting git-filter-repo imports with, so both passes agree on ref names.
        cmd.args(["-c", "core.ignorecase=false"]);
    }
    cmd.arg("fast-import");
    if config.force_import {
        cmd.arg("--force");
    }
    cmd.arg("--quiet");
    cmd
}
