use std::{path::Path, process::Command};

use crate::{config::SigstashConfig, stream::Mode};

/// Build the `git fast-export` command feeding the transcoder.
///
/// Store mode asks git to emit commit signatures verbatim; without that flag
/// fast-export strips them and there is nothing to store.
pub fn export_command(
    config: &SigstashConfig,
    mode: Mode,
    refs: &[String],
    repo: Option<&Path>,
) -> Command {
    let mut cmd = Command::new(&config.git_binary);
    if let Some(repo) = repo {
        cmd.arg("-C").arg(repo);
    }
    cmd.arg("fast-export");
    if mode == Mode::Store {
        cmd.arg("--signed-commits=verbatim");
    }
    if config.show_original_ids {
        cmd.arg("--show-original-ids");
    }
    if refs.is_empty() {
        cmd.args(&config.default_refs);
    } else {
        cmd.args(refs);
    }
    cmd
}
