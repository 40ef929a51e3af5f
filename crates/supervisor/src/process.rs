//! Spawning and signalling the worker process.

use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::config::WorkerConfig;

/// Build the worker command with piped output.
///
/// stdin is closed; the worker takes everything from its arguments.
/// `kill_on_drop(true)` makes sure an abandoned child does not outlive the
/// task that owns it.
pub(crate) fn worker_command(config: &WorkerConfig, args: &[String]) -> Command {
    let mut cmd = Command::new(&config.program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in &config.env_vars {
        cmd.env(key, value);
    }

    if let Some(dir) = &config.working_directory {
        cmd.current_dir(dir);
    }

    cmd
}

/// Ask the worker to exit with SIGTERM.
///
/// A child that has already been reaped has no pid and is left alone, so
/// a recycled pid is never signalled.
#[cfg(unix)]
pub(crate) fn terminate(child: &mut Child) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| std::io::Error::other(format!("pid {pid} out of range")))?;

    // SAFETY: kill(2) has no memory-safety preconditions. The pid belongs
    // to our own unreaped child.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub(crate) fn terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
