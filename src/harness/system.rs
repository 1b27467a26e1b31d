//! System implementations of the harness interfaces
//!
//! - [`SystemRunner`] spawns real processes through `std::process`.
//! - [`SystemEmulator`] wraps the emulator child. On unix the child leads its own process group so the whole
//!   tree (`make` and the `qemu` it starts) can be killed by group id instead of by executable name.
//! - [`FsWorkspace`] operates on a real directory.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use super::interfaces::{CommandRunner, CommandSpec, EmulatorProcess, ExitInfo, HarnessError, Workspace};

/// Process spawning via `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run_logged(&self, spec: &CommandSpec, cwd: &Path, log: &Path) -> io::Result<ExitInfo> {
        let stdout = OpenOptions::new().create(true).append(true).open(log)?;
        let stderr = stdout.try_clone()?;
        let status = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()?;
        Ok(status.into())
    }

    fn spawn_emulator(&self, spec: &CommandSpec, cwd: &Path, capture: &Path) -> io::Result<Box<dyn EmulatorProcess>> {
        let stdout = File::create(capture)?;
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(stdout)
            .stderr(Stdio::inherit());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn()?;
        let stdin = child.stdin.take();
        tracing::debug!(pid = child.id(), command = %spec, "emulator started");
        Ok(Box::new(SystemEmulator { child, stdin }))
    }
}

/// A running emulator child.
pub struct SystemEmulator {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl EmulatorProcess for SystemEmulator {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitInfo>> {
        Ok(self.child.try_wait()?.map(ExitInfo::from))
    }

    fn send(&mut self, line: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "emulator stdin is closed"))?;
        stdin.write_all(line.as_bytes())?;
        stdin.flush()
    }

    fn terminate(&mut self) -> io::Result<()> {
        // Closing stdin first lets a shell-driven emulator see EOF.
        self.stdin = None;
        self.child.kill()
    }

    #[cfg(unix)]
    fn kill_group(&mut self) -> io::Result<()> {
        let group = format!("-{}", self.child.id());
        let output = Command::new("kill")
            .args(["-KILL", "--", &group])
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Every member already exited: nothing left to kill.
        if stderr.contains("No such process") {
            return Ok(());
        }
        Err(io::Error::other(format!("kill {} failed: {}", group, stderr.trim())))
    }

    #[cfg(not(unix))]
    fn kill_group(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn reap(&mut self) -> io::Result<ExitInfo> {
        Ok(self.child.wait()?.into())
    }
}

/// A real working directory.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(HarnessError::MissingWorkdir(root));
        }
        Ok(Self { root })
    }
}

impl Workspace for FsWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    fn remove_if_exists(&self, name: &str) -> io::Result<bool> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn truncate(&self, name: &str) -> io::Result<()> {
        File::create(self.path_of(name)).map(|_| ())
    }

    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_of(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
