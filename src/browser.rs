//! System browser as a presentation host for the `open` command.
//!
//! Desktop openers cannot hand out a blank window, so the context is a
//! deferred launch: `open_blank` reserves it and `navigate` spawns the
//! platform opener once the URL is known.

use std::process::{Command, Stdio};

use ipfs_gateway::gateway::{ContextHost, NavigationContext};
use tracing::{debug, warn};

/// Opens URLs with the platform's default handler.
#[derive(Debug, Default)]
pub(crate) struct SystemBrowser;

/// A reserved browser launch.
#[derive(Debug)]
pub(crate) struct BrowserLaunch {
    target: Option<String>,
}

impl ContextHost for SystemBrowser {
    type Context = BrowserLaunch;

    fn open_blank(&self, target: Option<&str>, features: Option<&str>) -> Option<Self::Context> {
        if features.is_some() {
            debug!("window features are ignored by the system opener");
        }
        Some(BrowserLaunch {
            target: target.map(ToString::to_string),
        })
    }
}

impl NavigationContext for BrowserLaunch {
    fn navigate(&self, url: &str) {
        let mut command = opener_command(url);
        match command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => {
                debug!(url, target = ?self.target, "browser launched");
            }
            Ok(status) => warn!(url, status = %status, "browser opener exited with failure"),
            Err(error) => warn!(url, error = %error, "failed to launch browser"),
        }
    }
}

/// Platform opener family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    Windows,
    MacOs,
    FreeDesktop,
}

impl Opener {
    fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::FreeDesktop
        }
    }
}

fn opener_command(url: &str) -> Command {
    opener_command_for(Opener::current(), url)
}

/// The URL is always a single argv entry handed to a program that does not
/// re-parse it, so `&`, `|` and `^` never reach a shell.
fn opener_command_for(opener: Opener, url: &str) -> Command {
    let mut command = match opener {
        Opener::Windows => {
            let mut command = Command::new("rundll32");
            command.arg("url.dll,FileProtocolHandler");
            command
        }
        Opener::MacOs => Command::new("open"),
        Opener::FreeDesktop => Command::new("xdg-open"),
    };
    command.arg(url);
    command
}
