use crate::error::Error;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// Destination for a generated password when it is not printed.
pub trait Clipboard {
    fn copy(&mut self, secret: &[u8]) -> Result<(), Error>;
}

/// A clipboard tool that reads the text to copy from its stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardTool {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

#[cfg(target_os = "macos")]
const TOOLS: &[ClipboardTool] = &[ClipboardTool {
    program: "pbcopy",
    args: &[],
}];

#[cfg(windows)]
const TOOLS: &[ClipboardTool] = &[ClipboardTool {
    program: "clip",
    args: &[],
}];

#[cfg(not(any(target_os = "macos", windows)))]
const TOOLS: &[ClipboardTool] = &[
    ClipboardTool {
        program: "wl-copy",
        args: &[],
    },
    ClipboardTool {
        program: "xclip",
        args: &["-selection", "clipboard"],
    },
    ClipboardTool {
        program: "xsel",
        args: &["--clipboard", "--input"],
    },
];

/// Copies through the first platform clipboard tool that runs successfully.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    tools: &'static [ClipboardTool],
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self { tools: TOOLS }
    }

    pub fn with_tools(tools: &'static [ClipboardTool]) -> Self {
        Self { tools }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&mut self, secret: &[u8]) -> Result<(), Error> {
        for tool in self.tools {
            match pipe_into(tool, secret) {
                Ok(()) => {
                    debug!(program = tool.program, "copied to clipboard");
                    return Ok(());
                }
                Err(e) => debug!(program = tool.program, "clipboard tool failed: {e}"),
            }
        }
        debug!("no clipboard tool succeeded");
        Err(Error::Clipboard)
    }
}

fn pipe_into(tool: &ClipboardTool, secret: &[u8]) -> std::io::Result<()> {
    let mut command = Command::new(tool.program);
    command
        .args(tool.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    let mut child = command.spawn()?;
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(secret),
        None => Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "failed to open clipboard tool stdin",
        )),
    };
    // stdin is closed by now, so the tool sees end of input.
    let status = child.wait()?;
    written?;
    if !status.success() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{} exited with {status}", tool.program),
        ));
    }
    Ok(())
}
