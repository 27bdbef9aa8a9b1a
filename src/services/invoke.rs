use std::path::PathBuf;
use std::process::Command;

#[derive(thiserror::Error, Debug)]
pub enum ClusterError {
    #[error("the state dir `{0}` doesn't exist")]
    StateDirMissing(PathBuf),
    #[error("the file `{0}` doesn't exist")]
    RequiredFileMissing(PathBuf),
    #[error("genesis.json is missing field `{0}`")]
    GenesisField(&'static str),
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("an error occurred running `{command}`: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("could not parse fee from `{0}`")]
    FeeParse(String),
    #[error("malformed {what} output: {detail}")]
    MalformedOutput { what: String, detail: String },
    #[error("could not read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Captured stdout/stderr of one successful tool invocation.
pub struct CliOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CliOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run the external tool and block until it exits. A non-zero exit becomes
/// a `CommandFailed` carrying the full command line and captured stderr.
pub fn run(program: &str, args: &[String]) -> Result<CliOutput, ClusterError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ClusterError::Spawn {
            program: program.to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(ClusterError::CommandFailed {
            command: render_command(program, args),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(CliOutput {
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

pub fn render_command(program: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(program.to_string());
    parts.extend(args.iter().cloned());
    parts.join(" ")
}

/// Interleave `flag` before every item: `--x [a, b]` -> `[--x, a, --x, b]`.
pub fn prepend_flag<S: AsRef<str>>(flag: &str, items: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(items.len() * 2);
    for item in items {
        out.push(flag.to_string());
        out.push(item.as_ref().to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepend_flag_interleaves_in_input_order() {
        assert_eq!(
            prepend_flag("--x", &["a", "b"]),
            vec!["--x", "a", "--x", "b"]
        );
    }

    #[test]
    fn prepend_flag_empty_items_yields_nothing() {
        let none: [&str; 0] = [];
        assert!(prepend_flag("--x", &none).is_empty());
    }

    #[test]
    fn render_command_joins_program_and_args() {
        let args = vec!["query".to_string(), "tip".to_string()];
        assert_eq!(render_command("node-cli", &args), "node-cli query tip");
    }
}
