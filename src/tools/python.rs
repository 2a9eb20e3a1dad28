//! Python code execution tool.
//!
//! Each invocation runs in a fresh interpreter process, so no state carries
//! over between calls or between concurrent requests.

use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use super::Tool;

const MAX_OUTPUT_BYTES: usize = 10_000;

static LEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s|`)*(?i:python)?\s*").unwrap());
static TRAILING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\s|`)*$").unwrap());

/// Run Python code in a subprocess.
pub struct PythonRepl {
    python_bin: String,
    timeout: Duration,
}

impl PythonRepl {
    pub fn new(python_bin: String, timeout: Duration) -> Self {
        Self {
            python_bin,
            timeout,
        }
    }
}

#[async_trait]
impl Tool for PythonRepl {
    fn name(&self) -> &str {
        "python_repl"
    }

    fn description(&self) -> &str {
        "A Python shell. Use this to execute python commands. Input should be a valid python command. If you want to see the output of a value, you should print it out with `print(...)`."
    }

    async fn invoke(&self, input: &str) -> anyhow::Result<String> {
        let code = sanitize_input(input);
        if code.is_empty() {
            return Err(anyhow::anyhow!("No Python code provided"));
        }

        tracing::info!(bytes = code.len(), "Executing Python code");

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.python_bin)
                .arg("-c")
                .arg(&code)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Python execution timed out after {:?}", self.timeout))?
        .map_err(|e| anyhow::anyhow!("Failed to start {}: {}", self.python_bin, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut result = if output.status.success() {
            stdout.into_owned()
        } else {
            // Surface the traceback's last line the way a REPL would show it.
            let error = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("Python exited with an error");
            format!("{}{}", stdout, error)
        };

        if result.len() > MAX_OUTPUT_BYTES {
            let mut cut = MAX_OUTPUT_BYTES;
            while !result.is_char_boundary(cut) {
                cut -= 1;
            }
            result.truncate(cut);
            result.push_str("\n... [output truncated]");
        }

        Ok(result)
    }
}

/// Strip code fences, a leading `python` marker and surrounding whitespace.
fn sanitize_input(input: &str) -> String {
    let stripped = LEADING_RE.replace(input, "");
    TRAILING_RE.replace(&stripped, "").into_owned()
}
