use crate::delivery::{DeliveryError, Notifier};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

const BODY_FILE: &str = "{body_file}";

/// Delivers by running an external program (a mailer, usually).
///
/// Every configured argument becomes exactly one argv entry. `{recipient}`,
/// `{subject}`, `{body}` and `{body_file}` are substituted inside those entries,
/// and no shell is involved, so alert text can never be read as command syntax.
///
/// `{body_file}` names a temporary file holding the body, which keeps large
/// alerts clear of the kernel's per-argument size limit. The file is removed
/// once the program has exited.
pub struct CommandNotifier {
    program: PathBuf,
    args: Vec<String>,
    recipient: String,
    timeout: Duration,
}

impl CommandNotifier {
    pub fn new(
        program: PathBuf,
        args: Vec<String>,
        recipient: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program,
            args,
            recipient: recipient.into(),
            timeout,
        }
    }

    /// The argv (without the program) for one alert. `{body_file}` expands to
    /// `body_file`, or to nothing when no file was written.
    pub fn argv(&self, subject: &str, body: &str, body_file: Option<&Path>) -> Vec<String> {
        let body_path = body_file
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();
        let values = [
            ("recipient", self.recipient.as_str()),
            ("subject", subject),
            ("body", body),
            ("body_file", body_path.as_str()),
        ];
        self.args
            .iter()
            .map(|template| substitute(template, &values))
            .collect()
    }

    fn wants_body_file(&self) -> bool {
        self.args.iter().any(|arg| arg.contains(BODY_FILE))
    }
}

fn write_body_file(body: &str) -> Result<NamedTempFile, DeliveryError> {
    let mut file = tempfile::Builder::new()
        .prefix("journalmon-")
        .suffix(".html")
        .tempfile()
        .map_err(DeliveryError::BodyFile)?;
    file.write_all(body.as_bytes())
        .and_then(|()| file.flush())
        .map_err(DeliveryError::BodyFile)?;
    Ok(file)
}

/// Single left-to-right pass, so substituted text is never expanded again.
fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let program = self.program.display().to_string();
        // Held until the child exits; dropping it deletes the file.
        let body_file = if self.wants_body_file() {
            Some(write_body_file(body)?)
        } else {
            None
        };
        let argv = self.argv(subject, body, body_file.as_ref().map(NamedTempFile::path));

        let child = Command::new(&self.program)
            .args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DeliveryError::Spawn {
                program: program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DeliveryError::Timeout(self.timeout))?
            .map_err(|source| DeliveryError::Spawn {
                program: program.clone(),
                source,
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(program = %program, "{}", line);
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(DeliveryError::CommandFailed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(program: &str, args: &[&str]) -> CommandNotifier {
        CommandNotifier::new(
            PathBuf::from(program),
            args.iter().map(|s| s.to_string()).collect(),
            "ops@example.com",
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_placeholders_fill_discrete_arguments() {
        let n = notifier(
            "mailer",
            &["--to", "{recipient}", "--subject", "{subject}", "--body", "{body}"],
        );
        let argv = n.argv("[Error] nginx; rm -rf /", "<p>$(reboot)</p>", None);
        assert_eq!(
            argv,
            vec![
                "--to",
                "ops@example.com",
                "--subject",
                "[Error] nginx; rm -rf /",
                "--body",
                "<p>$(reboot)</p>",
            ]
        );
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let n = notifier("mailer", &["{subject}|{body}"]);
        let argv = n.argv("{body}", "{recipient}", None);
        assert_eq!(argv, vec!["{body}|{recipient}"]);
    }

    #[test]
    fn test_unknown_placeholders_are_left_alone() {
        assert_eq!(substitute("{nope} {", &[("body", "x")]), "{nope} {");
        assert_eq!(substitute("--body={body}", &[("body", "x")]), "--body=x");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_command() {
        let n = notifier("true", &["{subject}"]);
        n.send("subject", "body").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_reported() {
        let n = notifier("false", &[]);
        let err = n.send("subject", "body").await.unwrap_err();
        assert!(matches!(err, DeliveryError::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_metacharacters_reach_program_verbatim() {
        // `test` only succeeds if it receives the exact string as one argument
        let subject = "a; echo pwned > /tmp/x && $(id)";
        let n = notifier("test", &["{subject}", "=", "a; echo pwned > /tmp/x && $(id)"]);
        n.send(subject, "").await.unwrap();
    }

    #[test]
    fn test_body_file_placeholder_takes_the_path() {
        let n = notifier("mailer", &["--body-file", "{body_file}"]);
        assert!(n.wants_body_file());
        let argv = n.argv("s", "b", Some(Path::new("/tmp/journalmon-x.html")));
        assert_eq!(argv, vec!["--body-file", "/tmp/journalmon-x.html"]);
        assert!(!notifier("mailer", &["{body}"]).wants_body_file());
    }

    /// An HTML body well past the 128 KiB single-argument limit.
    fn oversized_body() -> String {
        let mut body = crate::alert::html_escape(&"<&>".repeat(30_000));
        body.push_str("END-OF-BODY");
        assert!(body.len() > 128 * 1024);
        body
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_large_body_is_delivered_through_default_args() {
        let args = match crate::config::DeliveryConfig::default() {
            crate::config::DeliveryConfig::Command { args, .. } => args,
            other => panic!("unexpected default delivery: {:?}", other),
        };
        let n = CommandNotifier::new(
            PathBuf::from("true"),
            args,
            "ops@example.com",
            Duration::from_secs(5),
        );
        n.send("[Error] big", &oversized_body()).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_body_file_holds_the_full_body() {
        // grep exits 0 only if the marker at the very end made it into the file
        let n = notifier("grep", &["-q", "END-OF-BODY", "{body_file}"]);
        n.send("s", &oversized_body()).await.unwrap();
    }

    #[test]
    fn test_body_file_is_removed_on_drop() {
        let file = write_body_file("<p>body</p>").unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>body</p>");

        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let n = notifier("/nonexistent/journalmon-mailer", &[]);
        let err = n.send("s", "b").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_command_times_out() {
        let n = CommandNotifier::new(
            PathBuf::from("sleep"),
            vec!["5".to_string()],
            "ops@example.com",
            Duration::from_millis(100),
        );
        let err = n.send("s", "b").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Timeout(_)));
    }
}
