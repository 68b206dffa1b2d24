pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# JOURNALMON CONFIGURATION
# =============================================================================
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/journalmon/config.yml
#   3. /etc/journalmon/config.yml
#
# Any value may reference an environment variable with $env{VAR_NAME}.

# Who receives alerts. Passed untouched to the delivery transport.
recipient: admin@example.com

# Most verbose severity that raises an alert:
#   0=emerg 1=alert 2=crit 3=err 4=warning 5=notice 6=info 7=debug
min_priority: 3

# Severity assumed for journal entries without a PRIORITY field.
default_priority: 3

# Records from the same (unit, service) arriving within this window are
# coalesced into one alert carrying an occurrence count.
# Integer seconds or 500ms/30s/5m/1h. 0 sends every record immediately.
batch_window: 60

# Only alert for services or units containing one of these substrings
# (case-sensitive). Comma-separated string or a list. Empty = everything.
filters: ""
# filters: nginx,postgres

# Host name shown in alerts. Defaults to the system host name.
# hostname: web-01

# =============================================================================
# SOURCE
# =============================================================================
# journal: follow the systemd journal (journalctl -f -p <min_priority> -o json)
# stdin:   read journal JSON lines from standard input
# file:    replay journal JSON lines from a file, then stop
source:
  type: journal
  journalctl: journalctl
  extra_args: []

# =============================================================================
# DELIVERY
# =============================================================================
# command: run a program. Each entry of `args` is one argv element; the
#          placeholders {recipient}, {subject}, {body} and {body_file} are
#          substituted in place and never interpreted by a shell.
#          {body_file} is the path of a temporary file holding the HTML body,
#          removed once the program exits. Prefer it over {body}: a single
#          argument is limited to 128 KiB on Linux.
# webhook: POST {"recipient", "subject", "body"} as JSON to `url`.
delivery:
  type: command
  program: mailer
  args: ["--to", "{recipient}", "--subject", "{subject}", "--body-file", "{body_file}"]
  timeout: 30s
# delivery:
#   type: webhook
#   url: https://hooks.example.com/journalmon
#   timeout: 10s

# =============================================================================
# PIPELINE
# =============================================================================
pipeline:
  # How often expired batches are flushed when no records arrive
  tick_interval: 1s
  # Longer journal lines are skipped and counted as parse failures
  max_line_bytes: 65536
"#
    .to_string()
}
