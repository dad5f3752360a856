//! `mpc` subprocess adapter.
//!
//! Every operation is one short-lived `mpc` process, started directly (no
//! shell) and killed if it outlives the configured timeout.  Status comes
//! from scraping mpc's human-readable output:
//!
//! ```text
//! $ mpc current
//! Triple J: Spacey Jane - Booster Seat
//! $ mpc volume
//! volume: 80%
//! $ mpc status
//! Triple J: Spacey Jane - Booster Seat
//! [playing] #1/1   2:13/0:00 (0%)
//! volume: 80%   repeat: off   random: off   single: off   consume: off
//! ```

use async_trait::async_trait;
use rad10_proto::protocol::{StatusSnapshot, TransportStatus};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Controller, ControllerError};

pub struct MpcController {
    binary: PathBuf,
    host: String,
    port: u16,
    timeout: Duration,
}

impl MpcController {
    pub fn new(binary: PathBuf, host: String, port: u16, timeout: Duration) -> Self {
        Self {
            binary,
            host,
            port,
            timeout,
        }
    }

    /// Run `mpc <args>` and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, ControllerError> {
        let what = format!("mpc {}", args.join(" "));
        debug!("running {}", what);

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.arg(format!("--host={}", self.host))
            .arg(format!("--port={}", self.port))
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ControllerError::Timeout {
                what: what.clone(),
                after: self.timeout,
            })?
            .map_err(|source| ControllerError::Spawn {
                program: self.binary.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ControllerError::Exit {
                what,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_discarding(&self, args: &[&str]) -> Result<(), ControllerError> {
        self.run(args).await.map(|_| ())
    }
}

#[async_trait]
impl Controller for MpcController {
    fn name(&self) -> &'static str {
        "mpc"
    }

    async fn toggle(&self) -> Result<(), ControllerError> {
        self.run_discarding(&["toggle"]).await
    }

    async fn adjust_volume(&self, delta: i32) -> Result<(), ControllerError> {
        // mpc treats an unsigned number as absolute
        let arg = format!("{:+}", delta);
        self.run_discarding(&["volume", &arg]).await
    }

    async fn clear(&self) -> Result<(), ControllerError> {
        self.run_discarding(&["clear"]).await
    }

    async fn enqueue(&self, url: &str) -> Result<(), ControllerError> {
        self.run_discarding(&["add", url]).await
    }

    async fn play(&self) -> Result<(), ControllerError> {
        self.run_discarding(&["play"]).await
    }

    async fn query_status(&self) -> StatusSnapshot {
        let mut snapshot = StatusSnapshot::default();

        match self.run(&["current"]).await {
            Ok(out) => snapshot.now_playing = parse_current(&out),
            Err(e) => {
                warn!("status query failed: {}", e);
                snapshot.mark_unavailable(e.to_string());
            }
        }
        match self.run(&["volume"]).await {
            Ok(out) => snapshot.volume = parse_volume(&out),
            Err(e) => {
                warn!("volume query failed: {}", e);
                snapshot.mark_unavailable(e.to_string());
            }
        }
        match self.run(&["status"]).await {
            Ok(out) => snapshot.transport = parse_transport(&out),
            Err(e) => {
                warn!("transport query failed: {}", e);
                snapshot.mark_unavailable(e.to_string());
            }
        }

        snapshot
    }
}

/// `mpc current` output, minus the trailing newline.
pub fn parse_current(out: &str) -> String {
    out.trim_end_matches(['\r', '\n']).to_string()
}

/// `volume: 80%` → `80%`.  Without a number (`volume: n/a`) the text after
/// the colon is kept as-is.
pub fn parse_volume(out: &str) -> String {
    let out = out.trim();
    if out.is_empty() {
        return String::new();
    }
    let digits: String = out
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if !digits.is_empty() {
        return format!("{}%", digits);
    }
    match out.split_once(':') {
        Some((_, rest)) => rest.trim().to_string(),
        None => out.to_string(),
    }
}

/// The `[playing]`/`[paused]` token of `mpc status`.  The song line above it
/// may itself start with a bracket, so only known states count.  mpc prints
/// no state line at all when stopped, so any other non-empty output means
/// stopped.
pub fn parse_transport(out: &str) -> String {
    if out.trim().is_empty() {
        return String::new();
    }
    let known = [TransportStatus::Playing, TransportStatus::Paused];
    out.lines()
        .filter_map(|line| line.strip_prefix('['))
        .filter_map(|rest| rest.split_once(']'))
        .find_map(|(token, _)| known.into_iter().find(|s| s.label() == token))
        .unwrap_or(TransportStatus::Stopped)
        .label()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current() {
        assert_eq!(parse_current("Triple J: Booster Seat\n"), "Triple J: Booster Seat");
        assert_eq!(parse_current("  padded  \r\n"), "  padded  ");
        assert_eq!(parse_current(""), "");
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(parse_volume("volume: 80%\n"), "80%");
        assert_eq!(parse_volume("volume:  5%"), "5%");
        assert_eq!(parse_volume("volume:100%"), "100%");
        assert_eq!(parse_volume("volume: n/a\n"), "n/a");
        assert_eq!(parse_volume(""), "");
        assert_eq!(parse_volume("\n"), "");
    }

    #[test]
    fn test_parse_transport() {
        let playing = "Triple J: Song [Live]\n[playing] #1/1   2:13/0:00 (0%)\nvolume: 80%   repeat: off\n";
        assert_eq!(parse_transport(playing), "playing");

        let paused = "Song\n[paused]  #1/1   0:10/0:00 (0%)\nvolume: 80%\n";
        assert_eq!(parse_transport(paused), "paused");

        let stopped = "volume: 80%   repeat: off   random: off   single: off   consume: off\n";
        assert_eq!(parse_transport(stopped), "stopped");

        assert_eq!(parse_transport(""), "");
    }

    #[test]
    fn bracketed_stream_title_is_not_a_state() {
        let out = concat!(
            "[Nightride FM] Perturbator - Venger\n",
            "[playing] #1/1   0:42/0:00 (0%)\n",
            "volume: 60%\n",
        );
        assert_eq!(parse_transport(out), "playing");

        let stopped = "[Nightride FM] Perturbator - Venger\nvolume: 60%   repeat: off\n";
        assert_eq!(parse_transport(stopped), "stopped");
    }

    #[tokio::test]
    async fn missing_binary_degrades_to_empty_fields() {
        let mpc = MpcController::new(
            PathBuf::from("/nonexistent/rad10/mpc"),
            "127.0.0.1".into(),
            6600,
            Duration::from_secs(1),
        );

        assert!(matches!(
            mpc.toggle().await,
            Err(ControllerError::Spawn { .. })
        ));

        let snap = mpc.query_status().await;
        assert_eq!(snap.now_playing, "");
        assert_eq!(snap.volume, "");
        assert_eq!(snap.transport, "");
        assert!(snap.unavailable.unwrap().contains("cannot start"));
    }

    /// Drives a stand-in `mpc` shell script: argument passing, output
    /// scraping, non-zero exit and the timeout.  Kept as one test so only
    /// one test in this binary writes and executes scripts.
    #[cfg(unix)]
    #[tokio::test]
    async fn stand_in_mpc_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let script = dir.path().join("mpc");
        std::fs::write(
            &script,
            format!(
                r#"#!/bin/sh
echo "$@" >> {log}
case "$3" in
  current) echo "Triple J: Spacey Jane - Booster Seat" ;;
  volume) [ -z "$4" ] && echo "volume: 75%" ;;
  status) printf 'Triple J\n[paused]  #1/1   0:10/0:00 (0%%)\nvolume: 75%%\n' ;;
  play) echo "error: no such song" >&2; exit 1 ;;
  toggle) sleep 5 ;;
esac
exit 0
"#,
                log = log.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mpc = MpcController::new(
            script,
            "radio.local".into(),
            6601,
            Duration::from_millis(500),
        );

        let snap = mpc.query_status().await;
        assert_eq!(snap.now_playing, "Triple J: Spacey Jane - Booster Seat");
        assert_eq!(snap.volume, "75%");
        assert_eq!(snap.transport, "paused");
        assert!(snap.is_available());

        mpc.adjust_volume(-10).await.unwrap();
        mpc.adjust_volume(10).await.unwrap();
        mpc.enqueue("http://example.com/a b").await.unwrap();

        match mpc.play().await {
            Err(ControllerError::Exit { code, stderr, .. }) => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "error: no such song");
            }
            other => panic!("expected exit error, got {:?}", other),
        }

        assert!(matches!(
            mpc.toggle().await,
            Err(ControllerError::Timeout { .. })
        ));

        let calls = std::fs::read_to_string(&log).unwrap();
        let calls: Vec<_> = calls.lines().collect();
        assert_eq!(
            &calls[..7],
            [
                "--host=radio.local --port=6601 current",
                "--host=radio.local --port=6601 volume",
                "--host=radio.local --port=6601 status",
                "--host=radio.local --port=6601 volume -10",
                "--host=radio.local --port=6601 volume +10",
                "--host=radio.local --port=6601 add http://example.com/a b",
                "--host=radio.local --port=6601 play",
            ]
        );
    }
}
