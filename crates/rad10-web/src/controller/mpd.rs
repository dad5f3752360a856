//! Direct MPD adapter on the `mpd` client crate.
//!
//! Each operation opens its own connection, so a restarted MPD is picked up
//! on the next request without any reconnect bookkeeping.  The client is
//! blocking; calls run on tokio's blocking pool and the whole operation,
//! connect included, is bounded by the configured timeout.

use async_trait::async_trait;
use mpd::error::Error as MpdError;
use mpd::{Client, Song, State};
use rad10_proto::protocol::{StatusSnapshot, TransportStatus};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, warn};

use super::{Controller, ControllerError};

impl From<MpdError> for ControllerError {
    fn from(e: MpdError) -> Self {
        match e {
            MpdError::Io(e) => ControllerError::Io(e),
            MpdError::Server(e) => ControllerError::Ack(e.detail),
            other => ControllerError::Protocol(other.to_string()),
        }
    }
}

pub struct MpdController {
    address: String,
    timeout: Duration,
}

impl MpdController {
    pub fn new(address: String, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    /// Run `op` on a fresh connection, off the async runtime.
    async fn bounded<T, F>(&self, what: &str, op: F) -> Result<T, ControllerError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Client) -> Result<T, ControllerError> + Send + 'static,
    {
        let address = self.address.clone();
        let timeout = self.timeout;
        let task = tokio::task::spawn_blocking(move || {
            let mut client = connect(&address, timeout)?;
            op(&mut client)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ControllerError::Protocol(format!("mpd {} task: {}", what, e))),
            Err(_) => Err(ControllerError::Timeout {
                what: format!("mpd {}", what),
                after: self.timeout,
            }),
        }
    }
}

/// Blocking connect.  The socket deadlines are looser than the async bound
/// so that bound reports the timeout, while a stuck worker thread still
/// gets released.
fn connect(address: &str, timeout: Duration) -> Result<Client, ControllerError> {
    let socket_deadline = timeout.saturating_mul(2);
    let addr = address.to_socket_addrs()?.next().ok_or_else(|| {
        ControllerError::Protocol(format!("{} resolves to no address", address))
    })?;
    let stream = TcpStream::connect_timeout(&addr, socket_deadline)?;
    stream.set_read_timeout(Some(socket_deadline))?;
    stream.set_write_timeout(Some(socket_deadline))?;

    let client = Client::new(stream)?;
    debug!("mpd: connected to {}", address);
    Ok(client)
}

#[async_trait]
impl Controller for MpdController {
    fn name(&self) -> &'static str {
        "mpd"
    }

    async fn toggle(&self) -> Result<(), ControllerError> {
        self.bounded("toggle", |client| {
            // same rule as `mpc toggle`: only a playing player gets paused
            if client.status()?.state == State::Play {
                client.pause(true)?;
            } else {
                client.play()?;
            }
            Ok(())
        })
        .await
    }

    async fn adjust_volume(&self, delta: i32) -> Result<(), ControllerError> {
        self.bounded("volume", move |client| {
            let current = mixer_volume(client.status()?.volume).ok_or(ControllerError::NoMixer)?;
            let target = (current + delta).clamp(0, 100);
            debug!("mpd: volume {} -> {}", current, target);
            client.volume(target as i8)?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<(), ControllerError> {
        self.bounded("clear", |client| Ok(client.clear()?)).await
    }

    async fn enqueue(&self, url: &str) -> Result<(), ControllerError> {
        let song = Song {
            file: url.to_string(),
            ..Default::default()
        };
        self.bounded("add", move |client| {
            client.push(&song)?;
            Ok(())
        })
        .await
    }

    async fn play(&self) -> Result<(), ControllerError> {
        self.bounded("play", |client| Ok(client.play()?)).await
    }

    async fn query_status(&self) -> StatusSnapshot {
        let result = self
            .bounded("status", |client| {
                let song = client.currentsong()?;
                let status = client.status()?;
                Ok((song, status))
            })
            .await;

        let mut snapshot = StatusSnapshot::default();
        match result {
            Ok((song, status)) => {
                snapshot.now_playing = song.as_ref().map(format_current).unwrap_or_default();
                snapshot.transport = transport(status.state).label().to_string();
                snapshot.volume = match mixer_volume(status.volume) {
                    Some(v) => format!("{}%", v),
                    None => "n/a".to_string(),
                };
            }
            Err(e) => {
                warn!("mpd status query failed: {}", e);
                snapshot.mark_unavailable(e.to_string());
            }
        }
        snapshot
    }
}

fn transport(state: State) -> TransportStatus {
    match state {
        State::Play => TransportStatus::Playing,
        State::Pause => TransportStatus::Paused,
        State::Stop => TransportStatus::Stopped,
    }
}

/// MPD reports `-1` when there is no mixer.
fn mixer_volume(volume: i8) -> Option<i32> {
    (volume >= 0).then_some(i32::from(volume))
}

/// Now-playing line in mpc's default `current` format:
/// `[%name%: &[%artist% - ]%title%]|%name%|[%artist% - ]%title%|%file%`.
fn format_current(song: &Song) -> String {
    let artist_title = match (&song.artist, &song.title) {
        (Some(artist), Some(title)) => Some(format!("{} - {}", artist, title)),
        (None, Some(title)) => Some(title.clone()),
        _ => None,
    };

    match (&song.name, artist_title) {
        (Some(name), Some(at)) => format!("{}: {}", name, at),
        (Some(name), None) => name.clone(),
        (None, Some(at)) => at,
        (None, None) => song.file.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    fn song(name: Option<&str>, artist: Option<&str>, title: Option<&str>) -> Song {
        Song {
            file: "http://stream/".to_string(),
            name: name.map(str::to_string),
            artist: artist.map(str::to_string),
            title: title.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_current() {
        let full = song(Some("Triple J"), Some("Spacey Jane"), Some("Booster Seat"));
        assert_eq!(format_current(&full), "Triple J: Spacey Jane - Booster Seat");

        let icy = song(Some("Code Radio"), None, Some("lofi"));
        assert_eq!(format_current(&icy), "Code Radio: lofi");

        assert_eq!(format_current(&song(Some("Proton"), None, None)), "Proton");
        assert_eq!(format_current(&song(None, None, None)), "http://stream/");
    }

    #[test]
    fn test_mixer_volume() {
        assert_eq!(mixer_volume(80), Some(80));
        assert_eq!(mixer_volume(0), Some(0));
        assert_eq!(mixer_volume(-1), None);
    }

    /// Minimal MPD stand-in.  Records every command; replies from a fixed
    /// player state.
    async fn fake_mpd(
        state: &'static str,
        volume: &'static str,
    ) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_srv = log.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(s) => s,
                    Err(_) => return,
                };
                let log = log_srv.clone();
                tokio::spawn(async move {
                    let (r, mut w) = stream.into_split();
                    let mut lines = BufReader::new(r).lines();
                    w.write_all(b"OK MPD 0.23.5\n").await.unwrap();
                    while let Ok(Some(line)) = lines.next_line().await {
                        log.lock().unwrap().push(line.clone());
                        let reply = match line.as_str() {
                            "status" => format!(
                                "volume: {}\nrepeat: 0\nrandom: 0\nsingle: 0\nconsume: 0\n\
                                 playlist: 2\nplaylistlength: 1\nmixrampdb: 0.000000\n\
                                 state: {}\nOK\n",
                                volume, state
                            ),
                            "currentsong" if state != "stop" => {
                                "file: http://stream/\nName: Triple J\nTitle: Booster Seat\nOK\n"
                                    .to_string()
                            }
                            l if l.starts_with("addid ") && l.contains("missing") => {
                                "ACK [50@0] {addid} No such directory\n".to_string()
                            }
                            l if l.starts_with("addid ") => "Id: 7\nOK\n".to_string(),
                            _ => "OK\n".to_string(),
                        };
                        if w.write_all(reply.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        (address, log)
    }

    fn commands(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn status_snapshot_from_socket() {
        let (addr, log) = fake_mpd("play", "65").await;
        let mpd = MpdController::new(addr, Duration::from_secs(1));

        let snap = mpd.query_status().await;
        assert_eq!(snap.now_playing, "Triple J: Booster Seat");
        assert_eq!(snap.transport, "playing");
        assert_eq!(snap.volume, "65%");
        assert!(snap.is_available());
        assert_eq!(commands(&log), ["currentsong", "status"]);
    }

    #[tokio::test]
    async fn stopped_player_without_mixer() {
        let (addr, _log) = fake_mpd("stop", "-1").await;
        let mpd = MpdController::new(addr, Duration::from_secs(1));

        let snap = mpd.query_status().await;
        assert_eq!(snap.now_playing, "");
        assert_eq!(snap.transport, "stopped");
        assert_eq!(snap.volume, "n/a");

        assert!(matches!(
            mpd.adjust_volume(10).await,
            Err(ControllerError::NoMixer)
        ));
    }

    #[tokio::test]
    async fn toggle_pauses_only_when_playing() {
        let (addr, log) = fake_mpd("play", "50").await;
        MpdController::new(addr, Duration::from_secs(1))
            .toggle()
            .await
            .unwrap();
        assert_eq!(commands(&log), ["status", "pause 1"]);

        let (addr, log) = fake_mpd("pause", "50").await;
        MpdController::new(addr, Duration::from_secs(1))
            .toggle()
            .await
            .unwrap();
        assert_eq!(commands(&log), ["status", "play"]);
    }

    #[tokio::test]
    async fn volume_is_clamped() {
        let (addr, log) = fake_mpd("play", "95").await;
        let mpd = MpdController::new(addr, Duration::from_secs(1));
        mpd.adjust_volume(10).await.unwrap();
        assert_eq!(commands(&log), ["status", "setvol 100"]);

        let (addr, log) = fake_mpd("play", "5").await;
        let mpd = MpdController::new(addr, Duration::from_secs(1));
        mpd.adjust_volume(-10).await.unwrap();
        assert_eq!(commands(&log), ["status", "setvol 0"]);
    }

    #[tokio::test]
    async fn preset_steps_and_ack() {
        let (addr, log) = fake_mpd("stop", "50").await;
        let mpd = MpdController::new(addr, Duration::from_secs(1));

        mpd.clear().await.unwrap();
        mpd.enqueue("http://stream/aac/").await.unwrap();
        mpd.play().await.unwrap();
        match mpd.enqueue("http://missing/").await {
            Err(ControllerError::Ack(msg)) => assert_eq!(msg, "No such directory"),
            other => panic!("expected ack, got {:?}", other),
        }

        let sent = commands(&log);
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0], "clear");
        assert!(sent[1].starts_with("addid ") && sent[1].contains("http://stream/aac/"));
        assert_eq!(sent[2], "play");
        assert!(sent[3].contains("http://missing/"));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            // accept and hold the socket without greeting
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let mpd = MpdController::new(addr, Duration::from_millis(100));
        assert!(matches!(
            mpd.play().await,
            Err(ControllerError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn refused_connection_marks_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let snap = MpdController::new(addr, Duration::from_secs(1))
            .query_status()
            .await;
        assert_eq!(
            snap,
            StatusSnapshot {
                unavailable: snap.unavailable.clone(),
                ..StatusSnapshot::default()
            }
        );
        assert!(!snap.is_available());
    }
}
