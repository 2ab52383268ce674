//! Local Player - VLC/mpv playback support
//!
//! Hands a chosen link to a local media player.

use std::process::Stdio;
use std::str::FromStr;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::info;

/// Supported local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerType {
    /// VLC media player (default)
    #[default]
    Vlc,
    /// mpv media player
    Mpv,
}

impl PlayerType {
    /// Parse a player name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "vlc" => Some(PlayerType::Vlc),
            "mpv" => Some(PlayerType::Mpv),
            _ => None,
        }
    }

    /// Get the command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Vlc => {
                // On macOS, VLC is an app bundle - check for it
                #[cfg(target_os = "macos")]
                if std::path::Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Mpv => "mpv",
        }
    }

    /// Get a display name for this player
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "VLC",
            PlayerType::Mpv => "mpv",
        }
    }

    /// Command line arguments for playing `url` under `title`
    pub fn args(&self, url: &str, title: &str) -> Vec<String> {
        match self {
            PlayerType::Vlc => vec![
                url.to_string(),
                format!("--meta-title={}", title),
                "--no-video-title-show".to_string(),
            ],
            PlayerType::Mpv => vec![
                url.to_string(),
                format!("--force-media-title={}", title),
                "--force-window=immediate".to_string(),
            ],
        }
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PlayerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown player '{}' (expected vlc or mpv)", s))
    }
}

/// Errors from local player operations
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
    #[error("Not a playable URL: {0}")]
    InvalidUrl(String),
}

/// Local player for catalog links
pub struct LocalPlayer {
    player_type: PlayerType,
}

impl LocalPlayer {
    pub fn new(player_type: PlayerType) -> Self {
        Self { player_type }
    }

    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    /// Check if the player is available on the system
    pub async fn is_available(&self) -> bool {
        let cmd = self.player_type.command();

        // If it's a full path (macOS app bundle), check if it exists
        if cmd.starts_with('/') {
            return std::path::Path::new(cmd).exists();
        }

        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Start playing `url`, returning the spawned child process
    pub fn play(&self, url: &str, title: &str) -> Result<Child, PlayerError> {
        let url = url.trim();
        if url.is_empty() || url.chars().any(char::is_whitespace) {
            return Err(PlayerError::InvalidUrl(url.to_string()));
        }

        info!(player = %self.player_type, title, "starting player");

        let mut cmd = Command::new(self.player_type.command());
        cmd.args(self.player_type.args(url, title));

        // Player output would corrupt the terminal UI
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlayerError::NotFound(self.player_type.command().to_string())
            } else {
                PlayerError::StartFailed(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_type_command() {
        // On macOS with VLC installed, returns full path; otherwise "vlc"
        let vlc_cmd = PlayerType::Vlc.command();
        assert!(vlc_cmd == "vlc" || vlc_cmd == "/Applications/VLC.app/Contents/MacOS/VLC");
        assert_eq!(PlayerType::Mpv.command(), "mpv");
    }

    #[test]
    fn test_player_type_parse() {
        assert_eq!(PlayerType::from_name(" MPV "), Some(PlayerType::Mpv));
        assert_eq!("vlc".parse::<PlayerType>(), Ok(PlayerType::Vlc));
        assert!("winamp".parse::<PlayerType>().is_err());
        assert_eq!(PlayerType::default(), PlayerType::Vlc);
        assert_eq!(PlayerType::Vlc.to_string(), "VLC");
    }

    #[test]
    fn test_player_args_carry_title() {
        let args = PlayerType::Mpv.args("https://cdn.example.com/a.mp4", "Blade Runner");
        assert_eq!(args[0], "https://cdn.example.com/a.mp4");
        assert!(args.contains(&"--force-media-title=Blade Runner".to_string()));

        let args = PlayerType::Vlc.args("https://cdn.example.com/a.mp4", "Blade Runner");
        assert!(args.contains(&"--meta-title=Blade Runner".to_string()));
    }

    #[tokio::test]
    async fn test_play_rejects_blank_url() {
        let player = LocalPlayer::new(PlayerType::Mpv);
        assert!(matches!(player.play("  ", "x"), Err(PlayerError::InvalidUrl(_))));
        assert!(matches!(
            player.play("http://a b", "x"),
            Err(PlayerError::InvalidUrl(_))
        ));
    }
}
