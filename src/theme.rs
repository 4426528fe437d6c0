//! Terminal theme detection
//!
//! Sources are checked in order: the `CTXDIFF_THEME` override, an OSC 11
//! query of the terminal background, then `COLORFGBG`. Dark is the fallback.

use std::io::{IsTerminal, Read, Write};
use std::time::Duration;

/// Theme mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    /// Detect theme mode from the terminal environment
    pub fn detect() -> Self {
        if let Some(theme) = std::env::var("CTXDIFF_THEME").ok().and_then(|v| Self::from_name(&v)) {
            log::debug!("theme from CTXDIFF_THEME: {:?}", theme);
            return theme;
        }

        if let Some(theme) = Self::query_terminal_background() {
            log::debug!("theme from terminal background: {:?}", theme);
            return theme;
        }

        std::env::var("COLORFGBG")
            .ok()
            .and_then(|v| Self::from_colorfgbg(&v))
            .unwrap_or_default()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// `COLORFGBG` is "fg;bg" (sometimes "fg;default;bg"). ANSI background
    /// 7 and 9+ are light.
    fn from_colorfgbg(value: &str) -> Option<Self> {
        let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        Some(if bg == 7 || bg > 8 { Self::Light } else { Self::Dark })
    }

    /// ITU-R BT.709 relative luminance, split at half brightness
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let luminance = 0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b);
        if luminance > 128.0 {
            Self::Light
        } else {
            Self::Dark
        }
    }

    #[cfg(unix)]
    fn query_terminal_background() -> Option<Self> {
        use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, LocalFlags, SetArg};

        let stdin = std::io::stdin();
        if !stdin.is_terminal() || !std::io::stdout().is_terminal() {
            return None;
        }

        let original = tcgetattr(&stdin).ok()?;
        let mut raw = original.clone();
        cfmakeraw(&mut raw);
        raw.local_flags.insert(LocalFlags::ISIG);
        tcsetattr(&stdin, SetArg::TCSANOW, &raw).ok()?;

        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x1b]11;?\x07");
        let _ = stdout.flush();

        let response = read_osc_response(&stdin, Duration::from_millis(200));

        let _ = tcsetattr(&stdin, SetArg::TCSANOW, &original);

        Self::parse_osc11_response(&response)
    }

    #[cfg(not(unix))]
    fn query_terminal_background() -> Option<Self> {
        None
    }

    /// Parse `ESC ] 11 ; rgb:RRRR/GGGG/BBBB` terminated by BEL or ST
    fn parse_osc11_response(response: &str) -> Option<Self> {
        let start = response.find("rgb:")? + 4;
        let rgb = &response[start..];
        let rgb = &rgb[..rgb.find(['\x07', '\x1b']).unwrap_or(rgb.len())];

        let mut parts = rgb.split('/').map(parse_component);
        let (r, g, b) = (parts.next()??, parts.next()??, parts.next()??);
        if parts.next().is_some() {
            return None;
        }
        Some(Self::from_rgb(r, g, b))
    }
}

/// One colour component, 1 to 4 hex digits, scaled to 8 bits
fn parse_component(hex: &str) -> Option<u8> {
    if hex.is_empty() || hex.len() > 4 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    let max = (1u32 << (4 * hex.len())) - 1;
    Some((value * 255 / max) as u8)
}

#[cfg(unix)]
fn read_osc_response(stdin: &std::io::Stdin, timeout: Duration) -> String {
    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
    use std::os::fd::AsFd;

    let mut response = Vec::new();
    let mut buf = [0u8; 1];
    let deadline = std::time::Instant::now() + timeout;
    let mut poll_fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];

    while std::time::Instant::now() < deadline {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        let timeout_ms = remaining.as_millis().min(u128::from(u16::MAX)) as u16;

        if poll(&mut poll_fds, PollTimeout::from(timeout_ms)).unwrap_or(0) == 0 {
            break;
        }
        if std::io::stdin().read(&mut buf).unwrap_or(0) != 1 {
            break;
        }
        response.push(buf[0]);
        if buf[0] == 0x07 || response.ends_with(b"\x1b\\") {
            break;
        }
    }

    String::from_utf8_lossy(&response).into_owned()
}
