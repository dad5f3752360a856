use std::path::PathBuf;

/// Where Debian/Raspbian packages install mpc.
pub const DEFAULT_MPC_PATH: &str = "/usr/bin/mpc";

pub fn data_dir() -> PathBuf {
    // Use ~/.local/share/rad10/ (XDG standard) on every unix
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("rad10")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rad10")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("rad10")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rad10")
    }
}

#[cfg(unix)]
pub fn mpc_binary_name() -> &'static str {
    "mpc"
}

#[cfg(windows)]
pub fn mpc_binary_name() -> &'static str {
    "mpc.exe"
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var("PATH").ok()?;
    #[cfg(unix)]
    let sep = ":";
    #[cfg(windows)]
    let sep = ";";
    path.split(sep)
        .map(|dir| PathBuf::from(dir).join(name))
        .find(|p| p.exists())
}

/// Find the mpc binary.
///
/// An explicitly configured path always wins, even when it does not exist
/// (the failure then shows up as a spawn error on the first request rather
/// than silently running some other mpc).  Otherwise PATH is searched, and
/// finally the distro location is assumed.
pub fn find_mpc_binary(configured: Option<&PathBuf>) -> PathBuf {
    if let Some(p) = configured {
        return p.clone();
    }
    if let Some(p) = find_on_path(mpc_binary_name()) {
        return p;
    }
    PathBuf::from(DEFAULT_MPC_PATH)
}
