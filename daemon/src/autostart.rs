//! Launch-at-login through an XDG autostart entry

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const ENTRY_NAME: &str = "memalert.desktop";

pub struct Autostart {
    dir: PathBuf,
    exec: PathBuf,
}

impl Autostart {
    pub fn new(dir: PathBuf, exec: PathBuf) -> Self {
        Self { dir, exec }
    }

    /// `~/.config/autostart` and the running executable.
    pub fn for_current_user() -> io::Result<Self> {
        let dir = directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("autostart"))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
        Ok(Self::new(dir, std::env::current_exe()?))
    }

    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(ENTRY_NAME)
    }

    pub fn is_enabled(&self) -> bool {
        self.entry_path().exists()
    }

    pub fn set_enabled(&self, enabled: bool) -> io::Result<()> {
        if enabled {
            self.install()
        } else {
            self.uninstall()
        }
    }

    fn install(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(), desktop_entry(&self.exec))
    }

    fn uninstall(&self) -> io::Result<()> {
        match fs::remove_file(self.entry_path()) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

fn desktop_entry(exec: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=MemAlert\n\
         Comment=Alert when applications use too much memory\n\
         Exec={}\n\
         X-GNOME-Autostart-enabled=true\n\
         NoDisplay=true\n",
        exec.display()
    )
}
