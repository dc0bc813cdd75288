//! Foundry toolchain discovery

use std::path::{Path, PathBuf};

use crate::command::CommandLine;
use crate::config::Config;

/// The three Foundry executables this server drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binary {
    Forge,
    Cast,
    Anvil,
}

impl Binary {
    pub const ALL: [Binary; 3] = [Binary::Forge, Binary::Cast, Binary::Anvil];

    pub fn name(self) -> &'static str {
        match self {
            Binary::Forge => "forge",
            Binary::Cast => "cast",
            Binary::Anvil => "anvil",
        }
    }

    fn file_name(self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.name())
        } else {
            self.name().to_string()
        }
    }
}

/// Resolved locations of forge, cast and anvil.
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
    forge: Option<PathBuf>,
    cast: Option<PathBuf>,
    anvil: Option<PathBuf>,
}

impl Toolchain {
    /// Locate the binaries: the configured directory if any, otherwise the usual
    /// install directories, otherwise `PATH`.
    pub fn detect(config: &Config) -> Self {
        if let Some(dir) = &config.foundry_bin {
            return Self::from_dir(dir);
        }

        Self::search(&Self::common_dirs(), |name| which::which(name).ok())
    }

    /// First directory holding all three binaries; otherwise each binary is taken from
    /// the first directory that has it, then from `lookup`.
    fn search<F>(dirs: &[PathBuf], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let found: Vec<Self> = dirs.iter().map(|dir| Self::from_dir(dir)).collect();
        if let Some(complete) = found.iter().find(|t| t.is_available()) {
            return complete.clone();
        }

        let mut toolchain = Self::default();
        for binary in Binary::ALL {
            let path = found
                .iter()
                .find_map(|t| t.path(binary).map(Path::to_path_buf))
                .or_else(|| lookup(binary.name()));
            toolchain.set(binary, path);
        }
        toolchain
    }

    /// Look for the binaries in a single directory.
    pub fn from_dir(dir: &Path) -> Self {
        let mut toolchain = Self::default();
        for binary in Binary::ALL {
            let candidate = dir.join(binary.file_name());
            toolchain.set(binary, candidate.is_file().then_some(candidate));
        }
        toolchain
    }

    fn common_dirs() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".foundry").join("bin"));
        }
        candidates.push(PathBuf::from("/usr/local/bin"));
        candidates.push(PathBuf::from("/opt/homebrew/bin"));
        candidates
    }

    fn set(&mut self, binary: Binary, path: Option<PathBuf>) {
        match binary {
            Binary::Forge => self.forge = path,
            Binary::Cast => self.cast = path,
            Binary::Anvil => self.anvil = path,
        }
    }

    pub fn path(&self, binary: Binary) -> Option<&Path> {
        match binary {
            Binary::Forge => self.forge.as_deref(),
            Binary::Cast => self.cast.as_deref(),
            Binary::Anvil => self.anvil.as_deref(),
        }
    }

    /// All three binaries were found.
    pub fn is_available(&self) -> bool {
        Binary::ALL.iter().all(|b| self.path(*b).is_some())
    }

    /// Directory the forge binary lives in, for startup logging.
    pub fn bin_dir(&self) -> Option<&Path> {
        self.forge.as_deref().and_then(Path::parent)
    }

    /// Start a command line for `binary`, using its resolved path when known.
    pub fn command(&self, binary: Binary) -> CommandLine {
        match self.path(binary) {
            Some(path) => CommandLine::new(path.to_string_lossy()),
            None => CommandLine::new(binary.name()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A directory holding empty stand-ins for forge, cast and anvil.
    pub(crate) fn fake_install() -> (tempfile::TempDir, Toolchain) {
        let dir = tempfile::tempdir().unwrap();
        for binary in Binary::ALL {
            std::fs::write(dir.path().join(binary.file_name()), b"").unwrap();
        }
        let toolchain = Toolchain::from_dir(dir.path());
        (dir, toolchain)
    }

    #[test]
    fn test_from_dir_finds_all_binaries() {
        let (dir, toolchain) = fake_install();
        assert!(toolchain.is_available());
        assert_eq!(toolchain.bin_dir(), Some(dir.path()));
        assert_eq!(
            toolchain.path(Binary::Cast),
            Some(dir.path().join(Binary::Cast.file_name()).as_path())
        );
    }

    #[test]
    fn test_missing_binary_makes_toolchain_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(Binary::Forge.file_name()), b"").unwrap();
        std::fs::write(dir.path().join(Binary::Cast.file_name()), b"").unwrap();

        let toolchain = Toolchain::from_dir(dir.path());
        assert!(!toolchain.is_available());
        assert!(toolchain.path(Binary::Anvil).is_none());
    }

    #[test]
    fn test_configured_dir_takes_priority() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            foundry_bin: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let toolchain = Toolchain::detect(&config);
        assert!(!toolchain.is_available());
    }

    #[test]
    fn test_split_install_prefers_complete_directory() {
        let stray = tempfile::tempdir().unwrap();
        std::fs::write(stray.path().join(Binary::Forge.file_name()), b"").unwrap();
        let (full, _) = fake_install();

        let dirs = [stray.path().to_path_buf(), full.path().to_path_buf()];
        let toolchain = Toolchain::search(&dirs, |_| None);

        assert!(toolchain.is_available());
        assert_eq!(toolchain.bin_dir(), Some(full.path()));
    }

    #[test]
    fn test_missing_binaries_fall_back_to_lookup() {
        let stray = tempfile::tempdir().unwrap();
        std::fs::write(stray.path().join(Binary::Forge.file_name()), b"").unwrap();

        let dirs = [stray.path().to_path_buf()];
        let toolchain = Toolchain::search(&dirs, |name| {
            Some(PathBuf::from("/on/path").join(name))
        });

        assert!(toolchain.is_available());
        assert_eq!(toolchain.bin_dir(), Some(stray.path()));
        assert_eq!(
            toolchain.path(Binary::Anvil),
            Some(Path::new("/on/path/anvil"))
        );
    }

    #[test]
    fn test_command_uses_resolved_path() {
        let (dir, toolchain) = fake_install();
        let cmd = toolchain.command(Binary::Forge);
        assert_eq!(
            PathBuf::from(&cmd.program),
            dir.path().join(Binary::Forge.file_name())
        );
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_command_without_path_uses_bare_name() {
        let toolchain = Toolchain::default();
        assert_eq!(toolchain.command(Binary::Anvil).program, "anvil");
    }
}
