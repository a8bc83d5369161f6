use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tickboy_core::Model;

// Cartridge header byte announcing CGB support.
const CGB_FLAG_ADDR: usize = 0x0143;
const CGB_FLAG: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmulationMode {
    #[default]
    Auto,
    ForceDmg,
    ForceCgb,
}

impl EmulationMode {
    /// Picks the model, looking at the cartridge header in `Auto` mode.
    pub fn model_for(self, rom: &[u8]) -> Model {
        match self {
            Self::ForceDmg => Model::Dmg,
            Self::ForceCgb => Model::Cgb,
            Self::Auto => {
                if rom.get(CGB_FLAG_ADDR).is_some_and(|b| b & CGB_FLAG != 0) {
                    Model::Cgb
                } else {
                    Model::Dmg
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    pub dmg_bootrom_path: Option<PathBuf>,
    pub cgb_bootrom_path: Option<PathBuf>,
    pub emulation_mode: EmulationMode,
    /// Frames to run when `--frames` is not given; unlimited if unset.
    pub frames: Option<u64>,
    pub dump_frame_path: Option<PathBuf>,
}

impl RunConfig {
    pub fn bootrom_path(&self, model: Model) -> Option<&Path> {
        match model {
            Model::Dmg => self.dmg_bootrom_path.as_deref(),
            Model::Cgb => self.cgb_bootrom_path.as_deref(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("tickboy").join("tickboy.toml");
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("tickboy").join("tickboy.toml");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("tickboy")
            .join("tickboy.toml");
    }

    PathBuf::from("tickboy.toml")
}

pub fn load_from_file(path: &Path) -> RunConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return RunConfig::default(),
    };

    match toml::from_str::<RunConfig>(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Failed to parse config {}: {e}; using defaults",
                path.display()
            );
            RunConfig::default()
        }
    }
}

pub fn save_to_file(path: &Path, cfg: &RunConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let text = toml::to_string_pretty(cfg).unwrap_or_else(|_| String::new());
    std::fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_mode_reads_header() {
        let mut rom = vec![0u8; 0x150];
        assert_eq!(EmulationMode::Auto.model_for(&rom), Model::Dmg);
        rom[CGB_FLAG_ADDR] = 0xC0;
        assert_eq!(EmulationMode::Auto.model_for(&rom), Model::Cgb);
        assert_eq!(EmulationMode::ForceDmg.model_for(&rom), Model::Dmg);
        assert_eq!(EmulationMode::ForceCgb.model_for(&[]), Model::Cgb);
        assert_eq!(EmulationMode::Auto.model_for(&[]), Model::Dmg);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tickboy.toml");
        let cfg = RunConfig {
            dmg_bootrom_path: Some(PathBuf::from("/roms/dmg_boot.bin")),
            cgb_bootrom_path: None,
            emulation_mode: EmulationMode::ForceCgb,
            frames: Some(120),
            ..RunConfig::default()
        };
        save_to_file(&path, &cfg).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("emulation_mode = \"force-cgb\""));

        let loaded = load_from_file(&path);
        assert_eq!(loaded.emulation_mode, EmulationMode::ForceCgb);
        assert_eq!(
            loaded.bootrom_path(Model::Dmg),
            Some(Path::new("/roms/dmg_boot.bin"))
        );
        assert_eq!(loaded.bootrom_path(Model::Cgb), None);
        assert_eq!(loaded.frames, Some(120));
        assert!(loaded.dump_frame_path.is_none());
    }

    #[test]
    fn bad_or_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_from_file(&dir.path().join("missing.toml"));
        assert_eq!(missing.emulation_mode, EmulationMode::Auto);

        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "emulation_mode = 3").unwrap();
        assert_eq!(load_from_file(&path).emulation_mode, EmulationMode::Auto);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: RunConfig = toml::from_str("emulation_mode = \"force-dmg\"").unwrap();
        assert_eq!(cfg.emulation_mode, EmulationMode::ForceDmg);
        assert!(cfg.dmg_bootrom_path.is_none());
    }
}
