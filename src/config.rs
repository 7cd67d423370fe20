/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD), unless an
/// explicit path is given. Every section and key is optional and falls back
/// to the stock gameplay values.
///
/// ```toml
/// [general]
/// level_path = "levels/demo.mapdata"
/// seed = 7
///
/// [stalker]
/// sight_distance = 200
///
/// [upgrades.throw_velocity]
/// base = 12
/// step = 2
/// max = 20
/// ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub general: GeneralConfig,
    pub map: MapConfig,
    pub lighting: LightingConfig,
    pub player: PlayerConfig,
    pub stalker: AgentConfig,
    pub wanderer: AgentConfig,
    pub potion: PotionConfig,
    pub hazard: HazardConfig,
    pub upgrades: UpgradeConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Level file to load; the embedded level is used when unset.
    pub level_path: Option<PathBuf>,
    pub seed: u64,
    /// Tick budget for the headless driver.
    pub ticks: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// World units per collision tile.
    pub tile_size: i32,
    /// Half-width of the square neighbourhood scanned when an agent picks a
    /// wander tile (2 → 5×5).
    pub neighborhood_range: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// World units per shadow cell.
    pub cell_size: i32,
    /// Radius a shrinking light collapses towards.
    pub shrink_floor_radius: i32,
    pub burst_brightness: i32,
    pub burst_radius: i32,
    pub burst_lifespan: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub width: i32,
    pub height: i32,
    pub health: i32,
    pub speed: i32,
    pub attack_delay: u32,
    pub brightness: i32,
    pub light_radius: i32,
}

/// Tuning shared by both agent kinds. Each kind has its own defaults.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub width: i32,
    pub height: i32,
    pub health: i32,
    pub retarget_ticks: u32,
    pub sight_distance: i32,
    pub arrival_radius: i32,
    pub contact_damage: i32,
    pub contact_damage_ticks: u32,
    /// Agents of this kind stay dormant until the player enters their room.
    pub room_gated: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PotionConfig {
    pub size: i32,
    pub brightness: i32,
    pub light_radius: i32,
    pub velocity_decay: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub brightness: i32,
    pub damage: i32,
    pub damage_ticks: u32,
    pub wear_out_ticks: u32,
    /// Energy is divided by this when the potion burst on an enemy.
    pub enemy_hit_divisor: i32,
    pub particle_ticks: u32,
    pub particle_lifespan: u32,
    pub particle_speed: f32,
}

/// `base` is the value a run starts with, each pickup adds `step`, `max` caps it.
/// A table given in `config.toml` must carry all three keys.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct ModifierConfig {
    pub base: i32,
    pub step: i32,
    pub max: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    pub size: i32,
    pub particle_count: u32,
    pub direct_damage: ModifierConfig,
    pub throw_velocity: ModifierConfig,
    pub hazard_light_radius: ModifierConfig,
    pub hazard_energy: ModifierConfig,
}

// ── TOML Schema ──

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TomlConfig {
    general: GeneralConfig,
    map: MapConfig,
    lighting: LightingConfig,
    player: PlayerConfig,
    stalker: TomlAgent,
    wanderer: TomlAgent,
    potion: PotionConfig,
    hazard: HazardConfig,
    upgrades: UpgradeConfig,
}

/// Agent sections are merged key-by-key onto the kind's own defaults.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TomlAgent {
    width: Option<i32>,
    height: Option<i32>,
    health: Option<i32>,
    retarget_ticks: Option<u32>,
    sight_distance: Option<i32>,
    arrival_radius: Option<i32>,
    contact_damage: Option<i32>,
    contact_damage_ticks: Option<u32>,
    room_gated: Option<bool>,
}

impl TomlAgent {
    fn apply(self, base: AgentConfig) -> AgentConfig {
        AgentConfig {
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            health: self.health.unwrap_or(base.health),
            retarget_ticks: self.retarget_ticks.unwrap_or(base.retarget_ticks),
            sight_distance: self.sight_distance.unwrap_or(base.sight_distance),
            arrival_radius: self.arrival_radius.unwrap_or(base.arrival_radius),
            contact_damage: self.contact_damage.unwrap_or(base.contact_damage),
            contact_damage_ticks: self.contact_damage_ticks.unwrap_or(base.contact_damage_ticks),
            room_gated: self.room_gated.unwrap_or(base.room_gated),
        }
    }
}

// ── Defaults ──

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig { level_path: None, seed: 0x5EED, ticks: 3600 }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig { tile_size: 128, neighborhood_range: 2 }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        LightingConfig {
            cell_size: 16,
            shrink_floor_radius: 16,
            burst_brightness: 255,
            burst_radius: 160,
            burst_lifespan: 30,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            width: 50,
            height: 50,
            health: 100,
            speed: 3,
            attack_delay: 45,
            brightness: 255,
            light_radius: 64,
        }
    }
}

impl AgentConfig {
    pub fn stalker() -> Self {
        AgentConfig {
            width: 32,
            height: 32,
            health: 100,
            retarget_ticks: 10,
            sight_distance: 150,
            arrival_radius: 16,
            contact_damage: 1,
            contact_damage_ticks: 2,
            room_gated: true,
        }
    }

    pub fn wanderer() -> Self {
        AgentConfig {
            width: 50,
            height: 50,
            health: 100,
            retarget_ticks: 60,
            sight_distance: 128,
            arrival_radius: 16,
            contact_damage: 1,
            contact_damage_ticks: 30,
            room_gated: false,
        }
    }
}

impl Default for PotionConfig {
    fn default() -> Self {
        PotionConfig { size: 15, brightness: 255, light_radius: 48, velocity_decay: 1.0 }
    }
}

impl Default for HazardConfig {
    fn default() -> Self {
        HazardConfig {
            brightness: 300,
            damage: 1,
            damage_ticks: 6,
            wear_out_ticks: 18,
            enemy_hit_divisor: 5,
            particle_ticks: 5,
            particle_lifespan: 20,
            particle_speed: 0.1,
        }
    }
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        UpgradeConfig {
            size: 25,
            particle_count: 50,
            direct_damage: ModifierConfig { base: 10, step: 10, max: 50 },
            throw_velocity: ModifierConfig { base: 12, step: 2, max: 18 },
            hazard_light_radius: ModifierConfig { base: 80, step: 16, max: 128 },
            hazard_energy: ModifierConfig { base: 100, step: 50, max: 200 },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::stock()
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(toml_cfg: TomlConfig) -> Self {
        GameConfig {
            general: toml_cfg.general,
            map: toml_cfg.map,
            lighting: toml_cfg.lighting,
            player: toml_cfg.player,
            stalker: toml_cfg.stalker.apply(AgentConfig::stalker()),
            wanderer: toml_cfg.wanderer.apply(AgentConfig::wanderer()),
            potion: toml_cfg.potion,
            hazard: toml_cfg.hazard,
            upgrades: toml_cfg.upgrades,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Defaults with the kind-specific agent tuning filled in.
    pub fn stock() -> Self {
        GameConfig::from(TomlConfig::default())
    }

    /// Parse a config document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from)
    }

    /// Load config from `explicit`, or search for `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// The first file that parses wins. A malformed file stops the search and
    /// gives defaults; an unreadable one is skipped.
    pub fn load(explicit: Option<&Path>) -> Self {
        match explicit {
            Some(path) => match read_config(path) {
                ConfigFile::Loaded(cfg) => cfg,
                ConfigFile::Unreadable | ConfigFile::Malformed => GameConfig::stock(),
            },
            None => search_dirs(&candidate_dirs()),
        }
    }
}

enum ConfigFile {
    Loaded(GameConfig),
    Unreadable,
    Malformed,
}

fn search_dirs(dirs: &[PathBuf]) -> GameConfig {
    for dir in dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match read_config(&path) {
            ConfigFile::Loaded(cfg) => return cfg,
            ConfigFile::Malformed => return GameConfig::stock(),
            ConfigFile::Unreadable => {}
        }
    }
    tracing::debug!("no config.toml found, using defaults");
    GameConfig::stock()
}

fn read_config(path: &Path) -> ConfigFile {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("could not read {}: {e}", path.display());
            return ConfigFile::Unreadable;
        }
    };
    match GameConfig::from_toml_str(&text) {
        Ok(cfg) => {
            tracing::info!("loaded config from {}", path.display());
            ConfigFile::Loaded(cfg)
        }
        Err(e) => {
            tracing::warn!("{} parse error: {e}; using default settings", path.display());
            ConfigFile::Malformed
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
