/// Level loader for the `.mapdata` text format.
///
/// ## Format
///   ```text
///   # comment
///   :DIMENSIONS
///   16,10
///   :TILE_DATA
///   1111111111111111
///   1000000010000001
///   ...
///   :PLAYER_SPAWN
///   2,2
///   :ROOMS
///   9,1,14,4
///   :ENEMIES
///   e_stalker,12,2,0
///   e_wanderer,5,7,
///   :UPGRADES
///   u_direct_damage,6,1,0,0
///   ```
///
/// Blank lines and lines starting with `#` are skipped. A line starting with
/// `:` opens a section; the lines after it are its values.
///
/// ## Sections
///   `DIMENSIONS`   `W,H` (required, one line)
///   `TILE_DATA`    H rows of W `0`/`1` characters (required)
///   `PLAYER_SPAWN` `X,Y` (required, one line)
///   `ROOMS`        `X1,Y1,X2,Y2` per line (optional)
///   `ENEMIES`      `KEY,X,Y,ROOM` per line, ROOM empty or -1 = unbound (optional)
///   `UPGRADES`     `KEY,X,Y,OFFSET_X,OFFSET_Y` per line (optional)
///
/// An optional section that is present must have at least one line.
/// Everything is validated here; a level that parses can always be built.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::ai::EnemyKind;
use crate::domain::geometry::TileKey;
use crate::domain::tile::RoomRect;
use crate::domain::upgrade::UpgradeKind;
use crate::error::{LevelError, Result};

const EMBEDDED_LEVEL: &str = include_str!("../../levels/demo.mapdata");

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub tile: TileKey,
    pub room: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UpgradeSpawn {
    pub kind: UpgradeKind,
    pub tile: TileKey,
    /// Pixel offset from the tile centre.
    pub offset: (i32, i32),
}

/// A parsed level, ready to build a world from.
#[derive(Clone, Debug)]
pub struct LevelData {
    pub width: usize,
    pub height: usize,
    /// Row-major occupancy, 1 = solid.
    pub tiles: Vec<Vec<u8>>,
    pub rooms: Vec<RoomRect>,
    pub player_spawn: TileKey,
    pub enemies: Vec<EnemySpawn>,
    pub upgrades: Vec<UpgradeSpawn>,
}

impl LevelData {
    /// Cross-checks that need the whole level: spawn tiles inside the grid
    /// and room references that exist.
    pub fn validate(&self) -> Result<()> {
        self.check_in_bounds("player spawn", self.player_spawn)?;
        for (i, enemy) in self.enemies.iter().enumerate() {
            let what = format!("enemy #{i} ({})", enemy.kind.key());
            self.check_in_bounds(&what, enemy.tile)?;
            if let Some(room) = enemy.room {
                if room >= self.rooms.len() {
                    return Err(LevelError::UnknownRoom { what, room, count: self.rooms.len() });
                }
            }
        }
        for (i, upgrade) in self.upgrades.iter().enumerate() {
            self.check_in_bounds(&format!("upgrade #{i} ({})", upgrade.kind.key()), upgrade.tile)?;
        }
        Ok(())
    }

    fn check_in_bounds(&self, what: &str, (x, y): TileKey) -> Result<()> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Err(LevelError::OutOfBounds {
                what: what.to_string(),
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Read and parse a `.mapdata` file.
pub fn load_level_file(path: &Path) -> Result<LevelData> {
    if path.extension().and_then(|e| e.to_str()) != Some("mapdata") {
        return Err(LevelError::BadExtension(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    let level = parse_mapdata(&text)?;
    tracing::info!(
        path = %path.display(),
        width = level.width,
        height = level.height,
        enemies = level.enemies.len(),
        upgrades = level.upgrades.len(),
        "loaded level"
    );
    Ok(level)
}

/// The level compiled into the binary, used when no file is given.
pub fn embedded_level() -> Result<LevelData> {
    parse_mapdata(EMBEDDED_LEVEL)
}

pub fn parse_mapdata(text: &str) -> Result<LevelData> {
    let sections = read_sections(text)?;

    let (width, height) = parse_dimensions(single_line(&sections, "DIMENSIONS")?)?;
    let tiles = parse_tiles(required(&sections, "TILE_DATA")?, width, height)?;

    let spawn_line = single_line(&sections, "PLAYER_SPAWN")?;
    let player_spawn = parse_pair(spawn_line).ok_or_else(|| bad_record("player spawn", spawn_line))?;

    let rooms = optional(&sections, "ROOMS")?
        .iter()
        .map(|line| parse_room(line))
        .collect::<Result<Vec<_>>>()?;
    let enemies = optional(&sections, "ENEMIES")?
        .iter()
        .map(|line| parse_enemy(line))
        .collect::<Result<Vec<_>>>()?;
    let upgrades = optional(&sections, "UPGRADES")?
        .iter()
        .map(|line| parse_upgrade(line))
        .collect::<Result<Vec<_>>>()?;

    let level = LevelData { width, height, tiles, rooms, player_spawn, enemies, upgrades };
    level.validate()?;
    Ok(level)
}

// ══════════════════════════════════════════════════════════════
// Sections
// ══════════════════════════════════════════════════════════════

fn data_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn read_sections(text: &str) -> Result<HashMap<String, Vec<String>>> {
    let mut sections: HashMap<String, Vec<String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in data_lines(text) {
        if let Some(key) = line.strip_prefix(':') {
            let key = key.trim();
            if key.is_empty() {
                return Err(LevelError::EmptyKey);
            }
            if sections.contains_key(key) {
                return Err(LevelError::DuplicateKey(key.to_string()));
            }
            sections.insert(key.to_string(), vec![]);
            current = Some(key.to_string());
            continue;
        }
        match current.as_ref().and_then(|key| sections.get_mut(key)) {
            Some(values) => values.push(line.to_string()),
            None => return Err(LevelError::DataBeforeKey(line.to_string())),
        }
    }

    Ok(sections)
}

fn required<'a>(sections: &'a HashMap<String, Vec<String>>, key: &'static str) -> Result<&'a [String]> {
    sections.get(key).map(Vec::as_slice).ok_or(LevelError::MissingKey(key))
}

/// Absent ⇒ empty. Present with no lines ⇒ error.
fn optional<'a>(sections: &'a HashMap<String, Vec<String>>, key: &'static str) -> Result<&'a [String]> {
    match sections.get(key) {
        None => Ok(&[]),
        Some(values) if values.is_empty() => Err(LevelError::EmptySection(key.to_string())),
        Some(values) => Ok(values.as_slice()),
    }
}

fn single_line<'a>(sections: &'a HashMap<String, Vec<String>>, key: &'static str) -> Result<&'a str> {
    match required(sections, key)? {
        [] => Err(LevelError::EmptySection(key.to_string())),
        [line] => Ok(line.as_str()),
        lines => Err(LevelError::ExpectedSingleLine { key, found: lines.len() }),
    }
}

// ══════════════════════════════════════════════════════════════
// Records
// ══════════════════════════════════════════════════════════════

fn bad_record(what: &'static str, line: &str) -> LevelError {
    LevelError::BadRecord { what, line: line.to_string() }
}

fn parse_ints(fields: &[&str]) -> Option<Vec<i32>> {
    fields.iter().map(|f| f.trim().parse().ok()).collect()
}

fn parse_pair(line: &str) -> Option<(i32, i32)> {
    match parse_ints(&line.split(',').collect::<Vec<_>>())?.as_slice() {
        [x, y] => Some((*x, *y)),
        _ => None,
    }
}

fn parse_dimensions(line: &str) -> Result<(usize, usize)> {
    match parse_pair(line) {
        Some((w, h)) if w > 0 && h > 0 => Ok((w as usize, h as usize)),
        _ => Err(LevelError::BadDimensions(line.to_string())),
    }
}

fn parse_tiles(rows: &[String], width: usize, height: usize) -> Result<Vec<Vec<u8>>> {
    if rows.len() != height {
        return Err(LevelError::RowCountMismatch { expected: height, found: rows.len() });
    }
    rows.iter()
        .enumerate()
        .map(|(row, line)| {
            let found = line.chars().count();
            if found != width {
                return Err(LevelError::ColumnCountMismatch { row, expected: width, found });
            }
            line.chars()
                .enumerate()
                .map(|(column, c)| match c {
                    '0' => Ok(0),
                    '1' => Ok(1),
                    found => Err(LevelError::BadTile { row, column, found }),
                })
                .collect::<Result<Vec<u8>>>()
        })
        .collect()
}

fn parse_room(line: &str) -> Result<RoomRect> {
    let fields: Vec<&str> = line.split(',').collect();
    match parse_ints(&fields).as_deref() {
        Some([x1, y1, x2, y2]) => Ok(RoomRect { a: (*x1, *y1), b: (*x2, *y2) }),
        _ => Err(bad_record("room", line)),
    }
}

fn parse_enemy(line: &str) -> Result<EnemySpawn> {
    let fields: Vec<&str> = line.split(',').collect();
    let [key, x, y, room] = fields[..] else {
        return Err(bad_record("enemy", line));
    };
    let tile = parse_ints(&[x, y])
        .map(|v| (v[0], v[1]))
        .ok_or_else(|| bad_record("enemy", line))?;
    let room = match room.trim() {
        "" | "-1" => None,
        id => Some(id.parse::<usize>().map_err(|_| bad_record("enemy", line))?),
    };
    let kind = EnemyKind::from_key(key.trim()).ok_or_else(|| LevelError::UnknownEnemy(key.trim().to_string()))?;
    Ok(EnemySpawn { kind, tile, room })
}

fn parse_upgrade(line: &str) -> Result<UpgradeSpawn> {
    let fields: Vec<&str> = line.split(',').collect();
    let Some((key, rest)) = fields.split_first() else {
        return Err(bad_record("upgrade", line));
    };
    let values = match parse_ints(rest).as_deref() {
        Some(&[x, y, ox, oy]) => (x, y, ox, oy),
        _ => return Err(bad_record("upgrade", line)),
    };
    let kind = UpgradeKind::from_key(key.trim()).ok_or_else(|| LevelError::UnknownUpgrade(key.trim().to_string()))?;
    Ok(UpgradeSpawn { kind, tile: (values.0, values.1), offset: (values.2, values.3) })
}
