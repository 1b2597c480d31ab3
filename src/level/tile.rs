//! Typed vocabulary for level descriptions: tile kinds, board positions,
//! directions, tile tokens and effect tags.
//!
//! Everything here round-trips through the compact string forms used by the
//! level JSON (`"t5"`, `"3_4"`, `"craft_ne"`, `"ice_2"`), so the rest of the
//! crate never touches the raw encoding.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::TileLabError;

/// Serialize/deserialize a type through its `Display`/`FromStr` string form.
macro_rules! string_serde {
    ($t:ty) => {
        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

/// A concrete matchable tile kind, `t1` through `t15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKind(u8);

impl TileKind {
    /// Largest kind index the palette can use.
    pub const MAX: u8 = 15;

    pub fn new(index: u8) -> Option<Self> {
        (1..=Self::MAX).contains(&index).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl FromStr for TileKind {
    type Err = TileLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s
            .strip_prefix('t')
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(|| TileLabError::InvalidLevel(format!("unknown tile kind '{s}'")))?;
        TileKind::new(index)
            .ok_or_else(|| TileLabError::InvalidLevel(format!("tile kind '{s}' out of range")))
    }
}

string_serde!(TileKind);

/// Compass direction used by link tags and craft/stack boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    /// Grid delta `(dx, dy)`; north decreases the row index.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }

    pub fn is_cardinal(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::South | Direction::East | Direction::West
        )
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::NorthEast => Direction::SouthWest,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    /// The four cardinal directions in canonical order.
    pub const CARDINAL: [Direction; 4] =
        [Direction::North, Direction::South, Direction::East, Direction::West];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::North => "n",
            Direction::South => "s",
            Direction::East => "e",
            Direction::West => "w",
            Direction::NorthEast => "ne",
            Direction::NorthWest => "nw",
            Direction::SouthEast => "se",
            Direction::SouthWest => "sw",
        };
        f.write_str(s)
    }
}

impl FromStr for Direction {
    type Err = TileLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(Direction::North),
            "s" => Ok(Direction::South),
            "e" => Ok(Direction::East),
            "w" => Ok(Direction::West),
            "ne" => Ok(Direction::NorthEast),
            "nw" => Ok(Direction::NorthWest),
            "se" => Ok(Direction::SouthEast),
            "sw" => Ok(Direction::SouthWest),
            _ => Err(TileLabError::InvalidLevel(format!("unknown direction '{s}'"))),
        }
    }
}

string_serde!(Direction);

/// A grid position inside one layer, written `"x_y"` in level JSON.
///
/// `Ord` compares the `"x_y"` string forms, not the numeric pair: this is the
/// canonical traversal order of the whole engine, and sorted maps keyed by
/// `Pos` iterate canonically for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: u16,
    pub y: u16,
}

impl Pos {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Neighbor one step in `dir`, if it stays on the non-negative grid.
    pub fn step(self, dir: Direction) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let x = i32::from(self.x) + dx;
        let y = i32::from(self.y) + dy;
        (x >= 0 && y >= 0).then(|| Pos::new(x as u16, y as u16))
    }

    /// The `"x_y"` form as bytes in a fixed buffer, for allocation-free
    /// lexicographic comparison.
    fn lex_key(self) -> ([u8; 11], usize) {
        let mut buf = [0u8; 11];
        let mut len = write_decimal(&mut buf, 0, self.x);
        buf[len] = b'_';
        len += 1;
        len = write_decimal(&mut buf, len, self.y);
        (buf, len)
    }
}

fn write_decimal(buf: &mut [u8; 11], at: usize, value: u16) -> usize {
    let mut digits = [0u8; 5];
    let mut v = value;
    let mut n = 0;
    loop {
        digits[n] = b'0' + (v % 10) as u8;
        v /= 10;
        n += 1;
        if v == 0 {
            break;
        }
    }
    for i in 0..n {
        buf[at + i] = digits[n - 1 - i];
    }
    at + n
}

impl Ord for Pos {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, alen) = self.lex_key();
        let (b, blen) = other.lex_key();
        a[..alen].cmp(&b[..blen])
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.x, self.y)
    }
}

impl FromStr for Pos {
    type Err = TileLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once('_')
            .ok_or_else(|| TileLabError::InvalidLevel(format!("invalid position '{s}'")))?;
        let parse = |v: &str| {
            v.parse::<u16>()
                .map_err(|_| TileLabError::InvalidLevel(format!("invalid position '{s}'")))
        };
        Ok(Pos::new(parse(x)?, parse(y)?))
    }
}

string_serde!(Pos);

/// The tile-type token of a level descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileToken {
    /// `t0`: resolved to a palette kind at state construction.
    Random,
    Kind(TileKind),
    Craft(Direction),
    Stack(Direction),
}

impl TileToken {
    pub fn is_box(self) -> bool {
        matches!(self, TileToken::Craft(_) | TileToken::Stack(_))
    }
}

impl fmt::Display for TileToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileToken::Random => f.write_str("t0"),
            TileToken::Kind(kind) => write!(f, "{kind}"),
            TileToken::Craft(dir) => write!(f, "craft_{dir}"),
            TileToken::Stack(dir) => write!(f, "stack_{dir}"),
        }
    }
}

impl FromStr for TileToken {
    type Err = TileLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "t0" {
            return Ok(TileToken::Random);
        }
        if let Some(dir) = s.strip_prefix("craft_") {
            return Ok(TileToken::Craft(dir.parse()?));
        }
        if let Some(dir) = s.strip_prefix("stack_") {
            return Ok(TileToken::Stack(dir.parse()?));
        }
        s.parse::<TileKind>()
            .map(TileToken::Kind)
            .map_err(|_| TileLabError::InvalidLevel(format!("unknown tile type token '{s}'")))
    }
}

string_serde!(TileToken);

/// The effect tag of a level descriptor (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTag {
    Chain,
    Frog,
    /// `ice` / `ice_N`; the suffix is accepted but ice always starts at 3.
    Ice(Option<u8>),
    /// `grass` / `grass_N`.
    Grass(Option<u8>),
    /// `link_{n,s,e,w}`; link tags are cardinal only.
    Link(Direction),
    /// `bomb` / `bomb_N` / bare digits.
    Bomb(Option<u8>),
    /// `curtain` / `curtain_open` / `curtain_close`.
    Curtain(Option<bool>),
    Teleport,
    Unknown,
}

impl fmt::Display for EffectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectTag::Chain => f.write_str("chain"),
            EffectTag::Frog => f.write_str("frog"),
            EffectTag::Ice(None) => f.write_str("ice"),
            EffectTag::Ice(Some(n)) => write!(f, "ice_{n}"),
            EffectTag::Grass(None) => f.write_str("grass"),
            EffectTag::Grass(Some(n)) => write!(f, "grass_{n}"),
            EffectTag::Link(dir) => write!(f, "link_{dir}"),
            EffectTag::Bomb(None) => f.write_str("bomb"),
            EffectTag::Bomb(Some(n)) => write!(f, "bomb_{n}"),
            EffectTag::Curtain(None) => f.write_str("curtain"),
            EffectTag::Curtain(Some(true)) => f.write_str("curtain_open"),
            EffectTag::Curtain(Some(false)) => f.write_str("curtain_close"),
            EffectTag::Teleport => f.write_str("teleport"),
            EffectTag::Unknown => f.write_str("unknown"),
        }
    }
}

impl FromStr for EffectTag {
    type Err = TileLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || TileLabError::InvalidLevel(format!("unknown effect tag '{s}'"));
        let suffix = |v: &str| v.parse::<u8>().map_err(|_| bad());
        match s {
            "chain" => Ok(EffectTag::Chain),
            "frog" => Ok(EffectTag::Frog),
            "ice" => Ok(EffectTag::Ice(None)),
            "grass" => Ok(EffectTag::Grass(None)),
            "bomb" => Ok(EffectTag::Bomb(None)),
            "curtain" => Ok(EffectTag::Curtain(None)),
            "curtain_open" => Ok(EffectTag::Curtain(Some(true))),
            "curtain_close" => Ok(EffectTag::Curtain(Some(false))),
            "teleport" => Ok(EffectTag::Teleport),
            "unknown" => Ok(EffectTag::Unknown),
            _ => {
                if let Some(n) = s.strip_prefix("ice_") {
                    Ok(EffectTag::Ice(Some(suffix(n)?)))
                } else if let Some(n) = s.strip_prefix("grass_") {
                    Ok(EffectTag::Grass(Some(suffix(n)?)))
                } else if let Some(n) = s.strip_prefix("bomb_") {
                    Ok(EffectTag::Bomb(Some(suffix(n)?)))
                } else if let Some(dir) = s.strip_prefix("link_") {
                    let dir: Direction = dir.parse()?;
                    if dir.is_cardinal() {
                        Ok(EffectTag::Link(dir))
                    } else {
                        Err(bad())
                    }
                } else if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
                    // Bare digit tags are legacy bomb countdowns.
                    Ok(EffectTag::Bomb(Some(suffix(s)?)))
                } else {
                    Err(bad())
                }
            }
        }
    }
}

string_serde!(EffectTag);

/// A goal counter key: a plain tile kind or a craft/stack box family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GoalKind {
    Kind(TileKind),
    Craft(Direction),
    Stack(Direction),
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalKind::Kind(kind) => write!(f, "{kind}"),
            GoalKind::Craft(dir) => write!(f, "craft_{dir}"),
            GoalKind::Stack(dir) => write!(f, "stack_{dir}"),
        }
    }
}

impl FromStr for GoalKind {
    type Err = TileLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<TileToken>()? {
            TileToken::Kind(kind) => Ok(GoalKind::Kind(kind)),
            TileToken::Craft(dir) => Ok(GoalKind::Craft(dir)),
            TileToken::Stack(dir) => Ok(GoalKind::Stack(dir)),
            TileToken::Random => {
                Err(TileLabError::InvalidLevel("'t0' is not a goal kind".to_string()))
            }
        }
    }
}

string_serde!(GoalKind);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_kind_round_trip() {
        for i in 1..=TileKind::MAX {
            let kind = TileKind::new(i).unwrap();
            let parsed: TileKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed, "kind t{i} should round-trip through its string form");
        }
        assert!("t0".parse::<TileKind>().is_err(), "t0 is a placeholder, not a kind");
        assert!("t16".parse::<TileKind>().is_err(), "t16 is outside the palette");
    }

    #[test]
    fn test_pos_order_is_string_lexicographic() {
        // "10_0" sorts before "2_0" because '1' < '2' in the string form.
        let a = Pos::new(10, 0);
        let b = Pos::new(2, 0);
        assert!(a < b, "position order must follow the string form, not the numbers");

        // After the shared '1', '2' (0x32) < '_' (0x5F), so "12_0" < "1_9".
        assert!(Pos::new(12, 0) < Pos::new(1, 9));
    }

    #[test]
    fn test_token_parsing() {
        assert_eq!("t0".parse::<TileToken>().unwrap(), TileToken::Random);
        assert_eq!(
            "craft_ne".parse::<TileToken>().unwrap(),
            TileToken::Craft(Direction::NorthEast)
        );
        assert_eq!(
            "stack_s".parse::<TileToken>().unwrap(),
            TileToken::Stack(Direction::South)
        );
        assert!("craft_x".parse::<TileToken>().is_err());
    }

    #[test]
    fn test_effect_tag_parsing() {
        assert_eq!("ice_2".parse::<EffectTag>().unwrap(), EffectTag::Ice(Some(2)));
        assert_eq!("4".parse::<EffectTag>().unwrap(), EffectTag::Bomb(Some(4)));
        assert_eq!(
            "curtain_open".parse::<EffectTag>().unwrap(),
            EffectTag::Curtain(Some(true))
        );
        assert_eq!(
            "link_w".parse::<EffectTag>().unwrap(),
            EffectTag::Link(Direction::West)
        );
        assert!("link_ne".parse::<EffectTag>().is_err(), "link tags are cardinal only");
        assert!("sparkle".parse::<EffectTag>().is_err());
    }

    #[test]
    fn test_direction_step() {
        let pos = Pos::new(3, 3);
        assert_eq!(pos.step(Direction::North), Some(Pos::new(3, 2)));
        assert_eq!(pos.step(Direction::SouthEast), Some(Pos::new(4, 4)));
        assert_eq!(Pos::new(0, 0).step(Direction::West), None);
    }
}
