// THEORY:
// `MonsterStats` is the stat sheet the model produces. It is deliberately a
// loose carrier: numbers are `i64` and the element type is a plain string so
// that whatever the model sends back can be parsed first and judged by the
// validator afterwards. `StatField` and `ElementType` are the single source of
// truth for field order, human-readable labels and the schema sent upstream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const STAT_MIN: i64 = 0;
pub const STAT_MAX: i64 = 100;

/// The nine-field stat sheet for one monster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonsterStats {
    /// What the sculpture is taken to depict.
    #[serde(default)]
    pub name: String,
    pub hp: i64,
    pub speed: i64,
    pub short_range_attack_power: i64,
    pub long_range_attack_power: i64,
    pub attack_range: i64,
    pub attack_cooldown: i64,
    pub attack_speed: i64,
    pub defense_power: i64,
    /// Elemental colour, one of `ElementType::ALL` once validated.
    #[serde(rename = "type", default)]
    pub monster_type: String,
}

impl MonsterStats {
    pub fn stat(&self, field: StatField) -> i64 {
        match field {
            StatField::Hp => self.hp,
            StatField::Speed => self.speed,
            StatField::ShortRangeAttackPower => self.short_range_attack_power,
            StatField::LongRangeAttackPower => self.long_range_attack_power,
            StatField::AttackRange => self.attack_range,
            StatField::AttackCooldown => self.attack_cooldown,
            StatField::AttackSpeed => self.attack_speed,
            StatField::DefensePower => self.defense_power,
        }
    }

    #[cfg(test)]
    pub(crate) fn stat_mut(&mut self, field: StatField) -> &mut i64 {
        match field {
            StatField::Hp => &mut self.hp,
            StatField::Speed => &mut self.speed,
            StatField::ShortRangeAttackPower => &mut self.short_range_attack_power,
            StatField::LongRangeAttackPower => &mut self.long_range_attack_power,
            StatField::AttackRange => &mut self.attack_range,
            StatField::AttackCooldown => &mut self.attack_cooldown,
            StatField::AttackSpeed => &mut self.attack_speed,
            StatField::DefensePower => &mut self.defense_power,
        }
    }
}

/// The bounded numeric stats, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    Hp,
    Speed,
    ShortRangeAttackPower,
    LongRangeAttackPower,
    AttackRange,
    AttackCooldown,
    AttackSpeed,
    DefensePower,
}

impl StatField {
    pub const ALL: [StatField; 8] = [
        StatField::Hp,
        StatField::Speed,
        StatField::ShortRangeAttackPower,
        StatField::LongRangeAttackPower,
        StatField::AttackRange,
        StatField::AttackCooldown,
        StatField::AttackSpeed,
        StatField::DefensePower,
    ];

    /// JSON property name.
    pub fn key(self) -> &'static str {
        match self {
            StatField::Hp => "hp",
            StatField::Speed => "speed",
            StatField::ShortRangeAttackPower => "short_range_attack_power",
            StatField::LongRangeAttackPower => "long_range_attack_power",
            StatField::AttackRange => "attack_range",
            StatField::AttackCooldown => "attack_cooldown",
            StatField::AttackSpeed => "attack_speed",
            StatField::DefensePower => "defense_power",
        }
    }

    /// Name used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            StatField::Hp => "HP",
            StatField::Speed => "Speed",
            StatField::ShortRangeAttackPower => "Short range attack power",
            StatField::LongRangeAttackPower => "Long range attack power",
            StatField::AttackRange => "Attack range",
            StatField::AttackCooldown => "Attack cooldown",
            StatField::AttackSpeed => "Attack speed",
            StatField::DefensePower => "Defense power",
        }
    }

    /// Schema description shown to the model.
    pub fn description(self) -> &'static str {
        match self {
            StatField::Hp => "Hit points (0-100)",
            StatField::Speed => "Movement speed (0-100)",
            StatField::ShortRangeAttackPower => "Melee attack power (0-100)",
            StatField::LongRangeAttackPower => "Ranged attack power (0-100)",
            StatField::AttackRange => "Attack reach (0-100)",
            StatField::AttackCooldown => "Attack cooldown, larger is slower (0-100)",
            StatField::AttackSpeed => "Attack speed (0-100)",
            StatField::DefensePower => "Defense power (0-100)",
        }
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Elemental type, derived from the snack's colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Red,
    Blue,
    Green,
    Yellow,
    Brown,
    White,
    Black,
}

impl ElementType {
    pub const ALL: [ElementType; 7] = [
        ElementType::Red,
        ElementType::Blue,
        ElementType::Green,
        ElementType::Yellow,
        ElementType::Brown,
        ElementType::White,
        ElementType::Black,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Red => "red",
            ElementType::Blue => "blue",
            ElementType::Green => "green",
            ElementType::Yellow => "yellow",
            ElementType::Brown => "brown",
            ElementType::White => "white",
            ElementType::Black => "black",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown element type `{0}`")]
pub struct UnknownElementType(pub String);

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownElementType(s.to_string()))
    }
}
