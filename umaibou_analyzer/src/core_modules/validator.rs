// THEORY:
// The validator is the last gate before a stat sheet leaves the system. The
// schema sent to the model declares the same bounds, but that channel only
// guarantees structure, not ranges, so every sheet is checked here.
//
// Checks run in a fixed order and stop at the first failure: name, the eight
// numeric stats in `StatField::ALL` order, then type. Only one message is ever
// reported, which keeps responses and tests reproducible.

use crate::core_modules::monster_stats::{ElementType, MonsterStats, STAT_MAX, STAT_MIN, StatField};

/// The first rule a stat sheet broke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name is required")]
    MissingName,
    #[error("{} must be between 0 and 100", .field.label())]
    OutOfRange { field: StatField, value: i64 },
    #[error("Type is required")]
    MissingType,
    #[error("Type must be one of red, blue, green, yellow, brown, white, black")]
    UnknownType(String),
}

/// Checks `stats` against the domain rules, short-circuiting on the first violation.
pub fn validate(stats: &MonsterStats) -> Result<(), ValidationError> {
    if stats.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }

    for field in StatField::ALL {
        let value = stats.stat(field);
        if !(STAT_MIN..=STAT_MAX).contains(&value) {
            return Err(ValidationError::OutOfRange { field, value });
        }
    }

    // Blank counts as missing. Otherwise the token must match exactly, without padding.
    if stats.monster_type.trim().is_empty() {
        return Err(ValidationError::MissingType);
    }
    if stats.monster_type.parse::<ElementType>().is_err() {
        return Err(ValidationError::UnknownType(stats.monster_type.clone()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iron_stick() -> MonsterStats {
        MonsterStats {
            name: "IronStick".to_string(),
            hp: 40,
            speed: 70,
            short_range_attack_power: 60,
            long_range_attack_power: 80,
            attack_range: 50,
            attack_cooldown: 30,
            attack_speed: 55,
            defense_power: 45,
            monster_type: "brown".to_string(),
        }
    }

    #[test]
    fn accepts_in_range_sheet() {
        assert_eq!(validate(&iron_stick()), Ok(()));
    }

    #[test]
    fn bounds_are_inclusive() {
        for bound in [STAT_MIN, STAT_MAX] {
            let mut stats = iron_stick();
            for field in StatField::ALL {
                *stats.stat_mut(field) = bound;
            }
            assert_eq!(validate(&stats), Ok(()));
        }
    }

    #[test]
    fn every_element_type_is_accepted() {
        for t in ElementType::ALL {
            let mut stats = iron_stick();
            stats.monster_type = t.to_string();
            assert_eq!(validate(&stats), Ok(()), "{t}");
        }
    }

    #[test]
    fn messages_match_the_api_contract() {
        let mut stats = iron_stick();
        stats.hp = 120;
        assert_eq!(validate(&stats).unwrap_err().to_string(), "HP must be between 0 and 100");

        let expected = [
            "HP must be between 0 and 100",
            "Speed must be between 0 and 100",
            "Short range attack power must be between 0 and 100",
            "Long range attack power must be between 0 and 100",
            "Attack range must be between 0 and 100",
            "Attack cooldown must be between 0 and 100",
            "Attack speed must be between 0 and 100",
            "Defense power must be between 0 and 100",
        ];
        for (field, message) in StatField::ALL.into_iter().zip(expected) {
            let mut stats = iron_stick();
            *stats.stat_mut(field) = -1;
            assert_eq!(validate(&stats).unwrap_err().to_string(), message);
        }
    }

    #[test]
    fn first_bad_field_wins_regardless_of_later_ones() {
        // Break field k and every field after it; the report must name k.
        for (k, expected) in StatField::ALL.into_iter().enumerate() {
            let mut stats = iron_stick();
            for field in &StatField::ALL[k..] {
                *stats.stat_mut(*field) = 101;
            }
            stats.monster_type = String::new();
            assert_eq!(
                validate(&stats),
                Err(ValidationError::OutOfRange { field: expected, value: 101 })
            );
        }
    }

    #[test]
    fn name_is_checked_before_stats() {
        let mut stats = iron_stick();
        stats.name = "   ".to_string();
        stats.hp = 500;
        assert_eq!(validate(&stats), Err(ValidationError::MissingName));
        assert_eq!(ValidationError::MissingName.to_string(), "Name is required");
    }

    #[test]
    fn type_is_checked_last() {
        let mut stats = iron_stick();
        stats.monster_type = String::new();
        assert_eq!(validate(&stats), Err(ValidationError::MissingType));
        assert_eq!(ValidationError::MissingType.to_string(), "Type is required");

        stats.defense_power = 101;
        assert!(matches!(validate(&stats), Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn unknown_colour_is_rejected() {
        let mut stats = iron_stick();
        stats.monster_type = "purple".to_string();
        assert_eq!(validate(&stats), Err(ValidationError::UnknownType("purple".to_string())));
    }

    #[test]
    fn padded_or_recased_type_is_rejected() {
        for raw in [" brown\n", "brown ", "\tred", "Brown"] {
            let mut stats = iron_stick();
            stats.monster_type = raw.to_string();
            assert_eq!(validate(&stats), Err(ValidationError::UnknownType(raw.to_string())), "{raw:?}");
        }

        let mut stats = iron_stick();
        stats.monster_type = " \n".to_string();
        assert_eq!(validate(&stats), Err(ValidationError::MissingType));
    }
}
