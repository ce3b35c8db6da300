//! Activity levels
//!
//! Levels measure engagement (XP earned), not language ability; ability is
//! the CEFR level in preferences. There are 20 levels grouped into four
//! named stages of five.

/// XP needed to reach each level, level 1 first
pub const LEVEL_THRESHOLDS: [u32; 20] = [
    0, 50, 100, 200, 350, // Starter
    550, 800, 1100, 1500, 2000, // Traveler
    2600, 3300, 4100, 5000, 6000, // Explorer
    7200, 8500, 10000, 12000, 15000, // Pioneer
];

pub const MAX_LEVEL: u8 = LEVEL_THRESHOLDS.len() as u8;

const STREAK_BONUS_PER_DAY: f64 = 0.05;
const STREAK_BONUS_CAP: f64 = 2.0;

/// Level (1-20) for a total XP
pub fn calculate_level(xp: u32) -> u8 {
    LEVEL_THRESHOLDS.iter().rposition(|&threshold| xp >= threshold).map_or(1, |i| i as u8 + 1)
}

pub fn level_name(level: u8) -> &'static str {
    match level {
        1..=5 => "Starter",
        6..=10 => "Traveler",
        11..=15 => "Explorer",
        16..=20 => "Pioneer",
        _ => "Unknown",
    }
}

/// XP multiplier for a streak of `streak` days, capped at 2x
pub fn streak_multiplier(streak: u32) -> f64 {
    (1.0 + f64::from(streak) * STREAK_BONUS_PER_DAY).min(STREAK_BONUS_CAP)
}

/// `(xp still needed for the next level, xp earned inside the current one)`
///
/// At the top level nothing more is needed and the second value counts XP
/// past the last threshold.
pub fn xp_for_next_level(xp: u32) -> (u32, u32) {
    let level = calculate_level(xp) as usize;
    let current = LEVEL_THRESHOLDS[level - 1];

    match LEVEL_THRESHOLDS.get(level) {
        Some(&next) => (next - xp, xp - current),
        None => (0, xp - current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_level_at_thresholds() {
        assert_eq!(calculate_level(0), 1);
        assert_eq!(calculate_level(49), 1);
        assert_eq!(calculate_level(50), 2);
        assert_eq!(calculate_level(150), 3);
        assert_eq!(calculate_level(550), 6);
        assert_eq!(calculate_level(14_999), 19);
        assert_eq!(calculate_level(15_000), 20);
        assert_eq!(calculate_level(1_000_000), MAX_LEVEL);
    }

    #[test]
    fn test_level_names() {
        assert_eq!(level_name(1), "Starter");
        assert_eq!(level_name(5), "Starter");
        assert_eq!(level_name(6), "Traveler");
        assert_eq!(level_name(11), "Explorer");
        assert_eq!(level_name(20), "Pioneer");
        assert_eq!(level_name(0), "Unknown");
    }

    #[test]
    fn test_streak_multiplier() {
        assert_eq!(streak_multiplier(0), 1.0);
        assert!((streak_multiplier(5) - 1.25).abs() < 1e-9);
        assert_eq!(streak_multiplier(20), 2.0);
        assert_eq!(streak_multiplier(365), 2.0);
    }

    #[test]
    fn test_xp_for_next_level() {
        assert_eq!(xp_for_next_level(0), (50, 0));
        assert_eq!(xp_for_next_level(150), (50, 50));
        assert_eq!(xp_for_next_level(15_000), (0, 0));
        assert_eq!(xp_for_next_level(15_250), (0, 250));
    }
}
