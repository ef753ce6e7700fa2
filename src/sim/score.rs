//! Per-player score and lives

use serde::{Deserialize, Serialize};

use crate::consts::EXTRA_LIFE_SCORE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreKeeper {
    pub score: u64,
    /// Lives left, counting the tank currently in play
    pub lives: u32,
    next_bonus: u64,
}

impl ScoreKeeper {
    pub fn new(lives: u32) -> Self {
        Self {
            score: 0,
            lives,
            next_bonus: EXTRA_LIFE_SCORE,
        }
    }

    /// Add points. Returns how many bonus lives the new total earned.
    pub fn add(&mut self, points: u64) -> u32 {
        self.score += points;
        let mut earned = 0;
        while self.score >= self.next_bonus {
            self.next_bonus += EXTRA_LIFE_SCORE;
            self.lives += 1;
            earned += 1;
        }
        earned
    }

    pub fn gain_life(&mut self) {
        self.lives += 1;
    }

    /// Spend a life. Returns true if the player can respawn.
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives > 0
    }

    pub fn is_out(&self) -> bool {
        self.lives == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bonus_life_every_threshold() {
        let mut keeper = ScoreKeeper::new(3);
        assert_eq!(keeper.add(19_900), 0);
        assert_eq!(keeper.add(100), 1);
        assert_eq!(keeper.lives, 4);
        // A big jump can cross several thresholds at once
        assert_eq!(keeper.add(40_000), 2);
        assert_eq!(keeper.lives, 6);
    }

    #[test]
    fn test_lose_life_to_zero() {
        let mut keeper = ScoreKeeper::new(2);
        assert!(keeper.lose_life());
        assert!(!keeper.lose_life());
        assert!(keeper.is_out());
        assert!(!keeper.lose_life());
        assert_eq!(keeper.lives, 0);
    }
}
