use serde::{Deserialize, Serialize};

/// Server reply to a daily streak update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub previous_streak: u32,
    #[serde(default)]
    pub coins_earned: u32,
    #[serde(default)]
    pub milestone_reached: bool,
}
