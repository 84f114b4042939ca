use serde::{Deserialize, Serialize};

use super::hours::WeeklyHours;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialties: Vec<String>,
    /// Weekly availability template; None means no hours configured yet,
    /// which makes every day unavailable.
    pub weekly_hours: Option<WeeklyHours>,
    pub active: bool,
    pub is_owner: bool,
}
