// =============================================================================
// PRIORITY SCORING
// =============================================================================

/// Urgency weight for LOW / MEDIUM / HIGH / CRITICAL
pub const URGENCY_WEIGHT_LOW: f64 = 1.0;
pub const URGENCY_WEIGHT_MEDIUM: f64 = 2.0;
pub const URGENCY_WEIGHT_HIGH: f64 = 3.0;
pub const URGENCY_WEIGHT_CRITICAL: f64 = 5.0;

/// Used when an urgency label is not recognised
pub const URGENCY_WEIGHT_DEFAULT: f64 = 2.0;

/// Category weights keyed by category name, as stored in `categories.name`
pub const CATEGORY_WEIGHTS: &[(&str, f64)] = &[
    ("ไฟฟ้า", 1.5),            // electrical
    ("ประปา", 1.5),            // plumbing
    ("IT/คอมพิวเตอร์", 1.0),    // IT / computers
    ("แอร์/ระบายอากาศ", 1.2),   // air conditioning / ventilation
    ("อาคาร/โครงสร้าง", 1.3),   // building / structure
];

pub const CATEGORY_WEIGHT_DEFAULT: f64 = 1.0;

/// Heat: tickets within this radius over the lookback window boost priority
pub const HEAT_RADIUS_METERS: f64 = 500.0;
pub const HEAT_LOOKBACK_DAYS: i64 = 30;
pub const HEAT_WEIGHT_PER_TICKET: f64 = 0.1;
pub const HEAT_WEIGHT_CAP: f64 = 2.0;

// =============================================================================
// ASSIGNMENT SCORING
// =============================================================================

pub const PROXIMITY_NEAR_KM: f64 = 1.0;
pub const PROXIMITY_MID_KM: f64 = 5.0;
pub const PROXIMITY_SCORE_NEAR: f64 = 1.0;
pub const PROXIMITY_SCORE_MID: f64 = 0.5;
pub const PROXIMITY_SCORE_FAR: f64 = 0.1;

/// Proximity score when either location is unknown
pub const PROXIMITY_SCORE_NEUTRAL: f64 = 0.5;

/// Default assignment rule, materialised when no active rule exists
pub const DEFAULT_MAX_OPEN_TICKETS: i32 = 5;
pub const DEFAULT_WEIGHT_DISTANCE: f64 = 0.6;
pub const DEFAULT_WEIGHT_WORKLOAD: f64 = 0.4;

// =============================================================================
// OVERDUE THRESHOLDS
// =============================================================================

pub const OVERDUE_PENDING_HOURS: i64 = 24;
pub const OVERDUE_ACTIVE_HOURS: i64 = 72;
