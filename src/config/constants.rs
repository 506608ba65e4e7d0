// * Configuration Constants
// * Central location for every threshold and priority the matching pipeline uses

// * Alias priorities (0-100). Higher always wins; ties keep the first claim.
pub const PRIORITY_EXACT: u8 = 100;
pub const PRIORITY_EXPANDED: u8 = 98;
pub const PRIORITY_CURATED: u8 = 80;
pub const PRIORITY_CURATED_EXPANDED: u8 = 78;
pub const PRIORITY_WORD: u8 = 40;

// * Community-learned aliases: 55 + floor((usage - 3) * 1.5), capped at 75
pub const COMMUNITY_BASE_PRIORITY: i32 = 55;
pub const COMMUNITY_MAX_PRIORITY: i32 = 75;
pub const COMMUNITY_USAGE_OFFSET: i64 = 3;
pub const COMMUNITY_USAGE_WEIGHT: f64 = 1.5;

// * Minimum word length for single-word aliases taken from multi-word spec names
pub const MIN_ALIAS_WORD_LEN: usize = 5;

// * Fuzzy matching thresholds
pub const FUZZY_SPEC_THRESHOLD: u8 = 50;
pub const FUZZY_ALIAS_THRESHOLD: u8 = 55;
pub const FUZZY_PRIORITY_BOOST: f64 = 0.15;
pub const FUZZY_CONFIDENCE_CAP: u8 = 92;
pub const CATEGORY_MISMATCH_PENALTY: u8 = 25;

// * Resolution thresholds
pub const DIRECT_GRADE_CONFIDENCE: u8 = 85;
pub const MERGE_MAX_SPREAD: u8 = 10;
pub const CONFLICT_MIN_CONFIDENCE: u8 = 50;
pub const CONFLICT_MAX_GAP: u8 = 15;

// * Line and value length limits for pair extraction
pub const MIN_LINE_LENGTH: usize = 3;
pub const MAX_LINE_LENGTH: usize = 300;
pub const MAX_VALUE_LENGTH: usize = 200;
pub const MIN_LABEL_LENGTH: usize = 3;
pub const MAX_LABEL_LENGTH: usize = 50;

// * Batch segmentation
pub const MIN_LINES_BETWEEN_BOUNDARIES: usize = 3;
pub const MIN_SEGMENT_CHARS: usize = 20;

// * Edit-distance fallback only runs on short strings
pub const EDIT_DISTANCE_MAX_LEN: usize = 20;

// * Community alias fetch: usage below this is treated as noise
pub const DEFAULT_COMMUNITY_MIN_USAGE: u32 = 2;
