//! Global constants for the curation tool

/// Crop extent as a multiple of the circle radius (crop half-width = radius * scale)
pub const DEFAULT_CROP_SCALE: f32 = 2.0;

/// On-screen edge length of a square grid thumbnail, in pixels
pub const DEFAULT_RENDER_SIZE: f32 = 200.0;

/// Drags producing a radius at or below this (crop-local units) clear the circle
pub const DEFAULT_MIN_COMMIT_RADIUS: f32 = 2.0;

/// Smallest crop half-extent, as a multiple of the minimum commit radius
pub const MIN_CROP_HALF_EXTENT_FACTOR: f32 = 4.0;

/// Radius multiplier applied by a modifier-click
pub const DEFAULT_GROWTH_FACTOR: f32 = 1.1;

/// Pointer travel (screen pixels) below which a modifier-click counts as "no movement"
pub const CLICK_SLOP: f32 = 1.0;

/// Number of thumbnail columns in the grid
pub const DEFAULT_GRID_COLUMNS: usize = 5;

/// Gap between grid cells, in pixels
pub const DEFAULT_GRID_GAP: f32 = 8.0;

/// Pre-fetch margin as a fraction of the viewport size on every side
pub const DEFAULT_PREFETCH_MARGIN: f32 = 1.0;

/// Telemetry accumulation window in milliseconds
pub const DEFAULT_TELEMETRY_FLUSH_WINDOW_MS: u64 = 1000;

/// Press duration after which a held press maximizes the cell, in milliseconds
pub const DEFAULT_LONG_PRESS_MS: u64 = 200;

/// Pointer travel (screen pixels) that cancels a pending long press
pub const LONG_PRESS_SLOP: f32 = 4.0;

/// Maximize/minimize animation duration in milliseconds
pub const DEFAULT_MAXIMIZE_DURATION_MS: u64 = 250;

/// Length of the random telemetry session identifier
pub const SESSION_ID_LENGTH: usize = 16;

/// Default base URL of the image/annotation server
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000/";

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
