/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Number of reports returned by the "latest reports" listing
pub const LATEST_REPORTS_LIMIT: i64 = 50;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Default role for new citizen accounts (read-only access)
pub const ROLE_GUEST: &str = "Guest";

/// Confirmed citizen, can submit reports and comment
pub const ROLE_REPORTER: &str = "Reporter";

/// Municipal staff role, can moderate and handle reports
pub const ROLE_HANDLER: &str = "Handler";

/// Full administrative access
pub const ROLE_ADMINISTRATOR: &str = "Administrator";

// =============================================================================
// POINTS
// =============================================================================

/// Points every new citizen account starts with
pub const STARTING_POINTS: i32 = 5;

/// Points awarded for each submitted report
pub const REPORT_SUBMISSION_POINTS: i32 = 10;

// =============================================================================
// UPLOADS
// =============================================================================

/// Image extensions accepted by the storage module
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

/// Photos accepted in a single report image upload
pub const MAX_REPORT_IMAGES_PER_UPLOAD: usize = 5;

// =============================================================================
// ROUTES
// =============================================================================

/// Landing path after a citizen logs in
pub const USER_DASHBOARD_PATH: &str = "/api/reports/mine";

/// Landing path after a handler logs in
pub const HANDLER_DASHBOARD_PATH: &str = "/api/staff/assignments";
