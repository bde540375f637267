// ── Connection defaults ────────────────────────────────────────────

pub const DEFAULT_CONFIG_PATH: &str = "dbaudit.yaml";
pub const DEFAULT_SERVICE_ADDR: &str = "https://127.0.0.1:3080";

// ── Fetch defaults ─────────────────────────────────────────────────

/// Events requested per page.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Upper bound the audit service accepts for a single page.
pub const MAX_PAGE_LIMIT: usize = 5_000;

/// Audit service request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
