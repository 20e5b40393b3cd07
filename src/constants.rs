// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 1811;
pub const SESSION_PATH: &str = "session";

// Session constants
pub const JWT_PROVIDER: &str = "jwt";
pub const BEARER_PREFIX: &str = "Bearer ";
pub const DEFAULT_IDENTIFIER_FIELD: &str = "email";

// Timing constants (milliseconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MIN_AUTH_DURATION_MS: u64 = 100;

// Generic message for every credential failure, whichever part was wrong
pub const ERROR_INVALID_LOGIN: &str = "Invalid login.";

// Bearer tokens longer than this are refused before any decoding
pub const MAX_TOKEN_LENGTH: usize = 4096;
