pub static CONNECT_TIMEOUT_SECS: u64 = 3;
pub static READ_TIMEOUT_SECS: u64 = 10;

pub static STABILIZE_MIN_MILLIS: u64 = 1_000;
pub static STABILIZE_MAX_MILLIS: u64 = 2_000;
pub static FIX_FINGERS_MIN_MILLIS: u64 = 3_000;
pub static FIX_FINGERS_MAX_MILLIS: u64 = 5_000;
pub static CHECK_PREDECESSOR_MIN_MILLIS: u64 = 1_000;
pub static CHECK_PREDECESSOR_MAX_MILLIS: u64 = 2_000;

pub static DEFAULT_SUCCESSOR_LIST_LEN: usize = 4;
