use std::collections::HashMap;

/// Node endpoint in `ip:port` form, used verbatim on the wire.
pub type Address = String;

/// Position in the identifier ring, an integer in `[0, 2^m)` with `m <= 64`.
pub type RingId = u64;

/// Per-node key value storage.
pub type KvStore = HashMap<String, String>;
