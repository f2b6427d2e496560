use std::collections::HashMap;

/// Label addresses, keyed by label name (without the trailing `:`).
/// During pass 1 every label seen anywhere in the program is pre-seeded
/// to `0`, mirroring the original tool's forward-reference handling —
/// a branch to a label defined later in the file resolves correctly
/// once pass 1 completes, and a reference that never resolves at all
/// still evaluates to `0` rather than failing pass 1.
pub type LabelTable = HashMap<String, i64>;

/// `.set` (and, in the older dialect, `.add`) symbol values. Rebuilt
/// from scratch at the start of each pass, matching the original
/// tool's per-pass `symbols = {}` reset.
pub type SymbolTable = HashMap<String, i64>;
