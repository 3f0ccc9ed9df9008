use regex::Regex;
use std::sync::LazyLock;

static ZERO_PADDED_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-H])0?(\d)").expect("well id pattern is valid")
});

/// Strip the zero padding from plate columns, e.g. `A01` becomes `A1`.
///
/// Only upper-case row letters A-H are rewritten; anything else passes through.
pub fn normalize_well_id(raw: &str) -> String {
    ZERO_PADDED_COLUMN.replace_all(raw, "${1}${2}").into_owned()
}
