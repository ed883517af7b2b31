//! Shared serde default helpers.

pub(crate) const fn default_true() -> bool {
    true
}
