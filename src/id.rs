use uuid::Uuid;

/// A fresh catalog identifier: a random (v4) UUID in hyphenated form.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
