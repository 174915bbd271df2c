//! Permission keys: the `screen_name_action` form clients use to name a permission.

/// A key split into its lookup parts. `action` is upper-cased but not checked
/// against the known actions; an unknown action simply fails to resolve.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedKey {
    pub screen_name: String,
    pub action: String,
}

pub fn build_permission_key(screen_name: &str, action: &str) -> String {
    format!("{}_{}", screen_name, action.to_lowercase())
}

/// Split at the last underscore. `None` when there is no underscore, or when
/// either side of it would be empty.
pub fn parse_permission_key(key: &str) -> Option<ParsedKey> {
    let idx = key.rfind('_')?;
    if idx == 0 || idx == key.len() - 1 {
        return None;
    }

    let (screen_name, action) = (&key[..idx], &key[idx + 1..]);
    Some(ParsedKey {
        screen_name: screen_name.to_string(),
        action: action.to_uppercase(),
    })
}
