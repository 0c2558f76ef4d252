//! Chat identifier normalization.
//!
//! The transport names conversations by an id with a domain suffix:
//! `@c.us` for individual contacts, `@g.us` for groups.

/// Suffix of an individual contact's chat id.
pub const CONTACT_SUFFIX: &str = "@c.us";

/// Suffix of a group chat id.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Whether the id already carries a contact or group suffix.
pub fn is_qualified(id: &str) -> bool {
    id.ends_with(CONTACT_SUFFIX) || id.ends_with(GROUP_SUFFIX)
}

/// Normalize user input into a chat id.
///
/// A bare number gets the contact suffix appended; qualified ids pass through.
pub fn normalize_chat_id(input: &str) -> String {
    let id = input.trim();
    if is_qualified(id) {
        id.to_string()
    } else {
        format!("{id}{CONTACT_SUFFIX}")
    }
}

/// The user part of a chat id (`5511999@c.us` → `5511999`).
pub fn user_part(id: &str) -> &str {
    id.split('@').next().unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_number_gets_suffix() {
        assert_eq!(normalize_chat_id("5511999999999"), "5511999999999@c.us");
    }

    #[test]
    fn test_suffix_appended_exactly_once() {
        let once = normalize_chat_id("5511999999999");
        assert_eq!(normalize_chat_id(&once), once);
        assert_eq!(once.matches(CONTACT_SUFFIX).count(), 1);
    }

    #[test]
    fn test_group_ids_pass_through() {
        assert_eq!(normalize_chat_id("12036304@g.us"), "12036304@g.us");
    }

    #[test]
    fn test_input_is_trimmed() {
        assert_eq!(normalize_chat_id("  5511 "), "5511@c.us");
    }

    #[test]
    fn test_user_part() {
        assert_eq!(user_part("5511@c.us"), "5511");
        assert_eq!(user_part("5511"), "5511");
    }
}
