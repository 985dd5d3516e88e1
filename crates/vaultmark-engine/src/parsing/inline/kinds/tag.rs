pub struct Tag;

impl Tag {
    pub const MARKER: char = '#';

    pub fn is_name_char(c: char) -> bool {
        c.is_alphanumeric() || c == '-' || c == '_'
    }

    /// A tag may only start at the beginning of a run or after these.
    pub fn may_follow(prev: Option<char>) -> bool {
        match prev {
            None => true,
            Some(c) => c.is_whitespace() || c == '(',
        }
    }

    /// Purely numeric names (`#1`, `#2024`) are not tags.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name.chars().any(|c| !c.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(Tag::is_valid_name("rust-lang"));
        assert!(Tag::is_valid_name("2024_trip"));
        assert!(!Tag::is_valid_name("2024"));
        assert!(!Tag::is_valid_name(""));
        assert!(Tag::may_follow(Some('(')));
        assert!(!Tag::may_follow(Some('a')));
    }
}
