//! Space separated token lists.
//!
//! Keys such as `[Match] Name=` hold an ordered set of names separated by
//! spaces. These helpers keep that set free of duplicates while preserving the
//! order of the surviving tokens.

/// Split a value into its tokens.
#[must_use]
pub fn split(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Join tokens back into a single value.
#[must_use]
pub fn join(tokens: &[String]) -> String {
    tokens.join(" ")
}

/// Append `token` unless it is already present.
pub fn include(tokens: &mut Vec<String>, token: &str) {
    if !tokens.iter().any(|t| t == token) {
        tokens.push(token.to_string());
    }
}

/// Remove every occurrence of `token`.
pub fn exclude(tokens: &mut Vec<String>, token: &str) {
    tokens.retain(|t| t != token);
}

/// Remove every occurrence of `old` and `new`, then append `new` once.
pub fn replace(tokens: &mut Vec<String>, old: &str, new: &str) {
    tokens.retain(|t| t != old && t != new);
    tokens.push(new.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn replace_appends_new_token() {
        let mut tokens = list(&["eth0", "eth1"]);
        replace(&mut tokens, "eth0", "eth2");
        assert_eq!(tokens, list(&["eth1", "eth2"]));
    }

    #[test]
    fn replace_missing_token_is_upsert() {
        let mut tokens = list(&["eth1"]);
        replace(&mut tokens, "eth0", "eth2");
        assert_eq!(tokens, list(&["eth1", "eth2"]));
    }

    #[test]
    fn include_skips_duplicates() {
        let mut tokens = list(&["vlan1"]);
        include(&mut tokens, "vlan1");
        include(&mut tokens, "vlan2");
        assert_eq!(tokens, list(&["vlan1", "vlan2"]));
    }

    #[test]
    fn exclude_removes_all_occurrences() {
        let mut tokens = list(&["a", "b", "a"]);
        exclude(&mut tokens, "a");
        assert_eq!(tokens, list(&["b"]));
    }

    #[test]
    fn split_ignores_repeated_spaces() {
        assert_eq!(split(" eth0  eth1 "), list(&["eth0", "eth1"]));
        assert!(split("").is_empty());
    }

    fn token() -> impl Strategy<Value = String> {
        "[a-z]{1,3}[0-9]?"
    }

    proptest! {
        #[test]
        fn replace_leaves_new_last_and_old_absent(
            mut tokens in proptest::collection::vec(token(), 0..8),
            old in token(),
            new in token(),
        ) {
            replace(&mut tokens, &old, &new);
            prop_assert_eq!(tokens.last(), Some(&new));
            prop_assert_eq!(tokens.iter().filter(|t| **t == new).count(), 1);
            if old != new {
                prop_assert!(!tokens.contains(&old));
            }
        }

        #[test]
        fn replace_is_idempotent(
            tokens in proptest::collection::vec(token(), 0..8),
            old in token(),
            new in token(),
        ) {
            let mut once = tokens.clone();
            replace(&mut once, &old, &new);
            let mut twice = once.clone();
            replace(&mut twice, &old, &new);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn include_then_exclude_drops_token(
            mut tokens in proptest::collection::vec(token(), 0..8),
            item in token(),
        ) {
            let before = tokens.len();
            include(&mut tokens, &item);
            prop_assert!(tokens.contains(&item));
            prop_assert!(tokens.len() <= before + 1);
            exclude(&mut tokens, &item);
            prop_assert!(!tokens.contains(&item));
        }
    }
}
