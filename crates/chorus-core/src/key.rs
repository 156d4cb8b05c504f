//! Opaque identity keys for registered handlers.

use std::fmt;

use uuid::Uuid;

/// Identity token naming one registration (or several, if the caller
/// reuses it across `register_keyed` calls).
///
/// Equality is identity of the minted token: [`Key::new`] never returns a
/// value equal to any other minted key, and copies of a key are the same
/// key. Handlers themselves are never compared — two closures with
/// identical bodies registered separately receive distinct keys, and a
/// fresh, identical-looking key will not unregister them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(Uuid);

impl Key {
    /// Mint a fresh key, distinct from every other minted key.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key:{}", self.0.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_keys_are_distinct() {
        let a = Key::new();
        let b = Key::new();
        assert_ne!(a, b);
    }

    #[test]
    fn copies_are_the_same_key() {
        let a = Key::new();
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn keys_hash_consistently() {
        use std::collections::HashSet;

        let a = Key::new();
        let mut seen = HashSet::new();
        seen.insert(a);
        assert!(seen.contains(&a));
        assert!(!seen.contains(&Key::new()));
    }
}
