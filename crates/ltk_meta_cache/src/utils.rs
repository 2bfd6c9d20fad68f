//! Hashing helpers.

use xxhash_rust::xxh3::xxh3_64;

/// Order-independent fingerprint over a set of `(game path, content)` pairs.
///
/// Pairs are reduced to `(path_hash, content_hash)` and sorted before the final
/// hash, so insertion order does not matter. An empty set fingerprints to `0`.
#[derive(Debug, Default, Clone)]
pub struct Fingerprint {
    entries: Vec<(u64, u64)>,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, game_path: &str, bytes: &[u8]) {
        self.entries.push((hash_game_path(game_path), xxh3_64(bytes)));
    }

    pub fn finish(mut self) -> u64 {
        if self.entries.is_empty() {
            return 0;
        }
        self.entries.sort_unstable();

        let mut buf = Vec::with_capacity(self.entries.len() * 16);
        for (path_hash, content_hash) in &self.entries {
            buf.extend_from_slice(&path_hash.to_le_bytes());
            buf.extend_from_slice(&content_hash.to_le_bytes());
        }
        xxh3_64(&buf)
    }
}

/// xxHash3 of a game path, case- and separator-insensitive.
pub fn hash_game_path(path: &str) -> u64 {
    xxh3_64(path.to_ascii_lowercase().replace('\\', "/").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_order_independent() {
        let mut a = Fingerprint::new();
        a.add("chara/xls/charamake/human.cmp", &[1, 2, 3]);
        a.add("chara/xls/equipmentparameter/gimmickparameter.gmp", &[4, 5]);

        let mut b = Fingerprint::new();
        b.add("chara/xls/equipmentparameter/gimmickparameter.gmp", &[4, 5]);
        b.add("chara/xls/charamake/human.cmp", &[1, 2, 3]);

        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_fingerprint_content_sensitive() {
        let mut a = Fingerprint::new();
        a.add("chara/xls/charamake/human.cmp", &[1, 2, 3]);
        let mut b = Fingerprint::new();
        b.add("chara/xls/charamake/human.cmp", &[1, 2, 4]);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_fingerprint_empty() {
        assert_eq!(Fingerprint::new().finish(), 0);
    }

    #[test]
    fn test_hash_game_path_normalizes() {
        assert_eq!(
            hash_game_path("CHARA\\xls\\charamake\\human.cmp"),
            hash_game_path("chara/xls/charamake/human.cmp")
        );
    }
}
