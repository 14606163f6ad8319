use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Last path segment of a module id, or the id itself for bare names.
pub fn short_name(id: &str) -> &str {
    id.rsplit_once('/').map(|(_, rest)| rest).unwrap_or(id)
}

/// Stable 64-bit hash of a node id, used for the palette fallback.
pub fn stable_hash(id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_picks_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
    }

    #[test]
    fn short_name_strips_directories() {
        assert_eq!(short_name("src/render/scene.ts"), "scene.ts");
        assert_eq!(short_name("library:lodash"), "library:lodash");
    }

    #[test]
    fn stable_hash_is_deterministic() {
        assert_eq!(stable_hash("src/a.ts"), stable_hash("src/a.ts"));
        assert_ne!(stable_hash("src/a.ts"), stable_hash("src/b.ts"));
    }
}
