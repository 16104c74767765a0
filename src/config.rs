use crate::types::Mirror;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::sync::OnceLock;

// Include the JSON file at compile time
const MIRRORS_JSON: &str = include_str!("../assets/mirrors.json");

/// 官方默认源, 应用镜像时作为 extra-index-url 兜底
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple";

#[derive(Debug, Clone, Deserialize)]
struct MirrorSet {
    main: Vec<Mirror>,
    backup: Vec<Mirror>,
}

// Global cache for the parsed mirror lists
static MIRRORS_CACHE: OnceLock<MirrorSet> = OnceLock::new();

/// Strategy:
/// 1. Try to load from User Config (~/.config/pip-fc/mirrors.json)
/// 2. Fallback to built-in assets/mirrors.json
fn mirror_set() -> &'static MirrorSet {
    MIRRORS_CACHE.get_or_init(|| {
        // 1. Try local config
        if let Some(proj_dirs) = ProjectDirs::from("", "", "pip-fc") {
            let config_path = proj_dirs.config_dir().join("mirrors.json");
            if config_path.exists() {
                if let Ok(content) = fs::read_to_string(&config_path) {
                    if let Ok(parsed) = serde_json::from_str(&content) {
                        println!("Loaded mirrors from local config: {:?}", config_path);
                        return parsed;
                    }
                }
            }
        }

        // 2. Fallback
        serde_json::from_str(MIRRORS_JSON)
            .expect("Failed to parse assets/mirrors.json. This is a compile-time error.")
    })
}

/// 候选源列表: 主力源在前, 备用源在后
///
/// The order is what makes tie-breaking in the prober deterministic.
pub fn candidates() -> Vec<Mirror> {
    let set = mirror_set();
    set.main.iter().chain(set.backup.iter()).cloned().collect()
}
