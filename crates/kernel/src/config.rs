//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::jsmodule::DEFAULT_BUNDLE_PATH;
use crate::menu::DEFAULT_FALLBACK_LINK;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `<module>.menu.json` files (default: ./menus).
    pub menus_dir: PathBuf,

    /// TOML file with URL access rules. When None, every URL is public.
    pub access_rules: Option<PathBuf>,

    /// Link for menu containers without a reachable leaf.
    pub menu_fallback_link: String,

    /// Root directory of scripts and their `.dep.js` manifests (default: ./static).
    pub js_root: PathBuf,

    /// Debug mode: list scripts individually and re-read manifests on every
    /// request (default: false).
    pub debug: bool,

    /// URL prefix bundles are served from.
    pub bundle_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let menus_dir = env::var("KATARI_MENUS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./menus"));

        let access_rules = env::var("KATARI_ACCESS_RULES").ok().map(PathBuf::from);

        let menu_fallback_link = env::var("KATARI_MENU_FALLBACK_LINK")
            .unwrap_or_else(|_| DEFAULT_FALLBACK_LINK.to_string());

        let js_root = env::var("KATARI_JS_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static"));

        let debug = match env::var("KATARI_DEBUG") {
            Ok(value) => parse_bool(&value)?,
            Err(_) => false,
        };

        let bundle_path =
            env::var("KATARI_BUNDLE_PATH").unwrap_or_else(|_| DEFAULT_BUNDLE_PATH.to_string());

        Ok(Self {
            menus_dir,
            access_rules,
            menu_fallback_link,
            js_root,
            debug,
            bundle_path,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("KATARI_DEBUG must be a boolean, got '{other}'"),
    }
}
