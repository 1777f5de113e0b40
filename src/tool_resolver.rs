//! # Tool Path Resolver
//!
//! This module finds the external media-probing binary (`ffprobe`) in the
//! environments the checker runs in:
//! - `<TOOL>_PATH` environment override (e.g. `FFPROBE_PATH`)
//! - `TOOLS_DIR` environment variable
//! - A `tools/` directory shipped next to the executable
//! - System PATH

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tool path resolver for different deployment environments
pub struct ToolPathResolver {
    /// Directory holding bundled tools, if one was found
    tools_dir: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Create a new path resolver
    pub fn new() -> Self {
        Self {
            tools_dir: Self::detect_bundled_tools_dir(),
        }
    }

    /// Resolver with a fixed tools directory, skipping detection
    pub fn with_tools_dir(tools_dir: Option<PathBuf>) -> Self {
        Self { tools_dir }
    }

    fn detect_bundled_tools_dir() -> Option<PathBuf> {
        if let Ok(tools_dir) = env::var("TOOLS_DIR") {
            let tools_path = PathBuf::from(tools_dir);
            debug!("Checking TOOLS_DIR environment variable: {:?}", tools_path);
            if tools_path.is_dir() {
                return Some(tools_path);
            }
        }

        let exe_path = env::current_exe().ok()?;
        let app_dir = exe_path.parent()?;
        let candidates = [app_dir.join("tools"), app_dir.join("resources").join("tools")];

        for path in candidates {
            debug!("Checking bundled tools path: {:?}", path);
            if path.is_dir() {
                return Some(path);
            }
        }

        None
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        let env_key = format!("{}_PATH", tool_name.to_uppercase());
        if let Some(path) = env::var_os(&env_key).map(PathBuf::from) {
            if path.is_file() {
                debug!("Using {} from {}: {:?}", tool_name, env_key, path);
                return Some(path);
            }
            warn!("{} points to a missing file: {:?}", env_key, path);
        }

        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled) = Self::bundled_tool_path(tools_dir, tool_name) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        if let Some(system_path) = Self::find_in_system_path(tool_name) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        debug!("Tool not found: {}", tool_name);
        None
    }

    /// `tools/<platform>/<tool>` first, then `tools/<tool>`
    fn bundled_tool_path(tools_dir: &Path, tool_name: &str) -> Option<PathBuf> {
        let platform = if cfg!(target_os = "macos") {
            "darwin"
        } else {
            env::consts::OS
        };
        let file_name = format!("{}{}", tool_name, env::consts::EXE_SUFFIX);

        [tools_dir.join(platform).join(&file_name), tools_dir.join(&file_name)]
            .into_iter()
            .find(|path| path.is_file())
    }

    fn find_in_system_path(tool_name: &str) -> Option<PathBuf> {
        let file_name = format!("{}{}", tool_name, env::consts::EXE_SUFFIX);
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths)
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    /// Resolve a tool, or explain how to install it
    pub fn check_tool_with_instructions(&self, tool_name: &str) -> Result<PathBuf, String> {
        self.resolve_tool(tool_name).ok_or_else(|| {
            format!(
                "Tool '{}' not found. Install it with: {}",
                tool_name,
                Self::install_instructions(tool_name)
            )
        })
    }

    fn install_instructions(tool_name: &str) -> String {
        match tool_name {
            "ffprobe" | "ffmpeg" => {
                if cfg!(target_os = "macos") {
                    "brew install ffmpeg".to_string()
                } else if cfg!(windows) {
                    "winget install ffmpeg".to_string()
                } else {
                    "sudo apt-get install ffmpeg".to_string()
                }
            }
            _ => format!("your package manager ({})", tool_name),
        }
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_tool_in_platform_folder() {
        let temp_dir = TempDir::new().unwrap();
        let platform = if cfg!(target_os = "macos") { "darwin" } else { env::consts::OS };
        let platform_dir = temp_dir.path().join(platform);
        std::fs::create_dir_all(&platform_dir).unwrap();
        let tool = platform_dir.join(format!("fakeprobe{}", env::consts::EXE_SUFFIX));
        std::fs::write(&tool, b"").unwrap();

        let resolver = ToolPathResolver::with_tools_dir(Some(temp_dir.path().to_path_buf()));
        assert_eq!(resolver.resolve_tool("fakeprobe"), Some(tool));
    }

    #[test]
    fn test_bundled_tool_in_root_folder() {
        let temp_dir = TempDir::new().unwrap();
        let tool = temp_dir.path().join(format!("otherprobe{}", env::consts::EXE_SUFFIX));
        std::fs::write(&tool, b"").unwrap();

        let resolver = ToolPathResolver::with_tools_dir(Some(temp_dir.path().to_path_buf()));
        assert_eq!(resolver.resolve_tool("otherprobe"), Some(tool));
    }

    #[test]
    fn test_missing_tool_has_instructions() {
        let resolver = ToolPathResolver::with_tools_dir(None);
        let err = resolver
            .check_tool_with_instructions("no-such-probe-tool-xyz")
            .unwrap_err();
        assert!(err.contains("no-such-probe-tool-xyz"));
    }
}
