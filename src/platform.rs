//! # Platform-specific utilities
//!
//! Questo modulo centralizza la risoluzione cross-platform del tool esterno
//! usato per il probe della durata (ffprobe), bundled o di sistema.

use crate::tool_resolver::ToolPathResolver;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Platform-specific command manager with tool resolution
pub struct PlatformCommands {
    tool_resolver: ToolPathResolver,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(|| Self {
            tool_resolver: ToolPathResolver::new(),
        })
    }

    /// Resolved path, or an install hint when the tool is missing
    pub fn require_tool(&self, base_name: &str) -> Result<PathBuf, String> {
        self.tool_resolver.check_tool_with_instructions(base_name)
    }

    /// Get system information for debugging
    pub fn system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl std::fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}
