//! Server configuration
//!
//! Bind address plus the channel and framing limits used by the actor and
//! the connection handlers.

use std::time::Duration;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Environment variable consulted when no address argument is given
pub const ADDR_ENV_VAR: &str = "CHAT_RELAY_ADDR";

/// Channel buffer size for server commands
const COMMAND_BUFFER_SIZE: usize = 256;

/// Per-session outbound queue length
const OUTBOUND_BUFFER_SIZE: usize = 64;

/// Longest accepted inbound line, in bytes
const MAX_LINE_LENGTH: usize = 8 * 1024;

/// How long a closing session's writer may keep flushing
const CLOSE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub command_buffer: usize,
    pub outbound_buffer: usize,
    pub max_line_length: usize,
    pub close_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            command_buffer: COMMAND_BUFFER_SIZE,
            outbound_buffer: OUTBOUND_BUFFER_SIZE,
            max_line_length: MAX_LINE_LENGTH,
            close_grace: CLOSE_GRACE,
        }
    }
}

impl ServerConfig {
    /// Build from the process arguments and environment
    pub fn from_env() -> Self {
        Self::resolve(std::env::args().nth(1), std::env::var(ADDR_ENV_VAR).ok())
    }

    /// Bind address precedence: CLI argument, then environment, then default
    pub fn resolve(arg_addr: Option<String>, env_addr: Option<String>) -> Self {
        let non_blank = |addr: &String| !addr.trim().is_empty();
        let bind_addr = arg_addr
            .filter(non_blank)
            .or(env_addr.filter(non_blank))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        Self {
            bind_addr,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addr() {
        let config = ServerConfig::resolve(None, None);
        assert_eq!(config.bind_addr, DEFAULT_ADDR);
        assert_eq!(config.command_buffer, 256);
    }

    #[test]
    fn test_arg_beats_env() {
        let config = ServerConfig::resolve(
            Some("0.0.0.0:9000".to_string()),
            Some("0.0.0.0:9001".to_string()),
        );
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_env_used_without_arg() {
        let config = ServerConfig::resolve(None, Some("0.0.0.0:9001".to_string()));
        assert_eq!(config.bind_addr, "0.0.0.0:9001");
    }

    #[test]
    fn test_blank_addr_falls_back() {
        let config = ServerConfig::resolve(Some("  ".to_string()), None);
        assert_eq!(config.bind_addr, DEFAULT_ADDR);
    }
}
