//! App server management
//!
//! The TodoMVC build is static; any command that serves it on a port works.
//! The handle owns the child process and stops it on drop.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handle to a running app server
pub struct ServerHandle {
    child: Child,
    base_url: String,
    port: u16,
}

impl ServerHandle {
    /// Spawn the server and wait until it answers on `health_path`
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };

        let argv = config.argv(port);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| E2eError::Config("server command is empty".to_string()))?;

        info!("Starting app server on port {}: {}", port, argv.join(" "));

        let child = Command::new(program)
            .args(args)
            .current_dir(&config.work_dir)
            .env("PORT", port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| E2eError::ServerStartup(format!("cannot run {}: {}", program, e)))?;

        let mut handle = ServerHandle {
            child,
            base_url: format!("http://127.0.0.1:{}", port),
            port,
        };
        handle
            .wait_for_healthy(&config.health_path, config.startup_timeout())
            .await?;

        info!("App server ready at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll until the server answers with a success status.
    ///
    /// Gives up early if the process exits, reporting its stderr.
    async fn wait_for_healthy(&mut self, path: &str, timeout: Duration) -> E2eResult<()> {
        let url = format!("{}{}", self.base_url, path);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let deadline = Instant::now() + timeout;
        let mut attempts = 0;

        while Instant::now() < deadline {
            attempts += 1;

            if let Some(status) = self.child.try_wait()? {
                return Err(E2eError::ServerStartup(format!(
                    "server exited with {}: {}",
                    status,
                    self.stderr_output()
                )));
            }

            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => warn!("{} answered {}", url, resp.status()),
                // Refused connections are expected until the server binds
                Err(e) if e.is_connect() => debug!("{} not accepting connections yet", url),
                Err(e) => warn!("Health check of {} failed: {}", url, e),
            }

            sleep(POLL_INTERVAL).await;
        }

        Err(E2eError::ServerHealthCheck(attempts))
    }

    fn stderr_output(&mut self) -> String {
        let mut output = String::new();
        if let Some(stderr) = self.child.stderr.as_mut() {
            let _ = stderr.read_to_string(&mut output);
        }
        output.trim().to_string()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// SIGTERM, a short grace period, then kill
    pub fn stop(&mut self) -> E2eResult<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        info!("Stopping app server (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        if self.child.try_wait()?.is_none() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// How to start the app server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Command line; `{port}` is replaced with the chosen port
    pub command: Vec<String>,

    /// Directory the command runs in
    pub work_dir: PathBuf,

    /// Fixed port, or a free one when unset
    pub port: Option<u16>,

    /// Path polled until the server answers
    pub health_path: String,

    pub startup_timeout_secs: u64,
}

impl ServerConfig {
    /// Command line with the port substituted
    pub fn argv(&self, port: u16) -> Vec<String> {
        let port = port.to_string();
        self.command
            .iter()
            .map(|arg| arg.replace("{port}", &port))
            .collect()
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: ["npx", "serve", "--single", "--listen", "{port}", "build"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            work_dir: PathBuf::from("."),
            port: None,
            health_path: "/".to_string(),
            startup_timeout_secs: 30,
        }
    }
}

/// Ask the OS for an unused local port
pub fn find_free_port() -> E2eResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|e| E2eError::ServerStartup(format!("cannot bind a free port: {}", e)))?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port = find_free_port().unwrap();
        assert!(port > 1024);
    }

    #[test]
    fn test_port_placeholder_is_substituted() {
        let config = ServerConfig::default();
        let argv = config.argv(4321);
        assert_eq!(argv, ["npx", "serve", "--single", "--listen", "4321", "build"]);
    }

    #[tokio::test]
    async fn test_empty_command_is_config_error() {
        let config = ServerConfig {
            command: vec![],
            ..Default::default()
        };
        let err = ServerHandle::spawn(config).await.err().unwrap();
        assert!(matches!(err, E2eError::Config(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exiting_server_fails_fast() {
        let config = ServerConfig {
            command: vec!["sh".into(), "-c".into(), "echo boom >&2; exit 3".into()],
            startup_timeout_secs: 10,
            ..Default::default()
        };
        let start = Instant::now();
        let err = ServerHandle::spawn(config).await.err().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        match err {
            E2eError::ServerStartup(msg) => assert!(msg.contains("boom"), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
