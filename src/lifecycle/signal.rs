//! Termination signal handling.

#[cfg(not(unix))]
use tracing::error;

use crate::error::{Error, Result};

/// Resolves when SIGINT or SIGTERM arrives
///
/// Both handlers are registered by [`ShutdownSignal::install`], so a signal
/// delivered before [`ShutdownSignal::recv`] is first polled is still
/// observed instead of taking the default action.
#[derive(Debug)]
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    /// Register the handlers.
    ///
    /// Fails when there is no runtime or a handler cannot be registered;
    /// both are fatal at startup.
    pub fn install() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map_err(|e| Error::FatalStartup(format!("no async runtime: {}", e)))?;

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let interrupt = signal(SignalKind::interrupt()).map_err(|e| {
                Error::FatalStartup(format!("cannot install SIGINT handler: {}", e))
            })?;
            let terminate = signal(SignalKind::terminate()).map_err(|e| {
                Error::FatalStartup(format!("cannot install SIGTERM handler: {}", e))
            })?;
            Ok(Self {
                interrupt,
                terminate,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for a termination request and return the signal name.
    pub async fn recv(self) -> &'static str {
        #[cfg(unix)]
        {
            let Self {
                mut interrupt,
                mut terminate,
            } = self;
            tokio::select! {
                _ = interrupt.recv() => "SIGINT",
                _ = terminate.recv() => "SIGTERM",
            }
        }

        #[cfg(not(unix))]
        {
            match tokio::signal::ctrl_c().await {
                Ok(()) => "SIGINT",
                Err(e) => {
                    error!("Failed to listen for SIGINT: {}", e);
                    std::future::pending().await
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::process::Command;
    use std::time::Duration;

    fn raise(name: &str) {
        let status = Command::new("kill")
            .args([format!("-{}", name), std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());
    }

    // Both signals share one test: a delivery reaches every live listener in
    // the process, so separate tests could observe each other's signals.
    #[tokio::test]
    async fn test_signals_before_recv_are_observed() {
        let signal = ShutdownSignal::install().unwrap();
        raise("INT");
        let name = tokio::time::timeout(Duration::from_secs(5), signal.recv())
            .await
            .unwrap();
        assert_eq!(name, "SIGINT");

        let signal = ShutdownSignal::install().unwrap();
        raise("TERM");
        let name = tokio::time::timeout(Duration::from_secs(5), signal.recv())
            .await
            .unwrap();
        assert_eq!(name, "SIGTERM");
    }

    #[test]
    fn test_install_requires_runtime() {
        assert_matches!(ShutdownSignal::install(), Err(Error::FatalStartup(_)));
    }
}
