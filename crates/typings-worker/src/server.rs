// typings-worker/src/server.rs
// Worker loop: read a request, answer it, repeat until the parent goes away
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info};
use typings_common::WorkerConfig;

use crate::collab::{ModuleInspector, NullInspector, PassiveResolver, TypingsResolver};
use crate::exec::{CommandRunner, ShellRunner};
use crate::handler::Dispatcher;
use crate::install::Installer;
use crate::ipc::{read_request, write_response};
use crate::log::FileLog;
use crate::setup;

/// Worker process state: the dispatcher plus whatever setup left pending
pub struct Worker {
    dispatcher: Dispatcher,
}

impl Worker {
    /// Create a worker that shells out to npm and uses the default collaborators
    pub fn new(config: WorkerConfig) -> Self {
        let log = FileLog::new(config.log_file.clone());
        Self::with_parts(
            config,
            log,
            Box::new(ShellRunner),
            Box::new(PassiveResolver),
            Box::new(NullInspector),
        )
    }

    /// Create a worker from explicit parts and run setup.
    ///
    /// A setup failure does not fail construction; it is delivered ahead of
    /// the first response.
    pub fn with_parts(
        config: WorkerConfig,
        mut log: FileLog,
        runner: Box<dyn CommandRunner>,
        resolver: Box<dyn TypingsResolver>,
        inspector: Box<dyn ModuleInspector>,
    ) -> Self {
        if log.is_enabled() {
            log.write_line(&format!(
                "Global cache location '{}', safe file path '{}', types map path '{}'",
                config.global_cache_location.display(),
                display_optional(config.typing_safe_list_location.as_deref()),
                display_optional(config.types_map_location.as_deref()),
            ));
        }

        let mut installer = Installer::new(config, log, runner);
        let pending_failure = setup::initialize(&mut installer);

        Self {
            dispatcher: Dispatcher::new(installer, pending_failure, resolver, inspector),
        }
    }

    pub fn dispatcher(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Serve requests until the parent disconnects.
    ///
    /// Returns `Ok(())` on disconnect and an error on a protocol violation.
    pub async fn run<R, W>(&mut self, reader: &mut R, writer: &mut W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Typings worker ready");

        loop {
            let request = match read_request(reader).await {
                Ok(Some(request)) => request,
                Ok(None) => {
                    self.log_shutdown();
                    return Ok(());
                }
                Err(e) => {
                    error!("Fatal channel error: {:#}", e);
                    let log = self.dispatcher.installer().log();
                    if log.is_enabled() {
                        log.write_line(&format!("Fatal channel error: {}, {:?}", e, e));
                    }
                    return Err(e);
                }
            };

            for response in self.dispatcher.dispatch(request) {
                if let Err(e) = write_response(writer, &response).await {
                    if is_disconnect(&e) {
                        self.log_shutdown();
                        return Ok(());
                    }
                    return Err(e);
                }
            }
        }
    }

    fn log_shutdown(&mut self) {
        info!("Parent process has exited, shutting down...");
        let log = self.dispatcher.installer().log();
        if log.is_enabled() {
            log.write_line("Parent process has exited, shutting down...");
        }
    }
}

fn display_optional(path: Option<&std::path::Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

fn is_disconnect(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::BrokenPipe)
    })
}
