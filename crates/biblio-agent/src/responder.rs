//! The persistent receive-dispatch loop shared by sellers and clerks.

use std::future::Future;
use std::time::Duration;

use biblio_platform::{AgentContext, NotificationCategory};
use biblio_proto::{Capability, Message, Template};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};

/// How long one idle wait lasts before the loop re-arms it.
const IDLE_WAIT: Duration = Duration::from_secs(60);

/// A long-lived agent that answers requests.
///
/// Handlers run one at a time on the responder's own task, so a handler
/// that checks and then mutates state cannot interleave with another
/// request.
pub trait Responder: Send + 'static {
    /// Capability advertised in the directory.
    fn capability(&self) -> Capability;

    /// Name shown to observers.
    fn display_name(&self) -> String;

    /// Messages this responder consumes.
    fn template(&self) -> Template {
        Template::Any
    }

    /// Handles one message.
    ///
    /// An error drops the message; the loop keeps going.
    fn handle(&mut self, ctx: &AgentContext, message: Message) -> impl Future<Output = Result<()>> + Send;

    /// Called once after the loop stops, before deregistration.
    fn on_shutdown(&mut self, _ctx: &AgentContext) {}
}

/// Registers `responder`, announces it and spawns its loop.
///
/// Registration happens before this returns, so initiators started
/// afterwards can discover the responder.
///
/// # Errors
///
/// Returns an error if registration fails.
pub fn start<R: Responder>(
    responder: R,
    ctx: AgentContext,
    cancel: CancellationToken,
) -> Result<JoinHandle<Result<R>>> {
    let name = responder.display_name();
    if let Err(e) = ctx.register(&responder.capability(), &name) {
        ctx.detach();
        return Err(e.into());
    }
    ctx.notify(NotificationCategory::New, format!("{name} ready"));
    info!(agent = %ctx.id(), capability = %responder.capability(), "Responder started");
    Ok(tokio::spawn(serve(responder, ctx, cancel)))
}

/// Runs the receive-dispatch loop until `cancel` fires, then deregisters.
///
/// Returns the responder so its final state can be inspected.
pub async fn serve<R: Responder>(
    mut responder: R,
    ctx: AgentContext,
    cancel: CancellationToken,
) -> Result<R> {
    let template = responder.template();
    loop {
        // Messages already queued are handled before a stop request.
        tokio::select! {
            biased;
            received = ctx.receive_within(&template, IDLE_WAIT) => {
                let Some(message) = received else { continue };
                debug!(agent = %ctx.id(), message = %message, "Handling");
                if let Err(e) = responder.handle(&ctx, message).await {
                    match &e {
                        AgentError::Proto(_) => {
                            warn!(agent = %ctx.id(), error = %e, "Dropped malformed message");
                        }
                        _ => warn!(agent = %ctx.id(), error = %e, "Handler failed"),
                    }
                }
            }
            () = cancel.cancelled() => break,
        }
    }

    responder.on_shutdown(&ctx);
    ctx.notify(NotificationCategory::End, format!("{} closing", responder.display_name()));
    info!(agent = %ctx.id(), "Responder stopped");
    ctx.detach();
    Ok(responder)
}
