//! Kidcode sandbox: runs generated program text.
//!
//! Text is lexed and parsed into a [`Script`](kidcode_types::script::Script)
//! and interpreted against a closed table of host functions. Nothing in the
//! text is ever evaluated as code of any other language; a name outside
//! [`HOST_FUNCTIONS`] faults when reached.
//!
//! ```text
//! moveActor("RIGHT", 50)     → host.move_actor("RIGHT", 50.0)
//! actorSay("Hi " + 2 * 3)    → host.actor_say("Hi 6")
//! ```
//!
//! Runs are synchronous: every call reaches the host before the next one
//! is evaluated, and the first fault stops the run.

pub mod error;
pub mod evaluator;
pub mod host;
pub mod scheduler;
pub mod tune;

pub use error::{ExecutionError, Fault};
pub use evaluator::{Evaluator, RunLimits, RunReport};
pub use host::{
    signature, HostApi, HostCall, HostResult, HostSignature, ParamType, RecordingHost, Value,
    HOST_FUNCTIONS,
};
pub use scheduler::{Scheduler, TaskId};

use kidcode_parser::parse_source;
use kidcode_types::SourceFile;
use tracing::{debug, warn};

/// Run `text` with no step limit.
pub fn run(text: &str, host: &mut dyn HostApi) -> Result<RunReport, ExecutionError> {
    run_with_limits(text, host, RunLimits::default())
}

/// Run `text`, stopping with [`Fault::StepLimit`] once `limits` are spent.
pub fn run_with_limits(
    text: &str,
    host: &mut dyn HostApi,
    limits: RunLimits,
) -> Result<RunReport, ExecutionError> {
    let source = SourceFile::new("program", text);
    let script = parse_source(&source).map_err(ExecutionError::syntax)?;
    let result = Evaluator::new(host, limits).run(&script);
    match &result {
        Ok(report) => debug!(calls = report.calls, steps = report.steps, "run finished"),
        Err(err) => warn!(code = %err.code, line = ?err.line(), "run faulted: {}", err.message),
    }
    result
}
