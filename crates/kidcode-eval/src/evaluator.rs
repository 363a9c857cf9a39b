//! Tree-walking interpreter for [`Script`]s.

use std::panic::{catch_unwind, AssertUnwindSafe};

use kidcode_types::script::{BinOp, Call, Expr, ExprKind, Script};
use tracing::{trace, warn};

use crate::error::{ExecutionError, Fault};
use crate::host::{signature, HostApi, HostCall, Value};

/// Bounds on one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimits {
    /// Maximum evaluation steps (one per call and one per expression node).
    /// `None` runs to completion.
    pub max_steps: Option<u64>,
}

impl RunLimits {
    pub fn steps(max_steps: u64) -> Self {
        Self {
            max_steps: Some(max_steps),
        }
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Host calls made.
    pub calls: usize,
    pub steps: u64,
}

pub struct Evaluator<'h> {
    host: &'h mut dyn HostApi,
    limits: RunLimits,
    steps: u64,
    calls: usize,
}

impl<'h> Evaluator<'h> {
    pub fn new(host: &'h mut dyn HostApi, limits: RunLimits) -> Self {
        Self {
            host,
            limits,
            steps: 0,
            calls: 0,
        }
    }

    /// Run every call in order, stopping at the first fault.
    pub fn run(mut self, script: &Script) -> Result<RunReport, ExecutionError> {
        for call in &script.calls {
            self.call(call)
                .map_err(|fault| ExecutionError::fault(fault, call.span))?;
        }
        Ok(RunReport {
            calls: self.calls,
            steps: self.steps,
        })
    }

    /// Count one step against the limit.
    fn tick(&mut self) -> Result<(), Fault> {
        self.steps += 1;
        match self.limits.max_steps {
            Some(max) if self.steps > max => Err(Fault::StepLimit(max)),
            _ => Ok(()),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════════

    fn call(&mut self, call: &Call) -> Result<(), Fault> {
        self.tick()?;
        let sig = signature(&call.function)
            .ok_or_else(|| Fault::UnknownFunction(call.function.clone()))?;
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval(arg)?);
        }
        let bound = HostCall::bind(sig, args)?;
        trace!(call = %bound, "host call");
        self.calls += 1;
        let host = &mut *self.host;
        match catch_unwind(AssertUnwindSafe(|| bound.dispatch(host))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(Fault::Host {
                function: sig.name,
                message,
            }),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(function = sig.name, %message, "host panicked");
                Err(Fault::HostPanic {
                    function: sig.name,
                    message,
                })
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn eval(&mut self, expr: &Expr) -> Result<Value, Fault> {
        self.tick()?;
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::Text(s) => Ok(Value::Text(s.clone())),
            ExprKind::Paren(inner) => self.eval(inner),
            ExprKind::Neg(inner) => match self.eval(inner)? {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(Fault::Operand {
                    op: "-",
                    operand: other.type_name().to_string(),
                }),
            },
            ExprKind::Binary { left, op, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                binary(*op, l, r)
            }
        }
    }
}

/// `+` concatenates when either side is text; everything else is numeric.
fn binary(op: BinOp, left: Value, right: Value) -> Result<Value, Fault> {
    let (a, b) = match (op, left, right) {
        (BinOp::Add, Value::Number(a), Value::Number(b)) => (a, b),
        (BinOp::Add, l, r) => return Ok(Value::Text(format!("{l}{r}"))),
        (_, Value::Number(a), Value::Number(b)) => (a, b),
        (op, l, r) => {
            return Err(Fault::Operand {
                op: op.symbol(),
                operand: format!("{} and {}", l.type_name(), r.type_name()),
            })
        }
    };
    let n = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div if b == 0.0 => return Err(Fault::DivisionByZero),
        BinOp::Div => a / b,
    };
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(Fault::Overflow(op.symbol()))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
