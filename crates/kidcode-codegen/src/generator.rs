//! The generator walk: roots in order, each statement chain top to bottom,
//! value inputs resolved recursively.

use kidcode_graph::{BlockInstance, ProgramGraph};
use kidcode_registry::BlockRegistry;
use kidcode_types::{BlockId, BlockTypeSchema};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emitter::{Emitter, EmitterTable, Expression, Fragment, Inputs};
use crate::error::{CodegenError, CodegenResult};
use crate::source_map::SourceMap;

/// What to emit for a value socket with nothing connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyInputPolicy {
    /// Use the emitter's default (`""` or `0`).
    #[default]
    UseDefault,
    /// Fail with [`CodegenError::EmptyInput`].
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub empty_input: EmptyInputPolicy,
}

/// Generate program text for `graph`.
///
/// One line per statement block, each terminated by `\n`; chains in root
/// order. Roots that are lone value blocks produce nothing. Either the
/// whole text is produced or an error is returned.
pub fn generate(
    graph: &ProgramGraph,
    registry: &BlockRegistry,
    emitters: &EmitterTable,
    options: GenerateOptions,
) -> CodegenResult<String> {
    generate_with_source_map(graph, registry, emitters, options).map(|(text, _)| text)
}

/// [`generate`], also returning which block produced each line.
pub fn generate_with_source_map(
    graph: &ProgramGraph,
    registry: &BlockRegistry,
    emitters: &EmitterTable,
    options: GenerateOptions,
) -> CodegenResult<(String, SourceMap)> {
    let mut gen = Generator {
        graph,
        registry,
        emitters,
        options,
        text: String::new(),
        line: 0,
        source_map: SourceMap::new(),
    };
    gen.run()?;
    debug!(lines = gen.line, "program text generated");
    Ok((gen.text, gen.source_map))
}

// ══════════════════════════════════════════════════════════════════════════════
// Generator
// ══════════════════════════════════════════════════════════════════════════════

struct Generator<'a> {
    graph: &'a ProgramGraph,
    registry: &'a BlockRegistry,
    emitters: &'a EmitterTable,
    options: GenerateOptions,
    text: String,
    /// Lines written so far.
    line: u32,
    source_map: SourceMap,
}

impl<'a> Generator<'a> {
    fn run(&mut self) -> CodegenResult<()> {
        for &root in self.graph.roots() {
            let (block, schema, _) = self.resolve(root)?;
            if schema.output.is_some() {
                continue;
            }
            let mut cur = Some(block.id());
            while let Some(id) = cur {
                cur = self.statement(id)?;
            }
        }
        Ok(())
    }

    /// Block, schema and emitter for `id`.
    fn resolve(
        &self,
        id: BlockId,
    ) -> CodegenResult<(&'a BlockInstance, &'a BlockTypeSchema, &'a dyn Emitter)> {
        let block = self
            .graph
            .block(id)
            .ok_or_else(|| CodegenError::Internal(format!("block {id} is missing")))?;
        let unknown = || CodegenError::UnknownType {
            block: id,
            type_id: block.type_id().to_string(),
        };
        let schema = self.registry.get(block.type_id()).ok_or_else(unknown)?;
        let emitter = self.emitters.get(block.type_id()).ok_or_else(unknown)?;
        Ok((block, schema, emitter))
    }

    /// Emit one statement; returns the next block in the chain.
    fn statement(&mut self, id: BlockId) -> CodegenResult<Option<BlockId>> {
        let (block, schema, emitter) = self.resolve(id)?;
        let inputs = self.inputs(block, schema, emitter)?;
        let lines = match emitter.emit(block, &inputs)? {
            Fragment::Lines(lines) => lines,
            Fragment::Expression(_) => {
                return Err(CodegenError::Internal(format!(
                    "statement block {id} ({}) emitted an expression",
                    block.type_id()
                )))
            }
        };
        for line in lines {
            self.line += 1;
            self.source_map.push(self.line, id, block.type_id());
            self.text.push_str(&line);
            self.text.push('\n');
        }
        Ok(block.next())
    }

    fn expression(&self, id: BlockId) -> CodegenResult<Expression> {
        let (block, schema, emitter) = self.resolve(id)?;
        if schema.output.is_none() {
            return Err(CodegenError::Internal(format!(
                "block {id} ({}) is bound as a value but has no output",
                block.type_id()
            )));
        }
        let inputs = self.inputs(block, schema, emitter)?;
        match emitter.emit(block, &inputs)? {
            Fragment::Expression(expr) => Ok(expr),
            Fragment::Lines(_) => Err(CodegenError::Internal(format!(
                "value block {id} ({}) emitted statements",
                block.type_id()
            ))),
        }
    }

    /// Resolve every value socket in schema order.
    fn inputs(
        &self,
        block: &BlockInstance,
        schema: &BlockTypeSchema,
        emitter: &dyn Emitter,
    ) -> CodegenResult<Inputs> {
        let mut inputs = Inputs::default();
        for (socket, accepts) in schema.value_sockets() {
            let code = match block.input(socket) {
                Some(child) => self
                    .expression(child)?
                    .wrap(emitter.input_tier(block, socket)),
                None => match self.options.empty_input {
                    EmptyInputPolicy::UseDefault => emitter.empty_input(socket, accepts).code,
                    EmptyInputPolicy::Reject => {
                        return Err(CodegenError::EmptyInput {
                            block: block.id(),
                            socket: socket.to_string(),
                        })
                    }
                },
            };
            inputs.push(socket, code);
        }
        Ok(inputs)
    }
}
