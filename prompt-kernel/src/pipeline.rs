//! Manual chaining: each stage's output becomes the next stage's input.

use tracing::{debug, warn};

use crate::error::KernelResult;
use crate::function::PromptFunction;
use crate::kernel::Kernel;

/// Ordered list of prompt functions run one after another.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    stages: Vec<PromptFunction>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, function: PromptFunction) -> Self {
        self.stages.push(function);
        self
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[PromptFunction] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns whether the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage in order, threading outputs into inputs verbatim.
    ///
    /// # Errors
    ///
    /// Stops at the first failing stage and returns its error unchanged.
    pub async fn run(&self, kernel: &Kernel, input: impl Into<String>) -> KernelResult<PipelineRun> {
        let input = input.into();
        let mut outputs: Vec<StageOutput> = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter().enumerate() {
            let current = outputs.last().map_or(input.as_str(), |prev| prev.output.as_str());
            debug!(index, stage = stage.name(), input_len = current.len(), "running pipeline stage");

            let output = kernel.invoke(stage, current).await.inspect_err(|err| {
                warn!(index, stage = stage.name(), error = %err, "pipeline stopped");
            })?;

            outputs.push(StageOutput {
                name: stage.name().to_owned(),
                output,
            });
        }

        Ok(PipelineRun { input, outputs })
    }
}

/// Output of a single pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageOutput {
    name: String,
    output: String,
}

impl StageOutput {
    /// Returns the stage (function) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the text the stage produced.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }
}

/// Result of a completed pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineRun {
    input: String,
    outputs: Vec<StageOutput>,
}

impl PipelineRun {
    /// Returns the initial input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns every stage's output in execution order.
    #[must_use]
    pub fn outputs(&self) -> &[StageOutput] {
        &self.outputs
    }

    /// Returns the last stage's output, or the input for an empty pipeline.
    #[must_use]
    pub fn final_output(&self) -> &str {
        self.outputs
            .last()
            .map_or(self.input.as_str(), |stage| stage.output.as_str())
    }

    /// Consumes the run and returns the final output.
    #[must_use]
    pub fn into_final_output(self) -> String {
        match self.outputs.into_iter().last() {
            Some(stage) => stage.output,
            None => self.input,
        }
    }
}
