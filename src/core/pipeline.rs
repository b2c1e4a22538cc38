//! Pipeline definition

use crate::core::error::SpecError;
use crate::core::step::PipelineStepSpec;
use std::collections::HashSet;

/// An ordered, validated sequence of steps
///
/// Every `depends_on` entry of step *i* names a step at an index below *i*,
/// step names are unique and the sequence is non-empty, so the last step's
/// output is always the pipeline result.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    name: String,
    steps: Vec<PipelineStepSpec>,
}

impl PipelineSpec {
    /// Validate and build a pipeline spec
    pub fn new(name: impl Into<String>, steps: Vec<PipelineStepSpec>) -> Result<Self, SpecError> {
        let name = name.into();
        Self::validate(&name, &steps)?;
        Ok(Self { name, steps })
    }

    fn validate(name: &str, steps: &[PipelineStepSpec]) -> Result<(), SpecError> {
        if steps.is_empty() {
            return Err(SpecError::Empty(name.to_string()));
        }

        let mut earlier: HashSet<&str> = HashSet::new();
        for step in steps {
            if earlier.contains(step.name.as_str()) {
                return Err(SpecError::DuplicateStep(step.name.clone()));
            }

            for dep in &step.depends_on {
                if !earlier.contains(dep.as_str()) {
                    return Err(SpecError::ForwardReference {
                        step: step.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }

            for referenced in step.template.step_references() {
                if !step.depends_on.contains(&referenced) {
                    return Err(SpecError::UndeclaredDependency {
                        step: step.name.clone(),
                        dependency: referenced,
                    });
                }
            }

            if step.model_params.max_output_tokens == 0 {
                return Err(SpecError::ZeroMaxTokens {
                    step: step.name.clone(),
                });
            }

            earlier.insert(step.name.as_str());
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[PipelineStepSpec] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&PipelineStepSpec> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// The step whose output is the pipeline result
    pub fn final_step(&self) -> &PipelineStepSpec {
        // Non-empty by construction
        &self.steps[self.steps.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
