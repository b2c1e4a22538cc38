//! Test: Spec Validation - invalid pipeline definitions are rejected up front

use crate::helpers::*;
use crew_pipeline::core::{ModelParams, PipelineSpec, PipelineStepSpec, SpecError};

#[test]
fn test_forward_reference_rejected() {
    let result = PipelineSpec::new(
        "forward",
        vec![
            step("a", "Usa {{ steps.b.output }}").depends_on(["b"]),
            step("b", "Tema: {{ topic }}"),
        ],
    );

    assert_eq!(
        result.unwrap_err(),
        SpecError::ForwardReference {
            step: "a".to_string(),
            dependency: "b".to_string(),
        }
    );
}

#[test]
fn test_self_reference_is_a_forward_reference() {
    let result = PipelineSpec::new("self", vec![step("a", "{{ topic }}").depends_on(["a"])]);
    assert!(matches!(result, Err(SpecError::ForwardReference { .. })));
}

#[test]
fn test_template_reference_must_be_declared() {
    let result = PipelineSpec::new(
        "undeclared",
        vec![step("a", "{{ topic }}"), step("b", "Usa {{ steps.a.output }}")],
    );

    assert_eq!(
        result.unwrap_err(),
        SpecError::UndeclaredDependency {
            step: "b".to_string(),
            dependency: "a".to_string(),
        }
    );
}

#[test]
fn test_duplicate_and_empty_rejected() {
    let duplicate = PipelineSpec::new("dup", vec![step("a", "{{ topic }}"), step("a", "{{ topic }}")]);
    assert_eq!(duplicate.unwrap_err(), SpecError::DuplicateStep("a".to_string()));

    let empty = PipelineSpec::new("empty", Vec::new());
    assert_eq!(empty.unwrap_err(), SpecError::Empty("empty".to_string()));
}

#[test]
fn test_zero_max_tokens_rejected() {
    let bad = PipelineStepSpec::new("a", "role", "{{ topic }}", ModelParams::new("m", 0.5, 0));
    let result = PipelineSpec::new("tokens", vec![bad]);
    assert!(matches!(result, Err(SpecError::ZeroMaxTokens { step }) if step == "a"));
}

#[test]
fn test_valid_chain_keeps_order() {
    let spec = PipelineSpec::new(
        "valid",
        vec![
            step("a", "{{ topic }}"),
            step("b", "{{ steps.a.output }}").depends_on(["a"]),
            step("c", "{{ steps.a.output }} {{ steps.b.output }}").depends_on(["a", "b"]),
        ],
    )
    .unwrap();

    let names: Vec<_> = spec.steps().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(spec.final_step().name, "c");
    assert!(spec.step("b").is_some());
}
