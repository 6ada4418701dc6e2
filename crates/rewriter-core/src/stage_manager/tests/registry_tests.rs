use std::rc::Rc;

use crate::stage_manager::core_stages::{LineGenerator, TraceTransformer, EVENT_LOG_SERIALIZER, LINES_GENERATOR, TRACE_TRANSFORMER};
use crate::stage_manager::descriptor::{PipelineDescription, StageDescriptor};
use crate::stage_manager::error::StageSystemError;
use crate::stage_manager::registry::{ResolvedStage, StageFactory, StageRegistry};
use crate::stage_manager::{generator_handle, transformer_handle, StageRole, TransformerHandle};

fn trace_handle() -> TransformerHandle {
    transformer_handle(TraceTransformer::new())
}

#[test]
fn test_registry_initialization() {
    let registry = StageRegistry::new();
    assert_eq!(registry.count(), 0);
    assert!(registry.type_names(StageRole::Generator).is_empty());
    assert!(registry.injected_transformers().is_empty());
}

#[test]
fn test_core_stages_are_registered() {
    let registry = StageRegistry::with_core_stages().expect("core stages register cleanly");

    assert_eq!(registry.count(), 3);
    assert!(registry.has_stage(StageRole::Generator, LINES_GENERATOR));
    assert!(registry.has_stage(StageRole::Transformer, TRACE_TRANSFORMER));
    assert!(registry.has_stage(StageRole::Serializer, EVENT_LOG_SERIALIZER));
    assert!(!registry.has_stage(StageRole::Serializer, LINES_GENERATOR));
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut registry = StageRegistry::new();
    registry
        .register_generator("lines", || generator_handle(LineGenerator::new()))
        .expect("first registration succeeds");

    let err = registry
        .register_generator("lines", || generator_handle(LineGenerator::new()))
        .expect_err("duplicate must fail");
    assert!(matches!(
        err,
        StageSystemError::StageAlreadyExists { role: StageRole::Generator, ref type_name } if type_name == "lines"
    ));

    // Same name under another role is a different stage
    registry
        .register_transformer("lines", trace_handle)
        .expect("roles have separate namespaces");
    assert_eq!(registry.count(), 2);
}

#[test]
fn test_type_names_are_sorted() {
    let mut registry = StageRegistry::new();
    for name in ["zeta", "alpha", "mid"] {
        registry.register_transformer(name, trace_handle).expect("unique names register");
    }
    assert_eq!(registry.type_names(StageRole::Transformer), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_resolve_creates_fresh_instances() {
    let registry = StageRegistry::with_core_stages().expect("core stages register cleanly");

    let first = registry.resolve_transformer(TRACE_TRANSFORMER).expect("trace is registered");
    let second = registry.resolve_transformer(TRACE_TRANSFORMER).expect("trace is registered");
    assert!(!Rc::ptr_eq(&first, &second));
    assert_eq!(first.borrow().type_name(), TRACE_TRANSFORMER);

    assert!(registry.resolve_serializer("bogus-ser").is_none());
}

#[test]
fn test_resolve_by_role_reports_missing_stage() {
    let registry = StageRegistry::with_core_stages().expect("core stages register cleanly");

    assert!(matches!(registry.resolve(StageRole::Generator, LINES_GENERATOR), ResolvedStage::Generator(_)));
    match registry.resolve(StageRole::Serializer, "bogus-ser") {
        ResolvedStage::NotFound { role, type_name } => {
            assert_eq!(role, StageRole::Serializer);
            assert_eq!(type_name, "bogus-ser");
        }
        _ => panic!("bogus-ser should not resolve"),
    }
}

#[test]
fn test_injected_transformers_split_by_ranking() {
    let mut registry = StageRegistry::new();
    registry.register_injected_transformer("late", 10, trace_handle).expect("registers");
    registry.register_injected_transformer("early", -10, trace_handle).expect("registers");
    registry.register_injected_transformer("tied-first", 0, trace_handle).expect("registers");
    registry.register_injected_transformer("earliest", -20, trace_handle).expect("registers");
    registry.register_injected_transformer("tied-second", 0, trace_handle).expect("registers");

    let (pre, post) = registry.injected_type_names();
    assert_eq!(pre, vec!["earliest", "early"]);
    assert_eq!(post, vec!["tied-first", "tied-second", "late"]);

    let injected = registry.injected_transformers();
    assert_eq!(injected.pre.len(), 2);
    assert_eq!(injected.post.len(), 3);
    assert_eq!(injected.len(), 5);
}

#[test]
fn test_injected_transformer_names_are_unique() {
    let mut registry = StageRegistry::new();
    registry.register_injected_transformer("audit", -1, trace_handle).expect("registers");

    let err = registry
        .register_injected_transformer("audit", 5, trace_handle)
        .expect_err("duplicate injected name must fail");
    assert!(matches!(err, StageSystemError::StageAlreadyExists { role: StageRole::Transformer, .. }));
}

#[test]
fn test_injected_transformers_are_fresh_per_invocation() {
    let mut registry = StageRegistry::new();
    registry.register_injected_transformer("audit", -1, trace_handle).expect("registers");

    let first = registry.injected_transformers();
    let second = registry.injected_transformers();
    assert!(!Rc::ptr_eq(&first.pre[0], &second.pre[0]));
}

#[test]
fn test_validate_reports_chain_with_injected_stages() {
    let mut registry = StageRegistry::with_core_stages().expect("core stages register cleanly");
    registry.register_injected_transformer("audit", -1, trace_handle).expect("registers");

    let description = PipelineDescription::new(StageDescriptor::new(LINES_GENERATOR), StageDescriptor::new(EVENT_LOG_SERIALIZER))
        .with_transformer(StageDescriptor::new(TRACE_TRANSFORMER));

    let chain = registry.validate(&description).expect("all stages resolve");
    assert_eq!(
        chain,
        vec![
            (StageRole::Generator, LINES_GENERATOR.to_string()),
            (StageRole::Transformer, "audit".to_string()),
            (StageRole::Transformer, TRACE_TRANSFORMER.to_string()),
            (StageRole::Serializer, EVENT_LOG_SERIALIZER.to_string()),
        ]
    );
}

#[test]
fn test_validate_rejects_unknown_serializer() {
    let registry = StageRegistry::with_core_stages().expect("core stages register cleanly");
    let description = PipelineDescription::new(StageDescriptor::new(LINES_GENERATOR), StageDescriptor::new("bogus-ser"));

    let err = registry.validate(&description).expect_err("unknown serializer must fail");
    assert_eq!(err.to_string(), "Unable to get serializer component with type 'bogus-ser'");
}
