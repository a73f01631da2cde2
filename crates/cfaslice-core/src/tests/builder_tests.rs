use super::fixtures::{diamond_call, loop_carried};
use crate::builder::ModuleBuilder;
use crate::instructions::Instruction;
use crate::types::Type;
use crate::values::ValueKind;
use crate::IrError;
use pretty_assertions::assert_eq;

#[test]
fn test_block_without_terminator_is_rejected() {
    let mut mb = ModuleBuilder::new("m");
    let mut f = mb.function("f", vec![Type::Ptr], Type::Void);
    let p = f.param(0);
    let entry = f.block("entry");
    f.at(entry).bitcast(p);
    f.finish();

    let err = mb.build().unwrap_err();
    assert!(matches!(err, IrError::BuilderError(ref msg) if msg.contains("terminator")));
}

#[test]
fn test_empty_block_is_rejected() {
    let mut mb = ModuleBuilder::new("m");
    let mut f = mb.function("f", vec![], Type::Void);
    f.block("entry");
    f.finish();

    assert!(matches!(mb.build(), Err(IrError::BuilderError(_))));
}

#[test]
fn test_duplicate_function_name_is_rejected() {
    let mut mb = ModuleBuilder::new("m");
    mb.declare_function("twice", vec![], Type::Void);
    mb.declare_function("twice", vec![], Type::Void);

    let err = mb.build().unwrap_err();
    assert!(err.to_string().contains("@twice"));
}

#[test]
fn test_declarations_have_no_body() {
    let mut mb = ModuleBuilder::new("m");
    let ext = mb.declare_function("ext", vec![Type::Int(32)], Type::Void);
    let module = mb.build().unwrap();

    let ext = module.function(ext);
    assert!(ext.is_declaration());
    assert_eq!(ext.params.len(), 1);
    assert!(matches!(
        module.kind(ext.params[0]),
        ValueKind::Argument { index: 0, .. }
    ));
}

#[test]
fn test_users_follow_operands() {
    let fx = loop_carried();
    let m = &fx.module;

    assert_eq!(m.users(fx.p), &[fx.phi]);
    assert!(m.users(fx.phi).contains(&fx.next));
    assert!(m.users(fx.phi).contains(&fx.call));
    assert_eq!(m.users(fx.next), &[fx.phi]);
    assert!(m.users(fx.call).is_empty());
}

#[test]
fn test_predecessors_follow_terminators() {
    let fx = loop_carried();
    let m = &fx.module;
    let header = m.block_of(fx.phi).unwrap();
    let body = m.block_of(fx.next).unwrap();
    let entry = m.block_of(fx.entry_br).unwrap();

    assert_eq!(m.predecessors(header), &[entry, body]);
    assert_eq!(m.predecessors(body), &[header]);
    assert!(m.predecessors(entry).is_empty());
    assert_eq!(m.terminator(body), Some(fx.body_br));
}

#[test]
fn test_diamond_merge_has_both_arms_as_predecessors() {
    let fx = diamond_call();
    let m = &fx.module;
    let merge = m.block_of(fx.merged).unwrap();
    let preds: Vec<_> = m
        .predecessors(merge)
        .iter()
        .map(|b| m.block(*b).label())
        .collect();

    assert_eq!(preds, vec!["then".to_string(), "else".to_string()]);
}

#[test]
fn test_find_value_by_name() {
    let fx = loop_carried();
    let m = &fx.module;

    assert_eq!(m.find_value(fx.f, "p"), Some(fx.p));
    assert_eq!(m.find_value(fx.f, "%fp"), Some(fx.phi));
    assert_eq!(m.find_value(fx.f, "next"), Some(fx.next));
    assert!(matches!(
        m.require_value(fx.f, "missing"),
        Err(IrError::ValueNotFound(_))
    ));
}

#[test]
fn test_function_lookup_and_counts() {
    let fx = diamond_call();
    let m = &fx.module;

    assert_eq!(m.function_count(), 2);
    assert_eq!(m.require_function("main").unwrap().id, fx.main);
    assert!(matches!(
        m.require_function("nope"),
        Err(IrError::FunctionNotFound(_))
    ));
    assert_eq!(m.function(fx.main).block_count(), 4);
    assert_eq!(m.instruction_count(fx.callee), 2);
    assert_eq!(m.return_instructions(fx.callee), vec![fx.callee_ret]);
}

#[test]
fn test_call_result_takes_callee_return_type() {
    let fx = diamond_call();
    let m = &fx.module;

    assert_eq!(m.ty(fx.call), &Type::Int(32));
    assert_eq!(m.defined_callee(fx.call), Some(fx.callee));
    assert!(matches!(m.instruction(fx.call), Some(Instruction::Call { .. })));
}
