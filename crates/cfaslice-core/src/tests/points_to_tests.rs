use super::fixtures::{diamond_call, global_handler, loop_carried, select_load_call, stored_pointer};
use crate::analysis::{analyze_function, CallTargetMap, PointsToAnalysis, PointsToSet};
use crate::builder::ModuleBuilder;
use crate::instructions::ComparePredicate;
use crate::types::Type;
use crate::values::ValueId;
use pretty_assertions::assert_eq;

fn set(values: &[ValueId]) -> PointsToSet {
    values.iter().copied().collect()
}

#[test]
fn test_select_then_load_reaches_both_arms() {
    let fx = select_load_call();
    let targets = analyze_function(&fx.module, fx.f);

    assert_eq!(targets.len(), 1);
    assert_eq!(targets.get(fx.call), Some(&set(&[fx.p, fx.null])));
}

#[test]
fn test_select_condition_is_not_an_origin() {
    let fx = select_load_call();
    let mut analysis = PointsToAnalysis::new(&fx.module);
    analysis.analyze_function(fx.f);

    assert_eq!(analysis.points_to(fx.select), Some(&set(&[fx.p, fx.null])));
    assert!(analysis.points_to(fx.cond).is_none());
}

#[test]
fn test_load_sees_stores_through_the_same_slot() {
    let fx = stored_pointer();
    let targets = analyze_function(&fx.module, fx.caller);

    assert_eq!(targets.get(fx.call), Some(&set(&[fx.slot, fx.target])));
}

#[test]
fn test_store_in_another_function_is_ignored() {
    let mut mb = ModuleBuilder::new("m");
    let target = mb.declare_function("target", vec![], Type::Void);
    let target = mb.function_value(target);
    let shared = mb.undef(Type::Ptr);

    let mut writer = mb.function("writer", vec![], Type::Void);
    let entry = writer.block("entry");
    let mut b = writer.at(entry);
    b.store(target, shared);
    b.ret_void();
    writer.finish();

    let mut reader = mb.function("reader", vec![], Type::Void);
    let entry = reader.block("entry");
    let mut b = reader.at(entry);
    let fp = b.load(Type::Ptr, shared);
    let call = b.call_typed(Type::Void, fp, vec![]);
    b.ret_void();
    let reader = reader.finish();

    let module = mb.build().unwrap();
    let targets = analyze_function(&module, reader);

    assert_eq!(targets.get(call), Some(&set(&[shared])));
    assert_eq!(module.users(shared).len(), 2);
}

#[test]
fn test_loop_carried_phi_converges() {
    let fx = loop_carried();
    let mut analysis = PointsToAnalysis::new(&fx.module);
    analysis.analyze_function(fx.f);

    assert_eq!(analysis.call_targets().get(fx.call), Some(&set(&[fx.p])));
    assert_eq!(analysis.points_to(fx.phi), Some(&set(&[fx.p])));
    assert_eq!(analysis.points_to(fx.next), Some(&set(&[fx.p])));
}

#[test]
fn test_back_edge_listed_first_does_not_leak_the_cast() {
    let mut mb = ModuleBuilder::new("back_edge_first");
    let mut f = mb.function("walk", vec![Type::Ptr], Type::Void);
    let p = f.name_param(0, "p");
    let null = f.const_null();
    let entry = f.block("entry");
    let header = f.block("header");
    let body = f.block("body");
    let exit = f.block("exit");
    f.at(entry).jump(header);

    let phi = {
        let mut b = f.at(header);
        let phi = b.phi(Type::Ptr, vec![]);
        let done = b.compare(ComparePredicate::Eq, phi, null);
        b.branch(done, exit, body);
        phi
    };
    let next = {
        let mut b = f.at(body);
        let next = b.bitcast(phi);
        b.jump(header);
        next
    };
    f.add_incoming(phi, next, body).unwrap();
    f.add_incoming(phi, p, entry).unwrap();

    let call = {
        let mut b = f.at(exit);
        let call = b.call_typed(Type::Void, phi, vec![]);
        b.ret_void();
        call
    };
    let f = f.finish();
    let module = mb.build().unwrap();

    let mut analysis = PointsToAnalysis::new(&module);
    analysis.analyze_function(f);

    assert_eq!(analysis.call_targets().get(call), Some(&set(&[p])));
    assert_eq!(analysis.points_to(phi), Some(&set(&[p])));
    assert_eq!(analysis.points_to(next), Some(&set(&[p])));
}

#[test]
fn test_cycle_without_an_entry_edge_falls_back_to_one_origin() {
    let mut mb = ModuleBuilder::new("closed_cycle");
    let mut f = mb.function("spin", vec![], Type::Void);
    let entry = f.block("entry");
    let header = f.block("header");
    f.at(entry).jump(header);

    let (phi, next, call) = {
        let mut b = f.at(header);
        let phi = b.phi(Type::Ptr, vec![]);
        let next = b.bitcast(phi);
        let call = b.call_typed(Type::Void, phi, vec![]);
        b.jump(header);
        (phi, next, call)
    };
    f.add_incoming(phi, next, header).unwrap();
    let f = f.finish();
    let module = mb.build().unwrap();

    let mut analysis = PointsToAnalysis::new(&module);
    analysis.analyze_function(f);

    let targets = analysis.call_targets().get(call).unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(analysis.points_to(phi), analysis.points_to(next));
}

#[test]
fn test_global_collects_initializer_and_every_store() {
    let fx = global_handler();
    let targets = analyze_function(&fx.module, fx.dispatch);

    assert_eq!(
        targets.get(fx.call),
        Some(&set(&[fx.handler, fx.initial, fx.installed]))
    );
}

#[test]
fn test_direct_call_to_defined_function_skips_the_engine() {
    let fx = diamond_call();
    let callee_value = fx.module.function(fx.callee).value;
    let mut analysis = PointsToAnalysis::new(&fx.module);
    analysis.analyze_function(fx.main);

    assert_eq!(
        analysis.call_targets().get(fx.call),
        Some(&PointsToSet::singleton(callee_value))
    );
    assert!(analysis.points_to(callee_value).is_none());
    assert_eq!(analysis.resolved_count(), 0);
}

#[test]
fn test_direct_call_to_declaration_resolves_to_itself() {
    let mut mb = ModuleBuilder::new("m");
    let ext = mb.declare_function("ext", vec![], Type::Void);
    let ext = mb.function_value(ext);
    let mut f = mb.function("f", vec![], Type::Void);
    let entry = f.block("entry");
    let mut b = f.at(entry);
    let call = b.call(ext, vec![]);
    b.ret_void();
    let f = f.finish();
    let module = mb.build().unwrap();

    let mut analysis = PointsToAnalysis::new(&module);
    analysis.analyze_function(f);

    assert_eq!(analysis.call_targets().get(call), Some(&set(&[ext])));
    assert_eq!(analysis.points_to(ext), Some(&set(&[ext])));
}

#[test]
fn test_gep_of_a_slot_does_not_see_stores_through_another_gep() {
    let mut mb = ModuleBuilder::new("m");
    let target = mb.declare_function("target", vec![], Type::Void);
    let target = mb.function_value(target);
    let mut f = mb.function("f", vec![], Type::Void);
    let zero = f.const_int(0, 32);
    let entry = f.block("entry");
    let mut b = f.at(entry);
    let slot = b.alloca(Type::Array(Box::new(Type::Ptr), 2));
    let write_at = b.gep(slot, vec![zero]);
    b.store(target, write_at);
    let read_at = b.gep(slot, vec![zero]);
    let fp = b.load(Type::Ptr, read_at);
    let call = b.call_typed(Type::Void, fp, vec![]);
    b.ret_void();
    let f = f.finish();
    let module = mb.build().unwrap();

    let targets = analyze_function(&module, f);

    assert_eq!(targets.get(call), Some(&set(&[slot])));
}

#[test]
fn test_phi_of_only_itself_falls_back_to_itself() {
    let mut mb = ModuleBuilder::new("m");
    let mut f = mb.function("spin", vec![], Type::Void);
    let entry = f.block("entry");
    let looping = f.block("loop");
    f.at(entry).jump(looping);
    let (q, call) = {
        let mut b = f.at(looping);
        let q = b.phi(Type::Ptr, vec![]);
        b.named(q, "q");
        let call = b.call_typed(Type::Void, q, vec![]);
        b.jump(looping);
        (q, call)
    };
    f.add_incoming(q, q, looping).unwrap();
    let f = f.finish();
    let module = mb.build().unwrap();

    let targets = analyze_function(&module, f);

    assert_eq!(targets.get(call), Some(&set(&[q])));
}

#[test]
fn test_every_reached_value_has_an_origin() {
    let modules = [
        select_load_call().module,
        stored_pointer().module,
        loop_carried().module,
        global_handler().module,
        diamond_call().module,
    ];
    for module in &modules {
        let mut analysis = PointsToAnalysis::new(module);
        let functions: Vec<_> = module.functions().map(|f| f.id).collect();
        for f in functions {
            analysis.analyze_function(f);
        }
        for value in module.value_ids() {
            if let Some(set) = analysis.points_to(value) {
                assert!(!set.is_empty(), "{} has no origin", value);
            }
        }
        for (_, targets) in analysis.call_targets().iter() {
            assert!(!targets.is_empty());
        }
    }
}

#[test]
fn test_derived_sets_include_their_sources() {
    let fx = stored_pointer();
    let mut analysis = PointsToAnalysis::new(&fx.module);
    let slot_set = analysis.resolve(fx.slot).clone();
    let target_set = analysis.resolve(fx.target).clone();
    let load = fx.module.instructions(fx.caller).nth(2).unwrap();
    let load_set = analysis.resolve(load).clone();

    assert!(slot_set.is_subset(&load_set));
    assert!(target_set.is_subset(&load_set));
}

#[test]
fn test_results_are_deterministic_and_reset_clears_state() {
    let fx = global_handler();
    let first = analyze_function(&fx.module, fx.dispatch);
    let second = analyze_function(&fx.module, fx.dispatch);
    assert_eq!(first, second);

    let mut analysis = PointsToAnalysis::new(&fx.module);
    analysis.analyze_function(fx.dispatch);
    assert!(analysis.resolved_count() > 0);
    analysis.reset();
    assert_eq!(analysis.resolved_count(), 0);
    assert!(analysis.call_targets().is_empty());

    analysis.analyze_function(fx.dispatch);
    assert_eq!(analysis.into_call_targets(), first);
}

#[test]
fn test_merge_unions_entries_for_the_same_call() {
    let a = ValueId(1);
    let b = ValueId(2);
    let call = ValueId(9);

    let mut left = CallTargetMap::new();
    left.insert(call, set(&[a]));
    let mut right = CallTargetMap::new();
    right.insert(call, set(&[b]));
    right.insert(ValueId(3), set(&[a]));

    left.merge(right);
    left.sort();

    let entries: Vec<_> = left.iter().map(|(c, s)| (c, s.clone())).collect();
    assert_eq!(entries, vec![(ValueId(3), set(&[a])), (call, set(&[a, b]))]);
}

#[test]
fn test_indirect_filters_direct_calls_to_bodies() {
    let fx = diamond_call();
    let targets = analyze_function(&fx.module, fx.main);

    assert_eq!(targets.len(), 1);
    assert_eq!(targets.indirect(&fx.module).count(), 0);

    let fx = select_load_call();
    let targets = analyze_function(&fx.module, fx.f);
    assert_eq!(targets.indirect(&fx.module).count(), 1);
}
