use cfaslice_core::{format::format_operand, format::format_instruction, CallTargetMap, Module};
use cfaslice_runtime::WorkerStats;
use serde::Serialize;

#[derive(Serialize)]
struct CallEntry {
    function: String,
    call: String,
    targets: Vec<String>,
}

fn function_name(module: &Module, call: cfaslice_core::ValueId) -> String {
    module
        .function_of(call)
        .map(|f| module.function(f).name.clone())
        .unwrap_or_default()
}

fn target_names(module: &Module, targets: &cfaslice_core::PointsToSet) -> Vec<String> {
    targets.iter().map(|v| format_operand(module, v)).collect()
}

/// Call targets grouped under their function, in discovery order.
pub fn render_call_targets(module: &Module, call_targets: &CallTargetMap) -> String {
    let mut out = String::new();
    let mut current: Option<String> = None;
    for (call, targets) in call_targets.iter() {
        let function = function_name(module, call);
        if current.as_deref() != Some(function.as_str()) {
            out.push_str(&format!("\nFunction: {}\n", function));
            current = Some(function);
        }
        out.push_str(&format!(
            "  {}\n    -> {{{}}}\n",
            format_instruction(module, call),
            target_names(module, targets).join(", ")
        ));
    }
    out
}

pub fn call_targets_json(module: &Module, call_targets: &CallTargetMap) -> serde_json::Result<String> {
    let entries: Vec<CallEntry> = call_targets
        .iter()
        .map(|(call, targets)| CallEntry {
            function: function_name(module, call),
            call: format_instruction(module, call),
            targets: target_names(module, targets),
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

pub fn render_stats(stats: &[WorkerStats], unit: &str) -> String {
    stats
        .iter()
        .map(|s| format!("\n{}", s.render(unit)))
        .collect()
}
