use crate::{
    function::FunctionId,
    instructions::Instruction,
    module::Module,
    values::{ValueId, ValueKind},
};
use std::fmt::Write;

/// How a value is spelled when it appears as an operand.
pub fn format_operand(module: &Module, value: ValueId) -> String {
    let data = module.value(value);
    match &data.kind {
        ValueKind::Function(_) | ValueKind::Global(_) => match &data.name {
            Some(name) => format!("@{}", name),
            None => format!("@{}", value),
        },
        ValueKind::Constant(c) => c.to_string(),
        ValueKind::Argument { .. } | ValueKind::Instruction { .. } => match &data.name {
            Some(name) => format!("%{}", name),
            None => format!("%{}", value),
        },
    }
}

fn typed_operand(module: &Module, value: ValueId) -> String {
    format!("{} {}", module.ty(value), format_operand(module, value))
}

fn join_typed(module: &Module, values: &[ValueId]) -> String {
    values
        .iter()
        .map(|v| typed_operand(module, *v))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_instruction(module: &Module, value: ValueId) -> String {
    let Some(inst) = module.instruction(value) else {
        return format_operand(module, value);
    };
    let ty = module.ty(value);
    let body = match inst {
        Instruction::Cast { op, value: src } => {
            format!("{} {} to {}", op.mnemonic(), typed_operand(module, *src), ty)
        }
        Instruction::Phi { incoming } => {
            let edges = incoming
                .iter()
                .map(|(v, b)| {
                    format!(
                        "[ {}, %{} ]",
                        format_operand(module, *v),
                        module.block(*b).label()
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("phi {} {}", ty, edges)
        }
        Instruction::Select {
            condition,
            true_value,
            false_value,
        } => format!(
            "select {}, {}, {}",
            typed_operand(module, *condition),
            typed_operand(module, *true_value),
            typed_operand(module, *false_value)
        ),
        Instruction::Load { ptr } => format!("load {}, {}", ty, typed_operand(module, *ptr)),
        Instruction::Store { value: v, ptr } => format!(
            "store {}, {}",
            typed_operand(module, *v),
            typed_operand(module, *ptr)
        ),
        Instruction::Call { callee, args } => format!(
            "call {} {}({})",
            ty,
            format_operand(module, *callee),
            join_typed(module, args)
        ),
        Instruction::GetElementPtr { base, indices } => {
            let mut text = format!("getelementptr {}", typed_operand(module, *base));
            if !indices.is_empty() {
                write!(text, ", {}", join_typed(module, indices)).ok();
            }
            text
        }
        Instruction::Alloca { allocated } => format!("alloca {}", allocated),
        Instruction::Binary { op, left, right } => format!(
            "{} {} {}, {}",
            op.mnemonic(),
            ty,
            format_operand(module, *left),
            format_operand(module, *right)
        ),
        Instruction::Compare {
            predicate,
            left,
            right,
        } => format!(
            "icmp {} {}, {}",
            predicate.mnemonic(),
            typed_operand(module, *left),
            format_operand(module, *right)
        ),
        Instruction::Jump { target } => format!("br label %{}", module.block(*target).label()),
        Instruction::Branch {
            condition,
            then_block,
            else_block,
        } => format!(
            "br {}, label %{}, label %{}",
            typed_operand(module, *condition),
            module.block(*then_block).label(),
            module.block(*else_block).label()
        ),
        Instruction::Return { value: Some(v) } => format!("ret {}", typed_operand(module, *v)),
        Instruction::Return { value: None } => "ret void".to_string(),
        Instruction::Unreachable => "unreachable".to_string(),
    };

    if ty.is_void() {
        body
    } else {
        format!("{} = {}", format_operand(module, value), body)
    }
}

pub fn format_function(module: &Module, function: FunctionId) -> String {
    format_function_marked(module, function, |_| false, "")
}

/// Dumps a function, appending `tag` to every instruction `marked` accepts.
pub fn format_function_marked(
    module: &Module,
    function: FunctionId,
    marked: impl Fn(ValueId) -> bool,
    tag: &str,
) -> String {
    let func = module.function(function);
    let mut output = String::new();

    let keyword = if func.is_declaration() {
        "declare"
    } else {
        "define"
    };
    write!(
        output,
        "{} {} @{}({})",
        keyword,
        func.return_type,
        func.name,
        join_typed(module, &func.params)
    )
    .ok();

    if func.is_declaration() {
        output.push('\n');
        return output;
    }

    output.push_str(" {\n");
    for (i, &block) in func.blocks.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        writeln!(output, "{}:", module.block(block).label()).ok();
        for &inst in &module.block(block).instructions {
            write!(output, "  {}", format_instruction(module, inst)).ok();
            if marked(inst) {
                write!(output, "\t{}", tag).ok();
            }
            output.push('\n');
        }
    }
    output.push_str("}\n");
    output
}

pub fn format_module(module: &Module) -> String {
    let mut output = String::new();
    writeln!(output, "; ModuleID = '{}'", module.name).ok();

    for &global in module.globals() {
        let init = module
            .kind(global)
            .as_global()
            .and_then(|g| g.initializer)
            .map(|v| typed_operand(module, v))
            .unwrap_or_else(|| "external".to_string());
        writeln!(output, "{} = global {}", format_operand(module, global), init).ok();
    }

    for function in module.functions() {
        output.push('\n');
        output.push_str(&format_function(module, function.id));
    }

    output
}
