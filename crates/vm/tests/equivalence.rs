//! Dispatch-strategy equivalence over random programs.
//!
//! Every strategy must end with the same result (or the same error kind at
//! the same ip), the same debug register, the same stack and the same
//! output.

use proptest::prelude::*;
use threadvm_common::opcode::ALL_OPCODES;
use threadvm_common::{Instruction, Program};
use threadvm_vm::{Console, Dispatch, Engine, EngineConfig, RunResult, RuntimeError};

const MEMORY: usize = 256;

#[derive(Debug, PartialEq)]
struct Observed {
    result: Result<RunResult, RuntimeError>,
    debug_register: u32,
    stack: Vec<u32>,
    output: String,
    diagnostics: String,
}

fn observe(program: &Program, dispatch: Dispatch, input: &[String]) -> Observed {
    let config = EngineConfig::default()
        .with_memory_size(MEMORY)
        .with_stack_capacity(64)
        .with_max_call_depth(32)
        .with_max_steps(2_000);
    let mut engine =
        Engine::with_config(program, config).with_console(Console::captured(input.iter().cloned()));
    let result = engine.run(dispatch.strategy());
    Observed {
        result,
        debug_register: engine.debug_register(),
        stack: engine.stack().to_vec(),
        output: engine.console().output().to_string(),
        diagnostics: engine.console().diagnostics().to_string(),
    }
}

/// Random programs with mostly-valid targets and mostly-in-bounds offsets.
fn arb_program() -> impl Strategy<Value = Program> {
    (1usize..32).prop_flat_map(|len| {
        prop::collection::vec(
            (0..ALL_OPCODES.len(), 0u32..=len as u32, 0u32..300, 0u32..300),
            len,
        )
        .prop_map(move |raw| {
            let instructions = raw
                .into_iter()
                .map(|(op, a, b, c)| {
                    let opcode = ALL_OPCODES[op];
                    let mut instr = Instruction::new(opcode, &[b, c % 16, c]);
                    for &slot in opcode.target_slots() {
                        instr.set_imm(slot, if slot == 0 { a } else { b % (len as u32 + 1) });
                    }
                    instr
                })
                .collect();
            Program::new(instructions)
        })
    })
}

fn arb_input() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            any::<i32>().prop_map(|v| v.to_string()),
            any::<u32>().prop_map(|v| v.to_string()),
            (-100.0f32..100.0).prop_map(|v| v.to_string()),
            Just("garbage".to_string()),
        ],
        0..4,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn strategies_agree(program in arb_program(), input in arb_input()) {
        let reference = observe(&program, Dispatch::Switch, &input);
        for dispatch in [Dispatch::JumpTable, Dispatch::Threaded] {
            let other = observe(&program, dispatch, &input);
            prop_assert_eq!(&other, &reference, "{} vs switch", dispatch);
        }
    }

    #[test]
    fn store_then_load_roundtrip(offset in 0u32..(MEMORY as u32 - 3), value in any::<u32>()) {
        let program = Program::new(vec![
            Instruction::unary(threadvm_common::Opcode::Push, value),
            Instruction::unary(threadvm_common::Opcode::Store, offset),
            Instruction::unary(threadvm_common::Opcode::Load, offset),
        ]);
        for dispatch in Dispatch::ALL {
            let observed = observe(&program, dispatch, &[]);
            prop_assert!(observed.result.is_ok());
            prop_assert_eq!(observed.stack, vec![value]);
        }
    }
}
