use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use threadvm_common::{Instruction, Opcode, Program};
use threadvm_vm::{Console, Dispatch, Engine, EngineConfig};

/// Sum 1..=n with a memory-resident counter.
fn sum_loop(n: u32) -> Program {
    Program::new(vec![
        Instruction::unary(Opcode::Push, 0),
        Instruction::binary(Opcode::StoreImm, 0, 1),
        Instruction::unary(Opcode::Load, 0),
        Instruction::nullary(Opcode::Add),
        Instruction::unary(Opcode::Load, 0),
        Instruction::nullary(Opcode::Inc),
        Instruction::unary(Opcode::Store, 0),
        Instruction::unary(Opcode::Load, 0),
        Instruction::unary(Opcode::Push, n),
        Instruction::nullary(Opcode::Gt),
        Instruction::unary(Opcode::JumpIfZero, 2),
        Instruction::nullary(Opcode::Seek),
        Instruction::nullary(Opcode::Return),
    ])
}

/// Recursive countdown: one call and one return per level.
fn call_chain(depth: u32) -> Program {
    Program::new(vec![
        Instruction::unary(Opcode::Push, depth),
        Instruction::binary(Opcode::Call, 4, 1),
        Instruction::nullary(Opcode::Seek),
        Instruction::nullary(Opcode::Return),
        Instruction::nullary(Opcode::Dup),
        Instruction::unary(Opcode::JumpIfZero, 10),
        Instruction::nullary(Opcode::Dec),
        Instruction::binary(Opcode::Call, 4, 1),
        Instruction::nullary(Opcode::Inc),
        Instruction::nullary(Opcode::Return),
        Instruction::nullary(Opcode::Return),
    ])
}

fn bench_program(c: &mut Criterion, group: &str, program: &Program, config: &EngineConfig) {
    let mut group = c.benchmark_group(group);
    for dispatch in Dispatch::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(dispatch), &dispatch, |b, &d| {
            b.iter(|| {
                let mut engine = Engine::with_config(program, config.clone())
                    .with_console(Console::captured(Vec::<String>::new()));
                let result = engine.run(d.strategy()).expect("run");
                black_box(result.debug_register)
            });
        });
    }
    group.finish();
}

fn bench_sum_loop(c: &mut Criterion) {
    let config = EngineConfig::default().with_memory_size(64);
    bench_program(c, "dispatch/sum_loop", &sum_loop(10_000), &config);
}

fn bench_call_chain(c: &mut Criterion) {
    let config = EngineConfig::default().with_memory_size(64);
    bench_program(c, "dispatch/call_chain", &call_chain(900), &config);
}

criterion_group!(benches, bench_sum_loop, bench_call_chain);
criterion_main!(benches);
