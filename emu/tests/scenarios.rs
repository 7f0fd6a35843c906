use std::sync::Arc;

use arch::reg::Reg;
use mipsemu::{
    config::{Config, DeviceConfig},
    device::Device,
    memory::{Fault, Segments},
    state::Snapshot,
    Machine,
};

fn machine(src: &str, config: &Config) -> Machine {
    let program = mipsasm::assemble(src).unwrap_or_else(|err| panic!("{src:?}: {err}"));
    Machine::with_config(Arc::new(program), config).unwrap()
}

fn run(src: &str) -> Snapshot {
    machine(src, &Config::default()).run_to_end()
}

fn assert_regs(state: &Snapshot, expects: &[(u8, u32)]) {
    assert_eq!(state.error, None, "{:?}", state.error);
    assert!(state.has_exited);
    for (idx, expect) in expects {
        let reg = Reg::try_from(*idx).unwrap();
        assert_eq!(
            state.reg(reg),
            *expect,
            "${idx} = {:#010x}, expected {:#010x}",
            state.reg(reg),
            expect
        );
    }
}

macro_rules! case {
    ($name:ident, $src:expr, [$(($reg:expr, $val:expr)),* $(,)?]) => {
        #[test]
        fn $name() {
            assert_regs(&run($src), &[$(($reg, $val)),*]);
        }
    };
}

macro_rules! fault {
    ($name:ident, $src:expr, $code:expr) => {
        #[test]
        fn $name() {
            let state = run($src);
            assert!(state.has_exited);
            assert_eq!(state.error_code(), Some($code), "{:?}", state.error);
        }
    };
}

// ----------------------------------------------------------------------------
// Programs

case!(
    basic_arithmetic,
    ".text\nmain:\nadd $2, $0, 0xFF\nadd $3, $0, $2\nadd $4, $0, 0x12345678\nsub $5, $0, 0xFF\nsub $6, $0, $5\nsub $7, $0, 0x12345678\nli $8, 2\nmul $9, $8, 8\nmul $10, $9, $8\nmul $11, $8, 0x12345678\ndiv $12, $10, 2\ndiv $13, $12, $8\ndiv $14, $11, 0x12345678",
    [
        (2, 0xFF),
        (3, 0xFF),
        (4, 0x12345678),
        (5, 0xFFFFFF01),
        (6, 0xFF),
        (7, 0xEDCBA988),
        (8, 2),
        (9, 16),
        (10, 32),
        (11, 0x2468ACF0),
        (12, 16),
        (13, 8),
        (14, 2),
    ]
);

case!(
    bitwise_arithmetic,
    ".text\nmain:\nli $2 0x55555555\nli $3 0xAAAAAAAA\nor $4, $2, $3\nor $5, $2, 0xFFFF\nor $6, $2, 0xFFFF0000\nand $7, $2, $3\nand $8, $2, 0xFFFF\nand $9, $2, 0xFFFF0000\nxor $10, $2, $3\nnor $11, $2, $3",
    [
        (2, 0x55555555),
        (3, 0xAAAAAAAA),
        (4, 0xFFFFFFFF),
        (5, 0x5555FFFF),
        (6, 0xFFFF5555),
        (7, 0),
        (8, 0x5555),
        (9, 0x55550000),
        (10, 0xFFFFFFFF),
        (11, 0),
    ]
);

case!(
    pseudoinstructions,
    ".data\ndlabel: .word 42\n.text\nmain:\nli $2, 0x12345678\nla $3, dlabel\nabs $4, $2\nmul $5, $2, -1\nabs $5, $5\nli $6, 0x12345678\nclear $6\nli $7, 0xFFFF\nnot $7, $7\nmove $8, $7\nli $9, 55\nrem $9, $9, 10",
    [
        (2, 0x12345678),
        (3, 0x10000000),
        (4, 0x12345678),
        (5, 0x12345678),
        (6, 0),
        (7, 0xFFFF0000),
        (8, 0xFFFF0000),
        (9, 5),
    ]
);

case!(
    bitwise_shifts,
    ".text\nmain:\nli $2, 0x12345678\nsll $3, $2, 8\nsrl $4, $3, 8\nli $5, 8\nsllv $6, $2, $5\nsrlv $7, $6, $5",
    [
        (2, 0x12345678),
        (3, 0x34567800),
        (4, 0x00345678),
        (5, 8),
        (6, 0x34567800),
        (7, 0x00345678),
    ]
);

case!(
    branching,
    ".text\nmain:\nli $2, 5\n\nbeq $2, 5, skip1\nli $3, 0xDEADBEEF\n\nskip1:\nli $2, 4\nbne $2, 5, skip2\nli $4, 0xDEADBEEF\n\nskip2:\nli $2, 4\nblt $2, 5, skip3\nli $5, 0xDEADBEEF\n\nskip3:\nli $2, 6\nbgt $2, 5, skip4\nli $6, 0xDEADBEEF\n\nskip4:\nli $2, 5\nble $2, 5, skip5\nli $7, 0xDEADBEEF\n\nskip5:\nbge $2, 5, end\nli $8, 0xDEADBEEF\n\nend:\nli $9, 0x12345678",
    [
        (2, 5),
        (3, 0),
        (4, 0),
        (5, 0),
        (6, 0),
        (7, 0),
        (8, 0),
        (9, 0x12345678),
    ]
);

case!(
    function_calls,
    ".text\nmain:\nsub $sp, $sp, 4\nsw $ra, 0($sp)\njal function\nlw $ra, 0($sp)\nadd $sp, $sp, 4\nli $5, 0x12345678\njr $ra\n\nfunction:\nli $2, 0x12345678\nj jumptar\n\njumpret:\nli $4, 0x12345678\njr $ra\n\njumptar:\nli $3, 0x12345678\nj jumpret",
    [(2, 0x12345678), (3, 0x12345678), (4, 0x12345678), (5, 0x12345678), (29, 0x80000000)]
);

case!(
    loads_and_stores,
    ".data\ndata: .word 0x12345678\n.text\nmain:\nlw $2, data\nlh $3, data\nla $4, data\nlh $4, 2($4)\nlb $5, data\nla $6, data\nlb $6, 1($6)\nli $7, 0x23456789\nsw $7, data\nli $8, 0xFFFF\nsh $8, data\nli $9, 0x42\nsb $9, data\nlw $10, data",
    [(2, 0x12345678), (3, 0x5678), (4, 0x1234), (5, 0x78), (6, 0x56), (10, 0x2345FF42)]
);

case!(
    week3_instructions,
    ".text\nmain:\nli $t0, 0xFFFFFFFF\nxor $t0, $t0, 0x55555555\nli $t1 0x0\nnor $t1, $t1, 0x55555555\nli $t2 0\nbgtz $t2 skip1\nli $t2 0x12345678\nskip1:\nli $t3 1\nbgtz $t3 skip2\nli $s0 0xDEADBEEF\nskip2: li $t4 0\nbltz $t4 skip3\nli $t4 0x12345678\nskip3: li $t5 -1\nbltz $t5 skip4\nli $s1 0xDEADBEEF\nskip4:\nli $s3, 0",
    [
        (8, 0xAAAAAAAA),
        (9, 0xAAAAAAAA),
        (10, 0x12345678),
        (11, 1),
        (12, 0x12345678),
        (13, 0xFFFFFFFF),
        (16, 0),
        (17, 0),
    ]
);

case!(
    constants_and_comments,
    "# setup\nSTEP = 3\n.text\nmain: /* entry\n */ li $t0, STEP # three\naddi $t0, $t0, STEP // six\n.globl main",
    [(8, 6)]
);

#[test]
fn syscalls() {
    let state = run(".data\nstring: .asciiz \"test\"\nchar: .byte 'Q'\n.text\nmain:\nli $v0, 1\nli $a0, 12345678\nsyscall\nli $v0, 4\nla $a0, string\nsyscall\nli $v0, 11\nlb $a0, char\nsyscall\nli $v0, 10\nsyscall\nli $10, 0xDEADBEEF");
    assert_regs(&state, &[(10, 0)]);
    assert_eq!(state.output, "12345678testQ");
}

#[test]
fn basic_io() {
    let config = Config {
        devices: vec![DeviceConfig::Counter { addr: 0xFFFF_0000 }],
        ..Config::default()
    };
    let src = "addr = 0xFFFF0000\n.text\nmain:\nli $t0 2990\nsw $t0 addr\n\nloop:\nlw $t0 addr\nbne $t0 0 loop\n\nend:\njr $ra";
    let state = machine(src, &config).run_to_end();
    assert_regs(&state, &[(8, 0)]);
    assert_eq!(state.cycles, 3000);
}

// ----------------------------------------------------------------------------
// Runtime faults

fault!(maximum_cycle_count, ".text\nmain: j main", 13);
fault!(invalid_instruction_address, ".text\nmain: j 0xFF1234", 14);
fault!(divide_by_zero, ".text\nmain:\nli $t0 0\ndiv $t1, $1, $t0", 18);
fault!(segmentation_fault, ".text\nmain:\nlw $t0, 0x12345678($zero)", 19);
fault!(
    stack_overflow,
    ".text\nmain:\nsub $sp, $sp, 4\nsw $ra, 0($sp)\njal main\nlw $ra, 0($sp)\nadd $sp, $sp, 4\njr $ra",
    20
);
fault!(
    unaligned_access,
    ".data\ndata: .word 55\n.text\nmain:\nla $t0, data\nadd $t0, $t0, 2\nlw $t1, 0($t0)",
    21
);
fault!(
    unaligned_word_data,
    ".data\ndata: .word 0x12345678\n.text\nmain:\nla $t0, data\nadd $t0, $t0, 2\nlw $t1, 0($t0)",
    21
);
fault!(jump_into_data, ".text\nmain: li $t0 0x10000000\njr $t0", 14);

#[test]
fn cycle_limit_is_exact() {
    let state = run(".text\nmain: j main");
    assert_eq!(state.cycles, 1_000_000);

    let config = Config {
        cycle_limit: 50,
        ..Config::default()
    };
    let state = machine(".text\nmain: j main", &config).run_to_end();
    assert_eq!(state.cycles, 50);
    assert_eq!(state.error_code(), Some(13));
}

#[test]
fn fault_names_source_line() {
    let state = run(".text\nmain:\nli $t0 0\n\ndiv $t1, $1, $t0");
    let error = state.error.unwrap();
    assert_eq!(error.code, 18);
    assert_eq!(error.message, "Illegal attempt to divide by zero on line 5.");
}

#[test]
fn missing_address_is_hex() {
    let state = run(".text\nmain: j 0xFF1234");
    assert_eq!(
        state.error.unwrap().message,
        "No instruction at address 0x3FC48D0."
    );
}

// ----------------------------------------------------------------------------
// Reset

#[test]
fn reset_restores_data() {
    let mut m = machine(
        ".data\nx: .word 1\n.text\nmain: lw $t0 x\nadd $t0 $t0 1\nsw $t0 x",
        &Config::default(),
    );
    assert_eq!(m.memory().peek(0x1000_0000), Some(1));
    m.run_to_end();
    assert_eq!(m.memory().peek(0x1000_0000), Some(2));
    m.reset();
    assert_eq!(m.memory().peek(0x1000_0000), Some(1));
    assert_eq!(m.run_to_end().reg(Reg::T0), 2);
}

#[test]
fn reset_is_idempotent() {
    let src = ".data\ns: .asciiz \"hi\"\n.text\nmain: li $v0 4\nla $a0 s\nsyscall\ndiv $t0 $t0 $0";
    let mut m = machine(src, &Config::default());
    let first = m.reset();
    let second = m.reset();
    assert_eq!(first, second);

    let state = m.run_to_end();
    assert_eq!(state.output, "hi");
    assert_eq!(state.error_code(), Some(18));
    assert_eq!(m.reset(), first);
    assert_eq!(first.output, "");
    assert_eq!(first.error, None);
}

/// Stores `(x, y)` word pairs at the address written to it.
struct Tokens(Vec<(u32, u32)>);

impl Device for Tokens {
    fn maps(&self, addr: u32) -> bool {
        addr == 0xFFFF_00F0
    }

    fn read(&mut self, _addr: u32, _mem: &mut Segments) -> Result<u32, Fault> {
        Ok(self.0.len() as u32)
    }

    fn write(&mut self, _addr: u32, value: u32, mem: &mut Segments) -> Result<(), Fault> {
        for (i, (x, y)) in self.0.iter().enumerate() {
            let addr = value.wrapping_add(8 * i as u32);
            mem.write(addr, 4, *x)?;
            mem.write(addr.wrapping_add(4), 4, *y)?;
        }
        Ok(())
    }
}

#[test]
fn device_fills_data_segment() {
    let src = ".data\npts: .space 16\n.text\nmain: la $t0 pts\nli $t1 0xFFFF00F0\nlw $t5 0($t1)\nsw $t0 0($t1)\nlw $t2 0($t0)\nlw $t3 4($t0)\nlw $t4 12($t0)";
    let mut m = machine(src, &Config::default());
    m.attach(Box::new(Tokens(vec![(3, 4), (7, 9)])));
    m.reset();
    assert_regs(&m.run_to_end(), &[(10, 3), (11, 4), (12, 9), (13, 2)]);
}

#[test]
fn device_write_past_data_faults() {
    let src = ".data\npts: .space 8\n.text\nmain: la $t0 pts\nli $t1 0xFFFF00F0\nsw $t0 0($t1)";
    let mut m = machine(src, &Config::default());
    m.attach(Box::new(Tokens(vec![(1, 2), (3, 4)])));
    assert_eq!(m.run_to_end().error_code(), Some(19));
}
