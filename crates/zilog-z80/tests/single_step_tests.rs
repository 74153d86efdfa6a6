//! Integration tests using Tom Harte's `SingleStepTests` for the Z80.
//!
//! Runs 1,604 opcode files × 1,000 tests = 1,604,000 individual tests comparing
//! CPU register and memory state, and the T-state count, after each
//! instruction. Q (the SCF/CCF latch) is not modelled and not compared.
//!
//! Test data lives in `test-data/z80/v1/`.

use emu_core::{Bus, Clock, Cpu, IoBus};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::panic;
use std::path::Path;
use zilog_z80::{Reg8, Reg16, Registers, Z80};

/// Flat 64KB RAM bus with preloaded I/O port values.
struct TestBus {
    ram: Box<[u8; 0x1_0000]>,
    /// Preloaded port values for IN instructions.
    io_read_values: HashMap<u16, u8>,
}

impl TestBus {
    fn new() -> Self {
        Self {
            ram: Box::new([0; 0x1_0000]),
            io_read_values: HashMap::new(),
        }
    }

    fn load_ram(&mut self, entries: &[(u16, u8)]) {
        for &(addr, value) in entries {
            self.ram[usize::from(addr)] = value;
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        self.ram[usize::from(addr)]
    }
}

impl Bus for TestBus {
    fn read(&mut self, _clock: &mut Clock, addr: u16) -> u8 {
        self.ram[usize::from(addr)]
    }

    fn write(&mut self, _clock: &mut Clock, addr: u16, value: u8) {
        self.ram[usize::from(addr)] = value;
    }
}

impl IoBus for TestBus {
    fn read_io(&mut self, _clock: &mut Clock, port: u16) -> u8 {
        self.io_read_values.get(&port).copied().unwrap_or(0xFF)
    }

    fn write_io(&mut self, _clock: &mut Clock, _port: u16, _value: u8) {}
}

/// JSON test case format.
#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: Vec<serde_json::Value>,
    #[serde(default)]
    ports: Vec<(u16, u8, String)>,
}

/// JSON CPU state format.
#[derive(Deserialize)]
struct CpuState {
    pc: u16,
    sp: u16,
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: u8,
    h: u8,
    l: u8,
    i: u8,
    r: u8,
    ix: u16,
    iy: u16,
    wz: u16,
    #[serde(rename = "af_")]
    af_alt: u16,
    #[serde(rename = "bc_")]
    bc_alt: u16,
    #[serde(rename = "de_")]
    de_alt: u16,
    #[serde(rename = "hl_")]
    hl_alt: u16,
    iff1: u8,
    iff2: u8,
    im: u8,
    ei: u8,
    p: u8,
    ram: Vec<(u16, u8)>,
}

/// Set up the CPU and bus from the initial test state.
fn setup(cpu: &mut Z80, bus: &mut TestBus, state: &CpuState, ports: &[(u16, u8, String)]) {
    // Load RAM
    bus.load_ram(&state.ram);

    // Load I/O port read values
    bus.io_read_values.clear();
    for &(port, value, ref dir) in ports {
        if dir == "r" {
            bus.io_read_values.insert(port, value);
        }
    }

    let mut regs = Registers::new();
    regs.set(Reg8::A, state.a);
    regs.set(Reg8::F, state.f);
    regs.set(Reg8::B, state.b);
    regs.set(Reg8::C, state.c);
    regs.set(Reg8::D, state.d);
    regs.set(Reg8::E, state.e);
    regs.set(Reg8::H, state.h);
    regs.set(Reg8::L, state.l);

    regs.set16(Reg16::AltAf, state.af_alt);
    regs.set16(Reg16::AltBc, state.bc_alt);
    regs.set16(Reg16::AltDe, state.de_alt);
    regs.set16(Reg16::AltHl, state.hl_alt);

    regs.set16(Reg16::Ix, state.ix);
    regs.set16(Reg16::Iy, state.iy);
    regs.set(Reg8::I, state.i);
    regs.set(Reg8::R, state.r);
    regs.set_wz(state.wz);
    regs.sp = state.sp;
    regs.pc = state.pc;

    regs.iff1 = state.iff1 != 0;
    regs.iff2 = state.iff2 != 0;
    regs.im = state.im;
    regs.active_ei = state.ei != 0;
    regs.read_iff2 = state.p != 0;

    cpu.set_registers(&regs);
}

/// Compare the CPU/bus state against expected, returning a list of mismatches.
fn compare(cpu: &Z80, bus: &TestBus, expected: &CpuState) -> Vec<String> {
    let mut errors = Vec::new();
    let regs = cpu.registers();

    // Main registers
    check_u8(&mut errors, "A", regs.a(), expected.a);
    check_u8(&mut errors, "F", regs.f(), expected.f);
    check_u8(&mut errors, "B", regs.get(Reg8::B), expected.b);
    check_u8(&mut errors, "C", regs.get(Reg8::C), expected.c);
    check_u8(&mut errors, "D", regs.get(Reg8::D), expected.d);
    check_u8(&mut errors, "E", regs.get(Reg8::E), expected.e);
    check_u8(&mut errors, "H", regs.get(Reg8::H), expected.h);
    check_u8(&mut errors, "L", regs.get(Reg8::L), expected.l);

    // Alternate registers
    check_u16(&mut errors, "AF'", regs.get16(Reg16::AltAf), expected.af_alt);
    check_u16(&mut errors, "BC'", regs.get16(Reg16::AltBc), expected.bc_alt);
    check_u16(&mut errors, "DE'", regs.get16(Reg16::AltDe), expected.de_alt);
    check_u16(&mut errors, "HL'", regs.get16(Reg16::AltHl), expected.hl_alt);

    // Index registers
    check_u16(&mut errors, "IX", regs.ix(), expected.ix);
    check_u16(&mut errors, "IY", regs.iy(), expected.iy);

    // Other registers
    check_u16(&mut errors, "SP", regs.sp, expected.sp);
    check_u16(&mut errors, "PC", regs.pc, expected.pc);
    check_u8(&mut errors, "I", regs.get(Reg8::I), expected.i);
    check_u8(&mut errors, "R", regs.get(Reg8::R), expected.r);

    // WZ/MEMPTR
    check_u16(&mut errors, "WZ", regs.wz(), expected.wz);

    // Interrupt state
    let actual_iff1 = u8::from(regs.iff1);
    if actual_iff1 != expected.iff1 {
        errors.push(format!("IFF1: got {actual_iff1}, want {}", expected.iff1));
    }
    let actual_iff2 = u8::from(regs.iff2);
    if actual_iff2 != expected.iff2 {
        errors.push(format!("IFF2: got {actual_iff2}, want {}", expected.iff2));
    }
    check_u8(&mut errors, "IM", regs.im, expected.im);

    // EI window
    let actual_ei = u8::from(regs.active_ei);
    if actual_ei != expected.ei {
        errors.push(format!("EI: got {actual_ei}, want {}", expected.ei));
    }

    // RAM
    for &(addr, expected_val) in &expected.ram {
        let actual_val = bus.peek(addr);
        if actual_val != expected_val {
            errors.push(format!(
                "RAM[${addr:04X}]: got ${actual_val:02X}, want ${expected_val:02X}"
            ));
        }
    }

    errors
}

fn check_u8(errors: &mut Vec<String>, name: &str, actual: u8, expected: u8) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:02X}, want ${expected:02X}"));
    }
}

fn check_u16(errors: &mut Vec<String>, name: &str, actual: u16, expected: u16) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:04X}, want ${expected:04X}"));
    }
}

/// Run all Z80 SingleStepTests.
///
/// Iterates through all 1,604 test files covering unprefixed, CB, DD, ED, and FD opcodes.
#[test]
#[ignore = "requires test-data/z80, run with --ignored"]
fn run_all() {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("parent of crate dir")
        .parent()
        .expect("workspace root")
        .join("test-data/z80/v1");

    if !test_dir.exists() {
        eprintln!("Test data not found at {}", test_dir.display());
        eprintln!("Skipping SingleStepTests.");
        return;
    }

    let mut total_pass = 0u64;
    let mut total_fail = 0u64;
    let mut total_files = 0u32;

    // Collect all filenames to test
    let mut filenames: Vec<String> = Vec::new();

    // Base opcodes (skip CB, DD, ED, FD prefix bytes)
    for opcode in 0..=0xFFu8 {
        if matches!(opcode, 0xCB | 0xDD | 0xED | 0xFD) {
            continue;
        }
        filenames.push(format!("{opcode:02x}.json"));
    }

    // CB-prefixed
    for opcode in 0..=0xFFu8 {
        filenames.push(format!("cb {opcode:02x}.json"));
    }

    // DD-prefixed
    for opcode in 0..=0xFFu8 {
        filenames.push(format!("dd {opcode:02x}.json"));
    }

    // ED-prefixed
    for opcode in 0..=0xFFu8 {
        filenames.push(format!("ed {opcode:02x}.json"));
    }

    // FD-prefixed
    for opcode in 0..=0xFFu8 {
        filenames.push(format!("fd {opcode:02x}.json"));
    }

    // DD CB-prefixed (displacement is __, opcode varies)
    for opcode in 0..=0xFFu8 {
        filenames.push(format!("dd cb __ {opcode:02x}.json"));
    }

    // FD CB-prefixed
    for opcode in 0..=0xFFu8 {
        filenames.push(format!("fd cb __ {opcode:02x}.json"));
    }

    for filename in &filenames {
        let path = test_dir.join(filename);
        if !path.exists() {
            continue;
        }

        let data = fs::read_to_string(&path).unwrap_or_else(|e| {
            panic!("Failed to read {}: {e}", path.display());
        });
        let tests: Vec<TestCase> = serde_json::from_str(&data).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {e}", path.display());
        });

        let mut file_pass = 0u32;
        let mut file_fail = 0u32;
        let mut first_failures: Vec<String> = Vec::new();

        for test in &tests {
            let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
                let mut cpu = Z80::new();
                let mut bus = TestBus::new();

                setup(&mut cpu, &mut bus, &test.initial, &test.ports);

                let tstates = cpu.step(&mut bus);

                let mut errors = compare(&cpu, &bus, &test.final_state);
                if tstates as usize != test.cycles.len() {
                    errors.push(format!(
                        "T-states: got {tstates}, want {}",
                        test.cycles.len()
                    ));
                }
                errors
            }));

            match result {
                Ok(errors) if errors.is_empty() => {
                    file_pass += 1;
                }
                Ok(errors) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!(
                            "  FAIL [{}]: {}",
                            test.name,
                            errors.join(", ")
                        ));
                    }
                }
                Err(_) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures
                            .push(format!("  PANIC [{}]: unimplemented or crash", test.name,));
                    }
                }
            }
        }

        let status = if file_fail == 0 { "PASS" } else { "FAIL" };
        println!(
            "{filename}: {status}: {file_pass}/{} passed",
            file_pass + file_fail
        );
        for msg in &first_failures {
            println!("{msg}");
        }

        total_pass += u64::from(file_pass);
        total_fail += u64::from(file_fail);
        total_files += 1;
    }

    println!();
    println!("=== Z80 SingleStepTests Summary ===");
    println!(
        "Files: {total_files}, Total: {}/{}, Pass: {total_pass}, Fail: {total_fail}",
        total_pass + total_fail,
        total_pass + total_fail
    );

    assert_eq!(total_fail, 0, "{total_fail} tests failed");
}
