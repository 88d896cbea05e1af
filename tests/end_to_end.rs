use assembler::assembler::assemble_source;

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn decode_word(line: &str) -> u16 {
    let bytes = line.as_bytes();
    let high = BASE64_ALPHABET.iter().position(|&c| c == bytes[0]).unwrap();
    let low = BASE64_ALPHABET.iter().position(|&c| c == bytes[1]).unwrap();
    ((high as u16) << 6) | low as u16
}

// S1 — minimal program.
#[test]
fn minimal_program_encodes_three_words() {
    let out = assemble_source("MAIN:  mov @r3, @r5\n       stop\n").unwrap();
    let words: Vec<u16> = out.object.lines().map(decode_word).collect();
    assert_eq!(words.len(), 3);

    assert_eq!(words[0], 0xA14);

    assert_eq!((words[1] >> 7) & 0x7, 3);
    assert_eq!((words[1] >> 2) & 0x7, 5);
    assert_eq!(words[1] & 0x3, 0);

    assert_eq!(words[2], 0x1E0);

    assert!(out.entries.is_none());
    assert!(out.externs.is_none());
}

// S2 — extern use.
#[test]
fn extern_use_is_logged_with_are_external() {
    let out = assemble_source(".extern EXT\nmov EXT, @r1\n").unwrap();
    assert!(out.entries.is_none());
    let externs = out.externs.unwrap();
    let mut lines = externs.lines();
    let line = lines.next().unwrap();
    assert!(lines.next().is_none());
    let mut parts = line.split_whitespace();
    assert_eq!(parts.next().unwrap(), "EXT");
    let addr: u32 = parts.next().unwrap().parse().unwrap();
    assert_eq!(addr, 101);

    let words: Vec<u16> = out.object.lines().map(decode_word).collect();
    let operand_word = words[1];
    assert_eq!(operand_word & 0x3, 0b01);
}

// S3 — entry round-trip.
#[test]
fn entry_round_trips_without_touching_externs() {
    let out = assemble_source(".entry LBL\nLBL: stop\n").unwrap();
    assert_eq!(out.entries.unwrap(), "LBL 100\n");
    assert!(out.externs.is_none());
}

// S4 — macro expansion is applied before the passes run.
#[test]
fn macro_invocation_assembles_as_its_expanded_body() {
    let expanded =
        assemble_source("add @r0, @r0\n").unwrap();
    let via_macro =
        assemble_source("mcro NOP\nadd @r0, @r0\nendmcro\nNOP\n").unwrap();
    assert_eq!(expanded.object, via_macro.object);
}

// S5 — error containment: a bad file reports its error and produces no
// output, without affecting how later files would be processed.
#[test]
fn missing_operand_produces_no_output() {
    let errors = assemble_source("mov @r0\n").unwrap_err();
    assert_eq!(errors.len(), 1);
}

// S6 — entry/extern conflict.
#[test]
fn entry_then_extern_conflict_is_reported() {
    let errors = assemble_source(".entry X\n.extern X\n").unwrap_err();
    assert_eq!(errors.len(), 1);
}

// Invariant 1: every emitted address lies in [100, 100 + 1024).
#[test]
fn addresses_stay_within_the_code_image_bounds() {
    let out = assemble_source("MAIN: mov @r1, @r2\nstop\n").unwrap();
    let count = out.object.lines().count();
    assert!(count > 0);
    assert!(100 + count <= 100 + 1024);
}

// Invariant 2: a label's value is the address of what follows it.
#[test]
fn label_value_is_the_address_of_the_following_word() {
    let out = assemble_source(".entry LBL\nstop\nLBL: stop\n").unwrap();
    assert_eq!(out.entries.unwrap(), "LBL 101\n");
}

// Invariant 4: one object-file line per emitted word, two base64 chars each.
#[test]
fn object_file_lines_are_two_characters_each() {
    let out = assemble_source("MAIN: mov @r3, @r5\nstop\n.data 1, 2, 3\n").unwrap();
    for line in out.object.lines() {
        assert_eq!(line.len(), 2);
    }
}

// Invariant 6: macro expansion is a no-op on macro-free input.
#[test]
fn macro_expansion_is_a_no_op_without_macro_blocks() {
    let source = "MAIN: mov @r1, @r2\nstop\n.data 1, -2, 3\n";
    use assembler::macros;
    let expanded = macros::expand(source).unwrap();
    assert_eq!(expanded, source);
}

// Invariant 7: bit layout of an instruction word matches its opcode/modes.
#[test]
fn instruction_word_bit_layout_matches_opcode_and_modes() {
    let out = assemble_source("MAIN: mov @r3, @r5\nstop\n").unwrap();
    let words: Vec<u16> = out.object.lines().map(decode_word).collect();
    let word = words[0];
    assert_eq!((word >> 5) & 0xF, 0); // mov opcode
    assert_eq!((word >> 2) & 0x7, 5); // dst mode: register
    assert_eq!((word >> 9) & 0x7, 5); // src mode: register
    assert_eq!(word & 0x3, 0);
}
