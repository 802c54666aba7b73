//! Fuzz target: feed arbitrary bytes to the schema loader and the address decoder.
//! Neither may panic; both return Ok or a typed error.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let _ = fieldaddr::parse(s);
    let _ = fieldaddr::load_schema(s.lines());

    let schema = fieldaddr::parse("a 16\nb 5 fixed 2\nc 64\nd 43\n").expect("fixed schema");
    if let Ok(values) = fieldaddr::decode(&schema, s) {
        assert_eq!(values.len(), schema.len());
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
