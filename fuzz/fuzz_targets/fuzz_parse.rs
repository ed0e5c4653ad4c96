#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary bytes in, parse, and when parsing succeeds, round-trip through
// the emitter. Goal: no panics, and emitted text always re-parses.
fuzz_target!(|data: &[u8]| {
    if let Ok(tree) = jsondoc_core::parse_bytes(data) {
        let text = jsondoc_core::emit(&tree, &Default::default())
            .expect("parsed trees contain no non-finite numbers");
        let reparsed = jsondoc_core::parse(&text).expect("emitted text must re-parse");
        assert_eq!(reparsed, tree);
    }
});
