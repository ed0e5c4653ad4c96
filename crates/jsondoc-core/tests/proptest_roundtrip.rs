//! Property tests for the parse/emit pair: generated trees survive a
//! round trip byte-for-byte semantics-wise, and emission is idempotent for
//! every option combination.

use jsondoc_core::{emit, parse, EmitterOptions, Map, Node};
use proptest::prelude::*;

fn arb_float() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("JSON has no non-finite numbers", |f| f.is_finite())
}

fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        Just(Node::Null),
        any::<bool>().prop_map(Node::Bool),
        any::<i64>().prop_map(Node::Int),
        arb_float().prop_map(Node::Float),
        ".*".prop_map(Node::Str),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Node::Array),
            prop::collection::vec((".*", inner), 0..6).prop_map(|pairs| {
                let mut fields = Map::new();
                for (key, value) in pairs {
                    fields.insert(key, value);
                }
                Node::Object(fields)
            }),
        ]
    })
}

fn option_matrix() -> Vec<EmitterOptions> {
    vec![
        EmitterOptions::default(),
        EmitterOptions {
            indent: 2,
            ..EmitterOptions::default()
        },
        EmitterOptions {
            indent: 3,
            sort_keys: true,
            ..EmitterOptions::default()
        },
        EmitterOptions {
            ascii_only: true,
            ..EmitterOptions::default()
        },
        EmitterOptions {
            indent: 2,
            sort_keys: true,
            ascii_only: true,
        },
    ]
}

proptest! {
    #[test]
    fn prop_minified_round_trip_is_identity(tree in arb_node()) {
        let text = emit(&tree, &EmitterOptions::default()).expect("finite tree emits");
        let reparsed = parse(&text).expect("emitted text parses");
        prop_assert_eq!(reparsed, tree);
    }

    #[test]
    fn prop_every_option_set_round_trips(tree in arb_node()) {
        for options in option_matrix() {
            let text = emit(&tree, &options).expect("finite tree emits");
            let reparsed = parse(&text)
                .unwrap_or_else(|e| panic!("emitted text must parse ({options:?}): {e}\n{text}"));
            prop_assert_eq!(&reparsed, &tree);
        }
    }

    #[test]
    fn prop_emit_is_idempotent(tree in arb_node()) {
        for options in option_matrix() {
            let once = emit(&tree, &options).expect("finite tree emits");
            let again = emit(&parse(&once).expect("parses"), &options).expect("emits");
            prop_assert_eq!(once, again);
        }
    }

    #[test]
    fn prop_int_and_float_variants_survive(value in any::<i64>(), float in arb_float()) {
        let int_text = emit(&Node::Int(value), &EmitterOptions::default()).unwrap();
        prop_assert!(parse(&int_text).unwrap().is_int());

        let float_text = emit(&Node::Float(float), &EmitterOptions::default()).unwrap();
        prop_assert!(parse(&float_text).unwrap().is_float());
    }
}
