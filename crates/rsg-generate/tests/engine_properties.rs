use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use rsg_generate::builtins::{base_rule_set, collections, primitives};
use rsg_generate::{
    Bounds, GenerationError, Generator, GeneratorType, ParamKind, ParamSpec, RuleSet, Value,
};

fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

fn letters() -> RuleSet {
    RuleSet::new("letters")
        .leaf("a", |_| Ok(Value::from("A")))
        .leaf("b", |_| Ok(Value::from("B")))
}

fn structures() -> Arc<GeneratorType> {
    GeneratorType::from_rule_set(RuleSet::new("structures").composite("my_struct", |call| {
        Ok(Value::Node {
            tag: "my_struct".to_string(),
            children: call.children,
        })
    }))
    .expect("build structures")
}

fn count_nodes(value: &Value) -> usize {
    1 + value.children().into_iter().map(count_nodes).sum::<usize>()
}

/// Walk every container and check its child count against the breadth bounds.
fn assert_breadth(value: &Value, depth_left: u32, bounds: &Bounds) {
    if !value.is_container() {
        return;
    }
    let children = value.children();
    if depth_left == 0 {
        assert!(children.is_empty(), "container at depth 0 has children");
    } else {
        let len = children.len() as u32;
        assert!(
            (bounds.min_breadth..=bounds.max_breadth).contains(&len),
            "breadth {len} outside bounds"
        );
    }
    for child in children {
        assert_breadth(child, depth_left.saturating_sub(1), bounds);
    }
}

#[test]
fn empty_type_always_yields_null() {
    let ty = GeneratorType::builder("empty").build().expect("build empty type");
    let mut generator = Generator::builder(ty).build().expect("build generator");
    let mut rng = rng(1);
    for _ in 0..10 {
        assert!(generator.generate(&mut rng).expect("generate").is_null());
    }
}

#[test]
fn single_leaf_always_wins() {
    let ty = GeneratorType::from_rule_set(
        RuleSet::new("a_letter").leaf("a_letter", |_| Ok(Value::from("A"))),
    )
    .expect("build type");
    let mut generator = Generator::builder(ty).build().expect("build generator");
    let mut rng = rng(2);
    for _ in 0..10 {
        assert_eq!(generator.generate(&mut rng).expect("generate"), Value::from("A"));
    }
}

#[test]
fn leaf_only_type_ignores_depth_and_breadth() {
    let ty = GeneratorType::from_rule_set(letters()).expect("build type");
    let mut rng = rng(3);

    let mut weighted = Generator::builder(Arc::clone(&ty))
        .chance("a", 0.1)
        .chance("b", 0.9)
        .build()
        .expect("weighted generator");
    let mut deep = Generator::builder(Arc::clone(&ty))
        .depth(10, 11)
        .chance("a", 0.1)
        .chance("b", 0.9)
        .build()
        .expect("deep generator");
    let mut wide = Generator::builder(ty)
        .breadth(10, 20)
        .build()
        .expect("wide generator");

    for generator in [&mut weighted, &mut deep, &mut wide] {
        for _ in 0..10 {
            let value = generator.generate(&mut rng).expect("generate");
            assert!(value == Value::from("A") || value == Value::from("B"));
        }
    }
    assert!(deep.used_fallback());
    assert_eq!(deep.weight_of("a"), Some(0.1));
    assert_eq!(deep.weight_of("b"), Some(0.9));
}

#[test]
fn composite_without_depth_is_empty() {
    let mut generator = Generator::builder(structures())
        .depth(0, 0)
        .build()
        .expect("build generator");
    let mut rng = rng(4);
    for _ in 0..10 {
        assert_eq!(
            generator.generate(&mut rng).expect("generate"),
            Value::Node {
                tag: "my_struct".to_string(),
                children: Vec::new(),
            }
        );
    }
}

#[test]
fn list_without_depth_is_empty() {
    let ty = GeneratorType::from_rule_set(collections::list_rules()).expect("build list type");
    let mut generator = Generator::builder(ty).depth(0, 0).build().expect("build generator");
    let mut rng = rng(5);
    for _ in 0..10 {
        assert_eq!(generator.generate(&mut rng).expect("generate"), Value::List(Vec::new()));
    }
}

#[test]
fn composite_only_type_recurses_into_structures() {
    let bounds = Bounds::new(2, 4, 2, 5);
    let mut generator = Generator::builder(structures())
        .bounds(bounds)
        .build()
        .expect("build generator");
    let mut rng = rng(6);
    for _ in 0..10 {
        let value = generator.generate(&mut rng).expect("generate");
        assert!(matches!(value, Value::Node { .. }));
        assert!(value.depth() <= bounds.max_depth);
        assert_breadth(&value, bounds.max_depth, &bounds);
    }
}

#[test]
fn required_parameter_is_resolved_from_config() {
    let ty = GeneratorType::from_rule_set(
        RuleSet::new("repeats")
            .composite("list", |call| Ok(Value::List(call.children)))
            .leaf_with(
                "a",
                &[ParamSpec::required("repeats", ParamKind::Int)],
                |call| {
                    let repeats = call.params.require_u64("repeats")?;
                    Ok(Value::Str("a".repeat(repeats as usize)))
                },
            ),
    )
    .expect("build type");

    fn check(value: &Value) {
        match value {
            Value::List(items) => items.iter().for_each(check),
            other => assert_eq!(other, &Value::from("aaaa")),
        }
    }

    let mut generator = Generator::builder(Arc::clone(&ty))
        .depth(2, 4)
        .breadth(2, 5)
        .set("repeats", 4)
        .build()
        .expect("build generator");
    let mut rng = rng(7);
    for _ in 0..10 {
        check(&generator.generate(&mut rng).expect("generate"));
    }

    let mut missing = Generator::builder(ty)
        .depth(0, 0)
        .build()
        .expect("construction does not validate parameters");
    let err = missing.generate(&mut rng).expect_err("repeats is missing");
    assert!(matches!(
        err,
        GenerationError::MissingConfiguration { ref rule, ref param } if rule == "a" && param == "repeats"
    ));
}

#[test]
fn composite_with_missing_parameter_fails_before_children() {
    let ty = GeneratorType::from_rule_set(RuleSet::new("repeated").composite_with(
        "rep",
        &[ParamSpec::required("repeats", ParamKind::Int)],
        |call| {
            let repeats = call.params.require_u64("repeats")?;
            let mut items = Vec::new();
            for _ in 0..repeats {
                items.extend(call.children.iter().cloned());
            }
            Ok(Value::List(items))
        },
    ))
    .expect("build type");

    let mut generator = Generator::builder(ty).build().expect("build generator");
    let err = generator.generate(&mut rng(13)).expect_err("repeats is missing");
    assert!(matches!(
        err,
        GenerationError::MissingConfiguration { ref rule, ref param } if rule == "rep" && param == "repeats"
    ));

    let report = generator.report();
    assert_eq!(report.instances, 1, "no child template should be created");
    assert_eq!(report.values_generated, 0);
}

#[test]
fn missing_parameter_surfaces_from_nested_levels() {
    let ty = GeneratorType::from_rule_set(
        RuleSet::new("powers")
            .composite("list", |call| Ok(Value::List(call.children)))
            .leaf_with("power", &[ParamSpec::required("base", ParamKind::Int)], |call| {
                Ok(Value::Int(call.params.require_i64("base")?))
            }),
    )
    .expect("build type");
    let mut generator = Generator::builder(ty)
        .depth(1, 2)
        .breadth(1, 1)
        .build()
        .expect("build generator");
    let err = generator.generate(&mut rng(8)).expect_err("base is missing");
    assert!(matches!(err, GenerationError::MissingConfiguration { .. }));
}

#[test]
fn generation_terminates_and_respects_depth() {
    let ty = GeneratorType::from_rule_set(base_rule_set()).expect("build base type");
    let mut rng = rng(9);
    for max_depth in 0..=5 {
        let bounds = Bounds::new(0, max_depth, 1, 3);
        let mut generator = Generator::builder(Arc::clone(&ty))
            .bounds(bounds)
            .build()
            .expect("build generator");
        for _ in 0..25 {
            let value = generator.generate(&mut rng).expect("generate");
            assert!(value.depth() <= max_depth, "depth exceeded for {max_depth}");
            assert_breadth(&value, max_depth, &bounds);
        }
    }
}

#[test]
fn min_depth_forces_a_container_at_the_root() {
    let ty = GeneratorType::builder("mixed")
        .include(primitives::int_rules())
        .include(collections::list_rules())
        .build()
        .expect("build type");
    let mut generator = Generator::builder(ty)
        .depth(2, 3)
        .breadth(1, 2)
        .build()
        .expect("build generator");
    let mut rng = rng(10);
    for _ in 0..20 {
        let value = generator.generate(&mut rng).expect("generate");
        let Value::List(children) = &value else {
            panic!("root must be a list while min_depth > 0");
        };
        for child in children {
            assert!(matches!(child, Value::List(_)), "second level must be a list");
        }
    }
}

#[test]
fn weights_bias_selection() {
    let ty = GeneratorType::from_rule_set(letters()).expect("build type");
    let mut generator = Generator::builder(ty)
        .chance("a", 0.9)
        .chance("b", 0.1)
        .build()
        .expect("build generator");
    let mut rng = rng(11);
    let mut a = 0_u32;
    let mut b = 0_u32;
    for value in generator.values(&mut rng).take(10_000) {
        match value.expect("generate").as_str() {
            Some("A") => a += 1,
            Some("B") => b += 1,
            other => panic!("unexpected value {other:?}"),
        }
    }
    assert!(a > 3 * b, "expected A to dominate: a={a} b={b}");

    let report = generator.report();
    assert_eq!(report.values_generated, 10_000);
    assert_eq!(report.rule_usage.get("a").copied(), Some(u64::from(a)));
}

#[test]
fn child_template_serves_every_child() {
    let ty = GeneratorType::from_rule_set(collections::list_rules()).expect("build type");
    let mut generator = Generator::builder(ty)
        .depth(0, 3)
        .breadth(2, 2)
        .build()
        .expect("build generator");
    let mut rng = rng(12);
    let value = generator.generate(&mut rng).expect("generate");
    assert_eq!(count_nodes(&value), 1 + 2 + 4 + 8);

    let report = generator.report();
    assert_eq!(report.instances, 4);
    assert_eq!(report.invocations(), 15);
    assert_eq!(report.fallback_instances, 1);
}

#[test]
fn seeded_generation_is_repeatable() {
    let ty = GeneratorType::from_rule_set(base_rule_set()).expect("build base type");
    let draw = |seed| {
        let mut generator = Generator::builder(Arc::clone(&ty))
            .build()
            .expect("build generator");
        let mut rng = rng(seed);
        generator
            .values(&mut rng)
            .take(5)
            .collect::<Result<Vec<_>, _>>()
            .expect("generate")
    };
    assert_eq!(draw(42), draw(42));
}

#[test]
fn thread_rng_iteration_produces_values() {
    let ty = GeneratorType::from_rule_set(primitives::int_rules()).expect("build int type");
    let generator = Generator::builder(ty).build().expect("build generator");
    for value in generator.take(10) {
        assert!(value.expect("generate").as_i64().is_some());
    }
}
