use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rsg_generate::builtins::collections::list_rules;
use rsg_generate::{
    Generator, GeneratorType, ParamDefault, ParamKind, ParamSpec, RuleSet, Value,
};

fn main() {
    let powers = RuleSet::new("powers").leaf_with(
        "power",
        &[
            ParamSpec::required("base", ParamKind::Int),
            ParamSpec::optional("max_exp", ParamDefault::Int(5)),
        ],
        |call| {
            let base = call.params.require_i64("base")?;
            let exp = call.rng.random_range(0..=call.params.require_u64("max_exp")?);
            Ok(Value::Int(base.saturating_pow(exp as u32)))
        },
    );

    let ty = GeneratorType::builder("list_of_powers")
        .include(list_rules())
        .include(powers)
        .build()
        .expect("build generator type");
    let mut generator = Generator::builder(ty)
        .depth(1, 3)
        .breadth(2, 4)
        .set("base", 2)
        .chance("list", 0.3)
        .build()
        .expect("build generator");

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for value in generator.values(&mut rng).take(5) {
        println!("{}", value.expect("generate value"));
    }

    let report = generator.report();
    println!(
        "{}",
        serde_json::to_string_pretty(&report).expect("serialize report")
    );
}
