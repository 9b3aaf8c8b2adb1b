use rsg_generate::builtins::primitives::int_rules;
use rsg_generate::{Generator, GeneratorType, RuleSet, Value};

fn main() {
    let foo = RuleSet::new("foo").leaf("foo", |_| Ok(Value::from("foo")));
    let bar = RuleSet::new("bar").leaf("bar", |_| Ok(Value::from("bar")));
    let struct_node = RuleSet::new("struct").composite("struct", |call| {
        Ok(Value::Node {
            tag: "Struct".to_string(),
            children: call.children,
        })
    });

    let ty = GeneratorType::builder("mixin")
        .include(foo)
        .include(bar)
        .include(int_rules())
        .include(struct_node)
        .build()
        .expect("build generator type");
    println!("rules: {}", ty.rule_names().join(", "));

    let generator = Generator::builder(ty)
        .depth(1, 2)
        .set("max_int_val", 9)
        .build()
        .expect("build generator");
    for value in generator.take(3) {
        println!("{}", value.expect("generate value"));
    }
}
