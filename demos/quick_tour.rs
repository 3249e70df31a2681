use conf_kit::{ConfigStore, Mapping, Value};
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=conf_kit=debug shows every lazy value being forced
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut conf = ConfigStore::new();

    // set/get
    conf.set("email", "info@example.com").unwrap();
    println!("{}", conf.get("email").unwrap()); // "info@example.com"

    // get deep item
    let db: Value = [
        ("host", "127.0.0.1"),
        ("username", "admin"),
        ("password", "qwerty12345"),
    ]
    .into_iter()
    .collect();
    conf.set("db", db).unwrap();
    println!("{}", conf.get("db.username").unwrap()); // "admin"

    // default value
    println!("{}", conf.get("db.charset").unwrap()); // null
    println!("{}", conf.get_or("db.charset", "UTF-8").unwrap()); // "UTF-8"

    // remove
    conf.remove("db.password").unwrap();
    println!("{}", conf.get("db.password").unwrap()); // null

    // set deep item, missing mappings are created on the way
    conf.set("db.options.attr.3", 2).unwrap();
    println!("{}", conf.get_or("db.options.attr", Mapping::new()).unwrap()); // {"3": 2}

    // lazy set: the producer runs on the first lookup only
    conf.lazy_set(
        "some.heavy.setting",
        |args| {
            print!("loading from [{}]...", args[0].as_str().unwrap_or_default());
            let entry: Value = [("name", "ABC")].into_iter().collect();
            Ok([("0", entry)].into_iter().collect())
        },
        vec!["heavy.dat".into()],
        false,
    )
    .unwrap();
    // loading from [heavy.dat]...{"0": {"name": "ABC"}}
    println!("{}", conf.get("some.heavy.setting").unwrap());
    println!("{}", conf.get("some.heavy.setting").unwrap()); // {"0": {"name": "ABC"}}

    // lazy default value, computed on every miss
    let timeout = conf.get_or("defaults.timeout", 200).unwrap();
    let value = conf
        .get_or_else(
            "db.options.attr.2",
            |args| {
                print!("load default.");
                Ok(args[0].clone())
            },
            vec![timeout],
        )
        .unwrap();
    println!("{value}"); // load default.200
}
