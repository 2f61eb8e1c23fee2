use gql_osi::codec::{CodecError, DateTimeCodec, FnCodec, JsonKindCodec};
use gql_osi::{Dialect, Direction, Error, Generator, Outcome, PathSegment, ScalarCodec, ScalarCodecs};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const SDL: &str = r#"
    scalar DateTime
    scalar Cents

    type Query {
        hello: String!
        person: Person
        favourite: Favourite
        node: Node
        scores: [Int]
        shelf: [Book!]
    }

    type Person {
        id: ID!
        name: String!
        bestFriend: Person
        born: DateTime
    }

    interface Node { id: ID! }

    type Color implements Node { id: ID! hex: String! }
    type Book implements Node { id: ID! author: String! price: Cents }

    union Favourite = Color | Book
"#;

fn cents() -> FnCodec {
    // wire: "12.34", internal: 1234
    FnCodec::new(
        |wire| {
            let parsed = wire
                .as_str()
                .and_then(|text| text.split_once('.'))
                .and_then(|(units, cents)| Some(units.parse::<i64>().ok()? * 100 + cents.parse::<i64>().ok()?));
            parsed
                .map(Value::from)
                .ok_or_else(|| CodecError::new(format!("Cents cannot represent value: {wire}")))
        },
        |internal| {
            internal
                .as_i64()
                .map(|cents| Value::from(format!("{}.{:02}", cents / 100, cents % 100)))
                .ok_or_else(|| CodecError::new(format!("Cents cannot serialize value: {internal}")))
        },
    )
    .with_wire_schema(json!({ "type": "string", "pattern": "^[0-9]+\\.[0-9]{2}$" }))
    .with_internal_schema(json!({ "type": "integer" }))
}

fn generator() -> Generator {
    let codecs = ScalarCodecs::new().with("DateTime", DateTimeCodec).with("Cents", cents());
    Generator::new(SDL, codecs).unwrap()
}

fn issue_paths(result: Result<Value, gql_osi::Issues>) -> Vec<Vec<PathSegment>> {
    result.unwrap_err().into_iter().map(|issue| issue.path).collect()
}

#[test]
fn hello_world_outcomes() {
    let generator = generator();
    let shape = generator.operation("{ hello }").unwrap();
    let validator = shape.validator().unwrap();

    let ok = Outcome::from(validator.normalize(&json!({ "hello": "world" })));
    assert_eq!(serde_json::to_value(ok).unwrap(), json!({ "value": { "hello": "world" } }));

    let bad = Outcome::from(validator.normalize(&json!({ "hello": 42 })));
    assert_eq!(
        serde_json::to_value(bad).unwrap(),
        json!({ "issues": [{ "message": "String cannot represent a non string value: 42", "path": ["hello"] }] })
    );
}

#[test]
fn absent_optional_field_becomes_null() {
    let generator = generator();
    let shape = generator.operation("query Me { person { id name bestFriend { id } } }").unwrap();
    let value = shape
        .validator()
        .unwrap()
        .normalize(&json!({ "person": { "id": "p1", "name": "Ann" } }))
        .unwrap();
    assert_eq!(value, json!({ "person": { "id": "p1", "name": "Ann", "bestFriend": null } }));
}

#[test]
fn every_null_non_null_sibling_is_reported() {
    let generator = generator();
    let shape = generator.operation("{ hello person { id name } }").unwrap();
    let paths = issue_paths(
        shape
            .validator()
            .unwrap()
            .normalize(&json!({ "hello": null, "person": { "id": null, "name": null } })),
    );
    assert_eq!(
        paths,
        vec![
            vec![PathSegment::Key("hello".into())],
            vec![PathSegment::Key("person".into()), PathSegment::Key("id".into())],
            vec![PathSegment::Key("person".into()), PathSegment::Key("name".into())],
        ]
    );
}

#[test]
fn union_value_is_checked_against_its_own_branch_only() {
    let generator = generator();
    let shape = generator
        .operation("{ favourite { ... on Color { hex } ... on Book { author } } }")
        .unwrap();
    let validator = shape.validator().unwrap();

    let paths = issue_paths(validator.normalize(&json!({ "favourite": { "__typename": "Book" } })));
    assert_eq!(paths, vec![vec![PathSegment::Key("favourite".into()), PathSegment::Key("author".into())]]);

    let color = validator
        .normalize(&json!({ "favourite": { "__typename": "Color", "hex": "#fff", "author": 1 } }))
        .unwrap();
    assert_eq!(color, json!({ "favourite": { "__typename": "Color", "hex": "#fff" } }));

    let paths = issue_paths(validator.normalize(&json!({ "favourite": { "__typename": "Person" } })));
    assert_eq!(paths, vec![vec![PathSegment::Key("favourite".into())]]);
}

#[test]
fn interface_fragments_apply_to_each_concrete_type() {
    let generator = generator();
    let shape = generator
        .operation("{ node { ...Ident ... on Book { author } } } fragment Ident on Node { id }")
        .unwrap();
    let validator = shape.validator().unwrap();
    let book = validator
        .normalize(&json!({ "node": { "__typename": "Book", "id": "b", "author": "Le Guin" } }))
        .unwrap();
    assert_eq!(book, json!({ "node": { "__typename": "Book", "id": "b", "author": "Le Guin" } }));
    let color = validator.normalize(&json!({ "node": { "__typename": "Color", "id": "c" } })).unwrap();
    assert_eq!(color, json!({ "node": { "__typename": "Color", "id": "c" } }));

    let schema = shape.json_schema(Direction::Wire, Dialect::Draft2020_12).unwrap();
    let arms = schema["properties"]["node"]["anyOf"][0]["oneOf"].as_array().unwrap();
    let titles: Vec<&Value> = arms.iter().map(|arm| &arm["allOf"][1]["title"]).collect();
    assert_eq!(titles, [&json!("Ident"), &json!("Ident")]);
}

#[test]
fn list_elements_are_independent() {
    let generator = generator();
    let shape = generator.operation("{ scores shelf { author } }").unwrap();
    let validator = shape.validator().unwrap();

    let value = validator.normalize(&json!({ "scores": [1, null, 3], "shelf": [] })).unwrap();
    assert_eq!(value, json!({ "scores": [1, null, 3], "shelf": [] }));

    let paths = issue_paths(validator.normalize(&json!({
        "scores": [1, "two", 3],
        "shelf": [{ "author": "a" }, null, { "author": "b" }]
    })));
    assert_eq!(
        paths,
        vec![
            vec![PathSegment::Key("scores".into()), PathSegment::Index(1)],
            vec![PathSegment::Key("shelf".into()), PathSegment::Index(1)],
        ]
    );
}

#[test]
fn normalize_is_idempotent() {
    let generator = generator();
    let shape = generator
        .operation(
            "{ hello person { name born bestFriend { name } } favourite { __typename ... on Book { author price } } scores }",
        )
        .unwrap();
    let validator = shape.validator().unwrap();
    let once = validator
        .normalize(&json!({
            "hello": "hi",
            "person": { "name": "Ann", "born": "2020-05-01T10:00:00+02:00", "extra": true },
            "favourite": { "__typename": "Book", "author": "Ursula", "price": "12.50" },
            "scores": [1, null]
        }))
        .unwrap();
    let twice = validator.normalize(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn custom_scalars_convert_in_both_directions() {
    let generator = generator();
    let shape = generator.operation("{ favourite { ... on Book { price } } }").unwrap();
    let validator = shape.validator().unwrap();

    let wire = json!({ "favourite": { "__typename": "Book", "price": "12.05" } });
    let internal = validator.deserialize(&wire).unwrap();
    assert_eq!(internal, json!({ "favourite": { "__typename": "Book", "price": 1205 } }));
    assert_eq!(validator.serialize(&internal).unwrap(), wire);

    let err = validator.deserialize(&json!({ "favourite": { "__typename": "Book", "price": 12 } })).unwrap_err();
    let issue = err.iter().next().unwrap();
    assert_eq!(issue.message, "Cents cannot represent value: 12");
    assert_eq!(issue.path_string(), "favourite.price");
}

#[test]
fn codec_round_trip_lands_in_the_wire_schema() {
    let codec = DateTimeCodec;
    let wire_type = codec.wire_schema()["type"].clone();
    for wire in ["2021-03-04T05:06:07Z", "2021-03-04T05:06:07.890-05:00"] {
        let back = codec.serialize(&codec.deserialize(&json!(wire)).unwrap()).unwrap();
        assert!(back.is_string());
        assert_eq!(wire_type, json!("string"));
        assert_eq!(codec.deserialize(&back).unwrap(), codec.deserialize(&json!(wire)).unwrap());
    }
}

#[test]
fn direction_picks_the_scalar_fragment() {
    let generator = generator();
    let shape = generator.operation("{ person { born } }").unwrap();
    let wire = shape.json_schema(Direction::Wire, Dialect::Draft07).unwrap();
    let internal = shape.json_schema(Direction::Internal, Dialect::Draft07).unwrap();
    assert_eq!(wire["definitions"]["scalar.DateTime"]["format"], json!("date-time"));
    assert_eq!(internal["definitions"]["scalar.DateTime"]["type"], json!("integer"));
    // the rest of the tree is the same in both directions
    assert_eq!(wire["properties"], internal["properties"]);
}

#[test]
fn fatal_errors_abort() {
    let generator = generator();
    assert!(matches!(generator.operation("{ hello } { hello }"), Err(Error::InvalidDocument(_))));
    assert!(matches!(generator.operation("{ nope }"), Err(Error::InvalidDocument(_))));
    assert!(matches!("draft-04".parse::<Dialect>(), Err(Error::UnsupportedDialect(_))));
    assert!(matches!(
        Generator::new("type Query { a: Nope }", ScalarCodecs::new()),
        Err(Error::SchemaType(_))
    ));

    let bare = Generator::new(SDL, ScalarCodecs::new().with("Cents", JsonKindCodec::string())).unwrap();
    let shape = bare.operation("{ person { born } }").unwrap();
    assert!(matches!(shape.validator(), Err(Error::UnknownScalar(name)) if name == "DateTime"));
    assert!(matches!(
        shape.json_schema(Direction::Wire, Dialect::Draft2020_12),
        Err(Error::UnknownScalar(name)) if name == "DateTime"
    ));
}

#[test]
fn fragment_documents() {
    let generator = generator();
    let source = "fragment BookCard on Book { author } fragment ColorChip on Color { hex }";
    assert!(generator.fragment(source, None).is_err());
    let shape = generator.fragment(source, Some("ColorChip")).unwrap();
    let schema = shape.json_schema(Direction::Wire, Dialect::Draft2020_12).unwrap();
    assert_eq!(schema["title"], json!("Color"));
    assert_eq!(schema["required"], json!(["hex"]));
    let value = shape.validator().unwrap().normalize(&json!({ "hex": "#000" })).unwrap();
    assert_eq!(value, json!({ "hex": "#000" }));
}

#[test]
fn repeated_keys_are_merged_by_both_outputs() {
    let generator = generator();
    let shape = generator.operation("{ person { name } person { id bestFriend { name } } }").unwrap();

    let schema = shape.json_schema(Direction::Wire, Dialect::Draft2020_12).unwrap();
    let person = &schema["properties"]["person"]["anyOf"][0];
    assert_eq!(person["required"], json!(["name", "id", "bestFriend"]));

    let value = shape
        .validator()
        .unwrap()
        .normalize(&json!({ "person": { "id": "p", "name": "Ann", "bestFriend": null } }))
        .unwrap();
    let keys: Vec<&str> = value["person"].as_object().unwrap().keys().map(String::as_str).collect();
    let required: Vec<&str> =
        person["required"].as_array().unwrap().iter().filter_map(Value::as_str).collect();
    assert_eq!(keys, required);
}

#[test]
fn recursive_fragment_documents_are_rejected() {
    let generator = generator();
    let err = generator.fragment("fragment F on Person { name bestFriend { ...F } }", None).unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(message) if message.contains("spreads itself")));

    // recursion through a named fragment that is not the target
    let source = "fragment Card on Person { name ...Friend } fragment Friend on Person { bestFriend { ...Card } }";
    assert!(matches!(generator.fragment(source, Some("Card")), Err(Error::InvalidDocument(_))));
}

#[test]
fn undefined_spreads_are_rejected_before_either_output() {
    let generator = generator();
    let err = generator.fragment("fragment F on Person { name ...Missing }", None).unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(message) if message.contains("`Missing`")));
    assert!(matches!(
        generator.operation("{ person { ...Missing } }"),
        Err(Error::InvalidDocument(_))
    ));
}

#[test]
fn fragment_shapes_agree_across_spreads() {
    let generator = generator();
    let source = "fragment Card on Person { name bestFriend { ...Tag } } fragment Tag on Person { id }";
    let shape = generator.fragment(source, Some("Card")).unwrap();

    let schema = shape.json_schema(Direction::Wire, Dialect::Draft2020_12).unwrap();
    assert_eq!(schema["required"], json!(["name", "bestFriend"]));
    let friend = &schema["properties"]["bestFriend"]["anyOf"][0];
    assert_eq!(friend["allOf"][1]["required"], json!(["id"]));

    let validator = shape.validator().unwrap();
    let value = validator
        .normalize(&json!({ "name": "Ann", "bestFriend": { "id": "b", "name": "dropped" } }))
        .unwrap();
    assert_eq!(value, json!({ "name": "Ann", "bestFriend": { "id": "b" } }));
    let paths = issue_paths(validator.normalize(&json!({ "name": "Ann", "bestFriend": {} })));
    assert_eq!(paths, vec![vec![PathSegment::Key("bestFriend".into()), PathSegment::Key("id".into())]]);
}

#[test]
fn validators_are_shared_across_threads() {
    let generator = generator();
    let shape = generator.operation("{ hello }").unwrap();
    let validator = shape.validator().unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let value = json!({ "hello": format!("hi {i}") });
                scope.spawn(move || validator.normalize(&value))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    });
}
