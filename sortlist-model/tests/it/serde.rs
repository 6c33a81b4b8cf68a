use sortlist_model::{ItemsChanged, SorterChange};

macro_rules! test {
    ($test_name:ident: $value:expr => $json:expr) => {
        #[test]
        fn $test_name() -> Result<(), Box<dyn std::error::Error>> {
            let json = serde_json::to_string(&$value)?;

            assert_eq!(json, $json);

            Ok(())
        }
    };
}

test!(items_changed: ItemsChanged::new(1, 2, 3) => r#"{"position":1,"removed":2,"added":3}"#);
test!(items_changed_noop: ItemsChanged::default() => r#"{"position":0,"removed":0,"added":0}"#);
test!(different: SorterChange::Different => r#""Different""#);
test!(inverted: SorterChange::Inverted => r#""Inverted""#);
test!(less_strict: SorterChange::LessStrict => r#""LessStrict""#);
test!(more_strict: SorterChange::MoreStrict => r#""MoreStrict""#);
