// Runtime registry tests: typed access, default forwarding, copying and
// registries populated from the fixture modules.

use compiler_options::error::RegistryError;
use compiler_options::{
    load_registry, load_test_registry, Category, DefaultExpr, OptionKind, OptionRegistry,
    OptionType, OptionValue,
};
use std::path::PathBuf;

fn module_list() -> String {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("modules");
    format!(
        "\"{}\",\"{}\"",
        dir.join("compiler").display(),
        dir.join("runtime").display()
    )
}

fn small_registry() -> OptionRegistry {
    let mut reg = OptionRegistry::new();
    reg.add_boolean_option("a", OptionType::Compiler, Category::User, true, true, "A")
        .unwrap();
    reg.add_boolean_option(
        "b",
        OptionType::Compiler,
        Category::User,
        DefaultExpr::invert_of_key("a"),
        DefaultExpr::invert_of_key("a"),
        "B",
    )
    .unwrap();
    reg.add_real_option(
        "tol",
        OptionType::Runtime,
        Category::Common,
        1e-6,
        1e-3,
        "Tolerance",
    )
    .unwrap();
    reg.add_real_option(
        "event_tol",
        OptionType::Runtime,
        Category::Uncommon,
        DefaultExpr::copy_of(OptionKind::Real, "tol"),
        DefaultExpr::copy_of(OptionKind::Real, "tol"),
        "Event tolerance",
    )
    .unwrap();
    reg
}

#[test]
fn test_invert_default_follows_source() {
    let mut reg = small_registry();
    assert!(!reg.get_boolean_option("b").unwrap());

    reg.set_boolean_option("a", false).unwrap();
    assert!(reg.get_boolean_option("b").unwrap());

    reg.set_boolean_option("b", false).unwrap();
    reg.set_boolean_option("a", true).unwrap();
    assert!(!reg.get_boolean_option("b").unwrap());
    assert!(reg.get_boolean_option_default("b").is_ok());
}

#[test]
fn test_copy_default_follows_source() {
    let mut reg = small_registry();
    assert_eq!(reg.get_real_option("event_tol").unwrap(), 1e-6);
    reg.set_real_option("tol", 1e-8).unwrap();
    assert_eq!(reg.get_real_option("event_tol").unwrap(), 1e-8);
    assert_eq!(reg.get_real_option_default("event_tol").unwrap(), 1e-8);
}

#[test]
fn test_test_registry_reads_test_defaults() {
    let mut reg = OptionRegistry::new_test();
    reg.add_real_option("tol", OptionType::Runtime, Category::Common, 1e-6, 1e-3, "")
        .unwrap();
    reg.add_real_option(
        "event_tol",
        OptionType::Runtime,
        Category::Common,
        DefaultExpr::copy_of(OptionKind::Real, "tol"),
        DefaultExpr::copy_of(OptionKind::Real, "tol"),
        "",
    )
    .unwrap();
    assert!(reg.is_test());
    assert_eq!(reg.get_real_option("tol").unwrap(), 1e-3);
    assert_eq!(reg.get_real_option("event_tol").unwrap(), 1e-3);
    assert_eq!(reg.get_real_option_default("tol").unwrap(), 1e-6);
    assert!(reg.copy().is_test());
}

#[test]
fn test_copy_is_independent() {
    let mut reg = small_registry();
    reg.set_real_option("tol", 1e-4).unwrap();
    let mut copy = reg.copy();
    copy.set_real_option("tol", 1e-2).unwrap();

    assert_eq!(reg.get_real_option("tol").unwrap(), 1e-4);
    assert_eq!(copy.get_real_option("tol").unwrap(), 1e-2);
    assert_eq!(copy.get_real_option("event_tol").unwrap(), 1e-2);
    assert_eq!(reg.get_real_option("event_tol").unwrap(), 1e-4);
}

#[test]
fn test_copy_all_options_round_trip() {
    let mut source = small_registry();
    source.set_boolean_option("a", false).unwrap();

    let mut target = OptionRegistry::new();
    target.copy_all_options(&source).unwrap();
    assert_eq!(target.option_keys(), source.option_keys());
    assert!(!target.get_boolean_option("a").unwrap());
    assert!(target.get_boolean_option("b").unwrap());
    assert!(!target.option("b").unwrap().is_set());
}

#[test]
fn test_copy_all_options_is_all_or_nothing() {
    let mut target = OptionRegistry::new();
    target
        .add_real_option("a", OptionType::Compiler, Category::User, 0.0, 0.0, "")
        .unwrap();
    target
        .add_integer_option("zzz", OptionType::Compiler, Category::User, 1i64, 1i64, "")
        .unwrap();
    let before = target.option_keys();

    let mut source = small_registry();
    source.set_boolean_option("a", false).unwrap();
    let result = target.copy_all_options(&source);
    assert!(matches!(result, Err(RegistryError::WrongKind { .. })));
    assert_eq!(target.option_keys(), before);
}

#[test]
fn test_kind_mismatch_and_unknown_keys() {
    let reg = small_registry();
    match reg.get_integer_option("tol") {
        Err(e @ RegistryError::WrongKind { .. }) => {
            assert_eq!(e.to_string(), "Option: tol is not of integer type")
        }
        other => panic!("Expected WrongKind, got {:?}", other),
    }
    match reg.get_real_option("tols") {
        Err(e @ RegistryError::UnknownOption { .. }) => {
            assert_eq!(e.to_string(), "Unknown option \"tols\", did you mean \"tol\"?")
        }
        other => panic!("Expected UnknownOption, got {:?}", other),
    }
}

#[test]
fn test_bounds_only_widen() {
    let mut reg = OptionRegistry::new();
    reg.add_bounded_integer_option(
        "n",
        OptionType::Compiler,
        Category::User,
        5i64,
        5i64,
        "",
        0..=10,
    )
    .unwrap();
    assert!(reg.set_integer_option("n", 11).is_err());

    reg.expand_integer_option_max("n", 20).unwrap();
    reg.expand_integer_option_max("n", 15).unwrap();
    assert_eq!(reg.get_integer_option_max("n").unwrap(), 20);
    reg.expand_integer_option_min("n", 3).unwrap();
    assert_eq!(reg.get_integer_option_min("n").unwrap(), 0);
    reg.set_integer_option("n", 11).unwrap();
    assert_eq!(reg.get_integer_option("n").unwrap(), 11);
}

#[test]
fn test_circular_defaults_are_reported() {
    let mut reg = OptionRegistry::new();
    reg.add_boolean_option(
        "x",
        OptionType::Compiler,
        Category::User,
        DefaultExpr::invert_of_key("y"),
        false,
        "",
    )
    .unwrap();
    reg.add_boolean_option(
        "y",
        OptionType::Compiler,
        Category::User,
        DefaultExpr::copy_of(OptionKind::Boolean, "x"),
        false,
        "",
    )
    .unwrap();
    assert!(matches!(
        reg.get_boolean_option("x"),
        Err(RegistryError::CircularDefault { .. })
    ));
    reg.set_boolean_option("y", true).unwrap();
    assert!(!reg.get_boolean_option("x").unwrap());
}

mod populated {
    use super::*;

    #[test]
    fn test_load_registry_from_modules() {
        let reg = load_registry(&module_list()).unwrap();
        assert_eq!(
            reg.option_keys(),
            vec![
                "enforce_bounds",
                "generate_dae",
                "generate_ode",
                "log_level",
                "nle_solver",
                "nle_solver_tol",
            ]
        );
        assert!(!reg.has_option("debug_dump"));
        assert!(reg.get_boolean_option("generate_ode").unwrap());
        assert!(!reg.get_boolean_option("generate_dae").unwrap());
        assert_eq!(reg.get_integer_option("log_level").unwrap(), 4);
        assert_eq!(reg.get_integer_option_max("log_level").unwrap(), 8);
        assert_eq!(reg.get_real_option("nle_solver_tol").unwrap(), 1e-10);
        assert_eq!(reg.get_string_option("nle_solver").unwrap(), "kinsol");
        assert_eq!(
            reg.description("nle_solver").unwrap(),
            "Nonlinear solver used to solve algebraic loops."
        );
        assert_eq!(reg.category("log_level").unwrap(), Category::Internal);
        assert_eq!(
            reg.runtime_option_keys(),
            vec!["enforce_bounds", "log_level", "nle_solver_tol"]
        );
    }

    #[test]
    fn test_populated_registry_enforces_declared_limits() {
        let mut reg = load_registry(&module_list()).unwrap();
        assert!(reg.set_integer_option("log_level", 9).is_err());
        assert!(reg.set_real_option("nle_solver_tol", 2.0).is_err());
        match reg.set_option("nle_solver", "newton") {
            Err(e) => assert_eq!(
                e.to_string(),
                "Invalid value \"newton\" for option \"nle_solver\", allowed values: kinsol, minpack, realtime"
            ),
            Ok(()) => panic!("Expected invalid value"),
        }
        reg.set_option("generate_ode", "off").unwrap();
        assert!(reg.get_boolean_option("generate_dae").unwrap());
        assert_eq!(reg.value("generate_ode").unwrap(), OptionValue::Boolean(false));
    }

    #[test]
    fn test_load_test_registry_uses_test_defaults() {
        let reg = load_test_registry(&module_list()).unwrap();
        assert_eq!(reg.get_integer_option("log_level").unwrap(), 3);
        assert!(!reg.get_boolean_option("enforce_bounds").unwrap());
        assert_eq!(reg.get_integer_option_default("log_level").unwrap(), 4);
    }
}
