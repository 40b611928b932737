use std::sync::Arc;

use chrono::NaiveDate;
use skybook_core::{
    CommandSource, DispatchDecision, Location, LocationCatalog, ParsedQueryIntent, QueryResolver,
    ResolverConfig,
};
use skybook_dispatch::{CommandRegistry, Dispatcher};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 19).unwrap()
}

fn small_catalog() -> LocationCatalog {
    LocationCatalog::new(vec![
        Location::new("SGN", "Hồ Chí Minh", &[]),
        Location::new("HAN", "Hà Nội", &[]),
    ])
    .expect("valid catalog")
}

fn resolve(text: &str, catalog: &LocationCatalog) -> ParsedQueryIntent {
    QueryResolver::new(ResolverConfig::default()).resolve(text, catalog, today())
}

fn dispatch(text: &str, catalog: &LocationCatalog) -> (ParsedQueryIntent, DispatchDecision) {
    let intent = resolve(text, catalog);
    let decision = Dispatcher::new(Arc::new(CommandRegistry::builtin())).dispatch(text, &intent);
    (intent, decision)
}

#[test]
fn complete_vietnamese_query_is_structured_search() {
    let (intent, decision) = dispatch(
        "tìm chuyến bay từ SGN đến HAN ngày 2025-12-01",
        &small_catalog(),
    );

    assert_eq!(intent.origin_code.as_deref(), Some("SGN"));
    assert_eq!(intent.destination_code.as_deref(), Some("HAN"));
    assert_eq!(
        intent.departure_date,
        NaiveDate::from_ymd_opt(2025, 12, 1)
    );
    assert!(intent.confidence >= 0.6);
    assert!(intent.is_valid);
    assert_eq!(decision, DispatchDecision::StructuredSearch { intent });
}

#[test]
fn query_without_date_is_partial_search() {
    let (intent, decision) = dispatch("bay từ SGN đến HAN", &small_catalog());

    assert_eq!(intent.origin_code.as_deref(), Some("SGN"));
    assert_eq!(intent.destination_code.as_deref(), Some("HAN"));
    assert_eq!(intent.departure_date, None);
    assert!(matches!(decision, DispatchDecision::PartialSearch { .. }));
}

#[test]
fn greeting_falls_back_to_conversation() {
    let (intent, decision) = dispatch("xin chào", &small_catalog());

    assert_eq!(intent.confidence, 0.0);
    assert!(!intent.is_valid);
    assert_eq!(
        decision,
        DispatchDecision::ConversationalFallback {
            message: "xin chào".to_string()
        }
    );
}

#[test]
fn registered_command_beats_a_parseable_query() {
    let (intent, decision) = dispatch("recommend SGN HAN 2025-12-01", &small_catalog());

    assert!(intent.is_valid && intent.is_complete());
    let command = decision.command().expect("rule command");
    assert_eq!(command.handler, "recommend_flights");
    assert_eq!(command.args, vec!["SGN", "HAN", "2025-12-01"]);
    assert_eq!(command.source, CommandSource::Registry);
}

#[test]
fn reserved_test_command_wins_regardless_of_intent() {
    let registry = Arc::new(CommandRegistry::builtin());
    let dispatcher = Dispatcher::new(registry);

    let forced_intent = ParsedQueryIntent {
        origin_code: Some("SGN".to_string()),
        destination_code: Some("HAN".to_string()),
        departure_date: NaiveDate::from_ymd_opt(2025, 12, 1),
        confidence: 1.0,
        is_valid: true,
    };

    let decision = dispatcher.dispatch("test 401", &forced_intent);
    let command = decision.command().expect("rule command");
    assert_eq!(command.source, CommandSource::Reserved);
    assert_eq!(command.args, vec!["401"]);
}

#[test]
fn from_to_markers_assign_roles_for_every_catalog_pair() {
    let catalog = LocationCatalog::builtin();
    let codes: Vec<String> = catalog.iter().map(|location| location.code.clone()).collect();

    for x in &codes {
        for y in codes.iter().filter(|code| *code != x) {
            for text in [
                format!("from {x} to {y}"),
                format!("bay từ {x} đến {y}"),
                format!("đến {y} từ {x}"),
            ] {
                let intent = resolve(&text, &catalog);
                assert_eq!(intent.origin_code.as_deref(), Some(x.as_str()), "{text}");
                assert_eq!(intent.destination_code.as_deref(), Some(y.as_str()), "{text}");
            }
        }
    }
}

#[test]
fn city_names_and_aliases_resolve_with_markers() {
    let catalog = LocationCatalog::builtin();

    let intent = resolve("vé máy bay từ Sài Gòn đi Đà Nẵng", &catalog);
    assert_eq!(intent.origin_code.as_deref(), Some("SGN"));
    assert_eq!(intent.destination_code.as_deref(), Some("DAD"));

    let intent = resolve("from Ha Noi to Phu Quoc", &catalog);
    assert_eq!(intent.origin_code.as_deref(), Some("HAN"));
    assert_eq!(intent.destination_code.as_deref(), Some("PQC"));
}

#[test]
fn text_without_locations_is_never_valid() {
    let catalog = LocationCatalog::builtin();

    for text in [
        "",
        "   ",
        "xin chào",
        "hello there",
        "ngày 2025-12-01",
        "tomorrow please",
        "tôi muốn đổi vé",
    ] {
        let intent = resolve(text, &catalog);
        assert_eq!(intent.confidence, 0.0, "{text:?}");
        assert!(!intent.is_valid, "{text:?}");
    }
}

#[test]
fn adding_a_date_raises_confidence() {
    let catalog = LocationCatalog::builtin();

    for (without, with) in [
        ("from SGN to HAN", "from SGN to HAN on 2025-12-01"),
        ("bay từ Hà Nội đến Đà Nẵng", "bay từ Hà Nội đến Đà Nẵng ngày mai"),
        ("đi Phú Quốc", "đi Phú Quốc 24/12"),
    ] {
        let before = resolve(without, &catalog);
        let after = resolve(with, &catalog);
        assert!(after.departure_date.is_some(), "{with}");
        assert!(
            after.confidence > before.confidence || before.confidence == 1.0,
            "{without} -> {with}"
        );
    }
}

#[test]
fn resolver_is_idempotent() {
    let catalog = LocationCatalog::builtin();
    let resolver = QueryResolver::new(ResolverConfig::default());

    for text in [
        "tìm chuyến bay từ SGN đến HAN ngày 2025-12-01",
        "from Da Nang to Bangkok next friday",
        "xin chào",
    ] {
        let first = resolver.resolve(text, &catalog, today());
        let second = resolver.resolve(text, &catalog, today());
        assert_eq!(first, second);
    }
}

#[test]
fn every_valid_command_string_dispatches_as_rule_command() {
    let catalog = LocationCatalog::builtin();

    for text in [
        "search SGN HAN 2025-12-01",
        "SEARCH sgn han 01/12/2025",
        "recommend DAD SGN 2025-12-24",
    ] {
        let (intent, decision) = dispatch(text, &catalog);
        assert!(intent.is_complete(), "{text}");
        assert_eq!(decision.kind(), "rule_command", "{text}");
    }

    // wrong arity falls through to the natural-language parse
    let (_, decision) = dispatch("search SGN HAN", &catalog);
    assert_eq!(decision.kind(), "partial_search");
}

#[test]
fn custom_threshold_changes_validity() {
    let catalog = small_catalog();
    let strict = ResolverConfig {
        min_confidence: 0.9,
        ..ResolverConfig::default()
    };

    let intent = QueryResolver::new(strict).resolve("bay từ SGN đến HAN", &catalog, today());
    assert!(intent.has_both_locations());
    assert!(!intent.is_valid);
}
