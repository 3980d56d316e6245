//! State save/restore roundtrip tests for the filter unit.
//!
//! Verifies that parameter state survives snapshot and JSON serialization,
//! including edge cases like min/max values, unknown keys and preset
//! application.

use filtro_core::FilterParam;
use filtro_unit::{FACTORY_PRESETS, FilterUnit, ParameterState, UnitShared, UserPreset};

fn all_values(shared: &UnitShared) -> Vec<f32> {
    (0..shared.param_count())
        .map(|i| shared.get_value(i).unwrap())
        .collect()
}

#[test]
fn state_roundtrip_is_idempotent() {
    let unit = FilterUnit::new();
    unit.set_parameter(FilterParam::Cutoff, 3210.0);
    unit.set_parameter(FilterParam::Resonance, 4.2);

    let before = unit.get_state();
    unit.set_state(&before);
    assert_eq!(unit.get_state(), before);

    // Twice more, for good measure.
    unit.set_state(&unit.get_state());
    unit.set_state(&unit.get_state());
    assert_eq!(unit.get_state(), before);
}

#[test]
fn state_roundtrip_defaults() {
    let shared = UnitShared::new(None);
    let json = shared.state_to_json().unwrap();

    let shared2 = UnitShared::new(None);
    shared2.set_parameter(FilterParam::Cutoff, 50.0);
    shared2.state_from_json(&json).unwrap();
    assert_eq!(all_values(&shared), all_values(&shared2));
}

#[test]
fn state_roundtrip_extremes() {
    let shared = UnitShared::new(None);

    // Set all params to their maximum values.
    for (i, param) in shared.descriptors().iter().enumerate() {
        shared.set_value(i, param.max);
    }
    let json_max = shared.state_to_json().unwrap();
    let shared2 = UnitShared::new(None);
    shared2.state_from_json(&json_max).unwrap();
    assert_eq!(all_values(&shared), all_values(&shared2));

    // Set all params to their minimum values.
    for (i, param) in shared.descriptors().iter().enumerate() {
        shared.set_value(i, param.min);
    }
    let json_min = shared.state_to_json().unwrap();
    let shared3 = UnitShared::new(None);
    shared3.state_from_json(&json_min).unwrap();
    assert_eq!(all_values(&shared), all_values(&shared3));
}

#[test]
fn state_keys_are_string_ids() {
    let unit = FilterUnit::new();
    let state = unit.get_state();
    let keys: Vec<&str> = state.keys().map(String::as_str).collect();
    assert_eq!(keys, ["cutoff", "resonance"]);
}

#[test]
fn state_ignores_unknown_keys() {
    let shared = UnitShared::new(None);
    let json = br#"{"cutoff": 1500.0, "drive": 42.0, "resonance": 0.8}"#;
    shared.state_from_json(json).unwrap();

    assert_eq!(shared.parameter(FilterParam::Cutoff), 1500.0);
    assert_eq!(shared.parameter(FilterParam::Resonance), 0.8);
}

#[test]
fn state_clamps_out_of_range_values() {
    let shared = UnitShared::new(None);
    let mut state = ParameterState::new();
    state.insert("cutoff".to_owned(), 999_999.0);
    state.insert("resonance".to_owned(), -3.0);
    shared.set_state(&state);

    assert_eq!(shared.parameter(FilterParam::Cutoff), 20000.0);
    assert_eq!(shared.parameter(FilterParam::Resonance), 0.1);
}

#[test]
fn invalid_json_leaves_state_untouched() {
    let shared = UnitShared::new(None);
    shared.set_parameter(FilterParam::Cutoff, 700.0);
    assert!(shared.state_from_json(b"[1, 2, 3]").is_err());
    assert_eq!(shared.parameter(FilterParam::Cutoff), 700.0);
}

#[test]
fn every_factory_preset_applies() {
    let unit = FilterUnit::new();
    for preset in &FACTORY_PRESETS {
        let applied = unit.set_current_preset(preset.number).unwrap();
        assert_eq!(applied, *preset);
        assert_eq!(unit.parameter(FilterParam::Cutoff), preset.cutoff);
        assert_eq!(unit.parameter(FilterParam::Resonance), preset.resonance);
        assert_eq!(unit.current_preset().unwrap().name(), preset.name);
    }
}

#[test]
fn user_preset_survives_json() {
    let unit = FilterUnit::new();
    unit.set_parameter(FilterParam::Cutoff, 222.0);
    unit.set_parameter(FilterParam::Resonance, 9.0);
    let bytes = unit.user_preset("Dark").to_json().unwrap();

    let other = FilterUnit::new();
    let preset = UserPreset::from_json(&bytes).unwrap();
    other.apply_user_preset(&preset);
    assert_eq!(other.get_state(), unit.get_state());
    assert_eq!(other.current_preset().unwrap().name(), "Dark");
}
