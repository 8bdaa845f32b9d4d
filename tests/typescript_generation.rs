//! TypeScript Generation Tests
//!
//! Validates that analysis outputs can be exported to TypeScript when the
//! tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_output_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, every output type is configured for export.
    fn assert_type<T: Type>() {}

    // Session types
    assert_type::<overcut::SessionKey>();
    assert_type::<overcut::Corner>();
    assert_type::<overcut::Compound>();
    assert_type::<overcut::LapRecord>();
    assert_type::<overcut::TelemetrySeries>();

    // Analysis outputs
    assert_type::<overcut::SkipReport>();
    assert_type::<overcut::analysis::GapPoint>();
    assert_type::<overcut::analysis::FuelCorrectedLap>();
    assert_type::<overcut::analysis::DegradationEntry>();
    assert_type::<overcut::analysis::GhostDelta>();
    assert_type::<overcut::analysis::TheoreticalBest>();
    assert_type::<overcut::analysis::SpeedComparison>();
    assert_type::<overcut::analysis::DriverStrategy>();
    assert_type::<overcut::analysis::ClassifiedLap>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still serialize without specta::Type.
    let key = overcut::SessionKey::new(2024, "Monza", "R");
    let json = serde_json::to_string(&key).unwrap();
    assert!(json.contains("\"sessionType\":\"R\""));
}
