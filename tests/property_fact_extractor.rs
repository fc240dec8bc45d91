use dateinsert::domain::models::{Half, HourConvention, LocalizedTimeOfDay, TimeLabels};
use dateinsert::FactExtractor;
use proptest::prelude::*;

fn vrchat_name(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> String {
    format!("VRChat_{y:04}-{mo:02}-{d:02}_{h:02}-{mi:02}-{s:02}.png")
}

proptest! {
    /// Property: every valid screenshot name yields its own timestamp
    #[test]
    fn prop_extract_recovers_components(
        y in 1990i32..2100,
        mo in 1u32..=12,
        d in 1u32..=28,
        h in 0u32..24,
        mi in 0u32..60,
        s in 0u32..60,
    ) {
        let fact = FactExtractor::default()
            .extract(&vrchat_name(y, mo, d, h, mi, s))
            .expect("valid name should match");

        prop_assert_eq!(fact.date.year(), y);
        prop_assert_eq!(fact.date.month(), mo);
        prop_assert_eq!(fact.date.day(), d);
        prop_assert_eq!(fact.time.hour_24(), h);
        prop_assert_eq!(fact.time.minute(), mi);
        prop_assert!(fact.time.hour() < 12);
        prop_assert_eq!(fact.time.half() == Half::Afternoon, h >= 12);
    }

    /// Property: extraction is deterministic
    #[test]
    fn prop_extract_is_deterministic(name in "\\PC{0,40}") {
        let extractor = FactExtractor::default();
        prop_assert_eq!(extractor.extract(&name), extractor.extract(&name));
    }

    /// Property: names without the screenshot prefix never match
    #[test]
    fn prop_foreign_names_never_match(name in "[A-Za-z0-9_.-]{0,40}") {
        prop_assume!(!name.contains("VRChat_"));
        prop_assert!(FactExtractor::default().extract(&name).is_none());
    }

    /// Property: the display form reads back as the same time under either convention
    #[test]
    fn prop_rendered_time_reads_back(h in 0u32..24, mi in 0u32..60, twelve in any::<bool>()) {
        let labels = TimeLabels::default();
        let convention = if twelve { HourConvention::TwelveBased } else { HourConvention::ZeroBased };
        let time = LocalizedTimeOfDay::from_24h(h, mi).unwrap();

        let rendered = time.render(&labels, convention);
        prop_assert_eq!(LocalizedTimeOfDay::parse(&rendered, &labels), Some(time));
    }
}

#[test]
fn test_impossible_dates_do_not_match() {
    let extractor = FactExtractor::default();
    assert!(extractor.extract("VRChat_2023-02-29_10-00-00.png").is_none());
    assert!(extractor.extract("VRChat_2024-13-01_10-00-00.png").is_none());
    assert!(extractor.extract("VRChat_2024-01-01_24-00-00.png").is_none());
}
