use outlet_coverage::pipeline::processing::naming::display_name;
use outlet_coverage::{classify, Category, Classifier, Tags};

fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_bakery_is_food_and_drink() {
    assert_eq!(classify(&tags(&[("shop", "bakery")])), Category::FoodAndDrink);
}

#[test]
fn test_any_leisure_value_matches() {
    assert_eq!(
        classify(&tags(&[("leisure", "anything_at_all")])),
        Category::LeisureAndRecreation
    );
}

#[test]
fn test_empty_tags_are_other() {
    assert_eq!(classify(&Tags::new()), Category::Other);
}

#[test]
fn test_earlier_rule_wins_over_later_rule() {
    let both = tags(&[("amenity", "bank"), ("shop", "bakery")]);
    assert_eq!(classify(&both), Category::FoodAndDrink);
    assert_eq!(classify(&tags(&[("amenity", "bank")])), Category::Financial);
}

#[test]
fn test_unknown_value_falls_back_on_key() {
    // shop=antiques matches no rule value, the shop fallback makes it Retail
    assert_eq!(classify(&tags(&[("shop", "antiques")])), Category::Retail);
}

#[test]
fn test_classification_is_deterministic() {
    let t = tags(&[("tourism", "hotel"), ("name", "Hotel Indonesia")]);
    let first = Classifier::standard().classify(&t);
    for _ in 0..10 {
        assert_eq!(Classifier::standard().classify(&t), first);
    }
    assert_eq!(first, Category::Accommodation);
}

#[test]
fn test_category_labels_round_trip_through_parse() {
    for category in Category::ALL {
        let parsed: Category = category.label().parse().unwrap();
        assert_eq!(parsed, category);
    }
}

#[test]
fn test_display_name_prefers_name_then_descriptive_keys() {
    assert_eq!(
        display_name(&tags(&[("name", "Toko Roti"), ("shop", "bakery")])).as_deref(),
        Some("Toko Roti")
    );
    assert_eq!(
        display_name(&tags(&[("amenity", "fast_food")])).as_deref(),
        Some("Amenity: Fast_food")
    );
    assert_eq!(display_name(&tags(&[("natural", "tree")])), None);
}
