use super::{Category, CategoryRule, TagMatch};

/// Built-in rule table in priority order
pub fn standard_rules() -> Vec<CategoryRule> {
    use TagMatch::Any;

    vec![
        CategoryRule::new(Category::FoodAndDrink)
            .with(
                "amenity",
                TagMatch::one_of(&[
                    "restaurant", "cafe", "fast_food", "bar", "pub", "food_court", "ice_cream", "biergarten",
                ]),
            )
            .with(
                "shop",
                TagMatch::one_of(&[
                    "bakery", "butcher", "convenience", "deli", "dairy", "greengrocer", "supermarket", "alcohol",
                    "beverages",
                ]),
            ),
        CategoryRule::new(Category::Retail).with(
            "shop",
            TagMatch::one_of(&[
                "clothes", "shoes", "jewelry", "electronics", "mobile_phone", "department_store", "mall",
                "supermarket", "hardware", "furniture", "books", "gift", "convenience", "computer", "fashion",
                "general", "boutique", "cosmetics", "toys", "outdoor",
            ]),
        ),
        CategoryRule::new(Category::Services)
            .with(
                "shop",
                TagMatch::one_of(&[
                    "hairdresser", "beauty", "optician", "travel_agency", "laundry", "dry_cleaning", "tailor",
                ]),
            )
            .with(
                "office",
                TagMatch::one_of(&[
                    "insurance", "lawyer", "accountant", "estate_agent", "travel_agent", "company", "government",
                ]),
            )
            .with(
                "craft",
                TagMatch::one_of(&["carpenter", "plumber", "electrician", "painter", "photographer", "glaziery"]),
            ),
        CategoryRule::new(Category::Healthcare)
            .with(
                "amenity",
                TagMatch::one_of(&["hospital", "clinic", "doctors", "dentist", "pharmacy", "veterinary"]),
            )
            .with("healthcare", Any),
        CategoryRule::new(Category::Transportation)
            .with(
                "amenity",
                TagMatch::one_of(&[
                    "bus_station", "taxi", "bicycle_rental", "car_rental", "car_sharing", "fuel", "charging_station",
                ]),
            )
            .with("public_transport", TagMatch::one_of(&["station", "stop_position", "platform", "stop"]))
            .with("building", TagMatch::one_of(&["transportation"]))
            .with("shop", TagMatch::one_of(&["car", "car_repair", "motorcycle", "bicycle"])),
        CategoryRule::new(Category::Accommodation)
            .with(
                "tourism",
                TagMatch::one_of(&["hotel", "hostel", "motel", "guest_house", "apartment", "camp_site"]),
            )
            .with("building", TagMatch::one_of(&["hotel", "dormitory"])),
        CategoryRule::new(Category::LeisureAndRecreation)
            .with("leisure", Any)
            .with(
                "amenity",
                TagMatch::one_of(&[
                    "cinema", "theatre", "arts_centre", "nightclub", "gym", "fitness_centre", "community_centre",
                ]),
            )
            .with("tourism", TagMatch::one_of(&["museum", "gallery", "attraction", "viewpoint", "zoo"]))
            .with("shop", TagMatch::one_of(&["sports", "games"])),
        CategoryRule::new(Category::Education)
            .with(
                "amenity",
                TagMatch::one_of(&[
                    "school", "university", "college", "kindergarten", "library", "language_school",
                    "driving_school",
                ]),
            )
            .with("building", TagMatch::one_of(&["school", "university"])),
        CategoryRule::new(Category::Financial)
            .with("amenity", TagMatch::one_of(&["bank", "atm", "bureau_de_change"]))
            .with("office", TagMatch::one_of(&["financial", "insurance", "tax"])),
        CategoryRule::new(Category::NaturalAndParks)
            .with("natural", Any)
            .with(
                "landuse",
                TagMatch::one_of(&["park", "forest", "meadow", "recreation_ground", "grass"]),
            )
            .with("leisure", TagMatch::one_of(&["park", "garden", "nature_reserve"])),
        CategoryRule::new(Category::Infrastructure)
            .with("man_made", Any)
            .with("power", Any)
            .with("telecom", Any)
            .with("waterway", Any)
            .with(
                "building",
                TagMatch::one_of(&["industrial", "commercial", "office", "warehouse"]),
            ),
        CategoryRule::new(Category::ReligiousAndCultural)
            .with(
                "amenity",
                TagMatch::one_of(&["place_of_worship", "community_centre", "social_centre"]),
            )
            .with(
                "building",
                TagMatch::one_of(&["church", "mosque", "temple", "synagogue", "cathedral"]),
            )
            .with("historic", Any),
    ]
}

/// Broad tag keys tried, in order, when no rule matched
pub fn standard_fallbacks() -> Vec<(String, Category)> {
    [
        ("shop", Category::Retail),
        ("amenity", Category::Services),
        ("tourism", Category::TourismAndRecreation),
        ("office", Category::BusinessServices),
        ("craft", Category::CraftsAndTrades),
        ("industrial", Category::Industrial),
        ("building", Category::Buildings),
        ("historic", Category::Historic),
    ]
    .into_iter()
    .map(|(key, category)| (key.to_string(), category))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_table_priority_order() {
        let order: Vec<Category> = standard_rules().iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![
                Category::FoodAndDrink,
                Category::Retail,
                Category::Services,
                Category::Healthcare,
                Category::Transportation,
                Category::Accommodation,
                Category::LeisureAndRecreation,
                Category::Education,
                Category::Financial,
                Category::NaturalAndParks,
                Category::Infrastructure,
                Category::ReligiousAndCultural,
            ]
        );
    }

    #[test]
    fn test_every_rule_has_matchers() {
        assert!(standard_rules().iter().all(|r| !r.matchers.is_empty()));
        assert_eq!(standard_fallbacks().len(), 8);
    }
}
