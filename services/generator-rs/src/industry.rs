//! Static event catalogs, one per industry, plus the fixed catalog used by the
//! single-template simulator.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::random::{chance, iso_future, iso_now, iso_past, object, pick, prefixed_id, Payload};

const DAY_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Industry {
    #[default]
    Ecommerce,
    Media,
    Travel,
    Saas,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown industry `{0}` (expected ecommerce, media, travel or saas)")]
pub struct UnknownIndustry(pub String);

impl Industry {
    pub const ALL: [Industry; 4] = [
        Industry::Ecommerce,
        Industry::Media,
        Industry::Travel,
        Industry::Saas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Ecommerce => "ecommerce",
            Industry::Media => "media",
            Industry::Travel => "travel",
            Industry::Saas => "saas",
        }
    }

    /// Human-facing name shown next to the selector.
    pub fn label(&self) -> &'static str {
        match self {
            Industry::Ecommerce => "eCommerce / Retail",
            Industry::Media => "Media",
            Industry::Travel => "Travel and Hospitality",
            Industry::Saas => "B2B SaaS",
        }
    }

    pub fn template(&self) -> &'static IndustryTemplate {
        match self {
            Industry::Ecommerce => &ECOMMERCE,
            Industry::Media => &MEDIA,
            Industry::Travel => &TRAVEL,
            Industry::Saas => &SAAS,
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Industry {
    type Err = UnknownIndustry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Industry::ALL
            .into_iter()
            .find(|industry| industry.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownIndustry(s.to_string()))
    }
}

// env, config files and JSON bodies all go through `FromStr`
impl TryFrom<String> for Industry {
    type Error = UnknownIndustry;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

type PayloadFn = fn(&mut dyn RngCore) -> Payload;

/// Candidate event names and the property/trait builders for one catalog.
pub struct IndustryTemplate {
    pub events: &'static [&'static str],
    properties: PayloadFn,
    traits: PayloadFn,
}

impl IndustryTemplate {
    pub fn pick_event(&self, rng: &mut dyn RngCore) -> &'static str {
        self.events.choose(rng).copied().unwrap_or_default()
    }

    /// Fresh property bag for a track call.
    pub fn properties(&self, rng: &mut dyn RngCore) -> Payload {
        (self.properties)(rng)
    }

    /// Industry-specific traits merged into an identify call.
    pub fn traits(&self, rng: &mut dyn RngCore) -> Payload {
        (self.traits)(rng)
    }
}

static ECOMMERCE: IndustryTemplate = IndustryTemplate {
    events: &[
        "Product Viewed",
        "Product Added to Cart",
        "Cart Viewed",
        "Checkout Started",
        "Order Completed",
        "Product Added to Wishlist",
        "Category Viewed",
        "Product Reviewed",
        "Search Performed",
        "Promotion Viewed",
    ],
    properties: ecommerce_properties,
    traits: ecommerce_traits,
};

static MEDIA: IndustryTemplate = IndustryTemplate {
    events: &[
        "Content Viewed",
        "Video Played",
        "Article Read",
        "Subscription Started",
        "Playlist Created",
        "Content Shared",
        "Comment Posted",
        "Profile Viewed",
        "Search Performed",
        "Recommendation Clicked",
    ],
    properties: media_properties,
    traits: media_traits,
};

static TRAVEL: IndustryTemplate = IndustryTemplate {
    events: &[
        "Flight Searched",
        "Hotel Viewed",
        "Booking Completed",
        "Itinerary Viewed",
        "Room Selected",
        "Package Customized",
        "Review Submitted",
        "Destination Explored",
        "Travel Insurance Added",
        "Loyalty Points Redeemed",
    ],
    properties: travel_properties,
    traits: travel_traits,
};

static SAAS: IndustryTemplate = IndustryTemplate {
    events: &[
        "User Signed Up",
        "Feature Used",
        "Subscription Updated",
        "Integration Connected",
        "Report Generated",
        "Team Member Invited",
        "Workflow Created",
        "API Call Made",
        "Dashboard Viewed",
        "Support Ticket Created",
    ],
    properties: saas_properties,
    traits: saas_traits,
};

/// The simulator only knows a handful of storefront events and ignores the industry.
pub static SIMULATOR_CATALOG: IndustryTemplate = IndustryTemplate {
    events: &[
        "Product Viewed",
        "Product Added",
        "Cart Viewed",
        "Checkout Started",
        "Order Completed",
    ],
    properties: simulator_properties,
    traits: ecommerce_traits,
};

fn ecommerce_properties(rng: &mut dyn RngCore) -> Payload {
    let product_name = format!(
        "{} {}",
        pick(rng, &["Premium", "Deluxe", "Classic", "Limited Edition"]),
        pick(rng, &["Jacket", "Shoes", "Watch", "Bag"])
    );
    object(json!({
        "product_id": prefixed_id(rng, "prod"),
        "product_name": product_name,
        "product_price": rng.gen_range(50..350),
        "currency": "USD",
        "category": pick(rng, &["Apparel", "Accessories", "Footwear", "Jewelry"]),
        "brand": pick(rng, &["Nike", "Adidas", "Zara", "H&M"]),
        "color": pick(rng, &["Black", "White", "Blue", "Red"]),
        "size": pick(rng, &["S", "M", "L", "XL"]),
        "in_stock": chance(rng, 0.2),
        "discount_applied": chance(rng, 0.7),
        "discount_amount": rng.gen_range(0..50),
        "rating": rng.gen_range(1..=5),
        "source": pick(rng, &["web", "mobile_app", "tablet"]),
        "session_id": prefixed_id(rng, "sess"),
    }))
}

fn media_properties(rng: &mut dyn RngCore) -> Payload {
    object(json!({
        "content_id": prefixed_id(rng, "cont"),
        "content_type": pick(rng, &["article", "video", "podcast", "gallery"]),
        "content_category": pick(rng, &["News", "Entertainment", "Sports", "Technology"]),
        "author": pick(rng, &["John Smith", "Emma Wilson", "Michael Brown", "Sarah Davis"]),
        "publication_date": iso_past(rng, 90 * DAY_MS),
        "duration": rng.gen_range(0..3600),
        "subscription_tier": pick(rng, &["free", "basic", "premium", "enterprise"]),
        "device_type": pick(rng, &["desktop", "mobile", "tablet", "smart_tv"]),
        "engagement_score": rng.gen_range(0..100),
        "completion_rate": rng.gen::<f64>(),
        "has_comments": chance(rng, 0.5),
        "share_count": rng.gen_range(0..1000),
        "like_count": rng.gen_range(0..5000),
        "session_id": prefixed_id(rng, "sess"),
    }))
}

// check_in_date is independent of any booking date
fn travel_properties(rng: &mut dyn RngCore) -> Payload {
    object(json!({
        "booking_id": prefixed_id(rng, "book"),
        "destination": pick(rng, &["Paris", "New York", "Tokyo", "London"]),
        "travel_type": pick(rng, &["business", "leisure", "family", "solo"]),
        "accommodation_type": pick(rng, &["hotel", "resort", "apartment", "villa"]),
        "check_in_date": iso_future(rng, 90 * DAY_MS),
        "duration_days": rng.gen_range(1..=14),
        "room_type": pick(rng, &["standard", "deluxe", "suite", "penthouse"]),
        "number_of_guests": rng.gen_range(1..=4),
        "total_price": rng.gen_range(200..5200),
        "currency": "USD",
        "payment_method": pick(rng, &["credit_card", "paypal", "bank_transfer"]),
        "loyalty_level": pick(rng, &["none", "silver", "gold", "platinum"]),
        "has_travel_insurance": chance(rng, 0.6),
        "booking_platform": pick(rng, &["web", "mobile_app", "agent"]),
        "session_id": prefixed_id(rng, "sess"),
    }))
}

fn saas_properties(rng: &mut dyn RngCore) -> Payload {
    object(json!({
        "user_id": prefixed_id(rng, "user"),
        "account_id": prefixed_id(rng, "acc"),
        "subscription_plan": pick(rng, &["starter", "professional", "enterprise", "custom"]),
        "feature_name": pick(rng, &["analytics", "automation", "integration", "reporting"]),
        "team_size": rng.gen_range(1..=100),
        "monthly_value": rng.gen_range(500..10_500),
        "integration_type": pick(rng, &["crm", "marketing", "billing", "communication"]),
        "user_role": pick(rng, &["admin", "manager", "member", "viewer"]),
        "usage_frequency": rng.gen_range(0..100),
        "last_login": iso_past(rng, 7 * DAY_MS),
        "feature_enabled": chance(rng, 0.3),
        "customer_health_score": rng.gen_range(0..100),
        "days_since_signup": rng.gen_range(0..365),
        "number_of_seats": rng.gen_range(1..=50),
        "session_id": prefixed_id(rng, "sess"),
    }))
}

fn simulator_properties(rng: &mut dyn RngCore) -> Payload {
    object(json!({
        "product_id": rng.gen_range(0..1000u32).to_string(),
        "price": f64::from(rng.gen_range(0..10_000u32)) / 100.0,
        "currency": "USD",
        "timestamp": iso_now(),
    }))
}

fn ecommerce_traits(rng: &mut dyn RngCore) -> Payload {
    object(json!({
        "total_orders": rng.gen_range(0..50),
        "total_spent": rng.gen_range(0..5000),
        "favorite_category": pick(rng, &["Apparel", "Accessories", "Footwear", "Jewelry"]),
        "loyalty_tier": pick(rng, &["bronze", "silver", "gold", "platinum"]),
    }))
}

fn media_traits(rng: &mut dyn RngCore) -> Payload {
    object(json!({
        "subscription_status": pick(rng, &["active", "trial", "expired"]),
        "preferred_content": pick(rng, &["news", "entertainment", "sports"]),
        "watch_time_minutes": rng.gen_range(0..5000),
        "device_preference": pick(rng, &["mobile", "desktop", "tablet"]),
    }))
}

fn travel_traits(rng: &mut dyn RngCore) -> Payload {
    object(json!({
        "frequent_flyer_status": pick(rng, &["none", "silver", "gold", "platinum"]),
        "preferred_destination": pick(rng, &["domestic", "international", "both"]),
        "total_trips": rng.gen_range(0..20),
        "travel_preferences": pick(rng, &["luxury", "budget", "business"]),
    }))
}

fn saas_traits(rng: &mut dyn RngCore) -> Payload {
    object(json!({
        "company_size": pick(rng, &["1-10", "11-50", "51-200", "201+"]),
        "industry": pick(rng, &["technology", "finance", "healthcare", "retail"]),
        "subscription_tier": pick(rng, &["starter", "professional", "enterprise"]),
        "integration_count": rng.gen_range(0..10),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("SaaS".parse::<Industry>(), Ok(Industry::Saas));
        assert_eq!(" travel ".parse::<Industry>(), Ok(Industry::Travel));
        assert!("retail".parse::<Industry>().is_err());
    }

    #[test]
    fn deserializes_through_the_same_parser() {
        let industry: Industry = serde_json::from_str("\"SaaS\"").unwrap();
        assert_eq!(industry, Industry::Saas);
        let industry: Industry = serde_json::from_str("\" Media\"").unwrap();
        assert_eq!(industry, Industry::Media);
        let err = serde_json::from_str::<Industry>("\"retail\"").unwrap_err();
        assert!(err.to_string().contains("unknown industry `retail`"));
        assert_eq!(serde_json::to_value(Industry::Saas).unwrap(), "saas");
    }

    #[test]
    fn every_template_has_ten_events() {
        for industry in Industry::ALL {
            assert_eq!(industry.template().events.len(), 10, "{}", industry);
        }
    }

    #[test]
    fn ecommerce_properties_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let props = Industry::Ecommerce.template().properties(&mut rng);
            assert_eq!(props["currency"], "USD");
            let price = props["product_price"].as_i64().unwrap();
            assert!((50..350).contains(&price));
            let rating = props["rating"].as_i64().unwrap();
            assert!((1..=5).contains(&rating));
            assert!(props["session_id"].as_str().unwrap().starts_with("sess_"));
        }
    }

    #[test]
    fn travel_guests_and_duration_are_positive() {
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..200 {
            let props = Industry::Travel.template().properties(&mut rng);
            let guests = props["number_of_guests"].as_i64().unwrap();
            let days = props["duration_days"].as_i64().unwrap();
            assert!((1..=4).contains(&guests));
            assert!((1..=14).contains(&days));
        }
    }

    #[test]
    fn media_completion_rate_is_a_fraction() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..100 {
            let props = Industry::Media.template().properties(&mut rng);
            let rate = props["completion_rate"].as_f64().unwrap();
            assert!((0.0..1.0).contains(&rate));
        }
    }

    #[test]
    fn simulator_price_has_cents() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..100 {
            let props = SIMULATOR_CATALOG.properties(&mut rng);
            let price = props["price"].as_f64().unwrap();
            assert!((0.0..100.0).contains(&price));
            let id: u32 = props["product_id"].as_str().unwrap().parse().unwrap();
            assert!(id < 1000);
        }
    }

    #[test]
    fn traits_differ_by_industry() {
        let mut rng = SmallRng::seed_from_u64(2);
        assert!(Industry::Saas.template().traits(&mut rng).contains_key("company_size"));
        assert!(Industry::Media.template().traits(&mut rng).contains_key("watch_time_minutes"));
    }
}
