//! Request/response types for the card collection endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn default_quantity() -> i32 {
    1
}

/// Payload for creating a card. Only `name` is required; everything else
/// mirrors an optional column.
#[derive(ToSchema, Deserialize, Debug)]
pub struct CreateCardRequest {
    pub name: String,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub set_name: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub is_graded: bool,
    #[serde(default)]
    pub grade_company: Option<String>,
    #[serde(default)]
    pub grade_score: Option<String>,
    #[serde(default)]
    pub for_sale: bool,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub front_image_url: Option<String>,
    #[serde(default)]
    pub back_image_url: Option<String>,
    #[serde(default)]
    pub damage_images: Vec<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CardResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub card_type: Option<String>,
    pub rarity: Option<String>,
    pub set_name: Option<String>,
    pub card_number: Option<String>,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub is_graded: bool,
    pub grade_company: Option<String>,
    pub grade_score: Option<String>,
    pub for_sale: bool,
    pub price: Option<f64>,
    pub front_image_url: Option<String>,
    pub back_image_url: Option<String>,
    pub damage_images: Vec<String>,
    pub created_at: String,
}

/// One row of the public leaderboard, ranked by collection breadth.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub display_name: String,
    pub total_cards: i64,
    pub unique_names: i64,
    pub rare_cards: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_defaults() {
        let request: CreateCardRequest =
            serde_json::from_value(json!({"name": "Charizard"})).expect("request parses");
        assert_eq!(request.name, "Charizard");
        assert_eq!(request.quantity, 1);
        assert!(!request.is_graded);
        assert!(!request.for_sale);
        assert_eq!(request.price, None);
        assert!(request.damage_images.is_empty());
    }

    #[test]
    fn create_request_full_payload() {
        let request: CreateCardRequest = serde_json::from_value(json!({
            "name": "Pikachu",
            "card_type": "Pokemon",
            "rarity": "Ultra Rare",
            "set_name": "Base Set",
            "card_number": "58/102",
            "condition": "Near Mint",
            "quantity": 3,
            "is_graded": true,
            "grade_company": "PSA",
            "grade_score": "9",
            "for_sale": true,
            "price": 149.5,
            "damage_images": ["https://img.example/a.jpg"],
        }))
        .expect("request parses");

        assert_eq!(request.quantity, 3);
        assert!(request.is_graded);
        assert_eq!(request.grade_score.as_deref(), Some("9"));
        assert_eq!(request.price, Some(149.5));
        assert_eq!(request.damage_images.len(), 1);
    }

    #[test]
    fn card_response_serializes_optionals_as_null() {
        let card = CardResponse {
            id: "a".to_string(),
            user_id: "b".to_string(),
            name: "Mewtwo".to_string(),
            card_type: None,
            rarity: None,
            set_name: None,
            card_number: None,
            condition: None,
            description: None,
            quantity: 1,
            is_graded: false,
            grade_company: None,
            grade_score: None,
            for_sale: false,
            price: None,
            front_image_url: None,
            back_image_url: None,
            damage_images: Vec::new(),
            created_at: "2026-01-01 00:00:00+00".to_string(),
        };

        let value = serde_json::to_value(&card).expect("card serializes");
        assert_eq!(value["name"], "Mewtwo");
        assert_eq!(value["rarity"], serde_json::Value::Null);
        assert_eq!(value["damage_images"], json!([]));
    }
}
