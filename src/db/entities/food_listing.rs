//! Food listing entity (table `Food_Listings_Dataset`)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Food_Listings_Dataset")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "Food_ID")]
    #[serde(rename = "Food_ID")]
    pub food_id: i32,
    #[sea_orm(column_name = "Food_Name")]
    #[serde(rename = "Food_Name")]
    pub food_name: Option<String>,
    #[sea_orm(column_name = "Quantity")]
    #[serde(rename = "Quantity")]
    pub quantity: Option<i32>,
    #[sea_orm(column_name = "Expiry_Date")]
    #[serde(rename = "Expiry_Date")]
    pub expiry_date: Option<Date>,
    /// Points at Providers.Provider_ID by convention only
    #[sea_orm(column_name = "Provider_ID")]
    #[serde(rename = "Provider_ID")]
    pub provider_id: Option<i32>,
    /// Copy of the provider's type at listing time
    #[sea_orm(column_name = "Provider_Type")]
    #[serde(rename = "Provider_Type")]
    pub provider_type: Option<String>,
    #[sea_orm(column_name = "Location")]
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[sea_orm(column_name = "Food_Type")]
    #[serde(rename = "Food_Type")]
    pub food_type: Option<String>,
    #[sea_orm(column_name = "Meal_Type")]
    #[serde(rename = "Meal_Type")]
    pub meal_type: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
