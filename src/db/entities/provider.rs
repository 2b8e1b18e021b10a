//! Provider entity: someone listing surplus food

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Providers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "Provider_ID")]
    #[serde(rename = "Provider_ID")]
    pub provider_id: i32,
    #[sea_orm(column_name = "Name")]
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[sea_orm(column_name = "Type")]
    #[serde(rename = "Type")]
    pub provider_type: Option<String>, // "Restaurant", "Grocery Store", ...
    #[sea_orm(column_name = "Address")]
    #[serde(rename = "Address")]
    pub address: Option<String>,
    #[sea_orm(column_name = "City")]
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[sea_orm(column_name = "Contact")]
    #[serde(rename = "Contact")]
    pub contact: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
