//! Claim entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Claims")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "Claim_ID")]
    #[serde(rename = "Claim_ID")]
    pub claim_id: i32,
    #[sea_orm(column_name = "Food_ID")]
    #[serde(rename = "Food_ID")]
    pub food_id: Option<i32>,
    #[sea_orm(column_name = "Receiver_ID")]
    #[serde(rename = "Receiver_ID")]
    pub receiver_id: Option<i32>,
    #[sea_orm(column_name = "Status")]
    #[serde(rename = "Status")]
    pub status: Option<String>, // "Pending", "Completed", "Cancelled"; not enforced
    #[sea_orm(column_name = "Timestamp")]
    #[serde(rename = "Timestamp", default, with = "crate::db::timestamp")]
    pub timestamp: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
