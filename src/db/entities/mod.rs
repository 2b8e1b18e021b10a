//! Database entities
//!
//! The tables declare no keys. Each entity marks its identifier column as
//! the primary key only so SeaORM can address rows; the DDL never does.

pub mod claim;
pub mod food_listing;
pub mod provider;
pub mod receiver;
