//! Canned analytics over the four tables.
//!
//! Every query runs unchanged on SQLite and MySQL: sums are cast to
//! integers, averages and percentages to doubles, and `LIMIT` stands in
//! for `TOP`. Orderings always end on the grouping key so ties come out
//! the same way on every run.

use std::collections::HashMap;

use sea_orm::{ConnectionTrait, Statement, Value};
use serde::Serialize;

use super::rows::{query_result_set, CellKind, ResultSet};
use super::rows::CellKind::{Float, Int, Text};
use crate::error::{Result, ServerError};

/// A named query parameter and the value used when the caller omits it
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportParam {
    pub name: &'static str,
    pub default: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Report {
    pub slug: &'static str,
    pub title: &'static str,
    pub sql: &'static str,
    pub columns: &'static [(&'static str, CellKind)],
    pub param: Option<ReportParam>,
}

pub const REPORTS: &[Report] = &[
    Report {
        slug: "providers-receivers-by-city",
        title: "Food providers and receivers in each city",
        sql: r#"SELECT
    City,
    COUNT(DISTINCT Provider_ID) AS Total_Providers,
    COUNT(DISTINCT Receiver_ID) AS Total_Receivers
FROM (
    SELECT City, Provider_ID, NULL AS Receiver_ID FROM Providers
    UNION ALL
    SELECT City, NULL AS Provider_ID, Receiver_ID FROM Receivers
) AS combined
GROUP BY City
ORDER BY City"#,
        columns: &[("City", Text), ("Total_Providers", Int), ("Total_Receivers", Int)],
        param: None,
    },
    Report {
        slug: "top-provider-type",
        title: "Provider type contributing the most food",
        sql: r#"SELECT
    p.Type AS Provider_Type,
    CAST(SUM(f.Quantity) AS SIGNED) AS Total_Quantity
FROM Providers p
JOIN Food_Listings_Dataset f ON p.Provider_ID = f.Provider_ID
GROUP BY p.Type
ORDER BY Total_Quantity DESC, p.Type
LIMIT 1"#,
        columns: &[("Provider_Type", Text), ("Total_Quantity", Int)],
        param: None,
    },
    Report {
        slug: "provider-contacts",
        title: "Contact information of providers in a city",
        sql: r#"SELECT Name, Type, Address, City, Contact
FROM Providers
WHERE City = ?
ORDER BY Name
LIMIT 5"#,
        columns: &[
            ("Name", Text),
            ("Type", Text),
            ("Address", Text),
            ("City", Text),
            ("Contact", Text),
        ],
        param: Some(ReportParam {
            name: "city",
            default: "Adambury",
        }),
    },
    Report {
        slug: "receivers-by-claims",
        title: "Receivers with the most claims",
        sql: r#"SELECT
    r.Receiver_ID,
    r.Name AS Receiver_Name,
    COUNT(c.Claim_ID) AS Total_Claims
FROM Claims c
JOIN Receivers r ON c.Receiver_ID = r.Receiver_ID
GROUP BY r.Receiver_ID, r.Name
ORDER BY Total_Claims DESC, r.Receiver_ID"#,
        columns: &[("Receiver_ID", Int), ("Receiver_Name", Text), ("Total_Claims", Int)],
        param: None,
    },
    Report {
        slug: "total-quantity",
        title: "Total quantity of food available",
        sql: r#"SELECT CAST(SUM(Quantity) AS SIGNED) AS Total_Quantity_Available
FROM Food_Listings_Dataset"#,
        columns: &[("Total_Quantity_Available", Int)],
        param: None,
    },
    Report {
        slug: "top-listing-cities",
        title: "Cities with the most food listings",
        sql: r#"SELECT
    p.City,
    COUNT(f.Food_ID) AS Total_Listings
FROM Food_Listings_Dataset f
JOIN Providers p ON f.Provider_ID = p.Provider_ID
GROUP BY p.City
HAVING COUNT(f.Food_ID) = (
    SELECT MAX(listings) FROM (
        SELECT COUNT(f2.Food_ID) AS listings
        FROM Food_Listings_Dataset f2
        JOIN Providers p2 ON f2.Provider_ID = p2.Provider_ID
        GROUP BY p2.City
    ) AS per_city
)
ORDER BY p.City"#,
        columns: &[("City", Text), ("Total_Listings", Int)],
        param: None,
    },
    Report {
        slug: "food-types",
        title: "Most commonly available food types",
        sql: r#"SELECT
    Food_Type,
    COUNT(Food_ID) AS Listings_Count
FROM Food_Listings_Dataset
GROUP BY Food_Type
ORDER BY Listings_Count DESC, Food_Type"#,
        columns: &[("Food_Type", Text), ("Listings_Count", Int)],
        param: None,
    },
    Report {
        slug: "claims-per-food",
        title: "Claims made for each food item",
        sql: r#"SELECT
    fl.Food_Name,
    COUNT(c.Claim_ID) AS TotalClaims
FROM Food_Listings_Dataset fl
LEFT JOIN Claims c ON fl.Food_ID = c.Food_ID
GROUP BY fl.Food_Name
ORDER BY TotalClaims DESC, fl.Food_Name"#,
        columns: &[("Food_Name", Text), ("TotalClaims", Int)],
        param: None,
    },
    Report {
        slug: "top-completed-provider",
        title: "Provider with the most successful claims",
        sql: r#"SELECT
    p.Name AS ProviderName,
    COUNT(c.Claim_ID) AS SuccessfulClaims
FROM Providers p
JOIN Food_Listings_Dataset fl ON p.Provider_ID = fl.Provider_ID
JOIN Claims c ON fl.Food_ID = c.Food_ID
WHERE c.Status = 'Completed'
GROUP BY p.Name
ORDER BY SuccessfulClaims DESC, p.Name
LIMIT 1"#,
        columns: &[("ProviderName", Text), ("SuccessfulClaims", Int)],
        param: None,
    },
    Report {
        slug: "claim-status-share",
        title: "Share of claims per status",
        sql: r#"SELECT
    Status,
    COUNT(*) AS Count,
    CAST(ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM Claims), 2) AS DOUBLE) AS Percentage
FROM Claims
GROUP BY Status
ORDER BY Status"#,
        columns: &[("Status", Text), ("Count", Int), ("Percentage", Float)],
        param: None,
    },
    Report {
        slug: "avg-claimed-quantity",
        title: "Average quantity claimed per receiver",
        sql: r#"SELECT
    r.Receiver_ID,
    r.Name AS Receiver_Name,
    CAST(AVG(f.Quantity) AS DOUBLE) AS Avg_Quantity_Claimed
FROM Claims c
JOIN Food_Listings_Dataset f ON c.Food_ID = f.Food_ID
JOIN Receivers r ON c.Receiver_ID = r.Receiver_ID
WHERE c.Status = 'Completed'
GROUP BY r.Receiver_ID, r.Name
ORDER BY r.Receiver_ID"#,
        columns: &[
            ("Receiver_ID", Int),
            ("Receiver_Name", Text),
            ("Avg_Quantity_Claimed", Float),
        ],
        param: None,
    },
    Report {
        slug: "top-meal-type",
        title: "Meal type claimed the most",
        sql: r#"SELECT
    f.Meal_Type,
    COUNT(*) AS Claim_Count
FROM Claims c
JOIN Food_Listings_Dataset f ON c.Food_ID = f.Food_ID
WHERE c.Status = 'Completed'
GROUP BY f.Meal_Type
ORDER BY Claim_Count DESC, f.Meal_Type
LIMIT 1"#,
        columns: &[("Meal_Type", Text), ("Claim_Count", Int)],
        param: None,
    },
    Report {
        slug: "quantity-by-provider",
        title: "Total quantity donated by each provider",
        sql: r#"SELECT
    p.Provider_ID,
    p.Name AS Provider_Name,
    CAST(SUM(f.Quantity) AS SIGNED) AS Total_Quantity_Donated
FROM Food_Listings_Dataset f
JOIN Providers p ON f.Provider_ID = p.Provider_ID
GROUP BY p.Provider_ID, p.Name
ORDER BY Total_Quantity_Donated DESC, p.Provider_ID"#,
        columns: &[
            ("Provider_ID", Int),
            ("Provider_Name", Text),
            ("Total_Quantity_Donated", Int),
        ],
        param: None,
    },
    Report {
        slug: "provider-listings",
        title: "Listings per provider",
        sql: r#"SELECT
    p.Name,
    p.Type,
    COUNT(f.Food_ID) AS TotalListings
FROM Providers p
LEFT JOIN Food_Listings_Dataset f ON p.Provider_ID = f.Provider_ID
GROUP BY p.Name, p.Type
ORDER BY TotalListings DESC, p.Name, p.Type"#,
        columns: &[("Name", Text), ("Type", Text), ("TotalListings", Int)],
        param: None,
    },
    Report {
        slug: "top-providers",
        title: "Top food providers",
        sql: r#"SELECT
    p.Name AS ProviderName,
    p.Type AS ProviderType,
    COUNT(f.Food_ID) AS TotalListings,
    CAST(SUM(f.Quantity) AS SIGNED) AS TotalQuantity
FROM Providers p
JOIN Food_Listings_Dataset f ON p.Provider_ID = f.Provider_ID
GROUP BY p.Name, p.Type
ORDER BY TotalListings DESC, p.Name, p.Type
LIMIT 10"#,
        columns: &[
            ("ProviderName", Text),
            ("ProviderType", Text),
            ("TotalListings", Int),
            ("TotalQuantity", Int),
        ],
        param: None,
    },
    Report {
        slug: "demand-locations",
        title: "High demand locations",
        sql: r#"SELECT
    f.Location,
    COUNT(c.Claim_ID) AS TotalClaims,
    CAST(SUM(f.Quantity) AS SIGNED) AS TotalQuantityClaimed
FROM Food_Listings_Dataset f
JOIN Claims c ON f.Food_ID = c.Food_ID
GROUP BY f.Location
ORDER BY TotalClaims DESC, f.Location"#,
        columns: &[("Location", Text), ("TotalClaims", Int), ("TotalQuantityClaimed", Int)],
        param: None,
    },
];

pub fn find(slug: &str) -> Result<&'static Report> {
    REPORTS
        .iter()
        .find(|r| r.slug == slug)
        .ok_or_else(|| ServerError::UnknownReport(slug.to_string()))
}

impl Report {
    /// Value bound to the report's parameter, if it takes one
    pub fn param_value(&self, params: &HashMap<String, String>) -> Option<String> {
        self.param.map(|p| {
            params
                .get(p.name)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| p.default.to_string())
        })
    }
}

pub async fn run<C: ConnectionTrait>(
    db: &C,
    report: &Report,
    params: &HashMap<String, String>,
) -> Result<ResultSet> {
    let values: Vec<Value> = report.param_value(params).map(Value::from).into_iter().collect();
    let stmt = Statement::from_sql_and_values(db.get_database_backend(), report.sql, values);

    let result = query_result_set(db, stmt, report.columns).await?;
    tracing::debug!("Report {} returned {} rows", report.slug, result.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::records;
    use crate::db::testing;
    use serde_json::{json, Value as JsonValue};

    async fn run_slug(db: &sea_orm::DatabaseConnection, slug: &str) -> ResultSet {
        run(db, find(slug).unwrap(), &HashMap::new()).await.unwrap()
    }

    fn rows(result: &ResultSet) -> Vec<JsonValue> {
        result.rows.iter().map(|r| JsonValue::from(r.clone())).collect()
    }

    #[test]
    fn test_catalog() {
        assert_eq!(REPORTS.len(), 16);
        for (i, report) in REPORTS.iter().enumerate() {
            assert!(REPORTS[i + 1..].iter().all(|r| r.slug != report.slug));
            assert!(!report.columns.is_empty());
        }
        assert!(matches!(find("nope"), Err(ServerError::UnknownReport(_))));
    }

    #[test]
    fn test_param_value() {
        let report = find("provider-contacts").unwrap();
        assert_eq!(report.param_value(&HashMap::new()).as_deref(), Some("Adambury"));

        let params = HashMap::from([("city".to_string(), "Lake Mary".to_string())]);
        assert_eq!(report.param_value(&params).as_deref(), Some("Lake Mary"));

        assert_eq!(find("total-quantity").unwrap().param_value(&params), None);
    }

    #[tokio::test]
    async fn test_every_report_runs_on_empty_tables() {
        let (_temp_dir, db) = testing::fresh_db().await;

        for report in REPORTS {
            let result = run(&db, report, &HashMap::new()).await.unwrap();
            assert_eq!(result.columns.len(), report.columns.len(), "{}", report.slug);
        }
        assert_eq!(rows(&run_slug(&db, "total-quantity").await), vec![json!([null])]);
    }

    #[tokio::test]
    async fn test_city_and_provider_reports() {
        let (_temp_dir, db) = testing::fresh_db().await;
        testing::seed(&db).await;

        assert_eq!(
            rows(&run_slug(&db, "providers-receivers-by-city").await),
            vec![
                json!(["Adambury", 2, 1]),
                json!(["Lake Mary", 1, 1]),
                json!(["Riverton", 0, 1]),
                json!(["Springfield", 1, 0]),
            ]
        );
        assert_eq!(
            rows(&run_slug(&db, "top-provider-type").await),
            vec![json!(["Supermarket", 45])]
        );
        assert_eq!(
            rows(&run_slug(&db, "quantity-by-provider").await),
            vec![
                json!([2, "Fresh Mart", 45]),
                json!([3, "Baker Bros", 25]),
                json!([1, "Gonzales Diner", 10]),
            ]
        );
        assert_eq!(
            rows(&run_slug(&db, "provider-listings").await),
            vec![
                json!(["Baker Bros", "Grocery Store", 2]),
                json!(["Fresh Mart", "Supermarket", 2]),
                json!(["Gonzales Diner", "Restaurant", 1]),
                json!(["Cater Co", "Catering Service", 0]),
            ]
        );
        assert_eq!(
            rows(&run_slug(&db, "top-providers").await),
            vec![
                json!(["Baker Bros", "Grocery Store", 2, 25]),
                json!(["Fresh Mart", "Supermarket", 2, 45]),
                json!(["Gonzales Diner", "Restaurant", 1, 10]),
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_contacts_by_city() {
        let (_temp_dir, db) = testing::fresh_db().await;
        testing::seed(&db).await;
        let report = find("provider-contacts").unwrap();

        let adambury = run(&db, report, &HashMap::new()).await.unwrap();
        assert_eq!(
            adambury.column("Name").unwrap(),
            vec![&json!("Fresh Mart"), &json!("Gonzales Diner")]
        );

        let params = HashMap::from([("city".to_string(), "Lake Mary".to_string())]);
        let lake_mary = run(&db, report, &params).await.unwrap();
        assert_eq!(
            rows(&lake_mary),
            vec![json!(["Baker Bros", "Grocery Store", "3 Main St", "Lake Mary", "555-0103"])]
        );
    }

    #[tokio::test]
    async fn test_provider_contacts_limit_five() {
        let (_temp_dir, db) = testing::fresh_db().await;
        for id in 1..=7 {
            records::create_provider(&db, testing::provider(id, &format!("Diner {}", id), "Restaurant", "Adambury"))
                .await
                .unwrap();
        }

        let result = run_slug(&db, "provider-contacts").await;
        assert_eq!(result.len(), 5);
    }

    #[tokio::test]
    async fn test_claim_reports() {
        let (_temp_dir, db) = testing::fresh_db().await;
        testing::seed(&db).await;

        assert_eq!(
            rows(&run_slug(&db, "receivers-by-claims").await),
            vec![
                json!([1, "Hope Shelter", 2]),
                json!([2, "City Food Bank", 2]),
                json!([3, "Kind Hearts", 1]),
            ]
        );
        assert_eq!(
            rows(&run_slug(&db, "claims-per-food").await),
            vec![
                json!(["Rice", 2]),
                json!(["Bread", 1]),
                json!(["Chicken", 1]),
                json!(["Soup", 1]),
            ]
        );
        assert_eq!(
            rows(&run_slug(&db, "top-completed-provider").await),
            vec![json!(["Fresh Mart", 2])]
        );
        assert_eq!(
            rows(&run_slug(&db, "claim-status-share").await),
            vec![
                json!(["Cancelled", 1, 20.0]),
                json!(["Completed", 3, 60.0]),
                json!(["Pending", 1, 20.0]),
            ]
        );
        assert_eq!(
            rows(&run_slug(&db, "avg-claimed-quantity").await),
            vec![
                json!([1, "Hope Shelter", 20.0]),
                json!([2, "City Food Bank", 15.0]),
            ]
        );
        assert_eq!(
            rows(&run_slug(&db, "top-meal-type").await),
            vec![json!(["Breakfast", 1])]
        );
        assert_eq!(
            rows(&run_slug(&db, "demand-locations").await),
            vec![json!(["Adambury", 4, 85]), json!(["Lake Mary", 1, 20])]
        );
    }

    #[tokio::test]
    async fn test_listing_reports() {
        let (_temp_dir, db) = testing::fresh_db().await;
        testing::seed(&db).await;

        assert_eq!(rows(&run_slug(&db, "total-quantity").await), vec![json!([80])]);
        assert_eq!(
            rows(&run_slug(&db, "food-types").await),
            vec![
                json!(["Vegetarian", 3]),
                json!(["Non-Vegetarian", 1]),
                json!(["Vegan", 1]),
            ]
        );
        assert_eq!(
            rows(&run_slug(&db, "top-listing-cities").await),
            vec![json!(["Adambury", 3])]
        );
    }

    #[tokio::test]
    async fn test_top_listing_cities_keeps_ties() {
        let (_temp_dir, db) = testing::fresh_db().await;
        testing::seed(&db).await;
        records::create_food_listing(
            &db,
            testing::listing(6, "Milk", 8, 3, "Grocery Store", "Lake Mary", "Vegetarian", "Breakfast"),
        )
        .await
        .unwrap();

        assert_eq!(
            rows(&run_slug(&db, "top-listing-cities").await),
            vec![json!(["Adambury", 3]), json!(["Lake Mary", 3])]
        );
    }
}
