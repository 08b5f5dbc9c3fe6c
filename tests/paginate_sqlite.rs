//! Paginated reads against an in-memory SQLite database.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tablesync::{
    bootstrap, Comparator, Database, DbConfig, Entity, FieldDef, Insert, Paginator, Select, SqlValue,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Location {
    log: i32,
    lat: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct People {
    id: i64,
    name: String,
    email: String,
    #[serde(with = "tablesync::serde_ext::json_text")]
    location: Location,
    created_at: String,
    nickname: Option<String>,
}

impl Entity for People {
    const TABLE: &'static str = "people";

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::integer("Id"),
            FieldDef::string("Name"),
            FieldDef::string("Email"),
            FieldDef::blob("Location"),
            FieldDef::timestamp("CreatedAt"),
            FieldDef::string("Nickname").optional(),
        ]
    }
}

fn created(i: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, i).unwrap()
}

async fn seeded(zone: &str, n: u32) -> Database {
    let config = DbConfig::sqlite(":memory:").with_timezone(zone);
    let db = bootstrap(&config, &[People::descriptor().unwrap()]).await.unwrap();
    for i in 0..n {
        let location = serde_json::to_string(&Location { log: 1, lat: i as i32 }).unwrap();
        let nickname = if i % 2 == 0 { Some(format!("nick_{i}")) } else { None };
        let row = Insert::into("people")
            .value("id", i + 1)
            .value("name", format!("aaa_{i}"))
            .value("email", format!("email_{i}"))
            .value("location", location)
            .value("created_at", created(i))
            .value("nickname", nickname);
        db.execute_query(&row.build(db.dialect())).await.unwrap();
    }
    db
}

#[tokio::test]
async fn loads_every_row_without_pagination() {
    let db = seeded("UTC", 10).await;
    let page = Paginator::new(&db, Select::from("people").order_asc("id"))
        .load_page::<People>()
        .await
        .unwrap();
    assert_eq!(page.count, 10);
    assert_eq!(page.items.len(), 10);
    let first = &page.items[0];
    assert_eq!(first.id, 1);
    assert_eq!(first.name, "aaa_0");
    assert_eq!(first.location, Location { log: 1, lat: 0 });
    assert_eq!(first.created_at, "2024-05-01 08:00:00");
    assert_eq!(first.nickname.as_deref(), Some("nick_0"));
    assert_eq!(page.items[1].nickname, None);
}

#[tokio::test]
async fn first_page_is_bounded_but_count_is_total() {
    let db = seeded("UTC", 10).await;
    let page = Paginator::new(&db, Select::from("people").paginate(0, 5))
        .load_page::<People>()
        .await
        .unwrap();
    assert_eq!(page.count, 10);
    assert_eq!(page.items.len(), 5);
}

#[tokio::test]
async fn later_pages_follow_the_order() {
    let db = seeded("UTC", 10).await;
    let page = Paginator::new(&db, Select::from("people").order_desc("id").paginate(1, 3))
        .load_page::<People>()
        .await
        .unwrap();
    let ids: Vec<_> = page.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, [7, 6, 5]);

    let past_end = Paginator::new(&db, Select::from("people").paginate(4, 3))
        .load_page::<People>()
        .await
        .unwrap();
    assert_eq!(past_end.count, 10);
    assert!(past_end.items.is_empty());

    let unbounded = Paginator::new(&db, Select::from("people").paginate(3, 0))
        .load_page_json()
        .await
        .unwrap();
    assert_eq!(unbounded.items.len(), 10);
}

#[tokio::test]
async fn conditions_filter_both_count_and_items() {
    let db = seeded("UTC", 10).await;
    let select = Select::from("people")
        .where_("created_at", Comparator::Gte, created(5))
        .where_("name", Comparator::Like, "aaa_%")
        .order_asc("id");
    let page = Paginator::new(&db, select).load_page::<People>().await.unwrap();
    assert_eq!(page.count, 5);
    assert_eq!(page.items.first().map(|p| p.id), Some(6));

    let nulls = Paginator::new(&db, Select::from("people").is_null("nickname"))
        .load_page_json()
        .await
        .unwrap();
    assert_eq!(nulls.count, 5);

    let none = Paginator::new(&db, Select::from("people").eq("name", "nobody"))
        .load_page::<People>()
        .await
        .unwrap();
    assert_eq!(none.count, 0);
    assert!(none.items.is_empty());
}

#[tokio::test]
async fn typed_select_coerces_request_values() {
    let db = seeded("UTC", 10).await;
    let table = People::descriptor().unwrap();
    let select = Select::for_table(&table)
        .eq("id", "7")
        .unwrap()
        .where_("created_at", Comparator::Lte, "2024-05-01 08:00:06")
        .unwrap();
    let page = Paginator::new(&db, select).load_page::<People>().await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.items[0].email, "email_6");
}

#[tokio::test]
async fn empty_table_returns_empty_page() {
    let db = seeded("UTC", 0).await;
    let page = Paginator::new(&db, Select::from("people").paginate(0, 5))
        .load_page::<People>()
        .await
        .unwrap();
    assert_eq!(page.count, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn timestamps_are_stored_in_the_configured_zone() {
    let db = seeded("+08:00", 1).await;
    let page = Paginator::new(&db, Select::from("people")).load_page::<People>().await.unwrap();
    assert_eq!(page.items[0].created_at, "2024-05-01 16:00:00");

    // Bound timestamps go through the same zone, so filters still match.
    let hit = Paginator::new(&db, Select::from("people").eq("created_at", created(0)))
        .load_page_json()
        .await
        .unwrap();
    assert_eq!(hit.count, 1);
    assert_eq!(hit.items[0]["created_at"], "2024-05-01 16:00:00");

    let named = seeded("Asia/Shanghai", 1).await;
    let page = Paginator::new(&named, Select::from("people")).load_page::<People>().await.unwrap();
    assert_eq!(page.items[0].created_at, "2024-05-01 16:00:00");
}

#[tokio::test]
async fn json_rows_keep_column_names() {
    let db = seeded("UTC", 2).await;
    let page = Paginator::new(&db, Select::from("people").eq("id", SqlValue::Int(2)))
        .load_page_json()
        .await
        .unwrap();
    let row = &page.items[0];
    assert_eq!(row["id"], 2);
    assert_eq!(row["email"], "email_1");
    assert_eq!(row["nickname"], serde_json::Value::Null);
}
