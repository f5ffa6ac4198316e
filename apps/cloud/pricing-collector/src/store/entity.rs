//! Sea-ORM entities for the loaded price tables.

/// One row per normalized compute price.
pub mod compute_price {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "compute_prices")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(column_type = "String(StringLen::N(16))")]
        pub provider: String,
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub sku: String,
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub service_name: String,
        #[sea_orm(column_type = "String(StringLen::N(100))")]
        pub provider_region: String,
        pub vcpu: i32,
        pub ram_gib: f64,
        pub hourly_usd: f64,
        #[sea_orm(column_type = "JsonBinary")]
        pub service_details: Json,
        pub collected_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// One row per normalized storage price.
pub mod storage_price {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "storage_prices")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(column_type = "String(StringLen::N(16))")]
        pub provider: String,
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub sku: String,
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub service_name: String,
        #[sea_orm(column_type = "String(StringLen::N(100))")]
        pub provider_region: String,
        #[sea_orm(column_type = "String(StringLen::N(32))")]
        pub tier: String,
        pub gb_month_usd: f64,
        #[sea_orm(column_type = "JsonBinary")]
        pub service_details: Json,
        pub collected_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
