use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComputePrices::Table)
                    .if_not_exists()
                    .col(pk_auto(ComputePrices::Id))
                    .col(string_len(ComputePrices::Provider, 16))
                    .col(string_len(ComputePrices::Sku, 255))
                    .col(string_len(ComputePrices::ServiceName, 255))
                    .col(string_len(ComputePrices::ProviderRegion, 100))
                    .col(integer(ComputePrices::Vcpu))
                    .col(double(ComputePrices::RamGib))
                    .col(double(ComputePrices::HourlyUsd))
                    .col(json_binary(ComputePrices::ServiceDetails).default("{}"))
                    .col(
                        timestamp_with_time_zone(ComputePrices::CollectedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_compute_prices_provider_region")
                    .table(ComputePrices::Table)
                    .col(ComputePrices::Provider)
                    .col(ComputePrices::ProviderRegion)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_compute_prices_shape")
                    .table(ComputePrices::Table)
                    .col(ComputePrices::Vcpu)
                    .col(ComputePrices::RamGib)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StoragePrices::Table)
                    .if_not_exists()
                    .col(pk_auto(StoragePrices::Id))
                    .col(string_len(StoragePrices::Provider, 16))
                    .col(string_len(StoragePrices::Sku, 255))
                    .col(string_len(StoragePrices::ServiceName, 255))
                    .col(string_len(StoragePrices::ProviderRegion, 100))
                    .col(string_len(StoragePrices::Tier, 32))
                    .col(double(StoragePrices::GbMonthUsd))
                    .col(json_binary(StoragePrices::ServiceDetails).default("{}"))
                    .col(
                        timestamp_with_time_zone(StoragePrices::CollectedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_storage_prices_provider_region")
                    .table(StoragePrices::Table)
                    .col(StoragePrices::Provider)
                    .col(StoragePrices::ProviderRegion)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_storage_prices_tier")
                    .table(StoragePrices::Table)
                    .col(StoragePrices::Tier)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoragePrices::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ComputePrices::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ComputePrices {
    Table,
    Id,
    Provider,
    Sku,
    ServiceName,
    ProviderRegion,
    Vcpu,
    RamGib,
    HourlyUsd,
    ServiceDetails,
    CollectedAt,
}

#[derive(DeriveIden)]
enum StoragePrices {
    Table,
    Id,
    Provider,
    Sku,
    ServiceName,
    ProviderRegion,
    Tier,
    GbMonthUsd,
    ServiceDetails,
    CollectedAt,
}
