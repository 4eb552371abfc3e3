use crate::domain::models::customer::Shop;
use crate::domain::models::pricing::ShopPricingPolicy;
use crate::domain::ports::ShopRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteShopRepo {
    pool: SqlitePool,
}

impl SqliteShopRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopRepository for SqliteShopRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<Shop>, AppError> {
        sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_pricing_policy(&self, shop_id: &str) -> Result<Option<ShopPricingPolicy>, AppError> {
        sqlx::query_as::<_, ShopPricingPolicy>(
            "SELECT * FROM shop_pricing_policies WHERE shop_id = ?"
        )
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
