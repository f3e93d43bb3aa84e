//! requisition 服务入口

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    lmis_bootstrap::run("config", requisition::build_router)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
}
