use crate::cli::QueryArgs;
use tablegate::{GateConfig, QueryParams, TableGate, create_pool_from_config};

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let mut config = GateConfig::load(&args.config)?;
    if let Some(url) = args.database {
        config.database.url = url;
    }

    let gate = TableGate::new(config.allow_list()?);
    let pool = create_pool_from_config(&config)?;
    let client = pool.get().await.map_err(tablegate::GateError::from)?;

    tracing::info!(table = %args.table, "running query");
    let body = gate
        .handle(&client, &args.table, QueryParams::parse(&args.query))
        .await;

    println!("{}", serde_json::to_string_pretty(&body)?);
    if !body.ok {
        anyhow::bail!("request failed with status {}", body.status_code());
    }
    Ok(())
}
