use graphwire::Connection;
use serde::Serialize;

#[derive(Serialize)]
struct DatabaseRow {
    name: String,
    primary: Option<String>,
    replicas: Vec<String>,
}

pub async fn list(connection: &Connection, format: &str) -> anyhow::Result<()> {
    let rows: Vec<DatabaseRow> = connection
        .databases()
        .all()
        .await?
        .iter()
        .map(|db| DatabaseRow {
            name: db.name().to_string(),
            primary: db.primary_replica().map(|r| r.address.clone()),
            replicas: db.replicas().iter().map(|r| r.address.clone()).collect(),
        })
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            for row in &rows {
                let primary = row.primary.as_deref().unwrap_or("-");
                println!("{}\tprimary={}\treplicas={}", row.name, primary, row.replicas.join(","));
            }
        }
    }
    Ok(())
}

pub async fn create(connection: &Connection, name: &str) -> anyhow::Result<()> {
    connection.databases().create(name).await?;
    println!("✓ Created database {name}");
    Ok(())
}

pub async fn delete(connection: &Connection, name: &str) -> anyhow::Result<()> {
    connection.databases().get(name).await?.delete().await?;
    println!("✓ Deleted database {name}");
    Ok(())
}

pub async fn schema(connection: &Connection, name: &str) -> anyhow::Result<()> {
    let schema = connection.databases().get(name).await?.schema().await?;
    println!("{schema}");
    Ok(())
}
